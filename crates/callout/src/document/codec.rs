//! Reading documents back from SVG markup.
//!
//! Only the nodes the writer produces are interpreted: the root viewport, the
//! source image node and the `data-*` attributes of callout groups. The
//! drawing primitives inside callout groups are ignored, so documents styled
//! with a different [`CalloutDefinition`](callout_core::draw::CalloutDefinition)
//! read back identically.

use base64::{Engine, engine::general_purpose::STANDARD};
use log::{debug, trace};
use svg::{
    node::{Attributes, element::tag::Type},
    parser::Event,
};

use callout_core::{
    annotation::{Annotation, ValidationError},
    geometry::CanvasSize,
};

use super::{ANNOTATIONS_ID, CALLOUT_CLASS, Document, Error, SOURCE_IMAGE_ID, SourceImage};
use crate::sniff;

pub(super) fn parse(bytes: &[u8]) -> Result<Document, Error> {
    if !sniff::looks_like_svg(bytes) {
        return Err(Error::NotAStructuredDocument);
    }
    let text = std::str::from_utf8(bytes).map_err(|_| Error::NotAStructuredDocument)?;
    let text = text.trim_start_matches('\u{feff}');

    let mut reader = Reader::default();
    for event in svg::read(text).map_err(|err| Error::Malformed(err.to_string()))? {
        match event {
            Event::Error(err) => return Err(Error::Malformed(err.to_string())),
            Event::Tag(name, kind, attributes) => reader.tag(name, kind, &attributes)?,
            _ => {}
        }
    }
    reader.finish()
}

#[derive(Default)]
struct Reader {
    canvas: Option<CanvasSize>,
    source: Option<SourceImage>,
    layer: Option<Vec<Annotation>>,
    /// Number of currently open `<g>` elements.
    depth: usize,
    /// Depth at which the annotation layer was opened, while it is open.
    layer_depth: Option<usize>,
}

impl Reader {
    fn tag(&mut self, name: &str, kind: Type, attributes: &Attributes) -> Result<(), Error> {
        let starting = matches!(kind, Type::Start);
        let opening = starting || matches!(kind, Type::Empty);

        match name {
            "svg" if opening && self.canvas.is_none() => {
                self.canvas = Some(read_canvas(attributes)?);
            }
            "image" if opening && attr(attributes, "id") == Some(SOURCE_IMAGE_ID) => {
                if self.source.is_some() {
                    return Err(Error::Malformed(format!(
                        "more than one `{SOURCE_IMAGE_ID}` node"
                    )));
                }
                self.source = Some(read_source_image(attributes)?);
            }
            "g" if opening => {
                self.open_group(attributes, starting)?;
                if starting {
                    self.depth += 1;
                }
            }
            "g" => {
                self.depth = self.depth.saturating_sub(1);
                if self.layer_depth == Some(self.depth) {
                    self.layer_depth = None;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn open_group(&mut self, attributes: &Attributes, starting: bool) -> Result<(), Error> {
        if attr(attributes, "id") == Some(ANNOTATIONS_ID) {
            if self.layer.is_some() {
                return Err(Error::Malformed(format!(
                    "more than one `{ANNOTATIONS_ID}` layer"
                )));
            }
            self.layer = Some(Vec::new());
            if starting {
                self.layer_depth = Some(self.depth);
            }
            return Ok(());
        }

        let in_layer = self.layer_depth.is_some_and(|d| self.depth == d + 1);
        if in_layer && has_class(attributes, CALLOUT_CLASS) {
            if let Some(layer) = self.layer.as_mut() {
                let index = layer.len();
                let annotation = read_annotation(attributes)
                    .map_err(|source| Error::InvalidAnnotation { index, source })?;
                trace!(index, id = annotation.id; "Callout decoded");
                layer.push(annotation);
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Document, Error> {
        let canvas = self
            .canvas
            .ok_or_else(|| Error::Malformed("missing root `svg` element".to_string()))?;
        let source = self.source.ok_or(Error::MissingSourceImage)?;
        debug!(
            mime = source.mime(),
            bytes = source.bytes().len(),
            annotations = self.layer.as_ref().map_or(0, Vec::len),
            has_layer = self.layer.is_some();
            "Document parsed"
        );
        Ok(Document::from_parts(canvas, source, self.layer))
    }
}

fn attr<'a>(attributes: &'a Attributes, name: &str) -> Option<&'a str> {
    attributes.get(name).map(|value| &**value)
}

fn has_class(attributes: &Attributes, class: &str) -> bool {
    attr(attributes, "class").is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
}

/// Reads the canvas from `viewBox="0 0 W H"`, falling back to `width` and
/// `height`.
fn read_canvas(attributes: &Attributes) -> Result<CanvasSize, Error> {
    if let Some(view_box) = attr(attributes, "viewBox") {
        let numbers: Vec<&str> = view_box
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .collect();
        if let [_, _, width, height] = numbers.as_slice() {
            return Ok(CanvasSize::new(
                parse_dimension("viewBox width", width)?,
                parse_dimension("viewBox height", height)?,
            ));
        }
        return Err(Error::Malformed(format!("unsupported viewBox `{view_box}`")));
    }

    match (attr(attributes, "width"), attr(attributes, "height")) {
        (Some(width), Some(height)) => Ok(CanvasSize::new(
            parse_dimension("width", width)?,
            parse_dimension("height", height)?,
        )),
        _ => Err(Error::Malformed(
            "root `svg` element has no viewBox or size".to_string(),
        )),
    }
}

fn parse_dimension(what: &str, raw: &str) -> Result<u32, Error> {
    let value: f64 = raw
        .trim()
        .trim_end_matches("px")
        .parse()
        .map_err(|_| Error::Malformed(format!("invalid {what} `{raw}`")))?;
    if value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX) && value.fract() == 0.0 {
        Ok(value as u32)
    } else {
        Err(Error::Malformed(format!("invalid {what} `{raw}`")))
    }
}

fn read_source_image(attributes: &Attributes) -> Result<SourceImage, Error> {
    let href = attr(attributes, "href")
        .or_else(|| attr(attributes, "xlink:href"))
        .ok_or_else(|| Error::InvalidDataUri("source image has no href".to_string()))?;
    decode_data_uri(href)
}

/// Decodes `data:<mime>;base64,<payload>`.
fn decode_data_uri(uri: &str) -> Result<SourceImage, Error> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| Error::InvalidDataUri("expected a `data:` URI".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::InvalidDataUri("missing `,` separator".to_string()))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| Error::InvalidDataUri("only base64 payloads are supported".to_string()))?;
    if mime.is_empty() {
        return Err(Error::InvalidDataUri("missing MIME type".to_string()));
    }

    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(payload)?;
    Ok(SourceImage::new(bytes, mime))
}

fn read_annotation(attributes: &Attributes) -> Result<Annotation, ValidationError> {
    let id = read_id(attr(attributes, "data-id").unwrap_or_default())?;
    let x = read_coordinate(attr(attributes, "data-x"));
    let y = read_coordinate(attr(attributes, "data-y"));
    let side = attr(attributes, "data-side").unwrap_or_default().parse()?;

    let annotation = Annotation::new(id, x, y, side);
    annotation.validate()?;
    Ok(annotation)
}

fn read_id(raw: &str) -> Result<u32, ValidationError> {
    let value: i64 = raw.trim().parse().map_err(|_| ValidationError::InvalidId(0))?;
    u32::try_from(value)
        .ok()
        .filter(|id| *id > 0)
        .ok_or(ValidationError::InvalidId(value))
}

/// Unreadable coordinates become NaN so that validation reports them.
fn read_coordinate(raw: Option<&str>) -> f32 {
    raw.and_then(|value| value.trim().parse().ok())
        .unwrap_or(f32::NAN)
}
