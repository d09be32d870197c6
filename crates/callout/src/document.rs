//! The structured annotation document.
//!
//! A [`Document`] is an SVG file holding two things side by side:
//!
//! - an `<image id="source-image">` node embedding the original image bytes
//!   as a `data:` URI, written once at creation and never reassigned;
//! - a `<g id="annotations">` layer with one `<g class="callout">` per
//!   annotation, replaced wholesale on every save.
//!
//! Because the original bytes are carried verbatim, reopening a document
//! always yields the exact pixels that were uploaded, no matter how many
//! times the callouts were edited.
//!
//! # Example
//!
//! ```
//! # use callout::document::Document;
//! # use callout_core::{annotation::{Annotation, Side}, draw::CalloutDefinition, geometry::CanvasSize};
//! let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
//! let mut doc = Document::create(png.clone(), "image/png", CanvasSize::DEFAULT);
//!
//! doc.replace_annotations(&[Annotation::new(1, 250.0, 50.0, Side::Left)]).unwrap();
//! let markup = doc.to_svg(&CalloutDefinition::default());
//!
//! let reopened = Document::parse(markup.as_bytes()).unwrap();
//! assert_eq!(reopened.extract_source_image(), ("image/png", png.as_slice()));
//! assert_eq!(reopened.annotations(), doc.annotations());
//! ```

mod codec;
mod writer;

use log::debug;
use thiserror::Error;

use callout_core::{
    annotation::{Annotation, IndexedValidationError, ValidationError, validate_all},
    draw::CalloutDefinition,
    geometry::CanvasSize,
};

/// `id` of the node embedding the original image.
pub const SOURCE_IMAGE_ID: &str = "source-image";
/// `id` of the annotation layer group.
pub const ANNOTATIONS_ID: &str = "annotations";
/// `class` of each callout group inside the annotation layer.
pub const CALLOUT_CLASS: &str = "callout";

/// Errors produced while reading or editing a [`Document`].
#[derive(Debug, Error)]
pub enum Error {
    /// The input is not an SVG document at all, e.g. a plain raster image.
    #[error("input is not a structured annotation document")]
    NotAStructuredDocument,

    #[error("document has no `{SOURCE_IMAGE_ID}` node")]
    MissingSourceImage,

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("invalid embedded image URI: {0}")]
    InvalidDataUri(String),

    #[error("embedded image is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("callout #{index} in document: {source}")]
    InvalidAnnotation {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Validation(#[from] IndexedValidationError),
}

/// The original image bytes together with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    mime: String,
    bytes: Vec<u8>,
}

impl SourceImage {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    /// Infers a MIME type from the image's leading bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// # use callout::document::SourceImage;
    /// let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    /// assert_eq!(SourceImage::sniff_mime(&jpeg), Some("image/jpeg"));
    /// assert_eq!(SourceImage::sniff_mime(b"hello"), None);
    /// ```
    pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
        image::guess_format(bytes)
            .ok()
            .map(|format| format.to_mime_type())
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.mime, self.bytes)
    }
}

/// An annotation document: canvas, embedded source image and annotation
/// layer.
///
/// There is no way to replace the source image of an existing document; a
/// new image means a new document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    canvas: CanvasSize,
    source: SourceImage,
    layer: Option<Vec<Annotation>>,
}

impl Document {
    /// Creates a document embedding `bytes` with an empty annotation layer.
    ///
    /// The bytes are stored as given; they are neither decoded nor checked.
    pub fn create(bytes: Vec<u8>, mime: impl Into<String>, canvas: CanvasSize) -> Self {
        let source = SourceImage::new(bytes, mime);
        debug!(
            mime = source.mime(),
            bytes = source.bytes().len(),
            canvas_width = canvas.width(),
            canvas_height = canvas.height();
            "Document created"
        );
        Self {
            canvas,
            source,
            layer: Some(Vec::new()),
        }
    }

    /// Reads a document from its serialized bytes.
    ///
    /// # Errors
    ///
    /// - [`Error::NotAStructuredDocument`] if `bytes` are not SVG markup,
    ///   which includes every plain raster image.
    /// - [`Error::MissingSourceImage`] if the SVG has no source image node.
    /// - [`Error::Malformed`], [`Error::InvalidDataUri`],
    ///   [`Error::InvalidBase64`] or [`Error::InvalidAnnotation`] when the
    ///   markup cannot be decoded.
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        codec::parse(bytes)
    }

    /// Serializes the document as SVG markup, drawing callouts with
    /// `definition`.
    pub fn to_svg(&self, definition: &CalloutDefinition) -> String {
        writer::write(self, definition)
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn source_image(&self) -> &SourceImage {
        &self.source
    }

    /// Returns the embedded image's MIME type and its untouched bytes.
    pub fn extract_source_image(&self) -> (&str, &[u8]) {
        (self.source.mime(), self.source.bytes())
    }

    /// Returns the annotations in layer order. An absent layer reads as empty.
    pub fn annotations(&self) -> &[Annotation] {
        self.layer.as_deref().unwrap_or_default()
    }

    /// Returns `true` if the document has an annotation layer node.
    pub fn has_annotation_layer(&self) -> bool {
        self.layer.is_some()
    }

    /// Replaces the whole annotation layer.
    ///
    /// Every annotation is validated first; if any fails, the document is left
    /// exactly as it was. A document without a layer gets a new one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first invalid annotation.
    pub fn replace_annotations(&mut self, annotations: &[Annotation]) -> Result<(), Error> {
        validate_all(annotations)?;

        if self.layer.is_none() {
            debug!("Inserting missing annotation layer");
        }
        self.layer = Some(annotations.to_vec());
        debug!(annotations = annotations.len(); "Annotation layer replaced");
        Ok(())
    }

    pub(crate) fn from_parts(
        canvas: CanvasSize,
        source: SourceImage,
        layer: Option<Vec<Annotation>>,
    ) -> Self {
        Self {
            canvas,
            source,
            layer,
        }
    }
}

#[cfg(test)]
mod tests {
    use callout_core::annotation::Side;

    use super::*;

    fn sample() -> Document {
        Document::create(vec![1, 2, 3, 4], "image/png", CanvasSize::DEFAULT)
    }

    #[test]
    fn test_create_has_empty_layer() {
        let doc = sample();
        assert!(doc.has_annotation_layer());
        assert!(doc.annotations().is_empty());
        assert_eq!(doc.extract_source_image(), ("image/png", [1u8, 2, 3, 4].as_slice()));
        assert_eq!(doc.canvas(), CanvasSize::new(700, 900));
    }

    #[test]
    fn test_replace_keeps_order() {
        let mut doc = sample();
        let anns = vec![
            Annotation::new(3, 10.0, 10.0, Side::Left),
            Annotation::new(1, 600.0, 20.0, Side::Right),
        ];
        doc.replace_annotations(&anns).unwrap();
        assert_eq!(doc.annotations(), anns.as_slice());
    }

    #[test]
    fn test_replace_is_transactional() {
        let mut doc = sample();
        let first = vec![Annotation::new(1, 250.0, 50.0, Side::Left)];
        doc.replace_annotations(&first).unwrap();
        let before = doc.clone();

        let bad = vec![
            Annotation::new(2, 500.0, 200.0, Side::Right),
            Annotation::new(3, -1.0, 200.0, Side::Right),
        ];
        let err = doc.replace_annotations(&bad).unwrap_err();
        assert!(matches!(err, Error::Validation(IndexedValidationError { index: 1, .. })));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_replace_inserts_missing_layer() {
        let mut doc = Document::from_parts(
            CanvasSize::DEFAULT,
            SourceImage::new(vec![9], "image/jpeg"),
            None,
        );
        assert!(!doc.has_annotation_layer());
        assert!(doc.annotations().is_empty());

        doc.replace_annotations(&[Annotation::new(1, 1.0, 1.0, Side::Left)])
            .unwrap();
        assert!(doc.has_annotation_layer());
        assert_eq!(doc.annotations().len(), 1);
    }

    #[test]
    fn test_replace_never_touches_source() {
        let mut doc = sample();
        for round in 1..=5u32 {
            let anns: Vec<_> = (1..=round)
                .map(|id| Annotation::new(id, id as f32 * 10.0, 5.0, Side::Left))
                .collect();
            doc.replace_annotations(&anns).unwrap();
            assert_eq!(doc.source_image().bytes(), &[1, 2, 3, 4]);
        }
    }

    #[test]
    fn test_sniff_mime() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(SourceImage::sniff_mime(&png), Some("image/png"));
        assert_eq!(SourceImage::sniff_mime(b"<svg/>"), None);
    }
}
