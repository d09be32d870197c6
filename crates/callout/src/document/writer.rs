//! Serializing documents to SVG markup.

use base64::{Engine, engine::general_purpose::STANDARD};
use svg::node::element as svg_element;

use callout_core::draw::{Callout, CalloutDefinition};

use super::{ANNOTATIONS_ID, Document, SOURCE_IMAGE_ID};

pub(super) fn write(document: &Document, definition: &CalloutDefinition) -> String {
    let canvas = document.canvas();
    let (mime, bytes) = document.extract_source_image();

    // The image is stretched to the canvas, matching the raster compositor.
    let image = svg_element::Image::new()
        .set("id", SOURCE_IMAGE_ID)
        .set("x", 0)
        .set("y", 0)
        .set("width", canvas.width())
        .set("height", canvas.height())
        .set("preserveAspectRatio", "none")
        .set("href", format!("data:{mime};base64,{}", STANDARD.encode(bytes)));

    let mut doc = svg::Document::new()
        .set(
            "viewBox",
            format!("0 0 {} {}", canvas.width(), canvas.height()),
        )
        .set("width", canvas.width())
        .set("height", canvas.height())
        .add(image);

    if document.has_annotation_layer() {
        let layer = document
            .annotations()
            .iter()
            .fold(svg_element::Group::new().set("id", ANNOTATIONS_ID), |layer, annotation| {
                layer.add(Callout::new(definition, annotation, canvas).render_to_svg())
            });
        doc = doc.add(layer);
    }

    doc.to_string()
}
