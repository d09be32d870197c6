//! Text definitions for callout numerals.
//!
//! # Overview
//!
//! - [`TextDefinition`] - Reusable text style configuration
//! - [`Text`] - A renderable text element combining content with a [`TextDefinition`]
//!
//! Text is emitted as an SVG `<text>` element centered on its position both
//! horizontally (`text-anchor="middle"`) and vertically
//! (`dominant-baseline="central"`), which is how a numeral sits inside its
//! bubble.
//!
//! # Quick Start
//!
//! ```
//! # use callout_core::draw::{TextDefinition, Text};
//! # use callout_core::geometry::Point;
//! let mut style = TextDefinition::new();
//! style.set_font_family("Helvetica");
//! style.set_font_size(14.0);
//!
//! let text = Text::new(&style, "12");
//! let node = text.render_to_svg(Point::new(50.0, 50.0));
//! let markup = node.to_string();
//! assert!(markup.starts_with("<text"));
//! assert!(markup.lines().any(|line| line.trim() == "12"));
//! ```

use svg::node::element as svg_element;

use crate::{color::Color, geometry::Point};

/// Defines the visual style for text elements.
///
/// # Default Values
///
/// | Property | Default |
/// |----------|---------|
/// | Font family | `"Arial"` |
/// | Font size | `20` |
/// | Font weight | `"bold"` |
/// | Text color | `None` (SVG default, typically black) |
#[derive(Debug, Clone, PartialEq)]
pub struct TextDefinition {
    font_family: String,
    font_size: f32,
    font_weight: String,
    color: Option<Color>,
}

impl TextDefinition {
    /// Creates a new text definition with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the font size in canvas units.
    pub fn set_font_size(&mut self, size: f32) {
        self.font_size = size;
    }

    /// Sets the font family for the text.
    ///
    /// # Arguments
    ///
    /// * `family` - The font family name (e.g., "Arial", "DejaVu Sans", "sans-serif")
    pub fn set_font_family(&mut self, family: &str) {
        self.font_family = family.to_string();
    }

    /// Sets the CSS font weight (e.g. `"bold"`, `"normal"`, `"700"`).
    pub fn set_font_weight(&mut self, weight: &str) {
        self.font_weight = weight.to_string();
    }

    /// Sets the text color. `None` leaves the SVG default (usually black).
    pub fn set_color(&mut self, color: Option<Color>) {
        self.color = color;
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_weight(&self) -> &str {
        &self.font_weight
    }

    /// Returns a reference to the text color, if set.
    pub fn color(&self) -> Option<&Color> {
        self.color.as_ref()
    }
}

impl Default for TextDefinition {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size: 20.0,
            font_weight: "bold".to_string(),
            color: None,
        }
    }
}

/// A renderable text element combining content with styling.
#[derive(Debug, Clone)]
pub struct Text<'a> {
    definition: &'a TextDefinition,
    content: &'a str,
}

impl<'a> Text<'a> {
    /// Creates a new text element with the given definition and content.
    pub fn new(definition: &'a TextDefinition, content: &'a str) -> Self {
        Self {
            definition,
            content,
        }
    }

    /// Returns the text content of this element.
    pub fn content(&self) -> &str {
        self.content
    }

    /// Renders the text centered on `position`.
    pub fn render_to_svg(&self, position: Point) -> svg_element::Text {
        let mut rendered = svg_element::Text::new(self.content)
            .set("x", position.x())
            .set("y", position.y())
            .set("text-anchor", "middle")
            .set("dominant-baseline", "central")
            .set("font-family", self.definition.font_family())
            .set("font-size", self.definition.font_size())
            .set("font-weight", self.definition.font_weight());

        if let Some(color) = self.definition.color() {
            rendered = rendered
                .set("fill", color.to_string())
                .set("fill-opacity", color.alpha());
        }

        rendered
    }
}
