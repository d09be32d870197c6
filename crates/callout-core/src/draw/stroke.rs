//! Stroke definitions for leader lines.
//!
//! # Overview
//!
//! - [`StrokeDefinition`]: color, width, dash style and cap of a line
//! - [`StrokeStyle`]: line pattern (solid, dashed, dotted or a custom dasharray)
//! - [`StrokeCap`]: how line endpoints are rendered
//! - [`apply_stroke!`](crate::apply_stroke!): applies a stroke to an SVG element
//!
//! # Quick Start
//!
//! ```
//! use callout_core::draw::{StrokeDefinition, StrokeCap};
//! use callout_core::color::Color;
//! use svg::node::element as svg_element;
//!
//! let mut stroke = StrokeDefinition::solid(Color::new("black").unwrap(), 1.0);
//! stroke.set_cap(StrokeCap::Round);
//!
//! let line = svg_element::Line::new()
//!     .set("x1", 50)
//!     .set("y1", 50)
//!     .set("x2", 250)
//!     .set("y2", 50);
//! let line = callout_core::apply_stroke!(line, &stroke);
//! ```
//!
//! # SVG Attribute Mapping
//!
//! | Rust Property | SVG Attribute | Example Values |
//! |--------------|---------------|----------------|
//! | `color` | `stroke`, `stroke-opacity` | `"#000000"`, `0.5` |
//! | `width` | `stroke-width` | `1.0` |
//! | `style` | `stroke-dasharray` | `"5,5"` |
//! | `cap` | `stroke-linecap` | `"butt"`, `"round"`, `"square"` |

use std::str::FromStr;

use crate::color::Color;

/// Line pattern of a stroke.
///
/// Each variant maps to an SVG `stroke-dasharray` value, and to the same
/// on/off run lengths when a raster backend draws the line itself.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum StrokeStyle {
    /// Solid continuous line (default)
    #[default]
    Solid,
    /// 5px dash, 5px gap
    Dashed,
    /// 2px dot, 3px gap
    Dotted,
    /// Comma or space separated dash/gap lengths, e.g. `"10,5,2,5"`
    Custom(String),
}

impl FromStr for StrokeStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solid" => Ok(Self::Solid),
            "dashed" => Ok(Self::Dashed),
            "dotted" => Ok(Self::Dotted),
            // Any other value is treated as a custom dasharray pattern
            _ => Ok(Self::Custom(s.to_string())),
        }
    }
}

impl StrokeStyle {
    /// Returns the SVG dasharray value for this style, or None for solid lines
    pub fn to_svg_value(&self) -> Option<String> {
        match self {
            Self::Solid => None,
            Self::Dashed => Some("5,5".to_string()),
            Self::Dotted => Some("2,3".to_string()),
            Self::Custom(pattern) => Some(pattern.clone()),
        }
    }

    /// Returns the alternating on/off run lengths, or `None` for solid lines
    /// and for custom patterns that contain no positive length.
    ///
    /// # Examples
    ///
    /// ```
    /// # use callout_core::draw::StrokeStyle;
    /// assert_eq!(StrokeStyle::Dashed.dash_pattern(), Some(vec![5.0, 5.0]));
    /// assert_eq!(StrokeStyle::Solid.dash_pattern(), None);
    /// ```
    pub fn dash_pattern(&self) -> Option<Vec<f32>> {
        let pattern = self.to_svg_value()?;
        let runs: Vec<f32> = pattern
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter_map(|part| part.trim().parse::<f32>().ok())
            .filter(|len| len.is_finite() && *len >= 0.0)
            .collect();

        if runs.iter().any(|len| *len > 0.0) {
            Some(runs)
        } else {
            None
        }
    }
}

/// Defines how line endpoints are rendered.
///
/// Maps directly to SVG `stroke-linecap` attribute values.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StrokeCap {
    /// Flat cap at the exact endpoint (SVG default)
    #[default]
    Butt,
    /// Rounded cap extending beyond the endpoint by half the stroke width
    Round,
    /// Square cap extending beyond the endpoint by half the stroke width
    Square,
}

impl StrokeCap {
    /// Returns the SVG stroke-linecap value
    pub fn to_svg_value(&self) -> &'static str {
        match self {
            Self::Butt => "butt",
            Self::Round => "round",
            Self::Square => "square",
        }
    }
}

impl FromStr for StrokeCap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "butt" => Ok(Self::Butt),
            "round" => Ok(Self::Round),
            "square" => Ok(Self::Square),
            _ => Err(format!(
                "invalid stroke cap `{s}`, valid values: butt, round, square"
            )),
        }
    }
}

/// A stroke definition for leader lines.
///
/// # Examples
///
/// ```
/// use callout_core::draw::{StrokeDefinition, StrokeStyle};
/// use callout_core::color::Color;
///
/// // Default stroke (black, 1px, solid)
/// let stroke = StrokeDefinition::default();
/// assert_eq!(stroke.width(), 1.0);
///
/// let mut stroke = StrokeDefinition::new(Color::new("navy").unwrap(), 2.0);
/// stroke.set_style(StrokeStyle::Dotted);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeDefinition {
    color: Color,
    width: f32,
    style: StrokeStyle,
    cap: StrokeCap,
}

impl StrokeDefinition {
    /// Creates a new solid stroke with the given color and width.
    pub fn new(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            ..Self::default()
        }
    }

    /// Creates a solid stroke (convenience constructor).
    pub fn solid(color: Color, width: f32) -> Self {
        Self::new(color, width)
    }

    /// Returns the stroke color.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Returns the stroke width.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Returns the stroke style.
    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    /// Returns the stroke cap style.
    pub fn cap(&self) -> StrokeCap {
        self.cap
    }

    /// Sets the stroke style.
    pub fn set_style(&mut self, style: StrokeStyle) {
        self.style = style;
    }

    /// Sets the stroke cap style.
    pub fn set_cap(&mut self, cap: StrokeCap) {
        self.cap = cap;
    }
}

impl Default for StrokeDefinition {
    fn default() -> Self {
        Self {
            color: Color::default(),
            width: 1.0,
            style: StrokeStyle::default(),
            cap: StrokeCap::default(),
        }
    }
}

/// Apply all stroke attributes to an SVG element.
///
/// Sets color, opacity, width, line cap and, for patterned styles, the dash
/// array.
///
/// # Examples
///
/// ```
/// use callout_core::draw::StrokeDefinition;
/// use svg::node::element as svg_element;
///
/// let stroke = StrokeDefinition::default();
/// let line = svg_element::Line::new().set("x1", 0).set("x2", 10);
///
/// let line = callout_core::apply_stroke!(line, &stroke);
/// ```
#[macro_export]
macro_rules! apply_stroke {
    ($element:expr, $stroke:expr) => {{
        let mut elem = $element
            .set("stroke", $stroke.color().to_string())
            .set("stroke-opacity", $stroke.color().alpha())
            .set("stroke-width", $stroke.width())
            .set("stroke-linecap", $stroke.cap().to_svg_value());

        if let Some(dasharray) = $stroke.style().to_svg_value() {
            elem = elem.set("stroke-dasharray", dasharray);
        }

        elem
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stroke_default() {
        let stroke = StrokeDefinition::default();
        assert_eq!(stroke.width(), 1.0);
        assert_eq!(stroke.color().to_string(), "black");
        assert_eq!(*stroke.style(), StrokeStyle::Solid);
        assert_eq!(stroke.cap(), StrokeCap::Butt);
    }

    #[test]
    fn test_stroke_setters() {
        let mut stroke = StrokeDefinition::default();

        stroke.set_style(StrokeStyle::Dashed);
        stroke.set_cap(StrokeCap::Square);

        assert_eq!(*stroke.style(), StrokeStyle::Dashed);
        assert_eq!(stroke.cap(), StrokeCap::Square);
    }

    #[test]
    fn test_stroke_style_from_str() {
        assert_eq!("solid".parse::<StrokeStyle>().unwrap(), StrokeStyle::Solid);
        assert_eq!("dashed".parse::<StrokeStyle>().unwrap(), StrokeStyle::Dashed);
        assert_eq!("dotted".parse::<StrokeStyle>().unwrap(), StrokeStyle::Dotted);
        assert_eq!(
            "10,5".parse::<StrokeStyle>().unwrap(),
            StrokeStyle::Custom("10,5".to_string())
        );
    }

    #[test]
    fn test_dash_pattern() {
        assert_eq!(StrokeStyle::Dotted.dash_pattern(), Some(vec![2.0, 3.0]));
        assert_eq!(
            StrokeStyle::Custom("10 5, 2".to_string()).dash_pattern(),
            Some(vec![10.0, 5.0, 2.0])
        );
        assert_eq!(StrokeStyle::Custom("0,0".to_string()).dash_pattern(), None);
        assert_eq!(StrokeStyle::Custom("garbage".to_string()).dash_pattern(), None);
    }

    #[test]
    fn test_stroke_cap_from_str() {
        assert_eq!("round".parse::<StrokeCap>().unwrap(), StrokeCap::Round);

        let result = "pointy".parse::<StrokeCap>();
        assert!(result.unwrap_err().contains("invalid stroke cap"));
    }
}
