//! Configuration types for Callout rendering.
//!
//! This module provides configuration structures that control the canvas,
//! the look of callouts, and raster output. All types implement
//! [`serde::Deserialize`] for flexible loading from external sources, and
//! every section falls back to its defaults when omitted.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining all sections.
//! - [`CanvasConfig`] - The logical canvas size shared by all diagrams.
//! - [`StyleConfig`] - Callout geometry, colors, leader pattern and numeral font family.
//! - [`RasterConfig`] - Supersampling, print DPI, output format and fonts.
//!
//! # Example
//!
//! ```
//! # use callout::config::AppConfig;
//! // Use default configuration
//! let config = AppConfig::default();
//! assert_eq!(config.canvas().size().width(), 700);
//! assert!(config.style().callout_definition().is_ok());
//! ```

use std::path::PathBuf;

use serde::Deserialize;

use callout_core::{
    color::Color,
    draw::{CalloutDefinition, StrokeCap, StrokeDefinition, StrokeStyle, TextDefinition},
    geometry::CanvasSize,
};
use callout_raster::{
    DEFAULT_DPI, DEFAULT_JPEG_QUALITY, DEFAULT_SUPERSAMPLE, RasterFormat, RasterOptions,
    disk::DEFAULT_DISK_SUPERSAMPLE,
};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Canvas configuration section.
    #[serde(default)]
    canvas: CanvasConfig,

    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,

    /// Raster configuration section.
    #[serde(default)]
    raster: RasterConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(canvas: CanvasConfig, style: StyleConfig, raster: RasterConfig) -> Self {
        Self {
            canvas,
            style,
            raster,
        }
    }

    /// Returns the canvas configuration.
    pub fn canvas(&self) -> &CanvasConfig {
        &self.canvas
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Returns the raster configuration.
    pub fn raster(&self) -> &RasterConfig {
        &self.raster
    }

    /// Builds compositor options from the canvas and raster sections.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas has a zero dimension or the configured
    /// output format is not recognized.
    pub fn raster_options(&self) -> Result<RasterOptions, String> {
        let canvas = self.canvas.validated_size()?;
        let raster = &self.raster;
        Ok(RasterOptions::default()
            .with_canvas(canvas)
            .with_supersample(raster.supersample)
            .with_disk_supersample(raster.disk_supersample)
            .with_dpi(raster.dpi)
            .with_format(raster.format()?)
            .with_jpeg_quality(raster.jpeg_quality)
            .with_fonts(raster.fonts.clone())
            .with_builtin_font(raster.builtin_font))
    }
}

/// The logical canvas every diagram is stretched to.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    width: u32,
    height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: CanvasSize::DEFAULT.width(),
            height: CanvasSize::DEFAULT.height(),
        }
    }
}

impl CanvasConfig {
    pub fn size(&self) -> CanvasSize {
        CanvasSize::new(self.width, self.height)
    }

    /// Returns the canvas size, rejecting zero dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if `width` or `height` is zero.
    pub fn validated_size(&self) -> Result<CanvasSize, String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "Invalid canvas size in config: {}x{}",
                self.width, self.height
            ));
        }
        Ok(self.size())
    }
}

/// Callout geometry and colors, in canvas units.
///
/// Colors are CSS color strings and are parsed when the
/// [`CalloutDefinition`] is built.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    leader_offset: f32,
    bubble_radius: f32,
    anchor_radius: f32,
    font_size: f32,
    font_family: String,
    font_weight: String,
    leader_width: f32,
    leader_color: String,
    /// `solid`, `dashed`, `dotted` or a dasharray such as `"6,3"`.
    leader_style: String,
    leader_cap: String,
    bubble_color: String,
    numeral_color: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        let definition = CalloutDefinition::default();
        Self {
            leader_offset: definition.leader_offset(),
            bubble_radius: definition.bubble_radius(),
            anchor_radius: definition.anchor_radius(),
            font_size: definition.numeral().font_size(),
            font_family: definition.numeral().font_family().to_string(),
            font_weight: definition.numeral().font_weight().to_string(),
            leader_width: definition.leader().width(),
            leader_color: "black".to_string(),
            leader_style: "solid".to_string(),
            leader_cap: "butt".to_string(),
            bubble_color: "black".to_string(),
            numeral_color: "white".to_string(),
        }
    }
}

impl StyleConfig {
    /// Builds the [`CalloutDefinition`] described by this section.
    ///
    /// # Errors
    ///
    /// Returns an error if a color string cannot be parsed or a length is
    /// negative or not finite.
    pub fn callout_definition(&self) -> Result<CalloutDefinition, String> {
        for (name, value) in [
            ("leader_offset", self.leader_offset),
            ("bubble_radius", self.bubble_radius),
            ("anchor_radius", self.anchor_radius),
            ("font_size", self.font_size),
            ("leader_width", self.leader_width),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("Invalid {name} in config: {value}"));
            }
        }

        let leader_color = parse_color("leader_color", &self.leader_color)?;
        let bubble_color = parse_color("bubble_color", &self.bubble_color)?;
        let numeral_color = parse_color("numeral_color", &self.numeral_color)?;

        let mut leader = StrokeDefinition::solid(leader_color, self.leader_width);
        leader.set_style(
            self.leader_style
                .parse::<StrokeStyle>()
                .map_err(|err| format!("Invalid leader_style in config: {err}"))?,
        );
        leader.set_cap(
            self.leader_cap
                .parse::<StrokeCap>()
                .map_err(|err| format!("Invalid leader_cap in config: {err}"))?,
        );

        let mut numeral = TextDefinition::new();
        numeral.set_font_family(&self.font_family);
        numeral.set_font_size(self.font_size);
        numeral.set_font_weight(&self.font_weight);
        numeral.set_color(Some(numeral_color));

        let mut definition = CalloutDefinition::new();
        definition.set_leader_offset(self.leader_offset);
        definition.set_bubble_radius(self.bubble_radius);
        definition.set_anchor_radius(self.anchor_radius);
        definition.set_leader(leader);
        definition.set_anchor_color(leader_color);
        definition.set_bubble_color(bubble_color);
        definition.set_numeral(numeral);
        Ok(definition)
    }
}

fn parse_color(name: &str, value: &str) -> Result<Color, String> {
    Color::new(value).map_err(|err| format!("Invalid {name} in config: {err}"))
}

/// Raster output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    supersample: u32,
    disk_supersample: u32,
    dpi: u32,
    format: String,
    jpeg_quality: u8,
    /// Font files tried in order for numerals.
    fonts: Vec<PathBuf>,
    /// Whether the built-in bitmap digits may be used when no font loads.
    builtin_font: bool,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            supersample: DEFAULT_SUPERSAMPLE,
            disk_supersample: DEFAULT_DISK_SUPERSAMPLE,
            dpi: DEFAULT_DPI,
            format: RasterFormat::default().to_string(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            fonts: Vec::new(),
            builtin_font: true,
        }
    }
}

impl RasterConfig {
    /// Returns the parsed output format.
    ///
    /// # Errors
    ///
    /// Returns an error if the format is neither `png` nor `jpeg`.
    pub fn format(&self) -> Result<RasterFormat, String> {
        self.format
            .parse()
            .map_err(|err| format!("Invalid raster format in config: {err}"))
    }

    pub fn fonts(&self) -> &[PathBuf] {
        &self.fonts
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_library_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.canvas().size(), CanvasSize::DEFAULT);
        assert_eq!(
            config.style().callout_definition().unwrap(),
            CalloutDefinition::default()
        );
        assert_eq!(config.raster_options().unwrap(), RasterOptions::default());
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r##"
            [canvas]
            width = 800

            [style]
            bubble_radius = 24.0
            bubble_color = "#cc0000"

            leader_style = "dashed"
            font_weight = "normal"

            [raster]
            format = "jpeg"
            fonts = ["/opt/fonts/Inter-Bold.ttf"]
            "##,
        )
        .unwrap();

        assert_eq!(config.canvas().size(), CanvasSize::new(800, 900));

        let definition = config.style().callout_definition().unwrap();
        assert_eq!(definition.bubble_radius(), 24.0);
        assert_eq!(definition.bubble_color().to_rgba8(), [204, 0, 0, 255]);
        assert_eq!(definition.leader_offset(), 50.0);
        assert_eq!(*definition.leader().style(), StrokeStyle::Dashed);
        assert_eq!(definition.numeral().font_weight(), "normal");

        let options = config.raster_options().unwrap();
        assert_eq!(options.format(), RasterFormat::Jpeg);
        assert_eq!(options.supersample(), 4);
        assert_eq!(
            options.fonts().candidates(),
            &[PathBuf::from("/opt/fonts/Inter-Bold.ttf")]
        );
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.canvas().size(), CanvasSize::DEFAULT);
        assert_eq!(config.raster().dpi(), 300);
    }

    #[test]
    fn test_invalid_values_reported() {
        let config: AppConfig = toml::from_str(
            r#"
            [style]
            leader_color = "not-a-color"
            "#,
        )
        .unwrap();
        let err = config.style().callout_definition().unwrap_err();
        assert!(err.contains("leader_color"));

        let config: AppConfig = toml::from_str("[raster]\nformat = \"gif\"").unwrap();
        assert!(config.raster_options().unwrap_err().contains("raster format"));

        let config: AppConfig = toml::from_str("[style]\nleader_cap = \"pointy\"").unwrap();
        assert!(config.style().callout_definition().unwrap_err().contains("leader_cap"));

        let config: AppConfig = toml::from_str("[style]\nbubble_radius = -2.0").unwrap();
        assert!(config.style().callout_definition().is_err());
    }

    #[test]
    fn test_zero_canvas_rejected() {
        for section in ["[canvas]\nwidth = 0", "[canvas]\nheight = 0"] {
            let config: AppConfig = toml::from_str(section).unwrap();
            let err = config.raster_options().unwrap_err();
            assert!(err.contains("canvas size"), "unexpected error: {err}");
        }
    }
}
