//! Supersampled re-compositing of callouts onto a clean source image.
//!
//! Every render starts from the untouched source bytes, so saving the same
//! diagram repeatedly never accumulates resampling or compression loss:
//!
//! 1. Decode the source and stretch it to `canvas × factor` (Lanczos3).
//! 2. Paste it onto an opaque white canvas of the same size.
//! 3. Draw each callout in input order: leader line, anchor dot, bubble,
//!    numeral.
//! 4. Reduce to `canvas` (Lanczos3) and encode with print DPI metadata.

use std::path::PathBuf;

use image::{DynamicImage, Pixel, Rgba, RgbaImage, imageops};
use imageproc::{
    drawing::{Blend, draw_filled_circle_mut, draw_filled_rect_mut},
    rect::Rect,
};
use log::{debug, info, warn};

use callout_core::{
    annotation::{Annotation, validate_all},
    color::Color,
    draw::{Callout, CalloutDefinition, CalloutGeometry},
    geometry::CanvasSize,
};

use crate::{
    RasterError,
    disk::{DEFAULT_DISK_SUPERSAMPLE, DiskCache},
    encode::{self, RasterFormat},
    font::{FontChain, NumeralFont, within_reach},
};

/// Supersampling factor of the whole composite unless configured otherwise.
pub const DEFAULT_SUPERSAMPLE: u32 = 4;
/// Print resolution written into rendered artifacts unless configured otherwise.
pub const DEFAULT_DPI: u32 = 300;
/// JPEG quality used when [`RasterFormat::Jpeg`] is selected.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Settings of a [`Compositor`].
///
/// # Examples
///
/// ```
/// # use callout_raster::{RasterFormat, RasterOptions};
/// # use callout_core::geometry::CanvasSize;
/// let options = RasterOptions::default()
///     .with_canvas(CanvasSize::new(400, 300))
///     .with_format(RasterFormat::Jpeg)
///     .with_dpi(150);
/// assert_eq!(options.supersample(), 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RasterOptions {
    canvas: CanvasSize,
    supersample: u32,
    disk_supersample: u32,
    dpi: u32,
    format: RasterFormat,
    jpeg_quality: u8,
    fonts: FontChain,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            supersample: DEFAULT_SUPERSAMPLE,
            disk_supersample: DEFAULT_DISK_SUPERSAMPLE,
            dpi: DEFAULT_DPI,
            format: RasterFormat::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            fonts: FontChain::default(),
        }
    }
}

impl RasterOptions {
    pub fn with_canvas(mut self, canvas: CanvasSize) -> Self {
        self.canvas = canvas;
        self
    }

    /// Sets the supersampling factor of the composite. Zero is treated as one.
    pub fn with_supersample(mut self, factor: u32) -> Self {
        self.supersample = factor.max(1);
        self
    }

    /// Sets the supersampling factor of bubble disks. Zero is treated as one.
    pub fn with_disk_supersample(mut self, factor: u32) -> Self {
        self.disk_supersample = factor.max(1);
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_format(mut self, format: RasterFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Sets the ordered list of font files tried for numerals.
    pub fn with_fonts(mut self, fonts: Vec<PathBuf>) -> Self {
        self.fonts = FontChain::new(fonts).with_builtin_fallback(self.fonts.builtin_fallback());
        self
    }

    /// Enables or disables the built-in bitmap digits.
    pub fn with_builtin_font(mut self, enabled: bool) -> Self {
        self.fonts = self.fonts.with_builtin_fallback(enabled);
        self
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn supersample(&self) -> u32 {
        self.supersample
    }

    pub fn disk_supersample(&self) -> u32 {
        self.disk_supersample
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn format(&self) -> RasterFormat {
        self.format
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    pub fn fonts(&self) -> &FontChain {
        &self.fonts
    }
}

/// Renders raster artifacts from clean source images.
///
/// The numeral font is resolved when the compositor is built, and bubble
/// disks are cached across renders. A compositor can be shared between
/// threads.
#[derive(Debug)]
pub struct Compositor {
    options: RasterOptions,
    definition: CalloutDefinition,
    font: NumeralFont,
    disks: DiskCache,
}

impl Compositor {
    /// Builds a compositor, resolving the numeral font.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::FontUnavailable`] when no configured font loads
    /// and the built-in font is disabled.
    pub fn new(options: RasterOptions, definition: CalloutDefinition) -> Result<Self, RasterError> {
        let font = options.fonts().resolve()?;
        info!(
            canvas_width = options.canvas().width(),
            canvas_height = options.canvas().height(),
            supersample = options.supersample(),
            builtin_font = font.is_builtin();
            "Compositor ready"
        );
        Ok(Self {
            options,
            definition,
            font,
            disks: DiskCache::new(),
        })
    }

    pub fn options(&self) -> &RasterOptions {
        &self.options
    }

    pub fn definition(&self) -> &CalloutDefinition {
        &self.definition
    }

    /// Renders `annotations` over `source` and returns the encoded artifact.
    ///
    /// `source` is only read. Identical inputs produce identical bytes.
    ///
    /// # Errors
    ///
    /// - [`RasterError::Validation`] if any annotation is invalid; nothing is
    ///   drawn in that case.
    /// - [`RasterError::ImageDecode`] if `source` is not a decodable image.
    /// - [`RasterError::Encode`] if the output cannot be encoded.
    pub fn render(&self, source: &[u8], annotations: &[Annotation]) -> Result<Vec<u8>, RasterError> {
        validate_all(annotations)?;

        let composed = self.compose(source, annotations)?;
        let bytes = encode::encode(
            &composed,
            self.options.format(),
            self.options.dpi(),
            self.options.jpeg_quality(),
        )?;

        info!(
            annotations = annotations.len(),
            format:% = self.options.format(),
            bytes = bytes.len();
            "Raster rendered"
        );
        Ok(bytes)
    }

    /// Produces the final canvas-sized image without encoding it.
    fn compose(&self, source: &[u8], annotations: &[Annotation]) -> Result<image::RgbImage, RasterError> {
        let canvas = self.options.canvas();
        let factor = self.options.supersample();
        let big = canvas.scale(factor);

        let decoded = image::load_from_memory(source).map_err(RasterError::ImageDecode)?;
        debug!(
            source_width = decoded.width(),
            source_height = decoded.height();
            "Source decoded"
        );

        let stretched = imageops::resize(
            &decoded.to_rgba8(),
            big.width(),
            big.height(),
            imageops::FilterType::Lanczos3,
        );
        let mut surface = RgbaImage::from_pixel(big.width(), big.height(), WHITE);
        imageops::overlay(&mut surface, &stretched, 0, 0);

        for annotation in annotations {
            if !canvas.contains(annotation.anchor()) {
                warn!(id = annotation.id, x = annotation.x, y = annotation.y; "Annotation lies outside the canvas");
            }
            let geometry = Callout::new(&self.definition, annotation, canvas).geometry(factor as f32);
            surface = self.draw_callout(surface, annotation, &geometry);
        }

        let reduced = imageops::resize(
            &surface,
            canvas.width(),
            canvas.height(),
            imageops::FilterType::Lanczos3,
        );
        Ok(DynamicImage::ImageRgba8(reduced).to_rgb8())
    }

    fn draw_callout(
        &self,
        surface: RgbaImage,
        annotation: &Annotation,
        geometry: &CalloutGeometry,
    ) -> RgbaImage {
        let factor = self.options.supersample() as f32;
        let leader = self.definition.leader();

        let mut blend = Blend(surface);
        draw_leader(
            &mut blend,
            geometry,
            leader
                .style()
                .dash_pattern()
                .map(|runs| runs.into_iter().map(|len| len * factor).collect()),
            rgba(leader.color()),
        );
        draw_dot(&mut blend, geometry, rgba(self.definition.anchor_color()));
        let mut surface = blend.0;

        let diameter = geometry.bubble_diameter_px();
        let disk = self.disks.get(diameter, self.options.disk_supersample());
        paste_disk(
            &mut surface,
            &disk,
            geometry,
            rgba(self.definition.bubble_color()),
        );

        self.font.draw_centered(
            &mut surface,
            &annotation.id.to_string(),
            geometry.bubble_center(),
            geometry.font_size,
            rgba(self.definition.numeral_color()),
        );
        surface
    }
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba(color.to_rgba8())
}

/// Draws the horizontal leader from `line_start` to `anchor`, starting the
/// dash pattern at `line_start`.
fn draw_leader(
    blend: &mut Blend<RgbaImage>,
    geometry: &CalloutGeometry,
    dashes: Option<Vec<f32>>,
    color: Rgba<u8>,
) {
    let width = geometry.leader_width.max(1.0);
    let y = geometry.line_start.y();
    let start = geometry.line_start.x();
    let end = geometry.anchor.x();
    let length = (end - start).abs();
    let direction = if end >= start { 1.0 } else { -1.0 };

    let (canvas_w, canvas_h) = blend.0.dimensions();
    let top = (y - width / 2.0).round();
    let bottom = top + width.round().max(1.0);
    if bottom <= 0.0 || top >= canvas_h as f32 {
        return;
    }

    let mut fill_span = |from: f32, to: f32| {
        let left = (start + direction * from).min(start + direction * to);
        let right = (start + direction * from).max(start + direction * to);
        let left = left.round().max(0.0);
        let right = right.round().min(canvas_w as f32);
        let clipped_top = top.max(0.0);
        let clipped_bottom = bottom.min(canvas_h as f32);
        if right <= left || clipped_bottom <= clipped_top {
            return;
        }
        let rect = Rect::at(left as i32, clipped_top as i32)
            .of_size((right - left) as u32, (clipped_bottom - clipped_top) as u32);
        draw_filled_rect_mut(blend, rect, color);
    };

    match dashes {
        None => fill_span(0.0, length),
        Some(runs) => {
            let mut offset = 0.0;
            let mut on = true;
            for run in runs.iter().cycle() {
                if offset >= length {
                    break;
                }
                let stop = (offset + run).min(length);
                if on {
                    fill_span(offset, stop);
                }
                offset = stop;
                on = !on;
            }
        }
    }
}

fn draw_dot(blend: &mut Blend<RgbaImage>, geometry: &CalloutGeometry, color: Rgba<u8>) {
    let radius = geometry.anchor_radius.round();
    if radius < 1.0 || !within_reach(&blend.0, geometry.anchor, radius) {
        return;
    }
    let center = (
        geometry.anchor.x().round() as i32,
        geometry.anchor.y().round() as i32,
    );
    draw_filled_circle_mut(blend, center, radius as i32, color);
}

/// Paints `disk` tinted with `color`, centered on the bubble center.
fn paste_disk(surface: &mut RgbaImage, disk: &RgbaImage, geometry: &CalloutGeometry, color: Rgba<u8>) {
    let (size, _) = disk.dimensions();
    if size == 0 || !within_reach(surface, geometry.bubble_center(), size as f32) {
        return;
    }
    let left = (geometry.bubble_center().x() - size as f32 / 2.0).round() as i64;
    let top = (geometry.bubble_center().y() - size as f32 / 2.0).round() as i64;
    let (surface_w, surface_h) = surface.dimensions();

    for (dx, dy, coverage) in disk.enumerate_pixels() {
        let x = left + i64::from(dx);
        let y = top + i64::from(dy);
        if x < 0 || y < 0 || x >= i64::from(surface_w) || y >= i64::from(surface_h) {
            continue;
        }
        let alpha = (u16::from(coverage[3]) * u16::from(color[3]) / 255) as u8;
        if alpha == 0 {
            continue;
        }
        let tinted = Rgba([color[0], color[1], color[2], alpha]);
        surface.get_pixel_mut(x as u32, y as u32).blend(&tinted);
    }
}
