//! Numeral fonts for raster callouts.
//!
//! Fonts are resolved once through a [`FontChain`]: an ordered list of font
//! files where the first file that loads wins. A loaded file is shaped and
//! rasterized with `cosmic-text`. When nothing loads, a built-in 5x7 bitmap
//! font covering the digits `0`-`9` is used unless it has been disabled.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, SwashCache, fontdb};
use image::{Pixel, Rgba, RgbaImage};
use imageproc::{
    drawing::{Blend, draw_filled_rect_mut},
    rect::Rect,
};
use log::{debug, info, warn};

use callout_core::geometry::Point;

use crate::RasterError;

const DIGIT_ROWS: usize = 7;
const DIGIT_COLS: u32 = 5;

/// 5x7 glyphs for the digits 0-9, one row per byte, most significant of the
/// low five bits on the left.
const DIGIT_PATTERNS: [[u8; DIGIT_ROWS]; 10] = [
    [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
    [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
    [0b01110, 0b10001, 0b00001, 0b00110, 0b01000, 0b10000, 0b11111],
    [0b01110, 0b10001, 0b00001, 0b00110, 0b00001, 0b10001, 0b01110],
    [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
    [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
    [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
    [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
    [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
    [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
];

/// Ordered font candidates plus the built-in fallback switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontChain {
    candidates: Vec<PathBuf>,
    builtin_fallback: bool,
}

impl Default for FontChain {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            builtin_fallback: true,
        }
    }
}

impl FontChain {
    /// Creates a chain trying `candidates` in order.
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self {
            candidates,
            ..Self::default()
        }
    }

    /// Enables or disables the built-in bitmap digits used when no candidate
    /// loads.
    pub fn with_builtin_fallback(mut self, enabled: bool) -> Self {
        self.builtin_fallback = enabled;
        self
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    pub fn builtin_fallback(&self) -> bool {
        self.builtin_fallback
    }

    /// Loads the first usable candidate.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::FontUnavailable`] when no candidate loads and
    /// the built-in fallback is disabled.
    pub fn resolve(&self) -> Result<NumeralFont, RasterError> {
        for path in &self.candidates {
            match ShapedFont::load(path) {
                Ok(font) => {
                    info!(path:? = path, family = font.family.as_str(); "Loaded numeral font");
                    return Ok(NumeralFont::Shaped(Box::new(Mutex::new(font))));
                }
                Err(reason) => {
                    debug!(path:? = path, reason = reason.as_str(); "Skipping font candidate");
                }
            }
        }

        if self.builtin_fallback {
            if !self.candidates.is_empty() {
                warn!(
                    candidates = self.candidates.len();
                    "No configured font could be loaded, using built-in digits"
                );
            }
            Ok(NumeralFont::Builtin)
        } else {
            Err(RasterError::FontUnavailable(format!(
                "none of {} configured font(s) could be loaded and the built-in font is disabled",
                self.candidates.len()
            )))
        }
    }
}

/// A resolved font able to draw centered numerals.
#[derive(Debug)]
pub enum NumeralFont {
    /// A font file shaped and rasterized by `cosmic-text`.
    Shaped(Box<Mutex<ShapedFont>>),
    /// The built-in bitmap digits.
    Builtin,
}

impl NumeralFont {
    /// Returns `true` for the built-in bitmap font.
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }

    /// Draws `text` centered on `center`, `size` pixels tall.
    pub fn draw_centered(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        center: Point,
        size: f32,
        color: Rgba<u8>,
    ) {
        if text.is_empty() || !size.is_finite() || size <= 0.0 {
            return;
        }
        let reach = size * (text.chars().count() as f32 + 1.0);
        if !within_reach(canvas, center, reach) {
            return;
        }
        match self {
            Self::Shaped(font) => font
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .draw_centered(canvas, text, center, size, color),
            Self::Builtin => draw_builtin_centered(canvas, text, center, size, color),
        }
    }
}

/// A single font file loaded into its own font system.
pub struct ShapedFont {
    font_system: FontSystem,
    swash_cache: SwashCache,
    family: String,
}

impl std::fmt::Debug for ShapedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapedFont")
            .field("family", &self.family)
            .finish_non_exhaustive()
    }
}

impl ShapedFont {
    fn load(path: &Path) -> Result<Self, String> {
        let data = fs::read(path).map_err(|err| err.to_string())?;

        let mut db = fontdb::Database::new();
        db.load_font_data(data);
        let family = db
            .faces()
            .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
            .ok_or_else(|| "file contains no usable font face".to_string())?;

        Ok(Self {
            font_system: FontSystem::new_with_locale_and_db("en-US".to_string(), db),
            swash_cache: SwashCache::new(),
            family,
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    fn draw_centered(
        &mut self,
        canvas: &mut RgbaImage,
        text: &str,
        center: Point,
        size: f32,
        color: Rgba<u8>,
    ) {
        let metrics = Metrics::new(size, size);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        let mut buffer = buffer.borrow_with(&mut self.font_system);

        let attrs = Attrs::new().family(Family::Name(&self.family));
        buffer.set_size(None, None);
        buffer.set_text(text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(true);

        let (width, mid_line) = buffer
            .layout_runs()
            .next()
            .map(|run| (run.line_w, run.line_top + run.line_height / 2.0))
            .unwrap_or((0.0, size / 2.0));

        let origin_x = (center.x() - width / 2.0).round() as i32;
        let origin_y = (center.y() - mid_line).round() as i32;
        let [r, g, b, a] = color.0;
        let text_color = cosmic_text::Color::rgba(r, g, b, a);

        buffer.draw(&mut self.swash_cache, text_color, |x, y, w, h, glyph_color| {
            let coverage = Rgba([
                glyph_color.r(),
                glyph_color.g(),
                glyph_color.b(),
                glyph_color.a(),
            ]);
            for dy in 0..h as i32 {
                for dx in 0..w as i32 {
                    blend_pixel(canvas, origin_x + x + dx, origin_y + y + dy, coverage);
                }
            }
        });
    }
}

/// Returns `true` if anything drawn within `reach` of `center` could land on
/// the canvas.
pub(crate) fn within_reach(canvas: &RgbaImage, center: Point, reach: f32) -> bool {
    center.x().is_finite()
        && center.y().is_finite()
        && center.x() + reach >= 0.0
        && center.y() + reach >= 0.0
        && center.x() - reach <= canvas.width() as f32
        && center.y() - reach <= canvas.height() as f32
}

fn blend_pixel(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x < 0 || y < 0 || color[3] == 0 {
        return;
    }
    if let Some(pixel) = canvas.get_pixel_mut_checked(x as u32, y as u32) {
        pixel.blend(&color);
    }
}

/// Draws digits from the bitmap font. Characters other than `0`-`9` are
/// skipped. Glyph height is 70% of `size`, approximating a cap height.
fn draw_builtin_centered(
    canvas: &mut RgbaImage,
    text: &str,
    center: Point,
    size: f32,
    color: Rgba<u8>,
) {
    let digits: Vec<usize> = text
        .chars()
        .filter_map(|ch| ch.to_digit(10))
        .map(|d| d as usize)
        .collect();
    if digits.is_empty() {
        return;
    }

    let cell = ((size * 0.7) / DIGIT_ROWS as f32).round().max(1.0) as u32;
    let advance = (DIGIT_COLS + 1) * cell;
    let width = advance * digits.len() as u32 - cell;
    let height = DIGIT_ROWS as u32 * cell;

    let left = (center.x() - width as f32 / 2.0).round() as i32;
    let top = (center.y() - height as f32 / 2.0).round() as i32;

    let mut blend = Blend(std::mem::replace(canvas, RgbaImage::new(0, 0)));
    for (i, digit) in digits.iter().enumerate() {
        let glyph_left = left + (i as u32 * advance) as i32;
        for (row, bits) in DIGIT_PATTERNS[*digit].iter().enumerate() {
            for col in 0..DIGIT_COLS {
                if (bits >> (DIGIT_COLS - 1 - col)) & 1 == 1 {
                    let rect = Rect::at(
                        glyph_left + (col * cell) as i32,
                        top + (row as u32 * cell) as i32,
                    )
                    .of_size(cell, cell);
                    draw_filled_rect_mut(&mut blend, rect, color);
                }
            }
        }
    }
    *canvas = blend.0;
}
