//! Geometric primitives for callout placement.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in canvas space
//! - [`CanvasSize`] - The fixed logical size shared by all diagrams
//!
//! # Coordinate System
//!
//! Callout uses a coordinate system consistent with SVG and raster images:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! - **Origin**: Top-left corner at `(0, 0)`
//! - **X-axis**: Increases rightward
//! - **Y-axis**: Increases downward

use serde::Deserialize;

/// A 2D point representing a position in canvas coordinate space.
///
/// # Examples
///
/// ```
/// # use callout_core::geometry::Point;
/// let anchor = Point::new(250.0, 50.0);
///
/// let supersampled = anchor.scale(4.0);
/// assert_eq!(supersampled.x(), 1000.0);
/// assert_eq!(supersampled.y(), 200.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Multiplies both coordinates by the given factor.
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

/// The logical canvas size in whole pixels.
///
/// Every diagram of a deployment shares one canvas size; the source image is
/// stretched to it and annotation coordinates are expressed in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct CanvasSize {
    width: u32,
    height: u32,
}

impl CanvasSize {
    /// Canvas size used by product sheets unless configured otherwise.
    pub const DEFAULT: CanvasSize = CanvasSize {
        width: 700,
        height: 900,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn width(self) -> u32 {
        self.width
    }

    pub fn height(self) -> u32 {
        self.height
    }

    /// Returns the canvas size multiplied by a supersampling factor.
    ///
    /// # Examples
    ///
    /// ```
    /// # use callout_core::geometry::CanvasSize;
    /// let big = CanvasSize::new(700, 900).scale(4);
    /// assert_eq!((big.width(), big.height()), (2800, 3600));
    /// ```
    pub fn scale(self, factor: u32) -> Self {
        Self {
            width: self.width.saturating_mul(factor),
            height: self.height.saturating_mul(factor),
        }
    }

    /// Returns `true` if the point lies inside the canvas, edges included.
    pub fn contains(self, point: Point) -> bool {
        point.x() >= 0.0
            && point.y() >= 0.0
            && point.x() <= self.width as f32
            && point.y() <= self.height as f32
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}
