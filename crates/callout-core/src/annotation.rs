//! The annotation model: numbered callouts anchored on a diagram.
//!
//! An [`Annotation`] is plain data. It carries no rendering behavior; both the
//! raster compositor and the vector document consume it through
//! [`Callout`](crate::draw::Callout). The only operation defined here is
//! validation.
//!
//! # Example
//!
//! ```
//! # use callout_core::annotation::{Annotation, Side};
//! let ann = Annotation::new(1, 250.0, 50.0, Side::Left);
//! assert!(ann.validate().is_ok());
//!
//! let bad = Annotation::new(0, 250.0, 50.0, Side::Left);
//! assert!(bad.validate().is_err());
//! ```

use std::{fmt, str::FromStr};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Point;

/// The edge whose fixed vertical line a callout's leader line starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Picks the side closest to `x` on a canvas of the given width.
    ///
    /// Points strictly left of the vertical center get [`Side::Left`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use callout_core::annotation::Side;
    /// assert_eq!(Side::for_x(100.0, 700), Side::Left);
    /// assert_eq!(Side::for_x(350.0, 700), Side::Right);
    /// ```
    pub fn for_x(x: f32, canvas_width: u32) -> Self {
        if x < canvas_width as f32 / 2.0 {
            Self::Left
        } else {
            Self::Right
        }
    }

    /// Returns the textual form used in documents and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(ValidationError::InvalidSide(s.to_string())),
        }
    }
}

/// The coordinate axis named in a [`ValidationError::InvalidCoordinate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("x"),
            Self::Y => f.write_str("y"),
        }
    }
}

/// Reasons an annotation is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("annotation id must be a positive integer, got {0}")]
    InvalidId(i64),

    #[error("annotation {axis} coordinate must be finite and non-negative, got {value}")]
    InvalidCoordinate { axis: Axis, value: f32 },

    #[error("annotation side must be `left` or `right`, got `{0}`")]
    InvalidSide(String),
}

/// A validation failure tied to its position in an annotation list.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("annotation #{index}: {source}")]
pub struct IndexedValidationError {
    pub index: usize,
    #[source]
    pub source: ValidationError,
}

/// A numbered callout: a label, the point it designates, and the side its
/// bubble sits on.
///
/// Coordinates are in canvas units. Points outside the canvas are legal and
/// simply render off-canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub side: Side,
}

impl Annotation {
    pub fn new(id: u32, x: f32, y: f32, side: Side) -> Self {
        Self { id, x, y, side }
    }

    /// Returns the annotated point.
    pub fn anchor(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Checks the annotation's fields.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::InvalidId`] when `id` is zero.
    /// - [`ValidationError::InvalidCoordinate`] when `x` or `y` is negative,
    ///   NaN or infinite.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id == 0 {
            return Err(ValidationError::InvalidId(0));
        }
        check_coordinate(Axis::X, self.x)?;
        check_coordinate(Axis::Y, self.y)?;
        Ok(())
    }
}

fn check_coordinate(axis: Axis, value: f32) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidCoordinate { axis, value })
    }
}

/// Validates every annotation, stopping at the first failure.
///
/// # Errors
///
/// Returns the failing annotation's index together with the reason.
pub fn validate_all(annotations: &[Annotation]) -> Result<(), IndexedValidationError> {
    annotations
        .iter()
        .enumerate()
        .try_for_each(|(index, annotation)| {
            annotation.validate().map_err(|source| {
                debug!(index, id = annotation.id; "Annotation rejected: {source}");
                IndexedValidationError { index, source }
            })
        })
}

/// Returns the label an editor should propose for the next callout.
///
/// # Examples
///
/// ```
/// # use callout_core::annotation::{next_id, Annotation, Side};
/// assert_eq!(next_id(&[]), 1);
///
/// let anns = [
///     Annotation::new(4, 10.0, 10.0, Side::Left),
///     Annotation::new(2, 10.0, 20.0, Side::Left),
/// ];
/// assert_eq!(next_id(&anns), 5);
/// ```
pub fn next_id(annotations: &[Annotation]) -> u32 {
    annotations
        .iter()
        .map(|a| a.id)
        .max()
        .map_or(1, |max| max.saturating_add(1))
}
