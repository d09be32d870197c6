//! Error types for raster compositing.

use thiserror::Error;

use callout_core::annotation::IndexedValidationError;

/// Errors produced while compositing a raster artifact.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error(transparent)]
    Validation(#[from] IndexedValidationError),

    #[error("failed to decode source image: {0}")]
    ImageDecode(#[source] image::ImageError),

    #[error("no usable font for callout numerals: {0}")]
    FontUnavailable(String),

    #[error("failed to encode rendered image: {0}")]
    Encode(String),
}

impl From<png::EncodingError> for RasterError {
    fn from(err: png::EncodingError) -> Self {
        Self::Encode(err.to_string())
    }
}
