//! Error types for Callout operations.
//!
//! This module provides the main error type [`CalloutError`], which folds the
//! errors of the document codec, the raster compositor and the artifact store
//! into one taxonomy:
//!
//! - [`CalloutError::Validation`]: bad annotation fields; nothing was written.
//! - [`CalloutError::Decode`]: unreadable image or document bytes.
//! - [`CalloutError::FormatMismatch`]: a structured operation was given a
//!   legacy raster, or the reverse. Callers can fall back to the other path.
//! - [`CalloutError::ResourceUnavailable`]: no usable numeral font.

use std::{error::Error as StdError, io};

use thiserror::Error;

use callout_core::annotation::IndexedValidationError;
use callout_raster::RasterError;

use crate::{document, store::StoreError};

/// The main error type for Callout operations.
#[derive(Debug, Error)]
pub enum CalloutError {
    #[error("invalid annotation: {0}")]
    Validation(#[from] IndexedValidationError),

    #[error("decode error: {0}")]
    Decode(Box<dyn StdError + Send + Sync>),

    #[error("format mismatch: {0}")]
    FormatMismatch(String),

    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl CalloutError {
    /// Returns `true` if the error means the input was a legacy raster where a
    /// structured document was expected, or the reverse.
    pub fn is_format_mismatch(&self) -> bool {
        matches!(self, Self::FormatMismatch(_))
    }
}

impl From<document::Error> for CalloutError {
    fn from(error: document::Error) -> Self {
        match error {
            document::Error::NotAStructuredDocument => Self::FormatMismatch(error.to_string()),
            document::Error::Validation(err) => Self::Validation(err),
            other => Self::Decode(Box::new(other)),
        }
    }
}

impl From<RasterError> for CalloutError {
    fn from(error: RasterError) -> Self {
        match error {
            RasterError::Validation(err) => Self::Validation(err),
            RasterError::ImageDecode(err) => Self::Decode(Box::new(err)),
            RasterError::FontUnavailable(reason) => Self::ResourceUnavailable(reason),
            RasterError::Encode(reason) => Self::Io(io::Error::other(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use callout_core::annotation::ValidationError;

    use super::*;

    #[test]
    fn test_document_errors_map_to_taxonomy() {
        let err = CalloutError::from(document::Error::NotAStructuredDocument);
        assert!(err.is_format_mismatch());

        let err = CalloutError::from(document::Error::MissingSourceImage);
        assert!(matches!(err, CalloutError::Decode(_)));

        let err = CalloutError::from(document::Error::Validation(IndexedValidationError {
            index: 2,
            source: ValidationError::InvalidId(0),
        }));
        assert!(matches!(err, CalloutError::Validation(IndexedValidationError { index: 2, .. })));
    }

    #[test]
    fn test_raster_errors_map_to_taxonomy() {
        let err = CalloutError::from(RasterError::FontUnavailable("none".to_string()));
        assert!(matches!(err, CalloutError::ResourceUnavailable(_)));

        let err = CalloutError::from(RasterError::Encode("disk full".to_string()));
        assert!(matches!(err, CalloutError::Io(_)));
    }
}
