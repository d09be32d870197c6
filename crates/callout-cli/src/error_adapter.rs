//! Error adapter for converting CalloutError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI. Every error gets a
//! stable code, and the common mistakes get a hint on how to recover.

use std::{error::Error, fmt};

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use callout::{CalloutError, store::StoreError};

/// Adapter giving a [`CalloutError`] a diagnostic code and help text.
pub struct ErrorAdapter<'a>(pub &'a CalloutError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            CalloutError::Validation(_) => "callout::validation",
            CalloutError::Decode(_) => "callout::decode",
            CalloutError::FormatMismatch(_) => "callout::format_mismatch",
            CalloutError::ResourceUnavailable(_) => "callout::resource_unavailable",
            CalloutError::Store(_) => "callout::store",
            CalloutError::Io(_) => "callout::io",
            CalloutError::Config(_) => "callout::config",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            CalloutError::Validation(_) => {
                "callout numbers must be positive and coordinates finite and non-negative"
            }
            CalloutError::FormatMismatch(_) => {
                "flat images cannot be edited; use `callout render` to draw callouts onto a clean \
                 image, or `callout create` to start a new document from it"
            }
            CalloutError::ResourceUnavailable(_) => {
                "list a font file under `fonts` in the [raster] config section, or set `builtin_font = true`"
            }
            CalloutError::Store(StoreError::AlreadyExists(_)) => {
                "the original upload is kept forever; choose a new key for a new image"
            }
            CalloutError::Config(_) => "check the TOML configuration passed with --config",
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use callout::annotation::{IndexedValidationError, ValidationError};

    use super::*;

    fn code_of(err: &CalloutError) -> String {
        ErrorAdapter(err).code().unwrap().to_string()
    }

    #[test]
    fn test_codes() {
        let err = CalloutError::Validation(IndexedValidationError {
            index: 0,
            source: ValidationError::InvalidId(0),
        });
        assert_eq!(code_of(&err), "callout::validation");

        let err = CalloutError::Decode("bad".into());
        assert_eq!(code_of(&err), "callout::decode");

        let err = CalloutError::Io(std::io::Error::other("disk"));
        assert_eq!(code_of(&err), "callout::io");
    }

    #[test]
    fn test_format_mismatch_suggests_render() {
        let err = CalloutError::FormatMismatch("flat png".to_string());
        let adapter = ErrorAdapter(&err);

        assert_eq!(adapter.code().unwrap().to_string(), "callout::format_mismatch");
        assert!(adapter.help().unwrap().to_string().contains("callout render"));
        assert_eq!(adapter.to_string(), "format mismatch: flat png");
    }

    #[test]
    fn test_no_help_for_io() {
        let err = CalloutError::Io(std::io::Error::other("disk"));
        assert!(ErrorAdapter(&err).help().is_none());
    }
}
