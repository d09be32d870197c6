//! Telling structured documents apart from legacy raster artifacts.
//!
//! Older deployments stored annotated diagrams as flat PNG or JPEG files.
//! Those files must keep opening, so every reader first sniffs what it was
//! given: the content decides, and the file extension only helps with raster
//! formats that carry no magic number.

use std::path::Path;

use image::ImageFormat;
use log::debug;

/// How many leading bytes are searched for an `<svg` root.
const SVG_SNIFF_WINDOW: usize = 4096;

/// The kind of an artifact on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// An SVG annotation document.
    Structured,
    /// A flat raster image in the given format.
    Raster(ImageFormat),
    /// Neither of the above.
    Unknown,
}

impl ArtifactKind {
    /// Classifies `bytes`, using `path`'s extension as a hint.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::path::Path;
    /// # use callout::sniff::ArtifactKind;
    /// # use image::ImageFormat;
    /// let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    /// assert_eq!(ArtifactKind::sniff(Path::new("view.png"), &png), ArtifactKind::Raster(ImageFormat::Png));
    ///
    /// let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"/>"#;
    /// assert_eq!(ArtifactKind::sniff(Path::new("view.png"), svg), ArtifactKind::Structured);
    /// ```
    pub fn sniff(path: &Path, bytes: &[u8]) -> Self {
        let kind = if let Ok(format) = image::guess_format(bytes) {
            Self::Raster(format)
        } else if looks_like_svg(bytes) {
            Self::Structured
        } else if let Ok(format) = ImageFormat::from_path(path) {
            Self::Raster(format)
        } else {
            Self::Unknown
        };

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
        debug!(extension, kind:? = kind; "Artifact sniffed");
        kind
    }
}

/// Returns `true` if `bytes` start like SVG markup.
///
/// Leading whitespace, a byte order mark, an XML declaration, comments and a
/// doctype are allowed before the `<svg` root.
pub(crate) fn looks_like_svg(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(SVG_SNIFF_WINDOW)];
    let text = String::from_utf8_lossy(window);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with('<') && text.contains("<svg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_content_wins_over_extension() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
        assert_eq!(
            ArtifactKind::sniff(Path::new("view.svg"), &jpeg),
            ArtifactKind::Raster(ImageFormat::Jpeg)
        );
    }

    #[test]
    fn test_svg_with_prolog() {
        let svg = b"\xEF\xBB\xBF  <?xml version=\"1.0\"?>\n<!-- made by hand -->\n<svg viewBox=\"0 0 1 1\"></svg>";
        assert!(looks_like_svg(svg));
        assert_eq!(ArtifactKind::sniff(Path::new("a"), svg), ArtifactKind::Structured);
    }

    #[test]
    fn test_extension_hint_for_magicless_format() {
        assert_eq!(
            ArtifactKind::sniff(Path::new("old.tga"), &[0x00, 0x00, 0x0A, 0x00]),
            ArtifactKind::Raster(ImageFormat::Tga)
        );
    }

    #[test]
    fn test_unknown() {
        assert_eq!(
            ArtifactKind::sniff(Path::new("notes.txt"), b"hello"),
            ArtifactKind::Unknown
        );
        assert_eq!(ArtifactKind::sniff(Path::new(""), b""), ArtifactKind::Unknown);
        assert!(!looks_like_svg(b"<html><body/></html>"));
    }
}
