//! Raster compositing for Callout annotations.
//!
//! This crate renders callouts into flat images. It includes:
//!
//! - **Disks**: Supersampled anti-aliased bubbles ([`disk`] module)
//! - **Fonts**: The numeral font fallback chain ([`font`] module)
//! - **Compositor**: Re-compositing from a clean source ([`Compositor`])
//! - **Encoding**: PNG and JPEG output with print DPI ([`encode`] module)
//!
//! # Example
//!
//! ```no_run
//! use callout_core::annotation::{Annotation, Side};
//! use callout_core::draw::CalloutDefinition;
//! use callout_raster::{Compositor, RasterOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = std::fs::read("diagram.png")?;
//! let compositor = Compositor::new(RasterOptions::default(), CalloutDefinition::default())?;
//! let png = compositor.render(&source, &[Annotation::new(1, 250.0, 50.0, Side::Left)])?;
//! std::fs::write("diagram-annotated.png", png)?;
//! # Ok(())
//! # }
//! ```

pub mod disk;
pub mod encode;
pub mod font;

mod compositor;
mod error;

pub use compositor::{
    Compositor, DEFAULT_DPI, DEFAULT_JPEG_QUALITY, DEFAULT_SUPERSAMPLE, RasterOptions,
};
pub use encode::RasterFormat;
pub use error::RasterError;
