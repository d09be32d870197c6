//! Visual definitions for callouts.
//!
//! A callout is drawn from four primitives: a leader line, an anchor dot, a
//! bubble and a centered numeral. The definitions in this module describe how
//! those primitives look; [`Callout`] resolves their positions for one
//! annotation and emits SVG markup. The raster compositor reuses the same
//! resolved geometry so both strategies agree pixel-for-pixel on placement.

mod callout;
mod stroke;
mod text;

pub use callout::{Callout, CalloutDefinition, CalloutGeometry};
pub use stroke::{StrokeCap, StrokeDefinition, StrokeStyle};
pub use text::{Text, TextDefinition};
