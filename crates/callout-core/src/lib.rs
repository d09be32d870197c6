//! Callout Core Types and Definitions
//!
//! This crate provides the foundational types for numbered exploded-view
//! callouts. It includes:
//!
//! - **Annotations**: The callout data model and its validation ([`annotation`] module)
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Points and canvas sizes ([`geometry`] module)
//! - **Draw**: Callout styling, placement and SVG markup ([`draw`] module)

pub mod annotation;
pub mod color;
pub mod draw;
pub mod geometry;
