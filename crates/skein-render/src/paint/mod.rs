//! Color model shared between scene records and renderers.
//!
//! Scope:
//! - straight-alpha sRGB byte colors as supplied by the host
//! - packing into the single-lane vertex attribute encoding

mod color;

pub use color::Color;
