//! Skein render crate.
//!
//! Batched geometry generation and draw layer for a graph visualization
//! renderer: turns per-node and per-edge display records into interleaved
//! GPU vertex streams and issues one draw call per program per frame.

pub mod gpu;
pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;
