//! Batched geometry programs.
//!
//! Each program owns one interleaved CPU float stream plus the GPU buffers
//! and pipeline needed to draw it. Per frame the host drives the fixed
//! sequence `allocate` → `process` × N → `compute_indices` → `buffer_data`
//! → `render`, in that order, single-threaded.
//!
//! Convention:
//! - entity positions are graph-space; the 3×3 view matrix maps them to NDC
//! - sizes/thicknesses become pixels in the vertex shaders

mod common;
mod edges;
mod nodes;
mod params;
mod program;

pub use edges::ClampedEdgeProgram;
pub use nodes::NodePointProgram;
pub use params::RenderParams;
pub use program::Program;
