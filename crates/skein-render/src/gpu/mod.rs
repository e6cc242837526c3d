//! GPU-facing context types and capability detection.
//!
//! The host owns the wgpu instance/adapter/device and the frame loop; this
//! module only defines the borrowed views render programs draw through and
//! the probe for wide (32-bit) element index support.

mod caps;
mod ctx;

pub use caps::IndexWidth;
pub use ctx::{RenderCtx, RenderTarget};
