//! Shared GPU types and utilities used by both geometry programs.

use bytemuck::{Pod, Zeroable};

use super::params::RenderParams;

// ── blend ─────────────────────────────────────────────────────────────────

pub(super) fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── frame uniforms ────────────────────────────────────────────────────────

/// Uniform block shared by the node and edge shaders.
///
/// Layout must match the WGSL `FrameUniforms` struct: a mat3x3 is three
/// vec4-padded columns (48 bytes), followed by resolution/ratio/scale/
/// pixel_ratio, padded to a 16-byte multiple.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct FrameUniforms {
    pub matrix: [[f32; 4]; 3],
    pub resolution: [f32; 2],
    pub ratio: f32,
    pub scale: f32,
    pub pixel_ratio: f32,
    pub _pad: [f32; 3],
}

impl FrameUniforms {
    /// Builds the block from the frame's parameters; `ratio` is the
    /// per-program (possibly power-law corrected) zoom ratio.
    pub(super) fn from_params(params: &RenderParams, ratio: f32) -> Self {
        Self {
            matrix: params.matrix_columns(),
            resolution: [params.width.max(1.0), params.height.max(1.0)],
            ratio,
            scale: params.scaling_ratio,
            pixel_ratio: params.pixel_ratio,
            _pad: [0.0; 3],
        }
    }
}

/// Returns the `wgpu` minimum binding size for the frame uniform buffer.
///
/// `FrameUniforms` is 80 bytes so its size is always non-zero. Centralising
/// this avoids `.unwrap()` at each program's pipeline-creation site.
pub(super) fn frame_ubo_min_binding_size() -> std::num::NonZeroU64 {
    std::num::NonZeroU64::new(std::mem::size_of::<FrameUniforms>() as u64)
        .expect("FrameUniforms has non-zero size by construction")
}
