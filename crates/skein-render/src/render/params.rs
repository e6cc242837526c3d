/// Per-frame view parameters supplied by the host's camera.
///
/// Programs read these; they never mutate them. `matrix` is a column-major
/// 3×3 transform from graph space to NDC.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderParams {
    /// Viewport width in physical pixels.
    pub width: f32,
    /// Viewport height in physical pixels.
    pub height: f32,
    /// Device pixel ratio.
    pub pixel_ratio: f32,
    /// Camera zoom ratio (1.0 = unzoomed, larger = zoomed out).
    pub ratio: f32,
    /// Global entity size multiplier.
    pub scaling_ratio: f32,
    /// Power-law exponent applied to `ratio` for node sizing.
    pub nodes_pow_ratio: f32,
    /// Power-law exponent applied to `ratio` for edge sizing (currently the
    /// edge program uses the linear ratio; kept for hosts that tune it).
    pub edges_pow_ratio: f32,
    /// Column-major 3×3 view matrix.
    pub matrix: [f32; 9],
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            pixel_ratio: 1.0,
            ratio: 1.0,
            scaling_ratio: 1.0,
            nodes_pow_ratio: 0.5,
            edges_pow_ratio: 0.5,
            matrix: IDENTITY,
        }
    }
}

const IDENTITY: [f32; 9] = [
    1.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, //
    0.0, 0.0, 1.0,
];

impl RenderParams {
    /// Returns the view matrix as three vec4-padded columns, the layout a
    /// WGSL uniform `mat3x3<f32>` expects.
    #[inline]
    pub(super) fn matrix_columns(&self) -> [[f32; 4]; 3] {
        let m = &self.matrix;
        [
            [m[0], m[1], m[2], 0.0],
            [m[3], m[4], m[5], 0.0],
            [m[6], m[7], m[8], 0.0],
        ]
    }
}
