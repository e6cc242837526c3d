//! Edge program: one clamped quad (two triangles) per edge.
//!
//! An edge becomes 4 vertices with 7 attributes each: position, unit
//! normal, thickness, color, and a signed clamp radius. The near end of the
//! quad sits on the source node's center; the shader pulls the far end back
//! along the edge direction by the target node's on-screen radius, leaving
//! room for a separately drawn arrowhead between quad and node.

use crate::gpu::{IndexWidth, RenderCtx, RenderTarget};
use crate::scene::EdgeGeometry;

use super::common::{alpha_blend, frame_ubo_min_binding_size, FrameUniforms};
use super::params::RenderParams;
use super::program::{IndexData, IndexStream, Program, VertexStream};

const POINTS: usize = 4;
const ATTRIBUTES: usize = 7;

const STRIDE_BYTES: u64 = (ATTRIBUTES * std::mem::size_of::<f32>()) as u64;

// pos Float32x2 @0, normal Float32x2 @8, thickness Float32 @16,
// color Unorm8x4 @20, clamp radius Float32 @24
const VERTEX_ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    0 => Float32x2,
    1 => Float32x2,
    2 => Float32,
    3 => Unorm8x4,
    4 => Float32
];

pub struct ClampedEdgeProgram {
    stream: VertexStream,
    indices: IndexStream,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    frame_ubo: Option<wgpu::Buffer>,

    warned_truncation: bool,
}

impl ClampedEdgeProgram {
    /// `width` comes from the capability probe and is fixed for this
    /// program's lifetime.
    pub fn new(width: IndexWidth) -> Self {
        Self {
            stream: VertexStream::new("skein edge stream", POINTS, ATTRIBUTES),
            indices: IndexStream::new("skein edge indices", width),
            pipeline_format: None,
            pipeline: None,
            bind_group_layout: None,
            bind_group: None,
            frame_ubo: None,
            warned_truncation: false,
        }
    }

    /// Builds two triangles per quad: for the point group starting at `i`,
    /// `[i, i+1, i+2, i+2, i+1, i+3]`. The winding is fixed and does not
    /// depend on edge direction.
    fn quad_indices<T>(point_count: usize) -> Vec<T>
    where
        T: Copy + TryFrom<usize>,
        <T as TryFrom<usize>>::Error: std::fmt::Debug,
    {
        let mut indices = Vec::with_capacity(point_count / 4 * 6);
        let idx = |v: usize| T::try_from(v).expect("point index fits the probed width");

        for i in (0..point_count).step_by(4) {
            indices.push(idx(i));
            indices.push(idx(i + 1));
            indices.push(idx(i + 2));
            indices.push(idx(i + 2));
            indices.push(idx(i + 1));
            indices.push(idx(i + 3));
        }

        indices
    }

    // ── private helpers ───────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("skein edge shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/edge.wgsl").into()),
        });

        let bind_group_layout =
            ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("skein edge bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(frame_ubo_min_binding_size()),
                    },
                    count: None,
                }],
            });

        let pipeline_layout =
            ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("skein edge pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: STRIDE_BYTES,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &VERTEX_ATTRS,
        };

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("skein edge pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[vertex_layout],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);
        self.bind_group = None;
        self.frame_ubo = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() && self.frame_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let frame_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("skein edge frame ubo"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("skein edge bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_ubo.as_entire_binding(),
            }],
        });

        self.frame_ubo = Some(frame_ubo);
        self.bind_group = Some(bind_group);
    }
}

impl Program for ClampedEdgeProgram {
    type Record<'a> = EdgeGeometry<'a>;

    fn allocate(&mut self, capacity: usize) {
        self.stream.allocate(capacity);
    }

    fn process(&mut self, geometry: EdgeGeometry<'_>, offset: usize) {
        let EdgeGeometry {
            source,
            target,
            edge,
        } = geometry;

        let slot = self.stream.slot_mut(offset);

        // Either endpoint hidden hides the edge. The record is written as
        // zeros (a zero-area quad), never skipped: slot addressing must stay
        // offset-stable across the frame.
        if source.hidden || target.hidden || edge.hidden {
            slot.fill(0.0);
            return;
        }

        let thickness = if edge.size > 0.0 { edge.size } else { 1.0 };
        let radius = if target.size > 0.0 { target.size } else { 1.0 };
        let color = edge.color.to_attribute();

        let (x1, y1) = (source.x, source.y);
        let (x2, y2) = (target.x, target.y);

        // Unit normal of the edge; a zero-length edge keeps (0, 0) and
        // collapses to a zero-width strip.
        let dx = x2 - x1;
        let dy = y2 - y1;
        let len_sq = dx * dx + dy * dy;

        let (n1, n2) = if len_sq > 0.0 {
            let inv_len = 1.0 / len_sq.sqrt();
            (-dy * inv_len, dx * inv_len)
        } else {
            (0.0, 0.0)
        };

        // Source pair carries clamp radius 0; the target pair carries
        // ±target radius, sign-matched to the flipped normal so the shader
        // shifts both faces the same way.
        let corners = [
            (x1, y1, n1, n2, 0.0),
            (x1, y1, -n1, -n2, 0.0),
            (x2, y2, n1, n2, radius),
            (x2, y2, -n1, -n2, -radius),
        ];

        for (corner, record) in corners.iter().zip(slot.chunks_exact_mut(ATTRIBUTES)) {
            let (x, y, nx, ny, clamp) = *corner;
            record[0] = x;
            record[1] = y;
            record[2] = nx;
            record[3] = ny;
            record[4] = thickness;
            record[5] = color;
            record[6] = clamp;
        }
    }

    fn compute_indices(&mut self) {
        let total = self.stream.point_count();
        let indexable = total.min(self.indices.width().max_points());

        if indexable < total && !self.warned_truncation {
            log::debug!(
                "edge indices are 16-bit; {} of {} points exceed the indexable \
                 range and will not be drawn",
                total - indexable,
                total
            );
            self.warned_truncation = true;
        }

        let data = match self.indices.width() {
            IndexWidth::Narrow => IndexData::U16(Self::quad_indices(indexable)),
            IndexWidth::Wide => IndexData::U32(Self::quad_indices(indexable)),
        };
        self.indices.replace(data);
    }

    fn buffer_data(&mut self, ctx: &RenderCtx<'_>) {
        self.stream.upload(ctx);
        self.indices.upload(ctx);
    }

    fn bind(&mut self, ctx: &RenderCtx<'_>) {
        self.ensure_pipeline(ctx);
        self.ensure_bindings(ctx);
    }

    fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        params: &RenderParams,
    ) {
        let index_count = self.indices.len() as u32;
        if index_count == 0 {
            return;
        }

        self.bind(ctx);

        let Some(frame_ubo) = self.frame_ubo.as_ref() else { return };
        // Edges scale with the linear view ratio; no power law.
        ctx.queue.write_buffer(
            frame_ubo,
            0,
            bytemuck::bytes_of(&FrameUniforms::from_params(params, params.ratio)),
        );

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };
        let Some(vbo) = self.stream.buffer() else { return };
        let Some(ibo) = self.indices.buffer() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("skein edge pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.set_index_buffer(ibo.slice(..), self.indices.width().format());
        rpass.draw_indexed(0..index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Color;
    use crate::scene::{EdgeDisplayData, NodeDisplayData};

    fn node(x: f32, y: f32, size: f32) -> NodeDisplayData {
        NodeDisplayData::new(x, y, size, Color::rgb(0, 0, 0))
    }

    fn edge(size: f32, color: Color) -> EdgeDisplayData {
        EdgeDisplayData::new(size, color)
    }

    fn geometry<'a>(
        source: &'a NodeDisplayData,
        target: &'a NodeDisplayData,
        edge: &'a EdgeDisplayData,
    ) -> EdgeGeometry<'a> {
        EdgeGeometry {
            source,
            target,
            edge,
        }
    }

    fn indices_u32(p: &ClampedEdgeProgram) -> Vec<u32> {
        match p.indices.data() {
            IndexData::U16(v) => v.iter().map(|&i| i as u32).collect(),
            IndexData::U32(v) => v.clone(),
        }
    }

    // ── normals ───────────────────────────────────────────────────────────

    #[test]
    fn quad_faces_carry_opposite_unit_normals() {
        let mut p = ClampedEdgeProgram::new(IndexWidth::Wide);
        p.allocate(1);

        let (s, t) = (node(1.0, 2.0, 1.0), node(4.0, 6.0, 1.0));
        let e = edge(1.0, Color::rgb(0, 0, 0));
        p.process(geometry(&s, &t, &e), 0);

        let d = p.stream.data();
        let (n1, n2) = (d[2], d[3]);

        // Unit length before thickness scaling.
        assert!((n1 * n1 + n2 * n2 - 1.0).abs() < 1e-6);
        // Flipped face is the exact opposite.
        assert_eq!((d[9], d[10]), (-n1, -n2));
        // Both target-side points repeat the same pair.
        assert_eq!((d[16], d[17]), (n1, n2));
        assert_eq!((d[23], d[24]), (-n1, -n2));
    }

    #[test]
    fn zero_length_edge_degenerates_to_coincident_points() {
        let mut p = ClampedEdgeProgram::new(IndexWidth::Wide);
        p.allocate(1);

        let (s, t) = (node(3.0, 3.0, 2.0), node(3.0, 3.0, 2.0));
        let e = edge(1.0, Color::rgb(0, 0, 0));
        p.process(geometry(&s, &t, &e), 0);

        let d = p.stream.data();
        for point in d.chunks_exact(ATTRIBUTES) {
            assert_eq!((point[0], point[1]), (3.0, 3.0));
            assert_eq!((point[2], point[3]), (0.0, 0.0));
        }
    }

    // ── visibility ────────────────────────────────────────────────────────

    #[test]
    fn hidden_endpoint_zeroes_all_28_floats() {
        let mut p = ClampedEdgeProgram::new(IndexWidth::Wide);
        p.allocate(3);

        let visible = node(1.0, 1.0, 1.0);
        let mut hidden = node(2.0, 2.0, 2.0);
        hidden.hidden = true;
        let e = edge(5.0, Color::rgb(10, 20, 30));

        p.process(geometry(&visible, &visible, &e), 0);
        p.process(geometry(&visible, &hidden, &e), 1);
        p.process(geometry(&visible, &visible, &e), 2);

        let d = p.stream.data();
        assert!(d[28..56].iter().all(|&v| v == 0.0));
        assert_ne!(d[0], 0.0);
        assert_ne!(d[56], 0.0);
    }

    #[test]
    fn hidden_edge_itself_zeroes_the_record() {
        let mut p = ClampedEdgeProgram::new(IndexWidth::Wide);
        p.allocate(1);

        let n = node(1.0, 1.0, 1.0);
        let mut e = edge(5.0, Color::rgb(10, 20, 30));
        e.hidden = true;
        p.process(geometry(&n, &n, &e), 0);

        assert!(p.stream.data().iter().all(|&v| v == 0.0));
    }

    // ── indices ───────────────────────────────────────────────────────────

    #[test]
    fn compute_indices_emits_six_per_quad() {
        let mut p = ClampedEdgeProgram::new(IndexWidth::Wide);
        p.allocate(3);
        p.compute_indices();

        assert_eq!(
            indices_u32(&p),
            vec![
                0, 1, 2, 2, 1, 3, //
                4, 5, 6, 6, 5, 7, //
                8, 9, 10, 10, 9, 11,
            ]
        );
    }

    #[test]
    fn compute_indices_on_empty_stream_is_empty() {
        let mut p = ClampedEdgeProgram::new(IndexWidth::Wide);
        p.allocate(0);
        p.compute_indices();
        assert_eq!(p.indices.len(), 0);
    }

    #[test]
    fn narrow_width_drops_quads_beyond_the_indexable_range() {
        // 40,000 edges = 160,000 points. With 16-bit indices only the first
        // 65,536 points (16,384 quads) stay addressable; the rest are simply
        // absent, not an error.
        let mut p = ClampedEdgeProgram::new(IndexWidth::Narrow);
        p.allocate(40_000);
        p.compute_indices();

        assert_eq!(p.indices.len(), 16_384 * 6);
        let idx = indices_u32(&p);
        assert_eq!(idx[idx.len() - 6..], [65_532, 65_533, 65_534, 65_534, 65_533, 65_535]);
    }

    #[test]
    fn wide_width_indexes_the_full_graph() {
        let mut p = ClampedEdgeProgram::new(IndexWidth::Wide);
        p.allocate(40_000);
        p.compute_indices();
        assert_eq!(p.indices.len(), 40_000 * 6);
    }

    // ── idempotence ───────────────────────────────────────────────────────

    #[test]
    fn full_frame_rebuild_is_bit_identical() {
        let mut p = ClampedEdgeProgram::new(IndexWidth::Wide);

        let run = |p: &mut ClampedEdgeProgram| -> (Vec<u32>, Vec<u32>) {
            p.allocate(8);
            for off in 0..8 {
                let s = node(off as f32, 0.0, 2.0);
                let t = node(0.0, 1.0 + off as f32, 3.0);
                let e = edge(1.5, Color::rgba(1, 2, 3, 4));
                p.process(geometry(&s, &t, &e), off);
            }
            p.compute_indices();
            (
                p.stream.data().iter().map(|f| f.to_bits()).collect(),
                indices_u32(p),
            )
        };

        let first = run(&mut p);
        let second = run(&mut p);
        assert_eq!(first, second);
    }

    // ── end to end ────────────────────────────────────────────────────────

    #[test]
    fn horizontal_edge_matches_the_expected_record() {
        // Nodes at (0,0) size 5 and (10,0) size 3, edge thickness 2, red.
        // Direction is purely +x, so the normal is (0, 1).
        let mut p = ClampedEdgeProgram::new(IndexWidth::Wide);
        p.allocate(1);

        let s = node(0.0, 0.0, 5.0);
        let t = node(10.0, 0.0, 3.0);
        let red = Color::rgb(255, 0, 0);
        let e = edge(2.0, red);
        p.process(geometry(&s, &t, &e), 0);
        p.compute_indices();

        let c = red.to_attribute();
        let expected: [f32; 28] = [
            0.0, 0.0, 0.0, 1.0, 2.0, c, 0.0, //
            0.0, 0.0, 0.0, -1.0, 2.0, c, 0.0, //
            10.0, 0.0, 0.0, 1.0, 2.0, c, 3.0, //
            10.0, 0.0, 0.0, -1.0, 2.0, c, -3.0,
        ];
        let actual: Vec<u32> = p.stream.data().iter().map(|f| f.to_bits()).collect();
        let expected_bits: Vec<u32> = expected.iter().map(|f| f.to_bits()).collect();
        assert_eq!(actual, expected_bits);

        assert_eq!(indices_u32(&p), vec![0, 1, 2, 2, 1, 3]);
    }
}
