//! Node program: one point sprite per node.
//!
//! Each node contributes a single 4-float record `{x, y, size, color}`.
//! The record is stepped per instance; the vertex shader expands it into a
//! 4-vertex triangle strip and the fragment shader shades an anti-aliased
//! disc, so one `draw` call covers every node.

use crate::gpu::{RenderCtx, RenderTarget};
use crate::scene::NodeDisplayData;

use super::common::{alpha_blend, frame_ubo_min_binding_size, FrameUniforms};
use super::params::RenderParams;
use super::program::{Program, VertexStream};

const POINTS: usize = 1;
const ATTRIBUTES: usize = 4;

const STRIDE_BYTES: u64 = (ATTRIBUTES * std::mem::size_of::<f32>()) as u64;

// pos Float32x2 @0, size Float32 @8, color Unorm8x4 @12
const INSTANCE_ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x2,
    1 => Float32,
    2 => Unorm8x4
];

pub struct NodePointProgram {
    stream: VertexStream,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    frame_ubo: Option<wgpu::Buffer>,
}

impl NodePointProgram {
    pub fn new() -> Self {
        Self {
            stream: VertexStream::new("skein node stream", POINTS, ATTRIBUTES),
            pipeline_format: None,
            pipeline: None,
            bind_group_layout: None,
            bind_group: None,
            frame_ubo: None,
        }
    }

    // ── private helpers ───────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("skein node shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/node.wgsl").into()),
        });

        let bind_group_layout =
            ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("skein node bgl"),
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
                label: Some("skein node pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let instance_layout = wgpu::VertexBufferLayout {
            array_stride: STRIDE_BYTES,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &INSTANCE_ATTRS,
        };

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("skein node pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[instance_layout],
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
                topology: wgpu::PrimitiveTopology::TriangleStrip,
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
            label: Some("skein node frame ubo"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("skein node bind group"),
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

impl Default for NodePointProgram {
    fn default() -> Self {
        Self::new()
    }
}

impl Program for NodePointProgram {
    type Record<'a> = &'a NodeDisplayData;

    fn allocate(&mut self, capacity: usize) {
        self.stream.allocate(capacity);
    }

    fn process(&mut self, node: &NodeDisplayData, offset: usize) {
        let slot = self.stream.slot_mut(offset);

        if node.hidden {
            slot.fill(0.0);
            return;
        }

        slot[0] = node.x;
        slot[1] = node.y;
        slot[2] = node.size;
        slot[3] = node.color.to_attribute();
    }

    fn compute_indices(&mut self) {
        // Point sprites draw unindexed.
    }

    fn buffer_data(&mut self, ctx: &RenderCtx<'_>) {
        self.stream.upload(ctx);
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
        let instances = self.stream.capacity() as u32;
        if instances == 0 {
            return;
        }

        self.bind(ctx);

        let Some(frame_ubo) = self.frame_ubo.as_ref() else { return };
        let ratio = params.ratio.powf(-params.nodes_pow_ratio);
        ctx.queue.write_buffer(
            frame_ubo,
            0,
            bytemuck::bytes_of(&FrameUniforms::from_params(params, ratio)),
        );

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };
        let Some(vbo) = self.stream.buffer() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("skein node pass"),
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
        rpass.draw(0..4, 0..instances);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Color;

    fn node(x: f32, y: f32, size: f32) -> NodeDisplayData {
        NodeDisplayData::new(x, y, size, Color::rgb(255, 0, 0))
    }

    #[test]
    fn process_writes_four_floats_at_offset() {
        let mut p = NodePointProgram::new();
        p.allocate(3);
        p.process(&node(1.5, -2.5, 4.0), 1);

        let data = p.stream.data();
        assert_eq!(&data[4..7], &[1.5, -2.5, 4.0]);
        assert_eq!(data[7].to_bits(), Color::rgb(255, 0, 0).pack());
    }

    #[test]
    fn hidden_node_zeroes_its_slot_only() {
        // Hidden node at offset 2 of a capacity-5 buffer: floats [8..12) are
        // zero regardless of what the other slots hold.
        let mut p = NodePointProgram::new();
        p.allocate(5);
        for off in 0..5 {
            p.process(&node(1.0 + off as f32, 2.0, 3.0), off);
        }

        let mut hidden = node(99.0, 99.0, 99.0);
        hidden.hidden = true;
        p.process(&hidden, 2);

        let data = p.stream.data();
        assert!(data[8..12].iter().all(|&v| v == 0.0));
        assert_ne!(data[4], 0.0);
        assert_ne!(data[12], 0.0);
    }

    #[test]
    fn allocate_is_an_exact_multiple_of_the_record_size() {
        let mut p = NodePointProgram::new();
        p.allocate(1000);
        assert_eq!(p.stream.data().len(), 4000);
        assert_eq!(p.stream.data().len() % p.stream.floats_per_entity(), 0);
    }

    #[test]
    fn reprocessing_identical_input_is_bit_identical() {
        let mut p = NodePointProgram::new();

        let run = |p: &mut NodePointProgram| -> Vec<u32> {
            p.allocate(4);
            for off in 0..4 {
                p.process(&node(off as f32, -(off as f32), 1.0 + off as f32), off);
            }
            p.compute_indices();
            p.stream.data().iter().map(|f| f.to_bits()).collect()
        };

        let first = run(&mut p);
        let second = run(&mut p);
        assert_eq!(first, second);
    }
}
