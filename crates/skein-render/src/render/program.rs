//! The program lifecycle contract and shared buffer plumbing.

use crate::gpu::{IndexWidth, RenderCtx, RenderTarget};

use super::params::RenderParams;

/// Lifecycle contract every geometry program satisfies.
///
/// Per frame, in order: [`allocate`](Program::allocate) once,
/// [`process`](Program::process) once per entity,
/// [`compute_indices`](Program::compute_indices) once,
/// [`buffer_data`](Program::buffer_data) once, then
/// [`render`](Program::render). All calls are synchronous and must come
/// from one thread.
pub trait Program {
    /// Per-entity source record consumed by `process`.
    type Record<'a>;

    /// (Re)creates the CPU vertex stream sized for `capacity` entities,
    /// discarding prior contents.
    fn allocate(&mut self, capacity: usize);

    /// Writes one entity's vertex record(s) at `offset`.
    ///
    /// Hidden entities write a fully zeroed record, never skip the slot:
    /// every entity keeps its stable offset for the whole frame.
    /// `offset` must be below the allocated capacity (debug-asserted).
    fn process(&mut self, record: Self::Record<'_>, offset: usize);

    /// (Re)derives index data from the current point count. A no-op for
    /// non-indexed programs. Must be re-run after any `allocate` that
    /// changed the point count.
    fn compute_indices(&mut self);

    /// Uploads the CPU streams to their GPU buffers.
    fn buffer_data(&mut self, ctx: &RenderCtx<'_>);

    /// Establishes pipeline and bindings against the current buffers.
    /// Idempotent; safe to call every frame.
    fn bind(&mut self, ctx: &RenderCtx<'_>);

    /// Issues exactly one draw call covering all allocated entities.
    fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        params: &RenderParams,
    );
}

// ── vertex stream ─────────────────────────────────────────────────────────

/// Interleaved f32 vertex stream plus its GPU buffer.
///
/// Owned by exactly one program. The CPU side is reallocated by
/// [`allocate`](VertexStream::allocate); the GPU buffer is created lazily,
/// grows power-of-two and is rewritten in full on every
/// [`upload`](VertexStream::upload) (the stream changes every frame).
pub(super) struct VertexStream {
    label: &'static str,
    points_per_entity: usize,
    attrs_per_point: usize,
    capacity: usize,
    data: Vec<f32>,

    vbo: Option<wgpu::Buffer>,
    vbo_bytes: u64,
}

impl VertexStream {
    pub(super) fn new(
        label: &'static str,
        points_per_entity: usize,
        attrs_per_point: usize,
    ) -> Self {
        Self {
            label,
            points_per_entity,
            attrs_per_point,
            capacity: 0,
            data: Vec::new(),
            vbo: None,
            vbo_bytes: 0,
        }
    }

    /// Replaces the CPU stream with a zeroed one sized for `capacity`
    /// entities.
    pub(super) fn allocate(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.data = vec![0.0; self.points_per_entity * self.attrs_per_point * capacity];
    }

    #[inline]
    pub(super) fn floats_per_entity(&self) -> usize {
        self.points_per_entity * self.attrs_per_point
    }

    /// Total point count in the stream (including hidden/zeroed slots).
    #[inline]
    pub(super) fn point_count(&self) -> usize {
        self.data.len() / self.attrs_per_point
    }

    #[inline]
    pub(super) fn capacity(&self) -> usize {
        self.capacity
    }

    /// CPU-side view of the stream, for inspection in tests.
    #[cfg(test)]
    pub(super) fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable view of one entity's record.
    #[inline]
    pub(super) fn slot_mut(&mut self, offset: usize) -> &mut [f32] {
        debug_assert!(
            offset < self.capacity,
            "{}: offset {} out of range (capacity {})",
            self.label,
            offset,
            self.capacity
        );
        let stride = self.floats_per_entity();
        let start = offset * stride;
        &mut self.data[start..start + stride]
    }

    /// Creates/grows the GPU buffer as needed and rewrites it in full.
    pub(super) fn upload(&mut self, ctx: &RenderCtx<'_>) {
        let required = (self.data.len() * std::mem::size_of::<f32>()) as u64;
        if required == 0 {
            return;
        }

        if self.vbo.is_none() || self.vbo_bytes < required {
            let size = required.next_power_of_two().max(256);
            self.vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.vbo_bytes = size;
        }

        let Some(vbo) = self.vbo.as_ref() else { return };
        ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(&self.data));
    }

    #[inline]
    pub(super) fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.vbo.as_ref()
    }
}

// ── index stream ──────────────────────────────────────────────────────────

/// CPU index data at the width fixed by the capability probe.
pub(super) enum IndexData {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexData {
    #[inline]
    pub(super) fn len(&self) -> usize {
        match self {
            IndexData::U16(v) => v.len(),
            IndexData::U32(v) => v.len(),
        }
    }
}

/// Index stream plus its GPU buffer.
///
/// Unlike the vertex stream, index data only depends on point count, so the
/// GPU buffer is rewritten only after [`replace`](IndexStream::replace)
/// produced new data, not every frame.
pub(super) struct IndexStream {
    label: &'static str,
    width: IndexWidth,
    data: IndexData,

    ibo: Option<wgpu::Buffer>,
    ibo_bytes: u64,
    dirty: bool,
}

impl IndexStream {
    pub(super) fn new(label: &'static str, width: IndexWidth) -> Self {
        let data = match width {
            IndexWidth::Narrow => IndexData::U16(Vec::new()),
            IndexWidth::Wide => IndexData::U32(Vec::new()),
        };
        Self {
            label,
            width,
            data,
            ibo: None,
            ibo_bytes: 0,
            dirty: false,
        }
    }

    #[inline]
    pub(super) fn width(&self) -> IndexWidth {
        self.width
    }

    #[inline]
    pub(super) fn len(&self) -> usize {
        self.data.len()
    }

    /// CPU-side view of the indices, for inspection in tests.
    #[cfg(test)]
    pub(super) fn data(&self) -> &IndexData {
        &self.data
    }

    /// Installs freshly computed index data and marks the GPU side stale.
    ///
    /// Debug-asserts that the data width matches the width fixed at
    /// construction.
    pub(super) fn replace(&mut self, data: IndexData) {
        debug_assert!(
            matches!(
                (&data, self.width),
                (IndexData::U16(_), IndexWidth::Narrow) | (IndexData::U32(_), IndexWidth::Wide)
            ),
            "{}: index data width does not match probed width",
            self.label
        );
        self.data = data;
        self.dirty = true;
    }

    /// Uploads index data if it changed since the last upload.
    pub(super) fn upload(&mut self, ctx: &RenderCtx<'_>) {
        if !self.dirty || self.data.len() == 0 {
            return;
        }

        let bytes: &[u8] = match &self.data {
            IndexData::U16(v) => bytemuck::cast_slice(v),
            IndexData::U32(v) => bytemuck::cast_slice(v),
        };
        let required = bytes.len() as u64;

        if self.ibo.is_none() || self.ibo_bytes < required {
            let size = required.next_power_of_two().max(256);
            self.ibo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.ibo_bytes = size;
        }

        let Some(ibo) = self.ibo.as_ref() else { return };
        ctx.queue.write_buffer(ibo, 0, bytes);
        self.dirty = false;
    }

    #[inline]
    pub(super) fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.ibo.as_ref()
    }
}
