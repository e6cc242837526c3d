//! Element index width capability.
//!
//! Downlevel targets (notably WebGL-backed adapters) may not support the
//! full 32-bit index range. Programs that draw indexed geometry probe this
//! once at construction and keep the chosen width for their lifetime; there
//! is deliberately no re-probe or upgrade path when a graph later outgrows
//! the narrow range.

/// Element index width used for indexed draws.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IndexWidth {
    /// 16-bit indices; at most [`IndexWidth::max_points`] addressable points.
    Narrow,
    /// Full 32-bit indices.
    Wide,
}

impl IndexWidth {
    /// Chooses the widest supported index width for the given downlevel
    /// capabilities.
    ///
    /// Pure function of the capability flags; `Wide` requires
    /// `FULL_DRAW_INDEX_UINT32`.
    #[inline]
    pub fn probe(caps: &wgpu::DownlevelCapabilities) -> Self {
        if caps
            .flags
            .contains(wgpu::DownlevelFlags::FULL_DRAW_INDEX_UINT32)
        {
            IndexWidth::Wide
        } else {
            IndexWidth::Narrow
        }
    }

    /// Probes the adapter the host selected.
    #[inline]
    pub fn from_adapter(adapter: &wgpu::Adapter) -> Self {
        Self::probe(&adapter.get_downlevel_capabilities())
    }

    #[inline]
    pub fn format(self) -> wgpu::IndexFormat {
        match self {
            IndexWidth::Narrow => wgpu::IndexFormat::Uint16,
            IndexWidth::Wide => wgpu::IndexFormat::Uint32,
        }
    }

    /// Number of vertex-stream points addressable at this width.
    ///
    /// Points at or beyond this count cannot be referenced by the index
    /// buffer and are silently not drawn (accepted degradation).
    #[inline]
    pub fn max_points(self) -> usize {
        match self {
            IndexWidth::Narrow => 1 << 16,
            IndexWidth::Wide => usize::MAX,
        }
    }
}
