use crate::paint::Color;

/// Renderable state of one node for the current frame.
///
/// Positions are graph-space coordinates; the view matrix maps them to NDC.
/// `size` is the node radius in graph units before zoom scaling.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NodeDisplayData {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: Color,
    pub hidden: bool,
}

impl NodeDisplayData {
    #[inline]
    pub fn new(x: f32, y: f32, size: f32, color: Color) -> Self {
        Self {
            x,
            y,
            size,
            color,
            hidden: false,
        }
    }
}

/// Renderable state of one edge for the current frame.
///
/// `size` is the line thickness. Endpoint positions are not duplicated here;
/// the edge program reads them from the two endpoint node records.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EdgeDisplayData {
    pub size: f32,
    pub color: Color,
    pub hidden: bool,
}

impl EdgeDisplayData {
    #[inline]
    pub fn new(size: f32, color: Color) -> Self {
        Self {
            size,
            color,
            hidden: false,
        }
    }
}

/// The triple the edge program consumes per edge: both endpoint records plus
/// the edge's own record. Borrowed from the host for the duration of one
/// `process` call.
#[derive(Debug, Copy, Clone)]
pub struct EdgeGeometry<'a> {
    pub source: &'a NodeDisplayData,
    pub target: &'a NodeDisplayData,
    pub edge: &'a EdgeDisplayData,
}
