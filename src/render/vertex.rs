//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    /// Raw bytes for upload into a vertex buffer
    pub fn as_bytes(vertices: &[Vertex]) -> &[u8] {
        bytemuck::cast_slice(vertices)
    }
}

/// Colors for linkage elements
pub mod colors {
    pub const GROUND: [f32; 4] = [0.45, 0.45, 0.5, 1.0];
    pub const INPUT: [f32; 4] = [0.2, 0.6, 1.0, 1.0];
    pub const COUPLER: [f32; 4] = [0.2, 0.8, 0.4, 1.0];
    pub const OUTPUT: [f32; 4] = [1.0, 0.55, 0.2, 1.0];
    pub const PIVOT: [f32; 4] = [0.9, 0.9, 0.9, 1.0];
    pub const TRACER: [f32; 4] = [1.0, 0.85, 0.3, 1.0];
    /// Output link while the user is dragging it
    pub const DRAG_HIGHLIGHT: [f32; 4] = [1.0, 0.3, 0.3, 1.0];
}
