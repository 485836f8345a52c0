//! # Vertex — Per-Corner Data for Batched Quads
//!
//! ```text
//! QuadVertex (44 bytes per vertex)
//! ┌────────────┬──────────────┬───────────┬───────────┬──────────────┐
//! │ position   │ color        │ tex_coord │ tex_index │ tiling       │
//! │ [f32; 3]   │ [f32; 4]     │ [f32; 2]  │ f32       │ f32          │
//! │ offset 0   │ offset 12    │ offset 28 │ offset 36 │ offset 40    │
//! │ location 0 │ location 1   │ location 2│ location 3│ location 4   │
//! └────────────┴──────────────┴───────────┴───────────┴──────────────┘
//! ```
//!
//! Positions are already in world space; the batch applies each quad's model
//! matrix on the CPU so quads with different transforms share one draw call.
//! `tex_index` selects one of the texture slots bound for the draw.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Unit quad corners, counter-clockwise from bottom-left.
pub const QUAD_POSITIONS: [Vec3; 4] = [
    Vec3::new(-0.5, -0.5, 0.0),
    Vec3::new(0.5, -0.5, 0.0),
    Vec3::new(0.5, 0.5, 0.0),
    Vec3::new(-0.5, 0.5, 0.0),
];

pub const QUAD_TEX_COORDS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

/// Two triangles per quad, offset by `4 * quad` in the index buffer.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub tex_coord: [f32; 2],
    pub tex_index: f32,
    pub tiling_factor: f32,
}

#[cfg(feature = "gpu")]
impl QuadVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x4,
            },
            wgpu::VertexAttribute {
                offset: 28,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 36,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32,
            },
            wgpu::VertexAttribute {
                offset: 40,
                shader_location: 4,
                format: wgpu::VertexFormat::Float32,
            },
        ],
    };
}

/// Index buffer contents for `max_quads` quads.
pub(crate) fn build_quad_indices(max_quads: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(max_quads * QUAD_INDICES.len());
    for quad in 0..max_quads as u32 {
        indices.extend(QUAD_INDICES.iter().map(|i| i + quad * 4));
    }
    indices
}
