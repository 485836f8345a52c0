//! # Render — Batched Quads Over a Pluggable Backend
//!
//! ```text
//! Scene::on_update
//!   └─► QuadBatchRenderer::begin(view_projection)
//!         draw_quad / draw_transformed  ×N
//!           │  texture slot lookup, capacity check,
//!           │  4 vertices appended to the CPU batch
//!           ▼
//!         flush ──► RenderBackend::bind_texture ×slots
//!                   RenderBackend::draw(vertices, index_count)
//!       end ──► final flush, unbind shader
//! ```
//!
//! [`QuadBatchRenderer`] owns every piece of batching state; nothing here is a
//! global. The [`RenderBackend`] trait is the seam to the GPU:
//! [`HeadlessBackend`] records calls for tests and tools, and `WgpuBackend`
//! (feature `gpu`) draws for real.

mod backend;
mod batch;
#[cfg(feature = "gpu")]
pub mod gpu;
mod headless;
mod quad;
mod stats;
mod vertex;

pub use backend::{
    Capabilities, RenderBackend, ShaderId, TEXTURES_UNIFORM, Texture, TextureHandle,
    VIEW_PROJECTION_UNIFORM,
};
pub use batch::{Batch, QuadBatchRenderer, RendererState};
pub use headless::{DrawCall, HeadlessBackend, HeadlessTexture};
pub use quad::Quad;
pub use stats::RenderStats;
pub use vertex::{QUAD_INDICES, QUAD_POSITIONS, QUAD_TEX_COORDS, QuadVertex};

use serde::{Deserialize, Serialize};

/// An RGBA color with floating-point components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    pub const BLACK: Self = Self { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const RED: Self = Self { r: 1.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const GREEN: Self = Self { r: 0.0, g: 1.0, b: 0.0, a: 1.0 };
    pub const BLUE: Self = Self { r: 0.0, g: 0.0, b: 1.0, a: 1.0 };

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 4]> for Color {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }
}

impl From<glam::Vec4> for Color {
    fn from(v: glam::Vec4) -> Self {
        Self::rgba(v.x, v.y, v.z, v.w)
    }
}
