//! The seam between batching and the GPU.
//!
//! A backend owns every GPU object. The batch renderer only ever refers to
//! them through [`ShaderId`] and [`TextureHandle`], and issues one
//! [`draw`](RenderBackend::draw) per flush.

use std::any::Any;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use glam::Mat4;

use super::Color;
use super::vertex::QuadVertex;
use crate::error::RenderError;

/// Uniform carrying the camera view-projection matrix.
pub const VIEW_PROJECTION_UNIFORM: &str = "u_view_projection";

/// Uniform carrying the sampler slot indices `[0, 1, .., max_slots - 1]`.
pub const TEXTURES_UNIFORM: &str = "u_textures";

/// A texture living on the backend.
pub trait Texture: Any + Send + Sync + fmt::Debug {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Backend-unique identity. Two handles with the same id are the same
    /// texture for slot-sharing purposes.
    fn native_id(&self) -> u64;

    /// Lets a backend recover its own concrete texture type.
    fn as_any(&self) -> &dyn Any;
}

/// Shared, opaque texture handle.
pub type TextureHandle = Arc<dyn Texture>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(pub u32);

/// Hardware limits queried once at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Texture units usable by one draw call.
    pub max_texture_slots: u32,
}

pub trait RenderBackend {
    fn capabilities(&self) -> Capabilities;

    /// Compile and link the shader at `path`.
    fn load_shader(&mut self, path: &Path) -> Result<ShaderId, RenderError>;

    fn release_shader(&mut self, shader: ShaderId);

    fn bind_shader(&mut self, shader: ShaderId);

    fn unbind_shader(&mut self);

    fn set_uniform_mat4(&mut self, shader: ShaderId, name: &str, value: &Mat4);

    fn set_uniform_int_array(&mut self, shader: ShaderId, name: &str, values: &[i32]);

    /// Upload tightly packed RGBA8 pixels.
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, RenderError>;

    /// Create the shared vertex buffer (`max_vertices` long) and the static
    /// index buffer.
    fn allocate_quad_buffers(&mut self, max_vertices: usize, indices: &[u32])
    -> Result<(), RenderError>;

    fn release_quad_buffers(&mut self);

    fn bind_texture(&mut self, slot: u32, texture: &TextureHandle);

    /// Upload `vertices` and issue exactly one indexed draw call.
    fn draw(&mut self, vertices: &[QuadVertex], index_count: u32);

    fn clear(&mut self, color: Color);

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32);
}
