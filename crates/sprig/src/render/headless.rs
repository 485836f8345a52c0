//! # Headless Backend — Recording Instead of Drawing
//!
//! [`HeadlessBackend`] implements [`RenderBackend`] without a GPU. Every draw
//! call is captured as a [`DrawCall`] with its vertices, index count, bound
//! texture ids and the view-projection uniform in effect, so batching can be
//! checked call by call:
//!
//! ```ignore
//! let mut renderer = QuadBatchRenderer::new(HeadlessBackend::new(), config);
//! renderer.initialize(assets)?;
//! // ... draw ...
//! assert_eq!(renderer.backend().draw_calls().len(), 1);
//! ```
//!
//! It holds the backend to the same contracts a GPU would: shaders are read
//! from disk and must declare both entry points, draws require a bound shader
//! and allocated buffers, and slots must be within the advertised limit.

use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Mat4;

use super::Color;
use super::backend::{
    Capabilities, RenderBackend, ShaderId, Texture, TextureHandle, VIEW_PROJECTION_UNIFORM,
};
use super::vertex::QuadVertex;
use crate::error::RenderError;

/// Slot count advertised by [`HeadlessBackend::new`].
pub const DEFAULT_TEXTURE_SLOTS: u32 = 16;

#[derive(Debug)]
pub struct HeadlessTexture {
    id: u64,
    width: u32,
    height: u32,
}

impl Texture for HeadlessTexture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn native_id(&self) -> u64 {
        self.id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One recorded `draw`.
#[derive(Debug, Clone)]
pub struct DrawCall {
    pub vertices: Vec<QuadVertex>,
    pub index_count: u32,
    /// Native id bound to each slot for this draw; `None` for slots left
    /// unbound since the previous draw.
    pub textures: Vec<Option<u64>>,
    pub view_projection: Mat4,
}

impl DrawCall {
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }
}

#[derive(Debug, Default)]
struct Uniforms {
    mat4: HashMap<String, Mat4>,
    ints: HashMap<String, Vec<i32>>,
}

#[derive(Debug)]
pub struct HeadlessBackend {
    max_texture_slots: u32,
    next_texture_id: u64,
    next_shader_id: u32,
    shaders: HashMap<ShaderId, (PathBuf, Uniforms)>,
    bound_shader: Option<ShaderId>,
    /// `(max_vertices, index_count)` once buffers exist.
    buffers: Option<(usize, usize)>,
    bound_textures: Vec<Option<u64>>,
    draw_calls: Vec<DrawCall>,
    clears: Vec<Color>,
    viewport: Option<[u32; 4]>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::with_texture_slots(DEFAULT_TEXTURE_SLOTS)
    }

    pub fn with_texture_slots(max_texture_slots: u32) -> Self {
        Self {
            max_texture_slots,
            next_texture_id: 1,
            next_shader_id: 1,
            shaders: HashMap::new(),
            bound_shader: None,
            buffers: None,
            bound_textures: vec![None; max_texture_slots as usize],
            draw_calls: Vec::new(),
            clears: Vec::new(),
            viewport: None,
        }
    }

    /// Shorthand for a blank texture of the given size.
    pub fn texture(&mut self, width: u32, height: u32) -> TextureHandle {
        let id = self.next_texture_id;
        self.next_texture_id += 1;
        Arc::new(HeadlessTexture { id, width, height })
    }

    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    pub fn take_draw_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.draw_calls)
    }

    pub fn clears(&self) -> &[Color] {
        &self.clears
    }

    pub fn viewport(&self) -> Option<[u32; 4]> {
        self.viewport
    }

    pub fn bound_shader(&self) -> Option<ShaderId> {
        self.bound_shader
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    pub fn buffers_allocated(&self) -> bool {
        self.buffers.is_some()
    }

    pub fn uniform_mat4(&self, shader: ShaderId, name: &str) -> Option<Mat4> {
        self.shaders.get(&shader)?.1.mat4.get(name).copied()
    }

    pub fn uniform_ints(&self, shader: ShaderId, name: &str) -> Option<&[i32]> {
        self.shaders.get(&shader)?.1.ints.get(name).map(Vec::as_slice)
    }

    fn uniforms_mut(&mut self, shader: ShaderId) -> &mut Uniforms {
        match self.shaders.get_mut(&shader) {
            Some((_, uniforms)) => uniforms,
            None => panic!("{shader:?} is not a live shader"),
        }
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for HeadlessBackend {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            max_texture_slots: self.max_texture_slots,
        }
    }

    fn load_shader(&mut self, path: &Path) -> Result<ShaderId, RenderError> {
        let source = std::fs::read_to_string(path).map_err(|source| RenderError::ShaderLoad {
            path: path.to_path_buf(),
            source,
        })?;
        for entry in ["fn vs_main", "fn fs_main"] {
            if !source.contains(entry) {
                return Err(RenderError::ShaderCompile {
                    path: path.to_path_buf(),
                    message: format!("missing entry point `{}`", &entry[3..]),
                });
            }
        }
        let id = ShaderId(self.next_shader_id);
        self.next_shader_id += 1;
        self.shaders
            .insert(id, (path.to_path_buf(), Uniforms::default()));
        Ok(id)
    }

    fn release_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(&shader);
        if self.bound_shader == Some(shader) {
            self.bound_shader = None;
        }
    }

    fn bind_shader(&mut self, shader: ShaderId) {
        assert!(
            self.shaders.contains_key(&shader),
            "{shader:?} is not a live shader"
        );
        self.bound_shader = Some(shader);
    }

    fn unbind_shader(&mut self) {
        self.bound_shader = None;
    }

    fn set_uniform_mat4(&mut self, shader: ShaderId, name: &str, value: &Mat4) {
        self.uniforms_mut(shader).mat4.insert(name.to_owned(), *value);
    }

    fn set_uniform_int_array(&mut self, shader: ShaderId, name: &str, values: &[i32]) {
        self.uniforms_mut(shader)
            .ints
            .insert(name.to_owned(), values.to_vec());
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, RenderError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(RenderError::Texture {
                width,
                height,
                message: format!("expected {expected} bytes of RGBA8, got {}", rgba.len()),
            });
        }
        Ok(self.texture(width, height))
    }

    fn allocate_quad_buffers(
        &mut self,
        max_vertices: usize,
        indices: &[u32],
    ) -> Result<(), RenderError> {
        self.buffers = Some((max_vertices, indices.len()));
        Ok(())
    }

    fn release_quad_buffers(&mut self) {
        self.buffers = None;
    }

    fn bind_texture(&mut self, slot: u32, texture: &TextureHandle) {
        assert!(
            slot < self.max_texture_slots,
            "texture slot {slot} out of range (max {})",
            self.max_texture_slots
        );
        self.bound_textures[slot as usize] = Some(texture.native_id());
    }

    fn draw(&mut self, vertices: &[QuadVertex], index_count: u32) {
        let (max_vertices, max_indices) = self
            .buffers
            .expect("draw before allocate_quad_buffers");
        let shader = self.bound_shader.expect("draw without a bound shader");
        assert!(vertices.len() <= max_vertices, "vertex buffer overrun");
        assert!(index_count as usize <= max_indices, "index buffer overrun");

        let view_projection = self
            .uniform_mat4(shader, VIEW_PROJECTION_UNIFORM)
            .unwrap_or(Mat4::IDENTITY);
        self.draw_calls.push(DrawCall {
            vertices: vertices.to_vec(),
            index_count,
            textures: self.bound_textures.clone(),
            view_projection,
        });
        // Each draw records only what was bound for it.
        self.bound_textures.fill(None);
    }

    fn clear(&mut self, color: Color) {
        self.clears.push(color);
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.viewport = Some([x, y, width, height]);
    }
}
