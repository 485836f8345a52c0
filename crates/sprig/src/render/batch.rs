//! # Quad Batching — Few Draw Calls for Many Sprites
//!
//! Drawing every sprite with its own draw call is the classic 2D bottleneck.
//! The batch renderer instead appends quads to one CPU-side vertex array and
//! submits them together, flushing only when it has to.
//!
//! ## State Machine
//!
//! ```text
//!  Uninitialized ──initialize──► Idle ──begin──► Recording
//!        ▲                        │  ▲              │
//!        └────────shutdown────────┘  └─────end──────┘
//! ```
//!
//! ## Per-Quad Algorithm
//!
//! ```text
//! draw_quad(q)
//!   1. batch already holds max_quads?      ──► flush
//!   2. texture slot:
//!        none                               ──► slot 0 (1x1 white)
//!        already in slot table              ──► reuse that slot
//!        free slot left                     ──► append to table
//!        table full                         ──► flush, then append
//!   3. model = T(pos, depth) · Rz(rot°) · S(size, 1)
//!      append 4 world-space vertices, quad_count += 1
//! ```
//!
//! Capacity is checked before the slot lookup so that a flush can never
//! discard a slot that was just handed out.
//!
//! A flush binds every texture in the slot table, issues exactly one
//! [`RenderBackend::draw`], bumps `draw_calls`, then resets the vertex cursor
//! and the slot table (back to just the white texture). The vertex array and
//! slot table are allocated once in [`initialize`](QuadBatchRenderer::initialize)
//! and reused every frame.
//!
//! ## Draw-Call Bound
//!
//! With one texture, N quads cost `ceil(N / max_quads)` draw calls. Each
//! extra flush comes from running out of texture slots, which happens only
//! when a batch references more than `max_texture_slots - 1` distinct textures.
//!
//! ## Comparison
//!
//! - **Sort-then-batch** (group sprites by texture first): fewer slot flushes
//!   but loses submission order, which 2D layering depends on.
//! - **Instancing**: one vertex per quad plus a per-instance matrix; cheaper
//!   uploads but needs instanced-draw support in the backend.

use std::path::Path;

use glam::Mat4;

use super::Color;
use super::backend::{
    RenderBackend, ShaderId, TEXTURES_UNIFORM, TextureHandle, VIEW_PROJECTION_UNIFORM,
};
use super::quad::Quad;
use super::stats::RenderStats;
use super::vertex::{QUAD_POSITIONS, QUAD_TEX_COORDS, QuadVertex, build_quad_indices};
use crate::config::RendererConfig;
use crate::error::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Uninitialized,
    Idle,
    Recording,
}

/// Backend objects that exist only between `initialize` and `shutdown`.
struct Resources {
    shader: ShaderId,
}

pub struct QuadBatchRenderer<B: RenderBackend> {
    backend: B,
    config: RendererConfig,
    state: RendererState,
    resources: Option<Resources>,
    max_texture_slots: usize,
    vertices: Vec<QuadVertex>,
    /// Slot table; index 0 is always the white texture while initialized.
    slots: Vec<TextureHandle>,
    stats: RenderStats,
}

impl<B: RenderBackend> QuadBatchRenderer<B> {
    pub fn new(backend: B, config: RendererConfig) -> Self {
        Self {
            backend,
            config,
            state: RendererState::Uninitialized,
            resources: None,
            max_texture_slots: 0,
            vertices: Vec::new(),
            slots: Vec::new(),
            stats: RenderStats::default(),
        }
    }

    /// Create the quad buffers, load the textured-quad shader from
    /// `assets_dir` and create the white texture for slot 0.
    ///
    /// On error nothing is left allocated and the renderer stays
    /// uninitialized; callers should treat that as fatal to startup.
    pub fn initialize(&mut self, assets_dir: impl AsRef<Path>) -> Result<(), RenderError> {
        if self.state != RendererState::Uninitialized {
            log::warn!("renderer already initialized");
            return Ok(());
        }
        self.config
            .validate()
            .map_err(|e| RenderError::Backend(e.to_string()))?;

        let max_slots = self.backend.capabilities().max_texture_slots as usize;
        if max_slots < 2 {
            return Err(RenderError::Backend(format!(
                "backend exposes {max_slots} texture slot(s), at least 2 are required"
            )));
        }

        let max_quads = self.config.max_quads_per_batch;
        let indices = build_quad_indices(max_quads);
        self.backend.allocate_quad_buffers(max_quads * 4, &indices)?;

        let shader_path = assets_dir.as_ref().join(&self.config.shader);
        let shader = match self.backend.load_shader(&shader_path) {
            Ok(shader) => shader,
            Err(e) => {
                log::error!("failed to load quad shader: {e}");
                self.backend.release_quad_buffers();
                return Err(e);
            }
        };

        let white = match self.backend.create_texture(1, 1, &[255, 255, 255, 255]) {
            Ok(white) => white,
            Err(e) => {
                log::error!("failed to create white texture: {e}");
                self.backend.release_shader(shader);
                self.backend.release_quad_buffers();
                return Err(e);
            }
        };

        let samplers: Vec<i32> = (0..max_slots as i32).collect();
        self.backend.bind_shader(shader);
        self.backend
            .set_uniform_int_array(shader, TEXTURES_UNIFORM, &samplers);
        self.backend.unbind_shader();

        self.max_texture_slots = max_slots;
        self.vertices = Vec::with_capacity(max_quads * 4);
        self.slots = Vec::with_capacity(max_slots);
        self.slots.push(white);
        self.resources = Some(Resources { shader });
        self.state = RendererState::Idle;

        log::info!(
            "quad renderer initialized: {max_quads} quads per batch, {max_slots} texture slots, shader {}",
            shader_path.display()
        );
        Ok(())
    }

    /// [`initialize`](Self::initialize) against the configured `assets_dir`.
    pub fn initialize_from_config(&mut self) -> Result<(), RenderError> {
        let assets_dir = self.config.assets_dir.clone();
        self.initialize(assets_dir)
    }

    /// Release every backend object and return to `Uninitialized`. A batch
    /// still recording is discarded.
    pub fn shutdown(&mut self) {
        let Some(resources) = self.resources.take() else {
            return;
        };
        if self.state == RendererState::Recording {
            log::warn!(
                "shutdown while recording, discarding {} quads",
                self.vertices.len() / 4
            );
            self.backend.unbind_shader();
        }
        self.vertices = Vec::new();
        self.slots = Vec::new();
        self.backend.release_shader(resources.shader);
        self.backend.release_quad_buffers();
        self.state = RendererState::Uninitialized;
        log::info!("quad renderer shut down");
    }

    /// Start a batch: bind the shader, upload `view_projection`, reset the
    /// cursor and slot table.
    ///
    /// # Panics
    ///
    /// Panics unless the renderer is initialized and idle.
    pub fn begin(&mut self, view_projection: &Mat4) {
        match self.state {
            RendererState::Idle => {}
            RendererState::Uninitialized => panic!("begin called before initialize"),
            RendererState::Recording => panic!("begin called while a batch is already open"),
        }
        let shader = self.shader();
        self.backend.bind_shader(shader);
        self.backend
            .set_uniform_mat4(shader, VIEW_PROJECTION_UNIFORM, view_projection);
        self.reset_batch();
        self.state = RendererState::Recording;
    }

    /// Like [`begin`](Self::begin), but returns a guard that calls
    /// [`end`](Self::end) when dropped.
    pub fn batch(&mut self, view_projection: &Mat4) -> Batch<'_, B> {
        self.begin(view_projection);
        Batch { renderer: self }
    }

    /// Flush what is left and unbind the shader.
    pub fn end(&mut self) {
        self.assert_recording("end");
        self.flush();
        self.backend.unbind_shader();
        self.state = RendererState::Idle;
    }

    pub fn draw_quad(&mut self, quad: &Quad) {
        self.submit(&quad.transform(), quad.color, quad.texture.as_ref(), quad.tiling_factor);
    }

    /// Draw a unit quad through an arbitrary model matrix (e.g. an entity's
    /// `Transform`).
    pub fn draw_transformed(
        &mut self,
        transform: &Mat4,
        color: Color,
        texture: Option<&TextureHandle>,
        tiling_factor: f32,
    ) {
        self.submit(transform, color, texture, tiling_factor);
    }

    /// Submit the current batch as one draw call. Does nothing when the batch
    /// is empty.
    pub fn flush(&mut self) {
        self.assert_recording("flush");
        if self.vertices.is_empty() {
            return;
        }
        for (slot, texture) in self.slots.iter().enumerate() {
            self.backend.bind_texture(slot as u32, texture);
        }
        let index_count = (self.vertices.len() / 4 * 6) as u32;
        self.backend.draw(&self.vertices, index_count);
        self.stats.draw_calls += 1;
        self.reset_batch();
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = RenderStats::default();
    }

    pub fn clear(&mut self, color: Color) {
        self.backend.clear(color);
    }

    /// Clear with the configured clear color.
    pub fn clear_default(&mut self) {
        self.backend.clear(self.config.clear_color);
    }

    pub fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.backend.set_viewport(x, y, width, height);
    }

    pub fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, RenderError> {
        self.backend.create_texture(width, height, rgba)
    }

    /// The reserved 1x1 white texture, once initialized.
    pub fn white_texture(&self) -> Option<&TextureHandle> {
        self.slots.first()
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn max_texture_slots(&self) -> usize {
        self.max_texture_slots
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn submit(
        &mut self,
        transform: &Mat4,
        color: Color,
        texture: Option<&TextureHandle>,
        tiling_factor: f32,
    ) {
        self.assert_recording("draw");

        if self.vertices.len() / 4 >= self.config.max_quads_per_batch {
            self.flush();
        }
        let tex_index = self.texture_slot(texture) as f32;

        let color = color.to_array();
        for (corner, uv) in QUAD_POSITIONS.iter().zip(QUAD_TEX_COORDS) {
            self.vertices.push(QuadVertex {
                position: transform.transform_point3(*corner).to_array(),
                color,
                tex_coord: uv.to_array(),
                tex_index,
                tiling_factor,
            });
        }
        self.stats.quad_count += 1;
    }

    fn texture_slot(&mut self, texture: Option<&TextureHandle>) -> usize {
        let Some(texture) = texture else {
            return 0;
        };
        let id = texture.native_id();
        if let Some(slot) = self.slots.iter().position(|t| t.native_id() == id) {
            return slot;
        }
        if self.slots.len() >= self.max_texture_slots {
            self.flush();
        }
        self.slots.push(texture.clone());
        self.slots.len() - 1
    }

    fn reset_batch(&mut self) {
        self.vertices.clear();
        self.slots.truncate(1);
    }

    fn shader(&self) -> ShaderId {
        match &self.resources {
            Some(resources) => resources.shader,
            None => panic!("renderer is not initialized"),
        }
    }

    fn assert_recording(&self, op: &str) {
        if self.state != RendererState::Recording {
            panic!("{op} called outside begin/end (renderer is {:?})", self.state);
        }
    }
}

impl<B: RenderBackend> Drop for QuadBatchRenderer<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// An open batch. Dropping it ends the batch.
pub struct Batch<'r, B: RenderBackend> {
    renderer: &'r mut QuadBatchRenderer<B>,
}

impl<B: RenderBackend> Batch<'_, B> {
    pub fn draw_quad(&mut self, quad: &Quad) {
        self.renderer.draw_quad(quad);
    }

    pub fn draw_transformed(
        &mut self,
        transform: &Mat4,
        color: Color,
        texture: Option<&TextureHandle>,
        tiling_factor: f32,
    ) {
        self.renderer
            .draw_transformed(transform, color, texture, tiling_factor);
    }

    pub fn flush(&mut self) {
        self.renderer.flush();
    }
}

impl<B: RenderBackend> Drop for Batch<'_, B> {
    fn drop(&mut self) {
        self.renderer.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessBackend;
    use glam::{Vec2, Vec3};
    use std::path::PathBuf;

    fn assets() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets")
    }

    fn renderer(max_quads: usize, slots: u32) -> QuadBatchRenderer<HeadlessBackend> {
        let config = RendererConfig {
            max_quads_per_batch: max_quads,
            ..Default::default()
        };
        let mut renderer =
            QuadBatchRenderer::new(HeadlessBackend::with_texture_slots(slots), config);
        renderer.initialize(assets()).unwrap();
        renderer
    }

    #[test]
    fn initialize_sets_up_backend() {
        let renderer = renderer(8, 4);
        assert_eq!(renderer.state(), RendererState::Idle);
        let backend = renderer.backend();
        assert!(backend.buffers_allocated());
        assert_eq!(backend.shader_count(), 1);
        assert_eq!(renderer.white_texture().map(|t| t.width()), Some(1));
        let shader = ShaderId(1);
        assert_eq!(backend.uniform_ints(shader, TEXTURES_UNIFORM), Some(&[0, 1, 2, 3][..]));
    }

    #[test]
    fn initialize_fails_without_shader() {
        let mut renderer = QuadBatchRenderer::new(HeadlessBackend::new(), RendererConfig::default());
        let err = renderer.initialize("/no/such/assets").unwrap_err();
        assert!(matches!(err, RenderError::ShaderLoad { .. }));
        assert_eq!(renderer.state(), RendererState::Uninitialized);
        assert!(!renderer.backend().buffers_allocated());
    }

    #[test]
    fn initialize_from_config_uses_assets_dir() {
        let config = RendererConfig {
            assets_dir: assets(),
            ..Default::default()
        };
        let mut renderer = QuadBatchRenderer::new(HeadlessBackend::new(), config);
        renderer.initialize_from_config().unwrap();
        assert_eq!(renderer.state(), RendererState::Idle);
    }

    #[test]
    fn initialize_rejects_single_slot_backends() {
        let mut renderer = QuadBatchRenderer::new(
            HeadlessBackend::with_texture_slots(1),
            RendererConfig::default(),
        );
        assert!(matches!(
            renderer.initialize(assets()),
            Err(RenderError::Backend(_))
        ));
    }

    #[test]
    fn one_batch_one_draw_call() {
        let mut renderer = renderer(100, 8);
        let textures: Vec<_> = (0..3).map(|_| renderer.backend_mut().texture(2, 2)).collect();

        renderer.begin(&Mat4::IDENTITY);
        for i in 0..50 {
            let mut quad = Quad::new(Vec2::new(i as f32, 0.0), Vec2::ONE);
            if i % 4 != 0 {
                quad = quad.texture(textures[i % 3].clone());
            }
            renderer.draw_quad(&quad);
        }
        renderer.end();

        let stats = renderer.stats();
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.quad_count, 50);
        assert_eq!(stats.vertex_count(), 200);
        assert_eq!(stats.index_count(), 300);

        let calls = renderer.backend().draw_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].index_count, 300);
    }

    #[test]
    fn capacity_overflow_splits_batch() {
        let max = 10;
        let mut renderer = renderer(max, 4);
        renderer.begin(&Mat4::IDENTITY);
        for _ in 0..=max {
            renderer.draw_quad(&Quad::default());
        }
        renderer.end();

        let counts: Vec<_> = renderer
            .backend()
            .draw_calls()
            .iter()
            .map(|c| c.quad_count())
            .collect();
        assert_eq!(counts, vec![max, 1]);
        assert_eq!(renderer.stats().draw_calls, 2);
        assert_eq!(renderer.stats().quad_count, 11);
    }

    #[test]
    fn same_texture_shares_a_slot() {
        let mut renderer = renderer(16, 4);
        let tex = renderer.backend_mut().texture(8, 8);
        renderer.begin(&Mat4::IDENTITY);
        renderer.draw_quad(&Quad::default().texture(tex.clone()));
        renderer.draw_quad(&Quad::default().texture(tex.clone()));
        renderer.end();

        let call = &renderer.backend().draw_calls()[0];
        assert!(call.vertices.iter().all(|v| v.tex_index == 1.0));
        assert_eq!(call.textures[1], Some(tex.native_id()));
        assert_eq!(call.textures[2], None);
    }

    #[test]
    fn slot_exhaustion_flushes() {
        // 3 slots: white + 2 textures per batch.
        let mut renderer = renderer(100, 3);
        let textures: Vec<_> = (0..3).map(|_| renderer.backend_mut().texture(1, 1)).collect();

        renderer.begin(&Mat4::IDENTITY);
        for tex in &textures {
            renderer.draw_quad(&Quad::default().texture(tex.clone()));
        }
        renderer.end();

        let calls = renderer.backend().draw_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].quad_count(), 2);
        assert_eq!(calls[1].quad_count(), 1);
        // The third texture starts the new batch at slot 1.
        assert!(calls[1].vertices.iter().all(|v| v.tex_index == 1.0));
        assert_eq!(calls[1].textures[1], Some(textures[2].native_id()));
    }

    #[test]
    fn filling_every_free_slot_still_fits_one_draw() {
        let slots = 4;
        let mut renderer = renderer(100, slots);
        let textures: Vec<_> = (0..slots).map(|_| renderer.backend_mut().texture(1, 1)).collect();

        // Slot 0 is white, so `slots - 1` textures fit in one batch.
        renderer.begin(&Mat4::IDENTITY);
        for tex in &textures[..slots as usize - 1] {
            renderer.draw_quad(&Quad::default().texture(tex.clone()));
        }
        renderer.end();
        assert_eq!(renderer.stats().draw_calls, 1);

        renderer.reset_stats();
        renderer.begin(&Mat4::IDENTITY);
        for tex in &textures {
            renderer.draw_quad(&Quad::default().texture(tex.clone()));
        }
        renderer.end();
        assert_eq!(renderer.stats().draw_calls, 2);
    }

    #[test]
    fn untextured_quads_use_white_slot() {
        let mut renderer = renderer(4, 2);
        let white_id = renderer.white_texture().unwrap().native_id();
        renderer.begin(&Mat4::IDENTITY);
        renderer.draw_quad(&Quad::default().color(Color::RED));
        renderer.end();

        let call = &renderer.backend().draw_calls()[0];
        assert_eq!(call.textures[0], Some(white_id));
        for v in &call.vertices {
            assert_eq!(v.tex_index, 0.0);
            assert_eq!(v.color, [1.0, 0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn vertices_follow_quad_transform() {
        let mut renderer = renderer(4, 2);
        renderer.begin(&Mat4::IDENTITY);
        renderer.draw_quad(
            &Quad::new(Vec2::new(3.0, 4.0), Vec2::new(2.0, 2.0))
                .depth(0.25)
                .tiling(3.0),
        );
        renderer.end();

        let call = &renderer.backend().draw_calls()[0];
        let positions: Vec<_> = call.vertices.iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            vec![
                [2.0, 3.0, 0.25],
                [4.0, 3.0, 0.25],
                [4.0, 5.0, 0.25],
                [2.0, 5.0, 0.25]
            ]
        );
        let uvs: Vec<_> = call.vertices.iter().map(|v| v.tex_coord).collect();
        assert_eq!(uvs, vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        assert!(call.vertices.iter().all(|v| v.tiling_factor == 3.0));
    }

    #[test]
    fn rotation_is_about_quad_center() {
        let mut renderer = renderer(4, 2);
        renderer.begin(&Mat4::IDENTITY);
        renderer.draw_quad(&Quad::default().rotation(180.0));
        renderer.end();
        let first = Vec3::from(renderer.backend().draw_calls()[0].vertices[0].position);
        assert!((first - Vec3::new(0.5, 0.5, 0.0)).length() < 1e-5);
    }

    #[test]
    fn begin_uploads_view_projection() {
        let mut renderer = renderer(4, 2);
        let vp = Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0);
        renderer.begin(&vp);
        renderer.draw_quad(&Quad::default());
        renderer.end();
        assert_eq!(renderer.backend().draw_calls()[0].view_projection, vp);
        assert_eq!(renderer.backend().bound_shader(), None);
    }

    #[test]
    fn empty_batch_issues_no_draw() {
        let mut renderer = renderer(4, 2);
        renderer.begin(&Mat4::IDENTITY);
        renderer.flush();
        renderer.end();
        assert_eq!(renderer.stats().draw_calls, 0);
        assert!(renderer.backend().draw_calls().is_empty());
    }

    #[test]
    fn stats_accumulate_until_reset() {
        let mut renderer = renderer(4, 2);
        for _ in 0..2 {
            renderer.begin(&Mat4::IDENTITY);
            renderer.draw_quad(&Quad::default());
            renderer.end();
        }
        assert_eq!(renderer.stats().draw_calls, 2);
        assert_eq!(renderer.stats().quad_count, 2);
        renderer.reset_stats();
        assert_eq!(renderer.stats(), RenderStats::default());
    }

    #[test]
    fn batch_guard_ends_on_drop() {
        let mut renderer = renderer(4, 2);
        {
            let mut batch = renderer.batch(&Mat4::IDENTITY);
            batch.draw_quad(&Quad::default());
        }
        assert_eq!(renderer.state(), RendererState::Idle);
        assert_eq!(renderer.stats().draw_calls, 1);
    }

    #[test]
    #[should_panic(expected = "outside begin/end")]
    fn draw_outside_batch_panics() {
        let mut renderer = renderer(4, 2);
        renderer.draw_quad(&Quad::default());
    }

    #[test]
    #[should_panic(expected = "before initialize")]
    fn begin_before_initialize_panics() {
        let mut renderer = QuadBatchRenderer::new(HeadlessBackend::new(), RendererConfig::default());
        renderer.begin(&Mat4::IDENTITY);
    }

    #[test]
    fn shutdown_releases_everything() {
        let mut renderer = renderer(4, 2);
        renderer.begin(&Mat4::IDENTITY);
        renderer.draw_quad(&Quad::default());
        renderer.shutdown();
        assert_eq!(renderer.state(), RendererState::Uninitialized);
        assert!(!renderer.backend().buffers_allocated());
        assert_eq!(renderer.backend().shader_count(), 0);
        assert!(renderer.backend().draw_calls().is_empty());

        // Can come back up.
        renderer.initialize(assets()).unwrap();
        assert_eq!(renderer.state(), RendererState::Idle);
    }
}
