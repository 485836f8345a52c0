//! # Sprig — Scene Runtime with a Batched Quad Renderer
//!
//! An entity/component store, a scene that owns gameplay state, and a 2D
//! renderer that turns every `(Transform, SpriteRenderer)` entity into as
//! few draw calls as texture slots and buffer capacity allow.
//!
//! ```text
//! Scene ──owns──► ComponentStore
//!   │ on_update(dt, &mut renderer)
//!   ├─► NativeScript behaviors
//!   └─► QuadBatchRenderer<B: RenderBackend> ──► HeadlessBackend | WgpuBackend
//! ```
//!
//! Start with `use sprig::prelude::*`.

pub mod camera;
pub mod config;
pub mod debug;
pub mod ecs;
pub mod error;
pub mod event;
pub mod input;
pub mod layer;
pub mod math;
pub mod prelude;
pub mod render;
pub mod scene;
pub mod time;

/// Install `env_logger` with an `info` default (overridable via `RUST_LOG`).
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
