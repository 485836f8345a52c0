//! Convenience re-exports — `use sprig::prelude::*` for the common items.

pub use crate::camera::{
    OrthoCameraController, OrthographicCamera, OrthographicParams, PerspectiveParams,
    ProjectionCamera, ProjectionType, ViewProjectionCamera,
};
pub use crate::config::RendererConfig;
pub use crate::debug::{ProfileScope, Profiler};
pub use crate::ecs::{ComponentStore, Entity};
pub use crate::error::{ConfigError, ProfileError, RenderError, SerializeError};
pub use crate::event::{Event, EventCategory, EventKind};
pub use crate::input::{CursorPosition, Input, KeyCode, MouseButton};
pub use crate::layer::{Layer, LayerId, LayerStack};
pub use crate::math::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use crate::render::{
    Color, HeadlessBackend, Quad, QuadBatchRenderer, RenderBackend, RenderStats, TextureHandle,
};
#[cfg(feature = "gpu")]
pub use crate::render::gpu::WgpuBackend;
pub use crate::scene::{
    Behavior, Camera, CameraController, NativeScript, Scene, SceneSerializer, ScriptContext,
    ScriptRegistry, SpriteRenderer, Tag, Transform,
};
pub use crate::time::Time;
