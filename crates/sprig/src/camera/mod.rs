//! # Cameras
//!
//! Three camera flavours, all producing matrices for the quad renderer:
//!
//! | type | inputs | used by |
//! |---|---|---|
//! | [`ProjectionCamera`] | projection type, fov/size, near/far, viewport | the scene `Camera` component |
//! | [`ViewProjectionCamera`] | a `ProjectionCamera` + focal point, distance, orientation | editor-style orbit views |
//! | [`OrthographicCamera`] | explicit bounds, position, z-rotation | [`OrthoCameraController`] sandboxes |
//!
//! All projections follow the wgpu clip-space convention (depth in `0..1`).

mod orthographic;
mod projection;
mod view_projection;

pub use orthographic::{OrthoCameraController, OrthographicCamera};
pub use projection::{
    DEFAULT_ORTHOGRAPHIC_FAR, DEFAULT_ORTHOGRAPHIC_NEAR, DEFAULT_ORTHOGRAPHIC_SIZE,
    DEFAULT_PERSPECTIVE_FAR, DEFAULT_PERSPECTIVE_FOV, DEFAULT_PERSPECTIVE_NEAR,
    OrthographicParams, PerspectiveParams, ProjectionCamera, ProjectionType,
};
pub use view_projection::{DEFAULT_DISTANCE, ViewProjectionCamera};
