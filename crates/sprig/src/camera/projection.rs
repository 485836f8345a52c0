use std::fmt;

use glam::Mat4;

pub const DEFAULT_PERSPECTIVE_FOV: f32 = 45.0;
pub const DEFAULT_PERSPECTIVE_NEAR: f32 = 0.01;
pub const DEFAULT_PERSPECTIVE_FAR: f32 = 1000.0;
pub const DEFAULT_ORTHOGRAPHIC_SIZE: f32 = 10.0;
pub const DEFAULT_ORTHOGRAPHIC_NEAR: f32 = -1.0;
pub const DEFAULT_ORTHOGRAPHIC_FAR: f32 = 1.0;

/// How a [`ProjectionCamera`] maps view space to clip space.
///
/// `Unknown` is what an unrecognized name decodes to. It produces an
/// identity projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionType {
    Unknown,
    Perspective,
    #[default]
    Orthographic,
}

impl ProjectionType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Perspective => "Perspective",
            Self::Orthographic => "Orthographic",
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "Perspective" => Self::Perspective,
            "Orthographic" => Self::Orthographic,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ProjectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveParams {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveParams {
    fn default() -> Self {
        Self {
            fov: DEFAULT_PERSPECTIVE_FOV,
            near: DEFAULT_PERSPECTIVE_NEAR,
            far: DEFAULT_PERSPECTIVE_FAR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthographicParams {
    /// Visible height in world units.
    pub size: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrthographicParams {
    fn default() -> Self {
        Self {
            size: DEFAULT_ORTHOGRAPHIC_SIZE,
            near: DEFAULT_ORTHOGRAPHIC_NEAR,
            far: DEFAULT_ORTHOGRAPHIC_FAR,
        }
    }
}

/// Projection from parameters and a viewport size.
///
/// Every setter recomputes the cached matrix, so [`projection`](Self::projection)
/// is a plain read.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionCamera {
    projection_type: ProjectionType,
    perspective: PerspectiveParams,
    orthographic: OrthographicParams,
    viewport: (f32, f32),
    projection: Mat4,
}

impl Default for ProjectionCamera {
    fn default() -> Self {
        Self::orthographic(OrthographicParams::default())
    }
}

impl ProjectionCamera {
    pub fn perspective(params: PerspectiveParams) -> Self {
        Self::build(ProjectionType::Perspective, params, OrthographicParams::default())
    }

    pub fn orthographic(params: OrthographicParams) -> Self {
        Self::build(ProjectionType::Orthographic, PerspectiveParams::default(), params)
    }

    fn build(
        projection_type: ProjectionType,
        perspective: PerspectiveParams,
        orthographic: OrthographicParams,
    ) -> Self {
        let mut camera = Self {
            projection_type,
            perspective,
            orthographic,
            viewport: (1.0, 1.0),
            projection: Mat4::IDENTITY,
        };
        camera.recalculate();
        camera
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    pub fn projection_type(&self) -> ProjectionType {
        self.projection_type
    }

    pub fn set_projection_type(&mut self, projection_type: ProjectionType) {
        self.projection_type = projection_type;
        self.recalculate();
    }

    pub fn perspective_params(&self) -> PerspectiveParams {
        self.perspective
    }

    /// Replace the perspective parameters and switch to perspective.
    pub fn set_perspective(&mut self, params: PerspectiveParams) {
        self.projection_type = ProjectionType::Perspective;
        self.perspective = params;
        self.recalculate();
    }

    pub fn orthographic_params(&self) -> OrthographicParams {
        self.orthographic
    }

    /// Replace the orthographic parameters and switch to orthographic.
    pub fn set_orthographic(&mut self, params: OrthographicParams) {
        self.projection_type = ProjectionType::Orthographic;
        self.orthographic = params;
        self.recalculate();
    }

    pub fn set_orthographic_size(&mut self, size: f32) {
        self.orthographic.size = size;
        self.recalculate();
    }

    pub fn set_perspective_fov(&mut self, fov: f32) {
        self.perspective.fov = fov;
        self.recalculate();
    }

    pub fn viewport(&self) -> (f32, f32) {
        self.viewport
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = (width, height);
        self.recalculate();
    }

    /// `|width / height|`, or 1 for a degenerate viewport.
    pub fn aspect_ratio(&self) -> f32 {
        let (w, h) = self.viewport;
        if h == 0.0 || w == 0.0 {
            return 1.0;
        }
        (w / h).abs()
    }

    fn recalculate(&mut self) {
        let aspect = self.aspect_ratio();
        self.projection = match self.projection_type {
            ProjectionType::Perspective => {
                let p = self.perspective;
                Mat4::perspective_rh(p.fov.to_radians(), aspect, p.near, p.far)
            }
            ProjectionType::Orthographic => {
                let o = self.orthographic;
                let half_h = o.size * 0.5;
                let half_w = half_h * aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, o.near, o.far)
            }
            ProjectionType::Unknown => {
                log::error!("unknown projection type, using identity");
                Mat4::IDENTITY
            }
        };
    }
}
