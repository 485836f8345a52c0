use glam::{Mat4, Vec3};

use crate::event::{Event, EventKind};
use crate::input::{Input, KeyCode};

/// A 2D camera with explicit clip bounds, a world position and a z-rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct OrthographicCamera {
    projection: Mat4,
    view: Mat4,
    view_projection: Mat4,
    position: Vec3,
    /// Degrees, counter-clockwise.
    rotation: f32,
}

impl OrthographicCamera {
    pub fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        let projection = Mat4::orthographic_rh(left, right, bottom, top, -1.0, 1.0);
        Self {
            projection,
            view: Mat4::IDENTITY,
            view_projection: projection,
            position: Vec3::ZERO,
            rotation: 0.0,
        }
    }

    pub fn set_projection(&mut self, left: f32, right: f32, bottom: f32, top: f32) {
        self.projection = Mat4::orthographic_rh(left, right, bottom, top, -1.0, 1.0);
        self.view_projection = self.projection * self.view;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.recalculate_view();
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = degrees;
        self.recalculate_view();
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    pub fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    fn recalculate_view(&mut self) {
        let transform = Mat4::from_translation(self.position)
            * Mat4::from_rotation_z(self.rotation.to_radians());
        self.view = transform.inverse();
        self.view_projection = self.projection * self.view;
    }
}

const ZOOM_STEP: f32 = 0.25;
const MIN_ZOOM: f32 = 0.25;
const ROTATION_SPEED: f32 = 180.0;

/// WASD panning, optional Q/E rotation and scroll zoom for an
/// [`OrthographicCamera`]. Pan speed scales with zoom so the view moves at
/// the same on-screen rate at any zoom level.
#[derive(Debug, Clone)]
pub struct OrthoCameraController {
    aspect_ratio: f32,
    zoom: f32,
    camera: OrthographicCamera,
    rotation_enabled: bool,
    position: Vec3,
    rotation: f32,
    translation_speed: f32,
}

impl OrthoCameraController {
    pub fn new(aspect_ratio: f32, rotation: bool) -> Self {
        let zoom = 1.0;
        Self {
            aspect_ratio,
            zoom,
            camera: OrthographicCamera::new(
                -aspect_ratio * zoom,
                aspect_ratio * zoom,
                -zoom,
                zoom,
            ),
            rotation_enabled: rotation,
            position: Vec3::ZERO,
            rotation: 0.0,
            translation_speed: zoom,
        }
    }

    pub fn camera(&self) -> &OrthographicCamera {
        &self.camera
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.max(MIN_ZOOM);
        self.translation_speed = self.zoom;
        self.update_projection();
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn on_update(&mut self, dt: f32, keys: &Input<KeyCode>) {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let step = self.translation_speed * dt;

        if keys.pressed(KeyCode::A) {
            self.position.x -= cos * step;
            self.position.y -= sin * step;
        } else if keys.pressed(KeyCode::D) {
            self.position.x += cos * step;
            self.position.y += sin * step;
        }

        if keys.pressed(KeyCode::W) {
            self.position.x -= sin * step;
            self.position.y += cos * step;
        } else if keys.pressed(KeyCode::S) {
            self.position.x += sin * step;
            self.position.y -= cos * step;
        }

        if self.rotation_enabled {
            if keys.pressed(KeyCode::Q) {
                self.rotation += ROTATION_SPEED * dt;
            }
            if keys.pressed(KeyCode::E) {
                self.rotation -= ROTATION_SPEED * dt;
            }
            self.rotation = wrap_degrees(self.rotation);
            self.camera.set_rotation(self.rotation);
        }

        self.camera.set_position(self.position);
    }

    /// Reacts to scroll and resize. Never marks the event handled.
    pub fn on_event(&mut self, event: &mut Event) {
        match *event.kind() {
            EventKind::MouseScrolled { y_offset, .. } => {
                self.set_zoom(self.zoom - y_offset * ZOOM_STEP);
            }
            EventKind::WindowResized { width, height } => {
                self.on_resize(width as f32, height as f32);
            }
            _ => {}
        }
    }

    pub fn on_resize(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.aspect_ratio = width / height;
            self.update_projection();
        }
    }

    fn update_projection(&mut self) {
        let (a, z) = (self.aspect_ratio, self.zoom);
        self.camera.set_projection(-a * z, a * z, -z, z);
    }
}

/// Wrap into (-180, 180].
fn wrap_degrees(mut degrees: f32) -> f32 {
    if degrees > 180.0 {
        degrees -= 360.0;
    } else if degrees <= -180.0 {
        degrees += 360.0;
    }
    degrees
}
