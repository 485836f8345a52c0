use glam::{Mat4, Quat, Vec3};

use super::projection::{PerspectiveParams, ProjectionCamera};

pub const DEFAULT_DISTANCE: f32 = 10.0;

/// A [`ProjectionCamera`] placed in the world by orbiting a focal point.
///
/// Position sits `distance` units behind the focal point along the
/// orientation's forward axis (`-Z`).
#[derive(Debug, Clone, PartialEq)]
pub struct ViewProjectionCamera {
    camera: ProjectionCamera,
    focal_point: Vec3,
    distance: f32,
    orientation: Quat,
}

impl Default for ViewProjectionCamera {
    fn default() -> Self {
        Self::new(ProjectionCamera::perspective(PerspectiveParams::default()))
    }
}

impl ViewProjectionCamera {
    pub fn new(camera: ProjectionCamera) -> Self {
        Self {
            camera,
            focal_point: Vec3::ZERO,
            distance: DEFAULT_DISTANCE,
            orientation: Quat::IDENTITY,
        }
    }

    pub fn camera(&self) -> &ProjectionCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut ProjectionCamera {
        &mut self.camera
    }

    pub fn focal_point(&self) -> Vec3 {
        self.focal_point
    }

    pub fn set_focal_point(&mut self, focal_point: Vec3) {
        self.focal_point = focal_point;
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance;
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation.normalize();
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    pub fn position(&self) -> Vec3 {
        self.focal_point - self.forward() * self.distance
    }

    pub fn view(&self) -> Mat4 {
        (Mat4::from_translation(self.position()) * Mat4::from_quat(self.orientation)).inverse()
    }

    pub fn view_projection(&self) -> Mat4 {
        *self.camera.projection() * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sits_behind_origin() {
        let camera = ViewProjectionCamera::default();
        assert_eq!(camera.forward(), Vec3::NEG_Z);
        assert_eq!(camera.position(), Vec3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn view_moves_focal_point_in_front() {
        let camera = ViewProjectionCamera::default();
        let in_view = camera.view().transform_point3(Vec3::ZERO);
        assert!((in_view - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-5);
    }

    #[test]
    fn orientation_rotates_position_around_focal_point() {
        let mut camera = ViewProjectionCamera::default();
        camera.set_focal_point(Vec3::new(1.0, 0.0, 0.0));
        camera.set_orientation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        // Forward is now -X, so the eye is on the +X side of the focal point.
        let position = camera.position();
        assert!((position - Vec3::new(11.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn view_projection_composes_projection_and_view() {
        let mut camera = ViewProjectionCamera::default();
        camera.camera_mut().set_viewport(16.0, 9.0);
        assert_eq!(
            camera.view_projection(),
            *camera.camera().projection() * camera.view()
        );
    }
}
