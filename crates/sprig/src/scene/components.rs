//! # Scene Components
//!
//! The fixed set of component types a [`Scene`](super::Scene) knows about
//! and the serializer persists:
//!
//! | component | attached by | purpose |
//! |---|---|---|
//! | [`Transform`] | every entity | translation, Euler rotation, scale |
//! | [`Tag`] | every entity | display name |
//! | [`SpriteRenderer`] | user | tinted quad, drawn every frame |
//! | [`Camera`] | `create_camera` | projection + fixed-aspect flag |
//! | [`NativeScript`] | user | owned [`Behavior`] |

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::script::Behavior;
use crate::camera::ProjectionCamera;
use crate::render::Color;

pub const DEFAULT_TAG: &str = "Entity";

/// Position, orientation and size of an entity.
///
/// Rotation is Euler angles in radians, applied X then Y then Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            translation: Vec3::new(x, y, z),
            ..Self::IDENTITY
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// `T · Rz · Ry · Rx · S`
    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::ZYX,
            self.rotation.z,
            self.rotation.y,
            self.rotation.x,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub tag: String,
}

impl Tag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl Default for Tag {
    fn default() -> Self {
        Self::new(DEFAULT_TAG)
    }
}

/// Color multiplied into the sprite's texture (white when untextured).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteRenderer {
    pub color: Color,
}

impl SpriteRenderer {
    pub fn new(color: impl Into<Color>) -> Self {
        Self {
            color: color.into(),
        }
    }
}

/// A projection camera attached to an entity.
///
/// When `fixed_aspect_ratio` is false the scene overwrites the camera's
/// viewport on every resize.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Camera {
    pub camera: ProjectionCamera,
    pub fixed_aspect_ratio: bool,
}

impl Camera {
    pub fn new(camera: ProjectionCamera) -> Self {
        Self {
            camera,
            fixed_aspect_ratio: false,
        }
    }
}

/// Owns one [`Behavior`] and drives its lifecycle.
///
/// `on_create` runs lazily before the first update. `on_destroy` runs once
/// when the component drops, and only if `on_create` ran.
pub struct NativeScript {
    name: String,
    instance: Option<Box<dyn Behavior>>,
    created: bool,
    /// Set while the behavior is moved out for an update.
    running: bool,
}

impl NativeScript {
    pub fn new(behavior: impl Behavior) -> Self {
        Self::from_boxed(Box::new(behavior))
    }

    pub fn from_boxed(behavior: Box<dyn Behavior>) -> Self {
        Self {
            name: behavior.name().to_owned(),
            instance: Some(behavior),
            created: false,
            running: false,
        }
    }

    /// A script slot that remembers a name but has nothing bound.
    pub fn unbound(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance: None,
            created: false,
            running: false,
        }
    }

    /// Bind a behavior to an unbound slot.
    ///
    /// # Panics
    ///
    /// If a behavior is already bound, including from inside its own
    /// update.
    pub fn bind(&mut self, behavior: Box<dyn Behavior>) {
        assert!(
            !self.running,
            "native script '{}' cannot be rebound while it is running",
            self.name
        );
        assert!(
            self.instance.is_none(),
            "native script '{}' is already bound",
            self.name
        );
        self.name = behavior.name().to_owned();
        self.instance = Some(behavior);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_bound(&self) -> bool {
        self.instance.is_some()
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Move the behavior out for an update, with its created flag.
    pub(crate) fn take(&mut self) -> Option<(Box<dyn Behavior>, bool)> {
        let instance = self.instance.take()?;
        self.running = true;
        Some((instance, self.created))
    }

    pub(crate) fn restore(&mut self, instance: Box<dyn Behavior>, created: bool) {
        debug_assert!(self.instance.is_none(), "script slot refilled while running");
        self.instance = Some(instance);
        self.created = created;
        self.running = false;
    }
}

impl Drop for NativeScript {
    fn drop(&mut self) {
        if !self.created {
            return;
        }
        if let Some(instance) = self.instance.as_mut() {
            instance.on_destroy();
        }
    }
}

impl std::fmt::Debug for NativeScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeScript")
            .field("name", &self.name)
            .field("bound", &self.is_bound())
            .field("created", &self.created)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_transform_matrix() {
        assert_eq!(Transform::default().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn transform_applies_scale_then_rotation_then_translation() {
        let transform = Transform::from_xyz(5.0, 0.0, 0.0)
            .with_scale(Vec3::new(2.0, 1.0, 1.0))
            .with_rotation(Vec3::new(0.0, 0.0, FRAC_PI_2));
        let p = transform.matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        // (1,0) → scale (2,0) → rotate 90° (0,2) → translate (5,2).
        assert!((p.x - 5.0).abs() < 1e-5);
        assert!((p.y - 2.0).abs() < 1e-5);
    }

    #[test]
    fn euler_order_is_z_y_x() {
        let rotation = Vec3::new(0.3, 0.5, 0.7);
        let transform = Transform::IDENTITY.with_rotation(rotation);
        let expected = Mat4::from_rotation_z(rotation.z)
            * Mat4::from_rotation_y(rotation.y)
            * Mat4::from_rotation_x(rotation.x);
        assert!(transform.matrix().abs_diff_eq(expected, 1e-5));
    }

    struct Idle;

    impl Behavior for Idle {
        fn name(&self) -> &str {
            "Idle"
        }
    }

    #[test]
    #[should_panic(expected = "already bound")]
    fn bind_twice_panics() {
        let mut script = NativeScript::new(Idle);
        script.bind(Box::new(Idle));
    }

    #[test]
    #[should_panic(expected = "while it is running")]
    fn bind_during_update_panics() {
        let mut script = NativeScript::new(Idle);
        let (instance, created) = script.take().unwrap();
        assert!(!script.is_bound());
        script.bind(Box::new(Idle));
        script.restore(instance, created);
    }

    #[test]
    fn restore_puts_the_behavior_back() {
        let mut script = NativeScript::new(Idle);
        let (instance, _) = script.take().unwrap();
        script.restore(instance, true);
        assert!(script.is_bound());
        assert!(script.is_created());
    }

    #[test]
    fn default_tag_and_sprite() {
        assert_eq!(Tag::default().tag, "Entity");
        assert_eq!(SpriteRenderer::default().color, Color::WHITE);
    }

    #[test]
    fn transform_deserializes_with_missing_fields() {
        let t: Transform = serde_json::from_str(r#"{"translation":[1.0,2.0,3.0]}"#).unwrap();
        assert_eq!(t.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.scale, Vec3::ONE);
    }
}
