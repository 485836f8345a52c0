//! Math types and glam re-exports.
//!
//! Everything spatial in the crate is expressed in [glam](https://docs.rs/glam)
//! types, re-exported here so users don't need to depend on it directly.

pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

/// `translate(position) · rotateZ(rotation) · scale(size, 1)` as one matrix.
/// `rotation` is in degrees.
pub fn quad_transform(position: Vec3, size: Vec2, rotation: f32) -> Mat4 {
    Mat4::from_translation(position)
        * Mat4::from_rotation_z(rotation.to_radians())
        * Mat4::from_scale(size.extend(1.0))
}
