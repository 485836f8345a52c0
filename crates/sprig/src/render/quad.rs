use glam::{Mat4, Vec2, Vec3};

use super::Color;
use super::backend::TextureHandle;
use crate::math::quad_transform;

/// An ephemeral quad draw request, built per call and consumed by
/// [`QuadBatchRenderer::draw_quad`](super::QuadBatchRenderer::draw_quad).
///
/// ```ignore
/// renderer.draw_quad(
///     &Quad::new(Vec2::new(1.0, 0.0), Vec2::splat(2.0))
///         .color(Color::RED)
///         .rotation(30.0),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Quad {
    pub position: Vec2,
    pub size: Vec2,
    pub color: Color,
    pub texture: Option<TextureHandle>,
    /// Degrees, counter-clockwise about +Z.
    pub rotation: f32,
    pub tiling_factor: f32,
    /// Z of the quad plane.
    pub depth: f32,
}

impl Quad {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            ..Default::default()
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn texture(mut self, texture: TextureHandle) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn tiling(mut self, factor: f32) -> Self {
        self.tiling_factor = factor;
        self
    }

    pub fn depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    pub fn transform(&self) -> Mat4 {
        quad_transform(self.position.extend(self.depth), self.size, self.rotation)
    }
}

impl Default for Quad {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            size: Vec2::ONE,
            color: Color::WHITE,
            texture: None,
            rotation: 0.0,
            tiling_factor: 1.0,
            depth: 0.0,
        }
    }
}

impl From<Vec3> for Quad {
    /// Unit quad at `position.xy`, plane `position.z`.
    fn from(position: Vec3) -> Self {
        Self::new(position.truncate(), Vec2::ONE).depth(position.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_is_in_degrees() {
        let quad = Quad::default().rotation(90.0);
        let p = quad.transform().transform_point3(Vec3::new(0.5, 0.0, 0.0));
        assert!((p - Vec3::new(0.0, 0.5, 0.0)).length() < 1e-5);
    }
}
