//! 2D transforms expressed as column-vector `Mat4`s.
//!
//! Nodes live in the XY plane. A node's local transform is
//! `T(translation) * R(rotation) * S(scale)`, and its model transform maps
//! the unit box `[0,1]^2` onto a box of the node's size centered on the node
//! origin.

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use smallvec::SmallVec;

/// Build the local transform of a node.
#[inline]
#[must_use]
pub fn node_matrix(translation: Vec2, rotation: f32, scale: Vec2) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        scale.extend(1.0),
        Quat::from_rotation_z(rotation),
        translation.extend(0.0),
    )
}

/// Build the model transform `T(-size/2) * S(size)`.
#[inline]
#[must_use]
pub fn model_matrix(size: Vec2) -> Mat4 {
    Mat4::from_translation((-size * 0.5).extend(0.0)) * Mat4::from_scale(size.extend(1.0))
}

/// Transform a 2D point (z = 0, w = 1).
#[inline]
#[must_use]
pub fn transform_point(mat: &Mat4, point: Vec2) -> Vec2 {
    let p = *mat * Vec4::new(point.x, point.y, 0.0, 1.0);
    Vec2::new(p.x, p.y)
}

/// Transform a 2D direction (w = 0).
#[inline]
#[must_use]
pub fn transform_vector(mat: &Mat4, vector: Vec2) -> Vec2 {
    mat.transform_vector3(Vec3::new(vector.x, vector.y, 0.0)).truncate()
}

/// Stack of accumulated transforms used during hierarchy traversal.
///
/// The value at the top is the product `M0 * M1 * ... * Mn` of every pushed
/// matrix. The base level holds the identity (or the matrix passed to
/// [`TransformStack::with_base`]) and is never popped.
#[derive(Debug, Clone)]
pub struct TransformStack {
    stack: SmallVec<[Mat4; 8]>,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformStack {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base(Mat4::IDENTITY)
    }

    #[must_use]
    pub fn with_base(base: Mat4) -> Self {
        let mut stack = SmallVec::new();
        stack.push(base);
        Self { stack }
    }

    /// Push `mat` on top of the current accumulated transform.
    #[inline]
    pub fn push(&mut self, mat: Mat4) {
        let top = self.matrix();
        self.stack.push(top * mat);
    }

    #[inline]
    pub fn pop(&mut self) {
        assert!(self.stack.len() > 1, "transform stack underflow");
        self.stack.pop();
    }

    /// The accumulated transform.
    #[inline]
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        self.stack.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    #[inline]
    #[must_use]
    pub fn inverse_matrix(&self) -> Mat4 {
        self.matrix().inverse()
    }

    /// Number of pushed levels above the base.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn node_matrix_scales_then_rotates_then_translates() {
        let m = node_matrix(Vec2::new(10.0, 0.0), FRAC_PI_2, Vec2::new(2.0, 1.0));
        // (1,0) -> scale (2,0) -> rotate (0,2) -> translate (10,2)
        assert!(close(transform_point(&m, Vec2::X), Vec2::new(10.0, 2.0)));
    }

    #[test]
    fn model_matrix_centers_unit_box() {
        let m = model_matrix(Vec2::new(4.0, 2.0));
        assert!(close(transform_point(&m, Vec2::ZERO), Vec2::new(-2.0, -1.0)));
        assert!(close(transform_point(&m, Vec2::ONE), Vec2::new(2.0, 1.0)));
    }

    #[test]
    fn stack_accumulates_and_pops() {
        let mut stack = TransformStack::new();
        stack.push(Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
        stack.push(Mat4::from_scale(Vec3::new(2.0, 2.0, 1.0)));
        assert!(close(transform_point(&stack.matrix(), Vec2::ONE), Vec2::new(7.0, 2.0)));
        stack.pop();
        assert!(close(transform_point(&stack.matrix(), Vec2::ONE), Vec2::new(6.0, 1.0)));
        assert_eq!(stack.depth(), 1);
    }
}
