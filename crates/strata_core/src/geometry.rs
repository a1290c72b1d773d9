//! Rectangles and oriented boxes.

use glam::{Mat4, Vec2};
use serde::{Deserialize, Serialize};

use crate::transform::transform_point;

/// Axis aligned rectangle. `(x, y)` is the top left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn from_points(a: Vec2, b: Vec2) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    #[inline]
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.position() + self.size() * 0.5
    }

    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }

    /// Smallest rectangle containing both. An empty rectangle contributes
    /// nothing to the union.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let min = self.position().min(other.position());
        let max = (self.position() + self.size()).max(other.position() + other.size());
        Rect::from_points(min, max)
    }

    /// Axis aligned bounds of the unit box transformed by `mat`.
    #[must_use]
    pub fn bounding_rect(mat: &Mat4) -> Rect {
        OrientedBox::from_matrix(mat).bounding_rect()
    }
}

/// A box that may be rotated, stored as its four transformed corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    top_left: Vec2,
    top_right: Vec2,
    bot_left: Vec2,
    bot_right: Vec2,
}

impl Default for OrientedBox {
    fn default() -> Self {
        Self {
            top_left: Vec2::new(0.0, 0.0),
            top_right: Vec2::new(1.0, 0.0),
            bot_left: Vec2::new(0.0, 1.0),
            bot_right: Vec2::new(1.0, 1.0),
        }
    }
}

impl OrientedBox {
    /// The unit box `[0,1]^2` transformed by `mat`.
    #[must_use]
    pub fn from_matrix(mat: &Mat4) -> Self {
        let mut b = Self::default();
        b.transform(mat);
        b
    }

    #[must_use]
    pub fn from_rect(rect: &Rect) -> Self {
        let p = rect.position();
        Self {
            top_left: p,
            top_right: p + Vec2::new(rect.width, 0.0),
            bot_left: p + Vec2::new(0.0, rect.height),
            bot_right: p + rect.size(),
        }
    }

    pub fn transform(&mut self, mat: &Mat4) {
        self.top_left = transform_point(mat, self.top_left);
        self.top_right = transform_point(mat, self.top_right);
        self.bot_left = transform_point(mat, self.bot_left);
        self.bot_right = transform_point(mat, self.bot_right);
    }

    #[must_use]
    pub fn transformed(mut self, mat: &Mat4) -> Self {
        self.transform(mat);
        self
    }

    #[must_use]
    pub fn top_left(&self) -> Vec2 {
        self.top_left
    }
    #[must_use]
    pub fn top_right(&self) -> Vec2 {
        self.top_right
    }
    #[must_use]
    pub fn bottom_left(&self) -> Vec2 {
        self.bot_left
    }
    #[must_use]
    pub fn bottom_right(&self) -> Vec2 {
        self.bot_right
    }

    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.top_left + (self.bot_right - self.top_left) * 0.5
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        (self.top_right - self.top_left).length()
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        (self.bot_left - self.top_left).length()
    }

    #[must_use]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width(), self.height())
    }

    /// Rotation of the box's top edge relative to the X axis, in radians.
    #[must_use]
    pub fn rotation(&self) -> f32 {
        let dir = (self.top_right - self.top_left).normalize_or_zero();
        let cosine = Vec2::X.dot(dir).clamp(-1.0, 1.0);
        let angle = cosine.acos();
        if dir.y < 0.0 { -angle } else { angle }
    }

    #[must_use]
    pub fn corners(&self) -> [Vec2; 4] {
        [self.top_left, self.top_right, self.bot_left, self.bot_right]
    }

    #[must_use]
    pub fn bounding_rect(&self) -> Rect {
        let corners = self.corners();
        let min = corners.iter().fold(Vec2::splat(f32::MAX), |acc, c| acc.min(*c));
        let max = corners.iter().fold(Vec2::splat(f32::MIN), |acc, c| acc.max(*c));
        Rect::from_points(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{model_matrix, node_matrix};
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn box_decomposes_rotation_and_size() {
        let mat = node_matrix(Vec2::new(3.0, 4.0), FRAC_PI_4, Vec2::ONE)
            * model_matrix(Vec2::new(10.0, 2.0));
        let b = OrientedBox::from_matrix(&mat);
        assert!((b.rotation() - FRAC_PI_4).abs() < 1e-5);
        assert!((b.center() - Vec2::new(3.0, 4.0)).length() < 1e-5);
        assert!((b.width() - 10.0).abs() < 1e-4);
        assert!((b.height() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn negative_rotation() {
        let b = OrientedBox::from_matrix(&node_matrix(Vec2::ZERO, -0.5, Vec2::ONE));
        assert!((b.rotation() + 0.5).abs() < 1e-5);
    }

    #[test]
    fn union_ignores_empty() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(5.0, -1.0, 1.0, 1.0);
        assert_eq!(a.union(&Rect::default()), a);
        assert_eq!(a.union(&b), Rect::new(0.0, -1.0, 6.0, 3.0));
    }
}
