//! Node placement relative to the parent node.

use glam::{Mat4, Vec2};
use serde::{Deserialize, Serialize};
use strata_core::hash::hash_combine;
use strata_core::transform::{model_matrix, node_matrix};

/// Translation, scale, size and rotation of a node.
///
/// `size` only affects the node box (and the model transform); it is not
/// inherited by child nodes, while `scale` is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeTransform {
    #[serde(rename = "position")]
    pub translation: Vec2,
    pub scale: Vec2,
    pub size: Vec2,
    /// Rotation around the Z axis in radians.
    pub rotation: f32,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            translation: Vec2::ZERO,
            scale: Vec2::ONE,
            size: Vec2::ONE,
            rotation: 0.0,
        }
    }
}

impl NodeTransform {
    /// `T(translation) * R(rotation) * S(scale)`.
    #[inline]
    #[must_use]
    pub fn node_matrix(&self) -> Mat4 {
        node_matrix(self.translation, self.rotation, self.scale)
    }

    /// `T(-size/2) * S(size)`.
    #[inline]
    #[must_use]
    pub fn model_matrix(&self) -> Mat4 {
        model_matrix(self.size)
    }

    #[inline]
    pub fn translate(&mut self, delta: Vec2) {
        self.translation += delta;
    }

    #[inline]
    pub fn rotate(&mut self, radians: f32) {
        self.rotation += radians;
    }

    /// The node's local X axis expressed in the parent space.
    #[must_use]
    pub fn x_vector(&self) -> Vec2 {
        Vec2::from_angle(self.rotation)
    }

    /// The node's local Y axis expressed in the parent space.
    #[must_use]
    pub fn y_vector(&self) -> Vec2 {
        Vec2::from_angle(self.rotation).perp()
    }

    #[must_use]
    pub fn hash_value(&self, seed: u64) -> u64 {
        let mut hash = hash_combine(seed, &self.translation);
        hash = hash_combine(hash, &self.scale);
        hash = hash_combine(hash, &self.size);
        hash_combine(hash, &self.rotation)
    }
}
