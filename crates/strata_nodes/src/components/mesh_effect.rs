//! Mesh effect: a procedural effect applied to the node's mesh, such as
//! breaking it into shards that fly apart.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strata_core::hash::hash_combine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MeshEffectType {
    #[default]
    ShardedMeshExplosion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshEffectClass {
    #[serde(rename = "type")]
    pub effect_type: MeshEffectType,
    /// Number of subdivisions used to cut the mesh into shards.
    pub shard_count: u32,
    pub linear_speed: f32,
    pub linear_acceleration: f32,
    pub rotation_speed: f32,
}

impl Default for MeshEffectClass {
    fn default() -> Self {
        Self {
            effect_type: MeshEffectType::ShardedMeshExplosion,
            shard_count: 1,
            linear_speed: 1.0,
            linear_acceleration: 0.0,
            rotation_speed: 0.0,
        }
    }
}

impl MeshEffectClass {
    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = hash_combine(0, &(self.effect_type as u32));
        hash = hash_combine(hash, &self.shard_count);
        hash = hash_combine(hash, &self.linear_speed);
        hash = hash_combine(hash, &self.linear_acceleration);
        hash_combine(hash, &self.rotation_speed)
    }
}

#[derive(Debug, Clone)]
pub struct MeshEffect {
    class: Arc<MeshEffectClass>,
}

impl MeshEffect {
    #[must_use]
    pub fn new(class: Arc<MeshEffectClass>) -> Self {
        Self { class }
    }

    #[must_use]
    pub fn class(&self) -> &MeshEffectClass {
        &self.class
    }

    #[must_use]
    pub fn effect_type(&self) -> MeshEffectType {
        self.class.effect_type
    }
}
