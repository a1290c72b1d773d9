//! Fixture: an extra collision shape attached to another node's rigid body.

use std::sync::Arc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strata_core::hash::hash_combine;

use super::rigid_body::CollisionShape;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FixtureFlags: u32 {
        const SENSOR = 1 << 0;
    }
}

impl Default for FixtureFlags {
    fn default() -> Self {
        Self::SENSOR
    }
}

/// Unset friction/density/restitution fall back to the owning body's values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureClass {
    /// Node class id of the node whose rigid body this fixture attaches to.
    #[serde(rename = "body")]
    pub rigid_body_node_id: String,
    pub shape: CollisionShape,
    #[serde(rename = "polygon")]
    pub polygon_shape_id: String,
    pub friction: Option<f32>,
    pub density: Option<f32>,
    pub restitution: Option<f32>,
    #[serde(with = "strata_core::flags::bits")]
    pub flags: FixtureFlags,
}

impl FixtureClass {
    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = 0;
        hash = hash_combine(hash, &self.rigid_body_node_id);
        hash = hash_combine(hash, &(self.shape as u32));
        hash = hash_combine(hash, &self.polygon_shape_id);
        hash = hash_combine(hash, &self.friction);
        hash = hash_combine(hash, &self.density);
        hash = hash_combine(hash, &self.restitution);
        hash_combine(hash, &self.flags.bits())
    }
}

#[derive(Debug, Clone)]
pub struct Fixture {
    class: Arc<FixtureClass>,
}

impl Fixture {
    #[must_use]
    pub fn new(class: Arc<FixtureClass>) -> Self {
        Self { class }
    }

    #[must_use]
    pub fn class(&self) -> &FixtureClass {
        &self.class
    }

    #[must_use]
    pub fn rigid_body_node_id(&self) -> &str {
        &self.class.rigid_body_node_id
    }

    #[must_use]
    pub fn is_sensor(&self) -> bool {
        self.class.flags.contains(FixtureFlags::SENSOR)
    }
}
