//! Map node: placement of the node on a tile map for depth sorting.

use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use strata_core::hash::hash_combine;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapNodeClass {
    /// Point in normalized node box coordinates used for sorting against
    /// other map objects. Defaults to the bottom center.
    pub map_sort_point: Vec2,
    pub map_layer: i32,
}

impl Default for MapNodeClass {
    fn default() -> Self {
        Self {
            map_sort_point: Vec2::new(0.5, 1.0),
            map_layer: 0,
        }
    }
}

impl MapNodeClass {
    #[must_use]
    pub fn hash_value(&self) -> u64 {
        hash_combine(hash_combine(0, &self.map_sort_point), &self.map_layer)
    }
}

#[derive(Debug, Clone)]
pub struct MapNode {
    class: Arc<MapNodeClass>,
}

impl MapNode {
    #[must_use]
    pub fn new(class: Arc<MapNodeClass>) -> Self {
        Self { class }
    }

    #[must_use]
    pub fn class(&self) -> &MapNodeClass {
        &self.class
    }

    #[must_use]
    pub fn map_sort_point(&self) -> Vec2 {
        self.class.map_sort_point
    }

    #[must_use]
    pub fn map_layer(&self) -> i32 {
        self.class.map_layer
    }
}
