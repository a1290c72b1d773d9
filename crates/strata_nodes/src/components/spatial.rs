//! Spatial index entry: registers the node box with the scene's spatial
//! index so overlap queries can find it.

use std::sync::Arc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strata_core::hash::hash_combine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpatialShape {
    #[default]
    Aabb,
    Circle,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SpatialFlags: u32 {
        const ENABLED        = 1 << 0;
        const REPORT_OVERLAP = 1 << 1;
    }
}

impl Default for SpatialFlags {
    fn default() -> Self {
        Self::ENABLED | Self::REPORT_OVERLAP
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialNodeClass {
    pub shape: SpatialShape,
    #[serde(with = "strata_core::flags::bits")]
    pub flags: SpatialFlags,
}

impl SpatialNodeClass {
    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let hash = hash_combine(0, &(self.shape as u32));
        hash_combine(hash, &self.flags.bits())
    }
}

#[derive(Debug, Clone)]
pub struct SpatialNode {
    class: Arc<SpatialNodeClass>,
    flags: SpatialFlags,
}

impl SpatialNode {
    #[must_use]
    pub fn new(class: Arc<SpatialNodeClass>) -> Self {
        Self {
            flags: class.flags,
            class,
        }
    }

    #[must_use]
    pub fn class(&self) -> &SpatialNodeClass {
        &self.class
    }

    #[must_use]
    pub fn shape(&self) -> SpatialShape {
        self.class.shape
    }

    #[must_use]
    pub fn test_flag(&self, flag: SpatialFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: SpatialFlags, on: bool) {
        self.flags.set(flag, on);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.test_flag(SpatialFlags::ENABLED)
    }

    pub fn enable(&mut self, on: bool) {
        self.set_flag(SpatialFlags::ENABLED, on);
    }
}
