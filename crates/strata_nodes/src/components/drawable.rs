//! Drawable item: a node's visual, a drawable shape combined with a material.

use std::collections::BTreeMap;
use std::sync::Arc;

use bitflags::bitflags;
use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use strata_core::Color4f;
use strata_core::hash::{StableHash, Xxh3, hash_combine};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DrawableFlags: u32 {
        /// Whether the item is currently visible.
        const VISIBLE_IN_GAME   = 1 << 0;
        const UPDATE_MATERIAL   = 1 << 1;
        const UPDATE_DRAWABLE   = 1 << 2;
        /// Restart drawables that have finished, e.g. particle engines.
        const RESTART_DRAWABLE  = 1 << 3;
        /// Mirror about the vertical axis.
        const FLIP_HORIZONTALLY = 1 << 4;
        /// Mirror about the horizontal axis.
        const FLIP_VERTICALLY   = 1 << 5;
        const DOUBLE_SIDED      = 1 << 6;
        const DEPTH_TEST        = 1 << 7;
        /// Contribute to the bloom post-processing pass.
        const PP_ENABLE_BLOOM   = 1 << 8;
    }
}

impl Default for DrawableFlags {
    fn default() -> Self {
        Self::VISIBLE_IN_GAME
            | Self::UPDATE_MATERIAL
            | Self::UPDATE_DRAWABLE
            | Self::RESTART_DRAWABLE
            | Self::PP_ENABLE_BLOOM
    }
}

/// A named material parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaterialParam {
    Float(f32),
    Int(i32),
    String(String),
    Color(Color4f),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl MaterialParam {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Int(_) => "int",
            Self::String(_) => "string",
            Self::Color(_) => "color",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
        }
    }

    /// True when both values hold the same variant.
    #[must_use]
    pub fn same_type(&self, other: &MaterialParam) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl StableHash for MaterialParam {
    fn stable_hash(&self, state: &mut Xxh3) {
        match self {
            Self::Float(v) => {
                0u8.stable_hash(state);
                v.stable_hash(state);
            }
            Self::Int(v) => {
                1u8.stable_hash(state);
                v.stable_hash(state);
            }
            Self::String(v) => {
                2u8.stable_hash(state);
                v.stable_hash(state);
            }
            Self::Color(v) => {
                3u8.stable_hash(state);
                v.stable_hash(state);
            }
            Self::Vec2(v) => {
                4u8.stable_hash(state);
                v.stable_hash(state);
            }
            Self::Vec3(v) => {
                5u8.stable_hash(state);
                v.stable_hash(state);
            }
            Self::Vec4(v) => {
                6u8.stable_hash(state);
                v.stable_hash(state);
            }
        }
    }
}

pub type MaterialParamMap = BTreeMap<String, MaterialParam>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawableClass {
    #[serde(rename = "material")]
    pub material_id: String,
    #[serde(rename = "drawable")]
    pub drawable_id: String,
    pub layer: i32,
    pub line_width: f32,
    pub time_scale: f32,
    #[serde(with = "strata_core::flags::bits")]
    pub flags: DrawableFlags,
    /// Euler rotation (radians) applied to 3D drawables.
    pub rotator: Vec3,
    /// Offset applied to 3D drawables.
    pub offset: Vec3,
    pub depth: f32,
    #[serde(rename = "material_params")]
    pub material_params: MaterialParamMap,
}

impl Default for DrawableClass {
    fn default() -> Self {
        Self {
            material_id: String::new(),
            drawable_id: String::new(),
            layer: 0,
            line_width: 1.0,
            time_scale: 1.0,
            flags: DrawableFlags::default(),
            rotator: Vec3::ZERO,
            offset: Vec3::ZERO,
            depth: 1.0,
            material_params: MaterialParamMap::new(),
        }
    }
}

impl DrawableClass {
    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = 0;
        hash = hash_combine(hash, &self.material_id);
        hash = hash_combine(hash, &self.drawable_id);
        hash = hash_combine(hash, &self.layer);
        hash = hash_combine(hash, &self.line_width);
        hash = hash_combine(hash, &self.time_scale);
        hash = hash_combine(hash, &self.flags.bits());
        hash = hash_combine(hash, &self.rotator);
        hash = hash_combine(hash, &self.offset);
        hash = hash_combine(hash, &self.depth);
        for (name, value) in &self.material_params {
            hash = hash_combine(hash, name);
            hash = hash_combine(hash, value);
        }
        hash
    }

    #[inline]
    #[must_use]
    pub fn test_flag(&self, flag: DrawableFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: DrawableFlags, on: bool) {
        self.flags.set(flag, on);
    }

    pub fn set_material_param(&mut self, name: impl Into<String>, value: MaterialParam) {
        self.material_params.insert(name.into(), value);
    }
}

/// Per instance drawable state.
#[derive(Debug, Clone)]
pub struct Drawable {
    class: Arc<DrawableClass>,
    material_id: String,
    flags: DrawableFlags,
    time_scale: f32,
    depth: f32,
    rotator: Vec3,
    offset: Vec3,
    material_params: MaterialParamMap,
    play_time: f64,
}

impl Drawable {
    #[must_use]
    pub fn new(class: Arc<DrawableClass>) -> Self {
        Self {
            material_id: class.material_id.clone(),
            flags: class.flags,
            time_scale: class.time_scale,
            depth: class.depth,
            rotator: class.rotator,
            offset: class.offset,
            material_params: class.material_params.clone(),
            play_time: 0.0,
            class,
        }
    }

    #[must_use]
    pub fn class(&self) -> &DrawableClass {
        &self.class
    }

    /// Advance the material/drawable clock.
    pub fn update(&mut self, dt: f32) {
        self.play_time += f64::from(dt * self.time_scale);
    }

    #[must_use]
    pub fn play_time(&self) -> f64 {
        self.play_time
    }

    pub fn restart(&mut self) {
        self.play_time = 0.0;
    }

    #[must_use]
    pub fn material_id(&self) -> &str {
        &self.material_id
    }

    /// Switching the material does not clear the material params.
    pub fn set_material_id(&mut self, id: impl Into<String>) {
        self.material_id = id.into();
    }

    #[must_use]
    pub fn drawable_id(&self) -> &str {
        &self.class.drawable_id
    }

    #[must_use]
    pub fn layer(&self) -> i32 {
        self.class.layer
    }

    #[must_use]
    pub fn line_width(&self) -> f32 {
        self.class.line_width
    }

    #[must_use]
    pub fn flags(&self) -> DrawableFlags {
        self.flags
    }

    #[must_use]
    pub fn test_flag(&self, flag: DrawableFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: DrawableFlags, on: bool) {
        self.flags.set(flag, on);
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.test_flag(DrawableFlags::VISIBLE_IN_GAME)
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.set_flag(DrawableFlags::VISIBLE_IN_GAME, visible);
    }

    #[must_use]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale;
    }

    #[must_use]
    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth;
    }

    #[must_use]
    pub fn rotator(&self) -> Vec3 {
        self.rotator
    }

    pub fn set_rotator(&mut self, rotator: Vec3) {
        self.rotator = rotator;
    }

    #[must_use]
    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Vec3) {
        self.offset = offset;
    }

    #[must_use]
    pub fn material_params(&self) -> &MaterialParamMap {
        &self.material_params
    }

    #[must_use]
    pub fn material_param(&self, name: &str) -> Option<&MaterialParam> {
        self.material_params.get(name)
    }

    #[must_use]
    pub fn has_material_param(&self, name: &str) -> bool {
        self.material_params.contains_key(name)
    }

    pub fn set_material_param(&mut self, name: impl Into<String>, value: MaterialParam) {
        self.material_params.insert(name.into(), value);
    }

    pub fn clear_material_params(&mut self) {
        self.material_params.clear();
    }
}
