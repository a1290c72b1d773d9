//! Basic light attached to a node.

use std::f32::consts::FRAC_PI_6;
use std::sync::Arc;

use bitflags::bitflags;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use strata_core::Color4f;
use strata_core::hash::hash_combine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LightType {
    #[default]
    Ambient,
    Directional,
    Spot,
    Point,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LightFlags: u32 {
        const ENABLED = 1 << 0;
    }
}

impl Default for LightFlags {
    fn default() -> Self {
        Self::ENABLED
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicLightClass {
    #[serde(rename = "type")]
    pub light_type: LightType,
    pub direction: Vec3,
    pub translation: Vec3,
    pub ambient_color: Color4f,
    pub diffuse_color: Color4f,
    pub specular_color: Color4f,
    /// Radians.
    pub spot_half_angle: f32,
    pub constant_attenuation: f32,
    pub linear_attenuation: f32,
    pub quadratic_attenuation: f32,
    pub layer: i32,
    #[serde(with = "strata_core::flags::bits")]
    pub flags: LightFlags,
}

impl Default for BasicLightClass {
    fn default() -> Self {
        Self {
            light_type: LightType::Ambient,
            direction: Vec3::X,
            translation: Vec3::ZERO,
            ambient_color: Color4f::WHITE,
            diffuse_color: Color4f::WHITE,
            specular_color: Color4f::WHITE,
            spot_half_angle: FRAC_PI_6,
            constant_attenuation: 1.0,
            linear_attenuation: 0.0,
            quadratic_attenuation: 0.0,
            layer: 0,
            flags: LightFlags::default(),
        }
    }
}

impl BasicLightClass {
    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = hash_combine(0, &(self.light_type as u32));
        hash = hash_combine(hash, &self.direction);
        hash = hash_combine(hash, &self.translation);
        hash = hash_combine(hash, &self.ambient_color);
        hash = hash_combine(hash, &self.diffuse_color);
        hash = hash_combine(hash, &self.specular_color);
        hash = hash_combine(hash, &self.spot_half_angle);
        hash = hash_combine(hash, &self.constant_attenuation);
        hash = hash_combine(hash, &self.linear_attenuation);
        hash = hash_combine(hash, &self.quadratic_attenuation);
        hash = hash_combine(hash, &self.layer);
        hash_combine(hash, &self.flags.bits())
    }
}

/// Light instance. Every property starts from the class value and can be
/// changed at runtime (animators, scripts).
#[derive(Debug, Clone)]
pub struct BasicLight {
    class: Arc<BasicLightClass>,
    pub direction: Vec3,
    pub translation: Vec3,
    pub ambient_color: Color4f,
    pub diffuse_color: Color4f,
    pub specular_color: Color4f,
    pub spot_half_angle: f32,
    pub constant_attenuation: f32,
    pub linear_attenuation: f32,
    pub quadratic_attenuation: f32,
    flags: LightFlags,
}

impl BasicLight {
    #[must_use]
    pub fn new(class: Arc<BasicLightClass>) -> Self {
        Self {
            direction: class.direction,
            translation: class.translation,
            ambient_color: class.ambient_color,
            diffuse_color: class.diffuse_color,
            specular_color: class.specular_color,
            spot_half_angle: class.spot_half_angle,
            constant_attenuation: class.constant_attenuation,
            linear_attenuation: class.linear_attenuation,
            quadratic_attenuation: class.quadratic_attenuation,
            flags: class.flags,
            class,
        }
    }

    #[must_use]
    pub fn class(&self) -> &BasicLightClass {
        &self.class
    }

    #[must_use]
    pub fn light_type(&self) -> LightType {
        self.class.light_type
    }

    #[must_use]
    pub fn layer(&self) -> i32 {
        self.class.layer
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.flags.contains(LightFlags::ENABLED)
    }

    pub fn enable(&mut self, on: bool) {
        self.flags.set(LightFlags::ENABLED, on);
    }

    #[must_use]
    pub fn test_flag(&self, flag: LightFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: LightFlags, on: bool) {
        self.flags.set(flag, on);
    }
}
