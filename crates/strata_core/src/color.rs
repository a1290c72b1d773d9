//! Floating point RGBA color.
//!
//! Colors are stored sRGB encoded, the way they are authored. Blending
//! between two colors must happen in linear space, see
//! [`Color4f::srgb_decode`] and [`Color4f::srgb_encode`].

use glam::Vec4;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color4f {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color4f {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color4f {
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    pub const RED: Self = Self::rgba(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Self = Self::rgba(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Self = Self::rgba(0.0, 0.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// Build from 8 bit channel values.
    #[must_use]
    pub fn from_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        )
    }

    #[must_use]
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }

    #[must_use]
    pub fn from_vec4(v: Vec4) -> Self {
        Self::rgba(v.x, v.y, v.z, v.w)
    }

    /// Convert sRGB encoded color channels to linear. Alpha is unchanged.
    #[must_use]
    pub fn srgb_decode(self) -> Self {
        Self::rgba(
            srgb_decode(self.r),
            srgb_decode(self.g),
            srgb_decode(self.b),
            self.a,
        )
    }

    /// Convert linear color channels to sRGB. Alpha is unchanged.
    #[must_use]
    pub fn srgb_encode(self) -> Self {
        Self::rgba(
            srgb_encode(self.r),
            srgb_encode(self.g),
            srgb_encode(self.b),
            self.a,
        )
    }

    /// Per channel linear mix, no color space conversion.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::from_vec4(self.to_vec4().lerp(other.to_vec4(), t))
    }

    #[must_use]
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.to_vec4().abs_diff_eq(other.to_vec4(), epsilon)
    }
}

impl From<[f32; 4]> for Color4f {
    fn from(v: [f32; 4]) -> Self {
        Self::rgba(v[0], v[1], v[2], v[3])
    }
}

impl From<Color4f> for [f32; 4] {
    fn from(c: Color4f) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

#[must_use]
pub fn srgb_decode(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

#[must_use]
pub fn srgb_encode(value: f32) -> f32 {
    if value <= 0.003_130_8 {
        value * 12.92
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_roundtrip_is_stable() {
        let c = Color4f::rgba(0.2, 0.5, 0.9, 0.3);
        assert!(c.srgb_decode().srgb_encode().approx_eq(&c, 1e-5));
    }

    #[test]
    fn decode_darkens_midtones() {
        let mid = Color4f::rgb(0.5, 0.5, 0.5).srgb_decode();
        assert!(mid.r < 0.25 && mid.r > 0.2);
        assert_eq!(mid.a, 1.0);
    }
}
