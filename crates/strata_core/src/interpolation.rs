//! Interpolation curves.
//!
//! An [`Interpolation`] remaps normalized time `t` before a linear mix of the
//! start and end values, so `interpolate(y0, y1, 0.0, m) == y0` and
//! `interpolate(y0, y1, 1.0, m) == y1` for every method. The easing curves
//! follow <https://easings.net/>.

use std::f32::consts::PI;

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::color::Color4f;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Interpolation {
    /// Jump to the end value as soon as `t > 0`.
    StepStart,
    /// Jump to the end value at `t >= 0.5`.
    Step,
    /// Jump to the end value at `t >= 1`.
    StepEnd,
    #[default]
    Linear,
    Cosine,
    SmoothStep,
    Acceleration,
    Deceleration,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    EaseInQuadratic,
    EaseOutQuadratic,
    EaseInOutQuadratic,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInBack,
    EaseOutBack,
    EaseInOutBack,
    EaseInElastic,
    EaseOutElastic,
    EaseInOutElastic,
    EaseInBounce,
    EaseOutBounce,
    EaseInOutBounce,
}

impl Interpolation {
    pub const ALL: [Interpolation; 26] = [
        Self::StepStart,
        Self::Step,
        Self::StepEnd,
        Self::Linear,
        Self::Cosine,
        Self::SmoothStep,
        Self::Acceleration,
        Self::Deceleration,
        Self::EaseInSine,
        Self::EaseOutSine,
        Self::EaseInOutSine,
        Self::EaseInQuadratic,
        Self::EaseOutQuadratic,
        Self::EaseInOutQuadratic,
        Self::EaseInCubic,
        Self::EaseOutCubic,
        Self::EaseInOutCubic,
        Self::EaseInBack,
        Self::EaseOutBack,
        Self::EaseInOutBack,
        Self::EaseInElastic,
        Self::EaseOutElastic,
        Self::EaseInOutElastic,
        Self::EaseInBounce,
        Self::EaseOutBounce,
        Self::EaseInOutBounce,
    ];

    /// True for the discrete methods that never produce in-between values.
    #[inline]
    #[must_use]
    pub fn is_step(self) -> bool {
        matches!(self, Self::StepStart | Self::Step | Self::StepEnd)
    }

    /// Remap normalized time through the curve.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Self::StepStart => {
                if t > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Step => {
                if t < 0.5 {
                    0.0
                } else {
                    1.0
                }
            }
            Self::StepEnd => {
                if t >= 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Linear => t.clamp(0.0, 1.0),
            Self::Cosine => -(PI * t).cos() * 0.5 + 0.5,
            Self::SmoothStep => 3.0 * t * t - 2.0 * t * t * t,
            Self::Acceleration | Self::EaseInQuadratic => t * t,
            Self::Deceleration | Self::EaseOutQuadratic => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            Self::EaseOutSine => (t * PI / 2.0).sin(),
            Self::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Self::EaseInOutQuadratic => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::EaseInCubic => t * t * t,
            Self::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::EaseInBack => easing::in_back(t),
            Self::EaseOutBack => easing::out_back(t),
            Self::EaseInOutBack => easing::in_out_back(t),
            Self::EaseInElastic => easing::in_elastic(t),
            Self::EaseOutElastic => easing::out_elastic(t),
            Self::EaseInOutElastic => easing::in_out_elastic(t),
            Self::EaseInBounce => 1.0 - easing::out_bounce(1.0 - t),
            Self::EaseOutBounce => easing::out_bounce(t),
            Self::EaseInOutBounce => {
                if t < 0.5 {
                    (1.0 - easing::out_bounce(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + easing::out_bounce(2.0 * t - 1.0)) / 2.0
                }
            }
        }
    }
}

mod easing {
    use std::f32::consts::PI;

    const C1: f32 = 1.701_58;
    const C2: f32 = C1 * 1.525;
    const C3: f32 = C1 + 1.0;

    pub(super) fn in_back(t: f32) -> f32 {
        C3 * t * t * t - C1 * t * t
    }

    pub(super) fn out_back(t: f32) -> f32 {
        1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2)
    }

    pub(super) fn in_out_back(t: f32) -> f32 {
        if t < 0.5 {
            ((2.0 * t).powi(2) * ((C2 + 1.0) * 2.0 * t - C2)) / 2.0
        } else {
            ((2.0 * t - 2.0).powi(2) * ((C2 + 1.0) * (t * 2.0 - 2.0) + C2) + 2.0) / 2.0
        }
    }

    pub(super) fn in_elastic(t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 || t == 1.0 {
            return t;
        }
        let c4 = (2.0 * PI) / 3.0;
        -(2.0f32).powf(10.0 * t - 10.0) * ((t * 10.0 - 10.75) * c4).sin()
    }

    pub(super) fn out_elastic(t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 || t == 1.0 {
            return t;
        }
        let c4 = (2.0 * PI) / 3.0;
        (2.0f32).powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
    }

    pub(super) fn in_out_elastic(t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 || t == 1.0 {
            return t;
        }
        let c5 = (2.0 * PI) / 4.5;
        if t < 0.5 {
            -((2.0f32).powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * c5).sin()) / 2.0
        } else {
            ((2.0f32).powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * c5).sin()) / 2.0 + 1.0
        }
    }

    pub(super) fn out_bounce(t: f32) -> f32 {
        const N1: f32 = 7.5625;
        const D1: f32 = 2.75;
        if t < 1.0 / D1 {
            N1 * t * t
        } else if t < 2.0 / D1 {
            let x = t - 1.5 / D1;
            N1 * x * x + 0.75
        } else if t < 2.5 / D1 {
            let x = t - 2.25 / D1;
            N1 * x * x + 0.9375
        } else {
            let x = t - 2.625 / D1;
            N1 * x * x + 0.984_375
        }
    }
}

/// Values that can be linearly mixed.
pub trait Interpolatable: Copy + Sized {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self;
}

impl Interpolatable for f32 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start + (end - start) * t
    }
}

impl Interpolatable for i32 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        (start as f32 + (end - start) as f32 * t).round() as i32
    }
}

impl Interpolatable for Vec2 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }
}

impl Interpolatable for Vec4 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }
}

/// Colors are mixed in linear space and re-encoded to sRGB.
impl Interpolatable for Color4f {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start
            .srgb_decode()
            .lerp(end.srgb_decode(), t)
            .srgb_encode()
    }
}

/// Mix `start` and `end` at normalized time `t` remapped through `method`.
#[inline]
#[must_use]
pub fn interpolate<T: Interpolatable>(start: T, end: T, t: f32, method: Interpolation) -> T {
    T::interpolate_linear(start, end, method.apply(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_curve_hits_both_endpoints() {
        for method in Interpolation::ALL {
            let start = method.apply(0.0);
            let end = method.apply(1.0);
            assert!(start.abs() < 1e-4, "{method:?} at 0 = {start}");
            assert!((end - 1.0).abs() < 1e-4, "{method:?} at 1 = {end}");
        }
    }

    #[test]
    fn step_methods() {
        assert_eq!(Interpolation::StepStart.apply(0.01), 1.0);
        assert_eq!(Interpolation::Step.apply(0.49), 0.0);
        assert_eq!(Interpolation::Step.apply(0.5), 1.0);
        assert_eq!(Interpolation::StepEnd.apply(0.99), 0.0);
    }

    #[test]
    fn linear_mix_and_clamp() {
        assert_eq!(interpolate(0.0f32, 10.0, 0.5, Interpolation::Linear), 5.0);
        assert_eq!(interpolate(0.0f32, 10.0, 1.5, Interpolation::Linear), 10.0);
        let v = interpolate(Vec2::ZERO, Vec2::new(2.0, 4.0), 0.25, Interpolation::Linear);
        assert_eq!(v, Vec2::new(0.5, 1.0));
    }

    #[test]
    fn smooth_curves() {
        assert!((Interpolation::Cosine.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((Interpolation::SmoothStep.apply(0.5) - 0.5).abs() < 1e-6);
        assert_eq!(Interpolation::Acceleration.apply(0.5), 0.25);
        assert_eq!(Interpolation::Deceleration.apply(0.5), 0.75);
    }

    #[test]
    fn color_endpoints_are_exact() {
        let a = Color4f::rgb(0.1, 0.2, 0.3);
        let b = Color4f::rgb(0.9, 0.8, 0.7);
        assert!(interpolate(a, b, 0.0, Interpolation::Linear).approx_eq(&a, 1e-5));
        assert!(interpolate(a, b, 1.0, Interpolation::Linear).approx_eq(&b, 1e-5));
    }
}
