//! Spline mover: moves the node along a path through control points.
//!
//! The path is sampled into an arc length table when the instance is
//! created, so speed and acceleration are expressed in distance units per
//! second regardless of how unevenly the control points are spaced.

use std::sync::Arc;

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use strata_core::hash::hash_combine;

use crate::transform::NodeTransform;

const SAMPLES_PER_SEGMENT: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PathCurveType {
    Linear,
    #[default]
    CatmullRom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PathCoordinateSpace {
    /// Path points are positions in the parent space.
    #[default]
    Absolute,
    /// Path points are offsets along the node's own axes.
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RotationMode {
    /// Rotate the node to follow the path tangent.
    #[default]
    ApplySplineRotation,
    IgnoreSplineRotation,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SplineMoverFlags: u32 {
        const ENABLED = 1 << 0;
    }
}

impl Default for SplineMoverFlags {
    fn default() -> Self {
        Self::ENABLED
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SplineMoverClass {
    pub points: Vec<Vec2>,
    pub curve_type: PathCurveType,
    pub coordinate_space: PathCoordinateSpace,
    pub rotation_mode: RotationMode,
    pub speed: f32,
    pub acceleration: f32,
    #[serde(with = "strata_core::flags::bits")]
    pub flags: SplineMoverFlags,
}

impl SplineMoverClass {
    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = 0;
        for point in &self.points {
            hash = hash_combine(hash, point);
        }
        hash = hash_combine(hash, &(self.curve_type as u32));
        hash = hash_combine(hash, &(self.coordinate_space as u32));
        hash = hash_combine(hash, &(self.rotation_mode as u32));
        hash = hash_combine(hash, &self.speed);
        hash = hash_combine(hash, &self.acceleration);
        hash_combine(hash, &self.flags.bits())
    }
}

fn catmull_rom(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

/// Arc length parameterized polyline approximation of the path.
#[derive(Debug, Clone)]
struct SplinePath {
    // (distance from the start, position)
    samples: Vec<(f32, Vec2)>,
}

impl SplinePath {
    fn new(points: &[Vec2], curve: PathCurveType) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let mut positions = Vec::new();
        match curve {
            PathCurveType::Linear => positions.extend_from_slice(points),
            PathCurveType::CatmullRom => {
                let last = points.len() - 1;
                for i in 0..last {
                    let p0 = points[i.saturating_sub(1)];
                    let p1 = points[i];
                    let p2 = points[i + 1];
                    let p3 = points[(i + 2).min(last)];
                    for s in 0..SAMPLES_PER_SEGMENT {
                        let t = s as f32 / SAMPLES_PER_SEGMENT as f32;
                        positions.push(catmull_rom(p0, p1, p2, p3, t));
                    }
                }
                positions.push(points[last]);
            }
        }
        let mut samples = Vec::with_capacity(positions.len());
        let mut distance = 0.0;
        let mut prev = positions[0];
        for p in positions {
            distance += (p - prev).length();
            samples.push((distance, p));
            prev = p;
        }
        Some(Self { samples })
    }

    fn length(&self) -> f32 {
        self.samples.last().map_or(0.0, |s| s.0)
    }

    /// Position and direction of travel at `distance` along the path.
    fn evaluate(&self, distance: f32) -> (Vec2, Vec2) {
        let index = self
            .samples
            .partition_point(|s| s.0 < distance)
            .clamp(1, self.samples.len() - 1);
        let (d0, p0) = self.samples[index - 1];
        let (d1, p1) = self.samples[index];
        let span = d1 - d0;
        let t = if span > 0.0 { (distance - d0) / span } else { 0.0 };
        (p0.lerp(p1, t.clamp(0.0, 1.0)), p1 - p0)
    }
}

#[derive(Debug, Clone)]
pub struct SplineMover {
    class: Arc<SplineMoverClass>,
    path: Option<SplinePath>,
    flags: SplineMoverFlags,
    speed: f32,
    acceleration: f32,
    displacement: f32,
    prev_position: Vec2,
    complete: bool,
}

impl SplineMover {
    #[must_use]
    pub fn new(class: Arc<SplineMoverClass>) -> Self {
        let path = SplinePath::new(&class.points, class.curve_type);
        let prev_position = class.points.first().copied().unwrap_or(Vec2::ZERO);
        Self {
            path,
            flags: class.flags,
            speed: class.speed,
            acceleration: class.acceleration,
            displacement: 0.0,
            prev_position,
            complete: false,
            class,
        }
    }

    #[must_use]
    pub fn class(&self) -> &SplineMoverClass {
        &self.class
    }

    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }
    #[must_use]
    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }
    pub fn set_acceleration(&mut self, acceleration: f32) {
        self.acceleration = acceleration;
    }

    /// Distance travelled along the path.
    #[must_use]
    pub fn displacement(&self) -> f32 {
        self.displacement
    }

    #[must_use]
    pub fn path_length(&self) -> f32 {
        self.path.as_ref().map_or(0.0, SplinePath::length)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.flags.contains(SplineMoverFlags::ENABLED)
    }

    pub fn enable(&mut self, on: bool) {
        self.flags.set(SplineMoverFlags::ENABLED, on);
    }

    /// Advance along the path and move `transform`.
    pub fn transform_node(&mut self, dt: f32, transform: &mut NodeTransform) {
        if !self.is_enabled() || self.complete {
            return;
        }
        let Some(path) = &self.path else { return };

        let length = path.length();
        self.speed += self.acceleration * dt;
        self.displacement = (self.displacement + self.speed * dt).clamp(0.0, length);

        let (position, direction) = path.evaluate(self.displacement);
        match self.class.coordinate_space {
            PathCoordinateSpace::Absolute => transform.translation = position,
            PathCoordinateSpace::Relative => {
                let delta = position - self.prev_position;
                let x = transform.x_vector();
                let y = transform.y_vector();
                transform.translate(delta.x * x + delta.y * y);
                self.prev_position = position;
            }
        }
        if self.class.rotation_mode == RotationMode::ApplySplineRotation
            && direction.length_squared() > 0.0
        {
            transform.rotation = direction.y.atan2(direction.x);
        }
        if self.displacement >= length {
            self.complete = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_path_absolute() {
        let class = SplineMoverClass {
            points: vec![Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)],
            curve_type: PathCurveType::Linear,
            speed: 5.0,
            ..Default::default()
        };
        let mut mover = SplineMover::new(Arc::new(class));
        assert!((mover.path_length() - 20.0).abs() < 1e-4);

        let mut transform = NodeTransform::default();
        mover.transform_node(1.0, &mut transform);
        assert!((transform.translation - Vec2::new(5.0, 0.0)).length() < 1e-4);
        mover.transform_node(2.0, &mut transform);
        assert!((transform.translation - Vec2::new(10.0, 5.0)).length() < 1e-4);
        assert!((transform.rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
        mover.transform_node(10.0, &mut transform);
        assert!(mover.is_complete());
        assert!((transform.translation - Vec2::new(10.0, 10.0)).length() < 1e-4);
    }

    #[test]
    fn catmull_rom_passes_through_points() {
        let points = [Vec2::ZERO, Vec2::new(5.0, 5.0), Vec2::new(10.0, 0.0)];
        let path = SplinePath::new(&points, PathCurveType::CatmullRom).unwrap();
        let (end, _) = path.evaluate(path.length());
        assert!((end - points[2]).length() < 1e-4);
        assert!(path.samples.iter().any(|s| (s.1 - points[1]).length() < 1e-4));
    }
}
