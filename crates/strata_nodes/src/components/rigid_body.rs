//! Rigid body: the node's presence in the physics simulation.
//!
//! The physics backend is an external collaborator. It reads the class
//! parameters to build its bodies, writes the simulated velocities back with
//! [`RigidBody::set_linear_velocity`]/[`RigidBody::set_angular_velocity`] and
//! consumes pending adjustments made by the game side with the `take_*`
//! methods. Each pending slot has a single writer (game) and a single reader
//! (backend).

use std::sync::Arc;

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use strata_core::hash::hash_combine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Simulation {
    /// Exists in the physics world but no forces are applied to it.
    Static,
    /// Driven by its velocity only.
    Kinematic,
    /// Driven by the physical forces applied to it.
    #[default]
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CollisionShape {
    #[default]
    Box,
    Circle,
    RightTriangle,
    IsoscelesTriangle,
    Trapezoid,
    Parallelogram,
    SemiCircle,
    /// Arbitrary polygon referenced by `polygon_shape_id`.
    Polygon,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RigidBodyFlags: u32 {
        /// Fast moving object; the backend uses continuous collision detection.
        const BULLET           = 1 << 0;
        /// Only report collisions, don't respond to them.
        const SENSOR           = 1 << 1;
        const ENABLED          = 1 << 2;
        /// Allow the simulation to put the body to sleep when it comes to a halt.
        const CAN_SLEEP        = 1 << 3;
        /// Keep the body upright by ignoring simulated rotation.
        const DISCARD_ROTATION = 1 << 4;
    }
}

impl Default for RigidBodyFlags {
    fn default() -> Self {
        Self::ENABLED | Self::CAN_SLEEP
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidBodyClass {
    pub simulation: Simulation,
    pub shape: CollisionShape,
    #[serde(rename = "polygon")]
    pub polygon_shape_id: String,
    pub friction: f32,
    pub restitution: f32,
    pub angular_damping: f32,
    pub linear_damping: f32,
    pub density: f32,
    #[serde(with = "strata_core::flags::bits")]
    pub flags: RigidBodyFlags,
}

impl Default for RigidBodyClass {
    fn default() -> Self {
        Self {
            simulation: Simulation::Dynamic,
            shape: CollisionShape::Box,
            polygon_shape_id: String::new(),
            friction: 0.3,
            restitution: 0.5,
            angular_damping: 0.5,
            linear_damping: 0.5,
            density: 1.0,
            flags: RigidBodyFlags::default(),
        }
    }
}

impl RigidBodyClass {
    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = 0;
        hash = hash_combine(hash, &(self.simulation as u32));
        hash = hash_combine(hash, &(self.shape as u32));
        hash = hash_combine(hash, &self.polygon_shape_id);
        hash = hash_combine(hash, &self.friction);
        hash = hash_combine(hash, &self.restitution);
        hash = hash_combine(hash, &self.angular_damping);
        hash = hash_combine(hash, &self.linear_damping);
        hash = hash_combine(hash, &self.density);
        hash_combine(hash, &self.flags.bits())
    }

    pub fn set_flag(&mut self, flag: RigidBodyFlags, on: bool) {
        self.flags.set(flag, on);
    }
}

#[derive(Debug, Clone)]
pub struct RigidBody {
    class: Arc<RigidBodyClass>,
    flags: RigidBodyFlags,
    // written by the physics backend
    linear_velocity: Vec2,
    angular_velocity: f32,
    // written by the game, consumed by the physics backend
    linear_velocity_adjustment: Option<Vec2>,
    angular_velocity_adjustment: Option<f32>,
    center_impulse: Option<Vec2>,
    center_force: Option<Vec2>,
}

impl RigidBody {
    #[must_use]
    pub fn new(class: Arc<RigidBodyClass>) -> Self {
        Self {
            flags: class.flags,
            class,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            linear_velocity_adjustment: None,
            angular_velocity_adjustment: None,
            center_impulse: None,
            center_force: None,
        }
    }

    #[must_use]
    pub fn class(&self) -> &RigidBodyClass {
        &self.class
    }

    #[must_use]
    pub fn simulation(&self) -> Simulation {
        self.class.simulation
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.class.simulation == Simulation::Static
    }

    #[must_use]
    pub fn flags(&self) -> RigidBodyFlags {
        self.flags
    }

    #[must_use]
    pub fn test_flag(&self, flag: RigidBodyFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: RigidBodyFlags, on: bool) {
        self.flags.set(flag, on);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.test_flag(RigidBodyFlags::ENABLED)
    }

    pub fn enable(&mut self, on: bool) {
        self.set_flag(RigidBodyFlags::ENABLED, on);
    }

    /// Current linear velocity in m/s as last reported by the backend.
    #[must_use]
    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    /// Current angular velocity in rad/s as last reported by the backend.
    #[must_use]
    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec2) {
        self.linear_velocity = velocity;
    }

    pub fn set_angular_velocity(&mut self, velocity: f32) {
        self.angular_velocity = velocity;
    }

    // ========================================================================
    // Pending adjustments
    // ========================================================================

    /// Request a new linear velocity on the next physics step.
    pub fn adjust_linear_velocity(&mut self, velocity: Vec2) {
        self.linear_velocity_adjustment = Some(velocity);
    }

    /// Request a new angular velocity on the next physics step.
    pub fn adjust_angular_velocity(&mut self, radians: f32) {
        self.angular_velocity_adjustment = Some(radians);
    }

    /// Set the impulse applied to the body center on the next step,
    /// replacing any previous one.
    pub fn apply_linear_impulse_to_center(&mut self, impulse: Vec2) {
        self.center_impulse = Some(impulse);
    }

    /// Accumulate onto the pending center impulse.
    pub fn add_linear_impulse_to_center(&mut self, impulse: Vec2) {
        self.center_impulse = Some(self.center_impulse.unwrap_or(Vec2::ZERO) + impulse);
    }

    pub fn apply_force_to_center(&mut self, force: Vec2) {
        self.center_force = Some(force);
    }

    #[must_use]
    pub fn has_linear_velocity_adjustment(&self) -> bool {
        self.linear_velocity_adjustment.is_some()
    }

    #[must_use]
    pub fn has_angular_velocity_adjustment(&self) -> bool {
        self.angular_velocity_adjustment.is_some()
    }

    #[must_use]
    pub fn linear_velocity_adjustment(&self) -> Option<Vec2> {
        self.linear_velocity_adjustment
    }

    #[must_use]
    pub fn angular_velocity_adjustment(&self) -> Option<f32> {
        self.angular_velocity_adjustment
    }

    pub fn take_linear_velocity_adjustment(&mut self) -> Option<Vec2> {
        self.linear_velocity_adjustment.take()
    }

    pub fn take_angular_velocity_adjustment(&mut self) -> Option<f32> {
        self.angular_velocity_adjustment.take()
    }

    pub fn take_linear_impulse(&mut self) -> Option<Vec2> {
        self.center_impulse.take()
    }

    pub fn take_force(&mut self) -> Option<Vec2> {
        self.center_force.take()
    }

    pub fn clear_physics_adjustments(&mut self) {
        self.linear_velocity_adjustment = None;
        self.angular_velocity_adjustment = None;
        self.center_impulse = None;
        self.center_force = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjustments_are_consumed_once() {
        let mut body = RigidBody::new(Arc::new(RigidBodyClass::default()));
        body.adjust_linear_velocity(Vec2::new(1.0, 2.0));
        body.add_linear_impulse_to_center(Vec2::X);
        body.add_linear_impulse_to_center(Vec2::X);
        assert_eq!(body.take_linear_velocity_adjustment(), Some(Vec2::new(1.0, 2.0)));
        assert_eq!(body.take_linear_velocity_adjustment(), None);
        assert_eq!(body.take_linear_impulse(), Some(Vec2::new(2.0, 0.0)));
    }
}
