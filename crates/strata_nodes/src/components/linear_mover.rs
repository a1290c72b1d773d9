//! Linear mover: moves the node along a straight line by integrating its
//! velocity and acceleration every tick.

use std::sync::Arc;

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use strata_core::hash::hash_combine;

use crate::transform::NodeTransform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Integrator {
    #[default]
    Euler,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MoverFlags: u32 {
        const ENABLED             = 1 << 0;
        /// Face the direction of travel instead of integrating the angular
        /// velocity.
        const ROTATE_TO_DIRECTION = 1 << 1;
    }
}

impl Default for MoverFlags {
    fn default() -> Self {
        Self::ENABLED
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearMoverClass {
    pub integrator: Integrator,
    pub linear_velocity: Vec2,
    pub linear_acceleration: Vec2,
    pub angular_velocity: f32,
    pub angular_acceleration: f32,
    #[serde(with = "strata_core::flags::bits")]
    pub flags: MoverFlags,
}

impl LinearMoverClass {
    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = hash_combine(0, &(self.integrator as u32));
        hash = hash_combine(hash, &self.linear_velocity);
        hash = hash_combine(hash, &self.linear_acceleration);
        hash = hash_combine(hash, &self.angular_velocity);
        hash = hash_combine(hash, &self.angular_acceleration);
        hash_combine(hash, &self.flags.bits())
    }

    pub fn set_flag(&mut self, flag: MoverFlags, on: bool) {
        self.flags.set(flag, on);
    }
}

#[derive(Debug, Clone)]
pub struct LinearMover {
    class: Arc<LinearMoverClass>,
    flags: MoverFlags,
    linear_velocity: Vec2,
    linear_acceleration: Vec2,
    angular_velocity: f32,
    angular_acceleration: f32,
}

impl LinearMover {
    #[must_use]
    pub fn new(class: Arc<LinearMoverClass>) -> Self {
        Self {
            flags: class.flags,
            linear_velocity: class.linear_velocity,
            linear_acceleration: class.linear_acceleration,
            angular_velocity: class.angular_velocity,
            angular_acceleration: class.angular_acceleration,
            class,
        }
    }

    #[must_use]
    pub fn class(&self) -> &LinearMoverClass {
        &self.class
    }

    #[must_use]
    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }
    #[must_use]
    pub fn linear_acceleration(&self) -> Vec2 {
        self.linear_acceleration
    }
    #[must_use]
    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }
    #[must_use]
    pub fn angular_acceleration(&self) -> f32 {
        self.angular_acceleration
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec2) {
        self.linear_velocity = velocity;
    }
    pub fn set_linear_acceleration(&mut self, acceleration: Vec2) {
        self.linear_acceleration = acceleration;
    }
    pub fn set_angular_velocity(&mut self, velocity: f32) {
        self.angular_velocity = velocity;
    }
    pub fn set_angular_acceleration(&mut self, acceleration: f32) {
        self.angular_acceleration = acceleration;
    }

    /// Keep the current speed but travel towards `direction`.
    pub fn set_direction(&mut self, direction: Vec2) {
        let Some(direction) = direction.try_normalize() else {
            return;
        };
        self.linear_velocity = direction * self.linear_velocity.length();
    }

    #[must_use]
    pub fn test_flag(&self, flag: MoverFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: MoverFlags, on: bool) {
        self.flags.set(flag, on);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.test_flag(MoverFlags::ENABLED)
    }

    pub fn enable(&mut self, on: bool) {
        self.set_flag(MoverFlags::ENABLED, on);
    }

    /// Integrate one step and move `transform`.
    pub fn transform_node(&mut self, dt: f32, transform: &mut NodeTransform) {
        if !self.is_enabled() {
            return;
        }
        match self.class.integrator {
            Integrator::Euler => {
                self.linear_velocity += self.linear_acceleration * dt;
                transform.translate(self.linear_velocity * dt);
                if self.test_flag(MoverFlags::ROTATE_TO_DIRECTION) {
                    transform.rotation = self.linear_velocity.y.atan2(self.linear_velocity.x);
                } else {
                    self.angular_velocity += self.angular_acceleration * dt;
                    transform.rotate(self.angular_velocity * dt);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euler_step() {
        let class = LinearMoverClass {
            linear_velocity: Vec2::new(1.0, 0.0),
            linear_acceleration: Vec2::new(1.0, 0.0),
            angular_velocity: 1.0,
            ..Default::default()
        };
        let mut mover = LinearMover::new(Arc::new(class));
        let mut transform = NodeTransform::default();
        mover.transform_node(0.5, &mut transform);
        assert_eq!(mover.linear_velocity(), Vec2::new(1.5, 0.0));
        assert_eq!(transform.translation, Vec2::new(0.75, 0.0));
        assert_eq!(transform.rotation, 0.5);
    }

    #[test]
    fn disabled_mover_is_inert() {
        let mut mover = LinearMover::new(Arc::new(LinearMoverClass::default()));
        mover.set_linear_velocity(Vec2::ONE);
        mover.enable(false);
        let mut transform = NodeTransform::default();
        mover.transform_node(1.0, &mut transform);
        assert_eq!(transform.translation, Vec2::ZERO);
    }
}
