//! Kinematic animator: drives velocities and accelerations of a rigid body
//! or a linear mover.

use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strata_core::hash::hash_combine;
use strata_core::json::{read_or, to_json};
use strata_core::{Interpolation, Result, interpolate};
use strata_nodes::Node;

use crate::animator::{AnimatorBase, BaseKeys, NodeAnimator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KinematicTarget {
    #[default]
    RigidBody,
    LinearMover,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Kinematics {
    linear_velocity: Vec2,
    linear_acceleration: Vec2,
    angular_velocity: f32,
    angular_acceleration: f32,
}

impl Kinematics {
    fn mix(&self, end: &Self, t: f32, method: Interpolation) -> Self {
        Self {
            linear_velocity: interpolate(self.linear_velocity, end.linear_velocity, t, method),
            linear_acceleration: interpolate(
                self.linear_acceleration,
                end.linear_acceleration,
                t,
                method,
            ),
            angular_velocity: interpolate(self.angular_velocity, end.angular_velocity, t, method),
            angular_acceleration: interpolate(
                self.angular_acceleration,
                end.angular_acceleration,
                t,
                method,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct KinematicAnimatorClass {
    pub base: AnimatorBase,
    pub interpolation: Interpolation,
    pub target: KinematicTarget,
    pub end_linear_velocity: Vec2,
    pub end_linear_acceleration: Vec2,
    pub end_angular_velocity: f32,
    pub end_angular_acceleration: f32,
}

impl KinematicAnimatorClass {
    #[must_use]
    pub fn new(name: impl Into<String>, node_id: impl Into<String>, target: KinematicTarget) -> Self {
        Self {
            base: AnimatorBase::new(name, node_id),
            target,
            ..Self::default()
        }
    }

    fn end(&self) -> Kinematics {
        Kinematics {
            linear_velocity: self.end_linear_velocity,
            linear_acceleration: self.end_linear_acceleration,
            angular_velocity: self.end_angular_velocity,
            angular_acceleration: self.end_angular_acceleration,
        }
    }

    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = self.base.hash_value(0);
        hash = hash_combine(hash, &self.interpolation);
        hash = hash_combine(hash, &(self.target as u32));
        hash = hash_combine(hash, &self.end_linear_velocity);
        hash = hash_combine(hash, &self.end_linear_acceleration);
        hash = hash_combine(hash, &self.end_angular_velocity);
        hash_combine(hash, &self.end_angular_acceleration)
    }

    #[must_use]
    pub fn into_json(&self) -> Value {
        let mut chunk = Map::new();
        self.base.write_json(&mut chunk, BaseKeys::DEFAULT);
        chunk.insert("method".into(), to_json(&self.interpolation));
        chunk.insert("target".into(), to_json(&self.target));
        chunk.insert("linear_velocity".into(), to_json(&self.end_linear_velocity));
        chunk.insert("linear_acceleration".into(), to_json(&self.end_linear_acceleration));
        chunk.insert("angular_velocity".into(), to_json(&self.end_angular_velocity));
        chunk.insert("angular_acceleration".into(), to_json(&self.end_angular_acceleration));
        Value::Object(chunk)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        const CONTEXT: &str = "kinematic animator";
        Ok(Self {
            base: AnimatorBase::read_json(value, CONTEXT, BaseKeys::DEFAULT)?,
            interpolation: read_or(value, CONTEXT, "method", Interpolation::default())?,
            target: read_or(value, CONTEXT, "target", KinematicTarget::default())?,
            end_linear_velocity: read_or(value, CONTEXT, "linear_velocity", Vec2::ZERO)?,
            end_linear_acceleration: read_or(value, CONTEXT, "linear_acceleration", Vec2::ZERO)?,
            end_angular_velocity: read_or(value, CONTEXT, "angular_velocity", 0.0)?,
            end_angular_acceleration: read_or(value, CONTEXT, "angular_acceleration", 0.0)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct KinematicAnimator {
    class: Arc<KinematicAnimatorClass>,
    start: Kinematics,
}

impl KinematicAnimator {
    #[must_use]
    pub fn new(class: Arc<KinematicAnimatorClass>) -> Self {
        Self {
            class,
            start: Kinematics::default(),
        }
    }

    #[must_use]
    pub fn class(&self) -> &KinematicAnimatorClass {
        &self.class
    }

    fn write(&self, node: &mut Node, state: &Kinematics) {
        match self.class.target {
            KinematicTarget::RigidBody => {
                if let Some(body) = node.rigid_body_mut() {
                    body.adjust_linear_velocity(state.linear_velocity);
                    body.adjust_angular_velocity(state.angular_velocity);
                }
            }
            KinematicTarget::LinearMover => {
                if let Some(mover) = node.linear_mover_mut() {
                    mover.set_linear_velocity(state.linear_velocity);
                    mover.set_linear_acceleration(state.linear_acceleration);
                    mover.set_angular_velocity(state.angular_velocity);
                    mover.set_angular_acceleration(state.angular_acceleration);
                }
            }
        }
    }
}

impl NodeAnimator for KinematicAnimator {
    fn start(&mut self, node: &mut Node) {
        if !self.can_apply(node, true) {
            return;
        }
        match self.class.target {
            KinematicTarget::RigidBody => {
                if let Some(body) = node.rigid_body() {
                    self.start.linear_velocity = body.linear_velocity();
                    self.start.angular_velocity = body.angular_velocity();
                }
            }
            KinematicTarget::LinearMover => {
                if let Some(mover) = node.linear_mover() {
                    self.start = Kinematics {
                        linear_velocity: mover.linear_velocity(),
                        linear_acceleration: mover.linear_acceleration(),
                        angular_velocity: mover.angular_velocity(),
                        angular_acceleration: mover.angular_acceleration(),
                    };
                }
            }
        }
    }

    fn apply(&mut self, node: &mut Node, t: f32) {
        if !self.can_apply(node, false) {
            return;
        }
        let state = self.start.mix(&self.class.end(), t, self.class.interpolation);
        self.write(node, &state);
    }

    fn finish(&mut self, node: &mut Node) {
        if !self.can_apply(node, false) {
            return;
        }
        self.write(node, &self.class.end());
    }

    fn can_apply(&self, node: &Node, verbose: bool) -> bool {
        match self.class.target {
            KinematicTarget::RigidBody => match node.rigid_body() {
                Some(body) if body.is_static() => {
                    if verbose {
                        log::warn!(
                            "Kinematic animator can't apply on a static rigid body. [animator='{}', node='{}']",
                            self.class.base.name,
                            node.name()
                        );
                    }
                    false
                }
                Some(_) => true,
                None => {
                    if verbose {
                        log::warn!(
                            "Kinematic animator can't apply on a node without a rigid body. [animator='{}', node='{}']",
                            self.class.base.name,
                            node.name()
                        );
                    }
                    false
                }
            },
            KinematicTarget::LinearMover => {
                let present = node.has_linear_mover();
                if !present && verbose {
                    log::warn!(
                        "Kinematic animator can't apply on a node without a linear mover. [animator='{}', node='{}']",
                        self.class.base.name,
                        node.name()
                    );
                }
                present
            }
        }
    }

    fn base(&self) -> &AnimatorBase {
        &self.class.base
    }
}
