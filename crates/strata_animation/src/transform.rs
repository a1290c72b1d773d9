//! Transform animator: moves, resizes, scales and rotates a node.

use std::sync::Arc;

use glam::Vec2;
use serde_json::{Map, Value};
use strata_core::hash::hash_combine;
use strata_core::json::{read_or, to_json};
use strata_core::{Interpolation, Result, interpolate};
use strata_nodes::Node;

use crate::animator::{AnimatorBase, AnimatorFlags, BaseKeys, NodeAnimator};

/// The four transform fields the animator drives together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub position: Vec2,
    pub size: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            size: Vec2::ONE,
            scale: Vec2::ONE,
            rotation: 0.0,
        }
    }
}

impl TransformState {
    fn capture(node: &Node) -> Self {
        Self {
            position: node.translation(),
            size: node.size(),
            scale: node.scale(),
            rotation: node.rotation(),
        }
    }

    fn write(&self, node: &mut Node) {
        node.set_translation(self.position);
        node.set_size(self.size);
        node.set_scale(self.scale);
        node.set_rotation(self.rotation);
    }

    fn mix(&self, end: &Self, t: f32, method: Interpolation) -> Self {
        Self {
            position: interpolate(self.position, end.position, t, method),
            size: interpolate(self.size, end.size, t, method),
            scale: interpolate(self.scale, end.scale, t, method),
            rotation: interpolate(self.rotation, end.rotation, t, method),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransformAnimatorClass {
    pub base: AnimatorBase,
    pub interpolation: Interpolation,
    pub end: TransformState,
}

impl TransformAnimatorClass {
    #[must_use]
    pub fn new(name: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            base: AnimatorBase::new(name, node_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = self.base.hash_value(0);
        hash = hash_combine(hash, &self.interpolation);
        hash = hash_combine(hash, &self.end.position);
        hash = hash_combine(hash, &self.end.size);
        hash = hash_combine(hash, &self.end.scale);
        hash_combine(hash, &self.end.rotation)
    }

    #[must_use]
    pub fn into_json(&self) -> Value {
        let mut chunk = Map::new();
        self.base.write_json(&mut chunk, BaseKeys::DEFAULT);
        chunk.insert("method".into(), to_json(&self.interpolation));
        chunk.insert("position".into(), to_json(&self.end.position));
        chunk.insert("size".into(), to_json(&self.end.size));
        chunk.insert("scale".into(), to_json(&self.end.scale));
        chunk.insert("rotation".into(), to_json(&self.end.rotation));
        Value::Object(chunk)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        const CONTEXT: &str = "transform animator";
        let defaults = TransformState::default();
        Ok(Self {
            base: AnimatorBase::read_json(value, CONTEXT, BaseKeys::DEFAULT)?,
            interpolation: read_or(value, CONTEXT, "method", Interpolation::default())?,
            end: TransformState {
                position: read_or(value, CONTEXT, "position", defaults.position)?,
                size: read_or(value, CONTEXT, "size", defaults.size)?,
                scale: read_or(value, CONTEXT, "scale", defaults.scale)?,
                rotation: read_or(value, CONTEXT, "rotation", defaults.rotation)?,
            },
        })
    }
}

/// Transform animator instance.
///
/// A dynamic instance (class without `STATIC_INSTANCE`) owns a copy of the
/// end state so gameplay code can retarget it mid-flight.
#[derive(Debug, Clone)]
pub struct TransformAnimator {
    class: Arc<TransformAnimatorClass>,
    start: TransformState,
    end: Option<TransformState>,
}

impl TransformAnimator {
    #[must_use]
    pub fn new(class: Arc<TransformAnimatorClass>) -> Self {
        let end = (!class.base.test_flag(AnimatorFlags::STATIC_INSTANCE)).then_some(class.end);
        Self {
            class,
            start: TransformState::default(),
            end,
        }
    }

    #[must_use]
    pub fn class(&self) -> &TransformAnimatorClass {
        &self.class
    }

    #[must_use]
    pub fn end_state(&self) -> &TransformState {
        self.end.as_ref().unwrap_or(&self.class.end)
    }

    pub fn set_end_position(&mut self, position: Vec2) {
        if let Some(end) = self.dynamic_end("position") {
            end.position = position;
        }
    }

    pub fn set_end_size(&mut self, size: Vec2) {
        if let Some(end) = self.dynamic_end("size") {
            end.size = size;
        }
    }

    pub fn set_end_scale(&mut self, scale: Vec2) {
        if let Some(end) = self.dynamic_end("scale") {
            end.scale = scale;
        }
    }

    pub fn set_end_rotation(&mut self, rotation: f32) {
        if let Some(end) = self.dynamic_end("rotation") {
            end.rotation = rotation;
        }
    }

    fn dynamic_end(&mut self, what: &str) -> Option<&mut TransformState> {
        if self.end.is_none() {
            log::warn!(
                "Transform animator end state can't be changed on a static instance. [animator='{}', value={}]",
                self.class.base.name,
                what
            );
        }
        self.end.as_mut()
    }
}

impl NodeAnimator for TransformAnimator {
    fn start(&mut self, node: &mut Node) {
        self.start = TransformState::capture(node);
    }

    fn apply(&mut self, node: &mut Node, t: f32) {
        let state = self.start.mix(self.end_state(), t, self.class.interpolation);
        state.write(node);
    }

    fn finish(&mut self, node: &mut Node) {
        self.end_state().write(node);
    }

    fn can_apply(&self, _node: &Node, _verbose: bool) -> bool {
        true
    }

    fn base(&self) -> &AnimatorBase {
        &self.class.base
    }
}
