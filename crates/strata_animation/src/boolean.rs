//! Boolean property animator: flips a single component flag once per
//! playback.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strata_core::Result;
use strata_core::hash::hash_combine;
use strata_core::json::{read, read_or, to_json};
use strata_nodes::{DrawableFlags, LightFlags, MoverFlags, Node, RigidBodyFlags, SpatialFlags, TextFlags};

use crate::animator::{AnimatorBase, BaseKeys, NodeAnimator};

/// Marks a flip that already happened in this playback.
const APPLIED: f32 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FlagAction {
    On,
    Off,
    #[default]
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BooleanPropertyName {
    #[default]
    DrawableVisibleInGame,
    DrawableUpdateMaterial,
    DrawableUpdateDrawable,
    DrawableRestart,
    DrawableFlipHorizontally,
    DrawableFlipVertically,
    DrawableDoubleSided,
    DrawableDepthTest,
    DrawablePPEnableBloom,
    RigidBodyBullet,
    RigidBodySensor,
    RigidBodyEnabled,
    RigidBodyCanSleep,
    RigidBodyDiscardRotation,
    TextItemVisibleInGame,
    TextItemBlink,
    TextItemUnderline,
    TextItemPPEnableBloom,
    SpatialNodeEnabled,
    LinearMoverEnabled,
    BasicLightEnabled,
}

/// The component flag a [`BooleanPropertyName`] resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagTarget {
    Drawable(DrawableFlags),
    RigidBody(RigidBodyFlags),
    TextItem(TextFlags),
    SpatialNode(SpatialFlags),
    LinearMover(MoverFlags),
    BasicLight(LightFlags),
}

impl BooleanPropertyName {
    #[must_use]
    pub fn target(self) -> FlagTarget {
        use BooleanPropertyName as B;
        match self {
            B::DrawableVisibleInGame => FlagTarget::Drawable(DrawableFlags::VISIBLE_IN_GAME),
            B::DrawableUpdateMaterial => FlagTarget::Drawable(DrawableFlags::UPDATE_MATERIAL),
            B::DrawableUpdateDrawable => FlagTarget::Drawable(DrawableFlags::UPDATE_DRAWABLE),
            B::DrawableRestart => FlagTarget::Drawable(DrawableFlags::RESTART_DRAWABLE),
            B::DrawableFlipHorizontally => FlagTarget::Drawable(DrawableFlags::FLIP_HORIZONTALLY),
            B::DrawableFlipVertically => FlagTarget::Drawable(DrawableFlags::FLIP_VERTICALLY),
            B::DrawableDoubleSided => FlagTarget::Drawable(DrawableFlags::DOUBLE_SIDED),
            B::DrawableDepthTest => FlagTarget::Drawable(DrawableFlags::DEPTH_TEST),
            B::DrawablePPEnableBloom => FlagTarget::Drawable(DrawableFlags::PP_ENABLE_BLOOM),
            B::RigidBodyBullet => FlagTarget::RigidBody(RigidBodyFlags::BULLET),
            B::RigidBodySensor => FlagTarget::RigidBody(RigidBodyFlags::SENSOR),
            B::RigidBodyEnabled => FlagTarget::RigidBody(RigidBodyFlags::ENABLED),
            B::RigidBodyCanSleep => FlagTarget::RigidBody(RigidBodyFlags::CAN_SLEEP),
            B::RigidBodyDiscardRotation => FlagTarget::RigidBody(RigidBodyFlags::DISCARD_ROTATION),
            B::TextItemVisibleInGame => FlagTarget::TextItem(TextFlags::VISIBLE_IN_GAME),
            B::TextItemBlink => FlagTarget::TextItem(TextFlags::BLINK_TEXT),
            B::TextItemUnderline => FlagTarget::TextItem(TextFlags::UNDERLINE_TEXT),
            B::TextItemPPEnableBloom => FlagTarget::TextItem(TextFlags::PP_ENABLE_BLOOM),
            B::SpatialNodeEnabled => FlagTarget::SpatialNode(SpatialFlags::ENABLED),
            B::LinearMoverEnabled => FlagTarget::LinearMover(MoverFlags::ENABLED),
            B::BasicLightEnabled => FlagTarget::BasicLight(LightFlags::ENABLED),
        }
    }
}

impl FlagTarget {
    /// Current flag value, `None` when the node lacks the component.
    #[must_use]
    pub fn read(self, node: &Node) -> Option<bool> {
        match self {
            Self::Drawable(f) => node.drawable().map(|c| c.test_flag(f)),
            Self::RigidBody(f) => node.rigid_body().map(|c| c.test_flag(f)),
            Self::TextItem(f) => node.text_item().map(|c| c.test_flag(f)),
            Self::SpatialNode(f) => node.spatial_node().map(|c| c.test_flag(f)),
            Self::LinearMover(f) => node.linear_mover().map(|c| c.test_flag(f)),
            Self::BasicLight(f) => node.basic_light().map(|c| c.test_flag(f)),
        }
    }

    /// Returns false when the node lacks the component.
    pub fn write(self, node: &mut Node, on: bool) -> bool {
        match self {
            Self::Drawable(f) => node.drawable_mut().map(|c| c.set_flag(f, on)).is_some(),
            Self::RigidBody(f) => node.rigid_body_mut().map(|c| c.set_flag(f, on)).is_some(),
            Self::TextItem(f) => node.text_item_mut().map(|c| c.set_flag(f, on)).is_some(),
            Self::SpatialNode(f) => node.spatial_node_mut().map(|c| c.set_flag(f, on)).is_some(),
            Self::LinearMover(f) => node.linear_mover_mut().map(|c| c.set_flag(f, on)).is_some(),
            Self::BasicLight(f) => node.basic_light_mut().map(|c| c.set_flag(f, on)).is_some(),
        }
    }

    fn component_name(self) -> &'static str {
        match self {
            Self::Drawable(_) => "a drawable",
            Self::RigidBody(_) => "a rigid body",
            Self::TextItem(_) => "a text item",
            Self::SpatialNode(_) => "a spatial node",
            Self::LinearMover(_) => "a linear mover",
            Self::BasicLight(_) => "a basic light",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BooleanPropertyAnimatorClass {
    pub base: AnimatorBase,
    pub flag: BooleanPropertyName,
    pub action: FlagAction,
    time: f32,
}

impl Default for BooleanPropertyAnimatorClass {
    fn default() -> Self {
        Self {
            base: AnimatorBase::default(),
            flag: BooleanPropertyName::default(),
            action: FlagAction::default(),
            time: 1.0,
        }
    }
}

impl BooleanPropertyAnimatorClass {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        node_id: impl Into<String>,
        flag: BooleanPropertyName,
        action: FlagAction,
    ) -> Self {
        Self {
            base: AnimatorBase::new(name, node_id),
            flag,
            action,
            ..Self::default()
        }
    }

    /// Normalized time within the animator window at which the flag flips.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn set_time(&mut self, time: f32) {
        self.time = time.clamp(0.0, 1.0);
    }

    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = self.base.hash_value(0);
        hash = hash_combine(hash, &(self.flag as u32));
        hash = hash_combine(hash, &(self.action as u32));
        hash_combine(hash, &self.time)
    }

    #[must_use]
    pub fn into_json(&self) -> Value {
        let mut chunk = Map::new();
        self.base.write_json(&mut chunk, BaseKeys::DEFAULT);
        chunk.insert("flag".into(), to_json(&self.flag));
        chunk.insert("action".into(), to_json(&self.action));
        chunk.insert("time".into(), to_json(&self.time));
        Value::Object(chunk)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        const CONTEXT: &str = "boolean property animator";
        let mut class = Self {
            base: AnimatorBase::read_json(value, CONTEXT, BaseKeys::DEFAULT)?,
            flag: read(value, CONTEXT, "flag")?,
            action: read_or(value, CONTEXT, "action", FlagAction::default())?,
            time: 1.0,
        };
        class.set_time(read_or(value, CONTEXT, "time", 1.0)?);
        Ok(class)
    }
}

#[derive(Debug, Clone)]
pub struct BooleanPropertyAnimator {
    class: Arc<BooleanPropertyAnimatorClass>,
    time: f32,
    start_state: Option<bool>,
}

impl BooleanPropertyAnimator {
    #[must_use]
    pub fn new(class: Arc<BooleanPropertyAnimatorClass>) -> Self {
        Self {
            time: class.time,
            class,
            start_state: None,
        }
    }

    #[must_use]
    pub fn class(&self) -> &BooleanPropertyAnimatorClass {
        &self.class
    }

    /// True once the flip happened in this playback.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.time == APPLIED
    }

    fn flip(&mut self, node: &mut Node) {
        if self.is_applied() || !self.can_apply(node, false) {
            return;
        }
        let target = self.class.flag.target();
        let start = match self.start_state {
            Some(state) => state,
            None => {
                let state = target.read(node).unwrap_or_default();
                self.start_state = Some(state);
                state
            }
        };
        let next = match self.class.action {
            FlagAction::On => true,
            FlagAction::Off => false,
            FlagAction::Toggle => !start,
        };
        target.write(node, next);
        self.time = APPLIED;
    }
}

impl NodeAnimator for BooleanPropertyAnimator {
    fn start(&mut self, node: &mut Node) {
        if !self.can_apply(node, true) {
            return;
        }
        self.start_state = self.class.flag.target().read(node);
        if self.time == 0.0 {
            self.flip(node);
        }
    }

    fn apply(&mut self, node: &mut Node, t: f32) {
        if !self.is_applied() && t >= self.time {
            self.flip(node);
        }
    }

    fn finish(&mut self, node: &mut Node) {
        self.flip(node);
    }

    fn can_apply(&self, node: &Node, verbose: bool) -> bool {
        let target = self.class.flag.target();
        let present = target.read(node).is_some();
        if !present && verbose {
            log::warn!(
                "Property animator can't apply a flag on a node without {}. [animator='{}', node='{}', flag={:?}]",
                target.component_name(),
                self.class.base.name,
                node.name(),
                self.class.flag
            );
        }
        present
    }

    fn base(&self) -> &AnimatorBase {
        &self.class.base
    }
}
