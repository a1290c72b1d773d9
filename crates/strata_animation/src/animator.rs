//! Animator classes and instances.
//!
//! An animator mutates one aspect of one node over a normalized time window
//! inside its owning animation. The class ([`AnimatorClass`]) is the shared
//! immutable description. The instance ([`Animator`]) holds the state
//! captured for one playback.
//!
//! # Lifecycle
//!
//! Per playback every instance goes through
//! `NotStarted -> Started -> Updating -> Finished`:
//!
//! - [`NodeAnimator::start`] once, when the animation time reaches the
//!   animator start time. Captures the start state.
//! - [`NodeAnimator::apply`] on every tick inside the window, with `t`
//!   re-normalized to the window.
//! - [`NodeAnimator::finish`] once, when the window ends. Writes the exact
//!   end state.
//!
//! Each call validates [`NodeAnimator::can_apply`] first and turns into a
//! no-op when the node lacks the targeted component.

use std::sync::Arc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strata_core::hash::hash_combine;
use strata_core::json::{read_or, read_str, to_json};
use strata_core::{Result, new_id};
use strata_nodes::Node;

use crate::boolean::{BooleanPropertyAnimator, BooleanPropertyAnimatorClass};
use crate::kinematic::{KinematicAnimator, KinematicAnimatorClass};
use crate::material::{MaterialAnimator, MaterialAnimatorClass};
use crate::property::{PropertyAnimator, PropertyAnimatorClass};
use crate::transform::{TransformAnimator, TransformAnimatorClass};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AnimatorFlags: u32 {
        /// The instance shares its end state with the class and can't be
        /// retargeted at runtime.
        const STATIC_INSTANCE = 1 << 0;
    }
}

impl Default for AnimatorFlags {
    fn default() -> Self {
        Self::STATIC_INSTANCE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimatorType {
    TransformAnimator,
    PropertyAnimator,
    BooleanPropertyAnimator,
    KinematicAnimator,
    MaterialAnimator,
}

// ============================================================================
// Shared class data
// ============================================================================

/// JSON keys that differ between animator kinds.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BaseKeys {
    pub name: &'static str,
    pub start: &'static str,
}

impl BaseKeys {
    pub(crate) const DEFAULT: Self = Self {
        name: "name",
        start: "starttime",
    };
    pub(crate) const PROPERTY: Self = Self {
        name: "cname",
        start: "starttime",
    };
    pub(crate) const MATERIAL: Self = Self {
        name: "cname",
        start: "start",
    };
}

/// Data every animator class carries.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatorBase {
    pub id: String,
    pub name: String,
    /// Class id of the node the animator targets.
    pub node_id: String,
    pub flags: AnimatorFlags,
    start_time: f32,
    duration: f32,
}

impl Default for AnimatorBase {
    fn default() -> Self {
        Self {
            id: new_id(),
            name: String::new(),
            node_id: String::new(),
            flags: AnimatorFlags::default(),
            start_time: 0.0,
            duration: 1.0,
        }
    }
}

impl AnimatorBase {
    #[must_use]
    pub fn new(name: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_id: node_id.into(),
            ..Self::default()
        }
    }

    /// Normalized start time within the animation.
    #[inline]
    #[must_use]
    pub fn start_time(&self) -> f32 {
        self.start_time
    }

    /// Normalized duration within the animation.
    #[inline]
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Normalized end time, never past the end of the animation.
    #[inline]
    #[must_use]
    pub fn end_time(&self) -> f32 {
        (self.start_time + self.duration).min(1.0)
    }

    pub fn set_start_time(&mut self, time: f32) {
        self.start_time = time.clamp(0.0, 1.0);
    }

    pub fn set_duration(&mut self, duration: f32) {
        self.duration = duration.clamp(0.0, 1.0);
    }

    #[must_use]
    pub fn test_flag(&self, flag: AnimatorFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: AnimatorFlags, on: bool) {
        self.flags.set(flag, on);
    }

    pub(crate) fn hash_value(&self, seed: u64) -> u64 {
        let mut hash = hash_combine(seed, &self.id);
        hash = hash_combine(hash, &self.name);
        hash = hash_combine(hash, &self.node_id);
        hash = hash_combine(hash, &self.start_time);
        hash = hash_combine(hash, &self.duration);
        hash_combine(hash, &self.flags.bits())
    }

    pub(crate) fn write_json(&self, chunk: &mut Map<String, Value>, keys: BaseKeys) {
        chunk.insert("id".into(), Value::String(self.id.clone()));
        chunk.insert(keys.name.into(), Value::String(self.name.clone()));
        chunk.insert("node".into(), Value::String(self.node_id.clone()));
        chunk.insert(keys.start.into(), to_json(&self.start_time));
        chunk.insert("duration".into(), to_json(&self.duration));
        chunk.insert("flags".into(), to_json(&self.flags.bits()));
    }

    pub(crate) fn read_json(value: &Value, context: &'static str, keys: BaseKeys) -> Result<Self> {
        let mut base = Self {
            id: read_str(value, context, "id")?.to_owned(),
            name: read_or(value, context, keys.name, String::new())?,
            node_id: read_str(value, context, "node")?.to_owned(),
            ..Self::default()
        };
        base.set_start_time(read_or(value, context, keys.start, 0.0)?);
        base.set_duration(read_or(value, context, "duration", 1.0)?);
        let bits: u32 = read_or(value, context, "flags", AnimatorFlags::default().bits())?;
        base.flags = AnimatorFlags::from_bits_truncate(bits);
        Ok(base)
    }
}

// ============================================================================
// Instance contract
// ============================================================================

/// The per-playback lifecycle of an animator instance.
pub trait NodeAnimator {
    fn start(&mut self, node: &mut Node);
    fn apply(&mut self, node: &mut Node, t: f32);
    fn finish(&mut self, node: &mut Node);
    /// True when the node carries whatever the animator targets.
    fn can_apply(&self, node: &Node, verbose: bool) -> bool;
    fn base(&self) -> &AnimatorBase;
}

// ============================================================================
// AnimatorClass
// ============================================================================

/// Closed set of animator classes. Each variant shares its class through an
/// `Arc` so instances can keep a reference to it.
#[derive(Debug, Clone)]
pub enum AnimatorClass {
    Transform(Arc<TransformAnimatorClass>),
    Property(Arc<PropertyAnimatorClass>),
    BooleanProperty(Arc<BooleanPropertyAnimatorClass>),
    Kinematic(Arc<KinematicAnimatorClass>),
    Material(Arc<MaterialAnimatorClass>),
}

macro_rules! dispatch_class {
    ($self:expr, $c:ident => $body:expr) => {
        match $self {
            AnimatorClass::Transform($c) => $body,
            AnimatorClass::Property($c) => $body,
            AnimatorClass::BooleanProperty($c) => $body,
            AnimatorClass::Kinematic($c) => $body,
            AnimatorClass::Material($c) => $body,
        }
    };
}

impl AnimatorClass {
    #[must_use]
    pub fn animator_type(&self) -> AnimatorType {
        match self {
            Self::Transform(_) => AnimatorType::TransformAnimator,
            Self::Property(_) => AnimatorType::PropertyAnimator,
            Self::BooleanProperty(_) => AnimatorType::BooleanPropertyAnimator,
            Self::Kinematic(_) => AnimatorType::KinematicAnimator,
            Self::Material(_) => AnimatorType::MaterialAnimator,
        }
    }

    #[must_use]
    pub fn base(&self) -> &AnimatorBase {
        dispatch_class!(self, c => &c.base)
    }

    /// Copy-on-write access to the shared base data.
    pub fn base_mut(&mut self) -> &mut AnimatorBase {
        dispatch_class!(self, c => &mut Arc::make_mut(c).base)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.base().id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.base().name
    }

    #[must_use]
    pub fn node_id(&self) -> &str {
        &self.base().node_id
    }

    #[must_use]
    pub fn start_time(&self) -> f32 {
        self.base().start_time()
    }

    #[must_use]
    pub fn duration(&self) -> f32 {
        self.base().duration()
    }

    #[must_use]
    pub fn hash_value(&self) -> u64 {
        dispatch_class!(self, c => c.hash_value())
    }

    #[must_use]
    pub fn into_json(&self) -> Value {
        dispatch_class!(self, c => c.into_json())
    }

    pub fn from_json(animator_type: AnimatorType, value: &Value) -> Result<Self> {
        Ok(match animator_type {
            AnimatorType::TransformAnimator => TransformAnimatorClass::from_json(value)?.into(),
            AnimatorType::PropertyAnimator => PropertyAnimatorClass::from_json(value)?.into(),
            AnimatorType::BooleanPropertyAnimator => {
                BooleanPropertyAnimatorClass::from_json(value)?.into()
            }
            AnimatorType::KinematicAnimator => KinematicAnimatorClass::from_json(value)?.into(),
            AnimatorType::MaterialAnimator => MaterialAnimatorClass::from_json(value)?.into(),
        })
    }

    /// Deep copy with a fresh id.
    #[must_use]
    pub fn clone_class(&self) -> Self {
        let mut copy = match self {
            Self::Transform(c) => Self::Transform(Arc::new(c.as_ref().clone())),
            Self::Property(c) => Self::Property(Arc::new(c.as_ref().clone())),
            Self::BooleanProperty(c) => Self::BooleanProperty(Arc::new(c.as_ref().clone())),
            Self::Kinematic(c) => Self::Kinematic(Arc::new(c.as_ref().clone())),
            Self::Material(c) => Self::Material(Arc::new(c.as_ref().clone())),
        };
        copy.base_mut().id = new_id();
        copy
    }

    #[must_use]
    pub fn create_instance(&self) -> Animator {
        match self {
            Self::Transform(c) => Animator::Transform(TransformAnimator::new(Arc::clone(c))),
            Self::Property(c) => Animator::Property(PropertyAnimator::new(Arc::clone(c))),
            Self::BooleanProperty(c) => {
                Animator::BooleanProperty(BooleanPropertyAnimator::new(Arc::clone(c)))
            }
            Self::Kinematic(c) => Animator::Kinematic(KinematicAnimator::new(Arc::clone(c))),
            Self::Material(c) => Animator::Material(MaterialAnimator::new(Arc::clone(c))),
        }
    }
}

macro_rules! animator_class_from {
    ($($class:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$class> for AnimatorClass {
                fn from(class: $class) -> Self {
                    Self::$variant(Arc::new(class))
                }
            }
        )*
    };
}

animator_class_from! {
    TransformAnimatorClass => Transform,
    PropertyAnimatorClass => Property,
    BooleanPropertyAnimatorClass => BooleanProperty,
    KinematicAnimatorClass => Kinematic,
    MaterialAnimatorClass => Material,
}

// ============================================================================
// Animator
// ============================================================================

/// Animator instance, one per animator class per animation playback.
#[derive(Debug, Clone)]
pub enum Animator {
    Transform(TransformAnimator),
    Property(PropertyAnimator),
    BooleanProperty(BooleanPropertyAnimator),
    Kinematic(KinematicAnimator),
    Material(MaterialAnimator),
}

macro_rules! dispatch_instance {
    ($self:expr, $a:ident => $body:expr) => {
        match $self {
            Animator::Transform($a) => $body,
            Animator::Property($a) => $body,
            Animator::BooleanProperty($a) => $body,
            Animator::Kinematic($a) => $body,
            Animator::Material($a) => $body,
        }
    };
}

impl Animator {
    #[must_use]
    pub fn class_id(&self) -> &str {
        &self.base().id
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.base().name
    }

    #[must_use]
    pub fn node_id(&self) -> &str {
        &self.base().node_id
    }

    #[must_use]
    pub fn start_time(&self) -> f32 {
        self.base().start_time()
    }

    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.base().end_time()
    }

    #[must_use]
    pub fn as_transform(&self) -> Option<&TransformAnimator> {
        match self {
            Self::Transform(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_transform_mut(&mut self) -> Option<&mut TransformAnimator> {
        match self {
            Self::Transform(a) => Some(a),
            _ => None,
        }
    }
}

impl NodeAnimator for Animator {
    fn start(&mut self, node: &mut Node) {
        dispatch_instance!(self, a => a.start(node));
    }

    fn apply(&mut self, node: &mut Node, t: f32) {
        dispatch_instance!(self, a => a.apply(node, t));
    }

    fn finish(&mut self, node: &mut Node) {
        dispatch_instance!(self, a => a.finish(node));
    }

    fn can_apply(&self, node: &Node, verbose: bool) -> bool {
        dispatch_instance!(self, a => a.can_apply(node, verbose))
    }

    fn base(&self) -> &AnimatorBase {
        dispatch_instance!(self, a => a.base())
    }
}
