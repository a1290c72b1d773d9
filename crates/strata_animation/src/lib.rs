//! # strata_animation
//!
//! Timeline animation for entity nodes. An [`AnimationClass`] groups
//! animators (transform, property, boolean property, kinematic and
//! material) under one clock; an [`Animation`] plays it back against the
//! nodes of an entity instance.

pub mod animation;
pub mod animator;
pub mod boolean;
pub mod kinematic;
pub mod material;
pub mod property;
pub mod transform;

pub use animation::{Animation, AnimationClass};
pub use animator::{Animator, AnimatorBase, AnimatorClass, AnimatorFlags, AnimatorType, NodeAnimator};
pub use boolean::{
    BooleanPropertyAnimator, BooleanPropertyAnimatorClass, BooleanPropertyName, FlagAction,
    FlagTarget,
};
pub use kinematic::{KinematicAnimator, KinematicAnimatorClass, KinematicTarget};
pub use material::{MaterialAnimator, MaterialAnimatorClass};
pub use property::{
    PropertyAnimator, PropertyAnimatorClass, PropertyName, PropertyTarget, PropertyValue,
    ValueKind,
};
pub use transform::{TransformAnimator, TransformAnimatorClass, TransformState};
