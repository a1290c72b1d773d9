#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! # Strata
//!
//! Entity/scene composition and timeline animation for 2D games.
//!
//! The engine is split into member crates re-exported here:
//!
//! - [`core`]: render tree, node storage, tree algorithms, 2D math,
//!   interpolation, hashing and errors
//! - [`nodes`]: entity node classes and instances with their components
//! - [`animation`]: animators and animations
//! - [`scene`]: entity classes, entities, placements and scenes
//!
//! ```rust,ignore
//! use strata::prelude::*;
//!
//! let mut class = EntityClass::new("ship");
//! let body = class.add_node(NodeClass::new("body"));
//! class.link_child(None, body);
//!
//! let mut entity = Entity::from_class(Arc::new(class));
//! entity.update(1.0 / 60.0, &mut Vec::new());
//! ```

pub use glam;
pub use strata_animation as animation;
pub use strata_core as core;
pub use strata_nodes as nodes;
pub use strata_scene as scene;

pub use strata_core::{Result, StrataError};

pub mod prelude {
    pub use std::sync::Arc;

    pub use glam::{Mat4, Vec2, Vec3, Vec4};

    pub use strata_core::{
        Color4f, Interpolation, NodeArena, NodeHit, OrientedBox, Rect, RenderTree, Result,
        StrataError, TreeNode, TreeVisitor, interpolate,
    };
    pub use strata_nodes::{Node, NodeClass, NodeClassFlags, NodeTransform};
    pub use strata_animation::{
        Animation, AnimationClass, Animator, AnimatorClass, AnimatorFlags, BooleanPropertyAnimatorClass,
        BooleanPropertyName, FlagAction, KinematicAnimatorClass, KinematicTarget,
        MaterialAnimatorClass, NodeAnimator, PropertyAnimatorClass, PropertyName, PropertyValue,
        TransformAnimatorClass,
    };
    pub use strata_scene::{
        Entity, EntityArgs, EntityClass, EntityEvent, EntityFlags, EntityKey, EntityPlacement,
        EntityStateClass, EntityStateController, EntityStateControllerClass,
        EntityStateTransitionClass, NodeClassKey, NodeKey, PlacementKey, Scene, SceneClass,
        SceneEvent, ScriptValue, ScriptVar, StateAction,
    };
}
