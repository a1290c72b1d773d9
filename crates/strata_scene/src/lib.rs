//! # strata_scene
//!
//! Entities and scenes. An [`EntityClass`] arranges node classes in a render
//! tree and carries the animations, script variables and state controller
//! of a game object; an [`Entity`] is one live instance of it. A
//! [`SceneClass`] arranges [`EntityPlacement`]s the same way, and a
//! [`Scene`] spawns and runs the entities they describe.

pub mod entity;
pub mod entity_class;
pub mod placement;
pub mod scene;
pub mod scene_class;
pub mod script_var;
pub mod state_controller;

use slotmap::new_key_type;

new_key_type! {
    /// Node class inside an [`EntityClass`].
    pub struct NodeClassKey;
    /// Node instance inside an [`Entity`].
    pub struct NodeKey;
    /// Placement inside a [`SceneClass`].
    pub struct PlacementKey;
    /// Entity inside a [`Scene`].
    pub struct EntityKey;
}

pub use entity::{
    Entity, EntityArgs, EntityControlFlags, EntityEvent, PostedEvent, ScriptVarValue, TimerEvent,
};
pub use entity_class::{EntityClass, EntityFlags};
pub use placement::EntityPlacement;
pub use scene::{Scene, SceneEvent, SceneNode};
pub use scene_class::SceneClass;
pub use script_var::{ScriptValue, ScriptValueType, ScriptVar};
pub use state_controller::{
    ControllerState, EntityStateClass, EntityStateController, EntityStateControllerClass,
    EntityStateTransitionClass, StateAction,
};
