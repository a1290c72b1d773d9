//! Entity classes.
//!
//! An [`EntityClass`] is the immutable template that entities are spawned
//! from: a set of node classes arranged in a render tree, the animations that
//! can play on them and the script variables they expose. Editing happens on
//! an owned class; once spawned from, a class is shared as
//! `Arc<EntityClass>` and never changes.
//!
//! Operations that take a node key expect the key to refer to a node of this
//! class. Passing a stale key is a contract violation and panics. The
//! `find_*` lookups return `None` instead.

use std::sync::Arc;

use bitflags::bitflags;
use glam::{Mat4, Vec2};
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use strata_animation::AnimationClass;
use strata_core::hash::hash_combine;
use strata_core::json::{read_array, read_or, read_str, to_json};
use strata_core::tree::{tree_node_from_json, tree_node_to_json};
use strata_core::{
    NodeArena, NodeHit, OrientedBox, Rect, RenderTree, Result, TreeNode, new_id, treeop,
};
use strata_nodes::NodeClass;

use crate::NodeClassKey;
use crate::script_var::ScriptVar;
use crate::state_controller::EntityStateControllerClass;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntityFlags: u32 {
        const VISIBLE_IN_GAME  = 1 << 0;
        /// Entity has a limited lifetime after which it expires.
        const LIMIT_LIFETIME   = 1 << 1;
        /// Expired entities are killed by the scene.
        const KILL_AT_LIFETIME = 1 << 2;
        const KILL_AT_BOUNDARY = 1 << 3;
        const TICK_ENTITY      = 1 << 4;
        const UPDATE_ENTITY    = 1 << 5;
    }
}

impl Default for EntityFlags {
    fn default() -> Self {
        Self::VISIBLE_IN_GAME
            | Self::KILL_AT_LIFETIME
            | Self::KILL_AT_BOUNDARY
            | Self::TICK_ENTITY
            | Self::UPDATE_ENTITY
    }
}

#[derive(Debug, Clone)]
pub struct EntityClass {
    id: String,
    name: String,
    tag: String,
    flags: EntityFlags,
    /// Seconds, only used with [`EntityFlags::LIMIT_LIFETIME`].
    lifetime: f32,
    idle_track_id: String,
    nodes: NodeArena<NodeClassKey, Arc<NodeClass>>,
    render_tree: RenderTree<NodeClassKey>,
    animations: Vec<Arc<AnimationClass>>,
    script_vars: Vec<Arc<ScriptVar>>,
    state_controller: Option<Arc<EntityStateControllerClass>>,
}

impl Default for EntityClass {
    fn default() -> Self {
        Self::with_id(new_id())
    }
}

impl EntityClass {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let mut class = Self::default();
        class.name = name.into();
        class
    }

    /// Class with a known id, mostly useful for tests and loaders.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            tag: String::new(),
            flags: EntityFlags::default(),
            lifetime: 0.0,
            idle_track_id: String::new(),
            nodes: NodeArena::new(),
            render_tree: RenderTree::new(),
            animations: Vec::new(),
            script_vars: Vec::new(),
            state_controller: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[inline]
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> EntityFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub fn test_flag(&self, flag: EntityFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: EntityFlags, on: bool) {
        self.flags.set(flag, on);
    }

    #[inline]
    #[must_use]
    pub fn lifetime(&self) -> f32 {
        self.lifetime
    }

    pub fn set_lifetime(&mut self, seconds: f32) {
        self.lifetime = seconds.max(0.0);
    }

    #[must_use]
    pub fn idle_track_id(&self) -> &str {
        &self.idle_track_id
    }

    #[must_use]
    pub fn has_idle_track(&self) -> bool {
        !self.idle_track_id.is_empty()
    }

    pub fn set_idle_track_id(&mut self, id: impl Into<String>) {
        self.idle_track_id = id.into();
    }

    pub fn reset_idle_track(&mut self) {
        self.idle_track_id.clear();
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Add a node class. The node is not linked into the render tree; call
    /// [`EntityClass::link_child`] to place it.
    pub fn add_node(&mut self, node: NodeClass) -> NodeClassKey {
        self.nodes.insert(Arc::new(node))
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn node(&self, key: NodeClassKey) -> &NodeClass {
        &self.nodes[key]
    }

    /// Mutable access to a node class. Spawned entities keep their own
    /// reference to the previous version.
    pub fn node_mut(&mut self, key: NodeClassKey) -> &mut NodeClass {
        Arc::make_mut(&mut self.nodes[key])
    }

    #[must_use]
    pub fn shared_node(&self, key: NodeClassKey) -> &Arc<NodeClass> {
        &self.nodes[key]
    }

    /// Key of the node at `index` in insertion order.
    #[must_use]
    pub fn node_key(&self, index: usize) -> NodeClassKey {
        self.nodes.key_at(index)
    }

    #[must_use]
    pub fn node_at(&self, index: usize) -> &NodeClass {
        self.nodes.at(index)
    }

    /// `(key, node)` pairs in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeClassKey, &Arc<NodeClass>)> + '_ {
        self.nodes.iter()
    }

    #[must_use]
    pub fn find_node_by_id(&self, id: &str) -> Option<NodeClassKey> {
        self.nodes.find(|n| n.id() == id)
    }

    #[must_use]
    pub fn find_node_by_name(&self, name: &str) -> Option<NodeClassKey> {
        self.nodes.find(|n| n.name() == name)
    }

    /// Parent of a linked node, `None` for top level or unlinked nodes.
    #[must_use]
    pub fn find_node_parent(&self, key: NodeClassKey) -> Option<NodeClassKey> {
        if self.render_tree.has_node(key) {
            self.render_tree.get_parent(key)
        } else {
            None
        }
    }

    #[must_use]
    pub fn render_tree(&self) -> &RenderTree<NodeClassKey> {
        &self.render_tree
    }

    pub fn link_child(&mut self, parent: Option<NodeClassKey>, child: NodeClassKey) {
        self.render_tree.link_child(parent, child);
    }

    pub fn break_child(&mut self, child: NodeClassKey, retain_world_transform: bool) {
        treeop::break_child(&mut self.render_tree, &mut self.nodes, child, retain_world_transform);
    }

    pub fn reparent_child(
        &mut self,
        parent: Option<NodeClassKey>,
        child: NodeClassKey,
        retain_world_transform: bool,
    ) {
        treeop::reparent_child(
            &mut self.render_tree,
            &mut self.nodes,
            parent,
            child,
            retain_world_transform,
        );
    }

    /// Delete the node and its subtree.
    pub fn delete_node(&mut self, key: NodeClassKey) {
        let deleted = treeop::delete_node(&mut self.render_tree, &mut self.nodes, key);
        log::debug!(
            "Deleted entity class nodes. [entity='{}', count={}]",
            self.name,
            deleted.len()
        );
    }

    /// Deep copy the node's subtree next to the original and return the key
    /// of the copy.
    pub fn duplicate_node(&mut self, key: NodeClassKey) -> NodeClassKey {
        treeop::duplicate_node(&mut self.render_tree, &mut self.nodes, key)
    }

    // ========================================================================
    // Spatial queries
    // ========================================================================

    #[must_use]
    pub fn coarse_hit_test(&self, point: Vec2) -> Vec<NodeHit<NodeClassKey>> {
        treeop::coarse_hit_test(&self.render_tree, &self.nodes, point)
    }

    #[must_use]
    pub fn map_coords_from_node_box(&self, point: Vec2, key: NodeClassKey) -> Vec2 {
        treeop::map_coords_from_node_box(&self.render_tree, &self.nodes, point, key)
    }

    #[must_use]
    pub fn map_coords_to_node_box(&self, point: Vec2, key: NodeClassKey) -> Vec2 {
        treeop::map_coords_to_node_box(&self.render_tree, &self.nodes, point, key)
    }

    #[must_use]
    pub fn find_node_transform(&self, key: NodeClassKey) -> Mat4 {
        treeop::find_node_transform(&self.render_tree, &self.nodes, key)
    }

    #[must_use]
    pub fn find_node_model_transform(&self, key: NodeClassKey) -> Mat4 {
        treeop::find_node_model_transform(&self.render_tree, &self.nodes, key)
    }

    #[must_use]
    pub fn find_node_bounding_box(&self, key: NodeClassKey) -> OrientedBox {
        treeop::find_node_bounding_box(&self.render_tree, &self.nodes, key)
    }

    #[must_use]
    pub fn find_node_bounding_rect(&self, key: NodeClassKey) -> Rect {
        treeop::find_node_bounding_rect(&self.render_tree, &self.nodes, key)
    }

    #[must_use]
    pub fn bounding_rect(&self) -> Rect {
        treeop::find_bounding_rect(&self.render_tree, &self.nodes)
    }

    // ========================================================================
    // Animations
    // ========================================================================

    pub fn add_animation(&mut self, animation: AnimationClass) -> &Arc<AnimationClass> {
        self.animations.push(Arc::new(animation));
        let last = self.animations.len() - 1;
        &self.animations[last]
    }

    #[must_use]
    pub fn num_animations(&self) -> usize {
        self.animations.len()
    }

    #[must_use]
    pub fn animation(&self, index: usize) -> &AnimationClass {
        &self.animations[index]
    }

    pub fn animation_mut(&mut self, index: usize) -> &mut AnimationClass {
        Arc::make_mut(&mut self.animations[index])
    }

    #[must_use]
    pub fn shared_animation(&self, index: usize) -> &Arc<AnimationClass> {
        &self.animations[index]
    }

    #[must_use]
    pub fn animations(&self) -> &[Arc<AnimationClass>] {
        &self.animations
    }

    /// Delete the animation at `index`. Deleting the idle animation clears
    /// the idle track.
    pub fn delete_animation(&mut self, index: usize) {
        assert!(index < self.animations.len(), "animation index out of bounds");
        let removed = self.animations.remove(index);
        if removed.id() == self.idle_track_id {
            self.idle_track_id.clear();
        }
    }

    pub fn delete_animation_by_id(&mut self, id: &str) -> bool {
        match self.animations.iter().position(|a| a.id() == id) {
            Some(index) => {
                self.delete_animation(index);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn find_animation_by_id(&self, id: &str) -> Option<&Arc<AnimationClass>> {
        self.animations.iter().find(|a| a.id() == id)
    }

    #[must_use]
    pub fn find_animation_by_name(&self, name: &str) -> Option<&Arc<AnimationClass>> {
        self.animations.iter().find(|a| a.name() == name)
    }

    // ========================================================================
    // State controller
    // ========================================================================

    pub fn set_state_controller(
        &mut self,
        controller: EntityStateControllerClass,
    ) -> &mut EntityStateControllerClass {
        Arc::make_mut(self.state_controller.insert(Arc::new(controller)))
    }

    #[must_use]
    pub fn has_state_controller(&self) -> bool {
        self.state_controller.is_some()
    }

    #[must_use]
    pub fn state_controller(&self) -> Option<&EntityStateControllerClass> {
        self.state_controller.as_deref()
    }

    pub fn state_controller_mut(&mut self) -> Option<&mut EntityStateControllerClass> {
        self.state_controller.as_mut().map(Arc::make_mut)
    }

    #[must_use]
    pub fn shared_state_controller(&self) -> Option<&Arc<EntityStateControllerClass>> {
        self.state_controller.as_ref()
    }

    pub fn delete_state_controller(&mut self) {
        self.state_controller = None;
    }

    // ========================================================================
    // Script variables
    // ========================================================================

    pub fn add_script_var(&mut self, var: ScriptVar) {
        self.script_vars.push(Arc::new(var));
    }

    #[must_use]
    pub fn num_script_vars(&self) -> usize {
        self.script_vars.len()
    }

    #[must_use]
    pub fn script_var(&self, index: usize) -> &ScriptVar {
        &self.script_vars[index]
    }

    pub fn script_var_mut(&mut self, index: usize) -> &mut ScriptVar {
        Arc::make_mut(&mut self.script_vars[index])
    }

    #[must_use]
    pub fn script_vars(&self) -> &[Arc<ScriptVar>] {
        &self.script_vars
    }

    pub fn delete_script_var(&mut self, index: usize) {
        assert!(index < self.script_vars.len(), "script variable index out of bounds");
        self.script_vars.remove(index);
    }

    #[must_use]
    pub fn find_script_var_by_id(&self, id: &str) -> Option<&ScriptVar> {
        self.script_vars.iter().find(|v| v.id() == id).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn find_script_var_by_name(&self, name: &str) -> Option<&ScriptVar> {
        self.script_vars.iter().find(|v| v.name() == name).map(AsRef::as_ref)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Content hash. Nodes are hashed in render tree order so that moving a
    /// node in the hierarchy changes the hash.
    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = hash_combine(0, &self.id);
        hash = hash_combine(hash, &self.name);
        hash = hash_combine(hash, &self.tag);
        hash = hash_combine(hash, &self.idle_track_id);
        hash = hash_combine(hash, &self.flags.bits());
        hash = hash_combine(hash, &self.lifetime);

        self.render_tree.pre_order_traverse_for_each(
            |key| {
                let parent_id = self.render_tree.get_parent(key).map(|p| self.nodes[p].id());
                hash = hash_combine(hash, &parent_id);
                hash = hash_combine(hash, &self.nodes[key].hash_value());
            },
            None,
        );
        // unlinked nodes still count
        for (key, node) in self.nodes.iter() {
            if !self.render_tree.has_node(key) {
                hash = hash_combine(hash, &node.hash_value());
            }
        }
        for animation in &self.animations {
            hash = hash_combine(hash, &animation.hash_value());
        }
        for var in &self.script_vars {
            hash = hash_combine(hash, &var.hash_value());
        }
        if let Some(controller) = &self.state_controller {
            hash = hash_combine(hash, &controller.hash_value());
        }
        hash
    }

    #[must_use]
    pub fn into_json(&self) -> Value {
        let mut chunk = Map::new();
        chunk.insert("id".into(), Value::String(self.id.clone()));
        chunk.insert("name".into(), Value::String(self.name.clone()));
        chunk.insert("tag".into(), Value::String(self.tag.clone()));
        chunk.insert("idle_track".into(), Value::String(self.idle_track_id.clone()));
        chunk.insert("flags".into(), to_json(&self.flags.bits()));
        chunk.insert("lifetime".into(), to_json(&self.lifetime));
        chunk.insert(
            "nodes".into(),
            Value::Array(self.nodes.values().map(|n| n.into_json()).collect()),
        );
        chunk.insert(
            "tracks".into(),
            Value::Array(self.animations.iter().map(|a| a.into_json()).collect()),
        );
        chunk.insert(
            "vars".into(),
            Value::Array(self.script_vars.iter().map(|v| v.into_json()).collect()),
        );
        if let Some(controller) = &self.state_controller {
            chunk.insert("state_controller".into(), controller.into_json());
        }
        let nodes = &self.nodes;
        chunk.insert(
            "render_tree".into(),
            self.render_tree.into_json(|key| tree_node_to_json(nodes[key].id())),
        );
        Value::Object(chunk)
    }

    /// Load a class. A node, animation, variable or state controller that
    /// fails to load fails the whole class; a render tree referring to
    /// unknown nodes does too.
    pub fn from_json(value: &Value) -> Result<Self> {
        const CONTEXT: &str = "entity class";
        let mut class = Self::with_id(read_str(value, CONTEXT, "id")?);
        class.name = read_or(value, CONTEXT, "name", String::new())?;
        class.tag = read_or(value, CONTEXT, "tag", String::new())?;
        class.idle_track_id = read_or(value, CONTEXT, "idle_track", String::new())?;
        let bits: u32 = read_or(value, CONTEXT, "flags", EntityFlags::default().bits())?;
        class.flags = EntityFlags::from_bits_truncate(bits);
        class.lifetime = read_or(value, CONTEXT, "lifetime", 0.0)?;

        let mut ids = FxHashMap::default();
        for chunk in read_array(value, "nodes") {
            let node = NodeClass::from_json(chunk)?;
            let id = node.id().to_owned();
            let key = class.add_node(node);
            ids.insert(id, key);
        }
        for chunk in read_array(value, "tracks") {
            class.animations.push(Arc::new(AnimationClass::from_json(chunk)?));
        }
        for chunk in read_array(value, "vars") {
            class.script_vars.push(Arc::new(ScriptVar::from_json(chunk)?));
        }
        if let Some(chunk) = value.get("state_controller") {
            class.state_controller = Some(Arc::new(EntityStateControllerClass::from_json(chunk)?));
        }
        if let Some(tree) = value.get("render_tree") {
            class.render_tree = RenderTree::from_json(tree, |chunk| tree_node_from_json(&ids, chunk))?;
        }
        Ok(class)
    }

    /// Deep copy with new ids for the class, its nodes, animations, animators,
    /// script variables and state controller. Animator node references and the idle track are
    /// remapped to the copies.
    #[must_use]
    pub fn clone_class(&self) -> Self {
        let mut copy = Self::new(self.name.clone());
        copy.tag = self.tag.clone();
        copy.flags = self.flags;
        copy.lifetime = self.lifetime;

        let mut key_map = FxHashMap::default();
        let mut id_map: FxHashMap<String, String> = FxHashMap::default();
        for (key, node) in self.nodes.iter() {
            let node = node.as_ref().clone_with_new_id();
            id_map.insert(self.nodes[key].id().to_owned(), node.id().to_owned());
            key_map.insert(key, copy.add_node(node));
        }
        copy.render_tree.from_tree(&self.render_tree, |key| key_map[&key]);

        for animation in &self.animations {
            let mut clone = animation.clone_class();
            for i in 0..clone.num_animators() {
                let animator = clone.animator_mut(i);
                if let Some(new_node_id) = id_map.get(animator.node_id()) {
                    animator.base_mut().node_id.clone_from(new_node_id);
                }
            }
            if animation.id() == self.idle_track_id {
                copy.idle_track_id = clone.id().to_owned();
            }
            copy.animations.push(Arc::new(clone));
        }
        for var in &self.script_vars {
            copy.script_vars.push(Arc::new(ScriptVar::new(
                var.name(),
                var.value().clone(),
                var.is_read_only(),
            )));
        }
        copy.state_controller = self
            .state_controller
            .as_ref()
            .map(|controller| Arc::new(controller.clone_class()));
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_animation::TransformAnimatorClass;

    #[test]
    fn clone_class_remaps_animator_nodes() {
        let mut class = EntityClass::new("ship");
        let body = class.add_node(NodeClass::new("body"));
        class.link_child(None, body);
        let mut idle = AnimationClass::new("idle");
        idle.add_animator(TransformAnimatorClass::new("spin", class.node(body).id()));
        let idle_id = class.add_animation(idle).id().to_owned();
        class.set_idle_track_id(idle_id.clone());

        let copy = class.clone_class();
        assert_ne!(copy.id(), class.id());
        let copied_body = copy.find_node_by_name("body").unwrap();
        assert_ne!(copy.node(copied_body).id(), class.node(body).id());
        assert_eq!(copy.animation(0).animator(0).node_id(), copy.node(copied_body).id());
        assert_eq!(copy.idle_track_id(), copy.animation(0).id());
        assert_ne!(copy.idle_track_id(), idle_id);
        assert!(copy.render_tree().has_node(copied_body));
    }

    #[test]
    fn deleting_idle_animation_clears_idle_track() {
        let mut class = EntityClass::new("a");
        let id = class.add_animation(AnimationClass::new("idle")).id().to_owned();
        class.set_idle_track_id(id.clone());
        assert!(class.delete_animation_by_id(&id));
        assert!(!class.has_idle_track());
    }
}
