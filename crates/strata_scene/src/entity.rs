//! Entity instances.
//!
//! An [`Entity`] is spawned from a shared [`EntityClass`]. It owns a node
//! instance per class node arranged in a copy of the class render tree, the
//! animation currently playing on those nodes, timers and the writable
//! script variables. The per tick step is [`Entity::update`].

use std::collections::VecDeque;
use std::sync::Arc;

use bitflags::bitflags;
use glam::{Mat4, Vec2};
use rustc_hash::FxHashMap;
use strata_animation::{Animation, AnimationClass};
use strata_core::{
    NodeArena, NodeHit, OrientedBox, Rect, RenderTree, Result, StrataError, new_id, treeop,
};
use strata_nodes::Node;

use crate::NodeKey;
use crate::entity_class::{EntityClass, EntityFlags};
use crate::script_var::{self, ScriptValue, ScriptVar};
use crate::state_controller::{EntityStateController, StateAction};

bitflags! {
    /// Run-time state owned by the scene loop rather than the class.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EntityControlFlags: u32 {
        /// Killed this loop, deleted at the end of it.
        const KILLED         = 1 << 0;
        /// Spawned this loop.
        const SPAWNED        = 1 << 1;
        /// Asked to be killed on the next scene update.
        const WANTS_TO_DIE   = 1 << 2;
        const ENABLE_LOGGING = 1 << 3;
    }
}

/// A value for the class script variable with the given id.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptVarValue {
    pub id: String,
    pub value: ScriptValue,
}

/// Spawn arguments.
#[derive(Debug, Clone)]
pub struct EntityArgs {
    pub class: Arc<EntityClass>,
    /// Instance id, a random id is used when empty.
    pub id: String,
    pub name: String,
    /// Multiplied into the scale of every top level node.
    pub scale: Vec2,
    /// Added to the translation of every top level node.
    pub position: Vec2,
    /// Added to the rotation of every top level node.
    pub rotation: f32,
    pub script_vars: Vec<ScriptVarValue>,
    pub enable_logging: bool,
}

impl EntityArgs {
    #[must_use]
    pub fn new(class: Arc<EntityClass>) -> Self {
        Self {
            class,
            id: String::new(),
            name: String::new(),
            scale: Vec2::ONE,
            position: Vec2::ZERO,
            rotation: 0.0,
            script_vars: Vec::new(),
            enable_logging: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimerEvent {
    pub name: String,
    /// Seconds the timer fired late by.
    pub jitter: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostedEvent {
    pub message: String,
    pub sender: String,
    pub value: ScriptValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityEvent {
    Timer(TimerEvent),
    Posted(PostedEvent),
    State(StateAction),
}

#[derive(Debug, Clone)]
struct Timer {
    name: String,
    remaining: f32,
}

#[derive(Debug, Clone)]
pub struct Entity {
    class: Arc<EntityClass>,
    id: String,
    name: String,
    tag: String,
    nodes: NodeArena<NodeKey, Node>,
    render_tree: RenderTree<NodeKey>,
    current_animation: Option<Animation>,
    finished_animation: Option<Animation>,
    animation_queue: VecDeque<Animation>,
    state_controller: Option<EntityStateController>,
    script_vars: Vec<ScriptVar>,
    timers: Vec<Timer>,
    events: Vec<PostedEvent>,
    die_in: Option<f32>,
    current_time: f32,
    lifetime: f32,
    flags: EntityFlags,
    control_flags: EntityControlFlags,
    layer: i32,
    parent_node_class_id: String,
    idle_track_id: String,
}

impl Entity {
    /// Spawn an entity. The spawn transform is baked into the top level
    /// nodes so the class hierarchy below them is left untouched.
    #[must_use]
    pub fn new(args: EntityArgs) -> Self {
        let class = args.class;

        let mut nodes = NodeArena::new();
        let mut key_map = FxHashMap::default();
        for (class_key, node_class) in class.nodes() {
            let key = nodes.insert(Node::new(Arc::clone(node_class)));
            key_map.insert(class_key, key);
        }
        let mut render_tree = RenderTree::new();
        render_tree.from_tree(class.render_tree(), |key| key_map[&key]);

        for (key, node) in nodes.iter_mut() {
            if render_tree.has_parent(key) {
                continue;
            }
            node.set_rotation(node.rotation() + args.rotation);
            node.set_translation(node.translation() + args.position);
            node.set_scale(node.scale() * args.scale);
        }

        let script_vars = class
            .script_vars()
            .iter()
            .filter(|v| !v.is_read_only())
            .map(|v| v.as_ref().clone())
            .collect();

        let mut control_flags = EntityControlFlags::default();
        control_flags.set(EntityControlFlags::ENABLE_LOGGING, args.enable_logging);

        let mut entity = Self {
            id: if args.id.is_empty() { new_id() } else { args.id },
            name: args.name,
            tag: class.tag().to_owned(),
            nodes,
            render_tree,
            current_animation: None,
            finished_animation: None,
            animation_queue: VecDeque::new(),
            state_controller: class
                .shared_state_controller()
                .map(|controller| EntityStateController::new(Arc::clone(controller))),
            script_vars,
            timers: Vec::new(),
            events: Vec::new(),
            die_in: None,
            current_time: 0.0,
            lifetime: class.lifetime(),
            flags: class.flags(),
            control_flags,
            layer: 0,
            parent_node_class_id: String::new(),
            idle_track_id: class.idle_track_id().to_owned(),
            class,
        };
        for value in args.script_vars {
            entity.override_script_var(value);
        }
        entity
    }

    /// Spawn with default arguments.
    #[must_use]
    pub fn from_class(class: Arc<EntityClass>) -> Self {
        Self::new(EntityArgs::new(class))
    }

    // A read-only variable gets a private copy so that the instance value
    // differs while scripts still can't write it.
    fn override_script_var(&mut self, value: ScriptVarValue) {
        let accepted = match self.script_vars.iter().position(|v| v.id() == value.id) {
            Some(index) => {
                let var = &mut self.script_vars[index];
                let same_type = var.value_type() == value.value.value_type();
                if same_type {
                    var.set_value(value.value.clone());
                }
                same_type
            }
            None => match self.class.find_script_var_by_id(&value.id) {
                Some(var) if var.value_type() == value.value.value_type() => {
                    let mut copy = var.clone();
                    copy.set_value(value.value.clone());
                    self.script_vars.push(copy);
                    true
                }
                _ => false,
            },
        };
        if !accepted {
            log::warn!(
                "Ignoring script variable override. [entity='{}', var='{}', value={:?}]",
                self.name,
                value.id,
                value.value
            );
        }
    }

    #[must_use]
    pub fn class(&self) -> &EntityClass {
        &self.class
    }

    #[must_use]
    pub fn shared_class(&self) -> &Arc<EntityClass> {
        &self.class
    }

    #[must_use]
    pub fn class_id(&self) -> &str {
        self.class.id()
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        self.class.name()
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

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    #[must_use]
    pub fn layer(&self) -> i32 {
        self.layer
    }

    pub fn set_layer(&mut self, layer: i32) {
        self.layer = layer;
    }

    /// Class id of the node in the parent entity this entity is linked to.
    #[must_use]
    pub fn parent_node_class_id(&self) -> &str {
        &self.parent_node_class_id
    }

    pub fn set_parent_node_class_id(&mut self, id: impl Into<String>) {
        self.parent_node_class_id = id.into();
    }

    #[must_use]
    pub fn idle_track_id(&self) -> &str {
        &self.idle_track_id
    }

    pub fn set_idle_track_id(&mut self, id: impl Into<String>) {
        self.idle_track_id = id.into();
    }

    #[must_use]
    pub fn has_idle_track(&self) -> bool {
        !self.idle_track_id.is_empty()
    }

    #[must_use]
    pub fn lifetime(&self) -> f32 {
        self.lifetime
    }

    pub fn set_lifetime(&mut self, seconds: f32) {
        self.lifetime = seconds;
    }

    /// Seconds since spawn.
    #[must_use]
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    #[must_use]
    pub fn flags(&self) -> EntityFlags {
        self.flags
    }

    #[must_use]
    pub fn test_flag(&self, flag: EntityFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: EntityFlags, on: bool) {
        self.flags.set(flag, on);
    }

    #[must_use]
    pub fn control_flags(&self) -> EntityControlFlags {
        self.control_flags
    }

    #[must_use]
    pub fn test_control_flag(&self, flag: EntityControlFlags) -> bool {
        self.control_flags.contains(flag)
    }

    pub(crate) fn set_control_flag(&mut self, flag: EntityControlFlags, on: bool) {
        self.control_flags.set(flag, on);
    }

    #[must_use]
    pub fn has_been_killed(&self) -> bool {
        self.test_control_flag(EntityControlFlags::KILLED)
    }

    #[must_use]
    pub fn has_been_spawned(&self) -> bool {
        self.test_control_flag(EntityControlFlags::SPAWNED)
    }

    #[must_use]
    pub fn wants_to_die(&self) -> bool {
        self.test_control_flag(EntityControlFlags::WANTS_TO_DIE)
    }

    #[must_use]
    pub fn is_logging_enabled(&self) -> bool {
        self.test_control_flag(EntityControlFlags::ENABLE_LOGGING)
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.test_flag(EntityFlags::VISIBLE_IN_GAME)
    }

    /// True once a limited lifetime has run out.
    #[must_use]
    pub fn has_expired(&self) -> bool {
        self.test_flag(EntityFlags::LIMIT_LIFETIME) && self.current_time >= self.lifetime
    }

    #[must_use]
    pub fn state_controller(&self) -> Option<&EntityStateController> {
        self.state_controller.as_ref()
    }

    pub fn state_controller_mut(&mut self) -> Option<&mut EntityStateController> {
        self.state_controller.as_mut()
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Advance the entity by `dt` seconds. Fired timers, posted events and
    /// state controller actions are appended to `events`.
    pub fn update(&mut self, dt: f32, events: &mut Vec<EntityEvent>) {
        self.current_time += dt;
        self.finished_animation = None;

        if let Some(remaining) = &mut self.die_in {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.die_in = None;
                self.control_flags.insert(EntityControlFlags::KILLED);
                if self.is_logging_enabled() {
                    log::debug!("Entity lifetime countdown ran out. [entity='{}']", self.name);
                }
            }
        }

        self.timers.retain_mut(|timer| {
            timer.remaining -= dt;
            if timer.remaining > 0.0 {
                return true;
            }
            events.push(EntityEvent::Timer(TimerEvent {
                name: std::mem::take(&mut timer.name),
                jitter: -timer.remaining,
            }));
            false
        });
        events.extend(self.events.drain(..).map(EntityEvent::Posted));

        if let Some(controller) = &mut self.state_controller {
            let mut actions = Vec::new();
            controller.update(dt, &mut actions);
            events.extend(actions.into_iter().map(EntityEvent::State));
        }

        for (_, node) in self.nodes.iter_mut() {
            node.update(dt);
        }

        let logging = self.is_logging_enabled();
        let Some(animation) = &mut self.current_animation else {
            if let Some(next) = self.animation_queue.pop_front() {
                if logging {
                    log::debug!(
                        "Starting queued entity animation. [entity='{}', animation='{}']",
                        self.name,
                        next.class_name()
                    );
                }
                self.current_animation = Some(next);
            }
            return;
        };

        animation.update(dt);
        for (_, node) in self.nodes.iter_mut() {
            animation.apply(node);
        }
        if !animation.is_complete() {
            return;
        }

        if animation.is_looping() {
            animation.restart();
            // top level nodes keep the placement the loop left them in
            for (key, node) in self.nodes.iter_mut() {
                if !self.render_tree.has_parent(key) {
                    continue;
                }
                let class = *node.class().transform();
                node.set_translation(class.translation);
                node.set_rotation(class.rotation);
                node.set_scale(class.scale);
            }
            return;
        }
        if logging {
            log::debug!(
                "Entity animation is complete. [entity='{}', animation='{}']",
                self.name,
                animation.class_name()
            );
        }
        self.finished_animation = self.current_animation.take();
    }

    // ========================================================================
    // Animation control
    // ========================================================================

    /// Play `animation` right away, replacing any current animation.
    pub fn play_animation(&mut self, animation: Animation) -> &mut Animation {
        self.current_animation.insert(animation)
    }

    pub fn play_animation_class(&mut self, class: Arc<AnimationClass>) -> &mut Animation {
        self.play_animation(Animation::new(class))
    }

    pub fn play_animation_by_name(&mut self, name: &str) -> Option<&mut Animation> {
        let class = Arc::clone(self.class.find_animation_by_name(name)?);
        Some(self.play_animation_class(class))
    }

    pub fn play_animation_by_id(&mut self, id: &str) -> Option<&mut Animation> {
        let class = Arc::clone(self.class.find_animation_by_id(id)?);
        Some(self.play_animation_class(class))
    }

    /// Play the idle animation unless something is already playing.
    pub fn play_idle(&mut self) -> Option<&mut Animation> {
        if self.current_animation.is_some() {
            return None;
        }
        let id = if self.idle_track_id.is_empty() {
            self.class.idle_track_id().to_owned()
        } else {
            self.idle_track_id.clone()
        };
        if id.is_empty() {
            return None;
        }
        self.play_animation_by_id(&id)
    }

    /// Play `animation` once the current and previously queued ones are done.
    pub fn queue_animation(&mut self, animation: Animation) {
        self.animation_queue.push_back(animation);
    }

    #[must_use]
    pub fn num_queued_animations(&self) -> usize {
        self.animation_queue.len()
    }

    /// Cancel the current animation where it is. Pending animators don't run
    /// their finish step; use [`Entity::finish_animation`] for that.
    pub fn stop_animation(&mut self) {
        self.current_animation = None;
    }

    /// Jump the current animation to its end state and move it to the
    /// finished slot.
    pub fn finish_animation(&mut self) {
        let Some(mut animation) = self.current_animation.take() else {
            return;
        };
        for (_, node) in self.nodes.iter_mut() {
            animation.finish(node);
        }
        self.finished_animation = Some(animation);
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.current_animation.is_some()
    }

    /// True during the update in which the current animation completed.
    #[must_use]
    pub fn did_finish_animation(&self) -> bool {
        self.finished_animation.is_some()
    }

    #[must_use]
    pub fn current_animation(&self) -> Option<&Animation> {
        self.current_animation.as_ref()
    }

    pub fn current_animation_mut(&mut self) -> Option<&mut Animation> {
        self.current_animation.as_mut()
    }

    #[must_use]
    pub fn finished_animation(&self) -> Option<&Animation> {
        self.finished_animation.as_ref()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Ask the scene to kill this entity on its next update.
    pub fn die(&mut self) {
        self.control_flags.insert(EntityControlFlags::WANTS_TO_DIE);
    }

    /// Kill the entity after `seconds` of updates.
    pub fn die_in(&mut self, seconds: f32) {
        self.die_in = Some(seconds);
    }

    /// Fire a timer event named `name` after `seconds`.
    pub fn set_timer(&mut self, name: impl Into<String>, seconds: f32) {
        self.timers.push(Timer {
            name: name.into(),
            remaining: seconds,
        });
    }

    /// Queue an event that is reported by the next update.
    pub fn post_event(&mut self, event: PostedEvent) {
        self.events.push(event);
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn node(&self, key: NodeKey) -> &Node {
        &self.nodes[key]
    }

    pub fn node_mut(&mut self, key: NodeKey) -> &mut Node {
        &mut self.nodes[key]
    }

    #[must_use]
    pub fn node_at(&self, index: usize) -> &Node {
        self.nodes.at(index)
    }

    #[must_use]
    pub fn node_key(&self, index: usize) -> NodeKey {
        self.nodes.key_at(index)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &Node)> + '_ {
        self.nodes.iter()
    }

    #[must_use]
    pub fn render_tree(&self) -> &RenderTree<NodeKey> {
        &self.render_tree
    }

    #[must_use]
    pub fn find_node_by_class_id(&self, id: &str) -> Option<NodeKey> {
        self.nodes.find(|n| n.class_id() == id)
    }

    #[must_use]
    pub fn find_node_by_class_name(&self, name: &str) -> Option<NodeKey> {
        self.nodes.find(|n| n.class_name() == name)
    }

    #[must_use]
    pub fn find_node_by_instance_id(&self, id: &str) -> Option<NodeKey> {
        self.nodes.find(|n| n.id() == id)
    }

    #[must_use]
    pub fn find_node_by_instance_name(&self, name: &str) -> Option<NodeKey> {
        self.nodes.find(|n| n.name() == name)
    }

    #[must_use]
    pub fn find_node_parent(&self, key: NodeKey) -> Option<NodeKey> {
        if self.render_tree.has_node(key) {
            self.render_tree.get_parent(key)
        } else {
            None
        }
    }

    pub fn link_child(&mut self, parent: Option<NodeKey>, child: NodeKey) {
        self.render_tree.link_child(parent, child);
    }

    pub fn break_child(&mut self, child: NodeKey, retain_world_transform: bool) {
        treeop::break_child(&mut self.render_tree, &mut self.nodes, child, retain_world_transform);
    }

    pub fn reparent_child(
        &mut self,
        parent: Option<NodeKey>,
        child: NodeKey,
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

    /// Delete the node and its subtree from this instance.
    pub fn delete_node(&mut self, key: NodeKey) {
        treeop::delete_node(&mut self.render_tree, &mut self.nodes, key);
    }

    // ========================================================================
    // Spatial queries
    // ========================================================================

    /// Node to entity transform.
    #[must_use]
    pub fn find_node_transform(&self, key: NodeKey) -> Mat4 {
        treeop::find_node_transform(&self.render_tree, &self.nodes, key)
    }

    #[must_use]
    pub fn find_node_model_transform(&self, key: NodeKey) -> Mat4 {
        treeop::find_node_model_transform(&self.render_tree, &self.nodes, key)
    }

    #[must_use]
    pub fn find_relative_transform(&self, parent: NodeKey, child: NodeKey) -> Mat4 {
        treeop::find_relative_transform(&self.render_tree, &self.nodes, parent, child)
    }

    #[must_use]
    pub fn coarse_hit_test(&self, point: Vec2) -> Vec<NodeHit<NodeKey>> {
        treeop::coarse_hit_test(&self.render_tree, &self.nodes, point)
    }

    #[must_use]
    pub fn map_coords_from_node_box(&self, point: Vec2, key: NodeKey) -> Vec2 {
        treeop::map_coords_from_node_box(&self.render_tree, &self.nodes, point, key)
    }

    #[must_use]
    pub fn map_coords_to_node_box(&self, point: Vec2, key: NodeKey) -> Vec2 {
        treeop::map_coords_to_node_box(&self.render_tree, &self.nodes, point, key)
    }

    #[must_use]
    pub fn find_node_bounding_box(&self, key: NodeKey) -> OrientedBox {
        treeop::find_node_bounding_box(&self.render_tree, &self.nodes, key)
    }

    #[must_use]
    pub fn find_node_bounding_rect(&self, key: NodeKey) -> Rect {
        treeop::find_node_bounding_rect(&self.render_tree, &self.nodes, key)
    }

    #[must_use]
    pub fn bounding_rect(&self) -> Rect {
        treeop::find_bounding_rect(&self.render_tree, &self.nodes)
    }

    // ========================================================================
    // Script variables
    // ========================================================================

    /// Instance variables first, then the class ones.
    #[must_use]
    pub fn find_script_var_by_name(&self, name: &str) -> Option<&ScriptVar> {
        self.script_vars
            .iter()
            .find(|v| v.name() == name)
            .or_else(|| self.class.find_script_var_by_name(name))
    }

    #[must_use]
    pub fn find_script_var_by_id(&self, id: &str) -> Option<&ScriptVar> {
        self.script_vars
            .iter()
            .find(|v| v.id() == id)
            .or_else(|| self.class.find_script_var_by_id(id))
    }

    pub fn script_var(&self, name: &str) -> Result<&ScriptValue> {
        self.find_script_var_by_name(name)
            .map(ScriptVar::value)
            .ok_or_else(|| StrataError::NoSuchVariable(name.to_owned()))
    }

    /// Write a writable variable. Returns false, with a warning, when the
    /// variable is missing, read-only or holds another type.
    pub fn set_script_var(&mut self, name: &str, value: impl Into<ScriptValue>) -> bool {
        script_var::assign(&mut self.script_vars, &self.name, name, value.into())
    }
}
