//! Scene instances.
//!
//! A [`Scene`] spawns an entity per resolved placement of its class and
//! keeps them in a second level render tree. An entity linked under another
//! entity is attached to one of that entity's nodes, so its scene transform
//! is the chain of attachment node transforms from the root down.
//!
//! Spawning and killing is deferred to the loop boundaries:
//!
//! ```rust,ignore
//! scene.begin_loop();     // apply kills and spawns requested last loop
//! scene.update(dt, &mut events);
//! scene.end_loop();       // prune killed entities
//! ```

use std::sync::Arc;

use glam::{Mat4, Vec2};
use rustc_hash::{FxHashMap, FxHashSet};
use strata_core::transform::{TransformStack, transform_point};
use strata_core::{NodeArena, OrientedBox, Rect, RenderTree, Result, StrataError};

use crate::entity::{Entity, EntityArgs, EntityControlFlags, EntityEvent};
use crate::entity_class::EntityFlags;
use crate::scene_class::SceneClass;
use crate::script_var::{self, ScriptValue, ScriptVar};
use crate::{EntityKey, NodeKey};

/// An event raised by an entity during [`Scene::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEvent {
    pub entity: EntityKey,
    pub event: EntityEvent,
}

/// An entity node with its node to scene transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneNode {
    pub entity: EntityKey,
    pub node: NodeKey,
    pub node_to_scene: Mat4,
}

#[derive(Debug)]
pub struct Scene {
    class: Arc<SceneClass>,
    entities: NodeArena<EntityKey, Entity>,
    render_tree: RenderTree<EntityKey>,
    ids: FxHashMap<String, EntityKey>,
    names: FxHashMap<String, EntityKey>,
    spawn_list: Vec<(Entity, bool)>,
    kill_list: Vec<EntityKey>,
    script_vars: Vec<ScriptVar>,
    current_time: f64,
}

impl Scene {
    /// Spawn the placements of `class`. Broken placements are skipped with a
    /// warning and their children attach to the nearest spawned ancestor.
    #[must_use]
    pub fn new(class: Arc<SceneClass>) -> Self {
        let mut entities = NodeArena::new();
        let mut ids = FxHashMap::default();
        let mut names = FxHashMap::default();
        let mut spawned = FxHashMap::default();

        for (key, placement) in class.nodes() {
            let Some(args) = placement.entity_args() else {
                log::warn!(
                    "Skipping broken entity placement. [scene='{}', placement='{}', class='{}']",
                    class.name(),
                    placement.name(),
                    placement.entity_class_id()
                );
                continue;
            };
            let mut entity = Entity::new(args);
            entity.set_parent_node_class_id(placement.parent_render_tree_node());
            entity.set_layer(placement.layer());
            if let Some(idle) = placement.idle_animation_id() {
                entity.set_idle_track_id(idle);
            }
            if let Some(lifetime) = placement.lifetime() {
                entity.set_lifetime(lifetime);
            }
            if let Some(tag) = placement.tag() {
                entity.set_tag(tag);
            }
            for flag in EntityFlags::all().iter() {
                if let Some(on) = placement.flag(flag) {
                    entity.set_flag(flag, on);
                }
            }
            let id = entity.id().to_owned();
            let name = entity.name().to_owned();
            let entity_key = entities.insert(entity);
            ids.insert(id, entity_key);
            names.insert(name, entity_key);
            spawned.insert(key, entity_key);
        }

        let mut render_tree = RenderTree::new();
        let class_tree = class.render_tree();
        class_tree.pre_order_traverse_for_each(
            |key| {
                let Some(child) = spawned.get(&key) else {
                    return;
                };
                let parent = class_tree
                    .path_to_root(key)
                    .into_iter()
                    .skip(1)
                    .find_map(|ancestor| spawned.get(&ancestor).copied());
                render_tree.link_child(parent, *child);
            },
            None,
        );
        // placements outside the class tree go under the root
        for (key, _) in class.nodes() {
            if let Some(entity_key) = spawned.get(&key) {
                if !render_tree.has_node(*entity_key) {
                    render_tree.link_child(None, *entity_key);
                }
            }
        }

        let script_vars = class
            .script_vars()
            .iter()
            .filter(|v| !v.is_read_only())
            .cloned()
            .collect();

        Self {
            class,
            entities,
            render_tree,
            ids,
            names,
            spawn_list: Vec::new(),
            kill_list: Vec::new(),
            script_vars,
            current_time: 0.0,
        }
    }

    #[must_use]
    pub fn class(&self) -> &SceneClass {
        &self.class
    }

    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    // ========================================================================
    // Entities
    // ========================================================================

    #[must_use]
    pub fn num_entities(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn entity(&self, key: EntityKey) -> &Entity {
        &self.entities[key]
    }

    pub fn entity_mut(&mut self, key: EntityKey) -> &mut Entity {
        &mut self.entities[key]
    }

    #[must_use]
    pub fn entity_key(&self, index: usize) -> EntityKey {
        self.entities.key_at(index)
    }

    /// Entities in spawn order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityKey, &Entity)> + '_ {
        self.entities.iter()
    }

    #[must_use]
    pub fn render_tree(&self) -> &RenderTree<EntityKey> {
        &self.render_tree
    }

    #[must_use]
    pub fn find_entity_by_instance_id(&self, id: &str) -> Option<EntityKey> {
        self.ids.get(id).copied()
    }

    #[must_use]
    pub fn find_entity_by_instance_name(&self, name: &str) -> Option<EntityKey> {
        self.names.get(name).copied()
    }

    #[must_use]
    pub fn find_entity_parent(&self, key: EntityKey) -> Option<EntityKey> {
        if self.render_tree.has_node(key) {
            self.render_tree.get_parent(key)
        } else {
            None
        }
    }

    /// Kill the entity (and the entities linked under it) at the next
    /// [`Scene::begin_loop`].
    pub fn kill_entity(&mut self, key: EntityKey) {
        self.kill_list.push(key);
    }

    /// Spawn an entity at the next [`Scene::begin_loop`]. The instance id
    /// must be unique in the scene.
    pub fn spawn_entity(&mut self, args: EntityArgs, link_to_root: bool) -> &mut Entity {
        let entity = Entity::new(args);
        assert!(
            !self.ids.contains_key(entity.id())
                && !self.spawn_list.iter().any(|(e, _)| e.id() == entity.id()),
            "entity instance id is not unique"
        );
        self.spawn_list.push((entity, link_to_root));
        let last = self.spawn_list.len() - 1;
        &mut self.spawn_list[last].0
    }

    /// Link a spawned entity into the scene tree. Entities spawned without
    /// `link_to_root` stay out of traversals until they are linked here.
    pub fn link_child(&mut self, parent: Option<EntityKey>, child: EntityKey) {
        self.render_tree.link_child(parent, child);
    }

    /// Detach `child` and the entities linked under it from the scene tree.
    pub fn break_child(&mut self, child: EntityKey) {
        self.render_tree.break_child(child);
    }

    pub fn reparent_child(&mut self, parent: Option<EntityKey>, child: EntityKey) {
        self.render_tree.reparent_child(parent, child);
    }

    /// Start a new loop: raise `KILLED` on entities to be killed (and their
    /// descendants) and move pending spawns into the scene with `SPAWNED`.
    pub fn begin_loop(&mut self) {
        for key in std::mem::take(&mut self.kill_list) {
            if !self.entities.contains(key) {
                continue;
            }
            let doomed = if self.render_tree.has_node(key) {
                self.render_tree.collect_subtree(key)
            } else {
                vec![key]
            };
            for doomed_key in doomed {
                let entity = &mut self.entities[doomed_key];
                entity.set_control_flag(EntityControlFlags::KILLED, true);
                if entity.is_logging_enabled() {
                    log::debug!(
                        "Entity was killed. [entity='{}', class='{}']",
                        entity.name(),
                        entity.class_name()
                    );
                }
            }
        }

        for (mut entity, link_to_root) in std::mem::take(&mut self.spawn_list) {
            entity.set_control_flag(EntityControlFlags::SPAWNED, true);
            if entity.is_logging_enabled() {
                log::debug!(
                    "Entity was spawned. [entity='{}', class='{}']",
                    entity.name(),
                    entity.class_name()
                );
            }
            let id = entity.id().to_owned();
            let name = entity.name().to_owned();
            let key = self.entities.insert(entity);
            self.ids.insert(id, key);
            self.names.insert(name, key);
            if link_to_root {
                self.render_tree.link_child(None, key);
            }
        }
    }

    /// End the loop: clear `SPAWNED` and delete every killed entity together
    /// with the entities linked under it.
    pub fn end_loop(&mut self) {
        let mut graveyard = FxHashSet::default();
        for (key, entity) in self.entities.iter_mut() {
            entity.set_control_flag(EntityControlFlags::SPAWNED, false);
            if entity.has_been_killed() {
                graveyard.insert(key);
            }
        }
        if graveyard.is_empty() {
            return;
        }
        for key in graveyard.clone() {
            if self.render_tree.has_node(key) {
                graveyard.extend(self.render_tree.collect_subtree(key));
            }
        }
        for key in &graveyard {
            if self.render_tree.has_node(*key) {
                self.render_tree.delete_node(*key);
            }
        }
        let ids = &mut self.ids;
        let names = &mut self.names;
        self.entities.retain(|key, entity| {
            if !graveyard.contains(&key) {
                return true;
            }
            ids.remove(entity.id());
            if names.get(entity.name()) == Some(&key) {
                names.remove(entity.name());
            }
            false
        });
    }

    /// Update every entity. Expired entities that die at the end of their
    /// lifetime are killed, entities that asked to die are scheduled for the
    /// next loop and idle entities start their idle animation.
    pub fn update(&mut self, dt: f32, events: &mut Vec<SceneEvent>) {
        self.current_time += f64::from(dt);

        let mut entity_events = Vec::new();
        for (key, entity) in self.entities.iter_mut() {
            entity.update(dt, &mut entity_events);
            events.extend(
                entity_events
                    .drain(..)
                    .map(|event| SceneEvent { entity: key, event }),
            );

            if entity.wants_to_die() {
                entity.set_control_flag(EntityControlFlags::WANTS_TO_DIE, false);
                self.kill_list.push(key);
            }
            if entity.has_expired() {
                if entity.test_flag(EntityFlags::KILL_AT_LIFETIME) {
                    entity.set_control_flag(EntityControlFlags::KILLED, true);
                }
                continue;
            }
            if !entity.is_animating() && entity.has_idle_track() {
                entity.play_idle();
            }
        }
    }

    // ========================================================================
    // Transforms
    // ========================================================================

    fn entity_transform_stack(&self, key: EntityKey) -> TransformStack {
        let mut stack = TransformStack::new();
        if !self.render_tree.has_node(key) {
            return stack;
        }
        let path = self.render_tree.path_to_root(key);
        // pairs of (parent, child) from the root down
        for pair in path.windows(2).rev() {
            let (child, parent) = (&self.entities[pair[0]], &self.entities[pair[1]]);
            match parent.find_node_by_class_id(child.parent_node_class_id()) {
                Some(node) => stack.push(parent.find_node_transform(node)),
                None => log::warn!(
                    "Entity parent node was not found. [entity='{}', parent='{}', node='{}']",
                    child.name(),
                    parent.name(),
                    child.parent_node_class_id()
                ),
            }
        }
        stack
    }

    /// Entity to scene transform.
    #[must_use]
    pub fn find_entity_transform(&self, key: EntityKey) -> Mat4 {
        self.entity_transform_stack(key).matrix()
    }

    /// Node to scene transform.
    #[must_use]
    pub fn find_entity_node_transform(&self, key: EntityKey, node: NodeKey) -> Mat4 {
        self.find_entity_transform(key) * self.entities[key].find_node_transform(node)
    }

    #[must_use]
    pub fn find_entity_node_bounding_box(&self, key: EntityKey, node: NodeKey) -> OrientedBox {
        let mat = self.find_entity_transform(key) * self.entities[key].find_node_model_transform(node);
        OrientedBox::from_matrix(&mat)
    }

    #[must_use]
    pub fn find_entity_node_bounding_rect(&self, key: EntityKey, node: NodeKey) -> Rect {
        let mat = self.find_entity_transform(key) * self.entities[key].find_node_model_transform(node);
        Rect::bounding_rect(&mat)
    }

    /// Union of the scene space bounding rects of the entity's nodes.
    #[must_use]
    pub fn find_entity_bounding_rect(&self, key: EntityKey) -> Rect {
        let base = self.find_entity_transform(key);
        let entity = &self.entities[key];
        entity.nodes().fold(Rect::default(), |rect, (node, _)| {
            rect.union(&Rect::bounding_rect(&(base * entity.find_node_model_transform(node))))
        })
    }

    /// Map a point in an entity node's box to scene space.
    #[must_use]
    pub fn map_coords_from_entity_node_box(
        &self,
        key: EntityKey,
        node: NodeKey,
        point: Vec2,
    ) -> Vec2 {
        let local = self.entities[key].map_coords_from_node_box(point, node);
        transform_point(&self.find_entity_transform(key), local)
    }

    /// Every entity node in render tree order with its node to scene
    /// transform.
    #[must_use]
    pub fn collect_nodes(&self) -> Vec<SceneNode> {
        let mut nodes = Vec::new();
        self.render_tree.pre_order_traverse_for_each(
            |key| {
                let base = self.find_entity_transform(key);
                let entity = &self.entities[key];
                entity.render_tree().pre_order_traverse_for_each(
                    |node| {
                        nodes.push(SceneNode {
                            entity: key,
                            node,
                            node_to_scene: base * entity.find_node_transform(node),
                        });
                    },
                    None,
                );
            },
            None,
        );
        nodes
    }

    // ========================================================================
    // Script variables
    // ========================================================================

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

    pub fn set_script_var(&mut self, name: &str, value: impl Into<ScriptValue>) -> bool {
        script_var::assign(&mut self.script_vars, self.class.name(), name, value.into())
    }
}
