//! Scene classes: entity placements arranged in a render tree.
//!
//! A placement can be linked under another placement, in which case the
//! spawned entity follows the node of the parent entity named by
//! [`EntityPlacement::parent_render_tree_node`].

use std::sync::Arc;

use glam::Mat4;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use strata_core::hash::hash_combine;
use strata_core::json::{read_array, read_or, read_str};
use strata_core::tree::{tree_node_from_json, tree_node_to_json};
use strata_core::{NodeArena, RenderTree, Result, new_id, treeop};

use crate::PlacementKey;
use crate::entity_class::EntityClass;
use crate::placement::EntityPlacement;
use crate::script_var::ScriptVar;

#[derive(Debug, Clone)]
pub struct SceneClass {
    id: String,
    name: String,
    nodes: NodeArena<PlacementKey, EntityPlacement>,
    render_tree: RenderTree<PlacementKey>,
    script_vars: Vec<ScriptVar>,
}

impl Default for SceneClass {
    fn default() -> Self {
        Self::with_id(new_id())
    }
}

impl SceneClass {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let mut class = Self::default();
        class.name = name.into();
        class
    }

    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            nodes: NodeArena::new(),
            render_tree: RenderTree::new(),
            script_vars: Vec::new(),
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

    // ========================================================================
    // Placements
    // ========================================================================

    /// Add a placement. Like entity nodes it must be linked to take part in
    /// the hierarchy.
    pub fn add_node(&mut self, placement: EntityPlacement) -> PlacementKey {
        self.nodes.insert(placement)
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn node(&self, key: PlacementKey) -> &EntityPlacement {
        &self.nodes[key]
    }

    pub fn node_mut(&mut self, key: PlacementKey) -> &mut EntityPlacement {
        &mut self.nodes[key]
    }

    #[must_use]
    pub fn node_key(&self, index: usize) -> PlacementKey {
        self.nodes.key_at(index)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (PlacementKey, &EntityPlacement)> + '_ {
        self.nodes.iter()
    }

    #[must_use]
    pub fn find_node_by_id(&self, id: &str) -> Option<PlacementKey> {
        self.nodes.find(|n| n.id() == id)
    }

    #[must_use]
    pub fn find_node_by_name(&self, name: &str) -> Option<PlacementKey> {
        self.nodes.find(|n| n.name() == name)
    }

    #[must_use]
    pub fn render_tree(&self) -> &RenderTree<PlacementKey> {
        &self.render_tree
    }

    pub fn link_child(&mut self, parent: Option<PlacementKey>, child: PlacementKey) {
        self.render_tree.link_child(parent, child);
    }

    pub fn break_child(&mut self, child: PlacementKey, retain_world_transform: bool) {
        treeop::break_child(&mut self.render_tree, &mut self.nodes, child, retain_world_transform);
    }

    pub fn reparent_child(
        &mut self,
        parent: Option<PlacementKey>,
        child: PlacementKey,
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

    pub fn delete_node(&mut self, key: PlacementKey) {
        treeop::delete_node(&mut self.render_tree, &mut self.nodes, key);
    }

    pub fn duplicate_node(&mut self, key: PlacementKey) -> PlacementKey {
        treeop::duplicate_node(&mut self.render_tree, &mut self.nodes, key)
    }

    /// Placement to scene transform, ignoring the entity node a placement
    /// may be attached to.
    #[must_use]
    pub fn find_node_transform(&self, key: PlacementKey) -> Mat4 {
        treeop::find_node_transform(&self.render_tree, &self.nodes, key)
    }

    /// Resolve every placement's entity class through `lookup`. Returns the
    /// number of placements left broken.
    pub fn resolve_entity_classes(
        &mut self,
        lookup: impl Fn(&str) -> Option<Arc<EntityClass>>,
    ) -> usize {
        let mut broken = 0;
        for (_, placement) in self.nodes.iter_mut() {
            let class = lookup(placement.entity_class_id());
            if class.is_none() {
                log::warn!(
                    "Placement refers to an unknown entity class. [scene='{}', placement='{}', class='{}']",
                    self.name,
                    placement.name(),
                    placement.entity_class_id()
                );
                broken += 1;
            }
            placement.resolve(class);
        }
        broken
    }

    // ========================================================================
    // Script variables
    // ========================================================================

    pub fn add_script_var(&mut self, var: ScriptVar) {
        self.script_vars.push(var);
    }

    #[must_use]
    pub fn script_vars(&self) -> &[ScriptVar] {
        &self.script_vars
    }

    pub fn script_var_mut(&mut self, index: usize) -> &mut ScriptVar {
        &mut self.script_vars[index]
    }

    pub fn delete_script_var(&mut self, index: usize) {
        assert!(index < self.script_vars.len(), "script variable index out of bounds");
        self.script_vars.remove(index);
    }

    #[must_use]
    pub fn find_script_var_by_name(&self, name: &str) -> Option<&ScriptVar> {
        self.script_vars.iter().find(|v| v.name() == name)
    }

    #[must_use]
    pub fn find_script_var_by_id(&self, id: &str) -> Option<&ScriptVar> {
        self.script_vars.iter().find(|v| v.id() == id)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = hash_combine(0, &self.id);
        hash = hash_combine(hash, &self.name);
        self.render_tree.pre_order_traverse_for_each(
            |key| {
                let parent_id = self.render_tree.get_parent(key).map(|p| self.nodes[p].id());
                hash = hash_combine(hash, &parent_id);
                hash = hash_combine(hash, &self.nodes[key].hash_value());
            },
            None,
        );
        for (key, node) in self.nodes.iter() {
            if !self.render_tree.has_node(key) {
                hash = hash_combine(hash, &node.hash_value());
            }
        }
        for var in &self.script_vars {
            hash = hash_combine(hash, &var.hash_value());
        }
        hash
    }

    #[must_use]
    pub fn into_json(&self) -> Value {
        let mut chunk = Map::new();
        chunk.insert("id".into(), Value::String(self.id.clone()));
        chunk.insert("name".into(), Value::String(self.name.clone()));
        chunk.insert(
            "nodes".into(),
            Value::Array(self.nodes.values().map(EntityPlacement::into_json).collect()),
        );
        chunk.insert(
            "vars".into(),
            Value::Array(self.script_vars.iter().map(ScriptVar::into_json).collect()),
        );
        let nodes = &self.nodes;
        chunk.insert(
            "render_tree".into(),
            self.render_tree.into_json(|key| tree_node_to_json(nodes[key].id())),
        );
        Value::Object(chunk)
    }

    /// Load a scene class. Placements come back unresolved, see
    /// [`SceneClass::resolve_entity_classes`].
    pub fn from_json(value: &Value) -> Result<Self> {
        const CONTEXT: &str = "scene class";
        let mut class = Self::with_id(read_str(value, CONTEXT, "id")?);
        class.name = read_or(value, CONTEXT, "name", String::new())?;

        let mut ids = FxHashMap::default();
        for chunk in read_array(value, "nodes") {
            let placement = EntityPlacement::from_json(chunk)?;
            let id = placement.id().to_owned();
            ids.insert(id, class.nodes.insert(placement));
        }
        for chunk in read_array(value, "vars") {
            class.script_vars.push(ScriptVar::from_json(chunk)?);
        }
        if let Some(tree) = value.get("render_tree") {
            class.render_tree = RenderTree::from_json(tree, |chunk| tree_node_from_json(&ids, chunk))?;
        }
        Ok(class)
    }
}
