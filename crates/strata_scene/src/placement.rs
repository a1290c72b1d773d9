//! Entity placements: the nodes of a scene class.
//!
//! A placement names an entity class and where to spawn it. Everything the
//! placement leaves unset falls back to the entity class, flags included:
//! `flag_set_bits` records which flags the placement overrides and
//! `flag_val_bits` their values.

use std::sync::Arc;

use glam::{Mat4, Vec2};
use serde_json::{Map, Value};
use strata_core::hash::hash_combine;
use strata_core::json::{read, read_array, read_or, read_str, to_json};
use strata_core::transform::node_matrix;
use strata_core::{Result, TreeNode, new_id};

use crate::entity::{EntityArgs, ScriptVarValue};
use crate::entity_class::{EntityClass, EntityFlags};

#[derive(Debug, Clone)]
pub struct EntityPlacement {
    id: String,
    name: String,
    entity_class_id: String,
    entity_class: Option<Arc<EntityClass>>,
    translation: Vec2,
    scale: Vec2,
    rotation: f32,
    /// Class id of the node in the parent placement's entity that this
    /// placement is attached to.
    parent_render_tree_node: String,
    layer: i32,
    idle_animation_id: Option<String>,
    lifetime: Option<f32>,
    tag: Option<String>,
    flag_set_bits: u32,
    flag_val_bits: u32,
    script_var_values: Vec<ScriptVarValue>,
}

impl Default for EntityPlacement {
    fn default() -> Self {
        Self::with_id(new_id())
    }
}

impl EntityPlacement {
    #[must_use]
    pub fn new(name: impl Into<String>, class: Arc<EntityClass>) -> Self {
        let mut placement = Self::default();
        placement.name = name.into();
        placement.set_entity(class);
        placement
    }

    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            entity_class_id: String::new(),
            entity_class: None,
            translation: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
            parent_render_tree_node: String::new(),
            layer: 0,
            idle_animation_id: None,
            lifetime: None,
            tag: None,
            flag_set_bits: 0,
            flag_val_bits: 0,
            script_var_values: Vec::new(),
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
    // Entity class
    // ========================================================================

    #[must_use]
    pub fn entity_class_id(&self) -> &str {
        &self.entity_class_id
    }

    /// Resolved class, `None` until resolved or when the class is missing.
    #[must_use]
    pub fn entity_class(&self) -> Option<&Arc<EntityClass>> {
        self.entity_class.as_ref()
    }

    /// Point the placement at another entity class. Settings that refer to
    /// the previous class (idle animation, parent node, variable values) are
    /// cleared.
    pub fn set_entity(&mut self, class: Arc<EntityClass>) {
        if self.entity_class_id != class.id() {
            self.idle_animation_id = None;
            self.parent_render_tree_node.clear();
            self.script_var_values.clear();
        }
        self.entity_class_id = class.id().to_owned();
        self.entity_class = Some(class);
    }

    /// Refer to a class by id only; resolve it later.
    pub fn set_entity_id(&mut self, id: impl Into<String>) {
        self.entity_class_id = id.into();
        self.entity_class = None;
    }

    pub(crate) fn resolve(&mut self, class: Option<Arc<EntityClass>>) {
        self.entity_class = class;
    }

    /// True when the entity class could not be resolved.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.entity_class.is_none()
    }

    // ========================================================================
    // Placement
    // ========================================================================

    #[must_use]
    pub fn translation(&self) -> Vec2 {
        self.translation
    }

    pub fn set_translation(&mut self, translation: Vec2) {
        self.translation = translation;
    }

    #[must_use]
    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
    }

    #[must_use]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    #[must_use]
    pub fn parent_render_tree_node(&self) -> &str {
        &self.parent_render_tree_node
    }

    pub fn set_parent_render_tree_node(&mut self, node_class_id: impl Into<String>) {
        self.parent_render_tree_node = node_class_id.into();
    }

    #[must_use]
    pub fn layer(&self) -> i32 {
        self.layer
    }

    pub fn set_layer(&mut self, layer: i32) {
        self.layer = layer;
    }

    // ========================================================================
    // Overrides
    // ========================================================================

    #[must_use]
    pub fn idle_animation_id(&self) -> Option<&str> {
        self.idle_animation_id.as_deref()
    }

    pub fn set_idle_animation_id(&mut self, id: Option<String>) {
        self.idle_animation_id = id;
    }

    #[must_use]
    pub fn lifetime(&self) -> Option<f32> {
        self.lifetime
    }

    pub fn set_lifetime(&mut self, lifetime: Option<f32>) {
        self.lifetime = lifetime;
    }

    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn set_tag(&mut self, tag: Option<String>) {
        self.tag = tag;
    }

    /// Override an entity flag for this placement.
    pub fn set_flag(&mut self, flag: EntityFlags, on: bool) {
        self.flag_set_bits |= flag.bits();
        if on {
            self.flag_val_bits |= flag.bits();
        } else {
            self.flag_val_bits &= !flag.bits();
        }
    }

    /// Go back to the class value of the flag.
    pub fn clear_flag(&mut self, flag: EntityFlags) {
        self.flag_set_bits &= !flag.bits();
        self.flag_val_bits &= !flag.bits();
    }

    #[must_use]
    pub fn has_flag_setting(&self, flag: EntityFlags) -> bool {
        self.flag_set_bits & flag.bits() == flag.bits()
    }

    /// The overridden flag value, `None` when the class value applies.
    #[must_use]
    pub fn flag(&self, flag: EntityFlags) -> Option<bool> {
        self.has_flag_setting(flag)
            .then(|| self.flag_val_bits & flag.bits() == flag.bits())
    }

    pub fn set_script_var_value(&mut self, value: ScriptVarValue) {
        match self.script_var_values.iter_mut().find(|v| v.id == value.id) {
            Some(existing) => existing.value = value.value,
            None => self.script_var_values.push(value),
        }
    }

    pub fn delete_script_var_value(&mut self, id: &str) {
        self.script_var_values.retain(|v| v.id != id);
    }

    #[must_use]
    pub fn script_var_values(&self) -> &[ScriptVarValue] {
        &self.script_var_values
    }

    /// Spawn arguments for the entity, `None` when the placement is broken.
    #[must_use]
    pub fn entity_args(&self) -> Option<EntityArgs> {
        let class = self.entity_class.as_ref()?;
        let mut args = EntityArgs::new(Arc::clone(class));
        args.id = self.id.clone();
        args.name = self.name.clone();
        args.position = self.translation;
        args.scale = self.scale;
        args.rotation = self.rotation;
        args.script_vars = self.script_var_values.clone();
        Some(args)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = hash_combine(0, &self.id);
        hash = hash_combine(hash, &self.entity_class_id);
        hash = hash_combine(hash, &self.name);
        hash = hash_combine(hash, &self.translation);
        hash = hash_combine(hash, &self.scale);
        hash = hash_combine(hash, &self.rotation);
        hash = hash_combine(hash, &self.flag_val_bits);
        hash = hash_combine(hash, &self.flag_set_bits);
        hash = hash_combine(hash, &self.layer);
        hash = hash_combine(hash, &self.parent_render_tree_node);
        hash = hash_combine(hash, &self.idle_animation_id);
        hash = hash_combine(hash, &self.lifetime);
        hash = hash_combine(hash, &self.tag);
        for value in &self.script_var_values {
            hash = hash_combine(hash, &value.id);
            hash = hash_combine(hash, &value.value);
        }
        hash
    }

    #[must_use]
    pub fn into_json(&self) -> Value {
        let mut chunk = Map::new();
        chunk.insert("id".into(), Value::String(self.id.clone()));
        chunk.insert("entity".into(), Value::String(self.entity_class_id.clone()));
        chunk.insert("name".into(), Value::String(self.name.clone()));
        chunk.insert("position".into(), to_json(&self.translation));
        chunk.insert("scale".into(), to_json(&self.scale));
        chunk.insert("rotation".into(), to_json(&self.rotation));
        chunk.insert("flag_val_bits".into(), to_json(&self.flag_val_bits));
        chunk.insert("flag_set_bits".into(), to_json(&self.flag_set_bits));
        chunk.insert("render_layer".into(), to_json(&self.layer));
        chunk.insert(
            "parent_render_tree_node".into(),
            Value::String(self.parent_render_tree_node.clone()),
        );
        if let Some(idle) = &self.idle_animation_id {
            chunk.insert("idle_animation_id".into(), Value::String(idle.clone()));
        }
        if let Some(lifetime) = self.lifetime {
            chunk.insert("lifetime".into(), to_json(&lifetime));
        }
        if let Some(tag) = &self.tag {
            chunk.insert("tag".into(), Value::String(tag.clone()));
        }
        let values = self
            .script_var_values
            .iter()
            .map(|v| {
                serde_json::json!({
                    "id": v.id,
                    "value": to_json(&v.value),
                })
            })
            .collect();
        chunk.insert("values".into(), Value::Array(values));
        Value::Object(chunk)
    }

    /// Load a placement. The entity class is left unresolved.
    pub fn from_json(value: &Value) -> Result<Self> {
        const CONTEXT: &str = "entity placement";
        let mut placement = Self::with_id(read_str(value, CONTEXT, "id")?);
        placement.entity_class_id = read_str(value, CONTEXT, "entity")?.to_owned();
        placement.name = read_or(value, CONTEXT, "name", String::new())?;
        placement.translation = read_or(value, CONTEXT, "position", Vec2::ZERO)?;
        placement.scale = read_or(value, CONTEXT, "scale", Vec2::ONE)?;
        placement.rotation = read_or(value, CONTEXT, "rotation", 0.0)?;
        placement.flag_val_bits = read_or(value, CONTEXT, "flag_val_bits", 0)?;
        placement.flag_set_bits = read_or(value, CONTEXT, "flag_set_bits", 0)?;
        placement.layer = read_or(value, CONTEXT, "render_layer", 0)?;
        placement.parent_render_tree_node =
            read_or(value, CONTEXT, "parent_render_tree_node", String::new())?;
        placement.idle_animation_id = read_or(value, CONTEXT, "idle_animation_id", None)?;
        placement.lifetime = read_or(value, CONTEXT, "lifetime", None)?;
        placement.tag = read_or(value, CONTEXT, "tag", None)?;
        for chunk in read_array(value, "values") {
            placement.script_var_values.push(ScriptVarValue {
                id: read_str(chunk, CONTEXT, "id")?.to_owned(),
                value: read(chunk, CONTEXT, "value")?,
            });
        }
        Ok(placement)
    }
}

impl TreeNode for EntityPlacement {
    fn node_transform(&self) -> Mat4 {
        node_matrix(self.translation, self.rotation, self.scale)
    }
    fn size(&self) -> Vec2 {
        Vec2::ONE
    }
    fn set_translation(&mut self, translation: Vec2) {
        self.translation = translation;
    }
    fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }
    fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn set_name(&mut self, name: String) {
        self.name = name;
    }
    fn clone_with_new_id(&self) -> Self {
        let mut copy = self.clone();
        copy.id = new_id();
        copy
    }
}
