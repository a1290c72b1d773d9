//! Entity nodes.
//!
//! A [`NodeClass`] describes one node of an entity class: its placement
//! relative to the parent node and the optional components attached to it.
//! A [`Node`] is the per-entity instance created from it, carrying mutable
//! copies of the state that can change while the game runs.
//!
//! # Component slots
//!
//! Components are optional slots rather than subtypes:
//!
//! ```rust,ignore
//! let mut class = NodeClass::new("body");
//! class.create_drawable().material_id = "checkerboard".into();
//!
//! let node = Node::new(Arc::new(class));
//! assert!(node.has_drawable());
//! assert!(!node.has_rigid_body());
//! ```

use std::sync::Arc;

use bitflags::bitflags;
use glam::{Mat4, Vec2};
use serde_json::{Map, Value};
use strata_core::hash::hash_combine;
use strata_core::json::{read_or, read_str, to_json};
use strata_core::{Result, TreeNode, new_id};

use crate::components::{
    BasicLight, BasicLightClass, Drawable, DrawableClass, Fixture, FixtureClass, LinearMover,
    LinearMoverClass, MapNode, MapNodeClass, MeshEffect, MeshEffectClass, RigidBody,
    RigidBodyClass, SpatialNode, SpatialNodeClass, SplineMover, SplineMoverClass, TextItem,
    TextItemClass,
};
use crate::transform::NodeTransform;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NodeClassFlags: u32 {
        const VISIBLE_IN_EDITOR = 1 << 0;
        const VISIBLE_IN_GAME   = 1 << 1;
    }
}

impl Default for NodeClassFlags {
    fn default() -> Self {
        Self::VISIBLE_IN_EDITOR | Self::VISIBLE_IN_GAME
    }
}

// ============================================================================
// NodeClass
// ============================================================================

#[derive(Debug, Clone)]
pub struct NodeClass {
    id: String,
    name: String,
    tag: String,
    transform: NodeTransform,
    flags: NodeClassFlags,

    drawable: Option<Arc<DrawableClass>>,
    rigid_body: Option<Arc<RigidBodyClass>>,
    text_item: Option<Arc<TextItemClass>>,
    spatial_node: Option<Arc<SpatialNodeClass>>,
    fixture: Option<Arc<FixtureClass>>,
    map_node: Option<Arc<MapNodeClass>>,
    linear_mover: Option<Arc<LinearMoverClass>>,
    spline_mover: Option<Arc<SplineMoverClass>>,
    basic_light: Option<Arc<BasicLightClass>>,
    mesh_effect: Option<Arc<MeshEffectClass>>,
}

impl Default for NodeClass {
    fn default() -> Self {
        Self::with_id(new_id())
    }
}

impl NodeClass {
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
            tag: String::new(),
            transform: NodeTransform::default(),
            flags: NodeClassFlags::default(),
            drawable: None,
            rigid_body: None,
            text_item: None,
            spatial_node: None,
            fixture: None,
            map_node: None,
            linear_mover: None,
            spline_mover: None,
            basic_light: None,
            mesh_effect: None,
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
    pub fn transform(&self) -> &NodeTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: NodeTransform) {
        self.transform = transform;
    }

    #[must_use]
    pub fn translation(&self) -> Vec2 {
        self.transform.translation
    }
    pub fn set_translation(&mut self, translation: Vec2) {
        self.transform.translation = translation;
    }
    #[must_use]
    pub fn scale(&self) -> Vec2 {
        self.transform.scale
    }
    pub fn set_scale(&mut self, scale: Vec2) {
        self.transform.scale = scale;
    }
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.transform.size
    }
    pub fn set_size(&mut self, size: Vec2) {
        self.transform.size = size;
    }
    #[must_use]
    pub fn rotation(&self) -> f32 {
        self.transform.rotation
    }
    pub fn set_rotation(&mut self, rotation: f32) {
        self.transform.rotation = rotation;
    }

    #[must_use]
    pub fn flags(&self) -> NodeClassFlags {
        self.flags
    }

    #[must_use]
    pub fn test_flag(&self, flag: NodeClassFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: NodeClassFlags, on: bool) {
        self.flags.set(flag, on);
    }

    #[must_use]
    pub fn node_transform(&self) -> Mat4 {
        self.transform.node_matrix()
    }

    #[must_use]
    pub fn model_transform(&self) -> Mat4 {
        self.transform.model_matrix()
    }

    /// Content hash over every persisted field including components.
    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = 0;
        hash = hash_combine(hash, &self.id);
        hash = hash_combine(hash, &self.name);
        hash = hash_combine(hash, &self.tag);
        hash = self.transform.hash_value(hash);
        hash = hash_combine(hash, &self.flags.bits());
        self.hash_components(hash)
    }

    #[must_use]
    pub fn into_json(&self) -> Value {
        let mut chunk = Map::new();
        chunk.insert("id".into(), Value::String(self.id.clone()));
        chunk.insert("name".into(), Value::String(self.name.clone()));
        chunk.insert("tag".into(), Value::String(self.tag.clone()));
        chunk.insert("position".into(), to_json(&self.transform.translation));
        chunk.insert("scale".into(), to_json(&self.transform.scale));
        chunk.insert("size".into(), to_json(&self.transform.size));
        chunk.insert("rotation".into(), to_json(&self.transform.rotation));
        chunk.insert("flags".into(), to_json(&self.flags.bits()));
        self.components_into_json(&mut chunk);
        Value::Object(chunk)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        const CONTEXT: &str = "node class";
        let defaults = NodeTransform::default();
        let mut class = Self::with_id(read_str(value, CONTEXT, "id")?);
        class.name = read_or(value, CONTEXT, "name", String::new())?;
        class.tag = read_or(value, CONTEXT, "tag", String::new())?;
        class.transform = NodeTransform {
            translation: read_or(value, CONTEXT, "position", defaults.translation)?,
            scale: read_or(value, CONTEXT, "scale", defaults.scale)?,
            size: read_or(value, CONTEXT, "size", defaults.size)?,
            rotation: read_or(value, CONTEXT, "rotation", defaults.rotation)?,
        };
        let bits: u32 = read_or(value, CONTEXT, "flags", NodeClassFlags::default().bits())?;
        class.flags = NodeClassFlags::from_bits_truncate(bits);
        if class.flags.bits() != bits {
            log::warn!(
                "Ignoring unknown node class flags. [node='{}', flags={:#x}]",
                class.name,
                bits & !NodeClassFlags::all().bits()
            );
        }
        class.components_from_json(value)?;
        Ok(class)
    }
}

impl TreeNode for NodeClass {
    fn node_transform(&self) -> Mat4 {
        NodeClass::node_transform(self)
    }
    fn size(&self) -> Vec2 {
        self.transform.size
    }
    fn set_translation(&mut self, translation: Vec2) {
        NodeClass::set_translation(self, translation);
    }
    fn set_rotation(&mut self, rotation: f32) {
        NodeClass::set_rotation(self, rotation);
    }
    fn set_scale(&mut self, scale: Vec2) {
        NodeClass::set_scale(self, scale);
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

// ============================================================================
// Node
// ============================================================================

/// A node instance inside an entity.
#[derive(Debug, Clone)]
pub struct Node {
    id: String,
    name: String,
    class: Arc<NodeClass>,
    transform: NodeTransform,

    drawable: Option<Drawable>,
    rigid_body: Option<RigidBody>,
    text_item: Option<TextItem>,
    spatial_node: Option<SpatialNode>,
    fixture: Option<Fixture>,
    map_node: Option<MapNode>,
    linear_mover: Option<LinearMover>,
    spline_mover: Option<SplineMover>,
    basic_light: Option<BasicLight>,
    mesh_effect: Option<MeshEffect>,
}

impl Node {
    /// Create an instance with a fresh id, named after the class.
    #[must_use]
    pub fn new(class: Arc<NodeClass>) -> Self {
        let name = class.name.clone();
        Self::with_id(class, new_id(), name)
    }

    #[must_use]
    pub fn with_id(class: Arc<NodeClass>, id: impl Into<String>, name: impl Into<String>) -> Self {
        let mut node = Self {
            id: id.into(),
            name: name.into(),
            transform: class.transform,
            class,
            drawable: None,
            rigid_body: None,
            text_item: None,
            spatial_node: None,
            fixture: None,
            map_node: None,
            linear_mover: None,
            spline_mover: None,
            basic_light: None,
            mesh_effect: None,
        };
        node.reset_components();
        node
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
    pub fn class(&self) -> &NodeClass {
        &self.class
    }

    #[inline]
    #[must_use]
    pub fn shared_class(&self) -> &Arc<NodeClass> {
        &self.class
    }

    #[inline]
    #[must_use]
    pub fn class_id(&self) -> &str {
        &self.class.id
    }

    #[inline]
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.class.tag
    }

    #[must_use]
    pub fn is_visible_in_game(&self) -> bool {
        self.class.test_flag(NodeClassFlags::VISIBLE_IN_GAME)
    }

    #[inline]
    #[must_use]
    pub fn transform(&self) -> &NodeTransform {
        &self.transform
    }

    #[inline]
    pub fn transform_mut(&mut self) -> &mut NodeTransform {
        &mut self.transform
    }

    #[must_use]
    pub fn translation(&self) -> Vec2 {
        self.transform.translation
    }
    pub fn set_translation(&mut self, translation: Vec2) {
        self.transform.translation = translation;
    }
    #[must_use]
    pub fn scale(&self) -> Vec2 {
        self.transform.scale
    }
    pub fn set_scale(&mut self, scale: Vec2) {
        self.transform.scale = scale;
    }
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.transform.size
    }
    pub fn set_size(&mut self, size: Vec2) {
        self.transform.size = size;
    }
    #[must_use]
    pub fn rotation(&self) -> f32 {
        self.transform.rotation
    }
    pub fn set_rotation(&mut self, rotation: f32) {
        self.transform.rotation = rotation;
    }
    pub fn translate(&mut self, delta: Vec2) {
        self.transform.translate(delta);
    }
    pub fn rotate(&mut self, radians: f32) {
        self.transform.rotate(radians);
    }

    #[must_use]
    pub fn node_transform(&self) -> Mat4 {
        self.transform.node_matrix()
    }

    #[must_use]
    pub fn model_transform(&self) -> Mat4 {
        self.transform.model_matrix()
    }

    /// Restore the transform and every component to the class state.
    pub fn reset(&mut self) {
        self.transform = self.class.transform;
        self.reset_components();
    }

    /// Advance the per-tick component state: drawable clocks and movers.
    pub fn update(&mut self, dt: f32) {
        if let Some(drawable) = &mut self.drawable {
            drawable.update(dt);
        }
        if let Some(mover) = &mut self.linear_mover {
            mover.transform_node(dt, &mut self.transform);
        }
        if let Some(mover) = &mut self.spline_mover {
            mover.transform_node(dt, &mut self.transform);
        }
    }
}

impl TreeNode for Node {
    fn node_transform(&self) -> Mat4 {
        Node::node_transform(self)
    }
    fn size(&self) -> Vec2 {
        self.transform.size
    }
    fn set_translation(&mut self, translation: Vec2) {
        Node::set_translation(self, translation);
    }
    fn set_rotation(&mut self, rotation: f32) {
        Node::set_rotation(self, rotation);
    }
    fn set_scale(&mut self, scale: Vec2) {
        Node::set_scale(self, scale);
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

node_components! {
    drawable: DrawableClass => Drawable,
    rigid_body: RigidBodyClass => RigidBody,
    text_item: TextItemClass => TextItem,
    spatial_node: SpatialNodeClass => SpatialNode,
    fixture: FixtureClass => Fixture,
    map_node: MapNodeClass => MapNode,
    linear_mover: LinearMoverClass => LinearMover,
    spline_mover: SplineMoverClass => SplineMover,
    basic_light: BasicLightClass => BasicLight,
    mesh_effect: MeshEffectClass => MeshEffect,
}
