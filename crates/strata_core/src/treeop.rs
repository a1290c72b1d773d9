//! Generic algorithms over a [`RenderTree`] whose nodes live in a [`NodeArena`].
//!
//! The same functions serve entity class nodes, entity instance nodes and
//! scene placements. Anything that can report a local transform and a size
//! participates by implementing [`TreeNode`].

use std::hash::Hash;
use std::sync::Arc;

use glam::{EulerRot, Mat4, Vec2};
use rustc_hash::FxHashSet;
use slotmap::Key;

use crate::arena::NodeArena;
use crate::geometry::{OrientedBox, Rect};
use crate::transform::{TransformStack, model_matrix, transform_point};
use crate::tree::{RenderTree, TreeVisitor};

/// A node that can be placed in a render tree.
pub trait TreeNode {
    /// Local transform relative to the parent node.
    fn node_transform(&self) -> Mat4;

    /// Size of the node box.
    fn size(&self) -> Vec2;

    /// Maps the unit box onto the node box.
    fn model_transform(&self) -> Mat4 {
        model_matrix(self.size())
    }

    fn set_translation(&mut self, translation: Vec2);
    fn set_rotation(&mut self, rotation: f32);
    fn set_scale(&mut self, scale: Vec2);

    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);

    /// Copy of the node with a fresh identity.
    #[must_use]
    fn clone_with_new_id(&self) -> Self
    where
        Self: Sized;
}

impl<N: TreeNode + Clone> TreeNode for Arc<N> {
    fn node_transform(&self) -> Mat4 {
        self.as_ref().node_transform()
    }
    fn size(&self) -> Vec2 {
        self.as_ref().size()
    }
    fn model_transform(&self) -> Mat4 {
        self.as_ref().model_transform()
    }
    fn set_translation(&mut self, translation: Vec2) {
        Arc::make_mut(self).set_translation(translation);
    }
    fn set_rotation(&mut self, rotation: f32) {
        Arc::make_mut(self).set_rotation(rotation);
    }
    fn set_scale(&mut self, scale: Vec2) {
        Arc::make_mut(self).set_scale(scale);
    }
    fn name(&self) -> &str {
        self.as_ref().name()
    }
    fn set_name(&mut self, name: String) {
        Arc::make_mut(self).set_name(name);
    }
    fn clone_with_new_id(&self) -> Self {
        Arc::new(self.as_ref().clone_with_new_id())
    }
}

// ============================================================================
// Transforms
// ============================================================================

fn accumulate_path<K, N>(tree: &RenderTree<K>, nodes: &NodeArena<K, N>, node: K) -> TransformStack
where
    K: Key + Hash,
    N: TreeNode,
{
    let mut stack = TransformStack::new();
    for key in tree.path_to_root(node).into_iter().rev() {
        if let Some(n) = nodes.get(key) {
            stack.push(n.node_transform());
        }
    }
    stack
}

/// Node to world transform: the product of the local transforms from the
/// root down to and including `node`.
#[must_use]
pub fn find_node_transform<K, N>(tree: &RenderTree<K>, nodes: &NodeArena<K, N>, node: K) -> Mat4
where
    K: Key + Hash,
    N: TreeNode,
{
    accumulate_path(tree, nodes, node).matrix()
}

/// Unit box to world transform of `node`.
#[must_use]
pub fn find_node_model_transform<K, N>(
    tree: &RenderTree<K>,
    nodes: &NodeArena<K, N>,
    node: K,
) -> Mat4
where
    K: Key + Hash,
    N: TreeNode,
{
    let mut stack = accumulate_path(tree, nodes, node);
    stack.push(nodes[node].model_transform());
    stack.matrix()
}

/// Node box to world transform: like the model transform but only offset
/// by half the size, so input coordinates are in node units rather than
/// normalized.
#[must_use]
pub fn find_unscaled_node_model_transform<K, N>(
    tree: &RenderTree<K>,
    nodes: &NodeArena<K, N>,
    node: K,
) -> Mat4
where
    K: Key + Hash,
    N: TreeNode,
{
    let mut stack = accumulate_path(tree, nodes, node);
    let size = nodes[node].size();
    stack.push(Mat4::from_translation((-size * 0.5).extend(0.0)));
    stack.matrix()
}

/// Transform from the space of `child` into the space of its ancestor
/// `parent`. When `parent` is not an ancestor this is the child's world
/// transform.
#[must_use]
pub fn find_relative_transform<K, N>(
    tree: &RenderTree<K>,
    nodes: &NodeArena<K, N>,
    parent: K,
    child: K,
) -> Mat4
where
    K: Key + Hash,
    N: TreeNode,
{
    if parent == child {
        return nodes[child].node_transform();
    }
    let path = tree.path_to_root(child);
    let mut stack = TransformStack::new();
    for key in path.iter().take_while(|k| **k != parent).collect::<Vec<_>>().into_iter().rev() {
        stack.push(nodes[*key].node_transform());
    }
    stack.matrix()
}

// ============================================================================
// Topology edits that keep node state consistent
// ============================================================================

// Split a node-to-ancestor matrix back into the T * R * S parts of a
// node transform. Shear from non-uniform ancestor scale is dropped.
fn decompose_node_matrix(mat: &Mat4) -> (Vec2, f32, Vec2) {
    let (scale, rotation, translation) = mat.to_scale_rotation_translation();
    let (angle, _, _) = rotation.to_euler(EulerRot::ZYX);
    (translation.truncate(), angle, scale.truncate())
}

fn apply_node_matrix<N: TreeNode>(node: &mut N, mat: &Mat4) {
    let (translation, rotation, scale) = decompose_node_matrix(mat);
    node.set_translation(translation);
    node.set_rotation(rotation);
    node.set_scale(scale);
}

/// Detach `child` (with its subtree) from the tree. When
/// `retain_world_transform` is set the child's translation, rotation and
/// scale are rewritten to its world placement first, so relinking it at the
/// root keeps it in place.
pub fn break_child<K, N>(
    tree: &mut RenderTree<K>,
    nodes: &mut NodeArena<K, N>,
    child: K,
    retain_world_transform: bool,
) where
    K: Key + Hash,
    N: TreeNode,
{
    if retain_world_transform {
        let child_to_world = find_node_transform(tree, nodes, child);
        apply_node_matrix(&mut nodes[child], &child_to_world);
    }
    tree.break_child(child);
}

/// Move `child` under `parent`, optionally expressing the child's current
/// world placement relative to the new parent.
pub fn reparent_child<K, N>(
    tree: &mut RenderTree<K>,
    nodes: &mut NodeArena<K, N>,
    parent: Option<K>,
    child: K,
    retain_world_transform: bool,
) where
    K: Key + Hash,
    N: TreeNode,
{
    if retain_world_transform {
        let child_to_world = find_node_transform(tree, nodes, child);
        let parent_to_world =
            parent.map_or(Mat4::IDENTITY, |p| find_node_transform(tree, nodes, p));
        let child_to_parent = parent_to_world.inverse() * child_to_world;
        apply_node_matrix(&mut nodes[child], &child_to_parent);
    }
    tree.reparent_child(parent, child);
}

/// Delete `node` with its whole subtree from both the tree and the arena.
/// Returns the deleted keys.
pub fn delete_node<K, N>(tree: &mut RenderTree<K>, nodes: &mut NodeArena<K, N>, node: K) -> Vec<K>
where
    K: Key + Hash,
    N: TreeNode,
{
    let mut graveyard = Vec::new();
    if tree.has_node(node) {
        tree.pre_order_traverse_for_each(|k| graveyard.push(k), Some(node));
        tree.delete_node(node);
    } else {
        graveyard.push(node);
    }
    let dead: FxHashSet<K> = graveyard.iter().copied().collect();
    nodes.retain(|k, _| !dead.contains(&k));
    graveyard
}

/// Deep copy the subtree rooted at `node`. Copies are named "Copy of <name>"
/// and the copied subtree is linked under the original's parent. Returns the
/// key of the copied subtree root.
pub fn duplicate_node<K, N>(tree: &mut RenderTree<K>, nodes: &mut NodeArena<K, N>, node: K) -> K
where
    K: Key + Hash,
    N: TreeNode,
{
    struct Duplicator<'a, K: Key, N> {
        nodes: &'a mut NodeArena<K, N>,
        parents: Vec<Option<K>>,
        links: Vec<(Option<K>, K)>,
    }

    impl<K: Key, N: TreeNode> TreeVisitor<K> for Duplicator<'_, K, N> {
        fn enter_node(&mut self, node: Option<K>) {
            let Some(node) = node else { return };
            let parent = self.parents.last().copied().flatten();
            let copy = make_copy(&self.nodes[node]);
            let key = self.nodes.insert(copy);
            self.parents.push(Some(key));
            self.links.push((parent, key));
        }
        fn leave_node(&mut self, node: Option<K>) {
            if node.is_some() {
                self.parents.pop();
            }
        }
    }

    fn make_copy<N: TreeNode>(node: &N) -> N {
        let mut copy = node.clone_with_new_id();
        copy.set_name(format!("Copy of {}", node.name()));
        copy
    }

    if !tree.has_node(node) {
        let copy = make_copy(&nodes[node]);
        return nodes.insert(copy);
    }

    let parent = tree.get_parent(node);
    let mut visitor = Duplicator {
        nodes,
        parents: vec![parent],
        links: Vec::new(),
    };
    tree.pre_order_traverse(&mut visitor, Some(node));
    let links = visitor.links;
    for (parent, child) in &links {
        tree.link_child(*parent, *child);
    }
    links[0].1
}

// ============================================================================
// Spatial queries
// ============================================================================

/// A node hit by [`coarse_hit_test`] with the hit point in node box units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeHit<K> {
    pub node: K,
    pub box_position: Vec2,
}

/// Find every node whose box contains the world space `point`. This is
/// coarse: only the node boxes are tested, not the drawn shapes.
#[must_use]
pub fn coarse_hit_test<K, N>(
    tree: &RenderTree<K>,
    nodes: &NodeArena<K, N>,
    point: Vec2,
) -> Vec<NodeHit<K>>
where
    K: Key + Hash,
    N: TreeNode,
{
    struct HitTest<'a, K: Key, N> {
        nodes: &'a NodeArena<K, N>,
        point: Vec2,
        transform: TransformStack,
        hits: Vec<NodeHit<K>>,
    }

    impl<K: Key, N: TreeNode> TreeVisitor<K> for HitTest<'_, K, N> {
        fn enter_node(&mut self, node: Option<K>) {
            let Some(key) = node else { return };
            let node = &self.nodes[key];
            self.transform.push(node.node_transform());
            self.transform.push(node.model_transform());
            let p = transform_point(&self.transform.inverse_matrix(), self.point);
            if (0.0..1.0).contains(&p.x) && (0.0..1.0).contains(&p.y) {
                self.hits.push(NodeHit {
                    node: key,
                    box_position: p * node.size(),
                });
            }
            self.transform.pop();
        }
        fn leave_node(&mut self, node: Option<K>) {
            if node.is_some() {
                self.transform.pop();
            }
        }
    }

    let mut visitor = HitTest {
        nodes,
        point,
        transform: TransformStack::new(),
        hits: Vec::new(),
    };
    tree.pre_order_traverse(&mut visitor, None);
    visitor.hits
}

/// Map a point in the node box (origin at the top left corner, node units)
/// to world space.
#[must_use]
pub fn map_coords_from_node_box<K, N>(
    tree: &RenderTree<K>,
    nodes: &NodeArena<K, N>,
    point: Vec2,
    node: K,
) -> Vec2
where
    K: Key + Hash,
    N: TreeNode,
{
    transform_point(&find_unscaled_node_model_transform(tree, nodes, node), point)
}

/// Map a world space point into the node box.
#[must_use]
pub fn map_coords_to_node_box<K, N>(
    tree: &RenderTree<K>,
    nodes: &NodeArena<K, N>,
    point: Vec2,
    node: K,
) -> Vec2
where
    K: Key + Hash,
    N: TreeNode,
{
    let mat = find_unscaled_node_model_transform(tree, nodes, node).inverse();
    transform_point(&mat, point)
}

#[must_use]
pub fn find_node_bounding_box<K, N>(
    tree: &RenderTree<K>,
    nodes: &NodeArena<K, N>,
    node: K,
) -> OrientedBox
where
    K: Key + Hash,
    N: TreeNode,
{
    OrientedBox::from_matrix(&find_node_model_transform(tree, nodes, node))
}

#[must_use]
pub fn find_node_bounding_rect<K, N>(tree: &RenderTree<K>, nodes: &NodeArena<K, N>, node: K) -> Rect
where
    K: Key + Hash,
    N: TreeNode,
{
    Rect::bounding_rect(&find_node_model_transform(tree, nodes, node))
}

/// Union of the bounding rects of every node in the tree.
#[must_use]
pub fn find_bounding_rect<K, N>(tree: &RenderTree<K>, nodes: &NodeArena<K, N>) -> Rect
where
    K: Key + Hash,
    N: TreeNode,
{
    struct Bounds<'a, K: Key, N> {
        nodes: &'a NodeArena<K, N>,
        transform: TransformStack,
        result: Rect,
    }

    impl<K: Key, N: TreeNode> TreeVisitor<K> for Bounds<'_, K, N> {
        fn enter_node(&mut self, node: Option<K>) {
            let Some(key) = node else { return };
            let node = &self.nodes[key];
            self.transform.push(node.node_transform());
            self.transform.push(node.model_transform());
            self.result = self.result.union(&Rect::bounding_rect(&self.transform.matrix()));
            self.transform.pop();
        }
        fn leave_node(&mut self, node: Option<K>) {
            if node.is_some() {
                self.transform.pop();
            }
        }
    }

    let mut visitor = Bounds {
        nodes,
        transform: TransformStack::new(),
        result: Rect::default(),
    };
    tree.pre_order_traverse(&mut visitor, None);
    visitor.result
}
