//! Render Tree
//!
//! A non-owning parent/child hierarchy over opaque node identities. The tree
//! never stores node data, only the relationships between node keys, so the
//! same structure serves nodes inside an entity (class and instance) and
//! entities inside a scene.
//!
//! The root is implicit and is represented by `None`. Every node in the tree
//! has exactly one parent entry, which is `None` for top level nodes.

use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};

use crate::errors::{Result, StrataError};

/// Visitor for [`RenderTree::pre_order_traverse`].
///
/// `enter_node` is called before the node's children are visited and
/// `leave_node` after. The root is visited as `None`.
pub trait TreeVisitor<K> {
    fn enter_node(&mut self, _node: Option<K>) {}
    fn leave_node(&mut self, _node: Option<K>) {}
    /// Checked after every child subtree; returning true stops the traversal.
    fn is_done(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct RenderTree<K>
where
    K: Copy + Eq + Hash,
{
    parents: FxHashMap<K, Option<K>>,
    children: FxHashMap<Option<K>, Vec<K>>,
}

impl<K> Default for RenderTree<K>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self {
            parents: FxHashMap::default(),
            children: FxHashMap::default(),
        }
    }
}

impl<K> RenderTree<K>
where
    K: Copy + Eq + Hash,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Topology editing
    // ========================================================================

    /// Link `child` as the last child of `parent` (`None` for the root).
    ///
    /// The child must not currently be linked anywhere in the tree.
    pub fn link_child(&mut self, parent: Option<K>, child: K) {
        assert!(
            !self.parents.contains_key(&child),
            "render tree node is already linked to a parent"
        );
        self.parents.insert(child, parent);
        self.children.entry(parent).or_default().push(child);
    }

    /// Detach `child` from its parent. The child's own descendants stay
    /// linked to it so the whole subtree moves as a unit when relinked.
    pub fn break_child(&mut self, child: K) {
        let Some(parent) = self.parents.remove(&child) else {
            panic!("render tree node to break is not linked");
        };
        self.remove_from_child_list(parent, child);
    }

    /// Move `child` (with its subtree) under `parent`.
    pub fn reparent_child(&mut self, parent: Option<K>, child: K) {
        self.break_child(child);
        self.link_child(parent, child);
    }

    /// Delete `node` and its whole subtree from the tree.
    pub fn delete_node(&mut self, node: K) {
        if let Some(children) = self.children.remove(&Some(node)) {
            for child in children {
                // the child list was already taken, only drop the subtree
                // and the parent entry of the child itself.
                self.delete_subtree(child);
            }
        }
        if let Some(parent) = self.parents.remove(&node) {
            self.remove_from_child_list(parent, node);
        }
    }

    fn delete_subtree(&mut self, node: K) {
        if let Some(children) = self.children.remove(&Some(node)) {
            for child in children {
                self.delete_subtree(child);
            }
        }
        self.parents.remove(&node);
    }

    fn remove_from_child_list(&mut self, parent: Option<K>, child: K) {
        if let Some(list) = self.children.get_mut(&parent) {
            list.retain(|c| *c != child);
            if list.is_empty() {
                self.children.remove(&parent);
            }
        }
    }

    /// Remove every node.
    pub fn clear(&mut self) {
        self.parents.clear();
        self.children.clear();
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn has_node(&self, node: K) -> bool {
        self.parents.contains_key(&node)
    }

    /// Get the parent of `node`, `None` when the node is a top level node.
    ///
    /// Panics if the node is not in the tree.
    #[must_use]
    pub fn get_parent(&self, node: K) -> Option<K> {
        match self.parents.get(&node) {
            Some(parent) => *parent,
            None => panic!("render tree has no such node"),
        }
    }

    /// True when `node` is in the tree and has a parent other than the root.
    #[must_use]
    pub fn has_parent(&self, node: K) -> bool {
        self.parents.get(&node).is_some_and(Option::is_some)
    }

    /// Children of `parent` (`None` for the root) in link order.
    #[must_use]
    pub fn children(&self, parent: Option<K>) -> &[K] {
        self.children.get(&parent).map_or(&[][..], Vec::as_slice)
    }

    #[inline]
    #[must_use]
    pub fn has_children(&self, parent: Option<K>) -> bool {
        !self.children(parent).is_empty()
    }

    pub fn for_each_child(&self, mut f: impl FnMut(K), parent: Option<K>) {
        for child in self.children(parent) {
            f(*child);
        }
    }

    /// Number of linked nodes (the root is not counted).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Path from `node` up to its top level ancestor, `node` first.
    #[must_use]
    pub fn path_to_root(&self, node: K) -> Vec<K> {
        let mut path = vec![node];
        let mut current = node;
        while let Some(Some(parent)) = self.parents.get(&current) {
            path.push(*parent);
            current = *parent;
        }
        path
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Depth-first pre-order traversal starting at `start` (`None` = root).
    pub fn pre_order_traverse<V>(&self, visitor: &mut V, start: Option<K>)
    where
        V: TreeVisitor<K> + ?Sized,
    {
        self.traverse(visitor, start);
    }

    fn traverse<V>(&self, visitor: &mut V, node: Option<K>)
    where
        V: TreeVisitor<K> + ?Sized,
    {
        visitor.enter_node(node);
        if let Some(children) = self.children.get(&node) {
            for child in children {
                self.traverse(visitor, Some(*child));
                if visitor.is_done() {
                    return;
                }
            }
        }
        visitor.leave_node(node);
    }

    /// Visit every real node (not the root) in pre-order.
    pub fn pre_order_traverse_for_each(&self, f: impl FnMut(K), start: Option<K>) {
        struct ForEach<F>(F);
        impl<K, F: FnMut(K)> TreeVisitor<K> for ForEach<F> {
            fn enter_node(&mut self, node: Option<K>) {
                if let Some(node) = node {
                    (self.0)(node);
                }
            }
        }
        self.pre_order_traverse(&mut ForEach(f), start);
    }

    /// Collect the keys of the subtree rooted at `start` (inclusive) in pre-order.
    #[must_use]
    pub fn collect_subtree(&self, start: K) -> Vec<K> {
        let mut keys = Vec::new();
        self.pre_order_traverse_for_each(|k| keys.push(k), Some(start));
        keys
    }

    /// Rebuild this tree with the topology of `other`, mapping every node
    /// through `map`. Child order is preserved.
    pub fn from_tree<S>(&mut self, other: &RenderTree<S>, map: impl Fn(S) -> K)
    where
        S: Copy + Eq + Hash,
    {
        self.clear();
        for (parent, children) in &other.children {
            let parent = parent.map(&map);
            for child in children {
                self.link_child(parent, map(*child));
            }
        }
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Serialize as nested `{ "node": .., "children": [..] }` objects.
    /// The root is written with a `null` node and leaves carry an empty
    /// `children` array.
    pub fn into_json(&self, node_to_json: impl Fn(K) -> Value) -> Value {
        self.node_into_json(&node_to_json, None)
    }

    fn node_into_json(&self, node_to_json: &impl Fn(K) -> Value, node: Option<K>) -> Value {
        let mut chunk = Map::new();
        chunk.insert("node".into(), node.map_or(Value::Null, node_to_json));
        let children: Vec<Value> = self
            .children(node)
            .iter()
            .map(|child| self.node_into_json(node_to_json, Some(*child)))
            .collect();
        chunk.insert("children".into(), Value::Array(children));
        Value::Object(chunk)
    }

    /// Restore a tree written by [`RenderTree::into_json`]. `lookup` maps
    /// each serialized node chunk back to a key; it returns `Ok(None)` for
    /// the root chunk.
    pub fn from_json(
        value: &Value,
        lookup: impl Fn(&Value) -> Result<Option<K>>,
    ) -> Result<Self> {
        let mut tree = Self::new();
        tree.node_from_json(&lookup, value)?;
        Ok(tree)
    }

    fn node_from_json(
        &mut self,
        lookup: &impl Fn(&Value) -> Result<Option<K>>,
        value: &Value,
    ) -> Result<Option<K>> {
        let node = match value.get("node") {
            Some(chunk) => lookup(chunk)?,
            None => None,
        };
        if let Some(children) = value.get("children").and_then(Value::as_array) {
            for chunk in children {
                let Some(child) = self.node_from_json(lookup, chunk)? else {
                    return Err(StrataError::UnknownNode("<root>".into()));
                };
                if self.has_node(child) {
                    return Err(StrataError::InvalidField {
                        context: "render tree",
                        field: "children",
                        reason: "node appears more than once".into(),
                    });
                }
                self.link_child(node, child);
            }
        }
        Ok(node)
    }

    /// Check the structural invariants; used by tests and debug assertions.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let mut seen = FxHashSet::default();
        for (parent, children) in &self.children {
            for child in children {
                if self.parents.get(child) != Some(parent) || !seen.insert(*child) {
                    return false;
                }
            }
        }
        if seen.len() != self.parents.len() {
            return false;
        }
        // no cycles: every path must reach the root
        self.parents.keys().all(|node| {
            let mut steps = 0usize;
            let mut current = *node;
            while let Some(Some(parent)) = self.parents.get(&current) {
                current = *parent;
                steps += 1;
                if steps > self.parents.len() {
                    return false;
                }
            }
            true
        })
    }
}

/// Shallow node serialization used by trees: only the id is recorded so the
/// node can be resolved again on load.
#[must_use]
pub fn tree_node_to_json(id: &str) -> Value {
    let mut chunk = Map::new();
    chunk.insert("id".into(), Value::String(id.to_owned()));
    Value::Object(chunk)
}

/// Resolve a serialized tree node through an id map. The root chunk has no
/// id and resolves to `None`.
pub fn tree_node_from_json<K: Copy>(
    ids: &FxHashMap<String, K>,
    chunk: &Value,
) -> Result<Option<K>> {
    let Some(id) = chunk.get("id").and_then(Value::as_str) else {
        return Ok(None);
    };
    ids.get(id)
        .copied()
        .map(Some)
        .ok_or_else(|| StrataError::UnknownNode(id.to_owned()))
}
