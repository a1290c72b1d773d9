//! Ordered node storage.
//!
//! [`NodeArena`] pairs a [`SlotMap`] (stable keys that survive insertion and
//! removal of other nodes) with an index list recording insertion order, so
//! nodes can be addressed both by key and by position the way an editor list
//! view addresses them.

use slotmap::{Key, SlotMap};

#[derive(Debug, Clone)]
pub struct NodeArena<K: Key, N> {
    nodes: SlotMap<K, N>,
    order: Vec<K>,
}

impl<K: Key, N> Default for NodeArena<K, N> {
    fn default() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            order: Vec::new(),
        }
    }
}

impl<K: Key, N> NodeArena<K, N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its key.
    pub fn insert(&mut self, node: N) -> K {
        let key = self.nodes.insert(node);
        self.order.push(key);
        key
    }

    pub fn remove(&mut self, key: K) -> Option<N> {
        let node = self.nodes.remove(key)?;
        self.order.retain(|k| *k != key);
        Some(node)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, key: K) -> Option<&N> {
        self.nodes.get(key)
    }

    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut N> {
        self.nodes.get_mut(key)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.nodes.contains_key(key)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Key of the node at `index` in insertion order.
    ///
    /// Panics when the index is out of bounds.
    #[must_use]
    pub fn key_at(&self, index: usize) -> K {
        assert!(index < self.order.len(), "node index {index} out of bounds");
        self.order[index]
    }

    /// Node at `index` in insertion order.
    #[must_use]
    pub fn at(&self, index: usize) -> &N {
        &self.nodes[self.key_at(index)]
    }

    #[must_use]
    pub fn index_of(&self, key: K) -> Option<usize> {
        self.order.iter().position(|k| *k == key)
    }

    #[must_use]
    pub fn keys(&self) -> &[K] {
        &self.order
    }

    /// Iterate `(key, node)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &N)> + '_ {
        self.order.iter().map(|k| (*k, &self.nodes[*k]))
    }

    /// Mutable iteration; order follows the slot map rather than insertion.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut N)> + '_ {
        self.nodes.iter_mut()
    }

    pub fn values(&self) -> impl Iterator<Item = &N> + '_ {
        self.order.iter().map(|k| &self.nodes[*k])
    }

    /// Keep only the nodes for which `f` returns true.
    pub fn retain(&mut self, mut f: impl FnMut(K, &mut N) -> bool) {
        self.nodes.retain(|k, n| f(k, n));
        let nodes = &self.nodes;
        self.order.retain(|k| nodes.contains_key(*k));
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
    }

    /// First node (in insertion order) matching the predicate.
    pub fn find(&self, mut f: impl FnMut(&N) -> bool) -> Option<K> {
        self.iter().find(|(_, n)| f(n)).map(|(k, _)| k)
    }
}

impl<K: Key, N> std::ops::Index<K> for NodeArena<K, N> {
    type Output = N;

    fn index(&self, key: K) -> &N {
        &self.nodes[key]
    }
}

impl<K: Key, N> std::ops::IndexMut<K> for NodeArena<K, N> {
    fn index_mut(&mut self, key: K) -> &mut N {
        &mut self.nodes[key]
    }
}
