//! The Bounding Volume Hierarchy: an arena-allocated binary tree with a
//! secondary open-addressing index for value→node lookup, and a
//! readers-writer concurrency contract.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::RwLock;

use crate::bvh::bounds::{BoundVolume, Bounds};
use crate::bvh::node::{Node, NONE};
use crate::error::{CollectionError, Result};
use crate::primitives::hashing::{next_power_of_two, std_hash_u32};
use crate::sequences::int_stack::with_thread_local_stack;

const DEFAULT_ARENA_CAPACITY: usize = 8;
const BUCKET_EMPTY: i32 = -1;
const BUCKET_TOMBSTONE: i32 = -2;

struct Inner<T> {
    arena: Vec<Node<T>>,
    buckets: Vec<i32>,
    bucket_mask: usize,
    free_indices: Vec<i32>,
    peak_index: usize,
    leaf_count: u32,
    root_index: i32,
}

impl<T: Hash + Eq + Clone + Debug> Inner<T> {
    fn new() -> Self {
        let mut arena = Vec::with_capacity(DEFAULT_ARENA_CAPACITY);
        arena.resize_with(DEFAULT_ARENA_CAPACITY, Node::vacant);
        Inner {
            arena,
            buckets: vec![BUCKET_EMPTY; DEFAULT_ARENA_CAPACITY],
            bucket_mask: DEFAULT_ARENA_CAPACITY - 1,
            free_indices: Vec::new(),
            peak_index: 0,
            leaf_count: 0,
            root_index: NONE,
        }
    }

    fn subtree_size(&self, idx: i32) -> u32 {
        if idx == NONE {
            0
        } else {
            self.arena[idx as usize].subtree_size
        }
    }

    fn recompute_node(&mut self, idx: i32) {
        let node = &self.arena[idx as usize];
        let (left, right) = (node.left, node.right);
        let bounds = match (left, right) {
            (NONE, NONE) => node.bounds.clone(),
            (l, NONE) => self.arena[l as usize].bounds.clone(),
            (NONE, r) => self.arena[r as usize].bounds.clone(),
            (l, r) => self.arena[l as usize]
                .bounds
                .union(&self.arena[r as usize].bounds),
        };
        let size = 1 + self.subtree_size(left) + self.subtree_size(right);
        let node = &mut self.arena[idx as usize];
        node.bounds = bounds;
        node.subtree_size = size;
    }

    fn allocate_node(&mut self, node: Node<T>) -> i32 {
        if let Some(idx) = self.free_indices.pop() {
            self.arena[idx as usize] = node;
            return idx;
        }
        if self.peak_index == self.arena.len() {
            self.grow_arena();
        }
        let idx = self.peak_index;
        self.arena[idx] = node;
        self.peak_index += 1;
        idx as i32
    }

    fn grow_arena(&mut self) {
        let new_cap = next_power_of_two((self.arena.len() * 2).max(DEFAULT_ARENA_CAPACITY));
        self.arena.resize_with(new_cap, Node::vacant);
        self.rebuild_buckets();
    }

    fn rebuild_buckets(&mut self) {
        let cap = self.arena.len();
        self.bucket_mask = cap - 1;
        self.buckets = vec![BUCKET_EMPTY; cap];
        for idx in 0..self.peak_index {
            if self.arena[idx].is_allocated && self.arena[idx].is_leaf {
                let value = self.arena[idx].value.clone().expect("leaf carries a value");
                self.bucket_insert(&value, idx as i32);
            }
        }
    }

    fn bucket_insert(&mut self, value: &T, node_idx: i32) {
        let hash = std_hash_u32(value);
        let mut i = (hash as usize) & self.bucket_mask;
        loop {
            if self.buckets[i] == BUCKET_EMPTY || self.buckets[i] == BUCKET_TOMBSTONE {
                self.buckets[i] = node_idx;
                return;
            }
            i = (i + 1) & self.bucket_mask;
        }
    }

    fn bucket_find(&self, value: &T) -> Option<i32> {
        let hash = std_hash_u32(value);
        let mut i = (hash as usize) & self.bucket_mask;
        let mut steps = 0usize;
        loop {
            match self.buckets[i] {
                BUCKET_EMPTY => return None,
                BUCKET_TOMBSTONE => {}
                node_idx => {
                    let node = &self.arena[node_idx as usize];
                    if node.is_allocated && node.is_leaf && node.value.as_ref() == Some(value) {
                        return Some(node_idx);
                    }
                }
            }
            i = (i + 1) & self.bucket_mask;
            steps += 1;
            if steps > self.buckets.len() {
                return None;
            }
        }
    }

    fn bucket_remove(&mut self, value: &T) {
        let hash = std_hash_u32(value);
        let mut i = (hash as usize) & self.bucket_mask;
        let mut steps = 0usize;
        loop {
            match self.buckets[i] {
                BUCKET_EMPTY => return,
                BUCKET_TOMBSTONE => {}
                node_idx => {
                    let node = &self.arena[node_idx as usize];
                    if node.is_leaf && node.value.as_ref() == Some(value) {
                        self.buckets[i] = BUCKET_TOMBSTONE;
                        return;
                    }
                }
            }
            i = (i + 1) & self.bucket_mask;
            steps += 1;
            if steps > self.buckets.len() {
                return;
            }
        }
    }

    fn free_node(&mut self, idx: i32) {
        self.arena[idx as usize] = Node::vacant();
        self.free_indices.push(idx);
    }

    fn insert_into_tree(&mut self, parent_idx: i32, new_leaf_idx: i32) -> i32 {
        if parent_idx == NONE {
            return new_leaf_idx;
        }
        if self.arena[parent_idx as usize].is_leaf {
            let union_bounds = self.arena[parent_idx as usize]
                .bounds
                .union(&self.arena[new_leaf_idx as usize].bounds);
            let former_parent = self.arena[parent_idx as usize].parent;
            let size = 1 + self.subtree_size(parent_idx) + self.subtree_size(new_leaf_idx);
            let internal = Node {
                parent: former_parent,
                left: parent_idx,
                right: new_leaf_idx,
                bounds: union_bounds,
                value: None,
                subtree_size: size,
                is_leaf: false,
                is_allocated: true,
            };
            let internal_idx = self.allocate_node(internal);
            self.arena[parent_idx as usize].parent = internal_idx;
            self.arena[new_leaf_idx as usize].parent = internal_idx;
            return internal_idx;
        }

        let left = self.arena[parent_idx as usize].left;
        let right = self.arena[parent_idx as usize].right;
        let left_size = self.subtree_size(left) as i64;
        let right_size = self.subtree_size(right) as i64;

        let descend_left = if (left_size - right_size).abs() > 2 {
            left_size < right_size
        } else {
            let new_bounds = self.arena[new_leaf_idx as usize].bounds.clone();
            let left_cost = if left == NONE {
                f32::INFINITY
            } else {
                self.arena[left as usize].bounds.cost(&new_bounds)
            };
            let right_cost = if right == NONE {
                f32::INFINITY
            } else {
                self.arena[right as usize].bounds.cost(&new_bounds)
            };
            left_cost <= right_cost
        };

        if descend_left {
            let new_child = self.insert_into_tree(left, new_leaf_idx);
            self.arena[parent_idx as usize].left = new_child;
        } else {
            let new_child = self.insert_into_tree(right, new_leaf_idx);
            self.arena[parent_idx as usize].right = new_child;
        }
        self.recompute_node(parent_idx);
        parent_idx
    }

    fn clear(&mut self) {
        let cap = self.arena.len().max(DEFAULT_ARENA_CAPACITY);
        self.arena.clear();
        self.arena.resize_with(cap, Node::vacant);
        self.buckets = vec![BUCKET_EMPTY; cap];
        self.bucket_mask = cap - 1;
        self.free_indices.clear();
        self.peak_index = 0;
        self.leaf_count = 0;
        self.root_index = NONE;
    }
}

/// The BVH itself: a readers-writer-guarded arena tree. `Query`/`FindEntry`
/// take a shared read lock; every mutating operation takes the exclusive
/// write lock.
pub struct Bvh<T> {
    inner: RwLock<Inner<T>>,
}

impl<T: Hash + Eq + Clone + Debug> Default for Bvh<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq + Clone + Debug> Bvh<T> {
    /// Creates an empty tree with the default arena capacity.
    pub fn new() -> Bvh<T> {
        Bvh {
            inner: RwLock::new(Inner::new()),
        }
    }

    /// Allocates a leaf for `value` with `bounds` and threads it into the
    /// tree via the balance-aware insertion algorithm.
    pub fn insert(&self, value: T, bounds: BoundVolume) -> Result<bool> {
        let mut inner = self.inner.write().expect("bvh lock poisoned");
        let leaf = Node::leaf(bounds, value.clone());
        let leaf_idx = inner.allocate_node(leaf);
        // Bucket-index the leaf before threading it into the tree: growing
        // the arena for an internal node allocated below rebuilds the
        // bucket index from scratch by scanning every allocated leaf, which
        // would double-insert this one if it were indexed only afterward.
        inner.bucket_insert(&value, leaf_idx);
        let root_index = inner.root_index;
        let new_root = inner.insert_into_tree(root_index, leaf_idx);
        inner.arena[new_root as usize].parent = NONE;
        inner.root_index = new_root;
        inner.leaf_count += 1;
        tracing::trace!(leaf_idx, root = inner.root_index, "bvh insert");
        Ok(true)
    }

    /// Replaces the bounds of the leaf holding `value` and propagates the
    /// change up to the root, short-circuiting once an ancestor's
    /// recomputed bounds equal its previous bounds.
    pub fn update_bounds(&self, value: &T, new_bounds: BoundVolume) -> bool {
        let mut inner = self.inner.write().expect("bvh lock poisoned");
        let Some(leaf_idx) = inner.bucket_find(value) else {
            return false;
        };
        inner.arena[leaf_idx as usize].bounds = new_bounds;
        let mut cur = inner.arena[leaf_idx as usize].parent;
        while cur != NONE {
            let previous = inner.arena[cur as usize].bounds.clone();
            inner.recompute_node(cur);
            if inner.arena[cur as usize].bounds == previous {
                break;
            }
            cur = inner.arena[cur as usize].parent;
        }
        true
    }

    /// Removes the leaf holding `value`, ascending to repair ancestor
    /// bounds and subtree sizes, freeing any parent that loses its last
    /// child.
    pub fn remove(&self, value: &T) -> bool {
        let mut inner = self.inner.write().expect("bvh lock poisoned");
        let Some(leaf_idx) = inner.bucket_find(value) else {
            return false;
        };
        inner.bucket_remove(value);

        if inner.root_index == leaf_idx && inner.leaf_count == 1 {
            inner.clear();
            return true;
        }

        let parent_idx = inner.arena[leaf_idx as usize].parent;
        inner.free_node(leaf_idx);
        inner.leaf_count -= 1;

        if parent_idx != NONE {
            if inner.arena[parent_idx as usize].left == leaf_idx {
                inner.arena[parent_idx as usize].left = NONE;
            } else if inner.arena[parent_idx as usize].right == leaf_idx {
                inner.arena[parent_idx as usize].right = NONE;
            }
        } else {
            inner.root_index = NONE;
        }

        let mut cur = parent_idx;
        while cur != NONE {
            let left = inner.arena[cur as usize].left;
            let right = inner.arena[cur as usize].right;
            if left == NONE && right == NONE {
                let node_parent = inner.arena[cur as usize].parent;
                if node_parent != NONE {
                    if inner.arena[node_parent as usize].left == cur {
                        inner.arena[node_parent as usize].left = NONE;
                    } else if inner.arena[node_parent as usize].right == cur {
                        inner.arena[node_parent as usize].right = NONE;
                    }
                } else {
                    inner.root_index = NONE;
                }
                let was_leaf = inner.arena[cur as usize].is_leaf;
                inner.free_node(cur);
                if was_leaf {
                    inner.leaf_count -= 1;
                }
                cur = node_parent;
            } else {
                inner.recompute_node(cur);
                cur = inner.arena[cur as usize].parent;
            }
        }
        true
    }

    /// Writes every leaf whose bounds intersect `query_bounds` into
    /// `collector`, via an iterative, stack-based DFS using the calling
    /// thread's reusable traversal stack.
    pub fn query(&self, query_bounds: &BoundVolume, collector: &mut Vec<T>) {
        let inner = self.inner.read().expect("bvh lock poisoned");
        if inner.root_index == NONE {
            return;
        }
        with_thread_local_stack(|stack| {
            stack.push(inner.root_index);
            while let Some(idx) = stack.pop() {
                if idx == NONE {
                    continue;
                }
                let node = &inner.arena[idx as usize];
                if !query_bounds.intersects(&node.bounds) {
                    continue;
                }
                if node.is_leaf {
                    collector.push(node.value.clone().expect("leaf carries a value"));
                } else {
                    stack.push(node.left);
                    stack.push(node.right);
                }
            }
        });
    }

    /// Secondary-index lookup for `value`'s arena index, if it is present.
    pub fn find_entry(&self, value: &T) -> Option<i32> {
        let inner = self.inner.read().expect("bvh lock poisoned");
        inner.bucket_find(value)
    }

    /// Empties the tree, keeping the arena's current capacity.
    pub fn clear(&self) {
        let mut inner = self.inner.write().expect("bvh lock poisoned");
        inner.clear();
    }

    /// Grows the arena (and rebuilds the secondary index) so it can hold at
    /// least `capacity` nodes without reallocating.
    pub fn ensure_capacity(&self, capacity: usize) {
        let mut inner = self.inner.write().expect("bvh lock poisoned");
        let target = next_power_of_two(capacity);
        if target > inner.arena.len() {
            inner.arena.resize_with(target, Node::vacant);
            inner.rebuild_buckets();
        }
    }

    /// The number of live leaves.
    pub fn leaf_count(&self) -> u32 {
        self.inner.read().expect("bvh lock poisoned").leaf_count
    }

    /// The union of bounds reachable from the root, or `None` for an empty
    /// tree.
    pub fn root_bounds(&self) -> Option<BoundVolume> {
        let inner = self.inner.read().expect("bvh lock poisoned");
        if inner.root_index == NONE {
            None
        } else {
            Some(inner.arena[inner.root_index as usize].bounds.clone())
        }
    }

    /// Walks every reachable node and verifies that each `subtree_size`
    /// equals one plus its children's. Intended for tests and debug
    /// assertions, not the hot path.
    pub fn check_subtree_size_integrity(&self) -> Result<()> {
        let inner = self.inner.read().expect("bvh lock poisoned");
        fn walk<T>(inner: &Inner<T>, idx: i32) -> std::result::Result<u32, CollectionError> {
            if idx == NONE {
                return Ok(0);
            }
            let node = &inner.arena[idx as usize];
            let left = walk(inner, node.left)?;
            let right = walk(inner, node.right)?;
            let expected = 1 + left + right;
            if expected != node.subtree_size {
                return Err(CollectionError::Corruption("subtree_size mismatch"));
            }
            Ok(expected)
        }
        walk(&inner, inner.root_index)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bv(min: [f32; 3], max: [f32; 3]) -> BoundVolume {
        BoundVolume::new(min, max)
    }

    #[test]
    fn insert_and_query_returns_intersecting_leaves() {
        let tree: Bvh<u32> = Bvh::new();
        tree.insert(1, bv([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])).unwrap();
        tree.insert(2, bv([2.0, 2.0, 2.0], [3.0, 3.0, 3.0])).unwrap();
        tree.insert(3, bv([0.0, 0.0, 0.0], [3.0, 3.0, 3.0])).unwrap();

        let mut hits = Vec::new();
        tree.query(&bv([0.5, 0.5, 0.5], [2.5, 2.5, 2.5]), &mut hits);
        hits.sort();
        // Leaf 2 spans [2,3]^3, which genuinely overlaps the query on
        // [2, 2.5] along every axis, not merely touching at a boundary.
        assert_eq!(hits, vec![1, 2, 3]);
    }

    #[test]
    fn query_on_empty_tree_yields_nothing() {
        let tree: Bvh<u32> = Bvh::new();
        let mut hits = Vec::new();
        tree.query(&bv([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]), &mut hits);
        assert!(hits.is_empty());
    }

    #[test]
    fn remove_sole_leaf_clears_the_tree() {
        let tree: Bvh<u32> = Bvh::new();
        tree.insert(1, bv([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])).unwrap();
        assert!(tree.remove(&1));
        assert_eq!(tree.leaf_count(), 0);
        assert!(tree.root_bounds().is_none());
    }

    #[test]
    fn remove_missing_value_is_a_no_op() {
        let tree: Bvh<u32> = Bvh::new();
        tree.insert(1, bv([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])).unwrap();
        assert!(!tree.remove(&99));
        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn update_bounds_expands_root_and_is_queryable() {
        let tree: Bvh<u32> = Bvh::new();
        for i in 0..10u32 {
            let f = i as f32;
            tree.insert(i, bv([f, f, f], [f + 1.0, f + 1.0, f + 1.0]))
                .unwrap();
        }
        let outside = bv([100.0, 100.0, 100.0], [101.0, 101.0, 101.0]);
        assert!(tree.update_bounds(&0, outside));

        let mut hits = Vec::new();
        tree.query(&bv([100.2, 100.2, 100.2], [100.8, 100.8, 100.8]), &mut hits);
        assert_eq!(hits, vec![0]);

        let root = tree.root_bounds().unwrap();
        assert!(root.max[0] >= 101.0);
    }

    #[test]
    fn subtree_size_integrity_holds_after_mixed_operations() {
        let tree: Bvh<u32> = Bvh::new();
        for i in 0..50u32 {
            let f = i as f32;
            tree.insert(i, bv([f, f, f], [f + 1.0, f + 1.0, f + 1.0]))
                .unwrap();
        }
        for i in (0..50u32).step_by(3) {
            tree.remove(&i);
        }
        tree.check_subtree_size_integrity().unwrap();
    }

    #[test]
    fn coincident_bounds_all_match_a_point_query() {
        let tree: Bvh<u32> = Bvh::new();
        let shared = bv([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        for i in 0..20u32 {
            tree.insert(i, shared).unwrap();
        }
        let mut hits = Vec::new();
        tree.query(&bv([0.5, 0.5, 0.5], [0.5, 0.5, 0.5]), &mut hits);
        assert_eq!(hits.len(), 20);
    }

    #[test]
    fn bucket_index_has_no_duplicate_entries_across_a_growth_boundary() {
        let tree: Bvh<u32> = Bvh::new();
        for i in 0..9u32 {
            let f = i as f32;
            tree.insert(i, bv([f, f, f], [f + 1.0, f + 1.0, f + 1.0]))
                .unwrap();
        }
        let inner = tree.inner.read().unwrap();
        for i in 0..9u32 {
            let count = inner
                .buckets
                .iter()
                .filter(|&&b| {
                    b >= 0 && inner.arena[b as usize].is_leaf && inner.arena[b as usize].value == Some(i)
                })
                .count();
            assert_eq!(count, 1, "value {i} should appear exactly once in the bucket index");
        }
    }

    #[test]
    fn arena_grows_past_default_capacity() {
        let tree: Bvh<u32> = Bvh::new();
        for i in 0..200u32 {
            let f = i as f32;
            tree.insert(i, bv([f, f, f], [f + 1.0, f + 1.0, f + 1.0]))
                .unwrap();
        }
        assert_eq!(tree.leaf_count(), 200);
        for i in 0..200u32 {
            assert!(tree.find_entry(&i).is_some());
        }
    }
}
