//! The arena cell backing [`crate::bvh::tree::Bvh`].
//!
//! Cyclic parent/child references translate to `i32` arena indices, the
//! same trade `arena_gentree::Node` makes (`Option<Position>`
//! parent/children links into a `Vec`); the BVH additionally needs sibling
//! links and cached bounds/size, so it inlines the arena rather than
//! wrapping [`crate::sequences::slot_map::SlotMap`].

use crate::bvh::bounds::BoundVolume;

/// Sentinel for "no node" in parent/child/root index fields.
pub const NONE: i32 = -1;

/// One cell of the BVH's arena.
#[derive(Debug, Clone)]
pub struct Node<T> {
    pub parent: i32,
    pub left: i32,
    pub right: i32,
    pub bounds: BoundVolume,
    /// `Some` only when `is_leaf` is true.
    pub value: Option<T>,
    pub subtree_size: u32,
    pub is_leaf: bool,
    pub is_allocated: bool,
}

impl<T> Node<T> {
    /// A free-list placeholder; never observed as part of a reachable
    /// subtree.
    pub fn vacant() -> Node<T> {
        Node {
            parent: NONE,
            left: NONE,
            right: NONE,
            bounds: BoundVolume::new([0.0; 3], [0.0; 3]),
            value: None,
            subtree_size: 0,
            is_leaf: false,
            is_allocated: false,
        }
    }

    pub fn leaf(bounds: BoundVolume, value: T) -> Node<T> {
        Node {
            parent: NONE,
            left: NONE,
            right: NONE,
            bounds,
            value: Some(value),
            subtree_size: 1,
            is_leaf: true,
            is_allocated: true,
        }
    }
}
