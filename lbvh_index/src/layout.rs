// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth-first linearization of each tree for stackless traversal.
//!
//! Nodes are stored in pre-order: a node is followed by its whole left
//! subtree, then its whole right subtree. Each entry records `skip`, the
//! number of entries in its subtree, so a walk either steps to the next entry
//! (descend) or adds `skip` (prune) and never needs a stack.

use alloc::vec::Vec;

use crate::hierarchy::{Hierarchy, NodeRef};
use crate::kernel;
use crate::leaf::Leaf;
use crate::segments::{TypeSegments, to_u32};
use crate::types::Aabb;

/// One entry of a linearized tree.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TraversalNode {
    /// Node bounds.
    pub aabb: Aabb,
    /// Entries in this node's subtree, itself included.
    pub skip: u32,
    /// First sorted slot of a leaf's members.
    pub first: u32,
    /// Member count of a leaf; zero for internal nodes.
    pub count: u32,
}

impl TraversalNode {
    /// Whether this entry is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.count > 0
    }
}

/// All trees linearized back to back.
#[derive(Clone, Debug, Default)]
pub struct TraversalLayout {
    /// Entries of every type's tree; type `t` occupies `head[t]..head[t + 1]`.
    pub nodes: Vec<TraversalNode>,
    /// Offsets table (length `n_types + 1`).
    pub head: Vec<usize>,
}

impl TraversalLayout {
    /// Entries of type `t`'s tree; empty for types without particles.
    pub fn tree(&self, t: usize) -> &[TraversalNode] {
        &self.nodes[self.head[t]..self.head[t + 1]]
    }
}

/// Linearize every tree; per-type work runs in parallel.
pub fn linearize(
    leaves: &[Leaf],
    hierarchy: &Hierarchy,
    aabbs: &[Aabb],
    segments: &TypeSegments,
) -> TraversalLayout {
    let n_types = segments.n_types();
    let n_leaves = leaves.len();
    let mut head = Vec::with_capacity(n_types + 1);
    head.push(0);
    for t in 0..n_types {
        let leaves_t = segments.leaves_of(t).len();
        let size = (2 * leaves_t).saturating_sub(1);
        head.push(head[t] + size);
    }

    let empty = TraversalNode {
        aabb: Aabb::EMPTY,
        skip: 0,
        first: 0,
        count: 0,
    };
    let mut nodes = alloc::vec![empty; head[n_types]];
    let mut trees = kernel::split_segments(&mut nodes, &head);
    kernel::launch_mut(&mut trees, |t, tree| {
        let leaf_range = segments.leaves_of(t);
        let root = match leaf_range.len() {
            0 => return,
            1 => NodeRef::leaf(to_u32(leaf_range.start)),
            _ => NodeRef::internal(to_u32(segments.internal_of(t).start)),
        };
        let mut stack = Vec::new();
        stack.push(root);
        let mut cursor = 0;
        while let Some(node) = stack.pop() {
            let aabb = aabbs[node.aabb_slot(n_leaves)];
            tree[cursor] = if node.is_leaf() {
                let leaf = &leaves[node.index() as usize];
                TraversalNode {
                    aabb,
                    skip: 1,
                    first: leaf.first,
                    count: leaf.count,
                }
            } else {
                let internal = &hierarchy.nodes[node.index() as usize];
                let [left, right] = internal.children;
                stack.push(right);
                stack.push(left);
                TraversalNode {
                    aabb,
                    skip: to_u32(2 * internal.leaf_count() - 1),
                    first: 0,
                    count: 0,
                }
            };
            cursor += 1;
        }
        debug_assert_eq!(cursor, tree.len(), "linearization covers the tree");
    });

    TraversalLayout { nodes, head }
}
