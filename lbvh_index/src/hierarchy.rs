// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Radix-tree topology over sorted leaves (Karras 2012).
//!
//! For a type with `n` leaves, internal node `i` in `0..n - 1` is generated by
//! one independent task that reads only the immutable leaf codes:
//!
//! 1. Range determination: the direction `d` points toward the neighbor sharing
//!    the longer common prefix; an exponential then binary search finds the far
//!    end `j` of the node's range `[min(i, j), max(i, j)]`.
//! 2. Split finding: a binary search for the last leaf `gamma` whose common
//!    prefix with the range start exceeds the prefix of the whole range.
//!    Children are `gamma` and `gamma + 1`, leaves when they sit at the range ends.
//!
//! The common prefix `delta(a, b)` of two leaves is the count of leading equal
//! bits of their codes. Equal codes fall back to `32 + clz(a ^ b)` on the
//! leaf indices, so every key is distinct and ties resolve by index distance.
//! For a run of identical codes the split lands where the highest differing
//! bit of the range's index bounds flips, which is the radix midpoint of the run.
//!
//! Node `0` of each type always spans the whole segment; it is the root and
//! records itself as its own parent.

use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::kernel;
use crate::leaf::Leaf;
use crate::segments::{TypeSegments, to_u32};

/// Parent pointer of a leaf that is the only leaf of its type.
pub const NO_PARENT: u32 = u32::MAX;

/// Reference to a child node: `(index << 1) | is_leaf`.
///
/// The index is global: a leaf id or an internal-node id.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodeRef(u32);

impl NodeRef {
    /// Reference to global leaf `index`.
    pub const fn leaf(index: u32) -> Self {
        Self((index << 1) | 1)
    }

    /// Reference to global internal node `index`.
    pub const fn internal(index: u32) -> Self {
        Self(index << 1)
    }

    /// Whether this references a leaf.
    pub const fn is_leaf(self) -> bool {
        self.0 & 1 == 1
    }

    /// Global leaf or internal-node id, flag stripped.
    pub const fn index(self) -> u32 {
        self.0 >> 1
    }

    /// Slot in the flat AABB array where leaves come first and internal nodes follow.
    pub const fn aabb_slot(self, n_leaves: usize) -> usize {
        if self.is_leaf() {
            self.index() as usize
        } else {
            n_leaves + self.index() as usize
        }
    }

    /// Raw encoded value.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Internal node of a per-type radix tree.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InternalNode {
    /// Left and right child.
    pub children: [NodeRef; 2],
    /// Global id of the parent; equals the node's own id at the root.
    pub parent: u32,
    /// First type-local leaf covered.
    pub first: u32,
    /// Last type-local leaf covered (inclusive).
    pub last: u32,
}

impl InternalNode {
    /// Number of leaves under this node.
    pub fn leaf_count(&self) -> usize {
        (self.last - self.first) as usize + 1
    }
}

/// Tree topology for all types.
#[derive(Clone, Debug, Default)]
pub struct Hierarchy {
    /// Internal nodes, per-type blocks addressed by `internal_head`.
    pub nodes: Vec<InternalNode>,
    /// Parent internal node of each leaf, or [`NO_PARENT`] for single-leaf types.
    pub leaf_parent: Vec<u32>,
}

/// Longest common prefix of leaves `i` and `j`, or `-1` when `j` is out of range.
#[allow(
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation,
    reason = "Leading-zero counts are at most 32 and leaf indices fit in 32 bits."
)]
pub fn delta(codes: &[u32], i: i64, j: i64) -> i32 {
    if j < 0 || j >= codes.len() as i64 {
        return -1;
    }
    let (a, b) = (codes[i as usize], codes[j as usize]);
    if a == b {
        32 + ((i as u32) ^ (j as u32)).leading_zeros() as i32
    } else {
        (a ^ b).leading_zeros() as i32
    }
}

/// Leaf range `[first, last]` covered by internal node `i`.
#[allow(
    clippy::cast_sign_loss,
    reason = "Both range ends were checked against the code array by `delta`."
)]
pub fn determine_range(codes: &[u32], i: usize) -> (usize, usize) {
    let ii = i as i64;
    let d: i64 = if delta(codes, ii, ii + 1) > delta(codes, ii, ii - 1) {
        1
    } else {
        -1
    };
    let delta_min = delta(codes, ii, ii - d);

    let mut l_max: i64 = 2;
    while delta(codes, ii, ii + l_max * d) > delta_min {
        l_max *= 2;
    }
    let mut l: i64 = 0;
    let mut t = l_max / 2;
    while t >= 1 {
        if delta(codes, ii, ii + (l + t) * d) > delta_min {
            l += t;
        }
        t /= 2;
    }
    let j = ii + l * d;
    (ii.min(j) as usize, ii.max(j) as usize)
}

/// Last leaf of the left child of the node covering `[first, last]`.
#[allow(clippy::cast_sign_loss, reason = "`split` stays within `[first, last)`.")]
pub fn find_split(codes: &[u32], first: usize, last: usize) -> usize {
    let (f, l) = (first as i64, last as i64);
    let node_prefix = delta(codes, f, l);
    let mut split = f;
    let mut step = l - f;
    loop {
        step = (step + 1) >> 1;
        let candidate = split + step;
        if candidate < l && delta(codes, f, candidate) > node_prefix {
            split = candidate;
        }
        if step <= 1 {
            break;
        }
    }
    split as usize
}

/// Generate the topology of every type's tree.
///
/// `leaves` is the global leaf array; each leaf's `code` represents it.
pub fn generate(leaves: &[Leaf], segments: &TypeSegments) -> Hierarchy {
    let codes: Vec<u32> = leaves.iter().map(|l| l.code).collect();
    let n_internal = segments.n_internal();
    let leaf_parent: Vec<AtomicU32> = (0..leaves.len()).map(|_| AtomicU32::new(NO_PARENT)).collect();
    let internal_parent: Vec<AtomicU32> = (0..n_internal).map(|_| AtomicU32::new(NO_PARENT)).collect();

    let mut nodes = alloc::vec![InternalNode::default(); n_internal];
    kernel::launch_mut(&mut nodes, |g, node| {
        let t = segments.type_of_internal(g);
        let leaf_base = segments.leaf_head()[t];
        let node_base = segments.internal_head()[t];
        let type_codes = &codes[segments.leaves_of(t)];
        let i = g - node_base;

        let (first, last) = determine_range(type_codes, i);
        let gamma = find_split(type_codes, first, last);

        let left = if gamma == first {
            NodeRef::leaf(to_u32(leaf_base + gamma))
        } else {
            NodeRef::internal(to_u32(node_base + gamma))
        };
        let right = if gamma + 1 == last {
            NodeRef::leaf(to_u32(leaf_base + gamma + 1))
        } else {
            NodeRef::internal(to_u32(node_base + gamma + 1))
        };

        let me = to_u32(g);
        for child in [left, right] {
            let slot = if child.is_leaf() {
                &leaf_parent[child.index() as usize]
            } else {
                &internal_parent[child.index() as usize]
            };
            slot.store(me, Ordering::Relaxed);
        }
        if first == 0 && last + 1 == type_codes.len() {
            internal_parent[g].store(me, Ordering::Relaxed);
        }

        *node = InternalNode {
            children: [left, right],
            parent: NO_PARENT,
            first: to_u32(first),
            last: to_u32(last),
        };
    });

    // The kernel join orders every parent store before these reads.
    for (node, parent) in nodes.iter_mut().zip(internal_parent) {
        node.parent = parent.into_inner();
    }
    Hierarchy {
        nodes,
        leaf_parent: leaf_parent.into_iter().map(AtomicU32::into_inner).collect(),
    }
}
