// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bottom-up bounding-box propagation.
//!
//! One task starts at every leaf and walks toward its root. Each internal node
//! carries a visit counter starting at zero. A task arriving at a node bumps
//! the counter; the first arrival stops there, and the second (the one that
//! sees the previous value `1`) merges both children's boxes into the node and
//! continues upward. Every internal box is therefore written exactly once,
//! after both children are final, without locks or a barrier.
//!
//! The counter update is `AcqRel`: the first arrival's child box, stored
//! before its increment, is visible to the second arrival after its own
//! increment.
//!
//! Boxes live in one flat array: leaves in `0..n_leaves`, internal nodes in
//! `n_leaves..n_leaves + n_internal`.

use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};
use glam::Vec3;

use crate::hierarchy::{Hierarchy, NO_PARENT, NodeRef};
use crate::kernel;
use crate::leaf::Leaf;
use crate::segments::to_u32;
use crate::types::Aabb;

/// An [`Aabb`] stored as atomic bit patterns so that concurrent tasks can
/// publish it without `unsafe`.
#[derive(Debug)]
struct AtomicAabb([AtomicU32; 6]);

impl AtomicAabb {
    fn new(aabb: Aabb) -> Self {
        let [a, b, c] = aabb.lo.to_array().map(f32::to_bits);
        let [d, e, f] = aabb.hi.to_array().map(f32::to_bits);
        Self([a, b, c, d, e, f].map(AtomicU32::new))
    }

    fn load(&self) -> Aabb {
        let v = |i: usize| f32::from_bits(self.0[i].load(Ordering::Relaxed));
        Aabb::new(Vec3::new(v(0), v(1), v(2)), Vec3::new(v(3), v(4), v(5)))
    }

    fn store(&self, aabb: Aabb) {
        let bits = [aabb.lo.to_array(), aabb.hi.to_array()];
        for (slot, value) in self.0.iter().zip(bits.iter().flatten()) {
            slot.store(value.to_bits(), Ordering::Relaxed);
        }
    }

    fn into_inner(self) -> Aabb {
        let [a, b, c, d, e, f] = self.0.map(|x| f32::from_bits(x.into_inner()));
        Aabb::new(Vec3::new(a, b, c), Vec3::new(d, e, f))
    }
}

/// Flat box array plus the visit count each internal node received.
#[derive(Clone, Debug, Default)]
pub struct Propagated {
    /// Leaf boxes, then internal-node boxes.
    pub aabbs: Vec<Aabb>,
    /// Arrivals per internal node; exactly two in a well-formed tree.
    pub visits: Vec<u32>,
}

/// Merge leaf boxes up every tree.
pub fn propagate(leaves: &[Leaf], hierarchy: &Hierarchy) -> Propagated {
    let n_leaves = leaves.len();
    let n_internal = hierarchy.nodes.len();
    let aabbs: Vec<AtomicAabb> = leaves
        .iter()
        .map(|l| l.aabb)
        .chain(core::iter::repeat_n(Aabb::EMPTY, n_internal))
        .map(AtomicAabb::new)
        .collect();
    let visits: Vec<AtomicU32> = (0..n_internal).map(|_| AtomicU32::new(0)).collect();

    kernel::launch(n_leaves, |leaf| {
        let mut parent = hierarchy.leaf_parent[leaf];
        if parent == NO_PARENT {
            return;
        }
        let mut current = NodeRef::leaf(to_u32(leaf));
        let mut aabb = aabbs[leaf].load();
        loop {
            let p = parent as usize;
            if visits[p].fetch_add(1, Ordering::AcqRel) == 0 {
                // The sibling's task is still on its way; it finishes this node.
                return;
            }
            let node = &hierarchy.nodes[p];
            let sibling = if node.children[0] == current {
                node.children[1]
            } else {
                node.children[0]
            };
            aabb = aabb.union(aabbs[sibling.aabb_slot(n_leaves)].load());
            aabbs[n_leaves + p].store(aabb);

            if node.parent == parent {
                return;
            }
            current = NodeRef::internal(parent);
            parent = node.parent;
        }
    });

    log::trace!("propagated boxes through {n_internal} internal nodes from {n_leaves} leaves");
    Propagated {
        aabbs: aabbs.into_iter().map(AtomicAabb::into_inner).collect(),
        visits: visits.into_iter().map(AtomicU32::into_inner).collect(),
    }
}
