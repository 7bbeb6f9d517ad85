// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leaf merging: consecutive sorted particles of one type grouped into fixed-capacity leaves.

use alloc::vec::Vec;
use glam::Vec3;

use crate::kernel;
use crate::morton::MortonKey;
use crate::segments::{TypeSegments, to_u32};
use crate::types::{Aabb, Particle, ParticleData};

/// A leaf node: up to `L` consecutive sorted particles of a single type.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Leaf {
    /// Union of the member positions.
    pub aabb: Aabb,
    /// First member's global sorted slot.
    pub first: u32,
    /// Number of members.
    pub count: u32,
    /// Morton code of the first member; stands for the whole leaf in the hierarchy.
    pub code: u32,
}

impl Leaf {
    /// Sorted slots covered by this leaf.
    pub fn slots(&self) -> core::ops::Range<usize> {
        self.first as usize..(self.first + self.count) as usize
    }
}

/// Leaves plus the particle data gathered into sorted order.
#[derive(Clone, Debug, Default)]
pub struct LeafSet {
    /// One entry per global leaf.
    pub leaves: Vec<Leaf>,
    /// Member positions in sorted slot order.
    pub positions: Vec<Vec3>,
    /// Member particle indices in sorted slot order.
    pub ids: Vec<u32>,
    /// Member body ids in sorted slot order.
    pub bodies: Vec<u32>,
}

/// Gather sorted particles and group each type's slots into leaves of at most
/// `segments.leaf_capacity()` members.
///
/// Leaf `g` of type `t` covers slots `g * L .. min(g * L + L, N_t)` relative to
/// the type's first slot. Empty types produce no leaves.
pub fn merge(keys: &[MortonKey], data: &ParticleData<'_>, segments: &TypeSegments) -> LeafSet {
    let particles: &[Particle] = data.particles;
    let positions = kernel::map(keys.len(), |s| particles[keys[s].id as usize].pos);
    let ids = kernel::map(keys.len(), |s| keys[s].id);
    let bodies = kernel::map(keys.len(), |s| data.body(keys[s].id as usize));

    let cap = segments.leaf_capacity();
    let leaves = kernel::map(segments.n_leaves(), |g| {
        let t = segments.type_of_leaf(g);
        let slots = segments.slots_of(t);
        let first = slots.start + (g - segments.leaf_head()[t]) * cap;
        let end = (first + cap).min(slots.end);
        let mut aabb = Aabb::EMPTY;
        for p in &positions[first..end] {
            aabb.grow(*p);
        }
        Leaf {
            aabb,
            first: to_u32(first),
            count: to_u32(end - first),
            code: keys[first].code,
        }
    });

    LeafSet {
        leaves,
        positions,
        ids,
        bodies,
    }
}
