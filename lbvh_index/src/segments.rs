// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-type segment tables.
//!
//! Every flat array of a rebuild is partitioned into disjoint, contiguous
//! per-type ranges. This module builds the prefix-sum tables that address
//! those ranges, once per rebuild, so that every phase takes them as explicit
//! input:
//!
//! - particle slots `type_head[t]..type_head[t + 1]` (sorted particle order),
//! - leaves `leaf_head[t]..leaf_head[t + 1]`,
//! - internal nodes `internal_head[t]..internal_head[t + 1]`.
//!
//! A type with `N` particles owns `ceil(N / L)` leaves and, when it has at
//! least one leaf, one internal node fewer than leaves. Empty types own
//! nothing.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::Error;
use crate::types::Particle;

/// Placement mark of a particle that takes no slot in this rebuild.
pub const UNPLACED: u32 = u32::MAX;

/// Prefix tables and placement ranks for one rebuild.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSegments {
    leaf_capacity: usize,
    counts: Vec<usize>,
    type_head: Vec<usize>,
    leaf_head: Vec<usize>,
    internal_head: Vec<usize>,
    ranks: Vec<u32>,
    marks: Vec<u32>,
}

impl TypeSegments {
    /// Build the tables from a per-particle placement map.
    ///
    /// `marks[i]` is the type of particle `i`, or [`UNPLACED`] if it takes no
    /// slot. The rank of a placed particle is its exclusive-scan position among
    /// placed particles of the same type, so slots within a type follow
    /// ascending particle index.
    pub fn from_marks(marks: &[u32], n_types: usize, leaf_capacity: usize) -> Result<Self, Error> {
        assert!(leaf_capacity > 0, "leaf capacity must be positive");
        let mut counts = vec![0_usize; n_types];
        let mut ranks = vec![UNPLACED; marks.len()];
        for (i, &t) in marks.iter().enumerate() {
            if t == UNPLACED {
                continue;
            }
            let slot = counts.get_mut(t as usize).ok_or(Error::TypeOutOfRange {
                particle: i,
                type_id: t,
                n_types,
            })?;
            ranks[i] = to_u32(*slot);
            *slot += 1;
        }

        let type_head = exclusive_scan(counts.iter().copied());
        let leaf_head = exclusive_scan(counts.iter().map(|&n| n.div_ceil(leaf_capacity)));
        let internal_head = exclusive_scan(
            counts
                .iter()
                .map(|&n| n.div_ceil(leaf_capacity).saturating_sub(1)),
        );

        Ok(Self {
            leaf_capacity,
            counts,
            type_head,
            leaf_head,
            internal_head,
            ranks,
            marks: marks.to_vec(),
        })
    }

    /// Tables for a rebuild that placed nothing.
    pub fn empty(n_types: usize, leaf_capacity: usize) -> Self {
        Self {
            leaf_capacity,
            counts: vec![0; n_types],
            type_head: vec![0; n_types + 1],
            leaf_head: vec![0; n_types + 1],
            internal_head: vec![0; n_types + 1],
            ranks: Vec::new(),
            marks: Vec::new(),
        }
    }

    /// Build the tables placing every particle under its own type.
    pub fn from_particles(
        particles: &[Particle],
        n_types: usize,
        leaf_capacity: usize,
    ) -> Result<Self, Error> {
        let marks: Vec<u32> = particles.iter().map(|p| p.type_id).collect();
        Self::from_marks(&marks, n_types, leaf_capacity)
    }

    /// Number of particle types.
    pub fn n_types(&self) -> usize {
        self.counts.len()
    }

    /// Maximum number of particles per leaf.
    pub fn leaf_capacity(&self) -> usize {
        self.leaf_capacity
    }

    /// Placed particles of type `t`.
    pub fn count(&self, t: usize) -> usize {
        self.counts[t]
    }

    /// Total number of placed particles.
    pub fn n_placed(&self) -> usize {
        self.type_head.last().copied().unwrap_or(0)
    }

    /// Total number of leaves over all types.
    pub fn n_leaves(&self) -> usize {
        self.leaf_head.last().copied().unwrap_or(0)
    }

    /// Total number of internal nodes over all types.
    pub fn n_internal(&self) -> usize {
        self.internal_head.last().copied().unwrap_or(0)
    }

    /// Particle-slot offsets table (length `n_types + 1`).
    pub fn type_head(&self) -> &[usize] {
        &self.type_head
    }

    /// Leaf offsets table (length `n_types + 1`).
    pub fn leaf_head(&self) -> &[usize] {
        &self.leaf_head
    }

    /// Internal-node offsets table (length `n_types + 1`).
    pub fn internal_head(&self) -> &[usize] {
        &self.internal_head
    }

    /// Per-type leaf range.
    pub fn leaves_of(&self, t: usize) -> core::ops::Range<usize> {
        self.leaf_head[t]..self.leaf_head[t + 1]
    }

    /// Per-type particle-slot range.
    pub fn slots_of(&self, t: usize) -> core::ops::Range<usize> {
        self.type_head[t]..self.type_head[t + 1]
    }

    /// Per-type internal-node range.
    pub fn internal_of(&self, t: usize) -> core::ops::Range<usize> {
        self.internal_head[t]..self.internal_head[t + 1]
    }

    /// Placement mark of particle `i` (its type, or [`UNPLACED`]).
    pub fn mark(&self, i: usize) -> u32 {
        self.marks[i]
    }

    /// Rank of particle `i` within its type, or [`UNPLACED`].
    pub fn rank(&self, i: usize) -> u32 {
        self.ranks[i]
    }

    /// Global sorted slot of particle `i`, if it was placed.
    pub fn slot(&self, i: usize) -> Option<usize> {
        let t = self.marks[i];
        (t != UNPLACED).then(|| self.type_head[t as usize] + self.ranks[i] as usize)
    }

    /// Type owning global leaf `leaf`.
    pub fn type_of_leaf(&self, leaf: usize) -> usize {
        owner(&self.leaf_head, leaf)
    }

    /// Type owning global internal node `node`.
    pub fn type_of_internal(&self, node: usize) -> usize {
        owner(&self.internal_head, node)
    }
}

// Segment `t` with `head[t] <= i < head[t + 1]`; empty segments are skipped.
fn owner(head: &[usize], i: usize) -> usize {
    head.partition_point(|&h| h <= i) - 1
}

fn exclusive_scan(values: impl Iterator<Item = usize>) -> Vec<usize> {
    let mut out = vec![0];
    let mut acc = 0;
    for v in values {
        acc += v;
        out.push(acc);
    }
    out
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Particle counts are bounded by the 32-bit ids stored in every array."
)]
pub(crate) const fn to_u32(v: usize) -> u32 {
    v as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_follow_particle_order_within_type() {
        let marks = [1, 0, 1, UNPLACED, 1, 0];
        let seg = TypeSegments::from_marks(&marks, 3, 2).unwrap();
        assert_eq!(seg.type_head(), &[0, 2, 5, 5]);
        assert_eq!(seg.rank(0), 0);
        assert_eq!(seg.rank(2), 1);
        assert_eq!(seg.rank(4), 2);
        assert_eq!(seg.rank(3), UNPLACED);
        assert_eq!(seg.slot(5), Some(1));
        assert_eq!(seg.slot(4), Some(4));
        assert_eq!(seg.slot(3), None);
    }

    #[test]
    fn leaf_and_internal_counts() {
        // Type 0: 5 particles -> 3 leaves, 2 internal.
        // Type 1: 0 particles -> nothing.
        // Type 2: 2 particles -> 1 leaf, 0 internal.
        let marks = [0, 0, 0, 0, 0, 2, 2];
        let seg = TypeSegments::from_marks(&marks, 3, 2).unwrap();
        assert_eq!(seg.leaf_head(), &[0, 3, 3, 4]);
        assert_eq!(seg.internal_head(), &[0, 2, 2, 2]);
        assert_eq!(seg.n_leaves(), 4);
        assert_eq!(seg.n_internal(), 2);
        assert_eq!(seg.type_of_leaf(0), 0);
        assert_eq!(seg.type_of_leaf(2), 0);
        // Leaf 3 belongs to type 2; the empty type 1 is skipped.
        assert_eq!(seg.type_of_leaf(3), 2);
        assert_eq!(seg.type_of_internal(1), 0);
    }

    #[test]
    fn empty_input_has_no_underflow() {
        let seg = TypeSegments::from_marks(&[], 4, 8).unwrap();
        assert_eq!(seg.n_leaves(), 0);
        assert_eq!(seg.n_internal(), 0);
        assert_eq!(seg.n_placed(), 0);
        assert!((0..4).all(|t| seg.leaves_of(t).is_empty()));
    }

    #[test]
    fn out_of_range_type_is_an_error() {
        let err = TypeSegments::from_marks(&[0, 5], 2, 4).unwrap_err();
        assert_eq!(
            err,
            Error::TypeOutOfRange {
                particle: 1,
                type_id: 5,
                n_types: 2
            }
        );
    }
}
