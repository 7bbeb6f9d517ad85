// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-type LBVH: build pipeline plus traversal entry point.

use alloc::vec;
use alloc::vec::Vec;
use glam::Vec3;

use crate::error::Error;
use crate::hierarchy::{self, Hierarchy};
use crate::layout::{self, TraversalLayout};
use crate::leaf::{self, LeafSet};
use crate::morton::{self, MortonKey};
use crate::propagate::{self, Propagated};
use crate::segments::TypeSegments;
use crate::sort;
use crate::traverse::{self, NeighborBuffers, OverflowReport, TraversalParams};
use crate::types::{Aabb, ParticleData, SimBox};

/// Leaf capacity used when none is given.
pub const DEFAULT_LEAF_CAPACITY: usize = 4;

/// Counts from one rebuild.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Particles placed in a tree.
    pub placed: usize,
    /// Particles outside the padded box, left out of every tree.
    pub dropped: usize,
    /// Leaves over all types.
    pub leaves: usize,
    /// Internal nodes over all types.
    pub internal: usize,
}

/// One linear BVH per particle type, rebuilt from scratch on every call to
/// [`Lbvh::build`].
///
/// `L` is the maximum number of particles per leaf. The Morton key buffer is
/// reused across rebuilds; the later stages allocate their outputs afresh.
#[derive(Clone, Debug)]
pub struct Lbvh<const L: usize = DEFAULT_LEAF_CAPACITY> {
    n_types: usize,
    segments: TypeSegments,
    keys: Vec<MortonKey>,
    leaf_set: LeafSet,
    hierarchy: Hierarchy,
    propagated: Propagated,
    layout: TraversalLayout,
}

impl<const L: usize> Lbvh<L> {
    /// An empty index for `n_types` particle types.
    pub fn new(n_types: usize) -> Self {
        const { assert!(L > 0, "leaf capacity must be positive") };
        Self {
            n_types,
            segments: TypeSegments::empty(n_types, L),
            keys: Vec::new(),
            leaf_set: LeafSet::default(),
            hierarchy: Hierarchy::default(),
            propagated: Propagated::default(),
            layout: TraversalLayout {
                nodes: Vec::new(),
                head: vec![0; n_types + 1],
            },
        }
    }

    /// Rebuild every tree from the current particle positions.
    ///
    /// Particles whose fractional coordinate in the box padded by
    /// `ghost_width` falls outside `[0, 1.00001)` are left out and counted in
    /// [`BuildSummary::dropped`].
    pub fn build(
        &mut self,
        data: &ParticleData<'_>,
        sim_box: &SimBox,
        ghost_width: Vec3,
    ) -> Result<BuildSummary, Error> {
        self.validate(data, ghost_width)?;

        let marks = morton::mark(data.particles, sim_box, ghost_width);
        let segments = TypeSegments::from_marks(&marks, self.n_types, L)?;
        self.keys.clear();
        self.keys.resize(segments.n_placed(), MortonKey::default());
        morton::encode(data.particles, sim_box, ghost_width, &segments, &mut self.keys);
        sort::sort_segments(&mut self.keys, &segments);

        self.leaf_set = leaf::merge(&self.keys, data, &segments);
        self.hierarchy = hierarchy::generate(&self.leaf_set.leaves, &segments);
        self.propagated = propagate::propagate(&self.leaf_set.leaves, &self.hierarchy);
        self.layout = layout::linearize(
            &self.leaf_set.leaves,
            &self.hierarchy,
            &self.propagated.aabbs,
            &segments,
        );

        let summary = BuildSummary {
            placed: segments.n_placed(),
            dropped: data.len() - segments.n_placed(),
            leaves: segments.n_leaves(),
            internal: segments.n_internal(),
        };
        self.segments = segments;
        if summary.dropped > 0 {
            log::warn!(
                "{} particles lie outside the padded box and were left out of the trees",
                summary.dropped
            );
        }
        log::debug!(
            "rebuilt {} trees: {} leaves, {} internal nodes, {} particles dropped",
            self.n_types,
            summary.leaves,
            summary.internal,
            summary.dropped
        );
        Ok(summary)
    }

    /// Fill neighbor rows for the local particles of `data` against the last build.
    ///
    /// See [`traverse::traverse`] for the row layout and overflow semantics.
    pub fn traverse(
        &self,
        data: &ParticleData<'_>,
        sim_box: &SimBox,
        params: &TraversalParams<'_>,
        nmax: &[u32],
        out: NeighborBuffers<'_>,
    ) -> Result<OverflowReport, Error> {
        if params.cutoffs.n_types() != self.n_types {
            return Err(Error::LengthMismatch {
                what: "cutoff matrix",
                expected: self.n_types,
                found: params.cutoffs.n_types(),
            });
        }
        traverse::traverse(
            &self.layout,
            &self.leaf_set,
            data,
            sim_box,
            params,
            nmax,
            out,
        )
    }

    fn validate(&self, data: &ParticleData<'_>, ghost_width: Vec3) -> Result<(), Error> {
        if let Some(bodies) = data.bodies
            && bodies.len() != data.len()
        {
            return Err(Error::LengthMismatch {
                what: "body ids",
                expected: data.len(),
                found: bodies.len(),
            });
        }
        if data.n_local > data.len() {
            return Err(Error::LengthMismatch {
                what: "particles",
                expected: data.n_local,
                found: data.len(),
            });
        }
        if let Some(value) = ghost_width
            .to_array()
            .into_iter()
            .find(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(Error::InvalidDistance {
                what: "ghost width",
                value,
            });
        }
        match data
            .particles
            .iter()
            .position(|p| p.type_id as usize >= self.n_types)
        {
            Some(i) => Err(Error::TypeOutOfRange {
                particle: i,
                type_id: data.particles[i].type_id,
                n_types: self.n_types,
            }),
            None => Ok(()),
        }
    }

    /// Number of particle types.
    pub fn n_types(&self) -> usize {
        self.n_types
    }

    /// Segment tables of the last build.
    pub fn segments(&self) -> &TypeSegments {
        &self.segments
    }

    /// Sorted Morton keys of the last build.
    pub fn keys(&self) -> &[MortonKey] {
        &self.keys
    }

    /// Leaves and gathered particle data of the last build.
    pub fn leaves(&self) -> &LeafSet {
        &self.leaf_set
    }

    /// Tree topology of the last build.
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Leaf boxes followed by internal-node boxes.
    pub fn aabbs(&self) -> &[Aabb] {
        &self.propagated.aabbs
    }

    /// Arrivals per internal node during box propagation.
    pub fn visits(&self) -> &[u32] {
        &self.propagated.visits
    }

    /// Linearized trees.
    pub fn layout(&self) -> &TraversalLayout {
        &self.layout
    }

    /// Bounds of all particles of type `t`, or `None` if the type is empty.
    pub fn root_aabb(&self, t: usize) -> Option<Aabb> {
        self.layout.tree(t).first().map(|n| n.aabb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Particle;

    fn lattice(n: usize, spacing: f32, types: u32) -> Vec<Particle> {
        let mut out = Vec::new();
        let offset = -0.5 * n as f32 * spacing;
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    let pos = Vec3::new(i as f32, j as f32, k as f32) * spacing + offset;
                    out.push(Particle::new(pos, ((i + j + k) as u32) % types));
                }
            }
        }
        out
    }

    #[test]
    fn build_counts_and_invariants() {
        let particles = lattice(6, 1.0, 2);
        let mut lbvh: Lbvh = Lbvh::new(3);
        let summary = lbvh
            .build(&ParticleData::new(&particles), &SimBox::cube(6.0), Vec3::ZERO)
            .unwrap();
        assert_eq!(summary.placed, 216);
        assert_eq!(summary.dropped, 0);
        assert_eq!(summary.leaves, 27 + 27);
        assert_eq!(summary.internal, 26 + 26);
        assert!(lbvh.visits().iter().all(|&v| v == 2));
        assert!(lbvh.root_aabb(2).is_none());
        let root0 = lbvh.root_aabb(0).unwrap();
        for (slot, p) in lbvh.leaves().positions.iter().enumerate() {
            if lbvh.segments().slots_of(0).contains(&slot) {
                assert!(root0.contains_point(*p));
            }
        }
    }

    #[test]
    fn keys_are_sorted_per_type() {
        let particles = lattice(5, 1.1, 3);
        let mut lbvh: Lbvh<2> = Lbvh::new(3);
        lbvh.build(&ParticleData::new(&particles), &SimBox::cube(5.5), Vec3::ZERO)
            .unwrap();
        for t in 0..3 {
            let keys = &lbvh.keys()[lbvh.segments().slots_of(t)];
            assert!(keys.windows(2).all(|w| w[0].code <= w[1].code));
            assert!(keys
                .iter()
                .all(|k| particles[k.id as usize].type_id as usize == t));
        }
    }

    #[test]
    fn rebuild_is_deterministic() {
        let particles = lattice(7, 0.9, 2);
        let data = ParticleData::new(&particles);
        let b = SimBox::cube(6.3);
        let mut a: Lbvh = Lbvh::new(2);
        let mut c: Lbvh = Lbvh::new(2);
        a.build(&data, &b, Vec3::ZERO).unwrap();
        c.build(&data, &b, Vec3::ZERO).unwrap();
        c.build(&data, &b, Vec3::ZERO).unwrap();
        assert_eq!(a.keys(), c.keys());
        assert_eq!(a.hierarchy().nodes, c.hierarchy().nodes);
        assert_eq!(a.layout().nodes, c.layout().nodes);
    }

    #[test]
    fn out_of_box_particles_are_dropped() {
        let particles = [
            Particle::new(Vec3::ZERO, 0),
            Particle::new(Vec3::new(9.0, 0.0, 0.0), 0),
            Particle::new(Vec3::new(0.5, 0.5, 0.5), 0),
        ];
        let mut lbvh: Lbvh = Lbvh::new(1);
        let summary = lbvh
            .build(&ParticleData::new(&particles), &SimBox::cube(4.0), Vec3::ZERO)
            .unwrap();
        assert_eq!(summary.dropped, 1);
        assert!(lbvh.leaves().ids.iter().all(|&id| id != 1));

        // The same particle fits once the box is padded.
        let summary = lbvh
            .build(
                &ParticleData::new(&particles),
                &SimBox::cube(4.0),
                Vec3::splat(8.0),
            )
            .unwrap();
        assert_eq!(summary.dropped, 0);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let particles = [Particle::new(Vec3::ZERO, 4)];
        let mut lbvh: Lbvh = Lbvh::new(2);
        let b = SimBox::cube(4.0);
        assert_eq!(
            lbvh.build(&ParticleData::new(&particles), &b, Vec3::ZERO),
            Err(Error::TypeOutOfRange {
                particle: 0,
                type_id: 4,
                n_types: 2
            })
        );
        let particles = [Particle::new(Vec3::ZERO, 0)];
        let bodies = [0, 1];
        let data = ParticleData::new(&particles).with_bodies(&bodies);
        assert!(matches!(
            lbvh.build(&data, &b, Vec3::ZERO),
            Err(Error::LengthMismatch { what: "body ids", .. })
        ));
        assert!(matches!(
            lbvh.build(&ParticleData::new(&particles), &b, Vec3::splat(-1.0)),
            Err(Error::InvalidDistance { .. })
        ));
    }

    #[test]
    fn empty_system_builds() {
        let mut lbvh: Lbvh = Lbvh::new(2);
        let summary = lbvh
            .build(&ParticleData::new(&[]), &SimBox::cube(3.0), Vec3::ZERO)
            .unwrap();
        assert_eq!(summary, BuildSummary::default());
        assert!(lbvh.layout().tree(0).is_empty());
    }
}
