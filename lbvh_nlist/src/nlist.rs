// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The neighbor-list manager: rebuild decisions, row storage and resizing.

use alloc::vec::Vec;
use glam::Vec3;

use lbvh_index::{
    CutoffMatrix, DEFAULT_LEAF_CAPACITY, Lbvh, NeighborBuffers, ParticleData, SimBox,
    TraversalParams, head_list, traverse,
};

use crate::config::{NeighborListConfig, round_nmax};
use crate::error::Error;
use crate::exclusions::Exclusions;

/// Why a call to [`NeighborList::compute`] rebuilt the list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RebuildReason {
    /// No list existed yet.
    Initial,
    /// A rebuild was requested, or settings that shape the list changed.
    Forced,
    /// The box differs from the one the list was built in.
    BoxChanged,
    /// The number of local particles changed.
    ParticlesChanged,
    /// Some particle moved more than half the buffer.
    Displacement,
    /// The check delay elapsed and the displacement check is disabled.
    Interval,
}

/// Counters accumulated over the life of a [`NeighborList`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NeighborListStats {
    /// Rebuilds performed.
    pub num_builds: u64,
    /// Fewest steps seen between two consecutive rebuilds.
    pub shortest_rebuild: Option<u64>,
    /// Displacement rebuilds that happened on the first step a check was allowed.
    ///
    /// A nonzero value means particles may have crossed the buffer before the
    /// check ran; lower the check delay or raise the buffer.
    pub dangerous_builds: u64,
    /// Times any type's row capacity had to grow.
    pub resize_count: u64,
}

/// A full neighbor list over per-type LBVHs.
///
/// Every local particle owns a row of capacity `Nmax[type]` in one flat
/// array; rows are laid out back to back in particle order. Both `(i, j)` and
/// `(j, i)` are stored for local pairs.
#[derive(Clone, Debug)]
pub struct NeighborList<const L: usize = DEFAULT_LEAF_CAPACITY> {
    config: NeighborListConfig,
    cutoffs: CutoffMatrix,
    exclusions: Exclusions,
    lbvh: Lbvh<L>,
    nmax: Vec<u32>,
    head: Vec<usize>,
    nlist: Vec<u32>,
    n_neigh: Vec<u32>,
    last_pos: Vec<Vec3>,
    last_box: Option<SimBox>,
    last_build_step: Option<u64>,
    force_update: bool,
    stats: NeighborListStats,
}

impl<const L: usize> NeighborList<L> {
    /// A list with no rows yet; the first [`compute`](Self::compute) builds it.
    pub fn new(cutoffs: CutoffMatrix, config: NeighborListConfig) -> Result<Self, Error> {
        cutoffs.validate()?;
        lbvh_index::cutoff::validate_buffer(config.buffer)?;
        let n_types = cutoffs.n_types();
        Ok(Self {
            nmax: alloc::vec![round_nmax(config.initial_nmax); n_types],
            lbvh: Lbvh::new(n_types),
            config,
            cutoffs,
            exclusions: Exclusions::new(),
            head: Vec::new(),
            nlist: Vec::new(),
            n_neigh: Vec::new(),
            last_pos: Vec::new(),
            last_box: None,
            last_build_step: None,
            force_update: false,
            stats: NeighborListStats::default(),
        })
    }

    /// Bring the list up to date for `step`, rebuilding it if needed.
    ///
    /// `tags` maps particle indices to stable tags for exclusion lookup;
    /// without it a particle's tag is its index. Returns why the list was
    /// rebuilt, or `None` if the existing rows are still valid.
    pub fn compute(
        &mut self,
        step: u64,
        data: &ParticleData<'_>,
        tags: Option<&[u32]>,
        sim_box: &SimBox,
    ) -> Result<Option<RebuildReason>, Error> {
        if let Some(tags) = tags
            && tags.len() != data.len()
        {
            return Err(Error::LengthMismatch {
                what: "tags",
                expected: data.len(),
                found: tags.len(),
            });
        }
        let Some(reason) = self.check(step, data, sim_box) else {
            return Ok(None);
        };
        if let Err(err) = self.rebuild(step, data, tags, sim_box, reason) {
            // The rows no longer match the trees; never reuse them.
            self.force_update = true;
            return Err(err);
        }
        Ok(Some(reason))
    }

    fn check(&self, step: u64, data: &ParticleData<'_>, sim_box: &SimBox) -> Option<RebuildReason> {
        let Some(last) = self.last_build_step else {
            return Some(RebuildReason::Initial);
        };
        if self.force_update {
            return Some(RebuildReason::Forced);
        }
        if self.last_box != Some(*sim_box) {
            return Some(RebuildReason::BoxChanged);
        }
        if self.last_pos.len() != data.n_local || data.n_local > data.len() {
            return Some(RebuildReason::ParticlesChanged);
        }
        if step.saturating_sub(last) < self.config.rebuild_check_delay {
            return None;
        }
        if !self.config.check_dist {
            return Some(RebuildReason::Interval);
        }
        self.moved_too_far(data, sim_box)
            .then_some(RebuildReason::Displacement)
    }

    // Whether any local particle left the sphere of radius buffer / 2 around
    // the position it had at the last rebuild.
    fn moved_too_far(&self, data: &ParticleData<'_>, sim_box: &SimBox) -> bool {
        let limit = 0.5 * self.config.buffer;
        let limit_sq = limit * limit;
        data.particles[..data.n_local]
            .iter()
            .zip(&self.last_pos)
            .any(|(p, last)| sim_box.min_image(p.pos - *last).length_squared() > limit_sq)
    }

    fn rebuild(
        &mut self,
        step: u64,
        data: &ParticleData<'_>,
        tags: Option<&[u32]>,
        sim_box: &SimBox,
        reason: RebuildReason,
    ) -> Result<(), Error> {
        let max_r_list = self.cutoffs.max_r_list(self.config.buffer);
        traverse::check_box(sim_box, max_r_list)?;
        self.lbvh.build(data, sim_box, self.config.ghost_width)?;
        self.fill_rows(data, sim_box)?;
        if !self.exclusions.is_empty() {
            self.filter_exclusions(data, tags);
        }

        if let Some(last) = self.last_build_step {
            let period = step.saturating_sub(last);
            self.stats.shortest_rebuild = Some(
                self.stats
                    .shortest_rebuild
                    .map_or(period, |shortest| shortest.min(period)),
            );
            if reason == RebuildReason::Displacement && period == self.config.rebuild_check_delay
            {
                self.stats.dangerous_builds += 1;
                log::debug!("dangerous neighbor-list rebuild at step {step}");
            }
        }
        self.stats.num_builds += 1;
        self.last_box = Some(*sim_box);
        self.last_build_step = Some(step);
        self.force_update = false;
        log::trace!("neighbor list rebuilt at step {step} ({reason:?})");
        Ok(())
    }

    // Traverse until every row fits. After one growth step the capacities
    // cover the true maxima, so the second pass cannot overflow.
    fn fill_rows(&mut self, data: &ParticleData<'_>, sim_box: &SimBox) -> Result<(), Error> {
        let params = TraversalParams {
            cutoffs: &self.cutoffs,
            buffer: self.config.buffer,
            body_filter: self.config.body_filter,
        };
        loop {
            let (head, total) = head_list(data, &self.nmax)?;
            self.head = head;
            self.nlist.clear();
            self.nlist.resize(total, 0);
            self.n_neigh.clear();
            self.n_neigh.resize(data.n_local, 0);
            self.last_pos.clear();
            self.last_pos.resize(data.n_local, Vec3::ZERO);

            let report = self.lbvh.traverse(
                data,
                sim_box,
                &params,
                &self.nmax,
                NeighborBuffers {
                    nlist: &mut self.nlist,
                    head_list: &self.head,
                    n_neigh: &mut self.n_neigh,
                    last_pos: &mut self.last_pos,
                },
            )?;
            if !report.overflowed() {
                return Ok(());
            }
            for (nmax, &required) in self.nmax.iter_mut().zip(report.per_type()) {
                if required > *nmax {
                    *nmax = round_nmax(required);
                }
            }
            self.stats.resize_count += 1;
            log::info!("neighbor row capacity grown to {:?}", self.nmax);
        }
    }

    fn filter_exclusions(&mut self, data: &ParticleData<'_>, tags: Option<&[u32]>) {
        let tag_of = |j: u32| tags.map_or(j, |t| t[j as usize]);
        for i in 0..data.n_local {
            let start = self.head[i];
            let row = &mut self.nlist[start..start + self.n_neigh[i] as usize];
            let kept = self.exclusions.filter_row(tag_of(as_u32(i)), row, tag_of);
            self.n_neigh[i] = as_u32(kept);
        }
    }

    /// Rebuild on the next [`compute`](Self::compute) regardless of displacement.
    pub fn force_update(&mut self) {
        self.force_update = true;
    }

    /// Replace the cutoff matrix; the list is rebuilt on the next compute.
    pub fn set_cutoffs(&mut self, cutoffs: CutoffMatrix) -> Result<(), Error> {
        cutoffs.validate()?;
        if cutoffs.n_types() != self.cutoffs.n_types() {
            return Err(Error::LengthMismatch {
                what: "cutoff matrix",
                expected: self.cutoffs.n_types(),
                found: cutoffs.n_types(),
            });
        }
        self.cutoffs = cutoffs;
        self.force_update = true;
        Ok(())
    }

    /// Exclude the pair of tags `(a, b)`; the list is rebuilt on the next compute.
    pub fn add_exclusion(&mut self, a: u32, b: u32) {
        if self.exclusions.insert(a, b) {
            self.force_update = true;
        }
    }

    /// Drop all exclusions; the list is rebuilt on the next compute.
    pub fn clear_exclusions(&mut self) {
        if !self.exclusions.is_empty() {
            self.exclusions.clear();
            self.force_update = true;
        }
    }

    /// Current exclusions.
    pub fn exclusions(&self) -> &Exclusions {
        &self.exclusions
    }

    /// Settings.
    pub fn config(&self) -> &NeighborListConfig {
        &self.config
    }

    /// Cutoff radii.
    pub fn cutoffs(&self) -> &CutoffMatrix {
        &self.cutoffs
    }

    /// Counters.
    pub fn stats(&self) -> NeighborListStats {
        self.stats
    }

    /// The underlying index, as of the last rebuild.
    pub fn lbvh(&self) -> &Lbvh<L> {
        &self.lbvh
    }

    /// Row capacity per type.
    pub fn nmax(&self) -> &[u32] {
        &self.nmax
    }

    /// Row offsets into [`nlist`](Self::nlist).
    pub fn head_list(&self) -> &[usize] {
        &self.head
    }

    /// Flat row storage.
    pub fn nlist(&self) -> &[u32] {
        &self.nlist
    }

    /// Neighbor count per local particle.
    pub fn n_neigh(&self) -> &[u32] {
        &self.n_neigh
    }

    /// Positions at the last rebuild.
    pub fn last_positions(&self) -> &[Vec3] {
        &self.last_pos
    }

    /// Neighbors of local particle `i`.
    pub fn row(&self, i: usize) -> &[u32] {
        let start = self.head[i];
        &self.nlist[start..start + self.n_neigh[i] as usize]
    }

    /// `(i, neighbors)` for every local particle.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &[u32])> + '_ {
        (0..self.n_neigh.len()).map(|i| (i, self.row(i)))
    }

    /// Every neighboring pair once, as `(i, j)` with `i < j`, sorted.
    pub fn pair_list(&self) -> Vec<(u32, u32)> {
        let mut pairs: Vec<(u32, u32)> = self
            .rows()
            .flat_map(|(i, row)| {
                let i = as_u32(i);
                row.iter().filter(move |&&j| i < j).map(move |&j| (i, j))
            })
            .collect();
        pairs.sort_unstable();
        pairs
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Particle counts are bounded by the 32-bit ids the index stores."
)]
const fn as_u32(v: usize) -> u32 {
    v as u32
}
