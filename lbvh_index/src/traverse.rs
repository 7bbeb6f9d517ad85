// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stackless neighbor traversal.
//!
//! One task per local particle. For every type pair with a positive cutoff the
//! task walks that type's linearized tree once per periodic image, pruning by
//! box overlap and testing leaf members against `r_cut + buffer`. Rows are
//! disjoint slices of the caller's flat list, so tasks never share output.
//!
//! Every in-range neighbor is counted even when the row is full; only the
//! first `Nmax` are stored. A row whose count exceeds its capacity raises the
//! per-type overflow maximum so the caller can grow `Nmax` and traverse again.

use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};
use glam::Vec3;

use crate::cutoff::{CutoffMatrix, validate_buffer};
use crate::error::Error;
use crate::kernel;
use crate::layout::{TraversalLayout, TraversalNode};
use crate::leaf::LeafSet;
use crate::segments::to_u32;
use crate::types::{Aabb, NO_BODY, ParticleData, SimBox};

/// Search parameters for one traversal.
#[derive(Copy, Clone, Debug)]
pub struct TraversalParams<'a> {
    /// Per-type-pair cutoff radii.
    pub cutoffs: &'a CutoffMatrix,
    /// Skin added to every cutoff.
    pub buffer: f32,
    /// Skip pairs in the same rigid body.
    pub body_filter: bool,
}

impl TraversalParams<'_> {
    /// Longest search radius over all interacting pairs.
    pub fn max_r_list(&self) -> f32 {
        self.cutoffs.max_r_list(self.buffer)
    }
}

/// Caller-owned output arrays of a traversal.
///
/// Row `i` is `nlist[head_list[i]..head_list[i] + Nmax[type_i]]`. Rows must
/// be in ascending order and must not overlap.
#[derive(Debug)]
pub struct NeighborBuffers<'a> {
    /// Flat neighbor storage.
    pub nlist: &'a mut [u32],
    /// Row offset of each local particle.
    pub head_list: &'a [usize],
    /// True neighbor count of each local particle, possibly above its capacity.
    pub n_neigh: &'a mut [u32],
    /// Position of each local particle at traversal time.
    pub last_pos: &'a mut [Vec3],
}

/// Largest neighbor count seen per type among overflowing rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OverflowReport {
    per_type: Vec<u32>,
}

impl OverflowReport {
    /// Whether any row ran out of space.
    pub fn overflowed(&self) -> bool {
        self.per_type.iter().any(|&n| n > 0)
    }

    /// Capacity type `t` needs; zero if none of its rows overflowed.
    pub fn required(&self, t: usize) -> u32 {
        self.per_type[t]
    }

    /// Per-type maxima.
    pub fn per_type(&self) -> &[u32] {
        &self.per_type
    }
}

struct Row<'a> {
    list: &'a mut [u32],
    count: &'a mut u32,
    last_pos: &'a mut Vec3,
}

/// Fail when a periodic direction is narrower than twice `max_r_list`.
///
/// Below that width one particle could see another through two images.
pub fn check_box(sim_box: &SimBox, max_r_list: f32) -> Result<(), Error> {
    if max_r_list <= 0.0 {
        return Ok(());
    }
    let width = sim_box.nearest_plane_distance();
    let required = 2.0 * max_r_list;
    for axis in 0..3 {
        if sim_box.periodic().is_periodic(axis) && width[axis] < required {
            return Err(Error::BoxTooSmall {
                axis,
                width: width[axis],
                required,
            });
        }
    }
    Ok(())
}

/// Visit the first slot of every leaf whose box overlaps `query`, in tree order.
///
/// Calls `visit(first, count)` per overlapping leaf.
pub fn walk(tree: &[TraversalNode], query: &Aabb, mut visit: impl FnMut(usize, usize)) {
    let mut cursor = 0;
    while cursor < tree.len() {
        let node = &tree[cursor];
        if !query.overlaps(&node.aabb) {
            cursor += node.skip as usize;
            continue;
        }
        if node.is_leaf() {
            visit(node.first as usize, node.count as usize);
        }
        cursor += 1;
    }
}

/// Fill neighbor rows for every local particle.
///
/// `nmax[t]` is the row capacity of type `t` particles. Returns the overflow
/// report; rows that overflowed hold their first `nmax` neighbors only.
pub fn traverse(
    layout: &TraversalLayout,
    leaves: &LeafSet,
    data: &ParticleData<'_>,
    sim_box: &SimBox,
    params: &TraversalParams<'_>,
    nmax: &[u32],
    out: NeighborBuffers<'_>,
) -> Result<OverflowReport, Error> {
    let n_types = params.cutoffs.n_types();
    params.cutoffs.validate()?;
    validate_buffer(params.buffer)?;
    check_len("type capacity table", n_types, nmax.len())?;
    check_len("tree table", n_types + 1, layout.head.len())?;
    let n_local = data.n_local;
    check_len("head list", n_local, out.head_list.len())?;
    check_len("neighbor counts", n_local, out.n_neigh.len())?;
    check_len("last positions", n_local, out.last_pos.len())?;
    if n_local > data.len() {
        return Err(Error::LengthMismatch {
            what: "particles",
            expected: n_local,
            found: data.len(),
        });
    }
    for (i, p) in data.particles[..n_local].iter().enumerate() {
        if p.type_id as usize >= n_types {
            return Err(Error::TypeOutOfRange {
                particle: i,
                type_id: p.type_id,
                n_types,
            });
        }
    }
    check_box(sim_box, params.max_r_list())?;

    let caps = data.particles[..n_local]
        .iter()
        .map(|p| nmax[p.type_id as usize] as usize);
    let lists = split_rows(out.nlist, out.head_list, caps)?;
    let mut rows: Vec<Row<'_>> = lists
        .into_iter()
        .zip(out.n_neigh.iter_mut())
        .zip(out.last_pos.iter_mut())
        .map(|((list, count), last_pos)| Row {
            list,
            count,
            last_pos,
        })
        .collect();

    let images = sim_box.image_vectors();
    let overflow: Vec<AtomicU32> = (0..n_types).map(|_| AtomicU32::new(0)).collect();

    kernel::launch_mut(&mut rows, |i, row| {
        let p = data.particles[i];
        let ti = p.type_id as usize;
        let body = data.body(i);
        let cap = row.list.len();
        let mut n = 0_usize;
        for tj in 0..n_types {
            let Some(r_list) = params.cutoffs.r_list(ti, tj, params.buffer) else {
                continue;
            };
            let tree = layout.tree(tj);
            let r_sq = r_list * r_list;
            for (image, shift) in images.iter().enumerate() {
                let q = p.pos + *shift;
                walk(tree, &Aabb::around(q, r_list), |first, count| {
                    for slot in first..first + count {
                        let j = leaves.ids[slot];
                        if image == 0 && j as usize == i {
                            continue;
                        }
                        if params.body_filter && body != NO_BODY && leaves.bodies[slot] == body {
                            continue;
                        }
                        if (leaves.positions[slot] - q).length_squared() <= r_sq {
                            if n < cap {
                                row.list[n] = j;
                            }
                            n += 1;
                        }
                    }
                });
            }
        }
        *row.count = to_u32(n);
        *row.last_pos = p.pos;
        if n > cap {
            overflow[ti].fetch_max(to_u32(n), Ordering::Relaxed);
        }
    });

    let report = OverflowReport {
        per_type: overflow.into_iter().map(AtomicU32::into_inner).collect(),
    };
    if report.overflowed() {
        log::debug!("neighbor rows overflowed, per-type maxima {:?}", report.per_type);
    }
    Ok(report)
}

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), Error> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            what,
            expected,
            found,
        })
    }
}

// Carve one mutable row per head-list entry out of `nlist`.
fn split_rows<'a>(
    mut rest: &'a mut [u32],
    head_list: &[usize],
    caps: impl Iterator<Item = usize>,
) -> Result<Vec<&'a mut [u32]>, Error> {
    let mut rows = Vec::with_capacity(head_list.len());
    let mut offset = 0;
    for (particle, (&head, cap)) in head_list.iter().zip(caps).enumerate() {
        let bad = || Error::InvalidHeadList { particle };
        let gap = head.checked_sub(offset).ok_or_else(bad)?;
        let end = gap.checked_add(cap).ok_or_else(bad)?;
        if end > rest.len() {
            return Err(bad());
        }
        let (_, tail) = core::mem::take(&mut rest).split_at_mut(gap);
        let (row, tail) = tail.split_at_mut(cap);
        rows.push(row);
        rest = tail;
        offset = head + cap;
    }
    Ok(rows)
}

/// Head list for rows laid out back to back: `head[i]` is the sum of the
/// capacities of particles `0..i`. Returns the list and the total length.
///
/// Fails with [`Error::TypeOutOfRange`] if a local particle's type has no
/// entry in `nmax`.
pub fn head_list(data: &ParticleData<'_>, nmax: &[u32]) -> Result<(Vec<usize>, usize), Error> {
    let mut head = vec![0; data.n_local];
    let mut total = 0;
    for (particle, (h, p)) in head.iter_mut().zip(data.particles).enumerate() {
        let cap = nmax
            .get(p.type_id as usize)
            .ok_or(Error::TypeOutOfRange {
                particle,
                type_id: p.type_id,
                n_types: nmax.len(),
            })?;
        *h = total;
        total += *cap as usize;
    }
    Ok((head, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Particle, Periodic};

    #[test]
    fn rows_must_not_overlap_or_overrun() {
        let mut list = [0_u32; 10];
        let rows = split_rows(&mut list, &[0, 4, 6], [4, 2, 4].into_iter()).unwrap();
        assert_eq!(rows.iter().map(|r| r.len()).collect::<Vec<_>>(), [4, 2, 4]);

        let mut list = [0_u32; 10];
        let err = split_rows(&mut list, &[0, 3], [4, 2].into_iter()).unwrap_err();
        assert_eq!(err, Error::InvalidHeadList { particle: 1 });

        let mut list = [0_u32; 10];
        let err = split_rows(&mut list, &[0, 8], [4, 4].into_iter()).unwrap_err();
        assert_eq!(err, Error::InvalidHeadList { particle: 1 });
    }

    #[test]
    fn gaps_between_rows_are_allowed() {
        let mut list = [0_u32; 12];
        let rows = split_rows(&mut list, &[2, 8], [3, 4].into_iter()).unwrap();
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[1].len(), 4);
    }

    #[test]
    fn box_width_check_respects_periodicity() {
        let b = SimBox::cube(4.0);
        assert!(check_box(&b, 2.0).is_ok());
        assert_eq!(
            check_box(&b, 2.5),
            Err(Error::BoxTooSmall {
                axis: 0,
                width: 4.0,
                required: 5.0
            })
        );
        let open = b.with_periodic(Periodic::empty());
        assert!(check_box(&open, 2.5).is_ok());
        let slab = b.with_periodic(Periodic::Z);
        assert!(matches!(check_box(&slab, 2.5), Err(Error::BoxTooSmall { axis: 2, .. })));
    }

    #[test]
    fn tilted_box_uses_plane_distance() {
        // A heavy xy tilt brings the faces normal to the first lattice direction closer than Lx.
        let b = SimBox::new(Vec3::new(10.0, 10.0, 10.0)).with_tilt(1.0, 0.0, 0.0);
        assert!(matches!(check_box(&b, 4.0), Err(Error::BoxTooSmall { axis: 0, .. })));
        assert!(check_box(&b, 3.0).is_ok());
    }

    #[test]
    fn walk_prunes_disjoint_subtrees() {
        let leaf = |x: f32, first: u32| TraversalNode {
            aabb: Aabb::from_point(Vec3::new(x, 0.0, 0.0)),
            skip: 1,
            first,
            count: 1,
        };
        let inner = |lo: f32, hi: f32, skip: u32| TraversalNode {
            aabb: Aabb::new(Vec3::new(lo, 0.0, 0.0), Vec3::new(hi, 0.0, 0.0)),
            skip,
            first: 0,
            count: 0,
        };
        let tree = [
            inner(0.0, 3.0, 7),
            inner(0.0, 1.0, 3),
            leaf(0.0, 0),
            leaf(1.0, 1),
            inner(2.0, 3.0, 3),
            leaf(2.0, 2),
            leaf(3.0, 3),
        ];
        let mut seen = Vec::new();
        walk(&tree, &Aabb::around(Vec3::new(2.2, 0.0, 0.0), 0.5), |first, _| {
            seen.push(first);
        });
        assert_eq!(seen, [2]);

        seen.clear();
        walk(&tree, &Aabb::around(Vec3::new(1.5, 0.0, 0.0), 0.5), |first, _| {
            seen.push(first);
        });
        assert_eq!(seen, [1, 2]);
    }

    #[test]
    fn head_list_packs_rows_by_type_capacity() {
        let particles = [
            Particle::new(Vec3::ZERO, 1),
            Particle::new(Vec3::ZERO, 0),
            Particle::new(Vec3::ZERO, 1),
        ];
        let data = ParticleData::new(&particles).with_n_local(2);
        let (head, total) = head_list(&data, &[8, 16]).unwrap();
        assert_eq!(head, [0, 16]);
        assert_eq!(total, 24);
    }

    #[test]
    fn head_list_rejects_types_without_capacity() {
        let particles = [Particle::new(Vec3::ZERO, 0), Particle::new(Vec3::ZERO, 2)];
        let data = ParticleData::new(&particles);
        assert_eq!(
            head_list(&data, &[8, 16]),
            Err(Error::TypeOutOfRange {
                particle: 1,
                type_id: 2,
                n_types: 2
            })
        );
        // Ghosts are not given rows, so their types are not checked.
        let data = data.with_n_local(1);
        assert_eq!(head_list(&data, &[8]).unwrap(), (vec![0], 8));
    }
}
