// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! All-pairs neighbor search used to cross-check the tree traversal.
//!
//! Applies the same domain filter, images and exclusions as
//! [`traverse`](crate::traverse::traverse), so on valid input its rows match
//! the traversal's as sets. Quadratic; meant for tests and small systems.

use alloc::vec::Vec;
use glam::Vec3;

use crate::kernel;
use crate::morton;
use crate::segments::to_u32;
use crate::traverse::TraversalParams;
use crate::types::{NO_BODY, ParticleData, SimBox};

/// Sorted neighbor row of every local particle.
///
/// Inputs must be ones [`Lbvh::build`](crate::Lbvh::build) accepts.
pub fn brute_force(
    data: &ParticleData<'_>,
    sim_box: &SimBox,
    ghost_width: Vec3,
    params: &TraversalParams<'_>,
) -> Vec<Vec<u32>> {
    let images = sim_box.image_vectors();
    let placed: Vec<bool> = data
        .particles
        .iter()
        .map(|p| morton::code_of(p.pos, sim_box, ghost_width).is_some())
        .collect();

    kernel::map(data.n_local, |i| {
        let p = data.particles[i];
        let body = data.body(i);
        let mut row = Vec::new();
        for (j, other) in data.particles.iter().enumerate() {
            if !placed[j] {
                continue;
            }
            let Some(r_list) =
                params
                    .cutoffs
                    .r_list(p.type_id as usize, other.type_id as usize, params.buffer)
            else {
                continue;
            };
            if params.body_filter && body != NO_BODY && data.body(j) == body {
                continue;
            }
            for (image, shift) in images.iter().enumerate() {
                if image == 0 && i == j {
                    continue;
                }
                let dr = other.pos - (p.pos + *shift);
                if dr.length_squared() <= r_list * r_list {
                    row.push(to_u32(j));
                }
            }
        }
        row.sort_unstable();
        row
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutoff::CutoffMatrix;
    use crate::types::Particle;
    use alloc::vec;

    #[test]
    fn finds_neighbors_across_the_boundary() {
        let particles = [
            Particle::new(Vec3::new(-1.9, 0.0, 0.0), 0),
            Particle::new(Vec3::new(1.9, 0.0, 0.0), 0),
            Particle::new(Vec3::new(0.0, 0.0, 0.0), 0),
        ];
        let cutoffs = CutoffMatrix::uniform(1, 0.5);
        let params = TraversalParams {
            cutoffs: &cutoffs,
            buffer: 0.0,
            body_filter: false,
        };
        let rows = brute_force(
            &ParticleData::new(&particles),
            &SimBox::cube(4.0),
            Vec3::ZERO,
            &params,
        );
        assert_eq!(rows, [vec![1], vec![0], vec![]]);
    }

    #[test]
    fn honors_bodies() {
        let particles = [
            Particle::new(Vec3::new(0.0, 0.0, 0.0), 0),
            Particle::new(Vec3::new(0.3, 0.0, 0.0), 0),
            Particle::new(Vec3::new(0.0, 0.3, 0.0), 0),
        ];
        let bodies = [7, 7, NO_BODY];
        let cutoffs = CutoffMatrix::uniform(1, 1.0);
        let params = TraversalParams {
            cutoffs: &cutoffs,
            buffer: 0.0,
            body_filter: true,
        };
        let data = ParticleData::new(&particles).with_bodies(&bodies);
        let rows = brute_force(&data, &SimBox::cube(5.0), Vec3::ZERO, &params);
        assert_eq!(rows, [vec![2], vec![2], vec![0, 1]]);
    }
}
