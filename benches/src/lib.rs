// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared particle generators for the benches.

use glam::Vec3;
use lbvh_index::Particle;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `n` particles uniformly distributed in a cube of edge `edge` centered on the origin.
pub fn uniform_particles(seed: u64, n: usize, edge: f32, n_types: u32) -> Vec<Particle> {
    let mut rng = StdRng::seed_from_u64(seed);
    let half = 0.5 * edge;
    (0..n)
        .map(|_| {
            let pos = Vec3::new(
                rng.random_range(-half..half),
                rng.random_range(-half..half),
                rng.random_range(-half..half),
            );
            Particle::new(pos, rng.random_range(0..n_types))
        })
        .collect()
}

/// Cube edge that gives `n` particles the number density `density`.
pub fn edge_for_density(n: usize, density: f32) -> f32 {
    (n as f32 / density).cbrt()
}
