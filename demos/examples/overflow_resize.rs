// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overflow and resize.
//!
//! Start a neighbor list with rows far too short for a dense liquid, watch it
//! grow the per-type capacity, then drift the particles and let the
//! displacement check decide when to rebuild.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p lbvh_demos --example overflow_resize`

use glam::Vec3;
use lbvh_index::{CutoffMatrix, Particle, ParticleData, SimBox};
use lbvh_nlist::{NeighborList, NeighborListConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() {
    colog::basic_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let n = 4_000;
    let edge = 16.0;
    let sim_box = SimBox::cube(edge);
    let mut rng = StdRng::seed_from_u64(42);
    let mut particles: Vec<Particle> = (0..n)
        .map(|i| {
            let f = Vec3::new(rng.random(), rng.random(), rng.random());
            Particle::new(sim_box.make_coordinates(f), (i % 2) as u32)
        })
        .collect();

    // Big-small mixture: the small pair interacts over a shorter range.
    let cutoffs = CutoffMatrix::uniform(2, 2.0).with_pair(1, 1, 1.2);
    let config = NeighborListConfig::default()
        .with_buffer(0.4)
        .with_initial_nmax(8);
    let mut list: NeighborList = NeighborList::new(cutoffs, config).unwrap();

    for step in 0..20_u64 {
        let reason = list
            .compute(step, &ParticleData::new(&particles), None, &sim_box)
            .unwrap();
        if let Some(reason) = reason {
            println!(
                "step {step:>2}: rebuilt ({reason:?}), Nmax = {:?}, {} unique pairs",
                list.nmax(),
                list.pair_list().len()
            );
        }
        for p in &mut particles {
            let kick = Vec3::new(
                rng.random_range(-0.5..0.5),
                rng.random_range(-0.5..0.5),
                rng.random_range(-0.5..0.5),
            );
            let moved = p.pos + 0.05 * kick;
            // Wrap back into the box.
            let f = sim_box.make_fraction(moved, Vec3::ZERO);
            p.pos = sim_box.make_coordinates(f - f.floor());
        }
    }

    let stats = list.stats();
    println!(
        "{} builds, shortest period {:?}, {} dangerous, {} resizes",
        stats.num_builds, stats.shortest_rebuild, stats.dangerous_builds, stats.resize_count
    );
}
