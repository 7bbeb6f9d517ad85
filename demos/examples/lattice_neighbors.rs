// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lattice neighbors.
//!
//! Build the trees over a face-centered cubic crystal and check that every
//! site sees its 12 nearest neighbors, in a cubic and in a sheared box.
//!
//! Run:
//! - `cargo run -p lbvh_demos --example lattice_neighbors`

use glam::Vec3;
use lbvh_index::{
    CutoffMatrix, Lbvh, NeighborBuffers, Particle, ParticleData, SimBox, TraversalParams,
    head_list, reference,
};

const CELLS: usize = 6;

// Sites of a unit-spacing FCC crystal filling a cube of `cells` cells,
// wrapped into `sim_box`.
fn fcc(cells: usize, sim_box: &SimBox) -> Vec<Particle> {
    let basis = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.5, 0.5, 0.0),
        Vec3::new(0.5, 0.0, 0.5),
        Vec3::new(0.0, 0.5, 0.5),
    ];
    let origin = Vec3::splat(-0.5 * cells as f32);
    let mut out = Vec::with_capacity(4 * cells * cells * cells);
    for i in 0..cells {
        for j in 0..cells {
            for k in 0..cells {
                let cell = Vec3::new(i as f32, j as f32, k as f32);
                for b in basis {
                    // Offset by a quarter cell so no site sits on a box face.
                    let pos = origin + cell + b + 0.25;
                    let f = sim_box.make_fraction(pos, Vec3::ZERO);
                    out.push(Particle::new(sim_box.make_coordinates(f - f.floor()), 0));
                }
            }
        }
    }
    out
}

fn count_neighbors(label: &str, sim_box: SimBox, r_cut: f32) {
    let particles = fcc(CELLS, &sim_box);
    let data = ParticleData::new(&particles);
    let cutoffs = CutoffMatrix::uniform(1, r_cut);
    let params = TraversalParams {
        cutoffs: &cutoffs,
        buffer: 0.0,
        body_filter: false,
    };

    let mut lbvh: Lbvh = Lbvh::new(1);
    let summary = lbvh.build(&data, &sim_box, Vec3::ZERO).unwrap();
    log::info!(
        "{label}: {} particles in {} leaves and {} internal nodes",
        summary.placed,
        summary.leaves,
        summary.internal
    );

    let nmax = [16];
    let (head, total) = head_list(&data, &nmax).unwrap();
    let mut nlist = vec![0; total];
    let mut n_neigh = vec![0; particles.len()];
    let mut last_pos = vec![Vec3::ZERO; particles.len()];
    let report = lbvh
        .traverse(
            &data,
            &sim_box,
            &params,
            &nmax,
            NeighborBuffers {
                nlist: &mut nlist,
                head_list: &head,
                n_neigh: &mut n_neigh,
                last_pos: &mut last_pos,
            },
        )
        .unwrap();
    assert!(!report.overflowed());

    let min = n_neigh.iter().min().copied().unwrap_or(0);
    let max = n_neigh.iter().max().copied().unwrap_or(0);
    println!("{label}: neighbor counts between {min} and {max}");

    let expected = reference::brute_force(&data, &sim_box, Vec3::ZERO, &params);
    for (i, row) in expected.iter().enumerate() {
        let mut got = nlist[head[i]..head[i] + n_neigh[i] as usize].to_vec();
        got.sort_unstable();
        assert_eq!(&got, row, "row {i} differs from the all-pairs search");
    }
}

fn main() {
    colog::init();

    // Unit cell edge 1: nearest neighbors sit at 1/sqrt(2).
    let edge = CELLS as f32;
    let r_cut = 0.8;
    count_neighbors("cubic", SimBox::cube(edge), r_cut);

    // A shear of one full cell maps the lattice onto itself.
    let sheared = SimBox::cube(edge).with_tilt(1.0 / edge, 0.0, 0.0);
    count_neighbors("sheared", sheared, r_cut);
}
