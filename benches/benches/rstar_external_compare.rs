// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec3;
use lbvh_benches::uniform_particles;
use lbvh_index::{
    CutoffMatrix, Lbvh, NeighborBuffers, ParticleData, Periodic, SimBox, TraversalParams,
    head_list,
};

use rstar::RTree;

// Both sides search an open box; rstar has no notion of periodic images.
fn bench_rstar_external_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("rstar_external_compare");
    let r_list = 1.5_f32;
    let cutoffs = CutoffMatrix::uniform(1, r_list);
    let params = TraversalParams {
        cutoffs: &cutoffs,
        buffer: 0.0,
        body_filter: false,
    };
    for &n in &[4_096_usize, 32_768] {
        let edge = (n as f32 / 0.85).cbrt();
        let particles = uniform_particles(4, n, edge, 1);
        let sim_box = SimBox::cube(edge).with_periodic(Periodic::empty());
        group.throughput(Throughput::Elements(n as u64));

        group.bench_function(format!("lbvh_build_search_n{n}"), |b| {
            let data = ParticleData::new(&particles);
            let nmax = [64];
            let (head, total) = head_list(&data, &nmax).unwrap();
            b.iter_batched(
                || (Lbvh::<4>::new(1), vec![0_u32; total], vec![0_u32; n], vec![Vec3::ZERO; n]),
                |(mut lbvh, mut nlist, mut n_neigh, mut last_pos)| {
                    lbvh.build(&data, &sim_box, Vec3::ZERO).unwrap();
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
                    black_box(report);
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(format!("rstar_build_search_n{n}"), |b| {
            b.iter_batched(
                || particles.iter().map(|p| p.pos.to_array()).collect::<Vec<_>>(),
                |points| {
                    let tree = RTree::bulk_load(points.clone());
                    let r_sq = r_list * r_list;
                    let total: usize = points
                        .iter()
                        .map(|p| tree.locate_within_distance(*p, r_sq).count() - 1)
                        .sum();
                    black_box(total);
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rstar_external_compare);
criterion_main!(benches);
