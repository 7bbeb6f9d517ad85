// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec3;
use lbvh_benches::{edge_for_density, uniform_particles};
use lbvh_index::{
    CutoffMatrix, Lbvh, NeighborBuffers, ParticleData, SimBox, TraversalParams, head_list,
};
use lbvh_nlist::{NeighborList, NeighborListConfig};

// Roughly liquid density in reduced units.
const DENSITY: f32 = 0.85;

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("lbvh_build");
    for &n in &[1_000_usize, 10_000, 100_000] {
        let edge = edge_for_density(n, DENSITY);
        let particles = uniform_particles(1, n, edge, 2);
        let sim_box = SimBox::cube(edge);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_function(format!("build_l4_n{n}"), |b| {
            let mut lbvh: Lbvh<4> = Lbvh::new(2);
            b.iter(|| {
                let summary = lbvh
                    .build(&ParticleData::new(&particles), &sim_box, Vec3::ZERO)
                    .unwrap();
                black_box(summary);
            });
        });

        group.bench_function(format!("build_l1_n{n}"), |b| {
            let mut lbvh: Lbvh<1> = Lbvh::new(2);
            b.iter(|| {
                let summary = lbvh
                    .build(&ParticleData::new(&particles), &sim_box, Vec3::ZERO)
                    .unwrap();
                black_box(summary);
            });
        });
    }
    group.finish();
}

fn bench_traverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("lbvh_traverse");
    let cutoffs = CutoffMatrix::uniform(2, 2.5);
    let params = TraversalParams {
        cutoffs: &cutoffs,
        buffer: 0.4,
        body_filter: false,
    };
    for &n in &[1_000_usize, 10_000, 100_000] {
        let edge = edge_for_density(n, DENSITY);
        let particles = uniform_particles(2, n, edge, 2);
        let data = ParticleData::new(&particles);
        let sim_box = SimBox::cube(edge);
        let mut lbvh: Lbvh = Lbvh::new(2);
        lbvh.build(&data, &sim_box, Vec3::ZERO).unwrap();
        let nmax = [160, 160];
        let (head, total) = head_list(&data, &nmax).unwrap();
        group.throughput(Throughput::Elements(n as u64));

        group.bench_function(format!("traverse_n{n}"), |b| {
            let mut nlist = vec![0; total];
            let mut n_neigh = vec![0; n];
            let mut last_pos = vec![Vec3::ZERO; n];
            b.iter(|| {
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
            });
        });
    }
    group.finish();
}

fn bench_neighbor_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("neighbor_list_compute");
    let n = 20_000;
    let edge = edge_for_density(n, DENSITY);
    let particles = uniform_particles(3, n, edge, 1);
    let sim_box = SimBox::cube(edge);
    group.throughput(Throughput::Elements(n as u64));

    group.bench_function("first_compute_with_resize", |b| {
        b.iter_batched(
            || {
                NeighborList::<4>::new(
                    CutoffMatrix::uniform(1, 2.5),
                    NeighborListConfig::default(),
                )
                .unwrap()
            },
            |mut list| {
                let reason = list
                    .compute(0, &ParticleData::new(&particles), None, &sim_box)
                    .unwrap();
                black_box(reason);
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_traverse, bench_neighbor_list);
criterion_main!(benches);
