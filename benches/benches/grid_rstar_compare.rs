// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_grid::{Point3, StaticGrid3};

use rstar::RTree;

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_f64(&mut self) -> f64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        ((x >> 11) as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_coords(count: usize, seed: u64) -> Vec<[f64; 3]> {
    let mut rng = Rng::new(seed);
    (0..count)
        .map(|_| [rng.next_f64(), rng.next_f64(), rng.next_f64()])
        .collect()
}

fn bench_nearest_external_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_external_compare_f64");
    let queries = gen_coords(256, 0xBADC_F00D_1234_5678);
    for &n in &[10_000usize, 100_000] {
        let coords = gen_coords(n, 0xCAFE_F00D_DEAD_BEEF);

        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("understory_build_n{}", n), |b| {
            b.iter_batched(
                || coords.iter().map(|&c| Point3::new(c)).collect::<Vec<_>>(),
                |points| {
                    let grid: StaticGrid3<Point3<f64>> = StaticGrid3::from_values(points);
                    black_box(grid.len());
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("rstar_build_bulk_n{}", n), |b| {
            b.iter_batched(
                || coords.clone(),
                |coords| {
                    let tree = RTree::bulk_load(coords);
                    black_box(tree.size());
                },
                BatchSize::SmallInput,
            )
        });

        let grid: StaticGrid3<Point3<f64>> =
            StaticGrid3::from_values(coords.iter().map(|&c| Point3::new(c)));
        let tree = RTree::bulk_load(coords.clone());
        group.throughput(Throughput::Elements(queries.len() as u64));
        group.bench_function(format!("understory_closest_n{}", n), |b| {
            b.iter(|| {
                for q in &queries {
                    black_box(grid.closest_value(&Point3::new(*q), |q, p| q.dist(p)));
                }
            })
        });
        group.bench_function(format!("rstar_nearest_n{}", n), |b| {
            b.iter(|| {
                for q in &queries {
                    black_box(tree.nearest_neighbor(q));
                }
            })
        });
        group.bench_function(format!("understory_k_closest_8_n{}", n), |b| {
            b.iter(|| {
                for q in &queries {
                    black_box(grid.k_closest_values(&Point3::new(*q), 8, |q, p| q.dist(p)));
                }
            })
        });
        group.bench_function(format!("rstar_nearest_iter_8_n{}", n), |b| {
            b.iter(|| {
                for q in &queries {
                    black_box(tree.nearest_neighbor_iter(q).take(8).count());
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_nearest_external_compare);
criterion_main!(benches);
