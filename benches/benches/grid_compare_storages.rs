// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_grid::{
    Aabb, GridGeneric, HashTableGrid2, HashTableGrid3, Point2, Point3, RegularGrid, Sphere,
    StaticGrid2, StaticGrid3, best_grid_size,
};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_points2(count: usize, extent: f64) -> Vec<Point2<f64>> {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|_| Point2::new([rng.next_f64() * extent, rng.next_f64() * extent]))
        .collect()
}

fn gen_points3(count: usize) -> Vec<Point3<f64>> {
    let mut rng = Rng::new(0xFACE_FEED_CAFE_BABE);
    (0..count)
        .map(|_| Point3::new([rng.next_f64(), rng.next_f64(), rng.next_f64()]))
        .collect()
}

fn gen_clustered_boxes(n_clusters: usize, per_cluster: usize, spread: f64) -> Vec<Aabb<f64, 2>> {
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let mut centers = Vec::with_capacity(n_clusters);
    for _ in 0..n_clusters {
        centers.push((rng.next_f64() * 2000.0, rng.next_f64() * 2000.0));
    }
    for (cx, cy) in centers {
        for _ in 0..per_cluster {
            let dx = (rng.next_f64() - 0.5) * spread;
            let dy = (rng.next_f64() - 0.5) * spread;
            let min = Point2::new([cx + dx, cy + dy]);
            out.push(Aabb::new(min, min + 12.0));
        }
    }
    out
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for &n in &[1_000usize, 10_000, 100_000] {
        let points = gen_points2(n, 1000.0);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("hash_from_values_n{}", n), |b| {
            b.iter_batched(
                || points.clone(),
                |points| {
                    let grid: HashTableGrid2<Point2<f64>> = HashTableGrid2::from_values(points);
                    black_box(grid.len());
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("static_from_values_n{}", n), |b| {
            b.iter_batched(
                || points.clone(),
                |points| {
                    let grid: StaticGrid2<Point2<f64>> = StaticGrid2::from_values(points);
                    black_box(grid.len());
                },
                BatchSize::SmallInput,
            )
        });
    }
    let boxes = gen_clustered_boxes(20, 500, 200.0);
    group.bench_function("hash_from_values_clustered_boxes", |b| {
        b.iter_batched(
            || boxes.clone(),
            |boxes| {
                let grid: HashTableGrid2<Aabb<f64, 2>> = HashTableGrid2::from_values(boxes);
                black_box(grid.len());
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_sphere(c: &mut Criterion) {
    let mut group = c.benchmark_group("sphere");
    let points = gen_points3(100_000);
    let hash: HashTableGrid3<Point3<f64>> = HashTableGrid3::from_values(points.iter().copied());
    let stat: StaticGrid3<Point3<f64>> = StaticGrid3::from_values(points.iter().copied());
    for &r in &[0.01f64, 0.05, 0.2] {
        let s = Sphere::new(Point3::new([0.5, 0.5, 0.5]), r);
        group.bench_function(format!("hash_count_r{}", r), |b| {
            b.iter(|| black_box(hash.count_in_sphere(black_box(&s))))
        });
        group.bench_function(format!("static_count_r{}", r), |b| {
            b.iter(|| black_box(stat.count_in_sphere(black_box(&s))))
        });
    }
    group.finish();
}

fn bench_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest");
    let n = 100_000;
    let points = gen_points3(n);
    let queries = gen_points3(256);
    let hash: HashTableGrid3<Point3<f64>> = HashTableGrid3::from_values(points.iter().copied());
    let stat: StaticGrid3<Point3<f64>> = StaticGrid3::from_values(points.iter().copied());
    group.throughput(Throughput::Elements(queries.len() as u64));
    group.bench_function("hash_closest", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(hash.closest_value(q, |q, p| q.dist(p)));
            }
        })
    });
    group.bench_function("static_closest", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(stat.closest_value(q, |q, p| q.dist(p)));
            }
        })
    });
    for &k in &[4usize, 16] {
        group.bench_function(format!("static_k_closest_k{}", k), |b| {
            b.iter(|| {
                for q in &queries {
                    black_box(stat.k_closest_values(q, k, |q, p| q.dist(p)));
                }
            })
        });
    }
    group.finish();
}

fn bench_insert_erase(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_erase");
    let n = 10_000;
    let points = gen_points2(n, 1000.0);
    let size = best_grid_size(&Point2::new([1000.0, 1000.0]), n);
    group.throughput(Throughput::Elements(n as u64));
    group.bench_function("hash_insert_then_erase_all", |b| {
        b.iter_batched(
            || {
                GridGeneric::new(RegularGrid::new(
                    Point2::new([0.0, 0.0]),
                    Point2::new([1000.0, 1000.0]),
                    size,
                ))
            },
            |mut grid: HashTableGrid2<Point2<f64>>| {
                grid.insert_all(points.iter().copied());
                for p in &points {
                    grid.erase(p);
                }
                black_box(grid.is_empty());
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_sphere,
    bench_nearest,
    bench_insert_erase
);
criterion_main!(benches);
