// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grid queries over a point cloud.
//!
//! Store mesh-like vertices in a hash grid, query a sphere, find nearest
//! neighbours, then erase a region.
//!
//! Run:
//! - `cargo run -p understory_demos --example grid_queries`

use understory_grid::{Extent, HashTableGrid3, Point3, Spatial, Sphere};

#[derive(Clone, Debug, PartialEq)]
struct Vertex {
    position: Point3<f64>,
    index: usize,
}

impl Spatial<f64, 3> for Vertex {
    const PUNCTUAL: bool = true;

    fn extent(&self) -> Option<Extent<f64, 3>> {
        Some(Extent::Point(self.position))
    }
}

fn main() {
    // A 10x10x10 lattice of vertices in the unit cube.
    let vertices: Vec<_> = (0..1000)
        .map(|i| Vertex {
            position: Point3::new([
                (i / 100) as f64 / 9.0,
                (i / 10 % 10) as f64 / 9.0,
                (i % 10) as f64 / 9.0,
            ]),
            index: i,
        })
        .collect();

    let mut grid: HashTableGrid3<Vertex> = HashTableGrid3::from_values(vertices);
    println!(
        "grid: {:?} cells, {} non-empty",
        grid.regular_grid().cell_numbers(),
        grid.non_empty_cells().len()
    );

    // Vertices in a small ball around the center.
    let ball = Sphere::new(Point3::new([0.5, 0.5, 0.5]), 0.2);
    let inside = grid.values_in_sphere(&ball);
    println!("{} vertices within 0.2 of the center", inside.len());
    assert_eq!(inside.len(), grid.count_in_sphere(&ball));

    // Nearest vertex to an off-lattice point.
    let query = Point3::new([0.26, 0.74, 0.01]);
    let (nearest, d) = grid
        .closest_value(&query, |q, v| q.dist(&v.position))
        .unwrap();
    println!("nearest vertex: #{} at distance {d:.4}", nearest.value.index);

    // Its five nearest neighbours, including itself.
    let around = nearest.value.position;
    let ring: Vec<_> = grid
        .k_closest_values(&around, 5, |q, v| q.dist(&v.position))
        .into_iter()
        .map(|(e, d)| (e.value.index, d))
        .collect();
    println!("5 nearest to #{}: {ring:?}", nearest.value.index);
    assert_eq!(ring[0].1, 0.0, "the closest vertex to itself is itself");

    // Drop everything in the ball.
    let erased = grid.erase_in_sphere(&ball);
    println!("erased {erased} vertices, {} left", grid.len());
    assert_eq!(grid.count_in_sphere(&ball), 0);
}
