// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Kurbo shapes in a static grid.
//!
//! Build a static grid of rectangles once, then run closest-shape queries
//! with a Kurbo point.
//!
//! Run:
//! - `cargo run -p understory_demos --example grid_kurbo`

use kurbo::{Point, Rect};
use understory_grid::{Spatial, StaticGrid2};

fn main() {
    // A row of 20 buttons, 40 units wide with 10 units of spacing.
    let buttons: Vec<Rect> = (0..20)
        .map(|i| {
            let x = f64::from(i) * 50.0;
            Rect::new(x, 0.0, x + 40.0, 20.0)
        })
        .collect();

    let grid: StaticGrid2<Rect> = StaticGrid2::from_values(buttons.iter().copied());
    assert!(grid.is_built());
    println!(
        "{} rects in {:?} cells",
        buttons.len(),
        grid.regular_grid().cell_numbers()
    );

    // Which button is closest to a pointer in the gap between two of them?
    let pointer = Point::new(244.0, 10.0);
    let (hit, d) = grid
        .closest_value(&pointer, |p, r| {
            r.extent()
                .map_or(f64::INFINITY, |e| e.dist_to_point(&(*p).into()))
        })
        .unwrap();
    println!("closest button: {:?} at distance {d}", hit.value);
    assert_eq!(hit.value.x0, 200.0);
    assert_eq!(d, 4.0);
}
