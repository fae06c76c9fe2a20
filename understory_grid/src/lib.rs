// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_grid --heading-base-level=0

//! Understory Grid: an N-dimensional regular grid spatial index.
//!
//! Understory Grid partitions an axis-aligned box into equally sized cells and
//! associates stored values with the cells they touch.
//!
//! - Points occupy the single cell containing them; extended values (boxes,
//!   spheres, anything with a bounding box) occupy every cell their bounding
//!   box overlaps, optionally filtered by a custom cell membership test.
//! - Query the values in a cell or within a sphere.
//! - Find the closest value, or the `k` closest values, under any distance
//!   function, searching outward from the query in rings of cells.
//!
//! It is generic over the scalar type (`f32`, `f64`) and the dimension, and
//! does not depend on any geometry crate. Values enter the grid through the
//! [`Spatial`] trait.
//!
//! Two cell storages are provided:
//!
//! - [`HashTableGrid`]: a hash multimap from cells to values. Insert and erase
//!   at any time; only non-empty cells use memory. Duplicate values in a cell
//!   can be rejected at compile time through a const parameter.
//! - [`StaticGrid`]: values sorted by cell with an offset per cell. Built once,
//!   with contiguous per-cell runs and no erase.
//!
//! # Example
//!
//! ```rust
//! use understory_grid::{HashTableGrid2, Point2, Sphere};
//!
//! let points = [
//!     Point2::new([1.0, 1.0]),
//!     Point2::new([4.0, 2.0]),
//!     Point2::new([9.0, 9.0]),
//! ];
//!
//! // Size the grid for the points and insert them.
//! let grid: HashTableGrid2<Point2<f64>> = HashTableGrid2::from_values(points);
//!
//! // Points within 3 units of the origin.
//! let near = grid.values_in_sphere(&Sphere::new(Point2::new([0.0, 0.0]), 3.0));
//! assert_eq!(near.len(), 1);
//!
//! // The two closest points to (5, 3).
//! let query = Point2::new([5.0, 3.0]);
//! let hits = grid.k_closest_values(&query, 2, |q, p| q.dist(p));
//! assert_eq!(*hits[0].0.value, Point2::new([4.0, 2.0]));
//! assert_eq!(*hits[1].0.value, Point2::new([1.0, 1.0]));
//! ```
//!
//! Static grids are filled once and then built:
//!
//! ```rust
//! use understory_grid::{Aabb, Point2, StaticGrid2};
//!
//! let boxes = [
//!     Aabb::new(Point2::new([0.0, 0.0]), Point2::new([2.0, 2.0])),
//!     Aabb::new(Point2::new([5.0, 5.0]), Point2::new([8.0, 6.0])),
//! ];
//! let grid: StaticGrid2<Aabb<f64, 2>> = StaticGrid2::from_values(boxes);
//! assert!(grid.is_built());
//!
//! let (hit, d) = grid.closest_to_point(&Point2::new([7.0, 9.0])).unwrap();
//! assert_eq!(*hit.value, boxes[1]);
//! assert_eq!(d, 3.0);
//! ```
//!
//! ## Features
//!
//! - `std` (default): float math from the standard library.
//! - `libm`: float math from `libm` for `no_std` targets. One of `std` and
//!   `libm` is required.
//! - `kurbo`: [`Spatial`] for Kurbo's `Point`, `Rect` and `Circle`, and
//!   conversions to and from this crate's 2D types.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs in coordinates or distances. Debug builds
//! assert on malformed grids.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("understory_grid requires either the `std` or `libm` feature");

pub mod cell;
pub mod error;
pub mod grid;
#[cfg(feature = "kurbo")]
mod impl_kurbo;
pub mod regular;
pub mod spatial;
pub mod storage;
pub mod storages;
pub mod types;

pub use cell::{CellBox, CellCoord, CellIter};
pub use error::GridError;
pub use grid::{
    CellEntry, GridGeneric, HashTableGrid, HashTableGrid2, HashTableGrid3, IntersectsCellFn,
    StaticGrid, StaticGrid2, StaticGrid3,
};
pub use regular::{RegularGrid, RegularGrid2, RegularGrid3, best_grid_size};
pub use spatial::{Extent, Spatial};
pub use storage::{CellStorage, ElementId, ErasableStorage};
pub use storages::hash::HashCells;
pub use storages::sorted::SortedCells;
pub use types::{Aabb, Point, Point2, Point3, Scalar, Sphere};
