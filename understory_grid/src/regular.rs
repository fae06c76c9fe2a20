// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Regular lattice geometry: world coordinates to cells and back.

use crate::cell::{CellCoord, CellIter};
use crate::error::GridError;
use crate::types::{Aabb, Point, Scalar, le, lt};

/// A fixed-size axis-aligned lattice of `size[i]` cells per axis over a box.
///
/// Pure geometry: converts between world coordinates, integer cell
/// coordinates and flat row-major cell indices. It stores no elements.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RegularGrid<T, const N: usize> {
    bbox: Aabb<T, N>,
    size: CellCoord<N>,
}

/// A 2D regular grid.
pub type RegularGrid2<T> = RegularGrid<T, 2>;

/// A 3D regular grid.
pub type RegularGrid3<T> = RegularGrid<T, 3>;

impl<T: Scalar, const N: usize> Default for RegularGrid<T, N> {
    fn default() -> Self {
        Self {
            bbox: Aabb::from_point(Point::zero()),
            size: [1; N],
        }
    }
}

impl<T: Scalar, const N: usize> RegularGrid<T, N> {
    /// Create a grid spanning `[min, max]` with `size[i]` cells on axis `i`.
    ///
    /// Axes with zero extent always get a single cell. `size[i] >= 1` and
    /// `min[i] <= max[i]` are preconditions, checked in debug builds; use
    /// [`RegularGrid::try_new`] to validate untrusted input.
    pub fn new(min: Point<T, N>, max: Point<T, N>, size: CellCoord<N>) -> Self {
        Self::from_box(Aabb::new(min, max), size)
    }

    /// Create a grid over `bbox` with `size[i]` cells on axis `i`.
    pub fn from_box(bbox: Aabb<T, N>, size: CellCoord<N>) -> Self {
        for axis in 0..N {
            debug_assert!(size[axis] > 0, "axis {axis} needs at least one cell");
            debug_assert!(
                le(bbox.min[axis], bbox.max[axis]),
                "axis {axis} has min greater than max"
            );
        }
        let mut grid = Self::default();
        grid.set(bbox, size);
        grid
    }

    /// Validating version of [`RegularGrid::new`].
    pub fn try_new(
        min: Point<T, N>,
        max: Point<T, N>,
        size: CellCoord<N>,
    ) -> Result<Self, GridError> {
        for axis in 0..N {
            if size[axis] == 0 {
                return Err(GridError::EmptyAxis { axis });
            }
            if !le(min[axis], max[axis]) {
                return Err(GridError::InvertedAxis { axis });
            }
        }
        Ok(Self::new(min, max, size))
    }

    /// Replace the geometry; used while an owning grid is still empty.
    pub(crate) fn set(&mut self, bbox: Aabb<T, N>, size: CellCoord<N>) {
        let mut size = size;
        for (axis, s) in size.iter_mut().enumerate() {
            if !lt(bbox.min[axis], bbox.max[axis]) {
                *s = 1;
            }
            *s = (*s).max(1);
        }
        self.bbox = bbox;
        self.size = size;
    }

    /// Minimum corner of the grid.
    pub fn min(&self) -> Point<T, N> {
        self.bbox.min
    }

    /// Maximum corner of the grid.
    pub fn max(&self) -> Point<T, N> {
        self.bbox.max
    }

    /// Bounding box of the grid.
    pub fn bounding_box(&self) -> Aabb<T, N> {
        self.bbox
    }

    /// Extent of the grid along axis `d`.
    pub fn length(&self, d: usize) -> T {
        self.bbox.max[d] - self.bbox.min[d]
    }

    /// Extents of the grid along every axis.
    pub fn lengths(&self) -> Point<T, N> {
        self.bbox.size()
    }

    /// Number of cells along axis `d`.
    pub fn cell_number(&self, d: usize) -> usize {
        self.size[d]
    }

    /// Number of cells along every axis.
    pub fn cell_numbers(&self) -> CellCoord<N> {
        self.size
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.size.iter().product()
    }

    /// Cell edge length along axis `d`.
    pub fn cell_length(&self, d: usize) -> T {
        self.length(d) / T::from_usize(self.size[d])
    }

    /// Cell edge lengths along every axis.
    pub fn cell_lengths(&self) -> Point<T, N> {
        let mut p = Point::zero();
        for d in 0..N {
            p[d] = self.cell_length(d);
        }
        p
    }

    /// Length of a cell diagonal.
    pub fn cell_diagonal(&self) -> T {
        self.cell_lengths().norm()
    }

    /// Cell coordinate along `axis` of the scalar `s`.
    ///
    /// Values below the grid clamp to the first cell, values above it (and
    /// exactly on its maximum) to the last. A value on an inner cell boundary
    /// belongs to the higher cell.
    pub fn cell_on_axis(&self, axis: usize, s: T) -> usize {
        let last = self.size[axis] - 1;
        let min = self.bbox.min[axis];
        if lt(s, min) {
            return 0;
        }
        if lt(self.bbox.max[axis], s) {
            return last;
        }
        let len = self.cell_length(axis);
        if !lt(T::ZERO, len) {
            return 0;
        }
        ((s - min) / len).to_cell().min(last)
    }

    /// Cell containing the point (clamped to the grid).
    pub fn cell(&self, p: &Point<T, N>) -> CellCoord<N> {
        core::array::from_fn(|d| self.cell_on_axis(d, p[d]))
    }

    /// Row-major flat index of a cell.
    ///
    /// Every coordinate must be smaller than the cell count of its axis.
    pub fn index_of_cell(&self, c: &CellCoord<N>) -> usize {
        let mut index = 0;
        for d in 0..N {
            debug_assert!(
                c[d] < self.size[d],
                "cell coordinate {} out of range on axis {d}",
                c[d]
            );
            index = index * self.size[d] + c[d];
        }
        index
    }

    /// Cell of a row-major flat index; inverse of [`RegularGrid::index_of_cell`].
    pub fn cell_of_index(&self, index: usize) -> CellCoord<N> {
        debug_assert!(index < self.cell_count(), "cell index {index} out of range");
        let mut c = [0; N];
        let mut rest = index;
        for d in (0..N).rev() {
            c[d] = rest % self.size[d];
            rest /= self.size[d];
        }
        c
    }

    /// Lower corner of a cell in world coordinates.
    pub fn cell_lower_corner(&self, c: &CellCoord<N>) -> Point<T, N> {
        let mut p = self.bbox.min;
        for d in 0..N {
            p[d] = p[d] + T::from_usize(c[d]) * self.cell_length(d);
        }
        p
    }

    /// World-space box of a cell.
    pub fn cell_box(&self, c: &CellCoord<N>) -> Aabb<T, N> {
        let min = self.cell_lower_corner(c);
        Aabb::new(min, min + self.cell_lengths())
    }

    /// Every cell of the grid, row-major.
    pub fn cells(&self) -> CellIter<N> {
        CellIter::new([0; N], self.size)
    }

    /// Every cell in `[first, last]` (both inclusive), row-major.
    pub fn cells_between(&self, first: &CellCoord<N>, last: &CellCoord<N>) -> CellIter<N> {
        CellIter::new(*first, last.map(|v| v + 1))
    }
}

/// Number of cells per axis suited to hold `n_elements` over a box with the
/// given edge `lengths`.
///
/// Aims at roughly one element per cell with cubic-ish cells. Axes shorter
/// than `1e-4` times the box diagonal are considered flat and get a single
/// cell; the others share the cells in proportion to their lengths. Every
/// axis gets at least one cell.
pub fn best_grid_size<T: Scalar, const N: usize>(
    lengths: &Point<T, N>,
    n_elements: usize,
) -> CellCoord<N> {
    let mut sizes = [1; N];
    if n_elements == 0 {
        return sizes;
    }

    let eps = lengths.norm() * T::from_f64(1e-4);
    let flat: [bool; N] = core::array::from_fn(|d| !lt(eps, lengths[d]));
    let live = flat.iter().filter(|f| !**f).count();
    if live == 0 {
        return sizes;
    }

    let n_cells = T::from_usize(n_elements);
    let exponent = T::ONE / T::from_usize(live);
    for d in 0..N {
        if flat[d] {
            continue;
        }
        let mut others = T::ONE;
        for j in 0..N {
            if j != d && !flat[j] {
                others = others * lengths[j];
            }
        }
        sizes[d] = (n_cells * lengths[d] / others).powf(exponent).to_cell().max(1);
    }
    sizes
}
