// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cell storage traits implemented by the grid backends.

use alloc::boxed::Box;
use alloc::collections::BTreeSet;

use crate::cell::CellCoord;
use crate::regular::RegularGrid;
use crate::types::Scalar;

/// Identity of an inserted element.
///
/// Assigned by the grid on every successful call to `insert`. An element
/// stored in several cells carries the same id in each of them, which is how
/// queries deduplicate multi-cell elements and break distance ties.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(usize);

impl ElementId {
    pub(crate) const fn new(i: usize) -> Self {
        Self(i)
    }

    /// Insertion order of the element.
    pub const fn get(self) -> usize {
        self.0
    }
}

/// Association between grid cells and stored values used by `GridGeneric`.
///
/// The grid algorithms are written once against this trait and
/// monomorphized per storage, so cell lookups on the query paths are static
/// calls returning concrete iterators.
pub trait CellStorage<T: Scalar, const N: usize, V> {
    /// Iterator over the values of one cell.
    type Values<'a>: Iterator<Item = (ElementId, &'a V)>
    where
        Self: 'a,
        V: 'a;

    /// Values stored in `cell`.
    fn values_in_cell<'a>(&'a self, grid: &RegularGrid<T, N>, cell: &CellCoord<N>)
    -> Self::Values<'a>;

    /// Store `value` in `cell`. Returns whether it was actually stored.
    fn insert_in_cell(
        &mut self,
        grid: &RegularGrid<T, N>,
        cell: CellCoord<N>,
        id: ElementId,
        value: V,
    ) -> bool;

    /// Cells holding at least one value.
    fn non_empty_cells(&self, grid: &RegularGrid<T, N>) -> BTreeSet<CellCoord<N>>;

    /// Every stored `(cell, id, value)` entry.
    fn entries<'a>(
        &'a self,
        grid: &'a RegularGrid<T, N>,
    ) -> Box<dyn Iterator<Item = (CellCoord<N>, ElementId, &'a V)> + 'a>;

    /// Number of stored entries (an element in `k` cells counts `k` times).
    fn len(&self) -> usize;

    /// Whether nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry.
    fn clear(&mut self);

    /// Finalize the storage after a bulk insertion.
    fn finish(&mut self, _grid: &RegularGrid<T, N>) {}
}

/// Storages that support removing values after insertion.
pub trait ErasableStorage<T: Scalar, const N: usize, V>: CellStorage<T, N, V> {
    /// Remove the values equal to `value` from `cell`. Returns whether any was removed.
    fn erase_in_cell(&mut self, grid: &RegularGrid<T, N>, cell: &CellCoord<N>, value: &V) -> bool
    where
        V: PartialEq;

    /// Remove the entry of element `id` from `cell`. Returns whether it was there.
    fn erase_entry(&mut self, grid: &RegularGrid<T, N>, cell: &CellCoord<N>, id: ElementId)
    -> bool;

    /// Remove every value from `cell`. Returns whether the cell held any.
    fn erase_all_in_cell(&mut self, grid: &RegularGrid<T, N>, cell: &CellCoord<N>) -> bool;
}
