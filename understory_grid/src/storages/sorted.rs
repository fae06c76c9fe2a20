// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sorted storage: a flat value list grouped by cell plus a per-cell offset table.

use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::cell::CellCoord;
use crate::regular::RegularGrid;
use crate::storage::{CellStorage, ElementId};
use crate::types::Scalar;

#[derive(Clone, Debug)]
struct Slot<V> {
    cell: usize,
    id: ElementId,
    value: V,
}

/// Build-once cell storage.
///
/// Values are appended unsorted and become visible to queries only after
/// [`build`](crate::StaticGrid::build): the list is then stably sorted by
/// linear cell index and every cell gets the offset of its first value, or
/// the list length if it is empty. Inserting again invalidates the table
/// until the next build. Values cannot be erased.
#[derive(Clone)]
pub struct SortedCells<V> {
    slots: Vec<Slot<V>>,
    offsets: Vec<usize>,
}

impl<V> Default for SortedCells<V> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            offsets: Vec::new(),
        }
    }
}

impl<V> Debug for SortedCells<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SortedCells")
            .field("entries", &self.slots.len())
            .field("built", &self.is_built())
            .finish_non_exhaustive()
    }
}

impl<V> SortedCells<V> {
    /// Whether the offset table matches the stored values.
    pub fn is_built(&self) -> bool {
        !self.offsets.is_empty()
    }

    /// Sort the values by cell and rebuild the offset table for `grid`.
    pub(crate) fn build<T: Scalar, const N: usize>(&mut self, grid: &RegularGrid<T, N>) {
        self.slots.sort_by_key(|s| s.cell);
        let sentinel = self.slots.len();
        self.offsets = vec![sentinel; grid.cell_count()];
        for (i, slot) in self.slots.iter().enumerate() {
            let offset = &mut self.offsets[slot.cell];
            if *offset == sentinel {
                *offset = i;
            }
        }
        log::debug!(
            "sorted {} values into {} cells",
            self.slots.len(),
            self.offsets.len()
        );
    }
}

/// Iterator over the values of one sorted cell.
#[derive(Debug)]
pub struct SortedCellValues<'a, V> {
    inner: core::slice::Iter<'a, Slot<V>>,
}

impl<'a, V> Iterator for SortedCellValues<'a, V> {
    type Item = (ElementId, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|s| (s.id, &s.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T: Scalar, const N: usize, V> CellStorage<T, N, V> for SortedCells<V> {
    type Values<'a>
        = SortedCellValues<'a, V>
    where
        Self: 'a,
        V: 'a;

    fn values_in_cell<'a>(
        &'a self,
        grid: &RegularGrid<T, N>,
        cell: &CellCoord<N>,
    ) -> Self::Values<'a> {
        let idx = grid.index_of_cell(cell);
        let start = self
            .offsets
            .get(idx)
            .copied()
            .unwrap_or(self.slots.len())
            .min(self.slots.len());
        let run = &self.slots[start..];
        let end = run.iter().position(|s| s.cell != idx).unwrap_or(run.len());
        SortedCellValues {
            inner: run[..end].iter(),
        }
    }

    fn insert_in_cell(
        &mut self,
        grid: &RegularGrid<T, N>,
        cell: CellCoord<N>,
        id: ElementId,
        value: V,
    ) -> bool {
        self.slots.push(Slot {
            cell: grid.index_of_cell(&cell),
            id,
            value,
        });
        self.offsets.clear();
        true
    }

    fn non_empty_cells(&self, grid: &RegularGrid<T, N>) -> BTreeSet<CellCoord<N>> {
        self.slots
            .iter()
            .map(|s| grid.cell_of_index(s.cell))
            .collect()
    }

    fn entries<'a>(
        &'a self,
        grid: &'a RegularGrid<T, N>,
    ) -> Box<dyn Iterator<Item = (CellCoord<N>, ElementId, &'a V)> + 'a> {
        Box::new(
            self.slots
                .iter()
                .map(move |s| (grid.cell_of_index(s.cell), s.id, &s.value)),
        )
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.offsets.clear();
    }

    fn finish(&mut self, grid: &RegularGrid<T, N>) {
        self.build(grid);
    }
}
