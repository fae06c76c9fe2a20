// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hash table storage: a multimap from cell coordinates to values.

use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::fmt::Debug;

use hashbrown::HashMap;

use crate::cell::CellCoord;
use crate::regular::RegularGrid;
use crate::storage::{CellStorage, ElementId, ErasableStorage};
use crate::types::Scalar;

/// Hash table cell storage.
///
/// Only non-empty cells take memory. Insertion and removal cost depends
/// only on the number of values in the touched cells. With
/// `ALLOW_DUPLICATES == false` a value equal to one already stored in a
/// cell is rejected, which requires `V: PartialEq`.
pub struct HashCells<const N: usize, V, const ALLOW_DUPLICATES: bool = true> {
    map: HashMap<CellCoord<N>, Vec<(ElementId, V)>>,
    len: usize,
}

impl<const N: usize, V, const D: bool> Default for HashCells<N, V, D> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            len: 0,
        }
    }
}

impl<const N: usize, V, const D: bool> Debug for HashCells<N, V, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashCells")
            .field("allow_duplicates", &D)
            .field("entries", &self.len)
            .field("cells", &self.map.len())
            .finish_non_exhaustive()
    }
}

/// Iterator over the values of one hashed cell.
#[derive(Debug)]
pub struct HashCellValues<'a, V> {
    inner: core::slice::Iter<'a, (ElementId, V)>,
}

impl<'a, V> Iterator for HashCellValues<'a, V> {
    type Item = (ElementId, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(id, v)| (*id, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<const N: usize, V, const D: bool> HashCells<N, V, D> {
    fn cell_values(&self, cell: &CellCoord<N>) -> HashCellValues<'_, V> {
        let slice = self.map.get(cell).map_or(&[][..], Vec::as_slice);
        HashCellValues {
            inner: slice.iter(),
        }
    }

    fn push(&mut self, cell: CellCoord<N>, id: ElementId, value: V) {
        self.map.entry(cell).or_default().push((id, value));
        self.len += 1;
    }

    /// Drop entries matching `pred` from `cell`, at most one if `first_only`.
    fn remove_where(
        &mut self,
        cell: &CellCoord<N>,
        first_only: bool,
        mut pred: impl FnMut(&(ElementId, V)) -> bool,
    ) -> bool {
        let Some(values) = self.map.get_mut(cell) else {
            return false;
        };
        let before = values.len();
        if first_only {
            if let Some(pos) = values.iter().position(&mut pred) {
                values.remove(pos);
            }
        } else {
            values.retain(|e| !pred(e));
        }
        let removed = before - values.len();
        if values.is_empty() {
            self.map.remove(cell);
        }
        self.len -= removed;
        removed > 0
    }

    fn all_entries<'a>(
        &'a self,
    ) -> Box<dyn Iterator<Item = (CellCoord<N>, ElementId, &'a V)> + 'a> {
        Box::new(
            self.map
                .iter()
                .flat_map(|(cell, values)| values.iter().map(move |(id, v)| (*cell, *id, v))),
        )
    }

    fn keys(&self) -> BTreeSet<CellCoord<N>> {
        self.map.keys().copied().collect()
    }
}

impl<T: Scalar, const N: usize, V> CellStorage<T, N, V> for HashCells<N, V, true> {
    type Values<'a>
        = HashCellValues<'a, V>
    where
        Self: 'a,
        V: 'a;

    fn values_in_cell<'a>(
        &'a self,
        _grid: &RegularGrid<T, N>,
        cell: &CellCoord<N>,
    ) -> Self::Values<'a> {
        self.cell_values(cell)
    }

    fn insert_in_cell(
        &mut self,
        _grid: &RegularGrid<T, N>,
        cell: CellCoord<N>,
        id: ElementId,
        value: V,
    ) -> bool {
        self.push(cell, id, value);
        true
    }

    fn non_empty_cells(&self, _grid: &RegularGrid<T, N>) -> BTreeSet<CellCoord<N>> {
        self.keys()
    }

    fn entries<'a>(
        &'a self,
        _grid: &'a RegularGrid<T, N>,
    ) -> Box<dyn Iterator<Item = (CellCoord<N>, ElementId, &'a V)> + 'a> {
        self.all_entries()
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.map.clear();
        self.len = 0;
    }
}

impl<T: Scalar, const N: usize, V: PartialEq> CellStorage<T, N, V> for HashCells<N, V, false> {
    type Values<'a>
        = HashCellValues<'a, V>
    where
        Self: 'a,
        V: 'a;

    fn values_in_cell<'a>(
        &'a self,
        _grid: &RegularGrid<T, N>,
        cell: &CellCoord<N>,
    ) -> Self::Values<'a> {
        self.cell_values(cell)
    }

    fn insert_in_cell(
        &mut self,
        _grid: &RegularGrid<T, N>,
        cell: CellCoord<N>,
        id: ElementId,
        value: V,
    ) -> bool {
        if self.cell_values(&cell).any(|(_, v)| *v == value) {
            return false;
        }
        self.push(cell, id, value);
        true
    }

    fn non_empty_cells(&self, _grid: &RegularGrid<T, N>) -> BTreeSet<CellCoord<N>> {
        self.keys()
    }

    fn entries<'a>(
        &'a self,
        _grid: &'a RegularGrid<T, N>,
    ) -> Box<dyn Iterator<Item = (CellCoord<N>, ElementId, &'a V)> + 'a> {
        self.all_entries()
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.map.clear();
        self.len = 0;
    }
}

impl<T: Scalar, const N: usize, V, const D: bool> ErasableStorage<T, N, V> for HashCells<N, V, D>
where
    Self: CellStorage<T, N, V>,
{
    fn erase_in_cell(&mut self, _grid: &RegularGrid<T, N>, cell: &CellCoord<N>, value: &V) -> bool
    where
        V: PartialEq,
    {
        // Without duplicates at most one equal value can be in the cell.
        self.remove_where(cell, !D, |(_, v)| v == value)
    }

    fn erase_entry(
        &mut self,
        _grid: &RegularGrid<T, N>,
        cell: &CellCoord<N>,
        id: ElementId,
    ) -> bool {
        self.remove_where(cell, true, |(i, _)| *i == id)
    }

    fn erase_all_in_cell(&mut self, _grid: &RegularGrid<T, N>, cell: &CellCoord<N>) -> bool {
        match self.map.remove(cell) {
            Some(values) => {
                self.len -= values.len();
                !values.is_empty()
            }
            None => false,
        }
    }
}
