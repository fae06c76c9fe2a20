// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer cell coordinates, cell ranges and the row-major cell iterator.

use core::iter::FusedIterator;

/// Integer coordinates of a grid cell.
pub type CellCoord<const N: usize> = [usize; N];

/// Forward iterator over every cell coordinate of a box `[first, end)`.
///
/// Cells are visited in row-major order (last axis fastest). The default
/// value is the exhausted iterator. Two iterators compare equal when they
/// point at the same cell (or are both exhausted), whatever their bounds.
#[derive(Clone, Debug)]
pub struct CellIter<const N: usize> {
    it: Option<CellCoord<N>>,
    first: CellCoord<N>,
    end: CellCoord<N>,
}

impl<const N: usize> CellIter<N> {
    /// Iterate over the cells in `[first, end)`, `end` exclusive on each axis.
    ///
    /// An empty range on any axis yields nothing.
    pub fn new(first: CellCoord<N>, end: CellCoord<N>) -> Self {
        let empty = N == 0 || first.iter().zip(&end).any(|(f, e)| f >= e);
        Self {
            it: (!empty).then_some(first),
            first,
            end,
        }
    }

    /// The cell the iterator will yield next, if any.
    pub fn current(&self) -> Option<&CellCoord<N>> {
        self.it.as_ref()
    }

    fn remaining(&self) -> usize {
        let Some(it) = self.it else {
            return 0;
        };
        // Cells strictly after `it` in row-major order, plus `it` itself.
        let mut after = 0;
        let mut stride = 1;
        for d in (0..N).rev() {
            after += (self.end[d] - 1 - it[d]) * stride;
            stride *= self.end[d] - self.first[d];
        }
        after + 1
    }
}

impl<const N: usize> Default for CellIter<N> {
    fn default() -> Self {
        Self {
            it: None,
            first: [0; N],
            end: [0; N],
        }
    }
}

impl<const N: usize> PartialEq for CellIter<N> {
    fn eq(&self, other: &Self) -> bool {
        self.it == other.it
    }
}

impl<const N: usize> Eq for CellIter<N> {}

impl<const N: usize> Iterator for CellIter<N> {
    type Item = CellCoord<N>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.it?;
        let mut next = current;
        let mut d = N;
        // Increment the last axis and carry leftwards.
        loop {
            if d == 0 {
                self.it = None;
                return Some(current);
            }
            d -= 1;
            if next[d] + 1 < self.end[d] {
                next[d] += 1;
                break;
            }
            next[d] = self.first[d];
        }
        self.it = Some(next);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl<const N: usize> ExactSizeIterator for CellIter<N> {}

impl<const N: usize> FusedIterator for CellIter<N> {}

/// Inclusive box of cells, used to track search intervals.
///
/// A null box contains no cell; adding a cell to it yields the box made of
/// that single cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellBox<const N: usize> {
    bounds: Option<(CellCoord<N>, CellCoord<N>)>,
}

impl<const N: usize> CellBox<N> {
    /// The empty box.
    pub const fn null() -> Self {
        Self { bounds: None }
    }

    /// The box `[first, last]`, both inclusive.
    pub fn new(first: CellCoord<N>, last: CellCoord<N>) -> Self {
        let mut b = Self::null();
        b.add(first);
        b.add(last);
        b
    }

    /// Whether the box contains no cell.
    pub const fn is_null(&self) -> bool {
        self.bounds.is_none()
    }

    /// First (lowest) cell of the box.
    pub fn first(&self) -> Option<CellCoord<N>> {
        self.bounds.map(|(f, _)| f)
    }

    /// Last (highest) cell of the box.
    pub fn last(&self) -> Option<CellCoord<N>> {
        self.bounds.map(|(_, l)| l)
    }

    /// Grow the box so that it contains `c`.
    pub fn add(&mut self, c: CellCoord<N>) {
        match &mut self.bounds {
            None => self.bounds = Some((c, c)),
            Some((first, last)) => {
                for d in 0..N {
                    first[d] = first[d].min(c[d]);
                    last[d] = last[d].max(c[d]);
                }
            }
        }
    }

    /// Whether `c` lies inside the box (boundary included).
    pub fn contains(&self, c: &CellCoord<N>) -> bool {
        self.bounds
            .is_some_and(|(f, l)| (0..N).all(|d| f[d] <= c[d] && c[d] <= l[d]))
    }

    /// The box grown by one cell on every side, without crossing `[0, limits)`.
    pub fn grown(&self, limits: &CellCoord<N>) -> Self {
        let Some((mut f, mut l)) = self.bounds else {
            return *self;
        };
        for d in 0..N {
            f[d] = f[d].saturating_sub(1);
            if l[d] + 1 < limits[d] {
                l[d] += 1;
            }
        }
        Self {
            bounds: Some((f, l)),
        }
    }

    /// Iterate over the cells of the box.
    pub fn cells(&self) -> CellIter<N> {
        match self.bounds {
            None => CellIter::default(),
            Some((f, l)) => CellIter::new(f, l.map(|v| v + 1)),
        }
    }
}

impl<const N: usize> Default for CellBox<N> {
    fn default() -> Self {
        Self::null()
    }
}
