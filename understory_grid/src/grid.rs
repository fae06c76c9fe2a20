// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public grid API and the query algorithms, generic over a cell storage.

use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Debug;
use core::marker::PhantomData;

use crate::cell::{CellBox, CellCoord};
use crate::regular::{RegularGrid, best_grid_size};
use crate::spatial::{Extent, Spatial};
use crate::storage::{CellStorage, ElementId, ErasableStorage};
use crate::storages::hash::HashCells;
use crate::storages::sorted::SortedCells;
use crate::types::{Aabb, Point, Scalar, Sphere, cmp_dist, lt, max_t, min_t};

/// Custom cell membership test `(cell box, value) -> bool`.
///
/// When set on a grid, an extended value is stored only in the cells of its
/// bounding-box range for which the predicate holds.
pub type IntersectsCellFn<T, const N: usize, V> = Box<dyn Fn(&Aabb<T, N>, &V) -> bool>;

/// A stored value together with the cell it was found in.
#[derive(Debug)]
pub struct CellEntry<'a, const N: usize, V> {
    /// Cell holding this entry.
    pub cell: CellCoord<N>,
    /// Identity of the inserted element.
    pub id: ElementId,
    /// The stored value.
    pub value: &'a V,
}

impl<const N: usize, V> Clone for CellEntry<'_, N, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<const N: usize, V> Copy for CellEntry<'_, N, V> {}

/// A spatial grid parameterized by a cell storage.
///
/// Most code uses one of the aliases: [`HashTableGrid`] for dynamic content,
/// [`StaticGrid`] for content built once.
pub struct GridGeneric<T, const N: usize, V, S> {
    grid: RegularGrid<T, N>,
    intersects: Option<IntersectsCellFn<T, N, V>>,
    storage: S,
    next_id: usize,
    _marker: PhantomData<fn() -> V>,
}

impl<T: Debug, const N: usize, V, S: Debug> Debug for GridGeneric<T, N, V, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GridGeneric")
            .field("grid", &self.grid)
            .field("intersects", &self.intersects.is_some())
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

/// Hash table grid: supports insertion and erasure at any time.
///
/// With `ALLOW_DUPLICATES == false` a value equal to one already present in a
/// cell is not stored again.
pub type HashTableGrid<T, const N: usize, V, const ALLOW_DUPLICATES: bool = true> =
    GridGeneric<T, N, V, HashCells<N, V, ALLOW_DUPLICATES>>;

/// 2D hash table grid.
pub type HashTableGrid2<V, T = f64, const ALLOW_DUPLICATES: bool = true> =
    HashTableGrid<T, 2, V, ALLOW_DUPLICATES>;

/// 3D hash table grid.
pub type HashTableGrid3<V, T = f64, const ALLOW_DUPLICATES: bool = true> =
    HashTableGrid<T, 3, V, ALLOW_DUPLICATES>;

/// Static grid: values are inserted, then [`build`](GridGeneric::build) makes
/// them queryable. Values cannot be erased.
///
/// ```compile_fail
/// use understory_grid::{Point2, StaticGrid2};
///
/// let mut grid: StaticGrid2<Point2<f64>> = StaticGrid2::from_values([Point2::new([1.0, 1.0])]);
/// grid.erase(&Point2::new([1.0, 1.0]));
/// ```
pub type StaticGrid<T, const N: usize, V> = GridGeneric<T, N, V, SortedCells<V>>;

/// 2D static grid.
pub type StaticGrid2<V, T = f64> = StaticGrid<T, 2, V>;

/// 3D static grid.
pub type StaticGrid3<V, T = f64> = StaticGrid<T, 3, V>;

impl<T, const N: usize, V, S> GridGeneric<T, N, V, S>
where
    T: Scalar,
    S: CellStorage<T, N, V> + Default,
{
    /// Create an empty grid over `grid`.
    pub fn new(grid: RegularGrid<T, N>) -> Self {
        Self {
            grid,
            intersects: None,
            storage: S::default(),
            next_id: 0,
            _marker: PhantomData,
        }
    }

    /// Create an empty grid over `grid` using a custom cell membership test.
    pub fn with_intersects(
        grid: RegularGrid<T, N>,
        intersects: impl Fn(&Aabb<T, N>, &V) -> bool + 'static,
    ) -> Self {
        let mut g = Self::new(grid);
        g.intersects = Some(Box::new(intersects));
        g
    }
}

impl<T, const N: usize, V, S> GridGeneric<T, N, V, S>
where
    T: Scalar,
    V: Spatial<T, N> + Clone,
    S: CellStorage<T, N, V> + Default,
{
    /// Create a grid sized for `values` and insert all of them.
    ///
    /// The grid spans the bounding box of the values, inflated by its
    /// diagonal divided by their count, with [`best_grid_size`] cells.
    /// Static grids come back built.
    pub fn from_values(values: impl IntoIterator<Item = V>) -> Self {
        Self::sized_for(values.into_iter().collect(), None)
    }

    /// Like [`from_values`](Self::from_values), with a custom cell membership test.
    pub fn from_values_with_intersects(
        values: impl IntoIterator<Item = V>,
        intersects: impl Fn(&Aabb<T, N>, &V) -> bool + 'static,
    ) -> Self {
        Self::sized_for(values.into_iter().collect(), Some(Box::new(intersects)))
    }

    fn sized_for(values: Vec<V>, intersects: Option<IntersectsCellFn<T, N, V>>) -> Self {
        let mut g = Self::new(RegularGrid::default());
        g.intersects = intersects;

        let mut resolved = 0;
        let bbox = values
            .iter()
            .filter_map(|v| v.extent())
            .inspect(|_| resolved += 1)
            .map(|e| e.bounding_box())
            .reduce(|a, b| a.union(&b));
        if let Some(bbox) = bbox {
            // Values without an extent are never stored, so they do not count.
            let n = resolved;
            let bbox = bbox.inflated(bbox.diagonal() / T::from_usize(n));
            g.grid.set(bbox, best_grid_size(&bbox.size(), n));
            log::debug!(
                "sized grid for {} values: {:?} cells",
                n,
                g.grid.cell_numbers()
            );
        }

        g.insert_all(values);
        g.storage.finish(&g.grid);
        g
    }
}

impl<T, const N: usize, V, S> GridGeneric<T, N, V, S>
where
    T: Scalar,
    V: Spatial<T, N>,
    S: CellStorage<T, N, V>,
{
    /// The underlying regular grid.
    pub fn regular_grid(&self) -> &RegularGrid<T, N> {
        &self.grid
    }

    /// Number of stored entries; a value stored in `k` cells counts `k` times.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether the grid stores nothing.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Iterate over every stored entry.
    pub fn iter(&self) -> impl Iterator<Item = CellEntry<'_, N, V>> + '_ {
        self.storage
            .entries(&self.grid)
            .map(|(cell, id, value)| CellEntry { cell, id, value })
    }

    /// Whether `cell` holds no value.
    pub fn cell_empty(&self, cell: &CellCoord<N>) -> bool {
        self.storage
            .values_in_cell(&self.grid, cell)
            .next()
            .is_none()
    }

    /// Number of values in `cell`.
    pub fn count_in_cell(&self, cell: &CellCoord<N>) -> usize {
        self.storage.values_in_cell(&self.grid, cell).count()
    }

    /// Values stored in `cell`.
    pub fn values_in_cell(
        &self,
        cell: &CellCoord<N>,
    ) -> impl Iterator<Item = CellEntry<'_, N, V>> + '_ {
        let cell = *cell;
        self.storage
            .values_in_cell(&self.grid, &cell)
            .map(move |(id, value)| CellEntry { cell, id, value })
    }

    /// Cells holding at least one value.
    pub fn non_empty_cells(&self) -> BTreeSet<CellCoord<N>> {
        self.storage.non_empty_cells(&self.grid)
    }

    fn cell_range(&self, b: &Aabb<T, N>) -> CellBox<N> {
        CellBox::new(self.grid.cell(&b.min), self.grid.cell(&b.max))
    }

    /// Cells a value occupies: the cell of a point, or the cell range of a box.
    fn footprint(&self, v: &V) -> Option<CellBox<N>> {
        Some(match v.extent()? {
            Extent::Point(p) => {
                let c = self.grid.cell(&p);
                CellBox::new(c, c)
            }
            Extent::Box(b) => self.cell_range(&b),
        })
    }

    /// Insert `value` in every cell it touches.
    ///
    /// With a custom membership test, only the cells accepted by it are
    /// used. Returns whether at least one cell stored the value; a value
    /// without an extent is never stored.
    pub fn insert(&mut self, value: V) -> bool
    where
        V: Clone,
    {
        let Some(footprint) = self.footprint(&value) else {
            return false;
        };
        let id = ElementId::new(self.next_id);
        let mut inserted = false;
        for cell in footprint.cells() {
            if let Some(intersects) = &self.intersects {
                if !intersects(&self.grid.cell_box(&cell), &value) {
                    continue;
                }
            }
            inserted |= self
                .storage
                .insert_in_cell(&self.grid, cell, id, value.clone());
        }
        if inserted {
            self.next_id += 1;
        }
        inserted
    }

    /// Insert every value, in order. Returns how many were stored.
    pub fn insert_all(&mut self, values: impl IntoIterator<Item = V>) -> usize
    where
        V: Clone,
    {
        let mut inserted = 0;
        for v in values {
            if self.insert(v) {
                inserted += 1;
            }
        }
        inserted
    }

    /// Entries within `sphere`.
    ///
    /// Points are tested exactly; extended values match when their bounding
    /// box touches the sphere and are reported once even if stored in
    /// several cells.
    pub fn values_in_sphere(&self, sphere: &Sphere<T, N>) -> Vec<CellEntry<'_, N, V>> {
        let range = CellBox::new(
            self.grid.cell(&(sphere.center - sphere.radius)),
            self.grid.cell(&(sphere.center + sphere.radius)),
        );
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for cell in range.cells() {
            for (id, value) in self.storage.values_in_cell(&self.grid, &cell) {
                if !is_in_sphere(value, sphere) {
                    continue;
                }
                if <V as Spatial<T, N>>::PUNCTUAL || seen.insert(id) {
                    out.push(CellEntry { cell, id, value });
                }
            }
        }
        out
    }

    /// Number of values within `sphere`.
    pub fn count_in_sphere(&self, sphere: &Sphere<T, N>) -> usize {
        self.values_in_sphere(sphere).len()
    }

    /// Closest value to `query`, with early pruning in the distance function.
    ///
    /// `dist_fn(query, value, best)` receives the best distance found so far
    /// and may return any value not smaller than it as soon as it knows the
    /// candidate loses. Only values strictly closer than `max_dist` are
    /// considered; on equal distances the first value found wins.
    ///
    /// The cells touching the query are searched first, then rings of cells
    /// one cell diagonal wider at a time until a candidate is found, the ring
    /// radius exceeds `max_dist` or the whole grid is covered. A last pass
    /// over the query box inflated by the found distance catches closer
    /// values just past the ring boundary.
    pub fn closest_value_bounded<Q, F>(
        &self,
        query: &Q,
        mut dist_fn: F,
        max_dist: T,
    ) -> Option<(CellEntry<'_, N, V>, T)>
    where
        Q: Spatial<T, N> + ?Sized,
        F: FnMut(&Q, &V, T) -> T,
    {
        let bb = query.extent()?.bounding_box();
        let diag = self.grid.cell_diagonal();
        let mut interval = self.cell_range(&bb);
        let mut visited = CellBox::null();
        let mut best = None;

        let mut best_dist = min_t(diag, max_dist);
        self.closest_in_cells(query, &mut dist_fn, &interval, &visited, &mut best_dist, &mut best);

        if best.is_none() {
            best_dist = max_dist;
            let full = CellBox::new([0; N], self.grid.cell_numbers().map(|n| n - 1));
            // Rings around a query outside the grid are empty until they reach it.
            let mut radius = max_t(diag, box_gap(&bb, &self.grid.bounding_box()));
            loop {
                let previous = interval;
                interval.add(self.grid.cell(&(bb.min - radius)));
                interval.add(self.grid.cell(&(bb.max + radius)));
                log::trace!("closest value: ring radius {radius:?}, cells {interval:?}");
                self.closest_in_cells(
                    query,
                    &mut dist_fn,
                    &interval,
                    &visited,
                    &mut best_dist,
                    &mut best,
                );
                visited = interval;
                if best.is_some() || lt(max_dist, radius) || interval == full || !lt(T::ZERO, diag)
                {
                    break;
                }
                let next = radius + diag;
                if !lt(radius, next) || interval == previous {
                    // Far from the grid a cell diagonal is lost in rounding and
                    // rings stop growing; scan whatever is left instead.
                    log::trace!("closest value: rings stalled at {radius:?}, scanning all cells");
                    self.closest_in_cells(
                        query,
                        &mut dist_fn,
                        &full,
                        &visited,
                        &mut best_dist,
                        &mut best,
                    );
                    visited = full;
                    break;
                }
                radius = next;
            }
        }

        if best.is_some() {
            let around = self.cell_range(&bb.inflated(best_dist));
            self.closest_in_cells(query, &mut dist_fn, &around, &visited, &mut best_dist, &mut best);
        }
        best.map(|e| (e, best_dist))
    }

    /// Closest value to `query` strictly within `max_dist`.
    pub fn closest_value_within<Q, F>(
        &self,
        query: &Q,
        mut dist_fn: F,
        max_dist: T,
    ) -> Option<(CellEntry<'_, N, V>, T)>
    where
        Q: Spatial<T, N> + ?Sized,
        F: FnMut(&Q, &V) -> T,
    {
        self.closest_value_bounded(query, |q, v, _| dist_fn(q, v), max_dist)
    }

    /// Closest value to `query` under `dist_fn`, with its distance.
    ///
    /// ```
    /// use understory_grid::{GridGeneric, HashTableGrid2, Point2, RegularGrid};
    ///
    /// let mut grid: HashTableGrid2<Point2<f64>> = GridGeneric::new(RegularGrid::new(
    ///     Point2::new([0.0, 0.0]),
    ///     Point2::new([10.0, 10.0]),
    ///     [5, 5],
    /// ));
    /// grid.insert(Point2::new([0.0, 0.0]));
    /// grid.insert(Point2::new([10.0, 10.0]));
    ///
    /// let query = Point2::new([1.0, 1.0]);
    /// let (hit, d) = grid.closest_value(&query, |q, v| q.dist(v)).unwrap();
    /// assert_eq!(*hit.value, Point2::new([0.0, 0.0]));
    /// assert!((d - 2.0_f64.sqrt()).abs() < 1e-12);
    /// ```
    pub fn closest_value<Q, F>(&self, query: &Q, dist_fn: F) -> Option<(CellEntry<'_, N, V>, T)>
    where
        Q: Spatial<T, N> + ?Sized,
        F: FnMut(&Q, &V) -> T,
    {
        self.closest_value_within(query, dist_fn, T::INFINITY)
    }

    /// Closest value to `p` by Euclidean distance to the value's extent.
    pub fn closest_to_point(&self, p: &Point<T, N>) -> Option<(CellEntry<'_, N, V>, T)> {
        self.closest_value(p, extent_dist)
    }

    /// The `n` closest values to `query`, ascending by distance.
    ///
    /// Ties are ordered by insertion. Fewer than `n` values are returned when
    /// the grid holds fewer; each element appears at most once.
    pub fn k_closest_values<Q, F>(
        &self,
        query: &Q,
        n: usize,
        mut dist_fn: F,
    ) -> Vec<(CellEntry<'_, N, V>, T)>
    where
        Q: Spatial<T, N> + ?Sized,
        F: FnMut(&Q, &V) -> T,
    {
        let mut found = Vec::new();
        if n == 0 {
            return found;
        }
        let Some(extent) = query.extent() else {
            return found;
        };
        let bb = extent.bounding_box();
        let limits = self.grid.cell_numbers();
        let mut seen = BTreeSet::new();
        let mut interval = self.cell_range(&bb);
        let mut visited = CellBox::null();

        loop {
            self.collect_in_cells(query, &mut dist_fn, &interval, &visited, &mut seen, &mut found);
            visited = interval;
            if found.len() >= n {
                break;
            }
            let grown = interval.grown(&limits);
            if grown == interval {
                break;
            }
            log::trace!("k closest: {} of {n} found, growing to {grown:?}", found.len());
            interval = grown;
        }

        found.sort_by(by_distance);
        if found.len() >= n {
            let margin = found[n - 1].1;
            let around = self.cell_range(&bb.inflated(margin));
            self.collect_in_cells(query, &mut dist_fn, &around, &visited, &mut seen, &mut found);
            found.sort_by(by_distance);
        }
        found.truncate(n);
        found
    }

    /// The `n` closest values to `p` by Euclidean distance to their extent.
    pub fn k_closest_to_point(&self, p: &Point<T, N>, n: usize) -> Vec<(CellEntry<'_, N, V>, T)> {
        self.k_closest_values(p, n, extent_dist)
    }

    fn closest_in_cells<'a, Q, F>(
        &'a self,
        query: &Q,
        dist_fn: &mut F,
        cells: &CellBox<N>,
        skip: &CellBox<N>,
        best_dist: &mut T,
        best: &mut Option<CellEntry<'a, N, V>>,
    ) where
        Q: ?Sized,
        F: FnMut(&Q, &V, T) -> T,
    {
        for cell in cells.cells() {
            if skip.contains(&cell) {
                continue;
            }
            for (id, value) in self.storage.values_in_cell(&self.grid, &cell) {
                let d = dist_fn(query, value, *best_dist);
                if lt(d, *best_dist) {
                    *best_dist = d;
                    *best = Some(CellEntry { cell, id, value });
                }
            }
        }
    }

    fn collect_in_cells<'a, Q, F>(
        &'a self,
        query: &Q,
        dist_fn: &mut F,
        cells: &CellBox<N>,
        skip: &CellBox<N>,
        seen: &mut BTreeSet<ElementId>,
        out: &mut Vec<(CellEntry<'a, N, V>, T)>,
    ) where
        Q: ?Sized,
        F: FnMut(&Q, &V) -> T,
    {
        for cell in cells.cells() {
            if skip.contains(&cell) {
                continue;
            }
            for (id, value) in self.storage.values_in_cell(&self.grid, &cell) {
                if !<V as Spatial<T, N>>::PUNCTUAL && !seen.insert(id) {
                    continue;
                }
                out.push((CellEntry { cell, id, value }, dist_fn(query, value)));
            }
        }
    }
}

impl<T, const N: usize, V, S> GridGeneric<T, N, V, S>
where
    T: Scalar,
    V: Spatial<T, N>,
    S: ErasableStorage<T, N, V>,
{
    /// Remove `value` from the cells it currently touches.
    ///
    /// The footprint is computed from the value as it is now; if it moved
    /// since insertion, copies in other cells are left behind. Returns
    /// whether anything was removed.
    pub fn erase(&mut self, value: &V) -> bool
    where
        V: PartialEq,
    {
        let Some(footprint) = self.footprint(value) else {
            return false;
        };
        let mut erased = false;
        for cell in footprint.cells() {
            erased |= self.storage.erase_in_cell(&self.grid, &cell, value);
        }
        erased
    }

    /// Remove every value stored in `cell`. Returns whether the cell held any.
    pub fn erase_all_in_cell(&mut self, cell: &CellCoord<N>) -> bool {
        self.storage.erase_all_in_cell(&self.grid, cell)
    }

    /// Remove every entry matched by [`values_in_sphere`](Self::values_in_sphere).
    ///
    /// Extended values are removed from every covered cell they were found
    /// in. Returns the number of distinct elements affected.
    pub fn erase_in_sphere(&mut self, sphere: &Sphere<T, N>) -> usize {
        let range = CellBox::new(
            self.grid.cell(&(sphere.center - sphere.radius)),
            self.grid.cell(&(sphere.center + sphere.radius)),
        );
        let mut doomed = Vec::new();
        for cell in range.cells() {
            for (id, value) in self.storage.values_in_cell(&self.grid, &cell) {
                if is_in_sphere(value, sphere) {
                    doomed.push((cell, id));
                }
            }
        }
        let mut erased = BTreeSet::new();
        for (cell, id) in doomed {
            if self.storage.erase_entry(&self.grid, &cell, id) {
                erased.insert(id);
            }
        }
        erased.len()
    }

    /// Remove every value.
    pub fn clear(&mut self) {
        self.storage.clear();
    }
}

impl<T: Scalar, const N: usize, V> StaticGrid<T, N, V> {
    /// Sort the inserted values by cell and make them queryable.
    ///
    /// Needed after inserting into a static grid; values inserted since the
    /// last build are invisible to queries until then.
    pub fn build(&mut self) {
        self.storage.build(&self.grid);
    }

    /// Whether every inserted value is visible to queries.
    pub fn is_built(&self) -> bool {
        self.storage.is_built()
    }
}

fn is_in_sphere<T: Scalar, const N: usize, V: Spatial<T, N>>(v: &V, s: &Sphere<T, N>) -> bool {
    match v.extent() {
        Some(Extent::Point(p)) => s.contains_point(&p),
        Some(Extent::Box(b)) => s.intersects_aabb(&b),
        None => false,
    }
}

fn by_distance<T: Scalar, const N: usize, V>(
    a: &(CellEntry<'_, N, V>, T),
    b: &(CellEntry<'_, N, V>, T),
) -> Ordering {
    cmp_dist(&a.1, &b.1).then(a.0.id.cmp(&b.0.id))
}

fn extent_dist<T: Scalar, const N: usize, V: Spatial<T, N>>(p: &Point<T, N>, v: &V) -> T {
    v.extent().map_or(T::INFINITY, |e| e.dist_to_point(p))
}

/// Euclidean distance between two boxes; zero when they overlap.
fn box_gap<T: Scalar, const N: usize>(a: &Aabb<T, N>, b: &Aabb<T, N>) -> T {
    let mut sq = T::ZERO;
    for d in 0..N {
        let g = max_t(max_t(a.min[d] - b.max[d], b.min[d] - a.max[d]), T::ZERO);
        sq = sq + g * g;
    }
    sq.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Point2, Point3};
    use alloc::vec;

    struct Rng(u64);

    impl Rng {
        fn next_f64(&mut self) -> f64 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.0 = x;
            (x >> 11) as f64 / (1_u64 << 53) as f64
        }

        #[allow(
            clippy::cast_possible_truncation,
            reason = "Unit interval samples narrow to f32 without overflow."
        )]
        fn next_f32(&mut self) -> f32 {
            self.next_f64() as f32
        }
    }

    fn grid10() -> RegularGrid<f64, 2> {
        RegularGrid::new(Point::new([0.0, 0.0]), Point::new([10.0, 10.0]), [5, 5])
    }

    fn p2(x: f64, y: f64) -> Point2<f64> {
        Point::new([x, y])
    }

    fn euclid(q: &Point2<f64>, v: &Point2<f64>) -> f64 {
        q.dist(v)
    }

    #[test]
    fn point_lands_in_its_cell() {
        let mut g: HashTableGrid2<Point2<f64>> = GridGeneric::new(grid10());
        assert!(g.insert(p2(3.0, 3.0)));
        assert_eq!(g.regular_grid().cell(&p2(3.0, 3.0)), [1, 1]);
        let hits: Vec<_> = g.values_in_cell(&[1, 1]).map(|e| *e.value).collect();
        assert_eq!(hits, [p2(3.0, 3.0)]);
        assert!(g.cell_empty(&[0, 0]));
    }

    #[test]
    fn sphere_over_cube_finds_all_points() {
        let mut rng = Rng(0x9E37_79B9_7F4A_7C15);
        let size = best_grid_size(&Point::splat(1.0), 100);
        let mut g: HashTableGrid3<Point3<f64>> =
            GridGeneric::new(RegularGrid::new(Point::splat(0.0), Point::splat(1.0), size));
        for _ in 0..100 {
            let p = Point::new([rng.next_f64(), rng.next_f64(), rng.next_f64()]);
            assert!(g.insert(p));
        }
        let all = Sphere::new(Point::splat(0.5), 2.0);
        assert_eq!(g.count_in_sphere(&all), 100);
        assert_eq!(g.count_in_sphere(&all), g.values_in_sphere(&all).len());
    }

    #[test]
    fn static_grid_from_values() {
        let mut rng = Rng(42);
        let points: Vec<_> = (0..50)
            .map(|_| p2(rng.next_f64() * 8.0, rng.next_f64() * 3.0))
            .collect();
        let g: StaticGrid2<Point2<f64>> = StaticGrid2::from_values(points.iter().copied());
        assert!(g.is_built());
        assert_eq!(g.len(), 50);
        assert!(g.non_empty_cells().len() <= 50);
        for p in &points {
            let cell = g.regular_grid().cell(p);
            assert!(g.values_in_cell(&cell).any(|e| e.value == p));
        }
    }

    #[test]
    fn static_grid_needs_rebuild_after_insert() {
        let mut g: StaticGrid2<Point2<f64>> = GridGeneric::new(grid10());
        g.insert(p2(1.0, 1.0));
        assert!(!g.is_built());
        assert_eq!(g.count_in_cell(&[0, 0]), 0);
        g.build();
        assert_eq!(g.count_in_cell(&[0, 0]), 1);
        assert_eq!(g.closest_to_point(&p2(9.0, 9.0)).map(|(e, _)| *e.value), Some(p2(1.0, 1.0)));
    }

    #[test]
    fn closest_value_is_exact() {
        let mut g: HashTableGrid2<Point2<f64>> = GridGeneric::new(grid10());
        g.insert(p2(0.0, 0.0));
        g.insert(p2(10.0, 10.0));
        let (hit, d) = g.closest_value(&p2(1.0, 1.0), euclid).unwrap();
        assert_eq!(*hit.value, p2(0.0, 0.0));
        assert_eq!(hit.cell, [0, 0]);
        assert!((d - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn closest_value_respects_max_dist() {
        let mut g: HashTableGrid2<Point2<f64>> = GridGeneric::new(grid10());
        g.insert(p2(9.0, 9.0));
        let q = p2(0.0, 0.0);
        assert!(g.closest_value_within(&q, euclid, 5.0).is_none());
        let (hit, d) = g.closest_value_within(&q, euclid, 13.0).unwrap();
        assert_eq!(*hit.value, p2(9.0, 9.0));
        assert!((d - 162.0_f64.sqrt()).abs() < 1e-12);
        // Exactly at the bound is not within it.
        assert!(g.closest_value_within(&q, euclid, 162.0_f64.sqrt()).is_none());
    }

    #[test]
    fn closest_value_across_ring_boundary() {
        let mut g: HashTableGrid2<Point2<f64>> = GridGeneric::new(grid10());
        // The first ring only reaches (3.9, 3.9); the closer point lies one
        // cell further along x.
        g.insert(p2(3.9, 3.9));
        g.insert(p2(5.0, 1.0));
        let (hit, d) = g.closest_value(&p2(1.0, 1.0), euclid).unwrap();
        assert_eq!(*hit.value, p2(5.0, 1.0));
        assert_eq!(hit.cell, [2, 0]);
        assert!((d - 4.0).abs() < 1e-12);
    }

    #[test]
    fn closest_value_from_outside_the_grid() {
        let mut g: HashTableGrid2<Point2<f64>> = GridGeneric::new(grid10());
        g.insert(p2(9.0, 1.0));
        g.insert(p2(1.0, 1.0));
        let (hit, d) = g.closest_value(&p2(100.0, 0.0), euclid).unwrap();
        assert_eq!(*hit.value, p2(9.0, 1.0));
        assert!((d - p2(100.0, 0.0).dist(&p2(9.0, 1.0))).abs() < 1e-9);
    }

    #[test]
    fn closest_value_far_outside_the_grid() {
        let mut g: HashTableGrid2<Point2<f64>> = GridGeneric::new(grid10());
        g.insert(p2(1.0, 5.0));
        let far = p2(1e17, 5.0);
        let (hit, d) = g.closest_value(&far, euclid).unwrap();
        assert_eq!(*hit.value, p2(1.0, 5.0));
        assert_eq!(d, far.dist(&p2(1.0, 5.0)));
        assert_eq!(g.k_closest_to_point(&far, 3).len(), 1);

        let mut g32: HashTableGrid2<Point2<f32>, f32> = GridGeneric::new(RegularGrid::new(
            Point::new([0.0, 0.0]),
            Point::new([10.0, 10.0]),
            [5, 5],
        ));
        g32.insert(Point::new([1.0, 5.0]));
        let far32 = Point::new([1e8_f32, 5.0]);
        let (hit, d) = g32
            .closest_value(&far32, |q: &Point2<f32>, v: &Point2<f32>| q.dist(v))
            .unwrap();
        assert_eq!(*hit.value, Point::new([1.0, 5.0]));
        assert_eq!(d, far32.dist(&Point::new([1.0, 5.0])));
        assert!(g32.closest_value_within(&far32, |q, v| q.dist(v), 1e3).is_none());
    }

    #[test]
    fn random_boxes_match_brute_force() {
        let mut rng = Rng(0x2545_F491_4F6C_DD1D);
        let boxes: Vec<Aabb<f64, 2>> = (0..200)
            .map(|_| {
                let min = p2(rng.next_f64() * 100.0, rng.next_f64() * 100.0);
                Aabb::new(min, min + p2(rng.next_f64() * 6.0, rng.next_f64() * 6.0))
            })
            .collect();
        let grid: StaticGrid2<Aabb<f64, 2>> = StaticGrid2::from_values(boxes.iter().copied());
        for _ in 0..50 {
            // Roughly half the queries land outside the grid.
            let q = p2(
                rng.next_f64() * 300.0 - 100.0,
                rng.next_f64() * 300.0 - 100.0,
            );
            let mut brute: Vec<f64> = boxes.iter().map(|b| b.dist_to_point(&q)).collect();
            brute.sort_by(f64::total_cmp);

            let (_, d) = grid.closest_to_point(&q).unwrap();
            assert_eq!(d, brute[0], "closest to {q:?}");
            let k: Vec<f64> = grid
                .k_closest_to_point(&q, 7)
                .iter()
                .map(|(_, d)| *d)
                .collect();
            assert_eq!(k, brute[..7], "7 closest to {q:?}");
        }
    }

    #[test]
    fn random_f32_points_match_brute_force() {
        let mut rng = Rng(0xDEAD_BEEF_0BAD_CAFE);
        let points: Vec<Point2<f32>> = (0..300)
            .map(|_| Point::new([rng.next_f32() * 50.0, rng.next_f32() * 20.0]))
            .collect();
        let hash: HashTableGrid2<Point2<f32>, f32> =
            HashTableGrid2::from_values(points.iter().copied());
        let stat: StaticGrid2<Point2<f32>, f32> = StaticGrid2::from_values(points.iter().copied());
        for _ in 0..50 {
            let q = Point::new([
                rng.next_f32() * 150.0 - 50.0,
                rng.next_f32() * 100.0 - 40.0,
            ]);
            let mut brute: Vec<f32> = points.iter().map(|p| q.dist(p)).collect();
            brute.sort_by(f32::total_cmp);

            let (_, d) = hash.closest_value(&q, |q, p| q.dist(p)).unwrap();
            assert_eq!(d, brute[0], "hash closest to {q:?}");
            let (_, d) = stat.closest_value(&q, |q, p| q.dist(p)).unwrap();
            assert_eq!(d, brute[0], "static closest to {q:?}");

            let k: Vec<f32> = hash
                .k_closest_values(&q, 5, |q, p| q.dist(p))
                .iter()
                .map(|(_, d)| *d)
                .collect();
            assert_eq!(k, brute[..5], "hash 5 closest to {q:?}");
            let k: Vec<f32> = stat
                .k_closest_values(&q, 5, |q, p| q.dist(p))
                .iter()
                .map(|(_, d)| *d)
                .collect();
            assert_eq!(k, brute[..5], "static 5 closest to {q:?}");
        }
    }

    #[test]
    fn sizing_ignores_unresolvable_values() {
        let mut rng = Rng(7);
        let points: Vec<_> = (0..20)
            .map(|_| p2(rng.next_f64() * 10.0, rng.next_f64() * 10.0))
            .collect();
        let plain: HashTableGrid2<Point2<f64>> = GridGeneric::from_values(points.iter().copied());
        let mixed: HashTableGrid2<Option<Point2<f64>>> = GridGeneric::from_values(
            points
                .iter()
                .copied()
                .map(Some)
                .chain(core::iter::repeat_n(None, 80)),
        );
        assert_eq!(mixed.regular_grid(), plain.regular_grid());
        assert_eq!(mixed.len(), 20);
    }

    #[test]
    fn bounded_distance_sees_current_best() {
        let mut g: HashTableGrid2<Point2<f64>> = GridGeneric::new(grid10());
        for i in 0..10 {
            g.insert(p2(f64::from(i), f64::from(i)));
        }
        let mut bounds = Vec::new();
        let (hit, _) = g
            .closest_value_bounded(
                &p2(4.2, 4.2),
                |q, v, best| {
                    bounds.push(best);
                    q.dist(v)
                },
                f64::INFINITY,
            )
            .unwrap();
        assert_eq!(*hit.value, p2(4.0, 4.0));
        assert!(!bounds.is_empty());
        assert!(bounds.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn empty_grid_finds_nothing() {
        let g: HashTableGrid2<Point2<f64>> = GridGeneric::new(grid10());
        assert!(g.is_empty());
        assert!(g.closest_value(&p2(1.0, 1.0), euclid).is_none());
        assert!(g.k_closest_values(&p2(1.0, 1.0), 3, euclid).is_empty());
        assert_eq!(g.count_in_sphere(&Sphere::new(p2(5.0, 5.0), 100.0)), 0);
    }

    #[test]
    fn duplicates_can_be_rejected() {
        let mut g: HashTableGrid2<Point2<f64>, f64, false> = GridGeneric::new(grid10());
        let p = p2(4.0, 7.0);
        assert!(g.insert(p));
        assert!(!g.insert(p));
        assert_eq!(g.count_in_cell(&g.regular_grid().cell(&p)), 1);

        let mut dup: HashTableGrid2<Point2<f64>> = GridGeneric::new(grid10());
        assert!(dup.insert(p));
        assert!(dup.insert(p));
        assert_eq!(dup.count_in_cell(&dup.regular_grid().cell(&p)), 2);
    }

    #[test]
    fn k_closest_matches_brute_force() {
        let points = [
            p2(1.0, 1.0),
            p2(8.0, 2.0),
            p2(4.5, 4.5),
            p2(9.5, 9.5),
            p2(2.0, 6.0),
        ];
        let g: HashTableGrid2<Point2<f64>> = GridGeneric::from_values(points);
        let q = p2(3.0, 3.0);
        let got = g.k_closest_values(&q, 3, euclid);
        assert_eq!(got.len(), 3);

        let mut brute: Vec<f64> = points.iter().map(|p| p.dist(&q)).collect();
        brute.sort_by(f64::total_cmp);
        let dists: Vec<f64> = got.iter().map(|(_, d)| *d).collect();
        assert_eq!(dists, brute[..3]);

        assert_eq!(g.k_closest_values(&q, 10, euclid).len(), 5);
        assert!(g.k_closest_values(&q, 0, euclid).is_empty());
    }

    #[test]
    fn k_closest_ties_follow_insertion() {
        let mut g: HashTableGrid2<Point2<f64>> = GridGeneric::new(grid10());
        g.insert(p2(6.0, 5.0));
        g.insert(p2(4.0, 5.0));
        g.insert(p2(5.0, 9.0));
        let got = g.k_closest_to_point(&p2(5.0, 5.0), 2);
        let ids: Vec<usize> = got.iter().map(|(e, _)| e.id.get()).collect();
        assert_eq!(ids, [0, 1]);
    }

    #[test]
    fn extended_values_span_cells_and_dedup() {
        let mut g: HashTableGrid2<Aabb<f64, 2>> = GridGeneric::new(grid10());
        let b = Aabb::new(p2(1.0, 1.0), p2(5.0, 5.0));
        assert!(g.insert(b));
        assert_eq!(g.len(), 9);
        assert_eq!(g.non_empty_cells().len(), 9);

        let s = Sphere::new(p2(3.0, 3.0), 1.0);
        let hits = g.values_in_sphere(&s);
        assert_eq!(hits.len(), 1);
        assert_eq!(*hits[0].value, b);

        let (hit, d) = g.closest_to_point(&p2(9.0, 5.0)).unwrap();
        assert_eq!(*hit.value, b);
        assert!((d - 4.0).abs() < 1e-12);
        assert_eq!(g.k_closest_to_point(&p2(9.0, 5.0), 4).len(), 1);

        assert!(g.erase(&b));
        assert!(g.is_empty());
        assert!(!g.erase(&b));
    }

    #[test]
    fn custom_intersects_filters_cells() {
        let mut g: HashTableGrid2<Aabb<f64, 2>> =
            GridGeneric::with_intersects(grid10(), |cell, _| cell.min[0] < 1.0);
        assert!(g.insert(Aabb::new(p2(1.0, 1.0), p2(5.0, 5.0))));
        assert_eq!(g.len(), 3);
        assert!(g.iter().all(|e| e.cell[0] == 0));
        assert!(!g.insert(Aabb::new(p2(6.0, 6.0), p2(7.0, 7.0))));
    }

    #[test]
    fn unresolvable_values_are_ignored() {
        let mut g: HashTableGrid2<Option<Point2<f64>>> = GridGeneric::new(grid10());
        assert!(!g.insert(None));
        assert!(g.insert(Some(p2(2.0, 2.0))));
        assert!(!g.erase(&None));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn erase_in_sphere_and_cells() {
        let mut g: HashTableGrid2<Point2<f64>> = GridGeneric::new(grid10());
        g.insert_all(vec![p2(1.0, 1.0), p2(1.5, 1.0), p2(9.0, 9.0)]);
        assert_eq!(g.erase_in_sphere(&Sphere::new(p2(1.0, 1.0), 1.0)), 2);
        assert_eq!(g.len(), 1);
        assert!(g.erase_all_in_cell(&[4, 4]));
        assert!(g.is_empty());

        g.insert(p2(3.0, 3.0));
        g.clear();
        assert!(g.is_empty());
    }

    #[test]
    fn erase_in_sphere_only_touches_covered_cells() {
        let mut g: HashTableGrid2<Aabb<f64, 2>> = GridGeneric::new(grid10());
        let b = Aabb::new(p2(1.0, 1.0), p2(5.0, 5.0));
        g.insert(b);
        // Covers cells [1..=4] on both axes: four of the nine copies.
        assert_eq!(g.erase_in_sphere(&Sphere::new(p2(5.0, 5.0), 3.0)), 1);
        assert_eq!(g.len(), 5);
        assert_eq!(g.erase_in_sphere(&Sphere::new(p2(3.0, 3.0), 5.0)), 1);
        assert!(g.is_empty());
    }

    #[test]
    fn sphere_outside_grid_is_empty() {
        let g: HashTableGrid2<Point2<f64>> = GridGeneric::from_values([p2(1.0, 1.0), p2(9.0, 9.0)]);
        assert_eq!(g.count_in_sphere(&Sphere::new(p2(50.0, 50.0), 1.0)), 0);
    }
}
