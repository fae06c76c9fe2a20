// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`Spatial`] trait: how grids see the values they store and query with.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::sync::Arc;

use crate::types::{Aabb, Point, Scalar, Sphere};

/// Where a value lives in space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Extent<T, const N: usize> {
    /// A punctual value (a point or a vertex).
    Point(Point<T, N>),
    /// An extended value, approximated by its bounding box.
    Box(Aabb<T, N>),
}

impl<T: Scalar, const N: usize> Extent<T, N> {
    /// Bounding box of the extent; degenerate for points.
    pub fn bounding_box(&self) -> Aabb<T, N> {
        match self {
            Self::Point(p) => Aabb::from_point(*p),
            Self::Box(b) => *b,
        }
    }

    /// Center of the extent.
    pub fn center(&self) -> Point<T, N> {
        match self {
            Self::Point(p) => *p,
            Self::Box(b) => b.center(),
        }
    }

    /// Euclidean distance from `p` to the extent; zero inside a box.
    pub fn dist_to_point(&self, p: &Point<T, N>) -> T {
        match self {
            Self::Point(q) => q.dist(p),
            Self::Box(b) => b.dist_to_point(p),
        }
    }
}

/// A value that can be placed in (or used to query) a grid.
///
/// Punctual types (`PUNCTUAL == true`) occupy exactly the cell containing
/// their position, and query results over them never need deduplication.
/// Every other type is stored in each cell touched by its bounding box.
///
/// Handles are supported transparently: references, `Box`, `Rc` and `Arc`
/// forward to the pointee, and `Option` yields no extent for `None`.
/// A value without an extent is never inserted, erased or matched.
///
/// ```
/// use understory_grid::{Extent, Point3, Spatial};
///
/// struct Vertex {
///     position: Point3<f64>,
///     _normal: [f32; 3],
/// }
///
/// impl Spatial<f64, 3> for Vertex {
///     const PUNCTUAL: bool = true;
///
///     fn extent(&self) -> Option<Extent<f64, 3>> {
///         Some(Extent::Point(self.position))
///     }
/// }
/// ```
pub trait Spatial<T: Scalar, const N: usize> {
    /// Whether every value of this type is a single point.
    const PUNCTUAL: bool;

    /// The extent of the value, or `None` if it cannot be resolved.
    ///
    /// Punctual types must return [`Extent::Point`].
    fn extent(&self) -> Option<Extent<T, N>>;
}

impl<T: Scalar, const N: usize> Spatial<T, N> for Point<T, N> {
    const PUNCTUAL: bool = true;

    fn extent(&self) -> Option<Extent<T, N>> {
        Some(Extent::Point(*self))
    }
}

impl<T: Scalar, const N: usize> Spatial<T, N> for Aabb<T, N> {
    const PUNCTUAL: bool = false;

    fn extent(&self) -> Option<Extent<T, N>> {
        Some(Extent::Box(*self))
    }
}

impl<T: Scalar, const N: usize> Spatial<T, N> for Sphere<T, N> {
    const PUNCTUAL: bool = false;

    fn extent(&self) -> Option<Extent<T, N>> {
        Some(Extent::Box(self.bounding_box()))
    }
}

impl<T: Scalar, const N: usize, S: Spatial<T, N> + ?Sized> Spatial<T, N> for &S {
    const PUNCTUAL: bool = S::PUNCTUAL;

    fn extent(&self) -> Option<Extent<T, N>> {
        (**self).extent()
    }
}

impl<T: Scalar, const N: usize, S: Spatial<T, N> + ?Sized> Spatial<T, N> for Box<S> {
    const PUNCTUAL: bool = S::PUNCTUAL;

    fn extent(&self) -> Option<Extent<T, N>> {
        (**self).extent()
    }
}

impl<T: Scalar, const N: usize, S: Spatial<T, N> + ?Sized> Spatial<T, N> for Rc<S> {
    const PUNCTUAL: bool = S::PUNCTUAL;

    fn extent(&self) -> Option<Extent<T, N>> {
        (**self).extent()
    }
}

impl<T: Scalar, const N: usize, S: Spatial<T, N> + ?Sized> Spatial<T, N> for Arc<S> {
    const PUNCTUAL: bool = S::PUNCTUAL;

    fn extent(&self) -> Option<Extent<T, N>> {
        (**self).extent()
    }
}

impl<T: Scalar, const N: usize, S: Spatial<T, N>> Spatial<T, N> for Option<S> {
    const PUNCTUAL: bool = S::PUNCTUAL;

    fn extent(&self) -> Option<Extent<T, N>> {
        self.as_ref()?.extent()
    }
}
