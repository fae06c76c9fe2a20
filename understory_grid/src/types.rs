// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

use core::cmp::Ordering;
use core::fmt::Debug;
use core::ops::{Add, Div, Index, IndexMut, Mul, Sub};

/// Floating-point scalar abstraction used by grids.
///
/// Implemented for `f32` and `f64`. Math that is not available in `core`
/// (`sqrt`, `powf`) is routed through `std` or `libm` depending on the
/// enabled feature.
pub trait Scalar:
    Copy
    + PartialOrd
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    /// Zero value for the scalar type.
    const ZERO: Self;

    /// One value for the scalar type.
    const ONE: Self;

    /// Positive infinity; used as an unbounded query distance.
    const INFINITY: Self;

    /// Convert a count or cell coordinate to the scalar.
    fn from_usize(n: usize) -> Self;

    /// Convert a scalar to the scalar type (used for literal constants).
    fn from_f64(v: f64) -> Self;

    /// Truncate a non-negative value towards zero into a cell coordinate.
    ///
    /// Negative values and NaN map to zero.
    fn to_cell(self) -> usize;

    /// Square root.
    fn sqrt(self) -> Self;

    /// `self` raised to a floating-point power.
    fn powf(self, e: Self) -> Self;
}

impl Scalar for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const INFINITY: Self = f32::INFINITY;

    #[inline]
    fn from_usize(n: usize) -> Self {
        n as Self
    }

    #[inline]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Narrowing of literal constants to f32 is intended."
    )]
    fn from_f64(v: f64) -> Self {
        v as Self
    }

    #[inline]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Float to cell casts saturate and truncate towards zero by design."
    )]
    fn to_cell(self) -> usize {
        self as usize
    }

    #[inline]
    fn sqrt(self) -> Self {
        #[cfg(feature = "std")]
        {
            Self::sqrt(self)
        }
        #[cfg(not(feature = "std"))]
        {
            libm::sqrtf(self)
        }
    }

    #[inline]
    fn powf(self, e: Self) -> Self {
        #[cfg(feature = "std")]
        {
            Self::powf(self, e)
        }
        #[cfg(not(feature = "std"))]
        {
            libm::powf(self, e)
        }
    }
}

impl Scalar for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const INFINITY: Self = f64::INFINITY;

    #[inline]
    fn from_usize(n: usize) -> Self {
        n as Self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Float to cell casts saturate and truncate towards zero by design."
    )]
    fn to_cell(self) -> usize {
        self as usize
    }

    #[inline]
    fn sqrt(self) -> Self {
        #[cfg(feature = "std")]
        {
            Self::sqrt(self)
        }
        #[cfg(not(feature = "std"))]
        {
            libm::sqrt(self)
        }
    }

    #[inline]
    fn powf(self, e: Self) -> Self {
        #[cfg(feature = "std")]
        {
            Self::powf(self, e)
        }
        #[cfg(not(feature = "std"))]
        {
            libm::pow(self, e)
        }
    }
}

/// A point (or vector) in `N` dimensions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point<T, const N: usize> {
    coords: [T; N],
}

/// A 2D point.
pub type Point2<T> = Point<T, 2>;

/// A 3D point.
pub type Point3<T> = Point<T, 3>;

impl<T, const N: usize> Point<T, N> {
    /// Create a point from its coordinates.
    pub const fn new(coords: [T; N]) -> Self {
        Self { coords }
    }

    /// The coordinates of the point.
    pub const fn coords(&self) -> &[T; N] {
        &self.coords
    }
}

impl<T: Scalar, const N: usize> Point<T, N> {
    /// A point with every coordinate equal to `v`.
    pub fn splat(v: T) -> Self {
        Self { coords: [v; N] }
    }

    /// The origin.
    pub fn zero() -> Self {
        Self::splat(T::ZERO)
    }

    /// Squared euclidean norm.
    pub fn squared_norm(&self) -> T {
        self.coords.iter().fold(T::ZERO, |acc, &c| acc + c * c)
    }

    /// Euclidean norm.
    pub fn norm(&self) -> T {
        self.squared_norm().sqrt()
    }

    /// Euclidean distance to another point.
    pub fn dist(&self, other: &Self) -> T {
        (*self - *other).norm()
    }

    /// Squared euclidean distance to another point.
    pub fn squared_dist(&self, other: &Self) -> T {
        (*self - *other).squared_norm()
    }

    fn zip_with(self, other: Self, f: impl Fn(T, T) -> T) -> Self {
        let mut coords = self.coords;
        for (c, o) in coords.iter_mut().zip(other.coords) {
            *c = f(*c, o);
        }
        Self { coords }
    }

    fn map(self, f: impl Fn(T) -> T) -> Self {
        Self {
            coords: self.coords.map(f),
        }
    }
}

impl<T, const N: usize> From<[T; N]> for Point<T, N> {
    fn from(coords: [T; N]) -> Self {
        Self { coords }
    }
}

impl<T, const N: usize> Index<usize> for Point<T, N> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        &self.coords[i]
    }
}

impl<T, const N: usize> IndexMut<usize> for Point<T, N> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.coords[i]
    }
}

impl<T: Scalar, const N: usize> Add for Point<T, N> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl<T: Scalar, const N: usize> Sub for Point<T, N> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a - b)
    }
}

/// Adds the scalar to every coordinate.
impl<T: Scalar, const N: usize> Add<T> for Point<T, N> {
    type Output = Self;

    fn add(self, rhs: T) -> Self {
        self.map(|a| a + rhs)
    }
}

/// Subtracts the scalar from every coordinate.
impl<T: Scalar, const N: usize> Sub<T> for Point<T, N> {
    type Output = Self;

    fn sub(self, rhs: T) -> Self {
        self.map(|a| a - rhs)
    }
}

impl<T: Scalar, const N: usize> Mul<T> for Point<T, N> {
    type Output = Self;

    fn mul(self, rhs: T) -> Self {
        self.map(|a| a * rhs)
    }
}

/// Axis-aligned bounding box in `N` dimensions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb<T, const N: usize> {
    /// Minimum corner.
    pub min: Point<T, N>,
    /// Maximum corner.
    pub max: Point<T, N>,
}

impl<T, const N: usize> Aabb<T, N> {
    /// Create a box from min/max corners.
    pub const fn new(min: Point<T, N>, max: Point<T, N>) -> Self {
        Self { min, max }
    }
}

impl<T: Scalar, const N: usize> Aabb<T, N> {
    /// A degenerate box containing exactly `p`.
    pub fn from_point(p: Point<T, N>) -> Self {
        Self { min: p, max: p }
    }

    /// Grow the box so that it contains `p`.
    pub fn add_point(&mut self, p: &Point<T, N>) {
        for i in 0..N {
            self.min[i] = min_t(self.min[i], p[i]);
            self.max[i] = max_t(self.max[i], p[i]);
        }
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        out.add_point(&other.min);
        out.add_point(&other.max);
        out
    }

    /// Edge lengths of the box.
    pub fn size(&self) -> Point<T, N> {
        self.max - self.min
    }

    /// Center of the box.
    pub fn center(&self) -> Point<T, N> {
        (self.min + self.max) * T::from_f64(0.5)
    }

    /// Length of the diagonal.
    pub fn diagonal(&self) -> T {
        self.size().norm()
    }

    /// Whether the (closed) box contains the point.
    pub fn contains_point(&self, p: &Point<T, N>) -> bool {
        (0..N).all(|i| le(self.min[i], p[i]) && le(p[i], self.max[i]))
    }

    /// Whether two closed boxes overlap (touching counts).
    pub fn intersects(&self, other: &Self) -> bool {
        (0..N).all(|i| le(self.min[i], other.max[i]) && le(other.min[i], self.max[i]))
    }

    /// The box grown by `margin` on every side.
    pub fn inflated(&self, margin: T) -> Self {
        Self {
            min: self.min - margin,
            max: self.max + margin,
        }
    }

    /// Squared distance from `p` to the closest point of the box; zero inside.
    pub fn squared_dist_to_point(&self, p: &Point<T, N>) -> T {
        let mut acc = T::ZERO;
        for i in 0..N {
            let d = if lt(p[i], self.min[i]) {
                self.min[i] - p[i]
            } else if lt(self.max[i], p[i]) {
                p[i] - self.max[i]
            } else {
                T::ZERO
            };
            acc = acc + d * d;
        }
        acc
    }

    /// Distance from `p` to the closest point of the box; zero inside.
    pub fn dist_to_point(&self, p: &Point<T, N>) -> T {
        self.squared_dist_to_point(p).sqrt()
    }
}

/// A closed ball in `N` dimensions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sphere<T, const N: usize> {
    /// Center of the sphere.
    pub center: Point<T, N>,
    /// Radius of the sphere.
    pub radius: T,
}

impl<T: Scalar, const N: usize> Sphere<T, N> {
    /// Create a sphere from center and radius.
    pub const fn new(center: Point<T, N>, radius: T) -> Self {
        Self { center, radius }
    }

    /// Whether `p` lies inside or on the sphere.
    pub fn contains_point(&self, p: &Point<T, N>) -> bool {
        le(self.center.squared_dist(p), self.radius * self.radius)
    }

    /// Whether the sphere touches the box.
    pub fn intersects_aabb(&self, b: &Aabb<T, N>) -> bool {
        le(b.squared_dist_to_point(&self.center), self.radius * self.radius)
    }

    /// Bounding box of the sphere.
    pub fn bounding_box(&self) -> Aabb<T, N> {
        Aabb::from_point(self.center).inflated(self.radius)
    }
}

pub(crate) fn min_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => b,
        _ => a,
    }
}

pub(crate) fn max_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => b,
        _ => a,
    }
}

pub(crate) fn le<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o != Ordering::Greater)
        .unwrap_or(false)
}

pub(crate) fn lt<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o == Ordering::Less)
        .unwrap_or(false)
}

/// Total order on distances; NaN compares equal so sorting never panics.
pub(crate) fn cmp_dist<T: PartialOrd>(a: &T, b: &T) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}
