// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Kurbo interop: 2D shapes as grid values and queries.

use kurbo::{Circle, Rect};

use crate::spatial::{Extent, Spatial};
use crate::types::{Aabb, Point};

impl From<kurbo::Point> for Point<f64, 2> {
    fn from(p: kurbo::Point) -> Self {
        Self::new([p.x, p.y])
    }
}

impl From<Point<f64, 2>> for kurbo::Point {
    fn from(p: Point<f64, 2>) -> Self {
        Self::new(p[0], p[1])
    }
}

impl From<Rect> for Aabb<f64, 2> {
    fn from(r: Rect) -> Self {
        Self::new(
            Point::new([r.min_x(), r.min_y()]),
            Point::new([r.max_x(), r.max_y()]),
        )
    }
}

impl From<Aabb<f64, 2>> for Rect {
    fn from(b: Aabb<f64, 2>) -> Self {
        Self::new(b.min[0], b.min[1], b.max[0], b.max[1])
    }
}

impl Spatial<f64, 2> for kurbo::Point {
    const PUNCTUAL: bool = true;

    fn extent(&self) -> Option<Extent<f64, 2>> {
        Some(Extent::Point((*self).into()))
    }
}

impl Spatial<f64, 2> for Rect {
    const PUNCTUAL: bool = false;

    fn extent(&self) -> Option<Extent<f64, 2>> {
        Some(Extent::Box((*self).into()))
    }
}

impl Spatial<f64, 2> for Circle {
    const PUNCTUAL: bool = false;

    fn extent(&self) -> Option<Extent<f64, 2>> {
        let c = Point::from(self.center);
        Some(Extent::Box(Aabb::from_point(c).inflated(self.radius)))
    }
}
