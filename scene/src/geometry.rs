//! Geometry kernel: points, dimensions, bounds and line math.
//!
//! Everything here is a pure function over plain `Copy` values. Functions
//! that may have no answer (parallel lines, degenerate shapes) return `Option`
//! so the per-frame routing path never has to unwind.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

use crate::consts::EPSILON;

/// A point in some element's local coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of a shape. Negative values mean "not yet measured".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub width: f64,
    pub height: f64,
}

impl Dimension {
    /// The placeholder size of an element that has not been measured yet.
    pub const EMPTY: Dimension = Dimension { width: -1.0, height: -1.0 };

    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A dimension is valid once both sides are non-negative.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width >= 0.0 && self.height >= 0.0
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const EMPTY: Bounds = Bounds { x: 0.0, y: 0.0, width: -1.0, height: -1.0 };

    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn from_parts(position: Point, size: Dimension) -> Self {
        Self { x: position.x, y: position.y, width: size.width, height: size.height }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn size(&self) -> Dimension {
        Dimension::new(self.width, self.height)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.size().is_valid()
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + 0.5 * self.width, self.y + 0.5 * self.height)
    }

    /// Whether `p` lies inside or on the border of these bounds.
    #[must_use]
    pub fn includes(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// Grow (positive) or shrink (negative) the bounds by `offset` on every side.
    #[must_use]
    pub fn inflate(&self, offset: f64) -> Self {
        Self {
            x: self.x - offset,
            y: self.y - offset,
            width: self.width + 2.0 * offset,
            height: self.height + 2.0 * offset,
        }
    }

    #[must_use]
    pub fn translate(&self, delta: Point) -> Self {
        Self { x: self.x + delta.x, y: self.y + delta.y, ..*self }
    }

    /// Smallest bounds containing both. Invalid bounds are ignored.
    #[must_use]
    pub fn combine(&self, other: &Bounds) -> Self {
        if !other.is_valid() {
            return *self;
        }
        if !self.is_valid() {
            return *other;
        }
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = (self.x + self.width).max(other.x + other.width);
        let max_y = (self.y + self.height).max(other.y + other.height);
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Side of a rectangular shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

// =============================================================================
// POINT ARITHMETIC
// =============================================================================

#[must_use]
pub fn add(a: Point, b: Point) -> Point {
    Point::new(a.x + b.x, a.y + b.y)
}

#[must_use]
pub fn subtract(a: Point, b: Point) -> Point {
    Point::new(a.x - b.x, a.y - b.y)
}

#[must_use]
pub fn scale(p: Point, factor: f64) -> Point {
    Point::new(p.x * factor, p.y * factor)
}

/// Linear interpolation: `lambda = 0` yields `p0`, `lambda = 1` yields `p1`.
#[must_use]
pub fn linear(p0: Point, p1: Point, lambda: f64) -> Point {
    Point::new((1.0 - lambda) * p0.x + lambda * p1.x, (1.0 - lambda) * p0.y + lambda * p1.y)
}

#[must_use]
pub fn euclidean_distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

#[must_use]
pub fn manhattan_distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Chebyshev distance: the larger of the two axis distances.
#[must_use]
pub fn max_distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

#[must_use]
pub fn magnitude(p: Point) -> f64 {
    p.x.hypot(p.y)
}

/// Unit vector in the direction of `p`; the zero vector stays zero.
#[must_use]
pub fn normalize(p: Point) -> Point {
    let m = magnitude(p);
    if m == 0.0 || !m.is_finite() {
        return Point::ORIGIN;
    }
    Point::new(p.x / m, p.y / m)
}

#[must_use]
pub fn dot(a: Point, b: Point) -> f64 {
    a.x * b.x + a.y * b.y
}

/// Unsigned angle between two vectors in radians, in `[0, π]`.
#[must_use]
pub fn angle_between(a: Point, b: Point) -> f64 {
    let denom = magnitude(a) * magnitude(b);
    if denom == 0.0 {
        return 0.0;
    }
    (dot(a, b) / denom).clamp(-1.0, 1.0).acos()
}

#[must_use]
pub fn almost_equals(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

#[must_use]
pub fn points_almost_equal(a: Point, b: Point) -> bool {
    almost_equals(a.x, b.x) && almost_equals(a.y, b.y)
}

/// Move `point` by `distance` along the direction towards `toward`.
/// Negative distances move away from it.
#[must_use]
pub fn shift_towards(point: Point, toward: Point, distance: f64) -> Point {
    let direction = normalize(subtract(toward, point));
    add(point, scale(direction, distance))
}

// =============================================================================
// LINES
// =============================================================================

/// An infinite line through two points, also usable as the segment between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointToPointLine {
    pub p1: Point,
    pub p2: Point,
}

impl PointToPointLine {
    #[must_use]
    pub fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }

    /// Coefficients `(a, b, c)` of `a·x + b·y = c`.
    fn coefficients(&self) -> (f64, f64, f64) {
        let a = self.p2.y - self.p1.y;
        let b = self.p1.x - self.p2.x;
        let c = a * self.p1.x + b * self.p1.y;
        (a, b, c)
    }

    /// `None` for vertical lines.
    #[must_use]
    pub fn slope(&self) -> Option<f64> {
        let dx = self.p2.x - self.p1.x;
        if dx == 0.0 {
            return None;
        }
        Some((self.p2.y - self.p1.y) / dx)
    }

    /// Intersection of the two infinite lines; `None` when parallel.
    #[must_use]
    pub fn intersection(&self, other: &PointToPointLine) -> Option<Point> {
        let (a1, b1, c1) = self.coefficients();
        let (a2, b2, c2) = other.coefficients();
        let det = a1 * b2 - a2 * b1;
        if det.abs() < f64::EPSILON {
            return None;
        }
        Some(Point::new((b2 * c1 - b1 * c2) / det, (a1 * c2 - a2 * c1) / det))
    }

    /// Intersection of the two segments, endpoints included.
    #[must_use]
    pub fn segment_intersection(&self, other: &PointToPointLine) -> Option<Point> {
        let r = subtract(self.p2, self.p1);
        let s = subtract(other.p2, other.p1);
        let denom = r.x * s.y - r.y * s.x;
        if denom.abs() < f64::EPSILON {
            return None;
        }
        let qp = subtract(other.p1, self.p1);
        let t = (qp.x * s.y - qp.y * s.x) / denom;
        let u = (qp.x * r.y - qp.y * r.x) / denom;
        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            return Some(add(self.p1, scale(r, t)));
        }
        None
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        euclidean_distance(self.p1, self.p2)
    }
}

/// A diamond (rhombus) inscribed in a rectangle, vertices at the edge midpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diamond {
    pub top: Point,
    pub right: Point,
    pub bottom: Point,
    pub left: Point,
}

impl Diamond {
    #[must_use]
    pub fn new(bounds: &Bounds) -> Self {
        let c = bounds.center();
        Self {
            top: Point::new(c.x, bounds.y),
            right: Point::new(bounds.x + bounds.width, c.y),
            bottom: Point::new(c.x, bounds.y + bounds.height),
            left: Point::new(bounds.x, c.y),
        }
    }

    /// The diamond side facing `ref_point`, picked by quadrant around the center.
    #[must_use]
    pub fn closest_side_line(&self, ref_point: Point) -> PointToPointLine {
        let c = Point::new(self.top.x, self.left.y);
        let quadrant_right = ref_point.x >= c.x;
        let quadrant_top = ref_point.y < c.y;
        match (quadrant_right, quadrant_top) {
            (true, true) => PointToPointLine::new(self.top, self.right),
            (true, false) => PointToPointLine::new(self.right, self.bottom),
            (false, false) => PointToPointLine::new(self.bottom, self.left),
            (false, true) => PointToPointLine::new(self.left, self.top),
        }
    }
}
