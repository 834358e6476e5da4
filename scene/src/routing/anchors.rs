//! Anchor computers: where an edge meets the outline of a connectable shape.
//!
//! An anchor is computed from the shape's bounds and a reference point (the
//! next point along the route), both in the coordinate system of the shape's
//! parent. `offset` pushes the anchor outward, away from the outline.
//!
//! Polyline and bezier edges aim at the shape center. Manhattan edges only
//! leave a shape horizontally or vertically, so their anchors keep one
//! coordinate of the reference point.

#[cfg(test)]
#[path = "anchors_test.rs"]
mod anchors_test;

use std::collections::HashMap;
use std::sync::Arc;

use crate::consts::DEFAULT_ANCHOR_KIND;
use crate::geometry::{Bounds, Diamond, Point, PointToPointLine, almost_equals, euclidean_distance, shift_towards};
use crate::model::Element;

pub const RECTANGULAR: &str = "rectangular";
pub const ELLIPTIC: &str = "elliptic";
pub const DIAMOND: &str = "diamond";

/// Computes the boundary point of a shape facing a reference point.
pub trait AnchorComputer: Send + Sync {
    /// Anchor kind, e.g. `rectangular`.
    fn kind(&self) -> &'static str;

    fn anchor(&self, bounds: &Bounds, ref_point: Point, offset: f64) -> Point;
}

/// Anchor kind of a connectable: explicit `anchorKind`, else derived from the
/// type's sub-part (`node:circle` is elliptic), else rectangular.
#[must_use]
pub fn anchor_kind_of(element: &Element) -> &str {
    if let Some(kind) = element.anchor_kind.as_deref() {
        return kind;
    }
    match element.kind.sub.as_deref() {
        Some(sub) if sub.contains("circle") || sub.contains("ellipse") => ELLIPTIC,
        Some(sub) if sub.contains("diamond") => DIAMOND,
        _ => DEFAULT_ANCHOR_KIND,
    }
}

// =============================================================================
// CENTER-SEEKING ANCHORS
// =============================================================================

/// Picks the candidate closest to the reference point, defaulting to the center.
struct NearestPointFinder {
    ref_point: Point,
    best: Point,
    best_distance: f64,
}

impl NearestPointFinder {
    fn new(center: Point, ref_point: Point) -> Self {
        Self { ref_point, best: center, best_distance: f64::INFINITY }
    }

    fn add_candidate(&mut self, x: f64, y: f64) {
        let candidate = Point::new(x, y);
        let distance = euclidean_distance(candidate, self.ref_point);
        if distance < self.best_distance {
            self.best = candidate;
            self.best_distance = distance;
        }
    }
}

fn x_at(y: f64, center: Point, point: Point) -> f64 {
    let t = (y - center.y) / (point.y - center.y);
    (point.x - center.x) * t + center.x
}

fn y_at(x: f64, center: Point, point: Point) -> f64 {
    let t = (x - center.x) / (point.x - center.x);
    (point.y - center.y) * t + center.y
}

/// Intersection of the center→reference line with the rectangle outline.
#[derive(Debug, Clone, Copy, Default)]
pub struct RectangleAnchor;

impl AnchorComputer for RectangleAnchor {
    fn kind(&self) -> &'static str {
        RECTANGULAR
    }

    fn anchor(&self, bounds: &Bounds, ref_point: Point, offset: f64) -> Point {
        if !bounds.is_valid() {
            return bounds.position();
        }
        let c = bounds.center();
        let mut finder = NearestPointFinder::new(c, ref_point);
        let (left, right) = (bounds.x, bounds.x + bounds.width);
        let (top, bottom) = (bounds.y, bounds.y + bounds.height);
        if !almost_equals(c.y, ref_point.y) {
            let x_top = x_at(top, c, ref_point);
            if x_top >= left && x_top <= right {
                finder.add_candidate(x_top, top - offset);
            }
            let x_bottom = x_at(bottom, c, ref_point);
            if x_bottom >= left && x_bottom <= right {
                finder.add_candidate(x_bottom, bottom + offset);
            }
        }
        if !almost_equals(c.x, ref_point.x) {
            let y_left = y_at(left, c, ref_point);
            if y_left >= top && y_left <= bottom {
                finder.add_candidate(left - offset, y_left);
            }
            let y_right = y_at(right, c, ref_point);
            if y_right >= top && y_right <= bottom {
                finder.add_candidate(right + offset, y_right);
            }
        }
        finder.best
    }
}

/// Point on the ellipse inscribed in the bounds, towards the reference point.
#[derive(Debug, Clone, Copy, Default)]
pub struct EllipseAnchor;

impl AnchorComputer for EllipseAnchor {
    fn kind(&self) -> &'static str {
        ELLIPTIC
    }

    fn anchor(&self, bounds: &Bounds, ref_point: Point, offset: f64) -> Point {
        if !bounds.is_valid() {
            return bounds.position();
        }
        let c = bounds.center();
        let dx = c.x - ref_point.x;
        let dy = c.y - ref_point.y;
        let distance = dx.hypot(dy);
        if distance == 0.0 {
            return c;
        }
        Point::new(
            c.x - dx / distance * (0.5 * bounds.width + offset),
            c.y - dy / distance * (0.5 * bounds.height + offset),
        )
    }
}

/// Point on the diamond inscribed in the bounds, towards the reference point.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiamondAnchor;

impl AnchorComputer for DiamondAnchor {
    fn kind(&self) -> &'static str {
        DIAMOND
    }

    fn anchor(&self, bounds: &Bounds, ref_point: Point, offset: f64) -> Point {
        if !bounds.is_valid() {
            return bounds.position();
        }
        let c = bounds.center();
        let reference = PointToPointLine::new(c, ref_point);
        let side = Diamond::new(bounds).closest_side_line(ref_point);
        match side.intersection(&reference) {
            Some(anchor) => shift_towards(anchor, ref_point, offset),
            None => c,
        }
    }
}

// =============================================================================
// AXIS-ALIGNED ANCHORS
// =============================================================================

/// Where a horizontal or vertical line through the reference point leaves the
/// shape. `outline(vertical, coordinate, towards_low)` returns the crossing
/// coordinate on the other axis.
fn axis_aligned<F>(bounds: &Bounds, ref_point: Point, offset: f64, outline: F) -> Point
where
    F: Fn(bool, f64, bool) -> Option<f64>,
{
    if !bounds.is_valid() || bounds.width <= 0.0 || bounds.height <= 0.0 {
        return bounds.position();
    }
    let c = bounds.center();
    if ref_point.x >= bounds.x && ref_point.x <= bounds.x + bounds.width {
        let above = ref_point.y < c.y;
        if let Some(y) = outline(true, ref_point.x, above) {
            return Point::new(ref_point.x, if above { y - offset } else { y + offset });
        }
    }
    if ref_point.y >= bounds.y && ref_point.y <= bounds.y + bounds.height {
        let left = ref_point.x < c.x;
        if let Some(x) = outline(false, ref_point.y, left) {
            return Point::new(if left { x - offset } else { x + offset }, ref_point.y);
        }
    }
    c
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ManhattanRectangularAnchor;

impl AnchorComputer for ManhattanRectangularAnchor {
    fn kind(&self) -> &'static str {
        RECTANGULAR
    }

    fn anchor(&self, bounds: &Bounds, ref_point: Point, offset: f64) -> Point {
        axis_aligned(bounds, ref_point, offset, |vertical, _, low| {
            Some(match (vertical, low) {
                (true, true) => bounds.y,
                (true, false) => bounds.y + bounds.height,
                (false, true) => bounds.x,
                (false, false) => bounds.x + bounds.width,
            })
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ManhattanEllipticAnchor;

impl AnchorComputer for ManhattanEllipticAnchor {
    fn kind(&self) -> &'static str {
        ELLIPTIC
    }

    fn anchor(&self, bounds: &Bounds, ref_point: Point, offset: f64) -> Point {
        let c = bounds.center();
        let (rx, ry) = (0.5 * bounds.width, 0.5 * bounds.height);
        axis_aligned(bounds, ref_point, offset, |vertical, coordinate, low| {
            let (along, radius, across_radius, center_across) =
                if vertical { ((coordinate - c.x) / rx, rx, ry, c.y) } else { ((coordinate - c.y) / ry, ry, rx, c.x) };
            if radius <= 0.0 {
                return None;
            }
            let extent = across_radius * (1.0 - along * along).max(0.0).sqrt();
            Some(if low { center_across - extent } else { center_across + extent })
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ManhattanDiamondAnchor;

impl AnchorComputer for ManhattanDiamondAnchor {
    fn kind(&self) -> &'static str {
        DIAMOND
    }

    fn anchor(&self, bounds: &Bounds, ref_point: Point, offset: f64) -> Point {
        let diamond = Diamond::new(bounds);
        let c = bounds.center();
        axis_aligned(bounds, ref_point, offset, |vertical, coordinate, low| {
            let (probe, line) = if vertical {
                let probe = Point::new(coordinate, if low { c.y - 1.0 } else { c.y + 1.0 });
                (probe, PointToPointLine::new(Point::new(coordinate, c.y), probe))
            } else {
                let probe = Point::new(if low { c.x - 1.0 } else { c.x + 1.0 }, coordinate);
                (probe, PointToPointLine::new(Point::new(c.x, coordinate), probe))
            };
            let side = diamond.closest_side_line(probe);
            side.intersection(&line).map(|p| if vertical { p.y } else { p.x })
        })
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Anchor computers keyed by `"{router}:{anchor}"`.
#[derive(Clone, Default)]
pub struct AnchorRegistry {
    computers: HashMap<String, Arc<dyn AnchorComputer>>,
}

impl AnchorRegistry {
    /// Rectangular, elliptic and diamond anchors for the three built-in routers.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        for router in ["polyline", "bezier"] {
            registry.register(router, Arc::new(RectangleAnchor));
            registry.register(router, Arc::new(EllipseAnchor));
            registry.register(router, Arc::new(DiamondAnchor));
        }
        registry.register("manhattan", Arc::new(ManhattanRectangularAnchor));
        registry.register("manhattan", Arc::new(ManhattanEllipticAnchor));
        registry.register("manhattan", Arc::new(ManhattanDiamondAnchor));
        registry
    }

    pub fn register(&mut self, router_kind: &str, computer: Arc<dyn AnchorComputer>) {
        self.computers.insert(format!("{router_kind}:{}", computer.kind()), computer);
    }

    /// Computer for the pair, falling back to the router's rectangular anchor
    /// and then to the plain rectangle anchor.
    #[must_use]
    pub fn get(&self, router_kind: &str, anchor_kind: &str) -> Arc<dyn AnchorComputer> {
        self.computers
            .get(&format!("{router_kind}:{anchor_kind}"))
            .or_else(|| self.computers.get(&format!("{router_kind}:{DEFAULT_ANCHOR_KIND}")))
            .map_or_else(|| Arc::new(RectangleAnchor) as Arc<dyn AnchorComputer>, Arc::clone)
    }
}

impl std::fmt::Debug for AnchorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.computers.keys().collect();
        keys.sort();
        f.debug_struct("AnchorRegistry").field("computers", &keys).finish()
    }
}
