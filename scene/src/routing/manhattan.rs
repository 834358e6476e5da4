//! Manhattan router: orthogonal segments only.
//!
//! The stored routing points are the corners of the path. Cleanup keeps them
//! orthogonal: corners swallowed by the source or target shape are dropped,
//! pairs that collapsed into each other are merged, and a corner is inserted
//! wherever a leg would otherwise run diagonally.

#[cfg(test)]
#[path = "manhattan_test.rs"]
mod manhattan_test;

use std::sync::Arc;

use crate::SceneError;
use crate::consts::MANHATTAN_ALIGN_TOLERANCE;
use crate::geometry::{Point, Side, almost_equals, linear, manhattan_distance};
use crate::model::{Element, HandleKind, Model};
use crate::routing::anchors::AnchorRegistry;
use crate::routing::linear::{
    DefaultAnchors, Endpoints, add_handle, center_in, endpoints, find_route_segment, remove_handles,
    reset_on_reconnect, routing_points, self_edge_corners, self_edge_index, set_point_index, set_routing_points,
    translated_anchor,
};
use crate::routing::{EdgeRouter, HandleEdit, ResolvedHandleMove, RoutedPoint, RoutedPointKind, RouterOptions};

pub const KIND: &str = "manhattan";

#[derive(Debug, Clone)]
pub struct ManhattanRouter {
    anchors: Arc<AnchorRegistry>,
    options: RouterOptions,
}

impl ManhattanRouter {
    #[must_use]
    pub fn new(anchors: Arc<AnchorRegistry>) -> Self {
        Self { anchors, options: RouterOptions::manhattan() }
    }

    #[must_use]
    pub fn with_options(mut self, options: RouterOptions) -> Self {
        self.options = options;
        self
    }

    fn route_through(&self, model: &Model, ends: &Endpoints<'_>, corners: &[Point]) -> Vec<RoutedPoint> {
        let edge_parent = ends.edge_parent;
        let anchor = |connectable: &Element, ref_point: Point, offset: Option<f64>| {
            let offset = offset.unwrap_or(0.0);
            translated_anchor(model, &self.anchors, KIND, connectable, ref_point, edge_parent, edge_parent, offset)
        };
        let source_ref = corners.first().copied().unwrap_or_else(|| center_in(model, ends.target, edge_parent));
        let target_ref = corners.last().copied().unwrap_or_else(|| center_in(model, ends.source, edge_parent));

        let mut route = Vec::with_capacity(corners.len() + 2);
        route.push(RoutedPoint::new(
            RoutedPointKind::Source,
            anchor(ends.source, source_ref, ends.data.source_anchor_correction),
        ));
        route.extend(corners.iter().enumerate().map(|(i, p)| RoutedPoint::indexed(RoutedPointKind::Linear, *p, i)));
        route.push(RoutedPoint::new(
            RoutedPointKind::Target,
            anchor(ends.target, target_ref, ends.data.target_anchor_correction),
        ));
        route
    }

    // ── Default corners ─────────────────────────────────────────

    fn default_corners(
        &self,
        model: &Model,
        ends: &Endpoints<'_>,
        source: &DefaultAnchors,
        target: &DefaultAnchors,
    ) -> Vec<Point> {
        if ends.data.is_self_edge() {
            return self_edge_corners(self_edge_index(model, &ends.edge.id), source, &self.options);
        }
        let sd = self.options.standard_distance;
        let (source_side, target_side) = self.best_connection_sides(source, target);
        let start = source.get(source_side);
        let end = target.get(target_side);
        let mid_x = (start.x + end.x) / 2.0;
        let mid_y = (start.y + end.y) / 2.0;
        match (source_side, target_side) {
            (Side::Right | Side::Left, Side::Top | Side::Bottom) => vec![Point::new(end.x, start.y)],
            (Side::Right, Side::Right) => {
                let x = start.x.max(end.x) + 1.5 * sd;
                vec![Point::new(x, start.y), Point::new(x, end.y)]
            }
            (Side::Left, Side::Left) => {
                let x = start.x.min(end.x) - 1.5 * sd;
                vec![Point::new(x, start.y), Point::new(x, end.y)]
            }
            (Side::Right, Side::Left) | (Side::Left, Side::Right) => {
                if almost_equals(start.y, end.y) {
                    Vec::new()
                } else {
                    vec![Point::new(mid_x, start.y), Point::new(mid_x, end.y)]
                }
            }
            (Side::Top, Side::Right) if end.x > start.x => {
                let y = start.y - sd;
                let x = end.x + 1.5 * sd;
                vec![Point::new(start.x, y), Point::new(x, y), Point::new(x, end.y)]
            }
            (Side::Top, Side::Left) if end.x < start.x => {
                let y = start.y - sd;
                let x = end.x - 1.5 * sd;
                vec![Point::new(start.x, y), Point::new(x, y), Point::new(x, end.y)]
            }
            (Side::Bottom, Side::Right) if end.x > start.x => {
                let y = start.y + sd;
                let x = end.x + 1.5 * sd;
                vec![Point::new(start.x, y), Point::new(x, y), Point::new(x, end.y)]
            }
            (Side::Bottom, Side::Left) if end.x < start.x => {
                let y = start.y + sd;
                let x = end.x - 1.5 * sd;
                vec![Point::new(start.x, y), Point::new(x, y), Point::new(x, end.y)]
            }
            (Side::Top | Side::Bottom, Side::Right | Side::Left) => vec![Point::new(start.x, end.y)],
            (Side::Top, Side::Top) => {
                let y = start.y.min(end.y) - 1.5 * sd;
                vec![Point::new(start.x, y), Point::new(end.x, y)]
            }
            (Side::Bottom, Side::Bottom) => {
                let y = start.y.max(end.y) + 1.5 * sd;
                vec![Point::new(start.x, y), Point::new(end.x, y)]
            }
            (Side::Top, Side::Bottom) | (Side::Bottom, Side::Top) => {
                if almost_equals(start.x, end.x) {
                    Vec::new()
                } else {
                    vec![Point::new(start.x, mid_y), Point::new(end.x, mid_y)]
                }
            }
        }
    }

    /// Pick the pair of sides to connect: facing sides with enough clearance
    /// first, then single-corner L shapes, then Z shapes, then U shapes.
    fn best_connection_sides(&self, s: &DefaultAnchors, t: &DefaultAnchors) -> (Side, Side) {
        let sd = self.options.standard_distance;
        let half = 0.5 * sd;

        // Facing sides, straight or with one jog.
        if t.left.x - s.right.x > sd {
            return (Side::Right, Side::Left);
        }
        if s.left.x - t.right.x > sd {
            return (Side::Left, Side::Right);
        }
        if s.top.y - t.bottom.y > sd {
            return (Side::Top, Side::Bottom);
        }
        if t.top.y - s.bottom.y > sd {
            return (Side::Bottom, Side::Top);
        }

        // One corner.
        if t.top.x - s.right.x > half && t.top.y - s.right.y > sd {
            return (Side::Right, Side::Top);
        }
        if t.bottom.x - s.right.x > half && s.right.y - t.bottom.y > sd {
            return (Side::Right, Side::Bottom);
        }
        if s.left.x - t.top.x > half && t.top.y - s.left.y > sd {
            return (Side::Left, Side::Top);
        }
        if s.left.x - t.bottom.x > half && s.left.y - t.bottom.y > sd {
            return (Side::Left, Side::Bottom);
        }
        if s.top.x - t.right.x > sd && s.top.y - t.right.y > half {
            return (Side::Top, Side::Right);
        }
        if t.left.x - s.top.x > sd && s.top.y - t.left.y > half {
            return (Side::Top, Side::Left);
        }
        if s.bottom.x - t.right.x > sd && t.right.y - s.bottom.y > half {
            return (Side::Bottom, Side::Right);
        }
        if t.left.x - s.bottom.x > sd && t.left.y - s.bottom.y > half {
            return (Side::Bottom, Side::Left);
        }

        // Two corners between shapes that do not overlap on one axis.
        if t.left.x > s.right.x {
            return (Side::Right, Side::Left);
        }
        if s.left.x > t.right.x {
            return (Side::Left, Side::Right);
        }
        if s.top.y > t.bottom.y {
            return (Side::Top, Side::Bottom);
        }
        if t.top.y > s.bottom.y {
            return (Side::Bottom, Side::Top);
        }

        (Side::Right, Side::Bottom)
    }

    // ── Cleanup ─────────────────────────────────────────────────

    /// Insert a corner next to one end when the adjacent leg would otherwise
    /// leave the shape diagonally.
    fn add_additional_corner(
        points: &mut Vec<Point>,
        current: &DefaultAnchors,
        other: &DefaultAnchors,
        at_source: bool,
        edits: &mut Vec<HandleEdit>,
    ) {
        let Some(&ref_point) = (if at_source { points.first() } else { points.last() }) else {
            return;
        };
        let n = points.len();
        let index = if at_source { 0 } else { n };
        let is_horizontal = if n > 1 {
            if at_source {
                almost_equals(points[0].x, points[1].x)
            } else {
                almost_equals(points[n - 1].x, points[n - 2].x)
            }
        } else {
            matches!(other.nearest_side(ref_point), Side::Top | Side::Bottom)
        };
        let corner = if is_horizontal {
            let outside = ref_point.y < current.top.y || ref_point.y > current.bottom.y;
            outside.then(|| Point::new(current.top.x, ref_point.y))
        } else {
            let outside = ref_point.x < current.left.x || ref_point.x > current.right.x;
            outside.then(|| Point::new(ref_point.x, current.left.y))
        };
        if let Some(corner) = corner {
            points.insert(index, corner);
            let shift_index = i32::try_from(index).unwrap_or(i32::MAX) - i32::from(at_source);
            edits.push(HandleEdit::Shift { from_index: shift_index, delta: 1 });
            edits.push(HandleEdit::Add { kind: HandleKind::Manhattan50, point_index: shift_index });
        }
    }

    /// Snap nearly aligned neighbours onto one axis and break diagonal legs
    /// with an extra corner.
    fn manhattanify(points: &mut Vec<Point>, edits: &mut Vec<HandleEdit>) {
        let mut i = 1;
        while i < points.len() {
            let prev = points[i - 1];
            let vertical = (prev.x - points[i].x).abs() < MANHATTAN_ALIGN_TOLERANCE;
            let horizontal = (prev.y - points[i].y).abs() < MANHATTAN_ALIGN_TOLERANCE;
            if vertical {
                points[i].x = prev.x;
            } else if horizontal {
                points[i].y = prev.y;
            } else {
                points.insert(i, Point::new(prev.x, points[i].y));
                let index = i32::try_from(i).unwrap_or(i32::MAX);
                edits.push(HandleEdit::Shift { from_index: index, delta: 1 });
                edits.push(HandleEdit::Add { kind: HandleKind::Manhattan50, point_index: index });
                i += 1;
            }
            i += 1;
        }
    }
}

impl EdgeRouter for ManhattanRouter {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn options(&self) -> RouterOptions {
        self.options
    }

    fn route(&self, model: &Model, edge_id: &str) -> Vec<RoutedPoint> {
        let Some(ends) = endpoints(model, edge_id) else {
            return Vec::new();
        };
        let mut corners = ends.data.routing_points.clone();
        self.cleanup_routing_points(model, edge_id, &mut corners, true);
        self.route_through(model, &ends, &corners)
    }

    /// Commits the current route's corners as routing points, then adds one
    /// handle per segment.
    fn create_routing_handles(&self, model: &mut Model, edge_id: &str) -> Result<(), SceneError> {
        let route = self.route(model, edge_id);
        remove_handles(model, edge_id)?;
        if route.len() < 2 {
            return Ok(());
        }
        let corners = route[1..route.len() - 1].iter().map(|rp| rp.point).collect();
        set_routing_points(model, edge_id, corners);
        let segments = i32::try_from(route.len() - 1).unwrap_or(i32::MAX);
        add_handle(model, edge_id, HandleKind::Source, -2)?;
        for i in 0..segments {
            add_handle(model, edge_id, HandleKind::Manhattan50, i - 1)?;
        }
        add_handle(model, edge_id, HandleKind::Target, segments - 1)?;
        Ok(())
    }

    fn inner_handle_position(
        &self,
        route: &[RoutedPoint],
        model: &Model,
        edge_id: &str,
        kind: HandleKind,
        point_index: i32,
    ) -> Option<Point> {
        let points = routing_points(model, edge_id)?;
        if kind == HandleKind::Manhattan50 {
            let (start, end) = find_route_segment(route, points.len(), point_index)?;
            return Some(linear(start, end, 0.5));
        }
        usize::try_from(point_index).map_or(None, |i| points.get(i).copied())
    }

    fn apply_inner_handle_moves(
        &self,
        model: &mut Model,
        edge_id: &str,
        moves: &[ResolvedHandleMove],
    ) -> Result<(), SceneError> {
        let route = self.route(model, edge_id);
        if route.len() < 2 {
            return Ok(());
        }
        let Some(mut points) = routing_points(model, edge_id) else {
            return Ok(());
        };
        let min = self.options.minimal_point_distance;
        for mv in moves {
            let Some(handle) = model.get(&mv.handle_id).and_then(|e| e.handle.clone()) else {
                continue;
            };
            if handle.kind != HandleKind::Manhattan50 {
                continue;
            }
            let index = handle.point_index;
            let x = snap(&points, index, mv.to.x, min, |p| p.x);
            let y = snap(&points, index, mv.to.y, min, |p| p.y);
            let n = i32::try_from(points.len()).unwrap_or(i32::MAX);
            if index < 0 {
                if points.is_empty() {
                    points.push(Point::new(x, y));
                    set_point_index(model, &mv.handle_id, 0);
                } else if almost_equals(route[0].point.x, route[1].point.x) {
                    align(&mut points, 0, |p| p.x = x);
                } else {
                    align(&mut points, 0, |p| p.y = y);
                }
            } else if index < n - 1 {
                let i = usize::try_from(index).unwrap_or(0);
                if almost_equals(points[i].x, points[i + 1].x) {
                    align(&mut points, i, |p| p.x = x);
                    align(&mut points, i + 1, |p| p.x = x);
                } else {
                    align(&mut points, i, |p| p.y = y);
                    align(&mut points, i + 1, |p| p.y = y);
                }
            } else if let Some(last) = points.len().checked_sub(1) {
                let m = route.len();
                if almost_equals(route[m - 2].point.x, route[m - 1].point.x) {
                    align(&mut points, last, |p| p.x = x);
                } else {
                    align(&mut points, last, |p| p.y = y);
                }
            }
        }
        set_routing_points(model, edge_id, points);
        Ok(())
    }

    fn cleanup_routing_points(
        &self,
        model: &Model,
        edge_id: &str,
        points: &mut Vec<Point>,
        add_points: bool,
    ) -> Vec<HandleEdit> {
        let Some(ends) = endpoints(model, edge_id) else {
            return Vec::new();
        };
        let source = DefaultAnchors::new(model, ends.source, ends.edge_parent);
        let target = DefaultAnchors::new(model, ends.target, ends.edge_parent);
        let corners = || self.default_corners(model, &ends, &source, &target);
        if let Some(reset) = reset_on_reconnect(&ends, points, HandleKind::Manhattan50, corners) {
            return vec![reset];
        }

        let mut edits = Vec::new();
        while points.first().is_some_and(|p| source.bounds.includes(*p)) {
            points.remove(0);
            edits.push(HandleEdit::Remove { point_index: -1 });
        }
        while let Some(last) = points.len().checked_sub(1) {
            if !target.bounds.includes(points[last]) {
                break;
            }
            points.remove(last);
            edits.push(HandleEdit::Remove { point_index: i32::try_from(last).unwrap_or(i32::MAX) });
        }

        let min = self.options.minimal_point_distance;
        let mut i = i64::try_from(points.len()).unwrap_or(0) - 2;
        while i >= 0 {
            let at = usize::try_from(i).unwrap_or(0);
            if at + 1 < points.len() && manhattan_distance(points[at], points[at + 1]) < min {
                points.drain(at..at + 2);
                i -= 1;
                let handle = i32::try_from(i).unwrap_or(0);
                edits.push(HandleEdit::Remove { point_index: handle - 1 });
                edits.push(HandleEdit::Remove { point_index: handle });
            }
            i -= 1;
        }

        if add_points {
            Self::add_additional_corner(points, &source, &target, true, &mut edits);
            Self::add_additional_corner(points, &target, &source, false, &mut edits);
            Self::manhattanify(points, &mut edits);
        }
        edits
    }
}

/// Snap a coordinate onto the corner before or after the moved segment when
/// it lands within `min` of it.
fn snap<F>(points: &[Point], index: i32, value: f64, min: f64, axis: F) -> f64
where
    F: Fn(&Point) -> f64,
{
    let before = usize::try_from(index - 1).map_or(None, |i| points.get(i));
    if let Some(p) = before {
        if (value - axis(p)).abs() < min {
            return axis(p);
        }
    }
    let after = usize::try_from(index + 2).map_or(None, |i| points.get(i));
    if let Some(p) = after {
        if (value - axis(p)).abs() < min {
            return axis(p);
        }
    }
    value
}

fn align<F>(points: &mut [Point], index: usize, set: F)
where
    F: FnOnce(&mut Point),
{
    if let Some(p) = points.get_mut(index) {
        set(p);
    }
}
