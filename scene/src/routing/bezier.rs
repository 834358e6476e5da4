//! Bezier router: a chain of cubic segments.
//!
//! Routing points hold the inner control points and junctions of the chain:
//! `[after₀, (before, junction, after)*, beforeₙ]`. The source anchor starts
//! the first segment and the target anchor ends the last one, so a valid list
//! has `2 + 3k` entries for `k` junctions. Index `i` is a control-after point
//! when `i % 3 == 0`, a control-before point when `i % 3 == 1` and a junction
//! otherwise.

#[cfg(test)]
#[path = "bezier_test.rs"]
mod bezier_test;

use std::sync::Arc;

use crate::SceneError;
use crate::geometry::{Point, add, euclidean_distance, linear, normalize, scale, subtract};
use crate::model::{HandleKind, Model};
use crate::routing::anchors::AnchorRegistry;
use crate::routing::linear::{
    DefaultAnchors, Endpoints, add_handle, center_in, endpoints, remove_handles, routing_points, set_routing_points,
    translated_anchor,
};
use crate::routing::{EdgeRouter, HandleEdit, ResolvedHandleMove, RoutedPoint, RoutedPointKind, RouterOptions};

pub const KIND: &str = "bezier";

fn handle_kind(index: usize) -> HandleKind {
    match index % 3 {
        0 => HandleKind::BezierControlAfter,
        1 => HandleKind::BezierControlBefore,
        _ => HandleKind::BezierJunction,
    }
}

fn routed_kind(index: usize) -> RoutedPointKind {
    match index % 3 {
        0 => RoutedPointKind::BezierControlAfter,
        1 => RoutedPointKind::BezierControlBefore,
        _ => RoutedPointKind::BezierJunction,
    }
}

fn is_valid_layout(points: &[Point]) -> bool {
    points.len() >= 2 && (points.len() - 2) % 3 == 0
}

/// Cubic bezier through four control points at parameter `u`.
#[must_use]
pub fn cubic(p: &[Point; 4], u: f64) -> Point {
    let v = 1.0 - u;
    let (a, b, c, d) = (v * v * v, 3.0 * v * v * u, 3.0 * v * u * u, u * u * u);
    Point::new(
        a * p[0].x + b * p[1].x + c * p[2].x + d * p[3].x,
        a * p[0].y + b * p[1].y + c * p[2].y + d * p[3].y,
    )
}

/// First derivative of [`cubic`].
#[must_use]
pub fn cubic_derivative(p: &[Point; 4], u: f64) -> Point {
    let v = 1.0 - u;
    let d0 = scale(subtract(p[1], p[0]), 3.0 * v * v);
    let d1 = scale(subtract(p[2], p[1]), 6.0 * v * u);
    let d2 = scale(subtract(p[3], p[2]), 3.0 * u * u);
    add(add(d0, d1), d2)
}

/// Split a cubic at its midpoint; returns the five inner points of the two
/// halves `[q0, r0, m, r1, q2]`.
#[must_use]
pub fn split_half(p: &[Point; 4]) -> [Point; 5] {
    let q0 = linear(p[0], p[1], 0.5);
    let q1 = linear(p[1], p[2], 0.5);
    let q2 = linear(p[2], p[3], 0.5);
    let r0 = linear(q0, q1, 0.5);
    let r1 = linear(q1, q2, 0.5);
    let m = linear(r0, r1, 0.5);
    [q0, r0, m, r1, q2]
}

/// The cubic segments of a bezier route, source to target.
#[must_use]
pub fn segments(route: &[RoutedPoint]) -> Vec<[Point; 4]> {
    let mut out = Vec::new();
    let mut i = 0;
    while i + 3 < route.len() {
        out.push([route[i].point, route[i + 1].point, route[i + 2].point, route[i + 3].point]);
        i += 3;
    }
    out
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn locate(route: &[RoutedPoint], t: f64) -> Option<([Point; 4], f64)> {
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    let segments = segments(route);
    let count = segments.len();
    if count == 0 {
        return None;
    }
    let scaled = t * count as f64;
    let index = (scaled.floor() as usize).min(count - 1);
    Some((segments[index], scaled - index as f64))
}

#[derive(Debug, Clone)]
pub struct BezierRouter {
    anchors: Arc<AnchorRegistry>,
    options: RouterOptions,
}

impl BezierRouter {
    #[must_use]
    pub fn new(anchors: Arc<AnchorRegistry>) -> Self {
        Self { anchors, options: RouterOptions::bezier() }
    }

    #[must_use]
    pub fn with_options(mut self, options: RouterOptions) -> Self {
        self.options = options;
        self
    }

    /// One segment with both controls halfway between the shapes; self-loops
    /// arc over the top of the node.
    fn default_controls(&self, model: &Model, ends: &Endpoints<'_>) -> Vec<Point> {
        let sd = self.options.standard_distance;
        if ends.data.is_self_edge() {
            let anchors = DefaultAnchors::new(model, ends.source, ends.edge_parent);
            return vec![
                Point::new(anchors.right.x + sd, anchors.top.y - sd),
                Point::new(anchors.left.x - sd, anchors.top.y - sd),
            ];
        }
        let s = center_in(model, ends.source, ends.edge_parent);
        let t = center_in(model, ends.target, ends.edge_parent);
        let mid_x = (s.x + t.x) / 2.0;
        vec![Point::new(mid_x, s.y), Point::new(mid_x, t.y)]
    }

    fn route_through(&self, model: &Model, ends: &Endpoints<'_>, points: &[Point]) -> Vec<RoutedPoint> {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return Vec::new();
        };
        let edge_parent = ends.edge_parent;
        let source_anchor = translated_anchor(
            model,
            &self.anchors,
            KIND,
            ends.source,
            *first,
            edge_parent,
            edge_parent,
            ends.data.source_anchor_correction.unwrap_or(0.0),
        );
        let target_anchor = translated_anchor(
            model,
            &self.anchors,
            KIND,
            ends.target,
            *last,
            edge_parent,
            edge_parent,
            ends.data.target_anchor_correction.unwrap_or(0.0),
        );
        let mut route = Vec::with_capacity(points.len() + 2);
        route.push(RoutedPoint::new(RoutedPointKind::Source, source_anchor));
        route.extend(points.iter().enumerate().map(|(i, p)| RoutedPoint::indexed(routed_kind(i), *p, i)));
        route.push(RoutedPoint::new(RoutedPointKind::Target, target_anchor));
        route
    }

    /// Split the segment whose control-after point is `handle_id`'s index.
    pub fn add_segment(&self, model: &mut Model, edge_id: &str, handle_id: &str) -> Result<bool, SceneError> {
        let Some(index) = handle_index(model, handle_id, HandleKind::BezierAdd) else {
            return Ok(false);
        };
        let route = self.route(model, edge_id);
        let Some(mut points) = routing_points(model, edge_id).filter(|p| is_valid_layout(p)) else {
            return Ok(false);
        };
        if index + 3 >= route.len() || index + 1 >= points.len() {
            return Ok(false);
        }
        let segment = [route[index].point, route[index + 1].point, route[index + 2].point, route[index + 3].point];
        points.splice(index..index + 2, split_half(&segment)).for_each(drop);
        set_routing_points(model, edge_id, points);
        self.create_routing_handles(model, edge_id)?;
        Ok(true)
    }

    /// Remove the junction at `handle_id`'s index together with its controls.
    pub fn remove_segment(&self, model: &mut Model, edge_id: &str, handle_id: &str) -> Result<bool, SceneError> {
        let Some(index) = handle_index(model, handle_id, HandleKind::BezierRemove) else {
            return Ok(false);
        };
        let Some(mut points) = routing_points(model, edge_id).filter(|p| is_valid_layout(p)) else {
            return Ok(false);
        };
        if index == 0 || index + 1 >= points.len() || handle_kind(index) != HandleKind::BezierJunction {
            return Ok(false);
        }
        points.drain(index - 1..=index + 1);
        set_routing_points(model, edge_id, points);
        self.create_routing_handles(model, edge_id)?;
        Ok(true)
    }
}

fn handle_index(model: &Model, handle_id: &str, kind: HandleKind) -> Option<usize> {
    let handle = model.get(handle_id)?.handle.as_ref()?;
    if handle.kind != kind {
        return None;
    }
    usize::try_from(handle.point_index).map_or(None, Some)
}

/// Index of the junction and partner control mirrored around it, if any.
fn partner_of(kind: HandleKind, index: usize, len: usize) -> Option<(usize, usize)> {
    match kind {
        HandleKind::BezierControlBefore if index + 2 < len => Some((index + 1, index + 2)),
        HandleKind::BezierControlAfter if index >= 2 => Some((index - 1, index - 2)),
        _ => None,
    }
}

impl EdgeRouter for BezierRouter {
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
        let mut points = ends.data.routing_points.clone();
        self.cleanup_routing_points(model, edge_id, &mut points, false);
        self.route_through(model, &ends, &points)
    }

    fn point_at(&self, model: &Model, edge_id: &str, t: f64) -> Option<Point> {
        let (segment, u) = locate(&self.route(model, edge_id), t)?;
        Some(cubic(&segment, u))
    }

    fn derivative_at(&self, model: &Model, edge_id: &str, t: f64) -> Option<Point> {
        let (segment, u) = locate(&self.route(model, edge_id), t)?;
        Some(cubic_derivative(&segment, u))
    }

    fn create_routing_handles(&self, model: &mut Model, edge_id: &str) -> Result<(), SceneError> {
        let Some(mut points) = routing_points(model, edge_id) else {
            return Ok(());
        };
        self.cleanup_routing_points(model, edge_id, &mut points, false);
        set_routing_points(model, edge_id, points.clone());
        remove_handles(model, edge_id)?;
        if points.is_empty() {
            return Ok(());
        }
        add_handle(model, edge_id, HandleKind::Source, -2)?;
        for i in 0..points.len() {
            add_handle(model, edge_id, handle_kind(i), i32::try_from(i).unwrap_or(i32::MAX))?;
        }
        for i in (0..points.len()).step_by(3) {
            add_handle(model, edge_id, HandleKind::BezierAdd, i32::try_from(i).unwrap_or(i32::MAX))?;
        }
        for i in (2..points.len()).step_by(3) {
            add_handle(model, edge_id, HandleKind::BezierRemove, i32::try_from(i).unwrap_or(i32::MAX))?;
        }
        add_handle(model, edge_id, HandleKind::Target, i32::try_from(points.len()).unwrap_or(i32::MAX))?;
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
        let index = usize::try_from(point_index).map_or(None, Some)?;
        if kind == HandleKind::BezierAdd {
            let segment = [
                route.get(index)?.point,
                route.get(index + 1)?.point,
                route.get(index + 2)?.point,
                route.get(index + 3)?.point,
            ];
            return Some(cubic(&segment, 0.5));
        }
        routing_points(model, edge_id)?.get(index).copied()
    }

    fn apply_inner_handle_moves(
        &self,
        model: &mut Model,
        edge_id: &str,
        moves: &[ResolvedHandleMove],
    ) -> Result<(), SceneError> {
        let Some(mut points) = routing_points(model, edge_id).filter(|p| is_valid_layout(p)) else {
            return Ok(());
        };
        for mv in moves {
            let Some(handle) = model.get(&mv.handle_id).and_then(|e| e.handle.clone()) else {
                continue;
            };
            let index = usize::try_from(handle.point_index).map_or(None, Some);
            let Some(index) = index.filter(|i| *i < points.len()) else {
                continue;
            };
            match handle.kind {
                HandleKind::BezierControlBefore | HandleKind::BezierControlAfter => {
                    points[index] = mv.to;
                    if let Some((junction, partner)) = partner_of(handle.kind, index, points.len()) {
                        let center = points[junction];
                        let length = euclidean_distance(points[partner], center);
                        let direction = normalize(subtract(center, mv.to));
                        points[partner] = add(center, scale(direction, length));
                    }
                }
                HandleKind::BezierJunction if index >= 1 && index + 1 < points.len() => {
                    let delta = subtract(mv.to, points[index]);
                    points[index - 1] = add(points[index - 1], delta);
                    points[index + 1] = add(points[index + 1], delta);
                    points[index] = mv.to;
                }
                _ => {}
            }
        }
        set_routing_points(model, edge_id, points);
        Ok(())
    }

    /// Replaces a list that does not have the `2 + 3k` shape with the default
    /// single segment.
    fn cleanup_routing_points(
        &self,
        model: &Model,
        edge_id: &str,
        points: &mut Vec<Point>,
        _add_points: bool,
    ) -> Vec<HandleEdit> {
        if !is_valid_layout(points) {
            if let Some(ends) = endpoints(model, edge_id) {
                *points = self.default_controls(model, &ends);
            }
        }
        Vec::new()
    }

    fn activate_handle(&self, model: &mut Model, edge_id: &str, handle_id: &str) -> Result<bool, SceneError> {
        let kind = model.get(handle_id).and_then(|e| e.handle.as_ref()).map(|h| h.kind);
        match kind {
            Some(HandleKind::BezierAdd) => self.add_segment(model, edge_id, handle_id),
            Some(HandleKind::BezierRemove) => self.remove_segment(model, edge_id, handle_id),
            _ => Ok(false),
        }
    }
}
