//! Polyline router: straight segments through the routing points.

#[cfg(test)]
#[path = "polyline_test.rs"]
mod polyline_test;

use std::sync::Arc;

use crate::SceneError;
use crate::geometry::{Point, angle_between, linear, max_distance, subtract};
use crate::model::{Element, HandleKind, Model};
use crate::routing::anchors::AnchorRegistry;
use crate::routing::linear::{
    DefaultAnchors, Endpoints, add_handle, center_in, endpoints, find_route_segment, handles, remove_handles,
    reset_on_reconnect, retype_handle, routing_points, self_edge_corners, self_edge_index, set_point_index,
    set_routing_points, translated_anchor,
};
use crate::routing::{EdgeRouter, HandleEdit, ResolvedHandleMove, RoutedPoint, RoutedPointKind, RouterOptions};

pub const KIND: &str = "polyline";

#[derive(Debug, Clone)]
pub struct PolylineRouter {
    anchors: Arc<AnchorRegistry>,
    options: RouterOptions,
}

impl PolylineRouter {
    #[must_use]
    pub fn new(anchors: Arc<AnchorRegistry>) -> Self {
        Self { anchors, options: RouterOptions::polyline() }
    }

    #[must_use]
    pub fn with_options(mut self, options: RouterOptions) -> Self {
        self.options = options;
        self
    }

    fn default_corners(&self, model: &Model, ends: &Endpoints<'_>) -> Vec<Point> {
        if !ends.data.is_self_edge() {
            return Vec::new();
        }
        let anchors = DefaultAnchors::new(model, ends.source, ends.edge_parent);
        self_edge_corners(self_edge_index(model, &ends.edge.id), &anchors, &self.options)
    }

    fn route_through(&self, model: &Model, ends: &Endpoints<'_>, points: &[Point]) -> Vec<RoutedPoint> {
        let edge_parent = ends.edge_parent;
        let source_correction = ends.data.source_anchor_correction.unwrap_or(0.0);
        let target_correction = ends.data.target_anchor_correction.unwrap_or(0.0);
        let anchor = |connectable: &Element, ref_point: Point, container: &str, offset: f64| {
            translated_anchor(model, &self.anchors, KIND, connectable, ref_point, container, edge_parent, offset)
        };

        let (source_anchor, target_anchor) = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (
                anchor(ends.source, *first, edge_parent, source_correction),
                anchor(ends.target, *last, edge_parent, target_correction),
            ),
            _ => {
                let target_center = center_in(model, ends.target, edge_parent);
                let source_anchor = anchor(ends.source, target_center, edge_parent, source_correction);
                (source_anchor, anchor(ends.target, source_anchor, edge_parent, target_correction))
            }
        };

        let min = self.options.minimal_point_distance;
        let last = points.len().saturating_sub(1);
        let mut route = vec![RoutedPoint::new(RoutedPointKind::Source, source_anchor)];
        for (i, p) in points.iter().enumerate() {
            let keep = (i > 0 && i < last)
                || (i == 0 && max_distance(source_anchor, *p) >= min + source_correction)
                || (i == last && max_distance(*p, target_anchor) >= min + target_correction);
            if keep {
                route.push(RoutedPoint::indexed(RoutedPointKind::Linear, *p, i));
            }
        }
        route.push(RoutedPoint::new(RoutedPointKind::Target, target_anchor));
        route
    }

    /// Drop junctions being dragged into a straight line with their neighbours.
    fn filter_edit_mode_handles(&self, model: &Model, edge_id: &str, mut route: Vec<RoutedPoint>) -> Vec<RoutedPoint> {
        let handles = handles(model, edge_id);
        if handles.is_empty() {
            return route;
        }
        let mut i = 1;
        while i + 1 < route.len() {
            let editing = route[i].point_index.is_some_and(|index| {
                handles.iter().any(|(_, h)| {
                    h.kind == HandleKind::Junction && h.edit_mode && usize::try_from(h.point_index) == Ok(index)
                })
            });
            if editing {
                let curr = route[i].point;
                let angle = angle_between(subtract(route[i - 1].point, curr), subtract(route[i + 1].point, curr));
                if (std::f64::consts::PI - angle).abs() < self.options.remove_angle_threshold {
                    route.remove(i);
                    continue;
                }
            }
            i += 1;
        }
        route
    }
}

impl EdgeRouter for PolylineRouter {
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
        let route = self.route_through(model, &ends, &points);
        self.filter_edit_mode_handles(model, edge_id, route)
    }

    fn create_routing_handles(&self, model: &mut Model, edge_id: &str) -> Result<(), SceneError> {
        let count = routing_points(model, edge_id).map_or(0, |points| points.len());
        let count = i32::try_from(count).unwrap_or(i32::MAX);
        remove_handles(model, edge_id)?;
        add_handle(model, edge_id, HandleKind::Source, -2)?;
        add_handle(model, edge_id, HandleKind::Line, -1)?;
        for i in 0..count {
            add_handle(model, edge_id, HandleKind::Junction, i)?;
            add_handle(model, edge_id, HandleKind::Line, i)?;
        }
        add_handle(model, edge_id, HandleKind::Target, count)?;
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
        if kind == HandleKind::Line {
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
        for mv in moves {
            let Some(handle) = model.get(&mv.handle_id).and_then(|e| e.handle.clone()) else {
                continue;
            };
            let Some(mut points) = routing_points(model, edge_id) else {
                continue;
            };
            let mut index = handle.point_index;
            if handle.kind == HandleKind::Line {
                let at = usize::try_from(index + 1).unwrap_or(0).min(points.len());
                points.insert(at, mv.from);
                for (id, h) in handles(model, edge_id) {
                    if id == mv.handle_id || h.point_index > index {
                        set_point_index(model, &id, h.point_index + 1);
                    }
                }
                retype_handle(model, &mv.handle_id, HandleKind::Junction);
                add_handle(model, edge_id, HandleKind::Line, index)?;
                add_handle(model, edge_id, HandleKind::Line, index + 1)?;
                index += 1;
            }
            if let Some(point) = usize::try_from(index).map_or(None, |i| points.get_mut(i)) {
                *point = mv.to;
            }
            set_routing_points(model, edge_id, points);
        }
        Ok(())
    }

    fn cleanup_routing_points(
        &self,
        model: &Model,
        edge_id: &str,
        points: &mut Vec<Point>,
        _add_points: bool,
    ) -> Vec<HandleEdit> {
        let Some(ends) = endpoints(model, edge_id) else {
            return Vec::new();
        };
        reset_on_reconnect(&ends, points, HandleKind::Line, || self.default_corners(model, &ends)).into_iter().collect()
    }
}
