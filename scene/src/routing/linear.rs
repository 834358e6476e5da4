//! Shared machinery of the piecewise routers.
//!
//! Endpoint resolution, default side anchors, self-loop corners, arclength
//! sampling, routing-handle bookkeeping, snapshots and dangling anchors live
//! here. The concrete routers compose these pieces; none of them keep state of
//! their own beyond options and the anchor registry.

#[cfg(test)]
#[path = "linear_test.rs"]
mod linear_test;

use tracing::debug;

use crate::SceneError;
use crate::consts::MIN_SEGMENT_LENGTH;
use crate::factory::{dangling_anchor, routing_handle};
use crate::geometry::{Bounds, Dimension, Point, Side, euclidean_distance, linear, subtract};
use crate::hit::connectable_at;
use crate::model::{BasicType, EdgeData, Element, ElementType, Feature, HandleData, HandleKind, Model, Subtree};
use crate::routing::anchors::{AnchorRegistry, anchor_kind_of};
use crate::routing::{EdgeSnapshot, HandleEdit, ResolvedHandleMove, RoutedPoint, RoutedPointKind, RouterOptions};

// =============================================================================
// ENDPOINTS
// =============================================================================

/// An edge together with its resolved endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Endpoints<'a> {
    pub edge: &'a Element,
    pub data: &'a EdgeData,
    pub source: &'a Element,
    pub target: &'a Element,
    /// The coordinate system routed points are expressed in.
    pub edge_parent: &'a str,
}

/// Resolve both endpoints of `edge_id`. `None` when the edge or either
/// endpoint is missing or not connectable.
#[must_use]
pub fn endpoints<'a>(model: &'a Model, edge_id: &str) -> Option<Endpoints<'a>> {
    let edge = model.get(edge_id)?;
    let data = edge.edge.as_ref()?;
    let source = model.get(data.source_id()).filter(|e| e.has(Feature::Connectable))?;
    let target = model.get(data.target_id()).filter(|e| e.has(Feature::Connectable))?;
    let edge_parent = edge.parent().unwrap_or(model.root_id());
    Some(Endpoints { edge, data, source, target, edge_parent })
}

#[must_use]
pub fn is_dangling(element: &Element) -> bool {
    element.basic() == BasicType::DanglingAnchor
}

/// Bounds of `element` in the coordinate system of `container`. Unmeasured
/// elements count as zero-sized at their position.
#[must_use]
pub fn bounds_in(model: &Model, element: &Element, container: &str) -> Bounds {
    let mut bounds = element.bounds();
    if !bounds.is_valid() {
        bounds = Bounds::from_parts(bounds.position(), Dimension::new(0.0, 0.0));
    }
    let parent = element.parent().unwrap_or(model.root_id());
    model.translate_bounds(bounds, parent, container)
}

/// Center of `element` expressed in the coordinate system of `container`.
#[must_use]
pub fn center_in(model: &Model, element: &Element, container: &str) -> Point {
    bounds_in(model, element, container).center()
}

/// Anchor of `connectable` towards `ref_point`, where `ref_point` is given in
/// the coordinate system of `ref_container`. The result is in the coordinate
/// system of `edge_parent`.
#[allow(clippy::too_many_arguments)]
#[must_use]
pub fn translated_anchor(
    model: &Model,
    anchors: &AnchorRegistry,
    router_kind: &str,
    connectable: &Element,
    ref_point: Point,
    ref_container: &str,
    edge_parent: &str,
    offset: f64,
) -> Point {
    let parent = connectable.parent().unwrap_or(model.root_id());
    let local_ref = model.translate_point(ref_point, ref_container, parent);
    let computer = anchors.get(router_kind, anchor_kind_of(connectable));
    let anchor = computer.anchor(&connectable.bounds(), local_ref, offset);
    model.translate_point(anchor, parent, edge_parent)
}

// =============================================================================
// DEFAULT ANCHORS
// =============================================================================

/// Midpoints of the four sides of a connectable, in edge coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultAnchors {
    pub bounds: Bounds,
    pub left: Point,
    pub right: Point,
    pub top: Point,
    pub bottom: Point,
}

impl DefaultAnchors {
    #[must_use]
    pub fn new(model: &Model, element: &Element, edge_parent: &str) -> Self {
        let bounds = bounds_in(model, element, edge_parent);
        let c = bounds.center();
        Self {
            bounds,
            left: Point::new(bounds.x, c.y),
            right: Point::new(bounds.x + bounds.width, c.y),
            top: Point::new(c.x, bounds.y),
            bottom: Point::new(c.x, bounds.y + bounds.height),
        }
    }

    #[must_use]
    pub fn get(&self, side: Side) -> Point {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
            Side::Top => self.top,
            Side::Bottom => self.bottom,
        }
    }

    /// Side whose midpoint is closest to `p`; ties go to the earlier of
    /// left, right, top, bottom.
    #[must_use]
    pub fn nearest_side(&self, p: Point) -> Side {
        let mut best = Side::Left;
        let mut best_distance = euclidean_distance(self.left, p);
        for side in [Side::Right, Side::Top, Side::Bottom] {
            let distance = euclidean_distance(self.get(side), p);
            if distance < best_distance {
                best = side;
                best_distance = distance;
            }
        }
        best
    }
}

// =============================================================================
// SELF EDGES
// =============================================================================

/// Position of `edge_id` among the self-loops of its source, ordered by id.
#[must_use]
pub fn self_edge_index(model: &Model, edge_id: &str) -> usize {
    let Some(data) = model.get(edge_id).and_then(|e| e.edge.as_ref()) else {
        return 0;
    };
    model
        .outgoing_edges(data.source_id())
        .filter(|id| model.get(id).and_then(|e| e.edge.as_ref()).is_some_and(EdgeData::is_self_edge))
        .position(|id| id == edge_id)
        .unwrap_or(0)
}

/// Three corners looping around one corner of the node, rotating through the
/// four corners as `index` grows so parallel self-loops do not overlap.
#[must_use]
pub fn self_edge_corners(index: usize, anchors: &DefaultAnchors, options: &RouterOptions) -> Vec<Point> {
    let sd = options.standard_distance;
    let delta = options.self_edge_offset * anchors.bounds.width.min(anchors.bounds.height);
    let DefaultAnchors { left: l, right: r, top: t, bottom: b, .. } = *anchors;
    match index % 4 {
        0 => vec![Point::new(r.x + sd, r.y + delta), Point::new(r.x + sd, b.y + sd), Point::new(b.x + delta, b.y + sd)],
        1 => vec![Point::new(b.x - delta, b.y + sd), Point::new(l.x - sd, b.y + sd), Point::new(l.x - sd, l.y + delta)],
        2 => vec![Point::new(l.x - sd, l.y - delta), Point::new(l.x - sd, t.y - sd), Point::new(t.x - delta, t.y - sd)],
        _ => vec![Point::new(t.x + delta, t.y - sd), Point::new(r.x + sd, t.y - sd), Point::new(r.x + sd, r.y - delta)],
    }
}

/// Replace `points` with default corners when the edge has none yet or one of
/// its ends is dangling.
pub fn reset_on_reconnect<F>(
    ends: &Endpoints<'_>,
    points: &mut Vec<Point>,
    line_kind: HandleKind,
    corners: F,
) -> Option<HandleEdit>
where
    F: FnOnce() -> Vec<Point>,
{
    if !points.is_empty() && !is_dangling(ends.source) && !is_dangling(ends.target) {
        return None;
    }
    *points = corners();
    Some(HandleEdit::Reset { point_count: points.len(), line_kind })
}

// =============================================================================
// SAMPLING
// =============================================================================

/// Segment containing arclength fraction `t`, with the local interpolation factor.
#[must_use]
pub fn segment_at(route: &[RoutedPoint], t: f64) -> Option<(Point, Point, f64)> {
    if !(0.0..=1.0).contains(&t) || route.len() < 2 {
        return None;
    }
    let lengths: Vec<f64> = route.windows(2).map(|w| euclidean_distance(w[0].point, w[1].point)).collect();
    let total: f64 = lengths.iter().sum();
    let target = t * total;
    let mut current = 0.0;
    for (i, length) in lengths.iter().enumerate() {
        let next = current + length;
        if *length > MIN_SEGMENT_LENGTH && next >= target {
            let lambda = (target - current).max(0.0) / length;
            return Some((route[i].point, route[i + 1].point, lambda));
        }
        current = next;
    }
    let n = route.len();
    Some((route[n - 2].point, route[n - 1].point, 1.0))
}

#[must_use]
pub fn point_at(route: &[RoutedPoint], t: f64) -> Option<Point> {
    segment_at(route, t).map(|(start, end, lambda)| linear(start, end, lambda))
}

#[must_use]
pub fn derivative_at(route: &[RoutedPoint], t: f64) -> Option<Point> {
    segment_at(route, t).map(|(start, end, _)| subtract(end, start))
}

/// The routed points bracketing `handle_index`: the closest point at or below
/// it and the closest point above it.
#[must_use]
pub fn find_route_segment(route: &[RoutedPoint], point_count: usize, handle_index: i32) -> Option<(Point, Point)> {
    let count = i32::try_from(point_count).unwrap_or(i32::MAX);
    let index_of = |rp: &RoutedPoint| match rp.point_index {
        Some(i) => i32::try_from(i).unwrap_or(i32::MAX),
        None if rp.kind == RoutedPointKind::Target => count,
        None => -2,
    };
    let mut start: Option<(i32, Point)> = None;
    let mut end: Option<(i32, Point)> = None;
    for rp in route {
        let i = index_of(rp);
        if i <= handle_index && start.is_none_or(|(s, _)| i > s) {
            start = Some((i, rp.point));
        }
        if i > handle_index && end.is_none_or(|(e, _)| i < e) {
            end = Some((i, rp.point));
        }
    }
    Some((start?.1, end?.1))
}

// =============================================================================
// ROUTING POINTS AND HANDLES
// =============================================================================

#[must_use]
pub fn routing_points(model: &Model, edge_id: &str) -> Option<Vec<Point>> {
    model.get(edge_id).and_then(|e| e.edge.as_ref()).map(|e| e.routing_points.clone())
}

pub fn set_routing_points(model: &mut Model, edge_id: &str, points: Vec<Point>) {
    if let Some(edge) = model.get_mut(edge_id).and_then(|e| e.edge.as_mut()) {
        edge.routing_points = points;
    }
}

/// Routing handles of `edge_id` with their state, in child order.
#[must_use]
pub fn handles(model: &Model, edge_id: &str) -> Vec<(String, HandleData)> {
    model
        .children(edge_id)
        .iter()
        .filter_map(|id| model.get(id).and_then(|e| e.handle.clone()).map(|h| (id.clone(), h)))
        .collect()
}

pub fn remove_handles(model: &mut Model, edge_id: &str) -> Result<(), SceneError> {
    for (id, _) in handles(model, edge_id) {
        model.remove(&id)?;
    }
    Ok(())
}

/// Append a new handle to `edge_id`, picking a free id.
pub fn add_handle(model: &mut Model, edge_id: &str, kind: HandleKind, point_index: i32) -> Result<String, SceneError> {
    let mut element = routing_handle(edge_id, kind, point_index);
    let base = element.id.clone();
    let mut suffix = 1;
    while model.contains(&element.id) {
        element.id = format!("{base}_{suffix}");
        suffix += 1;
    }
    let id = element.id.clone();
    model.insert(edge_id, None, Subtree::leaf(element))?;
    Ok(id)
}

/// Change a handle's kind in place, keeping its id.
pub fn retype_handle(model: &mut Model, handle_id: &str, kind: HandleKind) {
    if let Some(element) = model.get_mut(handle_id) {
        let type_name = if kind.is_volatile() { "volatile-routing-point" } else { "routing-point" };
        element.kind = ElementType::new(type_name, BasicType::RoutingHandle);
        if let Some(handle) = element.handle.as_mut() {
            handle.kind = kind;
        }
    }
}

pub fn set_point_index(model: &mut Model, handle_id: &str, point_index: i32) {
    if let Some(handle) = model.get_mut(handle_id).and_then(|e| e.handle.as_mut()) {
        handle.point_index = point_index;
    }
}

/// Drop handles at `point_index` and shift the ones above it down. Source and
/// target handles are never dropped.
pub fn remove_handle_at(model: &mut Model, edge_id: &str, point_index: i32) -> Result<(), SceneError> {
    for (id, handle) in handles(model, edge_id) {
        let is_end = matches!(handle.kind, HandleKind::Source | HandleKind::Target);
        if handle.point_index == point_index && !is_end {
            model.remove(&id)?;
        } else if handle.point_index > point_index {
            set_point_index(model, &id, handle.point_index - 1);
        }
    }
    Ok(())
}

/// Apply cleanup bookkeeping. Edges without handles are left alone.
pub fn apply_handle_edits(model: &mut Model, edge_id: &str, edits: &[HandleEdit]) -> Result<(), SceneError> {
    if edits.is_empty() || handles(model, edge_id).is_empty() {
        return Ok(());
    }
    for edit in edits {
        match *edit {
            HandleEdit::Remove { point_index } => remove_handle_at(model, edge_id, point_index)?,
            HandleEdit::Shift { from_index, delta } => {
                for (id, handle) in handles(model, edge_id) {
                    if handle.point_index >= from_index {
                        set_point_index(model, &id, handle.point_index + delta);
                    }
                }
            }
            HandleEdit::Add { kind, point_index } => {
                add_handle(model, edge_id, kind, point_index)?;
            }
            HandleEdit::Reset { point_count, line_kind } => {
                let count = i32::try_from(point_count).unwrap_or(i32::MAX);
                let mut max_index = -2;
                for (id, handle) in handles(model, edge_id) {
                    if handle.kind == HandleKind::Target {
                        set_point_index(model, &id, count);
                    } else if handle.kind == line_kind && handle.point_index >= count {
                        model.remove(&id)?;
                    } else {
                        max_index = max_index.max(handle.point_index);
                    }
                }
                for i in max_index..count - 1 {
                    add_handle(model, edge_id, line_kind, i)?;
                }
            }
        }
    }
    Ok(())
}

/// Position of a handle: source/target sit on the route ends (or on their
/// dangling anchor while dragged), the rest is router specific.
pub fn handle_position<F>(
    model: &Model,
    edge_id: &str,
    route: &[RoutedPoint],
    handle_id: &str,
    inner: F,
) -> Option<Point>
where
    F: FnOnce(HandleKind, i32) -> Option<Point>,
{
    let handle = model.get(handle_id)?.handle.as_ref()?;
    match handle.kind {
        HandleKind::Source | HandleKind::Target => {
            let ends = endpoints(model, edge_id)?;
            let end = if handle.kind == HandleKind::Source { ends.source } else { ends.target };
            if is_dangling(end) {
                let parent = end.parent().unwrap_or(model.root_id());
                return Some(model.translate_point(end.position.unwrap_or_default(), parent, ends.edge_parent));
            }
            let rp = if handle.kind == HandleKind::Source { route.first() } else { route.last() };
            rp.map(|rp| rp.point)
        }
        kind => inner(kind, handle.point_index),
    }
}

// =============================================================================
// RECONNECT AND SNAPSHOTS
// =============================================================================

/// Point the edge at new endpoints; ids that are not connectable keep the
/// current endpoint. Toggling self-loop status clears the routing points.
pub fn apply_reconnect(
    model: &mut Model,
    edge_id: &str,
    new_source: Option<&str>,
    new_target: Option<&str>,
) -> Result<(), SceneError> {
    let data = model
        .get(edge_id)
        .and_then(|e| e.edge.clone())
        .ok_or_else(|| SceneError::UnknownElement(edge_id.to_string()))?;
    let connectable = |id: &&str| model.get(id).is_some_and(|e| e.has(Feature::Connectable));
    let source = new_source.filter(connectable).unwrap_or(data.source_id()).to_string();
    let target = new_target.filter(connectable).unwrap_or(data.target_id()).to_string();
    let was_self = data.is_self_edge();
    model.reconnect(edge_id, &source, &target)?;
    if was_self != (source == target) {
        set_routing_points(model, edge_id, Vec::new());
    }
    Ok(())
}

#[must_use]
pub fn take_snapshot(model: &Model, edge_id: &str) -> Option<EdgeSnapshot> {
    let edge = model.get(edge_id)?;
    let data = edge.edge.as_ref()?;
    let handles = handles(model, edge_id).iter().filter_map(|(id, _)| model.subtree(id)).collect();
    Some(EdgeSnapshot {
        edge_id: edge_id.to_string(),
        routing_points: data.routing_points.clone(),
        handles,
        router_kind: data.router_kind.clone(),
        source_id: data.source_id().to_string(),
        target_id: data.target_id().to_string(),
    })
}

pub fn apply_snapshot(model: &mut Model, snapshot: &EdgeSnapshot) -> Result<(), SceneError> {
    let edge_id = snapshot.edge_id.as_str();
    remove_handles(model, edge_id)?;
    for handle in &snapshot.handles {
        model.insert(edge_id, None, handle.clone())?;
    }
    model.reconnect(edge_id, &snapshot.source_id, &snapshot.target_id)?;
    if let Some(edge) = model.get_mut(edge_id).and_then(|e| e.edge.as_mut()) {
        edge.routing_points.clone_from(&snapshot.routing_points);
        edge.router_kind.clone_from(&snapshot.router_kind);
    }
    Ok(())
}

// =============================================================================
// DANGLING ANCHORS
// =============================================================================

/// Source and target handle moves detach the edge end onto a dangling anchor.
pub fn apply_dangling_moves(model: &mut Model, edge_id: &str, moves: &[ResolvedHandleMove]) -> Result<(), SceneError> {
    for mv in moves {
        let is_end = model
            .get(&mv.handle_id)
            .and_then(|e| e.handle.as_ref())
            .is_some_and(|h| matches!(h.kind, HandleKind::Source | HandleKind::Target));
        if is_end {
            detach_endpoint(model, edge_id, &mv.handle_id, mv.to)?;
        }
    }
    Ok(())
}

/// Attach one end of `edge_id` to a dangling anchor at `position` (edge
/// coordinates), creating the anchor on first use and moving it afterwards.
pub fn detach_endpoint(model: &mut Model, edge_id: &str, handle_id: &str, position: Point) -> Result<(), SceneError> {
    let handle = model
        .get(handle_id)
        .and_then(|e| e.handle.clone())
        .ok_or_else(|| SceneError::UnknownElement(handle_id.to_string()))?;
    let is_source = match handle.kind {
        HandleKind::Source => true,
        HandleKind::Target => false,
        _ => return Ok(()),
    };
    let edge = model.get(edge_id).ok_or_else(|| SceneError::UnknownElement(edge_id.to_string()))?;
    let data = edge.edge.clone().ok_or_else(|| SceneError::UnknownElement(edge_id.to_string()))?;
    let edge_parent = edge.parent().unwrap_or(model.root_id()).to_string();
    let root = model.root_id().to_string();
    let root_position = model.translate_point(position, &edge_parent, &root);

    let anchor_id = match handle.dangling_anchor.filter(|id| model.contains(id)) {
        Some(id) => id,
        None => {
            let id = format!("{edge_id}_dangling-{}", handle.kind.as_str());
            if !model.contains(&id) {
                model.insert(&root, None, Subtree::leaf(dangling_anchor(&id, root_position)))?;
            }
            let original = if is_source { data.source_id() } else { data.target_id() };
            if let Some(h) = model.get_mut(handle_id).and_then(|e| e.handle.as_mut()) {
                h.dangling_anchor = Some(id.clone());
                if original != id {
                    h.original_endpoint = Some(original.to_string());
                }
            }
            if is_source {
                model.reconnect(edge_id, &id, data.target_id())?;
            } else {
                model.reconnect(edge_id, data.source_id(), &id)?;
            }
            debug!(edge_id, anchor_id = %id, original, "edge end detached");
            id
        }
    };
    if let Some(anchor) = model.get_mut(&anchor_id) {
        anchor.position = Some(root_position);
    }
    Ok(())
}

/// What happened when a dragged end was released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DanglingOutcome {
    /// The handle was not dragging an end.
    Untouched,
    /// The end went back to its original connectable.
    Restored { edge_id: String, original: String },
    /// The end was released over another connectable; the edge is restored
    /// and should be reconnected to `dropped_on`.
    Dropped { edge_id: String, original: String, dropped_on: String, is_source: bool },
}

/// Leave edit mode on `handle_id`: restore the original endpoint and remove
/// the dangling anchor.
pub fn commit_dangling_anchor(model: &mut Model, handle_id: &str) -> Result<DanglingOutcome, SceneError> {
    let Some(handle) = model.get(handle_id).and_then(|e| e.handle.clone()) else {
        return Ok(DanglingOutcome::Untouched);
    };
    if let Some(h) = model.get_mut(handle_id).and_then(|e| e.handle.as_mut()) {
        h.edit_mode = false;
    }
    let (Some(anchor_id), Some(original)) = (handle.dangling_anchor, handle.original_endpoint) else {
        return Ok(DanglingOutcome::Untouched);
    };
    let Some(edge_id) = model.parent_id(handle_id).map(str::to_string) else {
        return Ok(DanglingOutcome::Untouched);
    };
    let Some(data) = model.get(&edge_id).and_then(|e| e.edge.clone()) else {
        return Ok(DanglingOutcome::Untouched);
    };

    let drop_point = model.absolute_bounds(&anchor_id).position();
    let dropped_on = connectable_at(model, drop_point, &[anchor_id.as_str(), edge_id.as_str()]);

    let is_source = data.source_id() == anchor_id;
    if is_source {
        model.reconnect(&edge_id, &original, data.target_id())?;
    } else if data.target_id() == anchor_id {
        model.reconnect(&edge_id, data.source_id(), &original)?;
    }
    if model.contains(&anchor_id) {
        model.remove(&anchor_id)?;
    }
    if let Some(h) = model.get_mut(handle_id).and_then(|e| e.handle.as_mut()) {
        h.dangling_anchor = None;
        h.original_endpoint = None;
    }

    Ok(match dropped_on {
        Some(target) if target != original => {
            debug!(
                edge_id = %edge_id,
                original = %original,
                dropped_on = %target,
                "edge end dropped on new connectable"
            );
            DanglingOutcome::Dropped { edge_id, original, dropped_on: target, is_source }
        }
        _ => DanglingOutcome::Restored { edge_id, original },
    })
}
