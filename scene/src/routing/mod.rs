//! Edge routing: anchors, routers, routing handles and edge intersections.
//!
//! DESIGN
//! ======
//! A router turns an edge (two connectable endpoints plus its persisted
//! routing points) into a list of [`RoutedPoint`]s. The routed points are a
//! derived view and never stored; the edge's `routing_points` stay the only
//! source of truth. Routers never fail: an edge whose endpoints cannot be
//! resolved routes to an empty list, and the render pass draws a dangling
//! fallback for it.
//!
//! Editing goes through routing handles, transient child elements of the edge
//! that point into its routing points by index. Routers rewrite both the
//! routing points and the handle indices when a drag changes the topology.
//! Cleanup passes are computed against an immutable model and report the
//! handle bookkeeping they imply as a list of [`HandleEdit`]s, so the same code
//! serves rendering (edits discarded) and interactive moves (edits applied).
//!
//! | Module | Role |
//! |--------|------|
//! | [`anchors`] | Boundary points of rectangles, ellipses and diamonds |
//! | [`linear`] | Shared base: endpoints, default anchors, sampling, handle bookkeeping |
//! | [`polyline`] | Straight segments through the routing points |
//! | [`manhattan`] | Axis-aligned segments with automatic corners |
//! | [`bezier`] | Cubic segments stored as control/junction triples |
//! | [`intersection`] | Sweep-line detection of crossings between routed edges |

pub mod anchors;
pub mod bezier;
pub mod intersection;
pub mod linear;
pub mod manhattan;
pub mod polyline;

#[cfg(test)]
#[path = "routing_test.rs"]
mod routing_test;

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::SceneError;
use crate::consts::DEFAULT_ROUTER_KIND;
use crate::geometry::Point;
use crate::model::{HandleKind, Model, Subtree};

pub use anchors::{AnchorComputer, AnchorRegistry};
pub use bezier::BezierRouter;
pub use intersection::{Intersection, IntersectionFinder};
pub use linear::{DefaultAnchors, DanglingOutcome, commit_dangling_anchor, detach_endpoint};
pub use manhattan::ManhattanRouter;
pub use polyline::PolylineRouter;

// =============================================================================
// ROUTED POINTS
// =============================================================================

/// What a routed point represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutedPointKind {
    Source,
    Target,
    Linear,
    BezierControlBefore,
    BezierJunction,
    BezierControlAfter,
}

/// A computed point along an edge's path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedPoint {
    pub kind: RoutedPointKind,
    #[serde(flatten)]
    pub point: Point,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_index: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub intersections: Vec<Intersection>,
}

impl RoutedPoint {
    #[must_use]
    pub fn new(kind: RoutedPointKind, point: Point) -> Self {
        Self { kind, point, point_index: None, intersections: Vec::new() }
    }

    #[must_use]
    pub fn indexed(kind: RoutedPointKind, point: Point, point_index: usize) -> Self {
        Self { kind, point, point_index: Some(point_index), intersections: Vec::new() }
    }
}

/// Tuning knobs shared by all routers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouterOptions {
    /// Routing points closer than this to an anchor are dropped.
    pub minimal_point_distance: f64,
    /// Clearance kept between a shape and the first corner.
    pub standard_distance: f64,
    /// Fraction of the smaller node side used to spread self-loops.
    pub self_edge_offset: f64,
    /// Junctions whose angle is within this of π are pruned while edited.
    pub remove_angle_threshold: f64,
}

impl RouterOptions {
    #[must_use]
    pub fn polyline() -> Self {
        Self {
            minimal_point_distance: 2.0,
            standard_distance: 20.0,
            self_edge_offset: 0.25,
            remove_angle_threshold: 0.1,
        }
    }

    #[must_use]
    pub fn manhattan() -> Self {
        Self { minimal_point_distance: 3.0, ..Self::polyline() }
    }

    #[must_use]
    pub fn bezier() -> Self {
        Self::polyline()
    }
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self::polyline()
    }
}

/// A handle drag resolved to concrete positions in the edge's coordinate system.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedHandleMove {
    pub handle_id: String,
    pub from: Point,
    pub to: Point,
}

/// Everything needed to restore an edge's routing state exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSnapshot {
    pub edge_id: String,
    pub routing_points: Vec<Point>,
    pub handles: Vec<Subtree>,
    pub router_kind: Option<String>,
    pub source_id: String,
    pub target_id: String,
}

/// Handle bookkeeping implied by a routing-point cleanup.
#[derive(Debug, Clone, PartialEq)]
pub enum HandleEdit {
    /// Drop handles at `point_index` and shift higher indices down by one.
    Remove { point_index: i32 },
    /// Shift every handle at or above `from_index` by `delta`.
    Shift { from_index: i32, delta: i32 },
    /// Add a new handle.
    Add { kind: HandleKind, point_index: i32 },
    /// Routing points were reset to `point_count` defaults.
    Reset { point_count: usize, line_kind: HandleKind },
}

// =============================================================================
// ROUTER TRAIT
// =============================================================================

/// A routing strategy.
pub trait EdgeRouter: Send + Sync {
    /// Router kind as referenced by an edge's `routerKind`.
    fn kind(&self) -> &'static str;

    fn options(&self) -> RouterOptions;

    /// Source anchor, intermediate points, target anchor. Empty when unroutable.
    fn route(&self, model: &Model, edge_id: &str) -> Vec<RoutedPoint>;

    /// Point at arclength fraction `t ∈ [0, 1]`.
    fn point_at(&self, model: &Model, edge_id: &str, t: f64) -> Option<Point> {
        linear::point_at(&self.route(model, edge_id), t)
    }

    /// Direction of the path at arclength fraction `t ∈ [0, 1]`.
    fn derivative_at(&self, model: &Model, edge_id: &str, t: f64) -> Option<Point> {
        linear::derivative_at(&self.route(model, edge_id), t)
    }

    /// Replace the edge's routing handles with a fresh set.
    fn create_routing_handles(&self, model: &mut Model, edge_id: &str) -> Result<(), SceneError>;

    /// Position of a handle in the edge's coordinate system.
    fn handle_position(&self, model: &Model, edge_id: &str, route: &[RoutedPoint], handle_id: &str) -> Option<Point> {
        linear::handle_position(model, edge_id, route, handle_id, |kind, index| {
            self.inner_handle_position(route, model, edge_id, kind, index)
        })
    }

    /// Router-specific position of handles other than source/target.
    fn inner_handle_position(
        &self,
        route: &[RoutedPoint],
        model: &Model,
        edge_id: &str,
        kind: HandleKind,
        point_index: i32,
    ) -> Option<Point>;

    /// Apply moves of handles that edit routing points.
    fn apply_inner_handle_moves(
        &self,
        model: &mut Model,
        edge_id: &str,
        moves: &[ResolvedHandleMove],
    ) -> Result<(), SceneError>;

    /// Normalize `points` for the edge; returns the implied handle edits.
    fn cleanup_routing_points(
        &self,
        model: &Model,
        edge_id: &str,
        points: &mut Vec<Point>,
        add_points: bool,
    ) -> Vec<HandleEdit>;

    /// Inner moves, cleanup with handle bookkeeping, then endpoint drags.
    fn apply_handle_moves(
        &self,
        model: &mut Model,
        edge_id: &str,
        moves: &[ResolvedHandleMove],
    ) -> Result<(), SceneError> {
        self.apply_inner_handle_moves(model, edge_id, moves)?;
        self.commit_cleanup(model, edge_id, true)?;
        linear::apply_dangling_moves(model, edge_id, moves)
    }

    /// Run cleanup on the stored routing points and write the result back.
    fn commit_cleanup(&self, model: &mut Model, edge_id: &str, add_points: bool) -> Result<(), SceneError> {
        let Some(mut points) = linear::routing_points(model, edge_id) else {
            return Ok(());
        };
        let edits = self.cleanup_routing_points(model, edge_id, &mut points, add_points);
        linear::set_routing_points(model, edge_id, points);
        linear::apply_handle_edits(model, edge_id, &edits)
    }

    /// Point the edge at new endpoints. Ids that do not resolve to a
    /// connectable are ignored.
    fn apply_reconnect(
        &self,
        model: &mut Model,
        edge_id: &str,
        new_source: Option<&str>,
        new_target: Option<&str>,
    ) -> Result<(), SceneError> {
        linear::apply_reconnect(model, edge_id, new_source, new_target)?;
        self.commit_cleanup(model, edge_id, false)
    }

    /// Handle-specific reaction to a handle entering edit mode, such as
    /// adding or removing a bezier segment. Returns whether the routing
    /// topology changed.
    fn activate_handle(&self, _model: &mut Model, _edge_id: &str, _handle_id: &str) -> Result<bool, SceneError> {
        Ok(false)
    }

    fn take_snapshot(&self, model: &Model, edge_id: &str) -> Option<EdgeSnapshot> {
        linear::take_snapshot(model, edge_id)
    }

    fn apply_snapshot(&self, model: &mut Model, snapshot: &EdgeSnapshot) -> Result<(), SceneError> {
        linear::apply_snapshot(model, snapshot)
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Routers by kind, with `polyline` as the fallback.
#[derive(Clone)]
pub struct EdgeRouterRegistry {
    routers: HashMap<String, Arc<dyn EdgeRouter>>,
    fallback: Arc<dyn EdgeRouter>,
}

impl EdgeRouterRegistry {
    /// The three built-in routers sharing the default anchor registry.
    #[must_use]
    pub fn with_defaults() -> Self {
        let anchors = Arc::new(AnchorRegistry::with_defaults());
        let polyline: Arc<dyn EdgeRouter> = Arc::new(PolylineRouter::new(Arc::clone(&anchors)));
        let mut registry = Self { routers: HashMap::new(), fallback: Arc::clone(&polyline) };
        registry.register(polyline);
        registry.register(Arc::new(ManhattanRouter::new(Arc::clone(&anchors))));
        registry.register(Arc::new(BezierRouter::new(anchors)));
        registry
    }

    pub fn register(&mut self, router: Arc<dyn EdgeRouter>) {
        if router.kind() == DEFAULT_ROUTER_KIND {
            self.fallback = Arc::clone(&router);
        }
        self.routers.insert(router.kind().to_string(), router);
    }

    /// Router for `kind`, or the polyline router when unknown or absent.
    #[must_use]
    pub fn get(&self, kind: Option<&str>) -> Arc<dyn EdgeRouter> {
        kind.and_then(|k| self.routers.get(k)).map_or_else(|| Arc::clone(&self.fallback), Arc::clone)
    }

    /// Router assigned to the edge `edge_id`.
    #[must_use]
    pub fn for_edge(&self, model: &Model, edge_id: &str) -> Arc<dyn EdgeRouter> {
        let kind = model.get(edge_id).and_then(|e| e.edge.as_ref()).and_then(|e| e.router_kind.as_deref());
        self.get(kind)
    }

    /// Route every edge below `parent_id` and attach their mutual intersections.
    #[must_use]
    pub fn route_all_children(&self, model: &Model, parent_id: &str) -> EdgeRouting {
        let mut routing = EdgeRouting::default();
        for id in model.descendants(parent_id) {
            let is_edge = model.get(&id).is_some_and(|e| e.edge.is_some());
            if is_edge {
                let route = self.for_edge(model, &id).route(model, &id);
                routing.routes.insert(id, route);
            }
        }
        IntersectionFinder.apply(&mut routing);
        routing
    }
}

impl Default for EdgeRouterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for EdgeRouterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&String> = self.routers.keys().collect();
        kinds.sort();
        f.debug_struct("EdgeRouterRegistry").field("routers", &kinds).finish()
    }
}

/// Routes of a set of edges, keyed by edge id in routing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeRouting {
    pub routes: IndexMap<String, Vec<RoutedPoint>>,
}

impl EdgeRouting {
    #[must_use]
    pub fn get(&self, edge_id: &str) -> Option<&[RoutedPoint]> {
        self.routes.get(edge_id).map(Vec::as_slice)
    }
}
