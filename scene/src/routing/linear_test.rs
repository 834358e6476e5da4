use super::*;
use crate::factory::ModelFactory;
use crate::routing::{EdgeRouter, PolylineRouter};
use crate::schema::ElementSchema;
use std::sync::Arc;

fn route(points: &[(f64, f64)]) -> Vec<RoutedPoint> {
    let last = points.len() - 1;
    points
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| match i {
            0 => RoutedPoint::new(RoutedPointKind::Source, Point::new(x, y)),
            i if i == last => RoutedPoint::new(RoutedPointKind::Target, Point::new(x, y)),
            i => RoutedPoint::indexed(RoutedPointKind::Linear, Point::new(x, y), i - 1),
        })
        .collect()
}

fn graph(children: Vec<ElementSchema>) -> Model {
    let schema = ElementSchema::new("g", "graph").with_children(children);
    ModelFactory::new().create_root(&schema).expect("model")
}

fn two_nodes() -> Model {
    graph(vec![
        ElementSchema::shape("a", "node", Bounds::new(0.0, 0.0, 20.0, 20.0)),
        ElementSchema::shape("b", "node", Bounds::new(100.0, 0.0, 20.0, 20.0)),
        ElementSchema::shape("c", "node", Bounds::new(200.0, 0.0, 20.0, 20.0)),
        ElementSchema::edge("e", "a", "b"),
    ])
}

fn polyline() -> PolylineRouter {
    PolylineRouter::new(Arc::new(AnchorRegistry::with_defaults()))
}

// =============================================================
// Sampling
// =============================================================

#[test]
fn point_at_walks_arclength() {
    let route = route(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
    assert_eq!(point_at(&route, 0.25), Some(Point::new(5.0, 0.0)));
    assert_eq!(point_at(&route, 0.75), Some(Point::new(10.0, 5.0)));
    assert_eq!(point_at(&route, 1.0), Some(Point::new(10.0, 10.0)));
    assert_eq!(point_at(&route, 1.5), None);
}

#[test]
fn zero_length_segments_are_skipped() {
    let route = route(&[(0.0, 0.0), (0.0, 0.0), (10.0, 0.0)]);
    assert_eq!(point_at(&route, 0.0), Some(Point::new(0.0, 0.0)));
    assert_eq!(point_at(&route, 0.5), Some(Point::new(5.0, 0.0)));
    assert_eq!(derivative_at(&route, 0.5), Some(Point::new(10.0, 0.0)));
}

#[test]
fn too_short_routes_have_no_samples() {
    assert_eq!(point_at(&route(&[(3.0, 4.0)]), 0.5), None);
}

#[test]
fn route_segment_brackets_handle_index() {
    let route = route(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (30.0, 0.0)]);
    assert_eq!(find_route_segment(&route, 2, -1), Some((Point::new(0.0, 0.0), Point::new(10.0, 0.0))));
    assert_eq!(find_route_segment(&route, 2, 0), Some((Point::new(10.0, 0.0), Point::new(20.0, 0.0))));
    assert_eq!(find_route_segment(&route, 2, 1), Some((Point::new(20.0, 0.0), Point::new(30.0, 0.0))));
}

// =============================================================
// Self edges
// =============================================================

#[test]
fn self_edge_corners_rotate_through_quadrants() {
    let model = graph(vec![ElementSchema::shape("n", "node", Bounds::new(0.0, 0.0, 40.0, 20.0))]);
    let anchors = DefaultAnchors::new(&model, model.get("n").expect("node"), "g");
    let options = RouterOptions::polyline();
    let first = self_edge_corners(0, &anchors, &options);
    assert_eq!(first, vec![Point::new(60.0, 15.0), Point::new(60.0, 40.0), Point::new(25.0, 40.0)]);
    assert_eq!(self_edge_corners(4, &anchors, &options), first);
    assert_ne!(self_edge_corners(1, &anchors, &options), first);
}

#[test]
fn self_edge_index_orders_by_id() {
    let model = graph(vec![
        ElementSchema::shape("n", "node", Bounds::new(0.0, 0.0, 40.0, 20.0)),
        ElementSchema::shape("m", "node", Bounds::new(100.0, 0.0, 40.0, 20.0)),
        ElementSchema::edge("s2", "n", "n"),
        ElementSchema::edge("s1", "n", "n"),
        ElementSchema::edge("a0", "n", "m"),
    ]);
    assert_eq!(self_edge_index(&model, "s1"), 0);
    assert_eq!(self_edge_index(&model, "s2"), 1);
}

#[test]
fn nearest_side_prefers_left_on_ties() {
    let model = graph(vec![ElementSchema::shape("n", "node", Bounds::new(0.0, 0.0, 20.0, 20.0))]);
    let anchors = DefaultAnchors::new(&model, model.get("n").expect("node"), "g");
    assert_eq!(anchors.nearest_side(Point::new(10.0, 10.0)), Side::Left);
    assert_eq!(anchors.nearest_side(Point::new(10.0, 100.0)), Side::Bottom);
}

// =============================================================
// Handles and snapshots
// =============================================================

#[test]
fn colliding_handle_ids_get_a_suffix() {
    let mut model = two_nodes();
    let first = add_handle(&mut model, "e", HandleKind::Line, 0).expect("first");
    let second = add_handle(&mut model, "e", HandleKind::Line, 0).expect("second");
    assert_eq!(first, "e_line_0");
    assert_eq!(second, "e_line_0_1");
}

#[test]
fn handle_edits_skip_edges_without_handles() {
    let mut model = two_nodes();
    apply_handle_edits(&mut model, "e", &[HandleEdit::Add { kind: HandleKind::Junction, point_index: 0 }])
        .expect("edits");
    assert!(handles(&model, "e").is_empty());
}

#[test]
fn remove_handle_at_keeps_ends() {
    let mut model = two_nodes();
    set_routing_points(&mut model, "e", vec![Point::new(50.0, 50.0)]);
    polyline().create_routing_handles(&mut model, "e").expect("handles");
    remove_handle_at(&mut model, "e", -2).expect("remove");
    let kinds: Vec<HandleKind> = handles(&model, "e").iter().map(|(_, h)| h.kind).collect();
    assert!(kinds.contains(&HandleKind::Source));
    assert!(kinds.contains(&HandleKind::Target));
}

#[test]
fn snapshot_restores_edge_exactly() {
    let mut model = two_nodes();
    set_routing_points(&mut model, "e", vec![Point::new(50.0, 50.0)]);
    polyline().create_routing_handles(&mut model, "e").expect("handles");
    let before = model.clone();
    let snapshot = take_snapshot(&model, "e").expect("snapshot");

    apply_reconnect(&mut model, "e", Some("c"), None).expect("reconnect");
    set_routing_points(&mut model, "e", Vec::new());
    remove_handles(&mut model, "e").expect("remove");
    assert_ne!(model, before);

    apply_snapshot(&mut model, &snapshot).expect("restore");
    assert_eq!(model, before);
}

#[test]
fn reconnect_ignores_non_connectable_ids() {
    let mut model = two_nodes();
    apply_reconnect(&mut model, "e", Some("g"), Some("missing")).expect("reconnect");
    let data = model.get("e").and_then(|e| e.edge.clone()).expect("edge");
    assert_eq!((data.source_id(), data.target_id()), ("a", "b"));
}

#[test]
fn becoming_a_self_loop_clears_routing_points() {
    let mut model = two_nodes();
    set_routing_points(&mut model, "e", vec![Point::new(50.0, 50.0)]);
    apply_reconnect(&mut model, "e", None, Some("a")).expect("reconnect");
    assert_eq!(routing_points(&model, "e"), Some(Vec::new()));
}

// =============================================================
// Dangling anchors
// =============================================================

#[test]
fn released_drag_restores_original_endpoint() {
    let mut model = two_nodes();
    polyline().create_routing_handles(&mut model, "e").expect("handles");
    detach_endpoint(&mut model, "e", "e_source_-2", Point::new(50.0, 50.0)).expect("detach");

    let data = model.get("e").and_then(|e| e.edge.clone()).expect("edge");
    assert_eq!(data.source_id(), "e_dangling-source");
    assert_eq!(model.get("e_dangling-source").and_then(|e| e.position), Some(Point::new(50.0, 50.0)));

    detach_endpoint(&mut model, "e", "e_source_-2", Point::new(60.0, 55.0)).expect("drag");
    assert_eq!(model.get("e_dangling-source").and_then(|e| e.position), Some(Point::new(60.0, 55.0)));

    let outcome = commit_dangling_anchor(&mut model, "e_source_-2").expect("commit");
    assert_eq!(outcome, DanglingOutcome::Restored { edge_id: "e".into(), original: "a".into() });
    assert!(!model.contains("e_dangling-source"));
    let data = model.get("e").and_then(|e| e.edge.clone()).expect("edge");
    assert_eq!(data.source_id(), "a");
}

#[test]
fn release_over_other_node_reports_drop() {
    let mut model = two_nodes();
    polyline().create_routing_handles(&mut model, "e").expect("handles");
    detach_endpoint(&mut model, "e", "e_source_-2", Point::new(210.0, 10.0)).expect("detach");
    let outcome = commit_dangling_anchor(&mut model, "e_source_-2").expect("commit");
    assert_eq!(
        outcome,
        DanglingOutcome::Dropped { edge_id: "e".into(), original: "a".into(), dropped_on: "c".into(), is_source: true }
    );
}

#[test]
fn commit_without_drag_is_untouched() {
    let mut model = two_nodes();
    polyline().create_routing_handles(&mut model, "e").expect("handles");
    assert_eq!(commit_dangling_anchor(&mut model, "e_target_0").expect("commit"), DanglingOutcome::Untouched);
    assert_eq!(commit_dangling_anchor(&mut model, "missing").expect("commit"), DanglingOutcome::Untouched);
}
