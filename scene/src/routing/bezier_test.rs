use super::*;
use crate::factory::ModelFactory;
use crate::geometry::{Bounds, points_almost_equal};
use crate::routing::linear::handles;
use crate::schema::ElementSchema;

fn router() -> BezierRouter {
    BezierRouter::new(Arc::new(AnchorRegistry::with_defaults()))
}

fn model(target: Bounds) -> Model {
    let schema = ElementSchema::new("g", "graph").with_children(vec![
        ElementSchema::shape("a", "node", Bounds::new(0.0, 0.0, 20.0, 20.0)),
        ElementSchema::shape("b", "node", target),
        ElementSchema::edge("e", "a", "b").with_router(KIND),
    ]);
    ModelFactory::new().create_root(&schema).expect("model")
}

/// Diagonal edge already split once into two segments.
fn split_model() -> Model {
    let mut model = model(Bounds::new(100.0, 100.0, 20.0, 20.0));
    let router = router();
    router.create_routing_handles(&mut model, "e").expect("handles");
    assert!(router.activate_handle(&mut model, "e", "e_bezier-add_0").expect("add"));
    model
}

fn points(model: &Model) -> Vec<Point> {
    routing_points(model, "e").expect("edge")
}

fn move_handle(model: &mut Model, handle_id: &str, to: Point) {
    let mv = ResolvedHandleMove { handle_id: handle_id.into(), from: to, to };
    router().apply_handle_moves(model, "e", &[mv]).expect("move");
}

// =============================================================
// Curve math
// =============================================================

#[test]
fn cubic_hits_end_points() {
    let p = [Point::new(0.0, 0.0), Point::new(0.0, 10.0), Point::new(10.0, 10.0), Point::new(10.0, 0.0)];
    assert_eq!(cubic(&p, 0.0), p[0]);
    assert_eq!(cubic(&p, 1.0), p[3]);
    assert!(points_almost_equal(cubic(&p, 0.5), Point::new(5.0, 7.5)));
}

#[test]
fn split_half_meets_the_curve_midpoint() {
    let p = [Point::new(0.0, 0.0), Point::new(0.0, 10.0), Point::new(10.0, 10.0), Point::new(10.0, 0.0)];
    let [_, _, m, _, _] = split_half(&p);
    assert!(points_almost_equal(m, cubic(&p, 0.5)));
}

// =============================================================
// Routing
// =============================================================

#[test]
fn default_route_is_one_segment() {
    let model = model(Bounds::new(100.0, 0.0, 20.0, 20.0));
    let route = router().route(&model, "e");
    let kinds: Vec<RoutedPointKind> = route.iter().map(|rp| rp.kind).collect();
    assert_eq!(
        kinds,
        vec![
            RoutedPointKind::Source,
            RoutedPointKind::BezierControlAfter,
            RoutedPointKind::BezierControlBefore,
            RoutedPointKind::Target,
        ]
    );
    assert_eq!(route[0].point, Point::new(20.0, 10.0));
    assert_eq!(route[1].point, Point::new(60.0, 10.0));
    assert_eq!(route[3].point, Point::new(100.0, 10.0));
}

#[test]
fn samples_follow_the_curve() {
    let model = model(Bounds::new(100.0, 0.0, 20.0, 20.0));
    let router = router();
    assert_eq!(router.point_at(&model, "e", 0.0), Some(Point::new(20.0, 10.0)));
    assert_eq!(router.point_at(&model, "e", 1.0), Some(Point::new(100.0, 10.0)));
    assert!(router.point_at(&model, "e", 1.5).is_none());
    let tangent = router.derivative_at(&model, "e", 0.5).expect("tangent");
    assert!(tangent.x > 0.0);
}

#[test]
fn malformed_points_fall_back_to_defaults() {
    let mut model = model(Bounds::new(100.0, 0.0, 20.0, 20.0));
    set_routing_points(&mut model, "e", vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0), Point::new(3.0, 3.0)]);
    assert_eq!(router().route(&model, "e").len(), 4);
}

// =============================================================
// Handles and segments
// =============================================================

#[test]
fn handles_for_single_segment() {
    let mut model = model(Bounds::new(100.0, 0.0, 20.0, 20.0));
    router().create_routing_handles(&mut model, "e").expect("handles");
    let layout: Vec<(HandleKind, i32)> =
        handles(&model, "e").into_iter().map(|(_, h)| (h.kind, h.point_index)).collect();
    assert_eq!(
        layout,
        vec![
            (HandleKind::Source, -2),
            (HandleKind::BezierControlAfter, 0),
            (HandleKind::BezierControlBefore, 1),
            (HandleKind::BezierAdd, 0),
            (HandleKind::Target, 2),
        ]
    );
    assert_eq!(points(&model).len(), 2);
}

#[test]
fn add_segment_splits_at_the_midpoint() {
    let model = split_model();
    let points = points(&model);
    assert_eq!(points.len(), 5);
    assert!(points_almost_equal(points[2], Point::new(60.0, 60.0)));
    assert_eq!(handles(&model, "e").len(), 10);
    assert!(model.contains("e_bezier-remove_2"));
    let on_curve = router().point_at(&model, "e", 0.5).expect("midpoint");
    assert!(points_almost_equal(on_curve, Point::new(60.0, 60.0)));
}

#[test]
fn remove_segment_drops_the_triple() {
    let mut model = split_model();
    assert!(router().activate_handle(&mut model, "e", "e_bezier-remove_2").expect("remove"));
    assert_eq!(points(&model).len(), 2);
    assert_eq!(handles(&model, "e").len(), 5);
}

#[test]
fn other_handles_do_not_change_topology() {
    let mut model = split_model();
    assert!(!router().activate_handle(&mut model, "e", "e_bezier-junction_2").expect("activate"));
    assert_eq!(points(&model).len(), 5);
}

#[test]
fn moving_a_control_mirrors_its_partner() {
    let mut model = split_model();
    let before = points(&model);
    let junction = before[2];
    let partner_length = euclidean_distance(before[3], junction);

    let to = Point::new(40.0, 35.0);
    move_handle(&mut model, "e_bezier-control-before_1", to);
    let after = points(&model);
    assert_eq!(after[1], to);
    assert_eq!(after[2], junction);
    assert!((euclidean_distance(after[3], junction) - partner_length).abs() < 1e-9);
    let a = subtract(junction, to);
    let b = subtract(after[3], junction);
    assert!((a.x * b.y - a.y * b.x).abs() < 1e-6);
    assert!(a.x * b.x + a.y * b.y > 0.0);
}

#[test]
fn terminal_control_moves_freely() {
    let mut model = split_model();
    let before = points(&model);
    move_handle(&mut model, "e_bezier-control-after_0", Point::new(30.0, 0.0));
    let after = points(&model);
    assert_eq!(after[0], Point::new(30.0, 0.0));
    assert_eq!(after[1..], before[1..]);
}

#[test]
fn moving_a_junction_drags_its_controls() {
    let mut model = split_model();
    let before = points(&model);
    let to = add(before[2], Point::new(5.0, 5.0));
    move_handle(&mut model, "e_bezier-junction_2", to);
    let after = points(&model);
    assert!(points_almost_equal(after[1], add(before[1], Point::new(5.0, 5.0))));
    assert!(points_almost_equal(after[3], add(before[3], Point::new(5.0, 5.0))));
    assert_eq!(after[0], before[0]);
    assert_eq!(after[4], before[4]);
}
