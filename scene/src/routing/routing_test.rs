use super::*;
use crate::factory::ModelFactory;
use crate::geometry::{Bounds, points_almost_equal};
use crate::schema::ElementSchema;

fn crossing_model() -> Model {
    let schema = ElementSchema::new("g", "graph").with_children(vec![
        ElementSchema::shape("a", "node", Bounds::new(0.0, 0.0, 10.0, 10.0)),
        ElementSchema::shape("b", "node", Bounds::new(100.0, 100.0, 10.0, 10.0)),
        ElementSchema::shape("c", "node", Bounds::new(0.0, 100.0, 10.0, 10.0)),
        ElementSchema::shape("d", "node", Bounds::new(100.0, 0.0, 10.0, 10.0)),
        ElementSchema::edge("e1", "a", "b"),
        ElementSchema::edge("e2", "c", "d"),
        ElementSchema::edge("broken", "a", "ghost"),
    ]);
    ModelFactory::new().create_root(&schema).expect("model")
}

#[test]
fn unknown_router_kind_falls_back_to_polyline() {
    let registry = EdgeRouterRegistry::with_defaults();
    assert_eq!(registry.get(Some("spline")).kind(), "polyline");
    assert_eq!(registry.get(None).kind(), "polyline");
    assert_eq!(registry.get(Some("manhattan")).kind(), "manhattan");
    assert_eq!(registry.get(Some("bezier")).kind(), "bezier");
}

#[test]
fn edge_router_comes_from_router_kind() {
    let schema = ElementSchema::new("g", "graph").with_children(vec![
        ElementSchema::shape("a", "node", Bounds::new(0.0, 0.0, 10.0, 10.0)),
        ElementSchema::edge("e", "a", "a").with_router("manhattan"),
    ]);
    let model = ModelFactory::new().create_root(&schema).expect("model");
    assert_eq!(EdgeRouterRegistry::default().for_edge(&model, "e").kind(), "manhattan");
}

#[test]
fn route_all_children_marks_crossings() {
    let model = crossing_model();
    let routing = EdgeRouterRegistry::with_defaults().route_all_children(&model, "g");
    assert_eq!(routing.routes.len(), 3);

    let e1 = routing.get("e1").expect("e1");
    assert_eq!(e1.len(), 2);
    assert_eq!(e1[1].intersections.len(), 1);
    assert!(points_almost_equal(e1[1].intersections[0].intersection_point, Point::new(55.0, 55.0)));
    assert_eq!(routing.get("e2").expect("e2")[1].intersections.len(), 1);
}

#[test]
fn unroutable_edge_has_empty_route() {
    let routing = EdgeRouterRegistry::with_defaults().route_all_children(&crossing_model(), "g");
    assert_eq!(routing.get("broken"), Some(&[][..]));
}

#[test]
fn routed_points_serialize_flat() {
    let point = RoutedPoint::indexed(RoutedPointKind::BezierControlBefore, Point::new(1.0, 2.0), 3);
    let json = serde_json::to_value(&point).expect("json");
    assert_eq!(json, serde_json::json!({"kind": "bezier-control-before", "x": 1.0, "y": 2.0, "pointIndex": 3}));
}

#[test]
fn manhattan_options_raise_minimal_distance() {
    assert!(RouterOptions::manhattan().minimal_point_distance > RouterOptions::polyline().minimal_point_distance);
    assert_eq!(RouterOptions::default(), RouterOptions::polyline());
}
