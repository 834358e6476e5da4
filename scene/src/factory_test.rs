use super::*;
use crate::geometry::{Bounds, Point};
use serde_json::json;

fn sample() -> ElementSchema {
    let mut label = ElementSchema::new("l1", "label:heading");
    label.text = Some("hello".into());
    let mut node = ElementSchema::shape("n1", "node:circle", Bounds::new(10.0, 20.0, 30.0, 40.0));
    node.props.insert("anchorKind".into(), json!("elliptic"));
    node.props.insert("cssClasses".into(), json!(["a"]));
    node.children = vec![label];
    ElementSchema::new("g", "graph").with_children(vec![
        node,
        ElementSchema::shape("n2", "node", Bounds::new(100.0, 20.0, 30.0, 40.0)),
        ElementSchema::edge("e1", "n1", "n2")
            .with_routing_points(vec![Point::new(50.0, 50.0)])
            .with_router("manhattan"),
    ])
}

#[test]
fn graph_prefixes_resolve_without_registration() {
    let factory = ModelFactory::new();
    let model = factory.create_root(&sample()).expect("model");
    assert_eq!(model.root().basic(), BasicType::Graph);
    let n1 = model.get("n1").expect("n1");
    assert_eq!(n1.basic(), BasicType::Node);
    assert_eq!(n1.kind.sub.as_deref(), Some("circle"));
    assert_eq!(n1.anchor_kind.as_deref(), Some("elliptic"));
    assert!(n1.has(Feature::Move));
    assert!(n1.has(Feature::Popup));
    let label = model.get("l1").expect("l1");
    assert!(label.has(Feature::EditLabel));
    assert!(!label.has(Feature::Move));
}

#[test]
fn default_feature_table_matches_basic_types() {
    assert!(default_features(BasicType::Edge).contains(Feature::Edit));
    assert!(!default_features(BasicType::Edge).contains(Feature::Move));
    assert!(default_features(BasicType::Port).contains(Feature::Connectable));
    assert!(default_features(BasicType::DanglingAnchor).contains(Feature::Connectable));
    assert!(default_features(BasicType::Graph).contains(Feature::Viewport));
    assert!(default_features(BasicType::RoutingHandle).contains(Feature::Move));
}

#[test]
fn registration_overrides_features() {
    let mut factory = ModelFactory::new();
    factory.register("node:fixed", BasicType::Node, &[Feature::Edit], &[Feature::Move]).expect("register");
    let (kind, features) = factory.resolve("node:fixed", false);
    assert_eq!(kind.basic, BasicType::Node);
    assert!(features.contains(Feature::Edit));
    assert!(!features.contains(Feature::Move));
}

#[test]
fn registering_twice_fails() {
    let mut factory = ModelFactory::new();
    factory.register("custom", BasicType::Node, &[], &[]).expect("first");
    let err = factory.register("custom", BasicType::Node, &[], &[]).expect_err("second");
    assert_eq!(err.error_code(), "E_DUPLICATE_REGISTRATION");
}

#[test]
fn root_from_child_type_fails() {
    let mut factory = ModelFactory::new();
    factory.register("thing", BasicType::Node, &[], &[]).expect("register");
    let err = factory.create_root(&ElementSchema::new("r", "thing")).expect_err("not a root");
    assert!(matches!(err, SceneError::TypeMismatch { .. }));
}

#[test]
fn child_from_root_type_fails() {
    let factory = ModelFactory::new();
    let err = factory.create_element(&ElementSchema::new("x", "graph")).expect_err("not a child");
    assert!(matches!(err, SceneError::TypeMismatch { .. }));
}

#[test]
fn unknown_types_fall_back_to_generic() {
    let factory = ModelFactory::new();
    let model = factory
        .create_root(&ElementSchema::new("r", "html").with_children(vec![ElementSchema::new("c", "pre-rendered")]))
        .expect("generic root");
    assert_eq!(model.root().basic(), BasicType::GenericRoot);
    assert_eq!(model.get("c").map(Element::basic), Some(BasicType::Generic));
}

#[test]
fn schema_round_trip_is_lossless() {
    let factory = ModelFactory::new();
    let schema = sample();
    let model = factory.create_root(&schema).expect("model");
    let back = ModelFactory::create_schema(&model, "g").expect("schema");
    assert_eq!(back, schema);
}

#[test]
fn empty_edge_fields_round_trip_as_received() {
    let factory = ModelFactory::new();
    let schema = ElementSchema::new("g", "graph").with_children(vec![
        ElementSchema::shape("a", "node", Bounds::new(0.0, 0.0, 10.0, 10.0)),
        ElementSchema::shape("b", "node", Bounds::new(50.0, 0.0, 10.0, 10.0)),
        ElementSchema::edge("e", "a", "b").with_routing_points(Vec::new()),
        ElementSchema::edge("loose", "", ""),
        ElementSchema::edge("plain", "a", "b"),
    ]);
    let model = factory.create_root(&schema).expect("model");
    let back = ModelFactory::create_schema(&model, "g").expect("schema");
    assert_eq!(back.find("e").and_then(|e| e.routing_points.clone()), Some(Vec::new()));
    assert_eq!(back.find("loose").and_then(|e| e.source_id.clone()).as_deref(), Some(""));
    assert_eq!(back.find("plain").and_then(|e| e.routing_points.clone()), None);
    assert_eq!(back, schema);
}

#[test]
fn non_string_anchor_kind_stays_a_property() {
    let factory = ModelFactory::new();
    let mut node = ElementSchema::shape("a", "node", Bounds::new(0.0, 0.0, 10.0, 10.0));
    node.props.insert("anchorKind".into(), json!(3));
    let schema = ElementSchema::new("g", "graph").with_children(vec![node]);
    let model = factory.create_root(&schema).expect("model");
    assert_eq!(model.get("a").and_then(|a| a.anchor_kind.clone()), None);
    let back = ModelFactory::create_schema(&model, "g").expect("schema");
    assert_eq!(back.find("a").and_then(|a| a.props.get("anchorKind")), Some(&json!(3)));
    assert_eq!(back, schema);
}

#[test]
fn handle_state_round_trips_through_props() {
    let factory = ModelFactory::new();
    let mut handle = ElementSchema::new("h", "routing-point");
    handle.props.insert("kind".into(), json!("junction"));
    handle.props.insert("pointIndex".into(), json!(2));
    handle.props.insert("editMode".into(), json!(true));
    let subtree = factory.create_element(&handle).expect("handle");
    let data = subtree.element.handle.as_ref().expect("handle data");
    assert_eq!(data.kind, HandleKind::Junction);
    assert_eq!(data.point_index, 2);
    assert!(data.edit_mode);
    assert!(subtree.element.props.is_empty());
    assert_eq!(ModelFactory::subtree_schema(&subtree), handle);
}

#[test]
fn duplicate_ids_in_schema_are_rejected() {
    let factory = ModelFactory::new();
    let schema = ElementSchema::new("g", "graph")
        .with_children(vec![ElementSchema::new("n", "node"), ElementSchema::new("n", "node")]);
    assert!(matches!(factory.create_root(&schema), Err(SceneError::DuplicateId(_))));
}

#[test]
fn routing_handle_ids_encode_kind_and_index() {
    let handle = routing_handle("e1", HandleKind::Line, -1);
    assert_eq!(handle.id, "e1_line_-1");
    assert_eq!(handle.kind.name, "volatile-routing-point");
    assert_eq!(handle.handle.as_ref().map(|h| h.point_index), Some(-1));
}
