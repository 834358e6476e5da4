use super::*;
use serde_json::json;

#[test]
fn kind_matches_wire_tag() {
    let action = Action::SelectAll { select: true };
    let value = serde_json::to_value(&action).expect("serialize");
    assert_eq!(value["kind"], json!(action.kind()));
    assert_eq!(value["kind"], json!("selectAll"));
}

#[test]
fn unit_variants_serialize_as_bare_kind() {
    assert_eq!(serde_json::to_value(Action::Undo).expect("serialize"), json!({"kind": "undo"}));
    let redo: Action = serde_json::from_value(json!({"kind": "redo"})).expect("deserialize");
    assert_eq!(redo, Action::Redo);
}

#[test]
fn fields_are_camel_case() {
    let action = Action::Reconnect {
        routable_id: "e1".into(),
        new_source_id: None,
        new_target_id: Some("n3".into()),
    };
    let value = serde_json::to_value(&action).expect("serialize");
    assert_eq!(value, json!({"kind": "reconnect", "routableId": "e1", "newTargetId": "n3"}));
}

#[test]
fn move_defaults_to_unanimated() {
    let action: Action = serde_json::from_value(json!({
        "kind": "move",
        "moves": [{"elementId": "n1", "toPosition": {"x": 5.0, "y": 6.0}}]
    }))
    .expect("deserialize");
    let Action::Move { moves, animate, finished } = action else {
        panic!("expected a move action");
    };
    assert!(!animate);
    assert!(!finished);
    assert_eq!(moves[0], ElementMove::to("n1", Point::new(5.0, 6.0)));
}

#[test]
fn update_model_defaults_to_animated() {
    let action: Action = serde_json::from_value(json!({
        "kind": "updateModel",
        "newRoot": {"id": "g", "type": "graph"}
    }))
    .expect("deserialize");
    assert!(matches!(action, Action::UpdateModel { animate: true, .. }));
}

#[test]
fn computed_bounds_round_trip_keeps_optional_position() {
    let action = Action::ComputedBounds {
        bounds: vec![ElementAndBounds {
            element_id: "n1".into(),
            new_position: None,
            new_size: Dimension::new(30.0, 20.0),
        }],
        alignments: Vec::new(),
        response_id: Some("r1".into()),
    };
    let value = serde_json::to_value(&action).expect("serialize");
    assert!(value["bounds"][0].get("newPosition").is_none());
    let back: Action = serde_json::from_value(value).expect("deserialize");
    assert_eq!(back, action);
}

#[test]
fn request_and_response_ids() {
    let request = Action::GetSelection { request_id: None }.with_request_id("abc");
    assert!(request.is_request());
    assert_eq!(request.request_id(), Some("abc"));
    assert_eq!(request.response_id(), None);

    let response = Action::SelectionResult { selected_element_ids: vec![], response_id: Some("abc".into()) };
    assert!(!response.is_request());
    assert_eq!(response.response_id(), Some("abc"));
}

#[test]
fn empty_ids_are_treated_as_absent() {
    let request = Action::RequestModel { request_id: Some(String::new()) };
    assert_eq!(request.request_id(), None);
}

#[test]
fn with_request_id_ignores_non_requests() {
    let action = Action::SelectAll { select: false }.with_request_id("abc");
    assert_eq!(action, Action::SelectAll { select: false });
}
