use std::time::Duration;

use scene::geometry::{Bounds, Dimension};

use super::*;
use crate::animation::ImmediateFrameSyncer;

async fn engine() -> Engine {
    let config = EngineConfig { animation_ms: 0, bounds_timeout_ms: 1000, ..EngineConfig::default() };
    let services = EngineServices {
        syncer: Some(Arc::new(ImmediateFrameSyncer::new(Duration::from_millis(16)))),
        ..EngineServices::default()
    };
    Engine::start(config, services).await.expect("engine")
}

fn labelled_node() -> ElementSchema {
    let mut label = ElementSchema::new("label1", "label");
    label.text = Some("hello".into());
    ElementSchema::new("graph", "graph").with_children(vec![
        ElementSchema::new("node1", "node").with_children(vec![label]),
        ElementSchema::shape("node2", "node", Bounds::new(100.0, 0.0, 40.0, 30.0)),
    ])
}

#[tokio::test]
async fn nothing_is_rendered_before_a_model_arrives() {
    let engine = engine().await;
    assert!(engine.rendered().await.is_none());
    assert_eq!(engine.model().await.expect("model").root_id(), crate::command::EMPTY_ROOT_ID);
}

#[tokio::test]
async fn set_model_measures_then_renders() {
    let engine = engine().await;
    engine.set_model(labelled_node()).await.expect("set model");

    let model = engine.model().await.expect("model");
    assert_eq!(model.get("label1").and_then(|e| e.size), Some(Dimension::new(35.0, 16.0)));
    assert_eq!(model.get("node1").and_then(|e| e.size), Some(Dimension::new(35.0, 16.0)));
    assert_eq!(model.get("node2").and_then(|e| e.size), Some(Dimension::new(40.0, 30.0)));
    assert_eq!(engine.source().model().await.find("label1").and_then(|s| s.size), Some(Dimension::new(35.0, 16.0)));

    let tree = engine.rendered().await.expect("rendered tree");
    assert!(tree.find("node1").is_some());
    let label = tree.find("label1").expect("label node");
    assert!(label.children.iter().any(|c| c.text.as_deref() == Some("hello")));
}

#[tokio::test]
async fn model_requests_are_answered_from_the_source() {
    let engine = engine().await;
    engine.set_model(labelled_node()).await.expect("set model");
    let response = engine.request(Action::RequestModel { request_id: None }).await.expect("model");
    assert!(matches!(response, Action::SetModel { response_id: Some(_), .. }));
}

#[tokio::test]
async fn popup_models_render_separately() {
    let engine = engine().await;
    engine.set_model(labelled_node()).await.expect("set model");
    let renders = engine.render_count().await;
    let popup = ElementSchema::new("popup", "popup")
        .with_children(vec![ElementSchema::shape("tip", "node", Bounds::new(0.0, 0.0, 10.0, 10.0))]);
    engine.dispatch(Action::SetPopupModel { new_root: Box::new(popup) }).await.expect("popup");
    assert!(engine.rendered_popup().await.is_some_and(|t| t.find("tip").is_some()));
    assert_eq!(engine.render_count().await, renders);
}
