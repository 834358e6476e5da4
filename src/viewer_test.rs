use std::sync::Arc;

use scene::geometry::Bounds;
use scene::render::ViewRegistry;
use scene::routing::EdgeRouterRegistry;
use scene::schema::ElementSchema;

use super::*;
use crate::fixtures::graph;

fn viewer() -> Viewer {
    let routers = Arc::new(EdgeRouterRegistry::with_defaults());
    Viewer::new("main", ModelRenderer::new(ViewRegistry::with_defaults(), routers))
}

fn labelled() -> Model {
    let schema = ElementSchema::new("graph", "graph").with_children(vec![
        ElementSchema::new("node1", "node").with_children(vec![ElementSchema {
            text: Some("hello\nwide world".into()),
            position: Some(Point::new(5.0, 5.0)),
            ..ElementSchema::new("label1", "label")
        }]),
        ElementSchema::shape("node2", "node", Bounds::new(50.0, 0.0, 30.0, 10.0)),
    ]);
    scene::factory::ModelFactory::new().create_root(&schema).expect("model")
}

#[tokio::test]
async fn viewer_keeps_the_latest_tree() {
    let viewer = viewer();
    assert!(viewer.tree().await.is_none());
    viewer.update(&graph(), None).await;
    viewer.update(&graph(), Some(&Action::Undo)).await;
    assert_eq!(viewer.renders().await, 2);
    let tree = viewer.tree().await.expect("tree");
    assert!(tree.find("node1").is_some());
    assert!(tree.find("edge1").is_some());
}

#[test]
fn text_is_measured_per_line() {
    let model = labelled();
    let label = model.get("label1").expect("label");
    let size = EstimatedBoundsMeasurer.measure(&model, label).expect("size");
    assert_eq!(size, Dimension::new(10.0 * ESTIMATED_CHAR_WIDTH, 2.0 * ESTIMATED_LINE_HEIGHT));
    assert_eq!(EstimatedBoundsMeasurer.alignment(&model, label), Some(Point::new(0.0, TEXT_BASELINE)));
}

#[test]
fn containers_span_their_children() {
    let model = labelled();
    let node = model.get("node1").expect("node");
    let size = EstimatedBoundsMeasurer.measure(&model, node).expect("size");
    assert_eq!(size, Dimension::new(5.0 + 10.0 * ESTIMATED_CHAR_WIDTH, 5.0 + 2.0 * ESTIMATED_LINE_HEIGHT));
}

#[test]
fn explicit_sizes_are_kept() {
    let model = labelled();
    let node = model.get("node2").expect("node");
    assert_eq!(EstimatedBoundsMeasurer.measure(&model, node), Some(Dimension::new(30.0, 10.0)));
}

#[tokio::test]
async fn hidden_updater_answers_bounds_requests() {
    let (sink, mut rx) = ActionSink::channel();
    let updater = HiddenBoundsUpdater::new(Arc::new(EstimatedBoundsMeasurer), sink);
    let model = labelled();

    updater.update(&model, None).await;
    assert!(rx.try_recv().is_err());

    let cause = Action::RequestBounds { new_root: Box::new(ElementSchema::new("graph", "graph")), request_id: None }
        .with_request_id("req-1");
    updater.update(&model, Some(&cause)).await;
    let Some(Action::ComputedBounds { bounds, alignments, response_id }) = rx.recv().await else {
        panic!("expected computed bounds");
    };
    assert_eq!(response_id.as_deref(), Some("req-1"));
    let ids: Vec<&str> = bounds.iter().map(|b| b.element_id.as_str()).collect();
    assert_eq!(ids, vec!["node1", "label1", "node2"]);
    assert_eq!(bounds[1].new_position, Some(Point::new(5.0, 5.0)));
    assert_eq!(alignments.len(), 1);
    assert_eq!(alignments[0].element_id, "label1");
}

#[tokio::test]
async fn null_target_ignores_updates() {
    NullTarget.update(&graph(), None).await;
}
