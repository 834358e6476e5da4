use scene::geometry::Bounds;
use scene::schema::ElementSchema;

use super::*;
use crate::fixtures::{context, graph};

fn four_nodes() -> Model {
    let nodes = ["a", "b", "c", "d"]
        .iter()
        .map(|id| ElementSchema::shape(*id, "node", Bounds::new(0.0, 0.0, 10.0, 10.0)))
        .collect();
    let schema = ElementSchema::new("graph", "graph").with_children(nodes);
    scene::factory::ModelFactory::new().create_root(&schema).expect("model")
}

#[tokio::test]
async fn bring_to_front_moves_to_the_end_and_undo_restores_the_index() {
    let (ctx, _rx) = context();
    let mut cmd = BringToFrontCommand::new(vec!["node1".into()]);
    let model = cmd.execute(graph(), &ctx).await.expect("front").model;
    assert_eq!(model.children("graph"), ["node2".to_string(), "node1".into(), "edge1".into()]);

    let undone = cmd.undo(model.clone(), &ctx).await.expect("undo").model;
    assert_eq!(undone.index_of("node1"), Some(0));
    assert_eq!(undone, graph());
    let redone = cmd.redo(undone, &ctx).await.expect("redo").model;
    assert_eq!(redone, model);
}

#[tokio::test]
async fn several_siblings_keep_their_relative_order() {
    let (ctx, _rx) = context();
    let mut cmd = BringToFrontCommand::new(vec!["a".into(), "c".into()]);
    let model = cmd.execute(four_nodes(), &ctx).await.expect("front").model;
    assert_eq!(model.children("graph"), ["b".to_string(), "d".into(), "a".into(), "c".into()]);
    let undone = cmd.undo(model, &ctx).await.expect("undo").model;
    assert_eq!(undone, four_nodes());
}

#[tokio::test]
async fn root_and_unknown_ids_are_skipped() {
    let (ctx, _rx) = context();
    let mut cmd = BringToFrontCommand::new(vec!["graph".into(), "ghost".into()]);
    let model = cmd.execute(graph(), &ctx).await.expect("front").model;
    assert_eq!(model, graph());
}
