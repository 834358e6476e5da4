use scene::geometry::{Bounds, Point};

use super::*;
use crate::command::{EMPTY_ROOT_ID, empty_model};
use crate::fixtures::{context, graph, graph_schema, position, recording_context};

fn moved_schema() -> ElementSchema {
    ElementSchema::new("graph", "graph").with_children(vec![
        ElementSchema::shape("node1", "node", Bounds::new(0.0, 40.0, 20.0, 20.0)),
        ElementSchema::shape("node3", "node", Bounds::new(200.0, 0.0, 20.0, 20.0)),
    ])
}

#[tokio::test]
async fn set_model_replaces_and_is_a_reset() {
    let (ctx, _rx) = context();
    let mut cmd = SetModelCommand::new(graph_schema());
    assert_eq!(cmd.kind(), CommandKind::Reset);
    let result = cmd.execute(empty_model(), &ctx).await.expect("execute");
    assert!(result.changed);
    assert_eq!(result.model, graph());
    let undone = cmd.undo(result.model, &ctx).await.expect("undo");
    assert_eq!(undone.model.root_id(), EMPTY_ROOT_ID);
}

#[tokio::test]
async fn set_model_rejects_a_non_root_schema() {
    let (ctx, _rx) = context();
    let mut cmd = SetModelCommand::new(ElementSchema::new("n", "node"));
    let err = cmd.execute(empty_model(), &ctx).await.expect_err("type mismatch");
    assert_eq!(crate::error::ErrorCode::error_code(&err), "E_TYPE_MISMATCH");
}

#[tokio::test]
async fn unanimated_update_swaps_without_frames() {
    let (ctx, frames, _rx) = recording_context();
    let mut cmd = UpdateModelCommand::new(moved_schema(), false);
    let result = cmd.execute(graph(), &ctx).await.expect("execute");
    assert_eq!(position(&result.model, "node1"), Point::new(0.0, 40.0));
    assert!(!result.model.contains("node2"));
    assert_eq!(frames.count(), 0);
}

#[tokio::test]
async fn animated_update_settles_on_the_new_model() {
    let (ctx, frames, _rx) = recording_context();
    let target = ctx.factory.create_root(&moved_schema()).expect("target");
    let mut cmd = UpdateModelCommand::new(moved_schema(), true);
    let result = cmd.execute(graph(), &ctx).await.expect("execute");
    assert_eq!(result.model, target);
    assert!(frames.count() > 0);

    // intermediate frames show the removed node fading out
    let frame = frames.last_model().expect("frame");
    assert!(frame.contains("node2"));
    let y = position(&frame, "node1").y;
    assert!(y > 0.0 && y < 40.0);
}

#[tokio::test]
async fn update_undo_and_redo_restore_both_revisions() {
    let (ctx, _rx) = context();
    let mut cmd = UpdateModelCommand::new(moved_schema(), true);
    let executed = cmd.execute(graph(), &ctx).await.expect("execute").model;
    let undone = cmd.undo(executed.clone(), &ctx).await.expect("undo").model;
    assert_eq!(undone, graph());
    let redone = cmd.redo(undone, &ctx).await.expect("redo").model;
    assert_eq!(redone, executed);
}

#[tokio::test]
async fn update_with_a_new_root_id_is_not_animated() {
    let (ctx, frames, _rx) = recording_context();
    let mut cmd = UpdateModelCommand::new(ElementSchema::new("other", "graph"), true);
    let result = cmd.execute(graph(), &ctx).await.expect("execute");
    assert_eq!(result.model.root_id(), "other");
    assert_eq!(frames.count(), 0);
}

#[tokio::test]
async fn popup_model_targets_the_popup() {
    let (ctx, _rx) = context();
    let mut cmd = SetPopupModelCommand::new(ElementSchema::new("popup", "html"));
    assert_eq!(cmd.kind(), CommandKind::Popup);
    let result = cmd.execute(empty_model(), &ctx).await.expect("execute");
    assert_eq!(result.model.root_id(), "popup");
}
