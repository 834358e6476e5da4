use super::*;
use crate::fixtures::{context, graph};

fn selected(model: &Model) -> Vec<String> {
    model.preorder().filter(|e| e.selected).map(|e| e.id.clone()).collect()
}

#[tokio::test]
async fn select_and_deselect_with_undo() {
    let (ctx, _rx) = context();
    let mut first = SelectCommand::new(vec!["node1".into(), "edge1".into()], Vec::new());
    let model = first.execute(graph(), &ctx).await.expect("select").model;
    assert_eq!(selected(&model), vec!["node1", "edge1"]);

    let mut second = SelectCommand::new(vec!["node2".into()], vec!["node1".into()]);
    let model = second.execute(model, &ctx).await.expect("reselect").model;
    assert_eq!(selected(&model), vec!["node2", "edge1"]);

    let model = second.undo(model, &ctx).await.expect("undo").model;
    assert_eq!(selected(&model), vec!["node1", "edge1"]);
    let model = second.redo(model, &ctx).await.expect("redo").model;
    assert_eq!(selected(&model), vec!["node2", "edge1"]);
}

#[tokio::test]
async fn non_selectable_and_unknown_ids_are_ignored() {
    let (ctx, _rx) = context();
    let mut cmd = SelectCommand::new(vec!["graph".into(), "ghost".into()], Vec::new());
    let model = cmd.execute(graph(), &ctx).await.expect("select").model;
    assert!(selected(&model).is_empty());
}

#[tokio::test]
async fn select_all_toggles_every_selectable() {
    let (ctx, _rx) = context();
    let mut all = SelectAllCommand::new(true);
    let model = all.execute(graph(), &ctx).await.expect("all").model;
    assert_eq!(selected(&model), vec!["node1", "node2", "edge1"]);
    let mut none = SelectAllCommand::new(false);
    let model = none.execute(model, &ctx).await.expect("none").model;
    assert!(selected(&model).is_empty());
    let model = none.undo(model, &ctx).await.expect("undo").model;
    assert_eq!(selected(&model).len(), 3);
}

#[tokio::test]
async fn hover_feedback_is_a_system_command() {
    let (ctx, _rx) = context();
    let mut cmd = HoverFeedbackCommand::new("node1", true);
    assert_eq!(cmd.kind(), CommandKind::System);
    let result = cmd.execute(graph(), &ctx).await.expect("hover");
    assert!(result.changed);
    assert!(result.model.get("node1").is_some_and(|e| e.hover_feedback));
    let undone = cmd.undo(result.model, &ctx).await.expect("undo").model;
    assert!(undone.get("node1").is_some_and(|e| !e.hover_feedback));

    let mut missing = HoverFeedbackCommand::new("ghost", true);
    assert!(!missing.execute(graph(), &ctx).await.expect("missing").changed);
}
