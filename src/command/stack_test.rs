use scene::geometry::{Dimension, Point};
use scene::schema::ElementSchema;

use super::*;
use crate::action::{ElementAndBounds, ElementMove};
use crate::command::{
    CreateElementCommand, MoveCommand, RequestBoundsCommand, SetBoundsCommand, SetModelCommand, SetPopupModelCommand,
};
use crate::fixtures::{RecordingTarget, context, graph, graph_schema, position};

struct Harness {
    stack: CommandStackHandle,
    main: Arc<RecordingTarget>,
    hidden: Arc<RecordingTarget>,
    popup: Arc<RecordingTarget>,
}

async fn harness(limit: Option<usize>) -> Harness {
    let (ctx, _rx) = context();
    let main = Arc::new(RecordingTarget::default());
    let hidden = Arc::new(RecordingTarget::default());
    let popup = Arc::new(RecordingTarget::default());
    let targets = RenderTargets {
        main: Arc::clone(&main) as Arc<dyn RenderTarget>,
        hidden: Arc::clone(&hidden) as Arc<dyn RenderTarget>,
        popup: Arc::clone(&popup) as Arc<dyn RenderTarget>,
    };
    let stack = CommandStack::spawn(ctx, targets, limit);
    stack.execute(Box::new(SetModelCommand::new(graph_schema()))).await.expect("set model");
    Harness { stack, main, hidden, popup }
}

fn move_to(id: &str, x: f64, y: f64) -> Box<dyn Command> {
    Box::new(MoveCommand::new(vec![ElementMove::to(id, Point::new(x, y))], false))
}

fn set_size(id: &str, w: f64) -> Box<dyn Command> {
    Box::new(SetBoundsCommand::new(vec![ElementAndBounds {
        element_id: id.into(),
        new_position: None,
        new_size: Dimension::new(w, w),
    }]))
}

async fn node_position(h: &Harness, id: &str) -> Point {
    position(&h.stack.model().await.expect("model"), id)
}

async fn node_width(h: &Harness, id: &str) -> f64 {
    h.stack.model().await.expect("model").get(id).and_then(|e| e.size).map_or(0.0, |s| s.width)
}

#[tokio::test]
async fn reset_renders_and_leaves_no_history() {
    let h = harness(None).await;
    assert_eq!(h.stack.model().await.expect("model"), graph());
    assert_eq!(h.main.count(), 1);
    assert_eq!(h.stack.status().await.expect("status"), StackStatus::default());

    h.stack.undo().await.expect("undo");
    assert_eq!(h.stack.model().await.expect("model"), graph());
}

#[tokio::test]
async fn undo_and_redo_walk_the_history() {
    let h = harness(None).await;
    h.stack.execute(move_to("node1", 10.0, 0.0)).await.expect("move");
    h.stack.execute(move_to("node2", 50.0, 50.0)).await.expect("move");
    assert_eq!(h.stack.status().await.expect("status").undo, 2);

    h.stack.undo().await.expect("undo");
    h.stack.undo().await.expect("undo");
    assert_eq!(h.stack.model().await.expect("model"), graph());
    assert_eq!(h.stack.status().await.expect("status"), StackStatus { undo: 0, redo: 2, off: 0 });

    h.stack.redo().await.expect("redo");
    assert_eq!(node_position(&h, "node1").await, Point::new(10.0, 0.0));
    assert_eq!(node_position(&h, "node2").await, Point::new(100.0, 0.0));

    // a new command drops what is left to redo
    h.stack.execute(move_to("node2", 0.0, 90.0)).await.expect("move");
    assert_eq!(h.stack.status().await.expect("status").redo, 0);
}

#[tokio::test]
async fn a_new_reset_clears_history() {
    let h = harness(None).await;
    h.stack.execute(move_to("node1", 10.0, 0.0)).await.expect("move");
    h.stack.execute(Box::new(SetModelCommand::new(graph_schema()))).await.expect("reset");
    h.stack.undo().await.expect("undo");
    assert_eq!(h.stack.model().await.expect("model"), graph());
}

#[tokio::test]
async fn system_commands_ride_along_with_undo() {
    let h = harness(None).await;
    h.stack.execute(move_to("node1", 10.0, 0.0)).await.expect("move");
    h.stack.execute(set_size("node1", 40.0)).await.expect("bounds");

    h.stack.undo().await.expect("undo");
    assert_eq!(node_position(&h, "node1").await, Point::ORIGIN);
    assert!((node_width(&h, "node1").await - 20.0).abs() < f64::EPSILON);

    h.stack.redo().await.expect("redo");
    assert_eq!(node_position(&h, "node1").await, Point::new(10.0, 0.0));
    assert!((node_width(&h, "node1").await - 40.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn system_commands_after_undo_are_parked_off_stack() {
    let h = harness(None).await;
    h.stack.execute(move_to("node1", 10.0, 0.0)).await.expect("move");
    h.stack.undo().await.expect("undo");
    h.stack.execute(set_size("node2", 40.0)).await.expect("bounds");
    assert_eq!(h.stack.status().await.expect("status"), StackStatus { undo: 0, redo: 1, off: 1 });

    // the plain command is redone exactly as before; the parked one is rolled back
    h.stack.redo().await.expect("redo");
    assert_eq!(node_position(&h, "node1").await, Point::new(10.0, 0.0));
    assert!((node_width(&h, "node2").await - 20.0).abs() < f64::EPSILON);
    assert_eq!(h.stack.status().await.expect("status"), StackStatus { undo: 1, redo: 0, off: 0 });
}

#[tokio::test]
async fn consecutive_moves_merge_into_one_step() {
    let h = harness(None).await;
    h.stack.execute(move_to("node1", 5.0, 0.0)).await.expect("move");
    h.stack.execute(move_to("node1", 9.0, 0.0)).await.expect("move");
    assert_eq!(h.stack.status().await.expect("status").undo, 1);
    h.stack.undo().await.expect("undo");
    assert_eq!(node_position(&h, "node1").await, Point::ORIGIN);
}

#[tokio::test]
async fn history_is_capped_oldest_first() {
    let h = harness(Some(2)).await;
    h.stack.execute(move_to("node1", 5.0, 0.0)).await.expect("move");
    h.stack.execute(move_to("node2", 5.0, 50.0)).await.expect("move");
    h.stack.execute(move_to("node1", 7.0, 0.0)).await.expect("move");
    assert_eq!(h.stack.status().await.expect("status").undo, 2);
    h.stack.undo().await.expect("undo");
    h.stack.undo().await.expect("undo");
    h.stack.undo().await.expect("undo");
    assert_eq!(node_position(&h, "node1").await, Point::new(5.0, 0.0));
}

#[tokio::test]
async fn a_failing_command_keeps_the_model_and_stays_off_the_stack() {
    let h = harness(None).await;
    let renders = h.main.count();
    let duplicate = CreateElementCommand::new("graph", ElementSchema::new("node1", "node"));
    h.stack.execute(Box::new(duplicate)).await.expect("execute");
    assert_eq!(h.stack.model().await.expect("model"), graph());
    assert_eq!(h.stack.status().await.expect("status").undo, 0);
    assert_eq!(h.main.count(), renders);
}

#[tokio::test]
async fn hidden_and_popup_commands_use_their_own_targets() {
    let h = harness(None).await;
    let request = RequestBoundsCommand::new(graph_schema(), Some("r1".into()));
    let popup = SetPopupModelCommand::new(ElementSchema::new("popup", "html"));
    h.stack.execute_all(vec![Box::new(request), Box::new(popup)]).await.expect("execute");

    assert_eq!(h.hidden.count(), 1);
    assert_eq!(h.hidden.updates.lock().expect("lock")[0], Some("requestBounds"));
    assert_eq!(h.popup.count(), 1);
    assert_eq!(h.stack.popup_model().await.expect("popup").root_id(), "popup");
    assert_eq!(h.main.count(), 1);
    assert_eq!(h.stack.status().await.expect("status"), StackStatus::default());
}
