use scene::geometry::{Dimension, Point};

use super::*;
use crate::action::{ElementAndBounds, ElementMove};
use crate::command::{CommandStack, RenderTargets};
use crate::fixtures::{RecordingTarget, context, graph_schema, position};
use crate::viewer::RenderTarget;

async fn dispatcher(timeout_ms: u64) -> ActionDispatcher {
    let (ctx, _rx) = context();
    let target: Arc<dyn RenderTarget> = Arc::new(RecordingTarget::default());
    let targets = RenderTargets { main: Arc::clone(&target), hidden: Arc::clone(&target), popup: target };
    let stack = CommandStack::spawn(ctx, targets, None);
    let dispatcher = ActionDispatcher::new(stack, Duration::from_millis(timeout_ms));
    dispatcher.register_defaults().await.expect("defaults");
    dispatcher
        .dispatch(Action::SetModel { new_root: Box::new(graph_schema()), response_id: None })
        .await
        .expect("set model");
    dispatcher
}

fn move_node1(x: f64) -> Action {
    Action::Move { moves: vec![ElementMove::to("node1", Point::new(x, 0.0))], animate: false, finished: true }
}

/// Answers with a fixed follow-up action.
struct FollowUp(Action);

#[async_trait::async_trait]
impl ActionHandler for FollowUp {
    async fn handle(&self, _action: Action) -> Result<Outcome, DispatchError> {
        Ok(Outcome::Action(self.0.clone()))
    }
}

/// Swallows every action.
struct Silent;

#[async_trait::async_trait]
impl ActionHandler for Silent {
    async fn handle(&self, _action: Action) -> Result<Outcome, DispatchError> {
        Ok(Outcome::Done)
    }
}

#[tokio::test]
async fn edits_run_on_the_stack_and_undo_redo_bypass_handlers() {
    let dispatcher = dispatcher(100).await;
    dispatcher.dispatch(move_node1(30.0)).await.expect("move");
    assert_eq!(position(&dispatcher.stack().model().await.expect("model"), "node1"), Point::new(30.0, 0.0));

    dispatcher.dispatch(Action::Undo).await.expect("undo");
    assert_eq!(position(&dispatcher.stack().model().await.expect("model"), "node1"), Point::ORIGIN);
    dispatcher.dispatch(Action::Redo).await.expect("redo");
    assert_eq!(position(&dispatcher.stack().model().await.expect("model"), "node1"), Point::new(30.0, 0.0));
}

#[tokio::test]
async fn each_kind_takes_one_handler() {
    let dispatcher = dispatcher(100).await;
    let err = dispatcher.register(kinds::MOVE, Arc::new(Silent)).await.expect_err("duplicate");
    assert_eq!(err.error_code(), "E_DUPLICATE_HANDLER");
}

#[tokio::test]
async fn unhandled_kinds_are_reported() {
    let dispatcher = dispatcher(100).await;
    let err = dispatcher.dispatch(Action::RequestModel { request_id: None }).await.expect_err("missing");
    assert!(matches!(err, DispatchError::MissingHandler(ref kind) if kind == kinds::REQUEST_MODEL));
}

#[tokio::test]
async fn follow_up_actions_are_dispatched() {
    let dispatcher = dispatcher(100).await;
    let select_all = FollowUp(Action::SelectAll { select: true });
    dispatcher.register(kinds::REQUEST_MODEL, Arc::new(select_all)).await.expect("reg");
    dispatcher.dispatch(Action::RequestModel { request_id: None }).await.expect("dispatch");
    let model = dispatcher.stack().model().await.expect("model");
    assert!(model.get("node1").is_some_and(|e| e.selected));
}

#[tokio::test]
async fn selection_query_answers_with_the_request_id() {
    let dispatcher = dispatcher(100).await;
    let select = Action::SelectElements { selected: vec!["node2".into(), "edge1".into()], deselected: Vec::new() };
    dispatcher.dispatch(select).await.expect("select");

    let response = dispatcher.request(Action::GetSelection { request_id: Some("q1".into()) }).await.expect("query");
    assert_eq!(
        response,
        Action::SelectionResult {
            selected_element_ids: vec!["node2".into(), "edge1".into()],
            response_id: Some("q1".into()),
        }
    );
}

#[tokio::test]
async fn requests_without_an_id_get_one() {
    let dispatcher = dispatcher(100).await;
    let response = dispatcher.request(Action::GetViewport { request_id: None }).await.expect("query");
    let Action::ViewportResult { response_id: Some(id), .. } = response else {
        panic!("unexpected response {response:?}");
    };
    assert!(!id.is_empty());
}

#[tokio::test]
async fn unanswered_requests_time_out() {
    let dispatcher = dispatcher(20).await;
    dispatcher.register(kinds::REQUEST_MODEL, Arc::new(Silent)).await.expect("reg");
    let err = dispatcher.request(Action::RequestModel { request_id: Some("r1".into()) }).await.expect_err("timeout");
    assert_eq!(err.error_code(), "E_REQUEST_TIMEOUT");
    assert!(err.retryable());
    assert!(dispatcher.pending.lock().await.is_empty());
}

#[tokio::test]
async fn only_request_kinds_can_be_requested() {
    let dispatcher = dispatcher(100).await;
    let err = dispatcher.request(move_node1(1.0)).await.expect_err("not a request");
    assert_eq!(err.error_code(), "E_UNSUPPORTED_ACTION");
}

#[tokio::test]
async fn unmatched_computed_bounds_update_the_main_model() {
    let dispatcher = dispatcher(100).await;
    let computed = Action::ComputedBounds {
        bounds: vec![ElementAndBounds {
            element_id: "node2".into(),
            new_position: Some(Point::new(5.0, 6.0)),
            new_size: Dimension::new(30.0, 40.0),
        }],
        alignments: Vec::new(),
        response_id: Some("stale".into()),
    };
    dispatcher.dispatch(computed).await.expect("bounds");
    let model = dispatcher.stack().model().await.expect("model");
    assert_eq!(position(&model, "node2"), Point::new(5.0, 6.0));
    assert_eq!(model.get("node2").and_then(|e| e.size), Some(Dimension::new(30.0, 40.0)));
}

#[tokio::test]
async fn unsolicited_responses_are_dropped() {
    let dispatcher = dispatcher(100).await;
    let stray = Action::SelectionResult { selected_element_ids: Vec::new(), response_id: Some("nobody".into()) };
    dispatcher.dispatch(stray).await.expect("dropped");
}

#[test]
fn stack_errors_keep_their_identity() {
    let err = DispatchError::from(CommandError::StackClosed);
    assert_eq!(err.error_code(), "E_STACK_CLOSED");
    assert!(!err.retryable());
}

#[tokio::test]
async fn a_drag_and_its_release_are_one_undo_step() {
    let dispatcher = dispatcher(100).await;
    for (x, finished) in [(10.0, false), (20.0, false), (30.0, true)] {
        let step = Action::Move { moves: vec![ElementMove::to("node1", Point::new(x, 0.0))], animate: false, finished };
        dispatcher.dispatch(step).await.expect("move");
    }
    assert_eq!(dispatcher.stack().status().await.expect("status").undo, 1);
    dispatcher.dispatch(Action::Undo).await.expect("undo");
    assert_eq!(position(&dispatcher.stack().model().await.expect("model"), "node1"), Point::ORIGIN);
}
