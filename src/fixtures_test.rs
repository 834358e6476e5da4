//! Shared test fixtures: a small graph, a command context and a recording
//! render target.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use scene::factory::ModelFactory;
use scene::geometry::{Bounds, Point};
use scene::model::{HandleKind, Model};
use scene::routing::EdgeRouterRegistry;
use scene::schema::ElementSchema;
use tokio::sync::mpsc;

use crate::action::Action;
use crate::animation::ImmediateFrameSyncer;
use crate::command::{ActionSink, CommandContext};
use crate::viewer::RenderTarget;

/// `graph` with `node1` at (0,0), `node2` at (100,0), both 20×20, and
/// `edge1` from `node1` to `node2`.
pub(crate) fn graph_schema() -> ElementSchema {
    ElementSchema::new("graph", "graph").with_children(vec![
        ElementSchema::shape("node1", "node", Bounds::new(0.0, 0.0, 20.0, 20.0)),
        ElementSchema::shape("node2", "node", Bounds::new(100.0, 0.0, 20.0, 20.0)),
        ElementSchema::edge("edge1", "node1", "node2"),
    ])
}

pub(crate) fn graph() -> Model {
    ModelFactory::new().create_root(&graph_schema()).expect("graph model")
}

pub(crate) fn position(model: &Model, id: &str) -> Point {
    model.get(id).and_then(|e| e.position).expect("element with a position")
}

/// Records every update it receives as the cause kind.
#[derive(Default)]
pub(crate) struct RecordingTarget {
    pub(crate) updates: Mutex<Vec<Option<&'static str>>>,
    pub(crate) last: Mutex<Option<Model>>,
}

impl RecordingTarget {
    pub(crate) fn count(&self) -> usize {
        self.updates.lock().expect("updates lock").len()
    }

    pub(crate) fn last_model(&self) -> Option<Model> {
        self.last.lock().expect("model lock").clone()
    }
}

#[async_trait::async_trait]
impl RenderTarget for RecordingTarget {
    async fn update(&self, model: &Model, cause: Option<&Action>) {
        self.updates.lock().expect("updates lock").push(cause.map(Action::kind));
        *self.last.lock().expect("model lock") = Some(model.clone());
    }
}

/// A context with deterministic frames (16 ms steps, 48 ms animations) and a
/// receiver for follow-up actions.
pub(crate) fn context() -> (CommandContext, mpsc::UnboundedReceiver<Action>) {
    let (ctx, _, rx) = recording_context();
    (ctx, rx)
}

/// Like [`context`], also returning the target that receives animation frames.
pub(crate) fn recording_context() -> (CommandContext, Arc<RecordingTarget>, mpsc::UnboundedReceiver<Action>) {
    let (actions, rx) = ActionSink::channel();
    let frames = Arc::new(RecordingTarget::default());
    let ctx = CommandContext {
        factory: Arc::new(ModelFactory::new()),
        routers: Arc::new(EdgeRouterRegistry::with_defaults()),
        syncer: Arc::new(ImmediateFrameSyncer::new(Duration::from_millis(16))),
        duration: Duration::from_millis(48),
        frames: Arc::clone(&frames) as Arc<dyn RenderTarget>,
        actions,
    };
    (ctx, frames, rx)
}

/// Id of the first routing handle of `kind` under `edge_id`.
pub(crate) fn handle_id(model: &Model, edge_id: &str, kind: HandleKind) -> String {
    model
        .children(edge_id)
        .iter()
        .find(|id| model.get(id).and_then(|e| e.handle.as_ref()).is_some_and(|h| h.kind == kind))
        .cloned()
        .expect("routing handle")
}
