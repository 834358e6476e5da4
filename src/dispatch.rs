//! Action dispatch — one handler per action kind.
//!
//! DESIGN
//! ======
//! Handlers are pure mappers: they receive an action and return an
//! [`Outcome`]. The dispatcher owns everything after that: executing commands
//! on the stack, dispatching follow-up actions, and resolving pending
//! requests.
//!
//! LIFECYCLE
//! =========
//! 1. `undo`/`redo` go straight to the command stack
//! 2. An action with a `responseId` that matches a pending request resolves
//!    that request and stops there
//! 3. Anything else goes to the handler registered for its kind
//! 4. The handler's outcome is applied; a follow-up action starts again at 1
//!
//! ERROR HANDLING
//! ==============
//! A missing handler is logged and returned as [`DispatchError::MissingHandler`].
//! Requests are bounded by the configured timeout; a timed-out request is
//! removed from the pending map so a late response falls through to its
//! regular handler.

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod dispatch_test;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use scene::geometry::Bounds;
use scene::viewport::viewport_of;
use tokio::sync::{Mutex, RwLock, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::action::{Action, kinds};
use crate::command::{
    BringToFrontCommand, CenterCommand, Command, CommandError, CommandStackHandle, CreateElementCommand,
    DeleteElementCommand, EditLabelCommand, FitToScreenCommand, HoverFeedbackCommand, MoveCommand, ReconnectCommand,
    RequestBoundsCommand, SelectAllCommand, SelectCommand, SetBoundsCommand, SetModelCommand, SetPopupModelCommand,
    SetViewportCommand, SwitchEditModeCommand, UpdateModelCommand,
};
use crate::error::ErrorCode;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no handler registered for action kind {0}")]
    MissingHandler(String),
    #[error("a handler is already registered for action kind {0}")]
    DuplicateHandler(String),
    #[error("handler cannot process action kind {0}")]
    UnsupportedAction(String),
    #[error("request {request_id} timed out after {timeout_ms} ms")]
    RequestTimeout { request_id: String, timeout_ms: u64 },
    #[error("request {0} was dropped before a response arrived")]
    RequestDropped(String),
    #[error("command stack is closed")]
    StackClosed,
    #[error("expected a {expected} response, got {actual}")]
    UnexpectedResponse { expected: &'static str, actual: &'static str },
    #[error(transparent)]
    Command(CommandError),
}

impl From<CommandError> for DispatchError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::StackClosed => Self::StackClosed,
            other @ CommandError::Scene(_) => Self::Command(other),
        }
    }
}

impl ErrorCode for DispatchError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingHandler(_) => "E_MISSING_HANDLER",
            Self::DuplicateHandler(_) => "E_DUPLICATE_HANDLER",
            Self::UnsupportedAction(_) => "E_UNSUPPORTED_ACTION",
            Self::RequestTimeout { .. } => "E_REQUEST_TIMEOUT",
            Self::RequestDropped(_) => "E_REQUEST_DROPPED",
            Self::StackClosed => "E_STACK_CLOSED",
            Self::UnexpectedResponse { .. } => "E_UNEXPECTED_RESPONSE",
            Self::Command(err) => err.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::RequestTimeout { .. })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// What a handler wants done with an action.
pub enum Outcome {
    /// Execute the command on the command stack.
    Command(Box<dyn Command>),
    /// Dispatch a follow-up action.
    Action(Action),
    /// Nothing further.
    Done,
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Command(command) => f.debug_tuple("Command").field(&command.name()).finish(),
            Self::Action(action) => f.debug_tuple("Action").field(action).finish(),
            Self::Done => f.write_str("Done"),
        }
    }
}

#[async_trait::async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, action: Action) -> Result<Outcome, DispatchError>;
}

/// Maps every editing action to its command.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandHandler;

/// Action kinds the [`CommandHandler`] is registered for by default.
pub const COMMAND_KINDS: &[&str] = &[
    kinds::SET_MODEL,
    kinds::UPDATE_MODEL,
    kinds::REQUEST_BOUNDS,
    kinds::COMPUTED_BOUNDS,
    kinds::SET_BOUNDS,
    kinds::MOVE,
    kinds::SELECT_ELEMENTS,
    kinds::SELECT_ALL,
    kinds::CREATE_ELEMENT,
    kinds::DELETE_ELEMENT,
    kinds::RECONNECT,
    kinds::SWITCH_EDIT_MODE,
    kinds::APPLY_LABEL_EDIT,
    kinds::BRING_TO_FRONT,
    kinds::SET_VIEWPORT,
    kinds::CENTER,
    kinds::FIT,
    kinds::HOVER_FEEDBACK,
    kinds::SET_POPUP_MODEL,
];

impl CommandHandler {
    /// The command for `action`, or `None` for kinds that are not edits.
    ///
    /// A `computedBounds` that reaches this point answers no pending request;
    /// its bounds are written to the main model like a `setBounds`.
    #[must_use]
    pub fn command_for(action: Action) -> Option<Box<dyn Command>> {
        let command: Box<dyn Command> = match action {
            Action::SetModel { new_root, .. } => Box::new(SetModelCommand::new(*new_root)),
            Action::UpdateModel { new_root, animate } => Box::new(UpdateModelCommand::new(*new_root, animate)),
            Action::RequestBounds { new_root, request_id } => {
                Box::new(RequestBoundsCommand::new(*new_root, request_id))
            }
            Action::ComputedBounds { bounds, .. } | Action::SetBounds { bounds } => {
                Box::new(SetBoundsCommand::new(bounds))
            }
            Action::Move { moves, animate, .. } => Box::new(MoveCommand::new(moves, animate)),
            Action::SelectElements { selected, deselected } => Box::new(SelectCommand::new(selected, deselected)),
            Action::SelectAll { select } => Box::new(SelectAllCommand::new(select)),
            Action::CreateElement { container_id, element_schema } => {
                Box::new(CreateElementCommand::new(container_id, *element_schema))
            }
            Action::DeleteElement { element_ids } => Box::new(DeleteElementCommand::new(element_ids)),
            Action::Reconnect { routable_id, new_source_id, new_target_id } => {
                Box::new(ReconnectCommand::new(routable_id, new_source_id, new_target_id))
            }
            Action::SwitchEditMode { elements_to_activate, elements_to_deactivate } => {
                Box::new(SwitchEditModeCommand::new(elements_to_activate, elements_to_deactivate))
            }
            Action::ApplyLabelEdit { label_id, text } => Box::new(EditLabelCommand::new(label_id, text)),
            Action::BringToFront { element_ids } => Box::new(BringToFrontCommand::new(element_ids)),
            Action::SetViewport { element_id, new_viewport, animate } => {
                Box::new(SetViewportCommand::new(element_id, new_viewport, animate))
            }
            Action::Center { element_ids, animate, retain_zoom } => {
                Box::new(CenterCommand::new(element_ids, animate, retain_zoom))
            }
            Action::Fit { element_ids, padding, max_zoom, animate } => {
                Box::new(FitToScreenCommand::new(element_ids, padding, max_zoom, animate))
            }
            Action::HoverFeedback { mouseover_element, mouse_is_over } => {
                Box::new(HoverFeedbackCommand::new(mouseover_element, mouse_is_over))
            }
            Action::SetPopupModel { new_root } => Box::new(SetPopupModelCommand::new(*new_root)),
            _ => return None,
        };
        Some(command)
    }
}

#[async_trait::async_trait]
impl ActionHandler for CommandHandler {
    async fn handle(&self, action: Action) -> Result<Outcome, DispatchError> {
        let kind = action.kind();
        Self::command_for(action)
            .map(Outcome::Command)
            .ok_or_else(|| DispatchError::UnsupportedAction(kind.to_string()))
    }
}

/// Answers `getSelection` and `getViewport` from the current main model.
#[derive(Debug, Clone)]
pub struct QueryHandler {
    stack: CommandStackHandle,
}

impl QueryHandler {
    #[must_use]
    pub fn new(stack: CommandStackHandle) -> Self {
        Self { stack }
    }
}

#[async_trait::async_trait]
impl ActionHandler for QueryHandler {
    async fn handle(&self, action: Action) -> Result<Outcome, DispatchError> {
        let Some(response_id) = action.request_id().map(str::to_string) else {
            debug!(kind = action.kind(), "query without request id ignored");
            return Ok(Outcome::Done);
        };
        let model = self.stack.model().await?;
        let response = match action {
            Action::GetSelection { .. } => Action::SelectionResult {
                selected_element_ids: model.preorder().filter(|e| e.selected).map(|e| e.id.clone()).collect(),
                response_id: Some(response_id),
            },
            Action::GetViewport { .. } => Action::ViewportResult {
                viewport: viewport_of(&model),
                canvas_bounds: model.root().canvas_bounds.unwrap_or(Bounds::EMPTY),
                response_id: Some(response_id),
            },
            other => return Err(DispatchError::UnsupportedAction(other.kind().to_string())),
        };
        Ok(Outcome::Action(response))
    }
}

// =============================================================================
// DISPATCHER
// =============================================================================

pub struct ActionDispatcher {
    handlers: RwLock<HashMap<String, Arc<dyn ActionHandler>>>,
    pending: Mutex<HashMap<String, oneshot::Sender<Action>>>,
    stack: CommandStackHandle,
    timeout: Duration,
}

impl ActionDispatcher {
    #[must_use]
    pub fn new(stack: CommandStackHandle, timeout: Duration) -> Self {
        Self { handlers: RwLock::new(HashMap::new()), pending: Mutex::new(HashMap::new()), stack, timeout }
    }

    /// Register `handler` for `kind`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::DuplicateHandler`] if `kind` already has a handler.
    pub async fn register(&self, kind: &str, handler: Arc<dyn ActionHandler>) -> Result<(), DispatchError> {
        let mut handlers = self.handlers.write().await;
        if handlers.contains_key(kind) {
            return Err(DispatchError::DuplicateHandler(kind.to_string()));
        }
        handlers.insert(kind.to_string(), handler);
        Ok(())
    }

    /// Register the [`CommandHandler`] for every edit kind and the
    /// [`QueryHandler`] for the two queries.
    ///
    /// # Errors
    ///
    /// [`DispatchError::DuplicateHandler`] if any of those kinds is taken.
    pub async fn register_defaults(&self) -> Result<(), DispatchError> {
        let commands: Arc<dyn ActionHandler> = Arc::new(CommandHandler);
        for kind in COMMAND_KINDS {
            self.register(kind, Arc::clone(&commands)).await?;
        }
        let queries: Arc<dyn ActionHandler> = Arc::new(QueryHandler::new(self.stack.clone()));
        self.register(kinds::GET_SELECTION, Arc::clone(&queries)).await?;
        self.register(kinds::GET_VIEWPORT, queries).await
    }

    #[must_use]
    pub fn stack(&self) -> &CommandStackHandle {
        &self.stack
    }

    /// Dispatch `action` and every follow-up action its handler produces.
    /// Returns once resulting commands have been executed and rendered.
    ///
    /// # Errors
    ///
    /// Missing or failing handlers, and a closed command stack.
    pub async fn dispatch(&self, action: Action) -> Result<(), DispatchError> {
        let mut next = Some(action);
        while let Some(action) = next.take() {
            next = self.dispatch_one(action).await?;
        }
        Ok(())
    }

    /// Dispatch `actions` one after another, stopping at the first error.
    ///
    /// # Errors
    ///
    /// The first error any of the dispatches returns.
    pub async fn dispatch_all(&self, actions: Vec<Action>) -> Result<(), DispatchError> {
        for action in actions {
            self.dispatch(action).await?;
        }
        Ok(())
    }

    /// Dispatch a request and wait for the action carrying its id as
    /// `responseId`. A request id is generated when the action has none.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnsupportedAction`] for non-request kinds,
    /// [`DispatchError::RequestTimeout`] when no response arrives in time, and
    /// any error dispatching the request itself.
    pub async fn request(&self, action: Action) -> Result<Action, DispatchError> {
        if !action.is_request() {
            return Err(DispatchError::UnsupportedAction(action.kind().to_string()));
        }
        let request_id = action.request_id().map_or_else(|| Uuid::new_v4().to_string(), str::to_string);
        let action = action.with_request_id(request_id.clone());
        let kind = action.kind();

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(request_id.clone(), tx);
        if let Err(err) = self.dispatch(action).await {
            self.pending.lock().await.remove(&request_id);
            return Err(err);
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(DispatchError::RequestDropped(request_id)),
            Err(_) => {
                self.pending.lock().await.remove(&request_id);
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(%request_id, kind, timeout_ms, "request timed out");
                Err(DispatchError::RequestTimeout { request_id, timeout_ms })
            }
        }
    }

    async fn dispatch_one(&self, action: Action) -> Result<Option<Action>, DispatchError> {
        match action {
            Action::Undo => {
                self.stack.undo().await?;
                return Ok(None);
            }
            Action::Redo => {
                self.stack.redo().await?;
                return Ok(None);
            }
            _ => {}
        }

        if let Some(response_id) = action.response_id() {
            let waiting = self.pending.lock().await.remove(response_id);
            if let Some(tx) = waiting {
                debug!(%response_id, kind = action.kind(), "request resolved");
                if let Err(response) = tx.send(action) {
                    debug!(kind = response.kind(), "requester went away before its response arrived");
                }
                return Ok(None);
            }
        }

        let kind = action.kind();
        let handler = self.handlers.read().await.get(kind).cloned();
        let Some(handler) = handler else {
            if action.response_id().is_some() {
                debug!(kind, "response without pending request dropped");
                return Ok(None);
            }
            warn!(kind, "no handler registered for action");
            return Err(DispatchError::MissingHandler(kind.to_string()));
        };

        match handler.handle(action).await? {
            Outcome::Command(command) => {
                debug!(kind, command = command.name(), "executing command");
                self.stack.execute(command).await?;
                Ok(None)
            }
            Outcome::Action(follow_up) => Ok(Some(follow_up)),
            Outcome::Done => Ok(None),
        }
    }
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher").field("timeout", &self.timeout).finish_non_exhaustive()
    }
}
