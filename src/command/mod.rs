//! Commands: reversible model mutations.
//!
//! DESIGN
//! ======
//! A [`Command`] is created per dispatched action and lives only as long as it
//! sits on one of the command stack's undo/redo/off stacks. `execute`, `undo`
//! and `redo` receive the current model of the command's render target by
//! value and hand back the model for that target in a [`CommandResult`].
//! Whatever a command needs to invert itself is captured during `execute`,
//! by value, so later mutations elsewhere can never leak into its undo.
//!
//! ERROR HANDLING
//! ==============
//! References to elements that no longer exist are skipped, never fatal.
//! Structural failures surface as [`CommandError`]; the stack logs them and
//! keeps the previous model for the affected target.

pub mod bounds;
pub mod edit;
pub mod model;
pub mod move_element;
pub mod routing;
pub mod select;
pub mod stack;
pub mod viewport;
pub mod zorder;


use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use scene::SceneError;
use scene::factory::ModelFactory;
use scene::model::{BasicType, Element, ElementType, Features, Model};
use scene::routing::EdgeRouterRegistry;
use tokio::sync::mpsc;
use tracing::warn;

use crate::action::Action;
use crate::animation::{Animation, FrameSyncer, run_animation};
use crate::error::ErrorCode;
use crate::viewer::RenderTarget;

pub use bounds::{RequestBoundsCommand, SetBoundsCommand};
pub use edit::{CreateElementCommand, DeleteElementCommand, EditLabelCommand};
pub use model::{SetModelCommand, SetPopupModelCommand, UpdateModelCommand};
pub use move_element::MoveCommand;
pub use routing::{ReconnectCommand, SwitchEditModeCommand};
pub use select::{HoverFeedbackCommand, SelectAllCommand, SelectCommand};
pub use stack::{CommandStack, CommandStackHandle, RenderTargets, StackStatus};
pub use viewport::{CenterCommand, FitToScreenCommand, SetViewportCommand};
pub use zorder::BringToFrontCommand;

/// Id of the placeholder root shown before any model is set.
pub const EMPTY_ROOT_ID: &str = "EMPTY";

/// Type of the placeholder root shown before any model is set.
pub const EMPTY_ROOT_TYPE: &str = "NONE";

/// The placeholder model every render target starts with.
#[must_use]
pub fn empty_model() -> Model {
    Model::new(Element::new(EMPTY_ROOT_ID, ElementType::new(EMPTY_ROOT_TYPE, BasicType::GenericRoot), Features::NONE))
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("command stack is closed")]
    StackClosed,
}

impl ErrorCode for CommandError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Scene(err) => err.error_code(),
            Self::StackClosed => "E_STACK_CLOSED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::StackClosed)
    }
}

// =============================================================================
// TYPES
// =============================================================================

/// How the command stack treats a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Undoable user edit on the main model.
    Plain,
    /// Triggered by the system; invisible to undo/redo.
    System,
    /// Updates only the hidden target; never recorded.
    Hidden,
    /// Updates only the popup target; never recorded.
    Popup,
    /// Replaces the model and clears all history.
    Reset,
}

impl CommandKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::System => "system",
            Self::Hidden => "hidden",
            Self::Popup => "popup",
            Self::Reset => "reset",
        }
    }
}

/// What a command hands back to the stack.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub model: Model,
    pub changed: bool,
    pub cause: Option<Action>,
}

impl CommandResult {
    #[must_use]
    pub fn changed(model: Model) -> Self {
        Self { model, changed: true, cause: None }
    }

    #[must_use]
    pub fn unchanged(model: Model) -> Self {
        Self { model, changed: false, cause: None }
    }

    #[must_use]
    pub fn with_cause(mut self, cause: Action) -> Self {
        self.cause = Some(cause);
        self
    }
}

/// Queue for actions a command wants dispatched after it completes.
#[derive(Debug, Clone)]
pub struct ActionSink {
    tx: mpsc::UnboundedSender<Action>,
}

impl ActionSink {
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Action>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue `action`. Dropped with a warning when nobody is listening.
    pub fn dispatch(&self, action: Action) {
        if let Err(err) = self.tx.send(action) {
            warn!(kind = err.0.kind(), "action sink closed; dropping follow-up action");
        }
    }
}

/// Services available to commands while they run.
#[derive(Clone)]
pub struct CommandContext {
    pub factory: Arc<ModelFactory>,
    pub routers: Arc<EdgeRouterRegistry>,
    pub syncer: Arc<dyn FrameSyncer>,
    /// Duration of animated commands.
    pub duration: Duration,
    /// Receives intermediate animation frames of the main model.
    pub frames: Arc<dyn RenderTarget>,
    pub actions: ActionSink,
}

impl CommandContext {
    /// Run `animation` on `model` with the configured duration and frames.
    pub async fn animate(&self, animation: &dyn Animation, model: &mut Model) {
        run_animation(animation, model, self.syncer.as_ref(), self.duration, Some(self.frames.as_ref())).await;
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext").field("routers", &self.routers).field("duration", &self.duration).finish()
    }
}

// =============================================================================
// COMMAND TRAIT
// =============================================================================

/// A reversible model mutation.
#[async_trait::async_trait]
pub trait Command: Any + Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    fn kind(&self) -> CommandKind {
        CommandKind::Plain
    }

    async fn execute(&mut self, model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError>;

    async fn undo(&mut self, model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError>;

    async fn redo(&mut self, model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError>;

    /// Absorb `other`, executed right after this command. Returns whether
    /// `other` is now part of this command's undo step.
    fn merge(&mut self, _other: &dyn Command, _ctx: &CommandContext) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;
}
