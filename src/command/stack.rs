//! Command stack — the single timeline of model mutations.
//!
//! DESIGN
//! ======
//! The stack is an actor: one tokio task owns the undo/redo/off stacks and
//! the three render targets, and processes one message at a time from a
//! bounded mailbox. That serialization is the only thing preventing two
//! commands from mutating the model concurrently; a command always observes
//! the model left by the command before it.
//!
//! - Hidden and popup commands never touch the stacks.
//! - Reset commands clear all three stacks and are not recorded.
//! - System commands executed while the redo stack is non-empty go to the
//!   off stack. Undo and redo first replay every system command on the off
//!   stack and every system command leading the relevant stack.
//! - A new command first offers itself to the top of the undo (or off) stack
//!   for merging.
//! - The undo history is capped; the oldest entries go first.
//!
//! Render targets are flushed once per message, after every command of the
//! batch has settled, and only for targets whose model changed.
//!
//! ERROR HANDLING
//! ==============
//! A failing execute/undo/redo is logged; the target keeps its previous model
//! and the command is dropped from history.

#[cfg(test)]
#[path = "stack_test.rs"]
mod stack_test;

use std::sync::Arc;

use scene::model::Model;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use super::{Command, CommandContext, CommandError, CommandKind, empty_model};
use crate::action::Action;
use crate::error::ErrorCode;
use crate::viewer::RenderTarget;

const DEFAULT_STACK_QUEUE_CAPACITY: usize = 256;

// =============================================================================
// TYPES
// =============================================================================

/// Where the three target models are rendered.
#[derive(Clone)]
pub struct RenderTargets {
    pub main: Arc<dyn RenderTarget>,
    pub hidden: Arc<dyn RenderTarget>,
    pub popup: Arc<dyn RenderTarget>,
}

/// Sizes of the three stacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackStatus {
    pub undo: usize,
    pub redo: usize,
    pub off: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Execute,
    Undo,
    Redo,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Self::Execute => "execute",
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

struct TargetState {
    model: Model,
    changed: bool,
    cause: Option<Action>,
}

impl TargetState {
    fn new() -> Self {
        Self { model: empty_model(), changed: false, cause: None }
    }
}

enum StackMessage {
    Execute { commands: Vec<Box<dyn Command>>, done: oneshot::Sender<()> },
    Undo { done: oneshot::Sender<()> },
    Redo { done: oneshot::Sender<()> },
    Model { reply: oneshot::Sender<Model> },
    PopupModel { reply: oneshot::Sender<Model> },
    Status { reply: oneshot::Sender<StackStatus> },
}

// =============================================================================
// HANDLE
// =============================================================================

/// Cloneable handle to a running command stack.
#[derive(Debug, Clone)]
pub struct CommandStackHandle {
    tx: mpsc::Sender<StackMessage>,
}

impl CommandStackHandle {
    /// Execute one command and wait until its result has been rendered.
    pub async fn execute(&self, command: Box<dyn Command>) -> Result<(), CommandError> {
        self.execute_all(vec![command]).await
    }

    /// Execute `commands` in order, rendering once after the last.
    pub async fn execute_all(&self, commands: Vec<Box<dyn Command>>) -> Result<(), CommandError> {
        let (done, rx) = oneshot::channel();
        self.send(StackMessage::Execute { commands, done }).await?;
        rx.await.map_err(|_| CommandError::StackClosed)
    }

    pub async fn undo(&self) -> Result<(), CommandError> {
        let (done, rx) = oneshot::channel();
        self.send(StackMessage::Undo { done }).await?;
        rx.await.map_err(|_| CommandError::StackClosed)
    }

    pub async fn redo(&self) -> Result<(), CommandError> {
        let (done, rx) = oneshot::channel();
        self.send(StackMessage::Redo { done }).await?;
        rx.await.map_err(|_| CommandError::StackClosed)
    }

    /// Current main model, after every previously queued message.
    pub async fn model(&self) -> Result<Model, CommandError> {
        let (reply, rx) = oneshot::channel();
        self.send(StackMessage::Model { reply }).await?;
        rx.await.map_err(|_| CommandError::StackClosed)
    }

    pub async fn popup_model(&self) -> Result<Model, CommandError> {
        let (reply, rx) = oneshot::channel();
        self.send(StackMessage::PopupModel { reply }).await?;
        rx.await.map_err(|_| CommandError::StackClosed)
    }

    pub async fn status(&self) -> Result<StackStatus, CommandError> {
        let (reply, rx) = oneshot::channel();
        self.send(StackMessage::Status { reply }).await?;
        rx.await.map_err(|_| CommandError::StackClosed)
    }

    async fn send(&self, message: StackMessage) -> Result<(), CommandError> {
        self.tx.send(message).await.map_err(|_| CommandError::StackClosed)
    }
}

// =============================================================================
// ACTOR
// =============================================================================

pub struct CommandStack {
    rx: mpsc::Receiver<StackMessage>,
    ctx: CommandContext,
    targets: RenderTargets,
    history_limit: Option<usize>,
    undo_stack: Vec<Box<dyn Command>>,
    redo_stack: Vec<Box<dyn Command>>,
    off_stack: Vec<Box<dyn Command>>,
    main: TargetState,
    hidden: TargetState,
    popup: TargetState,
}

impl CommandStack {
    /// Spawn the stack actor. It stops once every handle is dropped.
    #[must_use]
    pub fn spawn(ctx: CommandContext, targets: RenderTargets, history_limit: Option<usize>) -> CommandStackHandle {
        let (tx, rx) = mpsc::channel(DEFAULT_STACK_QUEUE_CAPACITY);
        let stack = Self {
            rx,
            ctx,
            targets,
            history_limit,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            off_stack: Vec::new(),
            main: TargetState::new(),
            hidden: TargetState::new(),
            popup: TargetState::new(),
        };
        tokio::spawn(stack.run());
        CommandStackHandle { tx }
    }

    async fn run(mut self) {
        while let Some(message) = self.rx.recv().await {
            match message {
                StackMessage::Execute { commands, done } => {
                    for command in commands {
                        if let Some(command) = self.handle(command, Phase::Execute).await {
                            self.merge_or_push(command);
                        }
                    }
                    self.then_update().await;
                    reply(done, ());
                }
                StackMessage::Undo { done } => {
                    self.undo().await;
                    self.then_update().await;
                    reply(done, ());
                }
                StackMessage::Redo { done } => {
                    self.redo().await;
                    self.then_update().await;
                    reply(done, ());
                }
                StackMessage::Model { reply: tx } => reply(tx, self.main.model.clone()),
                StackMessage::PopupModel { reply: tx } => reply(tx, self.popup.model.clone()),
                StackMessage::Status { reply: tx } => reply(tx, self.status()),
            }
        }
        debug!("command stack stopped");
    }

    fn status(&self) -> StackStatus {
        StackStatus { undo: self.undo_stack.len(), redo: self.redo_stack.len(), off: self.off_stack.len() }
    }

    fn target_mut(&mut self, kind: CommandKind) -> &mut TargetState {
        match kind {
            CommandKind::Hidden => &mut self.hidden,
            CommandKind::Popup => &mut self.popup,
            CommandKind::Plain | CommandKind::System | CommandKind::Reset => &mut self.main,
        }
    }

    /// Run one phase of `command` against its target. Returns the command
    /// on success so the caller can file it; failures drop it.
    async fn handle(&mut self, mut command: Box<dyn Command>, phase: Phase) -> Option<Box<dyn Command>> {
        let kind = command.kind();
        let input = self.target_mut(kind).model.clone();
        let result = match phase {
            Phase::Execute => command.execute(input, &self.ctx).await,
            Phase::Undo => command.undo(input, &self.ctx).await,
            Phase::Redo => command.redo(input, &self.ctx).await,
        };
        match result {
            Ok(result) => {
                let target = self.target_mut(kind);
                target.model = result.model;
                if result.changed {
                    target.changed = true;
                    target.cause = result.cause;
                }
                Some(command)
            }
            Err(err) => {
                error!(
                    command = command.name(),
                    phase = phase.as_str(),
                    code = err.error_code(),
                    error = %err,
                    "command failed; keeping previous model"
                );
                None
            }
        }
    }

    // ── History ─────────────────────────────────────────────────

    fn merge_or_push(&mut self, command: Box<dyn Command>) {
        match command.kind() {
            CommandKind::Hidden | CommandKind::Popup => return,
            CommandKind::Reset => {
                self.undo_stack.clear();
                self.redo_stack.clear();
                self.off_stack.clear();
                debug!(command = command.name(), "history cleared by reset");
                return;
            }
            CommandKind::System if !self.redo_stack.is_empty() => {
                if let Some(top) = self.off_stack.last_mut() {
                    if top.merge(command.as_ref(), &self.ctx) {
                        debug!(command = command.name(), "merged into off-stack top");
                        return;
                    }
                }
                debug!(command = command.name(), "system command parked on off stack");
                self.off_stack.push(command);
                return;
            }
            CommandKind::Plain | CommandKind::System => {}
        }
        let parked: Vec<Box<dyn Command>> = self.off_stack.drain(..).collect();
        for parked in parked {
            self.push_undo(parked);
        }
        self.redo_stack.clear();
        if let Some(top) = self.undo_stack.last_mut() {
            if top.merge(command.as_ref(), &self.ctx) {
                debug!(command = command.name(), "merged into undo-stack top");
                return;
            }
        }
        self.push_undo(command);
    }

    fn push_undo(&mut self, command: Box<dyn Command>) {
        debug!(command = command.name(), depth = self.undo_stack.len() + 1, "command pushed");
        self.undo_stack.push(command);
        if let Some(limit) = self.history_limit {
            if self.undo_stack.len() > limit {
                let excess = self.undo_stack.len() - limit;
                self.undo_stack.drain(..excess);
                debug!(dropped = excess, limit, "undo history truncated");
            }
        }
    }

    async fn undo(&mut self) {
        self.undo_off_stack().await;
        while self.undo_stack.last().is_some_and(|c| c.kind() == CommandKind::System) {
            self.undo_top().await;
        }
        self.undo_top().await;
    }

    async fn undo_top(&mut self) {
        let Some(command) = self.undo_stack.pop() else {
            return;
        };
        debug!(command = command.name(), "undo");
        if let Some(command) = self.handle(command, Phase::Undo).await {
            self.redo_stack.push(command);
        }
    }

    async fn redo(&mut self) {
        self.undo_off_stack().await;
        self.redo_top().await;
        while self.redo_stack.last().is_some_and(|c| c.kind() == CommandKind::System) {
            self.redo_top().await;
        }
    }

    async fn redo_top(&mut self) {
        let Some(command) = self.redo_stack.pop() else {
            return;
        };
        debug!(command = command.name(), "redo");
        if let Some(command) = self.handle(command, Phase::Redo).await {
            self.push_undo(command);
        }
    }

    async fn undo_off_stack(&mut self) {
        while let Some(command) = self.off_stack.pop() {
            debug!(command = command.name(), "undo off-stack system command");
            self.handle(command, Phase::Undo).await;
        }
    }

    // ── Rendering ───────────────────────────────────────────────

    async fn then_update(&mut self) {
        futures::join!(
            flush(&mut self.main, self.targets.main.as_ref()),
            flush(&mut self.hidden, self.targets.hidden.as_ref()),
            flush(&mut self.popup, self.targets.popup.as_ref()),
        );
    }
}

async fn flush(target: &mut TargetState, renderer: &dyn RenderTarget) {
    if !target.changed {
        return;
    }
    renderer.update(&target.model, target.cause.as_ref()).await;
    target.changed = false;
    target.cause = None;
}

fn reply<T>(tx: oneshot::Sender<T>, value: T) {
    if tx.send(value).is_err() {
        debug!("caller went away before the command stack replied");
    }
}
