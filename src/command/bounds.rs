//! Bounds round trip: render a model on the hidden target, then write the
//! measured bounds back into the main model.

#[cfg(test)]
#[path = "bounds_test.rs"]
mod bounds_test;

use std::any::Any;

use scene::geometry::{Dimension, Point};
use scene::model::Model;
use scene::schema::ElementSchema;
use tracing::warn;

use super::{Command, CommandContext, CommandError, CommandKind, CommandResult};
use crate::action::{Action, ElementAndBounds};

/// Put a model on the hidden target so it can be measured. The result's cause
/// carries the request id the measurement must answer to.
#[derive(Debug)]
pub struct RequestBoundsCommand {
    new_root: ElementSchema,
    request_id: Option<String>,
}

impl RequestBoundsCommand {
    #[must_use]
    pub fn new(new_root: ElementSchema, request_id: Option<String>) -> Self {
        Self { new_root, request_id }
    }
}

#[async_trait::async_trait]
impl Command for RequestBoundsCommand {
    fn name(&self) -> &'static str {
        "request-bounds"
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Hidden
    }

    async fn execute(&mut self, _model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let hidden = ctx.factory.create_root(&self.new_root)?;
        let cause =
            Action::RequestBounds { new_root: Box::new(self.new_root.clone()), request_id: self.request_id.clone() };
        Ok(CommandResult::changed(hidden).with_cause(cause))
    }

    async fn undo(&mut self, model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        Ok(CommandResult::unchanged(model))
    }

    async fn redo(&mut self, model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        Ok(CommandResult::unchanged(model))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
struct BoundsMemento {
    element_id: String,
    old_position: Option<Point>,
    old_size: Option<Dimension>,
    new_position: Option<Point>,
    new_size: Option<Dimension>,
}

/// Apply measured bounds to the main model. A system command: it follows
/// whatever the user did and is replayed with it.
#[derive(Debug)]
pub struct SetBoundsCommand {
    bounds: Vec<ElementAndBounds>,
    mementos: Vec<BoundsMemento>,
}

impl SetBoundsCommand {
    #[must_use]
    pub fn new(bounds: Vec<ElementAndBounds>) -> Self {
        Self { bounds, mementos: Vec::new() }
    }

    fn apply(&self, model: &mut Model, old: bool) {
        for m in &self.mementos {
            if let Some(element) = model.get_mut(&m.element_id) {
                if old {
                    element.position = m.old_position;
                    element.size = m.old_size;
                } else {
                    element.position = m.new_position;
                    element.size = m.new_size;
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl Command for SetBoundsCommand {
    fn name(&self) -> &'static str {
        "set-bounds"
    }

    fn kind(&self) -> CommandKind {
        CommandKind::System
    }

    async fn execute(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        self.mementos.clear();
        for b in &self.bounds {
            let Some(element) = model.get(&b.element_id) else {
                warn!(element_id = %b.element_id, "bounds for unknown element skipped");
                continue;
            };
            self.mementos.push(BoundsMemento {
                element_id: b.element_id.clone(),
                old_position: element.position,
                old_size: element.size,
                new_position: b.new_position.or(element.position),
                new_size: Some(b.new_size),
            });
        }
        self.apply(&mut model, false);
        Ok(CommandResult::changed(model))
    }

    async fn undo(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        self.apply(&mut model, true);
        Ok(CommandResult::changed(model))
    }

    async fn redo(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        self.apply(&mut model, false);
        Ok(CommandResult::changed(model))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
