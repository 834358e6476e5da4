//! Selection and hover feedback.

#[cfg(test)]
#[path = "select_test.rs"]
mod select_test;

use std::any::Any;

use scene::model::{Feature, Model};
use tracing::warn;

use super::{Command, CommandContext, CommandError, CommandKind, CommandResult};

/// Flag values of the elements a command touched: `(id, before, after)`.
type FlagChanges = Vec<(String, bool, bool)>;

fn set_selected(model: &mut Model, changes: &FlagChanges, after: bool) {
    for (id, old, new) in changes {
        if let Some(element) = model.get_mut(id) {
            element.selected = if after { *new } else { *old };
        }
    }
}

/// Select and deselect elements by id. Deselection runs first, so an id in
/// both lists ends up selected.
#[derive(Debug)]
pub struct SelectCommand {
    selected: Vec<String>,
    deselected: Vec<String>,
    changes: FlagChanges,
}

impl SelectCommand {
    #[must_use]
    pub fn new(selected: Vec<String>, deselected: Vec<String>) -> Self {
        Self { selected, deselected, changes: Vec::new() }
    }

    fn record(&mut self, model: &Model, id: &str, value: bool) {
        let Some(element) = model.get(id) else {
            warn!(element_id = %id, "selection of unknown element skipped");
            return;
        };
        if !element.has(Feature::Select) {
            return;
        }
        match self.changes.iter_mut().find(|(cid, _, _)| cid == id) {
            Some(change) => change.2 = value,
            None => self.changes.push((id.to_string(), element.selected, value)),
        }
    }
}

#[async_trait::async_trait]
impl Command for SelectCommand {
    fn name(&self) -> &'static str {
        "select"
    }

    async fn execute(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        self.changes.clear();
        for id in std::mem::take(&mut self.deselected) {
            self.record(&model, &id, false);
            self.deselected.push(id);
        }
        for id in std::mem::take(&mut self.selected) {
            self.record(&model, &id, true);
            self.selected.push(id);
        }
        set_selected(&mut model, &self.changes, true);
        Ok(CommandResult::changed(model))
    }

    async fn undo(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        set_selected(&mut model, &self.changes, false);
        Ok(CommandResult::changed(model))
    }

    async fn redo(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        set_selected(&mut model, &self.changes, true);
        Ok(CommandResult::changed(model))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Select or deselect every selectable element.
#[derive(Debug)]
pub struct SelectAllCommand {
    select: bool,
    changes: FlagChanges,
}

impl SelectAllCommand {
    #[must_use]
    pub fn new(select: bool) -> Self {
        Self { select, changes: Vec::new() }
    }
}

#[async_trait::async_trait]
impl Command for SelectAllCommand {
    fn name(&self) -> &'static str {
        "select-all"
    }

    async fn execute(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        self.changes = model
            .preorder()
            .filter(|e| e.has(Feature::Select))
            .map(|e| (e.id.clone(), e.selected, self.select))
            .collect();
        set_selected(&mut model, &self.changes, true);
        Ok(CommandResult::changed(model))
    }

    async fn undo(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        set_selected(&mut model, &self.changes, false);
        Ok(CommandResult::changed(model))
    }

    async fn redo(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        set_selected(&mut model, &self.changes, true);
        Ok(CommandResult::changed(model))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Mouse-over highlight. A system command, invisible to undo/redo.
#[derive(Debug)]
pub struct HoverFeedbackCommand {
    element_id: String,
    mouse_is_over: bool,
    previous: Option<bool>,
}

impl HoverFeedbackCommand {
    #[must_use]
    pub fn new(element_id: impl Into<String>, mouse_is_over: bool) -> Self {
        Self { element_id: element_id.into(), mouse_is_over, previous: None }
    }

    fn set(&self, model: &mut Model, value: bool) -> bool {
        match model.get_mut(&self.element_id) {
            Some(element) if element.has(Feature::Hover) => {
                element.hover_feedback = value;
                true
            }
            _ => false,
        }
    }
}

#[async_trait::async_trait]
impl Command for HoverFeedbackCommand {
    fn name(&self) -> &'static str {
        "hover-feedback"
    }

    fn kind(&self) -> CommandKind {
        CommandKind::System
    }

    async fn execute(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        self.previous = model.get(&self.element_id).map(|e| e.hover_feedback);
        if self.set(&mut model, self.mouse_is_over) {
            Ok(CommandResult::changed(model))
        } else {
            warn!(element_id = %self.element_id, "hover feedback for unknown or non-hoverable element");
            Ok(CommandResult::unchanged(model))
        }
    }

    async fn undo(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let changed = self.previous.is_some_and(|previous| self.set(&mut model, previous));
        Ok(if changed { CommandResult::changed(model) } else { CommandResult::unchanged(model) })
    }

    async fn redo(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let changed = self.set(&mut model, self.mouse_is_over);
        Ok(if changed { CommandResult::changed(model) } else { CommandResult::unchanged(model) })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
