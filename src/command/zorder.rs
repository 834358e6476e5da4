//! Z-order: bring elements, and the edges attached to them, to the front.

#[cfg(test)]
#[path = "zorder_test.rs"]
mod zorder_test;

use std::any::Any;

use scene::model::Model;
use tracing::warn;

use super::{Command, CommandContext, CommandError, CommandResult};

/// Move elements to the end of their parent's children so they render last.
/// Edges attached to an element or to any of its descendants come along.
#[derive(Debug)]
pub struct BringToFrontCommand {
    element_ids: Vec<String>,
    /// `(id, original index)` in the order the elements were brought forward.
    selected: Vec<(String, usize)>,
}

impl BringToFrontCommand {
    #[must_use]
    pub fn new(element_ids: Vec<String>) -> Self {
        Self { element_ids, selected: Vec::new() }
    }

    fn capture(&mut self, model: &Model, id: &str) {
        if self.selected.iter().any(|(sid, _)| sid == id) {
            return;
        }
        if let Some(index) = model.index_of(id) {
            self.selected.push((id.to_string(), index));
        }
    }

    fn to_front(&self, model: &mut Model) -> Result<(), CommandError> {
        for (id, _) in &self.selected {
            if model.contains(id) {
                model.move_child(id, usize::MAX)?;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Command for BringToFrontCommand {
    fn name(&self) -> &'static str {
        "bring-to-front"
    }

    async fn execute(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        self.selected.clear();
        for id in self.element_ids.clone() {
            if !model.contains(&id) || id == model.root_id() {
                warn!(element_id = %id, "bring to front of unknown or root element skipped");
                continue;
            }
            self.capture(&model, &id);
            for edge in model.attached_edges(&id) {
                self.capture(&model, &edge);
            }
        }
        self.to_front(&mut model)?;
        Ok(CommandResult::changed(model))
    }

    /// Original indices are restored lowest first.
    async fn undo(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let mut restore: Vec<&(String, usize)> = self.selected.iter().collect();
        restore.sort_by_key(|(_, index)| *index);
        for (id, index) in restore {
            if model.contains(id) {
                model.move_child(id, *index)?;
            }
        }
        Ok(CommandResult::changed(model))
    }

    async fn redo(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        self.to_front(&mut model)?;
        Ok(CommandResult::changed(model))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
