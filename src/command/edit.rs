//! Structural edits: create and delete elements, edit label text.

#[cfg(test)]
#[path = "edit_test.rs"]
mod edit_test;

use std::any::Any;

use scene::SceneError;
use scene::matching::contains_some;
use scene::model::{Feature, Model, Removed, Subtree};
use scene::schema::ElementSchema;
use tracing::{debug, warn};

use super::{Command, CommandContext, CommandError, CommandResult};

// =============================================================================
// CREATE
// =============================================================================

/// Add a new element, built from a schema, as the last child of a container.
#[derive(Debug)]
pub struct CreateElementCommand {
    container_id: String,
    schema: ElementSchema,
    created: Option<Subtree>,
}

impl CreateElementCommand {
    #[must_use]
    pub fn new(container_id: impl Into<String>, schema: ElementSchema) -> Self {
        Self { container_id: container_id.into(), schema, created: None }
    }
}

#[async_trait::async_trait]
impl Command for CreateElementCommand {
    fn name(&self) -> &'static str {
        "create-element"
    }

    async fn execute(&mut self, mut model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        if !model.contains(&self.container_id) {
            warn!(container_id = %self.container_id, "create in unknown container skipped");
            return Ok(CommandResult::unchanged(model));
        }
        if contains_some(&model, &self.schema) {
            let taken = self.schema.ids().into_iter().find(|id| model.contains(id)).unwrap_or_default();
            return Err(SceneError::DuplicateId(taken).into());
        }
        let subtree = ctx.factory.create_element(&self.schema)?;
        model.insert(&self.container_id, None, subtree.clone())?;
        self.created = Some(subtree);
        Ok(CommandResult::changed(model))
    }

    async fn undo(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let Some(id) = self.created.as_ref().map(|s| s.element.id.clone()) else {
            return Ok(CommandResult::unchanged(model));
        };
        if model.contains(&id) {
            self.created = Some(model.remove(&id)?.subtree);
        }
        Ok(CommandResult::changed(model))
    }

    async fn redo(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let Some(subtree) = self.created.clone() else {
            return Ok(CommandResult::unchanged(model));
        };
        model.insert(&self.container_id, None, subtree)?;
        Ok(CommandResult::changed(model))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// DELETE
// =============================================================================

/// Remove elements together with every edge attached to them or to their
/// descendants, so no edge is left pointing at a removed id.
#[derive(Debug)]
pub struct DeleteElementCommand {
    element_ids: Vec<String>,
    removed: Vec<Removed>,
}

impl DeleteElementCommand {
    #[must_use]
    pub fn new(element_ids: Vec<String>) -> Self {
        Self { element_ids, removed: Vec::new() }
    }

    /// Attached edges first, then the elements themselves.
    fn targets(&self, model: &Model) -> Vec<String> {
        let mut edges = Vec::new();
        let mut elements = Vec::new();
        for id in &self.element_ids {
            let Some(element) = model.get(id) else {
                warn!(element_id = %id, "delete of unknown element skipped");
                continue;
            };
            if id == model.root_id() || !element.has(Feature::Delete) {
                debug!(element_id = %id, "element is not deletable");
                continue;
            }
            for edge in model.attached_edges(id) {
                if !edges.contains(&edge) && !self.element_ids.contains(&edge) {
                    edges.push(edge);
                }
            }
            elements.push(id.clone());
        }
        edges.extend(elements);
        edges
    }

    fn remove_all(&mut self, model: &mut Model, ids: &[String]) -> Result<(), CommandError> {
        self.removed.clear();
        for id in ids {
            // already gone as part of an earlier subtree
            if !model.contains(id) {
                continue;
            }
            self.removed.push(model.remove(id)?);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Command for DeleteElementCommand {
    fn name(&self) -> &'static str {
        "delete-element"
    }

    async fn execute(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let targets = self.targets(&model);
        self.remove_all(&mut model, &targets)?;
        debug!(removed = self.removed.len(), "elements deleted");
        Ok(CommandResult::changed(model))
    }

    async fn undo(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        for removed in self.removed.iter().rev() {
            model.insert(&removed.parent, Some(removed.index), removed.subtree.clone())?;
        }
        Ok(CommandResult::changed(model))
    }

    async fn redo(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let ids: Vec<String> = self.removed.iter().map(|r| r.subtree.element.id.clone()).collect();
        self.remove_all(&mut model, &ids)?;
        Ok(CommandResult::changed(model))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// LABEL EDIT
// =============================================================================

/// Replace the text of an editable label.
#[derive(Debug)]
pub struct EditLabelCommand {
    label_id: String,
    text: String,
    old_text: Option<String>,
}

impl EditLabelCommand {
    #[must_use]
    pub fn new(label_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { label_id: label_id.into(), text: text.into(), old_text: None }
    }

    fn set(&self, model: &mut Model, text: Option<String>) {
        if let Some(label) = model.get_mut(&self.label_id) {
            label.text = text;
        }
    }
}

#[async_trait::async_trait]
impl Command for EditLabelCommand {
    fn name(&self) -> &'static str {
        "edit-label"
    }

    async fn execute(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let Some(label) = model.get(&self.label_id).filter(|e| e.has(Feature::EditLabel)) else {
            warn!(label_id = %self.label_id, "label edit on unknown or non-editable element skipped");
            return Ok(CommandResult::unchanged(model));
        };
        self.old_text.clone_from(&label.text);
        self.set(&mut model, Some(self.text.clone()));
        Ok(CommandResult::changed(model))
    }

    async fn undo(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        self.set(&mut model, self.old_text.clone());
        Ok(CommandResult::changed(model))
    }

    async fn redo(&mut self, mut model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        self.set(&mut model, Some(self.text.clone()));
        Ok(CommandResult::changed(model))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
