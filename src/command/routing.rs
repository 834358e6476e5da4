//! Edge endpoint and routing-handle commands.
//!
//! DESIGN
//! ======
//! Both commands capture full [`EdgeSnapshot`]s of every edge they touch,
//! before and after. Undo and redo replay a snapshot through the router named
//! in that snapshot, since a reconnect may change which router the edge uses.
//!
//! Deactivating a handle that dragged an edge end commits the drag: the end
//! goes back to its original connectable and the dangling anchor is removed.
//! If the end was released over another connectable, a `reconnect` action is
//! queued so the change lands as its own undoable step.

#[cfg(test)]
#[path = "routing_test.rs"]
mod routing_test;

use std::any::Any;

use indexmap::IndexMap;
use scene::model::{Model, Subtree};
use scene::routing::{DanglingOutcome, EdgeSnapshot, commit_dangling_anchor, linear};
use tracing::{debug, warn};

use super::{Command, CommandContext, CommandError, CommandResult};
use crate::action::Action;

fn apply_snapshots<'a>(
    model: &mut Model,
    ctx: &CommandContext,
    snapshots: impl Iterator<Item = &'a EdgeSnapshot>,
) -> Result<(), CommandError> {
    for snapshot in snapshots {
        if model.contains(&snapshot.edge_id) {
            ctx.routers.get(snapshot.router_kind.as_deref()).apply_snapshot(model, snapshot)?;
        }
    }
    Ok(())
}

// =============================================================================
// RECONNECT
// =============================================================================

/// Point an edge at a new source and/or target.
#[derive(Debug)]
pub struct ReconnectCommand {
    routable_id: String,
    new_source_id: Option<String>,
    new_target_id: Option<String>,
    before: Option<EdgeSnapshot>,
    after: Option<EdgeSnapshot>,
}

impl ReconnectCommand {
    #[must_use]
    pub fn new(routable_id: impl Into<String>, new_source_id: Option<String>, new_target_id: Option<String>) -> Self {
        Self { routable_id: routable_id.into(), new_source_id, new_target_id, before: None, after: None }
    }
}

#[async_trait::async_trait]
impl Command for ReconnectCommand {
    fn name(&self) -> &'static str {
        "reconnect"
    }

    async fn execute(&mut self, mut model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let router = ctx.routers.for_edge(&model, &self.routable_id);
        let Some(before) = router.take_snapshot(&model, &self.routable_id) else {
            warn!(routable_id = %self.routable_id, "reconnect of unknown edge skipped");
            return Ok(CommandResult::unchanged(model));
        };
        router.apply_reconnect(
            &mut model,
            &self.routable_id,
            self.new_source_id.as_deref(),
            self.new_target_id.as_deref(),
        )?;
        if !before.handles.is_empty() {
            ctx.routers.for_edge(&model, &self.routable_id).create_routing_handles(&mut model, &self.routable_id)?;
        }
        self.after = ctx.routers.for_edge(&model, &self.routable_id).take_snapshot(&model, &self.routable_id);
        debug!(
            routable_id = %self.routable_id,
            source = ?self.after.as_ref().map(|s| s.source_id.as_str()),
            target = ?self.after.as_ref().map(|s| s.target_id.as_str()),
            "edge reconnected"
        );
        self.before = Some(before);
        Ok(CommandResult::changed(model))
    }

    async fn undo(&mut self, mut model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        apply_snapshots(&mut model, ctx, self.before.iter())?;
        Ok(CommandResult::changed(model))
    }

    async fn redo(&mut self, mut model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        apply_snapshots(&mut model, ctx, self.after.iter())?;
        Ok(CommandResult::changed(model))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// SWITCH EDIT MODE
// =============================================================================

/// Put edges and routing handles into or out of edit mode.
#[derive(Debug)]
pub struct SwitchEditModeCommand {
    elements_to_activate: Vec<String>,
    elements_to_deactivate: Vec<String>,
    before: IndexMap<String, EdgeSnapshot>,
    after: IndexMap<String, EdgeSnapshot>,
    anchors: Vec<Subtree>,
}

impl SwitchEditModeCommand {
    #[must_use]
    pub fn new(elements_to_activate: Vec<String>, elements_to_deactivate: Vec<String>) -> Self {
        Self {
            elements_to_activate,
            elements_to_deactivate,
            before: IndexMap::new(),
            after: IndexMap::new(),
            anchors: Vec::new(),
        }
    }

    fn touch(&mut self, model: &Model, ctx: &CommandContext, edge_id: &str) {
        if self.before.contains_key(edge_id) {
            return;
        }
        if let Some(snapshot) = ctx.routers.for_edge(model, edge_id).take_snapshot(model, edge_id) {
            self.before.insert(edge_id.to_string(), snapshot);
        }
    }

    fn deactivate_handle(
        &mut self,
        model: &mut Model,
        ctx: &CommandContext,
        handle_id: &str,
    ) -> Result<(), CommandError> {
        let anchor = model
            .get(handle_id)
            .and_then(|e| e.handle.as_ref())
            .and_then(|h| h.dangling_anchor.clone())
            .and_then(|id| model.subtree(&id));
        match commit_dangling_anchor(model, handle_id)? {
            DanglingOutcome::Untouched => {}
            DanglingOutcome::Restored { edge_id, original } => {
                debug!(edge_id = %edge_id, original = %original, "dragged end restored");
                self.anchors.extend(anchor);
            }
            DanglingOutcome::Dropped { edge_id, dropped_on, is_source, .. } => {
                self.anchors.extend(anchor);
                let (new_source_id, new_target_id) =
                    if is_source { (Some(dropped_on), None) } else { (None, Some(dropped_on)) };
                ctx.actions.dispatch(Action::Reconnect { routable_id: edge_id, new_source_id, new_target_id });
            }
        }
        Ok(())
    }

    fn deactivate(&mut self, model: &mut Model, ctx: &CommandContext, id: &str) -> Result<(), CommandError> {
        let Some(element) = model.get(id) else {
            warn!(element_id = %id, "edit mode switch of unknown element skipped");
            return Ok(());
        };
        if element.is_edge() {
            self.touch(model, ctx, id);
            let handles: Vec<String> = linear::handles(model, id).into_iter().map(|(hid, _)| hid).collect();
            for handle_id in handles {
                self.deactivate_handle(model, ctx, &handle_id)?;
            }
            linear::remove_handles(model, id)?;
        } else if element.handle.is_some() {
            let Some(edge_id) = element.parent().map(str::to_string) else {
                return Ok(());
            };
            self.touch(model, ctx, &edge_id);
            self.deactivate_handle(model, ctx, id)?;
        }
        Ok(())
    }

    fn activate(&mut self, model: &mut Model, ctx: &CommandContext, id: &str) -> Result<(), CommandError> {
        let Some(element) = model.get(id) else {
            warn!(element_id = %id, "edit mode switch of unknown element skipped");
            return Ok(());
        };
        if element.is_edge() {
            self.touch(model, ctx, id);
            ctx.routers.for_edge(model, id).create_routing_handles(model, id)?;
        } else if element.handle.is_some() {
            let Some(edge_id) = element.parent().map(str::to_string) else {
                return Ok(());
            };
            self.touch(model, ctx, &edge_id);
            if let Some(handle) = model.get_mut(id).and_then(|e| e.handle.as_mut()) {
                handle.edit_mode = true;
            }
            if ctx.routers.for_edge(model, &edge_id).activate_handle(model, &edge_id, id)? {
                debug!(edge_id = %edge_id, handle_id = %id, "routing topology changed by handle");
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Command for SwitchEditModeCommand {
    fn name(&self) -> &'static str {
        "switch-edit-mode"
    }

    async fn execute(&mut self, mut model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        for id in self.elements_to_deactivate.clone() {
            self.deactivate(&mut model, ctx, &id)?;
        }
        for id in self.elements_to_activate.clone() {
            self.activate(&mut model, ctx, &id)?;
        }
        for edge_id in self.before.keys() {
            if let Some(snapshot) = ctx.routers.for_edge(&model, edge_id).take_snapshot(&model, edge_id) {
                self.after.insert(edge_id.clone(), snapshot);
            }
        }
        Ok(CommandResult::changed(model))
    }

    async fn undo(&mut self, mut model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let root = model.root_id().to_string();
        for anchor in &self.anchors {
            if !model.contains(&anchor.element.id) {
                model.insert(&root, None, anchor.clone())?;
            }
        }
        apply_snapshots(&mut model, ctx, self.before.values())?;
        Ok(CommandResult::changed(model))
    }

    async fn redo(&mut self, mut model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        apply_snapshots(&mut model, ctx, self.after.values())?;
        for anchor in &self.anchors {
            if model.contains(&anchor.element.id) {
                model.remove(&anchor.element.id)?;
            }
        }
        Ok(CommandResult::changed(model))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
