//! Viewport commands: set, center and fit-to-screen.
//!
//! The viewport lives on the root (scroll and zoom). Center and fit need the
//! canvas size the viewer reported on the root; until it is known they do
//! nothing.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use std::any::Any;

use scene::geometry::Bounds;
use scene::model::{Feature, Model};
use scene::viewport::{Viewport, apply_viewport, center_viewport, elements_bounds, fit_viewport, viewport_of};
use tracing::{debug, warn};

use super::{Command, CommandContext, CommandError, CommandResult};
use crate::animation::ViewportAnimation;

async fn change_viewport(model: &mut Model, ctx: &CommandContext, from: Viewport, to: Viewport, animate: bool) {
    if animate {
        ctx.animate(&ViewportAnimation::new(from, to), model).await;
    }
    apply_viewport(model, to);
}

fn canvas(model: &Model) -> Bounds {
    model.root().canvas_bounds.unwrap_or(Bounds::EMPTY)
}

/// Old and new viewport of an executed viewport command.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ViewportChange {
    old: Viewport,
    new: Viewport,
}

async fn undo_change(
    change: Option<ViewportChange>,
    mut model: Model,
    ctx: &CommandContext,
    animate: bool,
) -> CommandResult {
    match change {
        Some(c) => {
            change_viewport(&mut model, ctx, c.new, c.old, animate).await;
            CommandResult::changed(model)
        }
        None => CommandResult::unchanged(model),
    }
}

async fn redo_change(
    change: Option<ViewportChange>,
    mut model: Model,
    ctx: &CommandContext,
    animate: bool,
) -> CommandResult {
    match change {
        Some(c) => {
            change_viewport(&mut model, ctx, c.old, c.new, animate).await;
            CommandResult::changed(model)
        }
        None => CommandResult::unchanged(model),
    }
}

// =============================================================================
// SET VIEWPORT
// =============================================================================

/// Set scroll and zoom of a viewport element. Zoom is clamped to the
/// supported range.
#[derive(Debug)]
pub struct SetViewportCommand {
    element_id: String,
    viewport: Viewport,
    animate: bool,
    change: Option<ViewportChange>,
}

impl SetViewportCommand {
    #[must_use]
    pub fn new(element_id: impl Into<String>, viewport: Viewport, animate: bool) -> Self {
        Self { element_id: element_id.into(), viewport: viewport.limited(), animate, change: None }
    }
}

#[async_trait::async_trait]
impl Command for SetViewportCommand {
    fn name(&self) -> &'static str {
        "set-viewport"
    }

    async fn execute(&mut self, mut model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let is_viewport = model.get(&self.element_id).is_some_and(|e| e.has(Feature::Viewport));
        if !is_viewport || self.element_id != model.root_id() {
            warn!(element_id = %self.element_id, "viewport change of unknown or non-viewport element skipped");
            return Ok(CommandResult::unchanged(model));
        }
        let old = viewport_of(&model);
        change_viewport(&mut model, ctx, old, self.viewport, self.animate).await;
        self.change = Some(ViewportChange { old, new: self.viewport });
        Ok(CommandResult::changed(model))
    }

    async fn undo(&mut self, model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        Ok(undo_change(self.change, model, ctx, self.animate).await)
    }

    async fn redo(&mut self, model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        Ok(redo_change(self.change, model, ctx, self.animate).await)
    }

    /// Consecutive unanimated changes of the same viewport form one undo step.
    fn merge(&mut self, other: &dyn Command, _ctx: &CommandContext) -> bool {
        let Some(other) = other.as_any().downcast_ref::<SetViewportCommand>() else {
            return false;
        };
        if self.animate || other.animate || self.element_id != other.element_id {
            return false;
        }
        let (Some(own), Some(theirs)) = (self.change.as_mut(), other.change) else {
            return false;
        };
        own.new = theirs.new;
        self.viewport = other.viewport;
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// CENTER / FIT
// =============================================================================

/// Center elements (all top-level elements when none are given) on the canvas.
#[derive(Debug)]
pub struct CenterCommand {
    element_ids: Vec<String>,
    animate: bool,
    retain_zoom: bool,
    change: Option<ViewportChange>,
}

impl CenterCommand {
    #[must_use]
    pub fn new(element_ids: Vec<String>, animate: bool, retain_zoom: bool) -> Self {
        Self { element_ids, animate, retain_zoom, change: None }
    }
}

#[async_trait::async_trait]
impl Command for CenterCommand {
    fn name(&self) -> &'static str {
        "center"
    }

    async fn execute(&mut self, mut model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let old = viewport_of(&model);
        let zoom = if self.retain_zoom { old.zoom } else { 1.0 };
        let bounds = elements_bounds(&model, &self.element_ids);
        let Some(new) = center_viewport(canvas(&model), bounds, zoom) else {
            debug!("center skipped; canvas or element bounds unknown");
            return Ok(CommandResult::unchanged(model));
        };
        change_viewport(&mut model, ctx, old, new, self.animate).await;
        self.change = Some(ViewportChange { old, new });
        Ok(CommandResult::changed(model))
    }

    async fn undo(&mut self, model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        Ok(undo_change(self.change, model, ctx, self.animate).await)
    }

    async fn redo(&mut self, model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        Ok(redo_change(self.change, model, ctx, self.animate).await)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Zoom and scroll so elements (all top-level elements when none are given)
/// fill the canvas, keeping `padding` on every side.
#[derive(Debug)]
pub struct FitToScreenCommand {
    element_ids: Vec<String>,
    padding: f64,
    max_zoom: Option<f64>,
    animate: bool,
    change: Option<ViewportChange>,
}

impl FitToScreenCommand {
    #[must_use]
    pub fn new(element_ids: Vec<String>, padding: Option<f64>, max_zoom: Option<f64>, animate: bool) -> Self {
        Self { element_ids, padding: padding.unwrap_or(0.0), max_zoom, animate, change: None }
    }
}

#[async_trait::async_trait]
impl Command for FitToScreenCommand {
    fn name(&self) -> &'static str {
        "fit-to-screen"
    }

    async fn execute(&mut self, mut model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let old = viewport_of(&model);
        let bounds = elements_bounds(&model, &self.element_ids);
        let Some(new) = fit_viewport(canvas(&model), bounds, self.padding, self.max_zoom) else {
            debug!("fit skipped; canvas or element bounds unknown");
            return Ok(CommandResult::unchanged(model));
        };
        change_viewport(&mut model, ctx, old, new, self.animate).await;
        self.change = Some(ViewportChange { old, new });
        Ok(CommandResult::changed(model))
    }

    async fn undo(&mut self, model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        Ok(undo_change(self.change, model, ctx, self.animate).await)
    }

    async fn redo(&mut self, model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        Ok(redo_change(self.change, model, ctx, self.animate).await)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
