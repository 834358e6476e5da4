//! Whole-model commands: set, update (with a diff animation) and popup.

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

use std::any::Any;

use scene::geometry::points_almost_equal;
use scene::matching::match_models;
use scene::model::{Feature, Model};
use scene::schema::ElementSchema;
use tracing::debug;

use super::{Command, CommandContext, CommandError, CommandKind, CommandResult};
use crate::animation::{
    Animation, CompoundAnimation, EdgeMorph, ElementResize, ElementTween, Fade, FadeAnimation, MorphEdgesAnimation,
    MoveAnimation, ResizeAnimation,
};

// =============================================================================
// SET MODEL
// =============================================================================

/// Replace the main model. Clears the whole command history.
#[derive(Debug)]
pub struct SetModelCommand {
    new_root: ElementSchema,
    old: Option<Model>,
    new: Option<Model>,
}

impl SetModelCommand {
    #[must_use]
    pub fn new(new_root: ElementSchema) -> Self {
        Self { new_root, old: None, new: None }
    }
}

#[async_trait::async_trait]
impl Command for SetModelCommand {
    fn name(&self) -> &'static str {
        "set-model"
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Reset
    }

    async fn execute(&mut self, model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let new = ctx.factory.create_root(&self.new_root)?;
        debug!(root_id = %new.root_id(), elements = new.len(), "model set");
        self.old = Some(model);
        self.new = Some(new.clone());
        Ok(CommandResult::changed(new))
    }

    async fn undo(&mut self, model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        Ok(CommandResult::changed(self.old.clone().unwrap_or(model)))
    }

    async fn redo(&mut self, model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        Ok(CommandResult::changed(self.new.clone().unwrap_or(model)))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// UPDATE MODEL
// =============================================================================

/// Replace the main model with a new revision of the same diagram. When
/// animated and the root id is unchanged, the difference is tweened: moves,
/// resizes and routing changes interpolate, insertions fade in and removals
/// fade out.
#[derive(Debug)]
pub struct UpdateModelCommand {
    new_root: ElementSchema,
    animate: bool,
    old: Option<Model>,
    new: Option<Model>,
}

impl UpdateModelCommand {
    #[must_use]
    pub fn new(new_root: ElementSchema, animate: bool) -> Self {
        Self { new_root, animate, old: None, new: None }
    }

    async fn transition(&self, from: &Model, to: Model, ctx: &CommandContext) -> Model {
        if self.animate { morph(from, to, ctx).await } else { to }
    }
}

#[async_trait::async_trait]
impl Command for UpdateModelCommand {
    fn name(&self) -> &'static str {
        "update-model"
    }

    async fn execute(&mut self, model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let new = ctx.factory.create_root(&self.new_root)?;
        let result = self.transition(&model, new.clone(), ctx).await;
        self.old = Some(model);
        self.new = Some(new);
        Ok(CommandResult::changed(result))
    }

    async fn undo(&mut self, model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let Some(old) = self.old.clone() else {
            return Ok(CommandResult::unchanged(model));
        };
        Ok(CommandResult::changed(self.transition(&model, old, ctx).await))
    }

    async fn redo(&mut self, model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let Some(new) = self.new.clone() else {
            return Ok(CommandResult::unchanged(model));
        };
        Ok(CommandResult::changed(self.transition(&model, new, ctx).await))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Animate from `from` to `to` and return the settled model. Models with
/// different roots are swapped without animation.
async fn morph(from: &Model, to: Model, ctx: &CommandContext) -> Model {
    if from.root_id() != to.root_id() {
        return to;
    }
    let matches = match_models(from, &to);
    let mut animated = to.clone();
    let mut moves = Vec::new();
    let mut resizes = Vec::new();
    let mut morphs = Vec::new();
    let mut fades = Vec::new();

    for (id, m) in &matches {
        match (&m.left, &m.right) {
            (Some(left), Some(right)) => {
                if let (Some(a), Some(b)) = (left.position, right.position) {
                    if !points_almost_equal(a, b) {
                        moves.push(ElementTween { element_id: id.clone(), from: a, to: b });
                    }
                }
                if let (Some(a), Some(b)) = (left.size, right.size) {
                    if a.is_valid() && b.is_valid() && a != b {
                        resizes.push(ElementResize { element_id: id.clone(), from: a, to: b });
                    }
                }
                if let (Some(a), Some(b)) = (&left.edge, &right.edge) {
                    if a.routing_points != b.routing_points {
                        morphs.push(EdgeMorph {
                            edge_id: id.clone(),
                            from: a.routing_points.clone(),
                            to: b.routing_points.clone(),
                        });
                    }
                }
            }
            (None, Some(right)) if right.has(Feature::Fade) => {
                fades.push(Fade { element_id: id.clone(), fade_in: true });
            }
            (Some(left), None) if left.has(Feature::Fade) => {
                let parent_removed =
                    m.left_parent_id.as_ref().and_then(|p| matches.get(p)).is_some_and(|pm| pm.is_removal());
                let Some(parent) = m.left_parent_id.as_deref().filter(|p| !parent_removed && animated.contains(p))
                else {
                    continue;
                };
                let Some(subtree) = from.subtree(id) else {
                    continue;
                };
                match animated.insert(parent, None, subtree) {
                    Ok(()) => fades.push(Fade { element_id: id.clone(), fade_in: false }),
                    Err(err) => debug!(element_id = %id, error = %err, "removed element not faded out"),
                }
            }
            _ => {}
        }
    }

    let mut animation = CompoundAnimation::new();
    if !moves.is_empty() {
        animation.push(MoveAnimation::new(moves));
    }
    if !resizes.is_empty() {
        animation.push(ResizeAnimation::new(resizes));
    }
    if !morphs.is_empty() {
        animation.push(MorphEdgesAnimation::new(morphs));
    }
    if !fades.is_empty() {
        animation.push(FadeAnimation::new(fades, true));
    }
    if animation.is_empty() {
        return to;
    }
    debug!(parts = animation.len(), "animating model update");
    animation.tween(0.0, &mut animated);
    ctx.animate(&animation, &mut animated).await;
    animated
}

// =============================================================================
// POPUP
// =============================================================================

/// Replace the popup model. Never recorded.
#[derive(Debug)]
pub struct SetPopupModelCommand {
    new_root: ElementSchema,
    old: Option<Model>,
}

impl SetPopupModelCommand {
    #[must_use]
    pub fn new(new_root: ElementSchema) -> Self {
        Self { new_root, old: None }
    }
}

#[async_trait::async_trait]
impl Command for SetPopupModelCommand {
    fn name(&self) -> &'static str {
        "set-popup-model"
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Popup
    }

    async fn execute(&mut self, model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        let popup = ctx.factory.create_root(&self.new_root)?;
        self.old = Some(model);
        Ok(CommandResult::changed(popup))
    }

    async fn undo(&mut self, model: Model, _ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        Ok(CommandResult::changed(self.old.clone().unwrap_or(model)))
    }

    async fn redo(&mut self, model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        self.execute(model, ctx).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
