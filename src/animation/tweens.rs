//! Concrete animations used by the editing commands.

#[cfg(test)]
#[path = "tweens_test.rs"]
mod tweens_test;

use scene::consts::MIN_ZOOM;
use scene::geometry::{Dimension, Point, linear};
use scene::model::Model;
use scene::viewport::{Viewport, apply_viewport};
use tracing::debug;

use super::Animation;

// =============================================================================
// MOVE
// =============================================================================

/// Position of one element tweened from `from` to `to`.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTween {
    pub element_id: String,
    pub from: Point,
    pub to: Point,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveAnimation {
    pub tweens: Vec<ElementTween>,
}

impl MoveAnimation {
    #[must_use]
    pub fn new(tweens: Vec<ElementTween>) -> Self {
        Self { tweens }
    }

    /// The same moves played backwards.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let tweens = self
            .tweens
            .iter()
            .map(|tw| ElementTween { element_id: tw.element_id.clone(), from: tw.to, to: tw.from })
            .collect();
        Self { tweens }
    }
}

impl Animation for MoveAnimation {
    fn tween(&self, t: f64, model: &mut Model) {
        for tw in &self.tweens {
            if let Some(element) = model.get_mut(&tw.element_id) {
                element.position = Some(linear(tw.from, tw.to, t));
            }
        }
    }
}

// =============================================================================
// RESIZE
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ElementResize {
    pub element_id: String,
    pub from: Dimension,
    pub to: Dimension,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResizeAnimation {
    pub resizes: Vec<ElementResize>,
}

impl ResizeAnimation {
    #[must_use]
    pub fn new(resizes: Vec<ElementResize>) -> Self {
        Self { resizes }
    }
}

impl Animation for ResizeAnimation {
    fn tween(&self, t: f64, model: &mut Model) {
        for r in &self.resizes {
            if let Some(element) = model.get_mut(&r.element_id) {
                element.size = Some(Dimension::new(
                    r.from.width + (r.to.width - r.from.width) * t,
                    r.from.height + (r.to.height - r.from.height) * t,
                ));
            }
        }
    }
}

// =============================================================================
// FADE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fade {
    pub element_id: String,
    pub fade_in: bool,
}

/// Opacity tween. With `remove_faded`, faded-out elements are removed from
/// the model once the animation completes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FadeAnimation {
    pub fades: Vec<Fade>,
    pub remove_faded: bool,
}

impl FadeAnimation {
    #[must_use]
    pub fn new(fades: Vec<Fade>, remove_faded: bool) -> Self {
        Self { fades, remove_faded }
    }
}

impl Animation for FadeAnimation {
    fn tween(&self, t: f64, model: &mut Model) {
        for fade in &self.fades {
            if let Some(element) = model.get_mut(&fade.element_id) {
                element.opacity = if fade.fade_in { t } else { 1.0 - t };
            }
        }
        if t < 1.0 || !self.remove_faded {
            return;
        }
        for fade in self.fades.iter().filter(|f| !f.fade_in) {
            if !model.contains(&fade.element_id) {
                continue;
            }
            if let Err(err) = model.remove(&fade.element_id) {
                debug!(element_id = %fade.element_id, error = %err, "faded element could not be removed");
            }
        }
    }
}

// =============================================================================
// MORPH EDGES
// =============================================================================

/// Routing points of one edge tweened from `from` to `to`.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMorph {
    pub edge_id: String,
    pub from: Vec<Point>,
    pub to: Vec<Point>,
}

/// Routing-point tween. Edges whose point count changes switch to the new
/// points on the first frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MorphEdgesAnimation {
    pub morphs: Vec<EdgeMorph>,
}

impl MorphEdgesAnimation {
    #[must_use]
    pub fn new(morphs: Vec<EdgeMorph>) -> Self {
        Self { morphs }
    }
}

impl Animation for MorphEdgesAnimation {
    fn tween(&self, t: f64, model: &mut Model) {
        for morph in &self.morphs {
            let Some(edge) = model.get_mut(&morph.edge_id).and_then(|e| e.edge.as_mut()) else {
                continue;
            };
            edge.routing_points = if t < 1.0 && morph.from.len() == morph.to.len() {
                morph.from.iter().zip(&morph.to).map(|(a, b)| linear(*a, *b, t)).collect()
            } else {
                morph.to.clone()
            };
        }
    }
}

// =============================================================================
// VIEWPORT
// =============================================================================

/// Viewport tween: scroll moves linearly, zoom geometrically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportAnimation {
    pub from: Viewport,
    pub to: Viewport,
}

impl ViewportAnimation {
    #[must_use]
    pub fn new(from: Viewport, to: Viewport) -> Self {
        Self { from, to }
    }
}

impl Animation for ViewportAnimation {
    fn tween(&self, t: f64, model: &mut Model) {
        let viewport = if t >= 1.0 {
            self.to
        } else {
            let from = self.from.zoom.max(MIN_ZOOM).ln();
            let to = self.to.zoom.max(MIN_ZOOM).ln();
            Viewport::new(linear(self.from.scroll, self.to.scroll, t), (from + (to - from) * t).exp())
        };
        apply_viewport(model, viewport);
    }
}

// =============================================================================
// COMPOUND
// =============================================================================

/// Several animations advanced together on the same frames.
#[derive(Default)]
pub struct CompoundAnimation {
    parts: Vec<Box<dyn Animation>>,
}

impl CompoundAnimation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, part: impl Animation + 'static) {
        self.parts.push(Box::new(part));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Animation for CompoundAnimation {
    fn tween(&self, t: f64, model: &mut Model) {
        for part in &self.parts {
            part.tween(t, model);
        }
    }
}

impl std::fmt::Debug for CompoundAnimation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompoundAnimation").field("parts", &self.parts.len()).finish()
    }
}
