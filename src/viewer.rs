//! Render targets: where the command stack delivers models.
//!
//! DESIGN
//! ======
//! The command stack owns three models (main, hidden, popup) and hands each to
//! a [`RenderTarget`] once a batch of commands has settled. The main and popup
//! targets are [`Viewer`]s that run the scene render pass and keep the latest
//! virtual tree for an adapter to patch into a real document. The hidden target
//! is a [`HiddenBoundsUpdater`]: it never displays anything, it measures the
//! model it receives and answers the bounds request that caused the render.
//!
//! Measurement is a seam ([`BoundsMeasurer`]). Without a real text engine the
//! [`EstimatedBoundsMeasurer`] sizes text with fixed per-character metrics.

#[cfg(test)]
#[path = "viewer_test.rs"]
mod viewer_test;

use std::sync::Arc;

use scene::consts::{ESTIMATED_CHAR_WIDTH, ESTIMATED_LINE_HEIGHT};
use scene::geometry::{Dimension, Point};
use scene::model::{Element, Feature, Model};
use scene::render::{ModelRenderer, VNode};
use tokio::sync::RwLock;
use tracing::debug;

use crate::action::{Action, ElementAndAlignment, ElementAndBounds};
use crate::command::ActionSink;

/// Distance from the top of a text line to its baseline.
const TEXT_BASELINE: f64 = ESTIMATED_LINE_HEIGHT - 4.0;

/// Receives a model whenever the command stack flushes a changed target.
/// `cause` is the action that produced the change, when the command set one.
#[async_trait::async_trait]
pub trait RenderTarget: Send + Sync {
    async fn update(&self, model: &Model, cause: Option<&Action>);
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTarget;

#[async_trait::async_trait]
impl RenderTarget for NullTarget {
    async fn update(&self, _model: &Model, _cause: Option<&Action>) {}
}

// =============================================================================
// VIEWER
// =============================================================================

#[derive(Debug, Default)]
struct ViewerState {
    tree: Option<VNode>,
    renders: usize,
}

/// Renders every update into a virtual tree and keeps the latest one.
pub struct Viewer {
    name: &'static str,
    renderer: ModelRenderer,
    state: RwLock<ViewerState>,
}

impl Viewer {
    #[must_use]
    pub fn new(name: &'static str, renderer: ModelRenderer) -> Self {
        Self { name, renderer, state: RwLock::new(ViewerState::default()) }
    }

    /// Latest rendered tree, if anything has been rendered yet.
    pub async fn tree(&self) -> Option<VNode> {
        self.state.read().await.tree.clone()
    }

    /// Number of renders so far, animation frames included.
    pub async fn renders(&self) -> usize {
        self.state.read().await.renders
    }
}

#[async_trait::async_trait]
impl RenderTarget for Viewer {
    async fn update(&self, model: &Model, cause: Option<&Action>) {
        let tree = self.renderer.render(model);
        debug!(
            viewer = self.name,
            root_id = %model.root_id(),
            nodes = tree.count(),
            cause = cause.map_or("none", Action::kind),
            "model rendered"
        );
        let mut state = self.state.write().await;
        state.tree = Some(tree);
        state.renders += 1;
    }
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer").field("name", &self.name).finish_non_exhaustive()
    }
}

// =============================================================================
// MEASUREMENT
// =============================================================================

/// Measures elements the way a rendered document would.
pub trait BoundsMeasurer: Send + Sync {
    /// Size of `element`, or `None` when it cannot be measured.
    fn measure(&self, model: &Model, element: &Element) -> Option<Dimension>;

    /// Alignment point of `element` relative to its position.
    fn alignment(&self, model: &Model, element: &Element) -> Option<Point>;
}

/// Fixed-metric measurement: text is `chars × 7` wide and `lines × 16` high,
/// containers span their children, and explicit sizes are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedBoundsMeasurer;

impl EstimatedBoundsMeasurer {
    fn size_of(model: &Model, element: &Element) -> Option<Dimension> {
        if let Some(size) = element.size.filter(Dimension::is_valid) {
            return Some(size);
        }
        if let Some(text) = &element.text {
            return Some(text_size(text));
        }
        if !element.has(Feature::LayoutContainer) {
            return None;
        }
        let mut extent: Option<Dimension> = None;
        for child in element.children().iter().filter_map(|id| model.get(id)) {
            let Some(size) = Self::size_of(model, child) else {
                continue;
            };
            let p = child.position.unwrap_or_default();
            let (w, h) = (p.x + size.width, p.y + size.height);
            extent = Some(extent.map_or(Dimension::new(w, h), |e| Dimension::new(e.width.max(w), e.height.max(h))));
        }
        extent
    }
}

impl BoundsMeasurer for EstimatedBoundsMeasurer {
    fn measure(&self, model: &Model, element: &Element) -> Option<Dimension> {
        Self::size_of(model, element)
    }

    fn alignment(&self, _model: &Model, element: &Element) -> Option<Point> {
        element.text.as_ref().map(|_| Point::new(0.0, TEXT_BASELINE))
    }
}

#[allow(clippy::cast_precision_loss)]
fn text_size(text: &str) -> Dimension {
    let lines: Vec<&str> = text.split('\n').collect();
    let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    Dimension::new(widest as f64 * ESTIMATED_CHAR_WIDTH, lines.len() as f64 * ESTIMATED_LINE_HEIGHT)
}

// =============================================================================
// HIDDEN BOUNDS UPDATER
// =============================================================================

/// The hidden render target. Measures every element with bounds and answers
/// the `requestBounds` that caused the render with a `computedBounds`.
pub struct HiddenBoundsUpdater {
    measurer: Arc<dyn BoundsMeasurer>,
    sink: ActionSink,
}

impl HiddenBoundsUpdater {
    #[must_use]
    pub fn new(measurer: Arc<dyn BoundsMeasurer>, sink: ActionSink) -> Self {
        Self { measurer, sink }
    }

    /// Bounds and alignments of every measurable element, in preorder.
    #[must_use]
    pub fn compute(&self, model: &Model) -> (Vec<ElementAndBounds>, Vec<ElementAndAlignment>) {
        let mut bounds = Vec::new();
        let mut alignments = Vec::new();
        for element in model.preorder() {
            if element.has(Feature::Bounds) {
                if let Some(new_size) = self.measurer.measure(model, element) {
                    bounds.push(ElementAndBounds {
                        element_id: element.id.clone(),
                        new_position: element.position,
                        new_size,
                    });
                }
            }
            if element.has(Feature::Align) {
                if let Some(new_alignment) = self.measurer.alignment(model, element) {
                    alignments.push(ElementAndAlignment { element_id: element.id.clone(), new_alignment });
                }
            }
        }
        (bounds, alignments)
    }
}

#[async_trait::async_trait]
impl RenderTarget for HiddenBoundsUpdater {
    async fn update(&self, model: &Model, cause: Option<&Action>) {
        let Some(Action::RequestBounds { request_id, .. }) = cause else {
            debug!(cause = cause.map_or("none", Action::kind), "hidden render without a bounds request");
            return;
        };
        let (bounds, alignments) = self.compute(model);
        debug!(request_id = ?request_id, measured = bounds.len(), "bounds computed");
        self.sink.dispatch(Action::ComputedBounds { bounds, alignments, response_id: request_id.clone() });
    }
}

impl std::fmt::Debug for HiddenBoundsUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HiddenBoundsUpdater").finish_non_exhaustive()
    }
}
