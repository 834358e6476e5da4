//! Viewport math: scroll/zoom state, coordinate conversion, fit and center.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_ZOOM, MIN_ZOOM};
use crate::geometry::{Bounds, Point};
use crate::model::Model;

/// Scroll offset (model coordinates of the top-left screen corner) and zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub scroll: Point,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { scroll: Point::ORIGIN, zoom: 1.0 }
    }
}

impl Viewport {
    #[must_use]
    pub fn new(scroll: Point, zoom: f64) -> Self {
        Self { scroll, zoom }
    }

    /// Root model coordinates to screen coordinates.
    #[must_use]
    pub fn model_to_screen(&self, p: Point) -> Point {
        Point::new((p.x - self.scroll.x) * self.zoom, (p.y - self.scroll.y) * self.zoom)
    }

    /// Screen coordinates to root model coordinates.
    #[must_use]
    pub fn screen_to_model(&self, p: Point) -> Point {
        Point::new(p.x / self.zoom + self.scroll.x, p.y / self.zoom + self.scroll.y)
    }

    /// Same viewport with zoom clamped to the supported range.
    #[must_use]
    pub fn limited(self) -> Self {
        Self { zoom: self.zoom.clamp(MIN_ZOOM, MAX_ZOOM), ..self }
    }
}

/// Current viewport of the model's root.
#[must_use]
pub fn viewport_of(model: &Model) -> Viewport {
    let root = model.root();
    Viewport { scroll: root.scroll.unwrap_or_default(), zoom: root.zoom.unwrap_or(1.0) }
}

/// Write `viewport` onto the model's root.
pub fn apply_viewport(model: &mut Model, viewport: Viewport) {
    let root_id = model.root_id().to_string();
    if let Some(root) = model.get_mut(&root_id) {
        root.scroll = Some(viewport.scroll);
        root.zoom = Some(viewport.zoom);
    }
}

/// Combined absolute bounds of `ids`, or of all top-level children when empty.
#[must_use]
pub fn elements_bounds(model: &Model, ids: &[String]) -> Bounds {
    let candidates: Vec<String> =
        if ids.is_empty() { model.children(model.root_id()).to_vec() } else { ids.to_vec() };
    candidates
        .iter()
        .filter(|id| model.contains(id))
        .map(|id| model.absolute_bounds(id))
        .fold(Bounds::EMPTY, |acc, b| acc.combine(&b))
}

/// Viewport that centers `bounds` on the canvas. `None` until the canvas is measured.
#[must_use]
pub fn center_viewport(canvas: Bounds, bounds: Bounds, zoom: f64) -> Option<Viewport> {
    if !canvas.is_valid() || !bounds.is_valid() {
        return None;
    }
    let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    let c = bounds.center();
    Some(Viewport {
        scroll: Point::new(c.x - 0.5 * canvas.width / zoom, c.y - 0.5 * canvas.height / zoom),
        zoom,
    })
}

/// Viewport that fits `bounds` into the canvas with `padding` on each side.
#[must_use]
pub fn fit_viewport(canvas: Bounds, bounds: Bounds, padding: f64, max_zoom: Option<f64>) -> Option<Viewport> {
    if !canvas.is_valid() || !bounds.is_valid() {
        return None;
    }
    let delta = 2.0 * padding;
    let mut zoom = (canvas.width / (bounds.width + delta)).min(canvas.height / (bounds.height + delta));
    if let Some(max) = max_zoom {
        zoom = zoom.min(max);
    }
    if !zoom.is_finite() {
        zoom = 1.0;
    }
    let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    let c = bounds.center();
    Some(Viewport {
        scroll: Point::new(c.x - 0.5 * canvas.width / zoom, c.y - 0.5 * canvas.height / zoom),
        zoom,
    })
}
