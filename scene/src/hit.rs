//! Hit-testing in root model coordinates.
//!
//! Elements later in preorder are drawn on top, so the last element whose
//! bounds contain the point wins. That is the deepest, front-most element.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::HIT_SLOP;
use crate::geometry::{Bounds, Point};
use crate::model::{BasicType, Element, Feature, Model};

/// Front-most element under `point` accepted by `filter`.
#[must_use]
pub fn element_at<F>(model: &Model, point: Point, filter: F) -> Option<String>
where
    F: Fn(&Element) -> bool,
{
    model
        .preorder()
        .filter(|e| e.id != model.root_id() && filter(e))
        .filter(|e| hit_bounds(model, e).is_some_and(|b| b.includes(point)))
        .last()
        .map(|e| e.id.clone())
}

/// Front-most connectable element under `point`, skipping `exclude`, edges and
/// dangling anchors.
#[must_use]
pub fn connectable_at(model: &Model, point: Point, exclude: &[&str]) -> Option<String> {
    element_at(model, point, |e| {
        e.has(Feature::Connectable)
            && e.edge.is_none()
            && e.basic() != BasicType::DanglingAnchor
            && !exclude.contains(&e.id.as_str())
    })
}

fn hit_bounds(model: &Model, element: &Element) -> Option<Bounds> {
    let bounds = model.absolute_bounds(&element.id);
    if !bounds.is_valid() {
        return None;
    }
    if bounds.width <= 0.0 || bounds.height <= 0.0 {
        return Some(bounds.inflate(HIT_SLOP));
    }
    Some(bounds)
}
