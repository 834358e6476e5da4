//! Wire schema: the serializable element records exchanged with model sources.
//!
//! Every record carries at least `id` and `type`. Well-known properties are
//! typed fields; anything else is kept verbatim in [`ElementSchema::props`] so a
//! schema survives `create_root` followed by `create_schema` without loss.

#[cfg(test)]
#[path = "schema_test.rs"]
mod schema_test;

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Dimension, Point};

/// One element of a model tree as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSchema {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSchema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Dimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Point>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_points: Option<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_anchor_correction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_anchor_correction: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas_bounds: Option<Bounds>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hover_feedback: bool,
    #[serde(default = "full_opacity", skip_serializing_if = "is_full_opacity")]
    pub opacity: f64,

    /// Any property not covered by a typed field above.
    #[serde(flatten)]
    pub props: serde_json::Map<String, serde_json::Value>,
}

impl ElementSchema {
    /// Minimal record with only `id` and `type` set.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { id: id.into(), kind: kind.into(), ..Self::default() }
    }

    /// A shape-bearing record with position and size.
    #[must_use]
    pub fn shape(id: impl Into<String>, kind: impl Into<String>, bounds: Bounds) -> Self {
        Self { position: Some(bounds.position()), size: Some(bounds.size()), ..Self::new(id, kind) }
    }

    /// An edge record between two connectables.
    #[must_use]
    pub fn edge(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self { source_id: Some(source.into()), target_id: Some(target.into()), ..Self::new(id, "edge") }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<ElementSchema>) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub fn with_routing_points(mut self, points: Vec<Point>) -> Self {
        self.routing_points = Some(points);
        self
    }

    #[must_use]
    pub fn with_router(mut self, router_kind: impl Into<String>) -> Self {
        self.router_kind = Some(router_kind.into());
        self
    }

    /// Depth-first search for a record by id, including `self`.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&ElementSchema> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Mutable variant of [`ElementSchema::find`].
    pub fn find_mut(&mut self, id: &str) -> Option<&mut ElementSchema> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    /// Ids of this record and all descendants, in preorder.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids(&self, out: &mut Vec<String>) {
        out.push(self.id.clone());
        for child in &self.children {
            child.collect_ids(out);
        }
    }
}

impl Default for ElementSchema {
    fn default() -> Self {
        Self {
            id: String::new(),
            kind: String::new(),
            children: Vec::new(),
            position: None,
            size: None,
            alignment: None,
            source_id: None,
            target_id: None,
            routing_points: None,
            router_kind: None,
            source_anchor_correction: None,
            target_anchor_correction: None,
            text: None,
            scroll: None,
            zoom: None,
            canvas_bounds: None,
            selected: false,
            hover_feedback: false,
            opacity: 1.0,
            props: serde_json::Map::new(),
        }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

fn full_opacity() -> f64 {
    1.0
}

#[allow(clippy::trivially_copy_pass_by_ref, clippy::float_cmp)]
fn is_full_opacity(value: &f64) -> bool {
    *value == 1.0
}
