//! Model factory: turns wire schemas into scene-graph elements and back.
//!
//! DESIGN
//! ======
//! Types are resolved once, when an element is created. The registry maps a
//! full type string to a [`Registration`] (basic type plus its feature set,
//! already merged with any enable/disable overrides). Types that were never
//! registered fall back to the graph prefix convention (`node:circle` is a
//! node), and anything else becomes a generic element or generic root.
//!
//! Configuration mistakes are reported eagerly: registering a type twice, or
//! asking for a root from a type registered as a child (and vice versa), is a
//! [`SceneError`] at the call site rather than a malformed model later on.

#[cfg(test)]
#[path = "factory_test.rs"]
mod factory_test;

use std::collections::HashMap;

use serde_json::Value;

use crate::SceneError;
use crate::model::{
    BasicType, EdgeData, Element, ElementType, Feature, Features, HandleData, HandleKind, Model, Subtree, WireFields,
};
use crate::schema::ElementSchema;

// Handle and anchor state travel in the free-form property bag on the wire.
const PROP_HANDLE_KIND: &str = "kind";
const PROP_POINT_INDEX: &str = "pointIndex";
const PROP_EDIT_MODE: &str = "editMode";
const PROP_DANGLING_ANCHOR: &str = "danglingAnchor";
const PROP_ORIGINAL_ENDPOINT: &str = "originalEndpoint";
const PROP_ANCHOR_KIND: &str = "anchorKind";

/// A registered element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub basic: BasicType,
    pub features: Features,
}

/// Default capability set of each basic type.
#[must_use]
pub fn default_features(basic: BasicType) -> Features {
    use Feature::*;
    match basic {
        BasicType::Graph => Features::of(&[Viewport, Export]),
        BasicType::Node => {
            Features::of(&[Connectable, Delete, Select, Bounds, Move, LayoutContainer, Fade, Hover, Popup])
        }
        BasicType::Port => Features::of(&[Connectable, Select, Bounds, Fade, Hover]),
        BasicType::Edge => Features::of(&[Edit, Delete, Select, Fade, Hover]),
        BasicType::Label => Features::of(&[Bounds, Align, LayoutableChild, Fade, EditLabel]),
        BasicType::Compartment => Features::of(&[Bounds, LayoutContainer, LayoutableChild, Fade]),
        BasicType::Button => Features::of(&[Bounds, LayoutableChild, Fade]),
        BasicType::RoutingHandle => Features::of(&[Select, Move, Hover]),
        BasicType::DanglingAnchor => Features::of(&[Delete, Connectable]),
        BasicType::Generic | BasicType::GenericRoot => Features::NONE,
    }
}

/// Type registry plus schema conversion.
#[derive(Debug, Clone, Default)]
pub struct ModelFactory {
    registrations: HashMap<String, Registration>,
}

impl ModelFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `type_name` with the default features of `basic`, adjusted by
    /// `enable` and `disable`.
    pub fn register(
        &mut self,
        type_name: &str,
        basic: BasicType,
        enable: &[Feature],
        disable: &[Feature],
    ) -> Result<(), SceneError> {
        if self.registrations.contains_key(type_name) {
            return Err(SceneError::DuplicateRegistration(type_name.to_string()));
        }
        let mut features = default_features(basic);
        for f in enable {
            features = features.with(*f);
        }
        for f in disable {
            features = features.without(*f);
        }
        self.registrations.insert(type_name.to_string(), Registration { basic, features });
        Ok(())
    }

    #[must_use]
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.registrations.contains_key(type_name)
    }

    /// Resolve a type string. `as_root` picks the fallback for unknown types.
    #[must_use]
    pub fn resolve(&self, type_name: &str, as_root: bool) -> (ElementType, Features) {
        if let Some(reg) = self.registrations.get(type_name) {
            return (ElementType::new(type_name, reg.basic), reg.features);
        }
        let prefix = type_name.split_once(':').map_or(type_name, |(prefix, _)| prefix);
        let basic = match BasicType::from_prefix(prefix) {
            Some(basic) => basic,
            None if as_root => BasicType::GenericRoot,
            None => BasicType::Generic,
        };
        (ElementType::new(type_name, basic), default_features(basic))
    }

    /// Build a model from a root schema.
    pub fn create_root(&self, schema: &ElementSchema) -> Result<Model, SceneError> {
        let (kind, features) = self.resolve(&schema.kind, true);
        if !kind.basic.is_root() {
            return Err(SceneError::TypeMismatch { type_name: schema.kind.clone(), expected: "a root type" });
        }
        let root = element_from_schema(schema, kind, features);
        let mut model = Model::new(root);
        for child in &schema.children {
            let subtree = self.create_element(child)?;
            model.insert(&schema.id, None, subtree)?;
        }
        Ok(model)
    }

    /// Build a detached subtree from a non-root schema.
    pub fn create_element(&self, schema: &ElementSchema) -> Result<Subtree, SceneError> {
        let (kind, features) = self.resolve(&schema.kind, false);
        if kind.basic.is_root() {
            return Err(SceneError::TypeMismatch { type_name: schema.kind.clone(), expected: "a child type" });
        }
        let element = element_from_schema(schema, kind, features);
        let children = schema.children.iter().map(|c| self.create_element(c)).collect::<Result<Vec<_>, _>>()?;
        Ok(Subtree { element, children })
    }

    /// Serialize the subtree rooted at `id`. Unknown ids yield `None`.
    #[must_use]
    pub fn create_schema(model: &Model, id: &str) -> Option<ElementSchema> {
        let element = model.get(id)?;
        let mut schema = schema_from_element(element);
        schema.children = element.children().iter().filter_map(|c| Self::create_schema(model, c)).collect();
        Some(schema)
    }

    /// Serialize a detached subtree.
    #[must_use]
    pub fn subtree_schema(subtree: &Subtree) -> ElementSchema {
        let mut schema = schema_from_element(&subtree.element);
        schema.children = subtree.children.iter().map(Self::subtree_schema).collect();
        schema
    }
}

/// Construct a routing handle element for `edge_id`.
#[must_use]
pub fn routing_handle(edge_id: &str, kind: HandleKind, point_index: i32) -> Element {
    let type_name = if kind.is_volatile() { "volatile-routing-point" } else { "routing-point" };
    let id = format!("{edge_id}_{}_{point_index}", kind.as_str());
    let mut element = Element::new(
        id,
        ElementType::new(type_name, BasicType::RoutingHandle),
        default_features(BasicType::RoutingHandle),
    );
    element.handle = Some(HandleData::new(kind, point_index));
    element
}

/// Construct a dangling anchor placeholder at `position` (root coordinates).
#[must_use]
pub fn dangling_anchor(id: &str, position: crate::geometry::Point) -> Element {
    let mut element = Element::new(
        id,
        ElementType::new("dangling-anchor", BasicType::DanglingAnchor),
        default_features(BasicType::DanglingAnchor),
    );
    element.position = Some(position);
    element.size = Some(crate::geometry::Dimension::new(0.0, 0.0));
    element
}

// =============================================================================
// CONVERSION
// =============================================================================

fn element_from_schema(schema: &ElementSchema, kind: ElementType, features: Features) -> Element {
    let basic = kind.basic;
    let mut element = Element::new(schema.id.clone(), kind, features);
    element.position = schema.position;
    element.size = schema.size;
    element.alignment = schema.alignment;
    element.text.clone_from(&schema.text);
    element.scroll = schema.scroll;
    element.zoom = schema.zoom;
    element.canvas_bounds = schema.canvas_bounds;
    element.selected = schema.selected;
    element.hover_feedback = schema.hover_feedback;
    element.opacity = schema.opacity;
    element.props.clone_from(&schema.props);

    if basic == BasicType::Edge || schema.source_id.is_some() || schema.target_id.is_some() {
        let mut edge = EdgeData::new(
            schema.source_id.clone().unwrap_or_default(),
            schema.target_id.clone().unwrap_or_default(),
        );
        edge.routing_points = schema.routing_points.clone().unwrap_or_default();
        edge.wire = WireFields {
            source_id: schema.source_id.is_some(),
            target_id: schema.target_id.is_some(),
            routing_points: schema.routing_points.is_some(),
        };
        edge.router_kind.clone_from(&schema.router_kind);
        edge.source_anchor_correction = schema.source_anchor_correction;
        edge.target_anchor_correction = schema.target_anchor_correction;
        element.edge = Some(edge);
    }

    // a non-string anchor kind stays an ordinary property
    if let Some(anchor) = element.props.get(PROP_ANCHOR_KIND).and_then(Value::as_str).map(str::to_string) {
        element.props.remove(PROP_ANCHOR_KIND);
        element.anchor_kind = Some(anchor);
    }

    if basic == BasicType::RoutingHandle {
        element.handle = Some(take_handle(&mut element.props));
    }
    element
}

fn take_handle(props: &mut serde_json::Map<String, Value>) -> HandleData {
    let kind = props
        .get(PROP_HANDLE_KIND)
        .and_then(Value::as_str)
        .and_then(HandleKind::parse)
        .unwrap_or(HandleKind::Junction);
    let point_index = props
        .get(PROP_POINT_INDEX)
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).map_or(None, Some))
        .unwrap_or(-1);
    let edit_mode = props.get(PROP_EDIT_MODE).and_then(Value::as_bool).unwrap_or(false);
    let dangling_anchor = props.get(PROP_DANGLING_ANCHOR).and_then(Value::as_str).map(str::to_string);
    let original_endpoint = props.get(PROP_ORIGINAL_ENDPOINT).and_then(Value::as_str).map(str::to_string);
    for key in [PROP_HANDLE_KIND, PROP_POINT_INDEX, PROP_EDIT_MODE, PROP_DANGLING_ANCHOR, PROP_ORIGINAL_ENDPOINT] {
        props.remove(key);
    }
    HandleData { kind, point_index, edit_mode, dangling_anchor, original_endpoint }
}

fn schema_from_element(element: &Element) -> ElementSchema {
    let mut schema = ElementSchema::new(element.id.clone(), element.kind.name.clone());
    schema.position = element.position;
    schema.size = element.size;
    schema.alignment = element.alignment;
    schema.text.clone_from(&element.text);
    schema.scroll = element.scroll;
    schema.zoom = element.zoom;
    schema.canvas_bounds = element.canvas_bounds;
    schema.selected = element.selected;
    schema.hover_feedback = element.hover_feedback;
    schema.opacity = element.opacity;
    schema.props.clone_from(&element.props);

    if let Some(edge) = &element.edge {
        schema.source_id = Some(edge.source_id().to_string()).filter(|s| edge.wire.source_id || !s.is_empty());
        schema.target_id = Some(edge.target_id().to_string()).filter(|s| edge.wire.target_id || !s.is_empty());
        schema.routing_points =
            Some(edge.routing_points.clone()).filter(|p| edge.wire.routing_points || !p.is_empty());
        schema.router_kind.clone_from(&edge.router_kind);
        schema.source_anchor_correction = edge.source_anchor_correction;
        schema.target_anchor_correction = edge.target_anchor_correction;
    }
    if let Some(anchor) = &element.anchor_kind {
        schema.props.insert(PROP_ANCHOR_KIND.into(), Value::String(anchor.clone()));
    }
    if let Some(handle) = &element.handle {
        schema.props.insert(PROP_HANDLE_KIND.into(), Value::String(handle.kind.as_str().into()));
        schema.props.insert(PROP_POINT_INDEX.into(), Value::from(handle.point_index));
        if handle.edit_mode {
            schema.props.insert(PROP_EDIT_MODE.into(), Value::Bool(true));
        }
        if let Some(anchor) = &handle.dangling_anchor {
            schema.props.insert(PROP_DANGLING_ANCHOR.into(), Value::String(anchor.clone()));
        }
        if let Some(original) = &handle.original_endpoint {
            schema.props.insert(PROP_ORIGINAL_ENDPOINT.into(), Value::String(original.clone()));
        }
    }
    schema
}
