//! Scene graph: elements, their capability sets, and the id-indexed model.
//!
//! DESIGN
//! ======
//! The tree is stored flat: every element lives in one id-keyed map and refers
//! to its parent and children by id. The map doubles as the id index, so a
//! lookup never walks the tree. Graph roots additionally keep incoming and
//! outgoing edge maps keyed by connectable id; those maps are maintained by the
//! structural operations themselves (`insert`, `remove`, `reconnect`) instead of
//! being refreshed after the fact.
//!
//! Structural operations are the only way to change parent/child links. They
//! validate their input up front and return [`SceneError`] without touching the
//! model when something is wrong, so a failed operation never leaves a
//! half-applied edit behind.
//!
//! COORDINATES
//! ===========
//! An element's `position` is relative to its parent. "The coordinate system
//! of X" means the system X's children are positioned in; [`Model::origin`]
//! gives its offset from the root, and `translate_point`/`translate_bounds`
//! convert between two such systems.

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::SceneError;
use crate::geometry::{Bounds, Dimension, Point, add, subtract};

// =============================================================================
// TYPES
// =============================================================================

/// Resolved basic type of an element, fixed at factory time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicType {
    Graph,
    Node,
    Port,
    Edge,
    Label,
    Compartment,
    Button,
    RoutingHandle,
    DanglingAnchor,
    Generic,
    GenericRoot,
}

impl BasicType {
    /// Basic type for a recognised graph type prefix (`node` in `node:circle`).
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "graph" => Some(Self::Graph),
            "node" => Some(Self::Node),
            "port" => Some(Self::Port),
            "edge" => Some(Self::Edge),
            "label" => Some(Self::Label),
            "comp" => Some(Self::Compartment),
            "button" => Some(Self::Button),
            "routing-point" | "volatile-routing-point" => Some(Self::RoutingHandle),
            "dangling-anchor" => Some(Self::DanglingAnchor),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_root(self) -> bool {
        matches!(self, Self::Graph | Self::GenericRoot)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Node => "node",
            Self::Port => "port",
            Self::Edge => "edge",
            Self::Label => "label",
            Self::Compartment => "comp",
            Self::Button => "button",
            Self::RoutingHandle => "routing-point",
            Self::DanglingAnchor => "dangling-anchor",
            Self::Generic => "generic",
            Self::GenericRoot => "generic-root",
        }
    }
}

/// The type tag of an element: resolved basic type plus the raw type string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementType {
    pub basic: BasicType,
    /// Everything after the first `:` in `name`, if present.
    pub sub: Option<String>,
    /// The full type string as given in the schema.
    pub name: String,
}

impl ElementType {
    #[must_use]
    pub fn new(name: impl Into<String>, basic: BasicType) -> Self {
        let name = name.into();
        let sub = name.split_once(':').map(|(_, sub)| sub.to_string());
        Self { basic, sub, name }
    }

    /// The part before the first `:`.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.name.split_once(':').map_or(self.name.as_str(), |(prefix, _)| prefix)
    }
}

/// A capability an element may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Connectable,
    Delete,
    Select,
    Bounds,
    Move,
    LayoutContainer,
    Fade,
    Hover,
    Popup,
    Edit,
    Align,
    LayoutableChild,
    EditLabel,
    Viewport,
    Export,
}

impl Feature {
    pub const ALL: [Feature; 15] = [
        Feature::Connectable,
        Feature::Delete,
        Feature::Select,
        Feature::Bounds,
        Feature::Move,
        Feature::LayoutContainer,
        Feature::Fade,
        Feature::Hover,
        Feature::Popup,
        Feature::Edit,
        Feature::Align,
        Feature::LayoutableChild,
        Feature::EditLabel,
        Feature::Viewport,
        Feature::Export,
    ];

    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Bitset of [`Feature`]s, resolved once when an element is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Features(u32);

impl Features {
    pub const NONE: Features = Features(0);

    #[must_use]
    pub fn of(features: &[Feature]) -> Self {
        features.iter().fold(Self::NONE, |acc, f| acc.with(*f))
    }

    #[must_use]
    pub fn contains(self, feature: Feature) -> bool {
        self.0 & feature.bit() != 0
    }

    #[must_use]
    pub fn with(self, feature: Feature) -> Self {
        Self(self.0 | feature.bit())
    }

    #[must_use]
    pub fn without(self, feature: Feature) -> Self {
        Self(self.0 & !feature.bit())
    }

    pub fn iter(self) -> impl Iterator<Item = Feature> {
        Feature::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

/// Role of a routing handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    #[serde(rename = "source")]
    Source,
    #[serde(rename = "target")]
    Target,
    #[serde(rename = "line")]
    Line,
    #[serde(rename = "junction")]
    Junction,
    #[serde(rename = "manhattan-50%")]
    Manhattan50,
    #[serde(rename = "bezier-control-before")]
    BezierControlBefore,
    #[serde(rename = "bezier-junction")]
    BezierJunction,
    #[serde(rename = "bezier-control-after")]
    BezierControlAfter,
    #[serde(rename = "bezier-add")]
    BezierAdd,
    #[serde(rename = "bezier-remove")]
    BezierRemove,
}

impl HandleKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
            Self::Line => "line",
            Self::Junction => "junction",
            Self::Manhattan50 => "manhattan-50%",
            Self::BezierControlBefore => "bezier-control-before",
            Self::BezierJunction => "bezier-junction",
            Self::BezierControlAfter => "bezier-control-after",
            Self::BezierAdd => "bezier-add",
            Self::BezierRemove => "bezier-remove",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        [
            Self::Source,
            Self::Target,
            Self::Line,
            Self::Junction,
            Self::Manhattan50,
            Self::BezierControlBefore,
            Self::BezierJunction,
            Self::BezierControlAfter,
            Self::BezierAdd,
            Self::BezierRemove,
        ]
        .into_iter()
        .find(|kind| kind.as_str() == raw)
    }

    /// Whether the handle is a transient one shown only between real points.
    #[must_use]
    pub fn is_volatile(self) -> bool {
        matches!(self, Self::Line | Self::Manhattan50)
    }
}

/// Edge-specific state. Endpoint ids change only through [`Model::reconnect`]
/// so the incoming/outgoing index stays in sync.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EdgeData {
    source_id: String,
    target_id: String,
    pub routing_points: Vec<Point>,
    pub router_kind: Option<String>,
    pub source_anchor_correction: Option<f64>,
    pub target_anchor_correction: Option<f64>,
    /// Optional wire fields the edge was created from, present even if empty.
    pub wire: WireFields,
}

/// Presence of the optional edge fields in the wire record an edge came from.
/// Serialization emits an empty value only where one was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WireFields {
    pub source_id: bool,
    pub target_id: bool,
    pub routing_points: bool,
}

impl EdgeData {
    #[must_use]
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self { source_id: source_id.into(), target_id: target_id.into(), ..Self::default() }
    }

    #[must_use]
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    #[must_use]
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    #[must_use]
    pub fn is_self_edge(&self) -> bool {
        !self.source_id.is_empty() && self.source_id == self.target_id
    }
}

/// Routing-handle state.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleData {
    pub kind: HandleKind,
    /// Index into the owning edge's routing points. `-2` marks the source
    /// handle, `-1` the segment leaving the source.
    pub point_index: i32,
    pub edit_mode: bool,
    /// Dangling anchor currently standing in for the endpoint this handle drags.
    pub dangling_anchor: Option<String>,
    /// Endpoint the edge was attached to before it was detached.
    pub original_endpoint: Option<String>,
}

impl HandleData {
    #[must_use]
    pub fn new(kind: HandleKind, point_index: i32) -> Self {
        Self { kind, point_index, edit_mode: false, dangling_anchor: None, original_endpoint: None }
    }
}

// =============================================================================
// ELEMENT
// =============================================================================

/// One node of the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: String,
    pub kind: ElementType,
    pub features: Features,
    parent: Option<String>,
    children: Vec<String>,
    pub position: Option<Point>,
    pub size: Option<Dimension>,
    pub alignment: Option<Point>,
    pub edge: Option<EdgeData>,
    pub handle: Option<HandleData>,
    pub anchor_kind: Option<String>,
    pub text: Option<String>,
    pub scroll: Option<Point>,
    pub zoom: Option<f64>,
    pub canvas_bounds: Option<Bounds>,
    pub selected: bool,
    pub hover_feedback: bool,
    pub opacity: f64,
    pub props: serde_json::Map<String, serde_json::Value>,
}

impl Element {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ElementType, features: Features) -> Self {
        Self {
            id: id.into(),
            kind,
            features,
            parent: None,
            children: Vec::new(),
            position: None,
            size: None,
            alignment: None,
            edge: None,
            handle: None,
            anchor_kind: None,
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

    #[must_use]
    pub fn has(&self, feature: Feature) -> bool {
        self.features.contains(feature)
    }

    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    #[must_use]
    pub fn children(&self) -> &[String] {
        &self.children
    }

    #[must_use]
    pub fn basic(&self) -> BasicType {
        self.kind.basic
    }

    #[must_use]
    pub fn is_edge(&self) -> bool {
        self.edge.is_some()
    }

    /// Bounds in the parent's coordinate system. Missing position is the
    /// origin; missing size is the invalid [`Dimension::EMPTY`].
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::from_parts(self.position.unwrap_or_default(), self.size.unwrap_or_default())
    }

    /// Copy every non-structural property of `other` onto `self`.
    fn assign_properties(&mut self, other: &Element) {
        let parent = self.parent.take();
        let children = std::mem::take(&mut self.children);
        *self = Element { parent, children, ..other.clone() };
    }
}

/// A detached element together with its descendants.
#[derive(Debug, Clone, PartialEq)]
pub struct Subtree {
    pub element: Element,
    pub children: Vec<Subtree>,
}

impl Subtree {
    #[must_use]
    pub fn leaf(element: Element) -> Self {
        Self { element, children: Vec::new() }
    }

    /// Ids in preorder.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids(&self, out: &mut Vec<String>) {
        out.push(self.element.id.clone());
        for child in &self.children {
            child.collect_ids(out);
        }
    }
}

/// What [`Model::remove`] hands back: enough to re-insert losslessly.
#[derive(Debug, Clone, PartialEq)]
pub struct Removed {
    pub subtree: Subtree,
    pub parent: String,
    pub index: usize,
}

// =============================================================================
// MODEL
// =============================================================================

/// A scene-graph root with its id index and edge maps.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    root: String,
    elements: HashMap<String, Element>,
    incoming: BTreeMap<String, BTreeSet<String>>,
    outgoing: BTreeMap<String, BTreeSet<String>>,
}

impl Model {
    /// A model consisting only of `root`. Any children the element claims are dropped.
    #[must_use]
    pub fn new(mut root: Element) -> Self {
        root.parent = None;
        root.children.clear();
        let id = root.id.clone();
        let mut elements = HashMap::new();
        elements.insert(id.clone(), root);
        Self { root: id, elements, incoming: BTreeMap::new(), outgoing: BTreeMap::new() }
    }

    #[must_use]
    pub fn root_id(&self) -> &str {
        &self.root
    }

    #[must_use]
    pub fn root(&self) -> &Element {
        &self.elements[&self.root]
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.len() <= 1
    }

    #[must_use]
    pub fn children(&self, id: &str) -> &[String] {
        self.elements.get(id).map_or(&[], |e| e.children.as_slice())
    }

    #[must_use]
    pub fn parent_id(&self, id: &str) -> Option<&str> {
        self.elements.get(id).and_then(|e| e.parent.as_deref())
    }

    /// Position of `id` among its siblings.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        let parent = self.parent_id(id)?;
        self.children(parent).iter().position(|c| c == id)
    }

    /// Elements in preorder starting at the root.
    #[must_use]
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder { model: self, stack: vec![self.root.as_str()] }
    }

    /// Ids of all descendants of `id` in preorder, excluding `id` itself.
    #[must_use]
    pub fn descendants(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack: Vec<&str> = self.children(id).iter().rev().map(String::as_str).collect();
        while let Some(next) = stack.pop() {
            out.push(next.to_string());
            stack.extend(self.children(next).iter().rev().map(String::as_str));
        }
        out
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    #[must_use]
    pub fn is_descendant_of(&self, id: &str, ancestor: &str) -> bool {
        let mut current = self.parent_id(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent_id(parent);
        }
        false
    }

    /// A detached deep copy of the subtree rooted at `id`.
    #[must_use]
    pub fn subtree(&self, id: &str) -> Option<Subtree> {
        let element = self.elements.get(id)?;
        let children = element.children.iter().filter_map(|child| self.subtree(child)).collect();
        Some(Subtree { element: element.clone(), children })
    }

    // ── Structural edits ────────────────────────────────────────

    /// Attach `subtree` under `parent_id` at `index` (append when `None` or past the end).
    pub fn insert(&mut self, parent_id: &str, index: Option<usize>, subtree: Subtree) -> Result<(), SceneError> {
        if !self.elements.contains_key(parent_id) {
            return Err(SceneError::UnknownParent(parent_id.to_string()));
        }
        let mut seen = BTreeSet::new();
        for id in subtree.ids() {
            if self.elements.contains_key(&id) || !seen.insert(id.clone()) {
                return Err(SceneError::DuplicateId(id));
            }
        }
        let id = subtree.element.id.clone();
        self.attach(parent_id, subtree);
        if let Some(parent) = self.elements.get_mut(parent_id) {
            let at = index.unwrap_or(parent.children.len()).min(parent.children.len());
            parent.children.insert(at, id);
        }
        Ok(())
    }

    fn attach(&mut self, parent_id: &str, subtree: Subtree) {
        let Subtree { mut element, children } = subtree;
        element.parent = Some(parent_id.to_string());
        element.children = children.iter().map(|c| c.element.id.clone()).collect();
        let id = element.id.clone();
        if let Some(edge) = &element.edge {
            self.index_edge(&id, edge.source_id.clone(), edge.target_id.clone());
        }
        self.elements.insert(id.clone(), element);
        for child in children {
            self.attach(&id, child);
        }
    }

    /// Detach `id` and its descendants.
    pub fn remove(&mut self, id: &str) -> Result<Removed, SceneError> {
        if id == self.root {
            return Err(SceneError::RootElement(id.to_string()));
        }
        let Some(parent) = self.parent_id(id).map(str::to_string) else {
            return Err(SceneError::UnknownElement(id.to_string()));
        };
        let index = self.index_of(id).unwrap_or(0);
        if let Some(p) = self.elements.get_mut(&parent) {
            p.children.retain(|c| c != id);
        }
        let subtree = self.detach(id);
        match subtree {
            Some(subtree) => Ok(Removed { subtree, parent, index }),
            None => Err(SceneError::UnknownElement(id.to_string())),
        }
    }

    fn detach(&mut self, id: &str) -> Option<Subtree> {
        let mut element = self.elements.remove(id)?;
        if let Some(edge) = &element.edge {
            self.unindex_edge(id, &edge.source_id, &edge.target_id);
        }
        let child_ids = std::mem::take(&mut element.children);
        element.parent = None;
        let children = child_ids.iter().filter_map(|c| self.detach(c)).collect();
        Some(Subtree { element, children })
    }

    /// Move `id` to position `new_index` among its siblings.
    pub fn move_child(&mut self, id: &str, new_index: usize) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::RootElement(id.to_string()));
        }
        let parent = self.parent_id(id).map(str::to_string).ok_or_else(|| SceneError::UnknownElement(id.to_string()))?;
        if let Some(p) = self.elements.get_mut(&parent) {
            p.children.retain(|c| c != id);
            let at = new_index.min(p.children.len());
            p.children.insert(at, id.to_string());
        }
        Ok(())
    }

    /// Move `id` under a different parent, keeping its subtree intact.
    pub fn reparent(&mut self, id: &str, new_parent: &str, index: Option<usize>) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::RootElement(id.to_string()));
        }
        if !self.elements.contains_key(new_parent) {
            return Err(SceneError::UnknownParent(new_parent.to_string()));
        }
        if id == new_parent || self.is_descendant_of(new_parent, id) {
            return Err(SceneError::CyclicParent { element: id.to_string(), parent: new_parent.to_string() });
        }
        let old_parent =
            self.parent_id(id).map(str::to_string).ok_or_else(|| SceneError::UnknownElement(id.to_string()))?;
        if let Some(p) = self.elements.get_mut(&old_parent) {
            p.children.retain(|c| c != id);
        }
        if let Some(p) = self.elements.get_mut(new_parent) {
            let at = index.unwrap_or(p.children.len()).min(p.children.len());
            p.children.insert(at, id.to_string());
        }
        if let Some(e) = self.elements.get_mut(id) {
            e.parent = Some(new_parent.to_string());
        }
        Ok(())
    }

    /// Point an edge at new endpoints and refresh the edge maps.
    pub fn reconnect(&mut self, edge_id: &str, source_id: &str, target_id: &str) -> Result<(), SceneError> {
        let Some((old_source, old_target)) = self
            .elements
            .get(edge_id)
            .and_then(|e| e.edge.as_ref())
            .map(|edge| (edge.source_id.clone(), edge.target_id.clone()))
        else {
            return Err(SceneError::UnknownElement(edge_id.to_string()));
        };
        self.unindex_edge(edge_id, &old_source, &old_target);
        if let Some(edge) = self.elements.get_mut(edge_id).and_then(|e| e.edge.as_mut()) {
            edge.source_id = source_id.to_string();
            edge.target_id = target_id.to_string();
        }
        self.index_edge(edge_id, source_id.to_string(), target_id.to_string());
        Ok(())
    }

    /// Overwrite every non-structural property of `id` with those of `from`,
    /// including edge endpoints. The edge maps follow the new endpoints.
    pub fn replace_properties(&mut self, id: &str, from: &Element) -> Result<(), SceneError> {
        let element = self.elements.get_mut(id).ok_or_else(|| SceneError::UnknownElement(id.to_string()))?;
        let old_endpoints = element.edge.as_ref().map(|e| (e.source_id.clone(), e.target_id.clone()));
        element.assign_properties(from);
        element.id = id.to_string();
        let new_endpoints = element.edge.as_ref().map(|e| (e.source_id.clone(), e.target_id.clone()));
        if let Some((source, target)) = old_endpoints {
            self.unindex_edge(id, &source, &target);
        }
        if let Some((source, target)) = new_endpoints {
            self.index_edge(id, source, target);
        }
        Ok(())
    }

    // ── Edge index ──────────────────────────────────────────────

    fn index_edge(&mut self, edge_id: &str, source: String, target: String) {
        if !source.is_empty() {
            self.outgoing.entry(source).or_default().insert(edge_id.to_string());
        }
        if !target.is_empty() {
            self.incoming.entry(target).or_default().insert(edge_id.to_string());
        }
    }

    fn unindex_edge(&mut self, edge_id: &str, source: &str, target: &str) {
        if let Some(set) = self.outgoing.get_mut(source) {
            set.remove(edge_id);
            if set.is_empty() {
                self.outgoing.remove(source);
            }
        }
        if let Some(set) = self.incoming.get_mut(target) {
            set.remove(edge_id);
            if set.is_empty() {
                self.incoming.remove(target);
            }
        }
    }

    /// Edges whose target is `id`, ordered by edge id.
    pub fn incoming_edges(&self, id: &str) -> impl Iterator<Item = &str> {
        self.incoming.get(id).into_iter().flatten().map(String::as_str)
    }

    /// Edges whose source is `id`, ordered by edge id.
    pub fn outgoing_edges(&self, id: &str) -> impl Iterator<Item = &str> {
        self.outgoing.get(id).into_iter().flatten().map(String::as_str)
    }

    /// Edges attached to `id` or to any of its descendants, deduplicated.
    #[must_use]
    pub fn attached_edges(&self, id: &str) -> Vec<String> {
        let mut ids = vec![id.to_string()];
        ids.extend(self.descendants(id));
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for element in &ids {
            for edge in self.incoming_edges(element).chain(self.outgoing_edges(element)) {
                if seen.insert(edge.to_string()) {
                    out.push(edge.to_string());
                }
            }
        }
        out
    }

    // ── Geometry ────────────────────────────────────────────────

    /// Bounds of `id` in its parent's coordinate system.
    #[must_use]
    pub fn bounds(&self, id: &str) -> Bounds {
        self.elements.get(id).map_or(Bounds::EMPTY, Element::bounds)
    }

    /// Offset of the coordinate system of `id` from the root's.
    #[must_use]
    pub fn origin(&self, id: &str) -> Point {
        let mut offset = Point::ORIGIN;
        let mut current = Some(id);
        while let Some(cid) = current {
            if cid == self.root {
                break;
            }
            let Some(element) = self.elements.get(cid) else {
                break;
            };
            offset = add(offset, element.position.unwrap_or_default());
            current = element.parent.as_deref();
        }
        offset
    }

    /// Bounds of `id` in the root's coordinate system.
    #[must_use]
    pub fn absolute_bounds(&self, id: &str) -> Bounds {
        let bounds = self.bounds(id);
        match self.parent_id(id) {
            Some(parent) => bounds.translate(self.origin(parent)),
            None => bounds,
        }
    }

    /// Convert `point` from the coordinate system of `from` to that of `to`.
    #[must_use]
    pub fn translate_point(&self, point: Point, from: &str, to: &str) -> Point {
        if from == to {
            return point;
        }
        subtract(add(point, self.origin(from)), self.origin(to))
    }

    /// Convert `bounds` from the coordinate system of `from` to that of `to`.
    #[must_use]
    pub fn translate_bounds(&self, bounds: Bounds, from: &str, to: &str) -> Bounds {
        let p = self.translate_point(bounds.position(), from, to);
        Bounds::from_parts(p, bounds.size())
    }
}

/// Preorder iterator over a model, see [`Model::preorder`].
pub struct Preorder<'a> {
    model: &'a Model,
    stack: Vec<&'a str>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let element = self.model.elements.get(id)?;
        self.stack.extend(element.children.iter().rev().map(String::as_str));
        Some(element)
    }
}
