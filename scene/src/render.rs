//! Render pass: scene graph to a virtual-node tree.
//!
//! DESIGN
//! ======
//! Rendering is a pure function of the model. [`ModelRenderer::render`] routes
//! every edge once (so crossings between edges of different containers are
//! found too), then walks the tree from the root and asks the [`View`]
//! registered for each element to produce a [`VNode`]. Views recurse into
//! children through [`RenderContext::render_children`].
//!
//! The resulting tree is what a DOM/SVG adapter would diff and patch; this
//! crate never touches a real document.
//!
//! ERROR HANDLING
//! ==============
//! Rendering never fails. Elements without a view fall back to a visible
//! `missing` node, edges that cannot be routed render as a `dangling-edge`
//! group, and views may return `None` to skip an element entirely.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;

use crate::SceneError;
use crate::consts::{INTERSECTION_MARKER_RADIUS, ROUTING_HANDLE_RADIUS};
use crate::geometry::Point;
use crate::model::{BasicType, Element, ElementType, Model};
use crate::routing::{EdgeRouterRegistry, EdgeRouting, RoutedPoint, RoutedPointKind};

// =============================================================================
// VIRTUAL NODES
// =============================================================================

/// A retained-mode node: SVG-like tag, attributes, optional text and children.
/// `key` carries the element id for nodes that stand for a scene element.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VNode {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<VNode>,
}

impl VNode {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), ..Self::default() }
    }

    #[must_use]
    pub fn keyed(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn attr(mut self, name: &str, value: impl ToString) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    /// Append `class` to the `class` attribute.
    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        let classes = self.attrs.entry("class".to_string()).or_default();
        if !classes.is_empty() {
            classes.push(' ');
        }
        classes.push_str(class);
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn child(mut self, child: VNode) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<VNode>) -> Self {
        self.children.extend(children);
        self
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attrs.get("class").is_some_and(|c| c.split(' ').any(|c| c == class))
    }

    /// Depth-first search for the node keyed `key`.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&VNode> {
        if self.key.as_deref() == Some(key) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(key))
    }

    /// Number of nodes in the tree, including `self`.
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(VNode::count).sum::<usize>()
    }
}

// =============================================================================
// VIEWS
// =============================================================================

/// Everything a view may read while rendering.
pub struct RenderContext<'a> {
    pub model: &'a Model,
    pub routing: &'a EdgeRouting,
    pub routers: &'a EdgeRouterRegistry,
    views: &'a ViewRegistry,
}

impl RenderContext<'_> {
    /// Render one element with its registered view.
    #[must_use]
    pub fn render_element(&self, id: &str) -> Option<VNode> {
        let element = self.model.get(id)?;
        self.views.get(&element.kind).render(element, self)
    }

    /// Render the children of `id` in z-order.
    #[must_use]
    pub fn render_children(&self, id: &str) -> Vec<VNode> {
        self.model.children(id).iter().filter_map(|child| self.render_element(child)).collect()
    }
}

/// Turns one element into a virtual node.
pub trait View: Send + Sync {
    /// `None` skips the element and its subtree.
    fn render(&self, element: &Element, ctx: &RenderContext<'_>) -> Option<VNode>;
}

/// Views by full type string, then by basic type, then a fallback.
#[derive(Clone)]
pub struct ViewRegistry {
    by_type: HashMap<String, Arc<dyn View>>,
    by_basic: HashMap<BasicType, Arc<dyn View>>,
    missing: Arc<dyn View>,
}

impl ViewRegistry {
    /// A registry with no views; everything renders as missing.
    #[must_use]
    pub fn empty() -> Self {
        Self { by_type: HashMap::new(), by_basic: HashMap::new(), missing: Arc::new(MissingView) }
    }

    /// Default views for every graph basic type.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.by_basic.insert(BasicType::Graph, Arc::new(GraphView));
        registry.by_basic.insert(BasicType::GenericRoot, Arc::new(GraphView));
        registry.by_basic.insert(BasicType::Node, Arc::new(ShapeView { class: "node" }));
        registry.by_basic.insert(BasicType::Port, Arc::new(ShapeView { class: "port" }));
        registry.by_basic.insert(BasicType::Compartment, Arc::new(GroupView { class: "comp" }));
        registry.by_basic.insert(BasicType::Button, Arc::new(ShapeView { class: "button" }));
        registry.by_basic.insert(BasicType::Label, Arc::new(LabelView));
        registry.by_basic.insert(BasicType::Edge, Arc::new(EdgeView));
        registry.by_basic.insert(BasicType::RoutingHandle, Arc::new(RoutingHandleView));
        registry.by_basic.insert(BasicType::DanglingAnchor, Arc::new(EmptyView));
        registry
    }

    /// Register a view for one exact type string such as `node:circle`.
    pub fn register(&mut self, type_name: &str, view: Arc<dyn View>) -> Result<(), SceneError> {
        if self.by_type.contains_key(type_name) {
            return Err(SceneError::DuplicateRegistration(type_name.to_string()));
        }
        self.by_type.insert(type_name.to_string(), view);
        Ok(())
    }

    /// Replace the view used for every element of `basic` type without an
    /// exact registration.
    pub fn override_basic(&mut self, basic: BasicType, view: Arc<dyn View>) {
        self.by_basic.insert(basic, view);
    }

    #[must_use]
    pub fn get(&self, kind: &ElementType) -> &Arc<dyn View> {
        self.by_type.get(&kind.name).or_else(|| self.by_basic.get(&kind.basic)).unwrap_or(&self.missing)
    }
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&String> = self.by_type.keys().collect();
        types.sort();
        f.debug_struct("ViewRegistry").field("types", &types).field("basic", &self.by_basic.len()).finish()
    }
}

// ── Shared attributes ───────────────────────────────────────────

fn decorate(mut node: VNode, element: &Element) -> VNode {
    node = node.keyed(element.id.clone());
    if element.selected {
        node = node.class("selected");
    }
    if element.hover_feedback {
        node = node.class("mouseover");
    }
    if element.opacity < 1.0 {
        node = node.attr("opacity", element.opacity);
    }
    node
}

fn translate(position: Point) -> String {
    format!("translate({}, {})", position.x, position.y)
}

// ── Default views ───────────────────────────────────────────────

struct GraphView;

impl View for GraphView {
    fn render(&self, element: &Element, ctx: &RenderContext<'_>) -> Option<VNode> {
        let scroll = element.scroll.unwrap_or_default();
        let zoom = element.zoom.unwrap_or(1.0);
        let content = VNode::new("g")
            .attr("transform", format!("scale({zoom}) translate({}, {})", -scroll.x, -scroll.y))
            .with_children(ctx.render_children(&element.id));
        Some(decorate(VNode::new("svg").class("graph"), element).child(content))
    }
}

/// Rectangle-backed shape: node, port, button.
struct ShapeView {
    class: &'static str,
}

impl View for ShapeView {
    fn render(&self, element: &Element, ctx: &RenderContext<'_>) -> Option<VNode> {
        let size = element.size.unwrap_or_default();
        let outline = VNode::new("rect")
            .class(self.class)
            .attr("width", size.width.max(0.0))
            .attr("height", size.height.max(0.0));
        let group = VNode::new("g")
            .attr("transform", translate(element.position.unwrap_or_default()))
            .child(outline)
            .with_children(ctx.render_children(&element.id));
        Some(decorate(group, element))
    }
}

/// Plain translated group: compartments.
struct GroupView {
    class: &'static str,
}

impl View for GroupView {
    fn render(&self, element: &Element, ctx: &RenderContext<'_>) -> Option<VNode> {
        let group = VNode::new("g")
            .class(self.class)
            .attr("transform", translate(element.position.unwrap_or_default()))
            .with_children(ctx.render_children(&element.id));
        Some(decorate(group, element))
    }
}

/// Text. A label of an edge without its own position sits halfway along it.
struct LabelView;

impl View for LabelView {
    fn render(&self, element: &Element, ctx: &RenderContext<'_>) -> Option<VNode> {
        let on_edge = element.parent().filter(|p| ctx.model.get(p).is_some_and(Element::is_edge));
        let position = match (element.position, on_edge) {
            (Some(p), _) => p,
            (None, Some(edge_id)) => {
                let router = ctx.routers.for_edge(ctx.model, edge_id);
                router.point_at(ctx.model, edge_id, 0.5).unwrap_or_default()
            }
            (None, None) => Point::default(),
        };
        let text = VNode::new("text").class("label").text(element.text.clone().unwrap_or_default());
        Some(decorate(VNode::new("g").attr("transform", translate(position)).child(text), element))
    }
}

/// SVG path data for a route: cubic segments when the route carries bezier
/// controls, straight segments otherwise.
#[must_use]
pub fn path_data(route: &[RoutedPoint]) -> String {
    let mut d = String::new();
    let Some(first) = route.first() else {
        return d;
    };
    d.push_str(&format!("M {},{}", first.point.x, first.point.y));
    let is_bezier = route.iter().any(|rp| {
        matches!(rp.kind, RoutedPointKind::BezierControlAfter | RoutedPointKind::BezierControlBefore)
    });
    if is_bezier {
        for chunk in route[1..].chunks(3) {
            if let [c1, c2, end] = chunk {
                let (c1, c2, end) = (c1.point, c2.point, end.point);
                d.push_str(&format!(" C {},{} {},{} {},{}", c1.x, c1.y, c2.x, c2.y, end.x, end.y));
            }
        }
    } else {
        for rp in &route[1..] {
            d.push_str(&format!(" L {},{}", rp.point.x, rp.point.y));
        }
    }
    d
}

struct EdgeView;

impl View for EdgeView {
    fn render(&self, element: &Element, ctx: &RenderContext<'_>) -> Option<VNode> {
        let route = ctx.routing.get(&element.id).unwrap_or_default();
        if route.len() < 2 {
            let group = VNode::new("g").class("dangling-edge").with_children(ctx.render_children(&element.id));
            return Some(decorate(group, element));
        }
        let mut group = VNode::new("g").class("edge").child(VNode::new("path").attr("d", path_data(route)));
        for rp in route {
            for intersection in &rp.intersections {
                if intersection.routable1 == element.id {
                    group = group.child(
                        VNode::new("circle")
                            .class("intersection")
                            .attr("cx", intersection.intersection_point.x)
                            .attr("cy", intersection.intersection_point.y)
                            .attr("r", INTERSECTION_MARKER_RADIUS),
                    );
                }
            }
        }
        Some(decorate(group.with_children(ctx.render_children(&element.id)), element))
    }
}

struct RoutingHandleView;

impl View for RoutingHandleView {
    fn render(&self, element: &Element, ctx: &RenderContext<'_>) -> Option<VNode> {
        let handle = element.handle.as_ref()?;
        let edge_id = element.parent()?;
        let route = ctx.routing.get(edge_id)?;
        let position =
            ctx.routers.for_edge(ctx.model, edge_id).handle_position(ctx.model, edge_id, route, &element.id)?;
        let mut node = VNode::new("circle")
            .class("routing-point")
            .class(handle.kind.as_str())
            .attr("cx", position.x)
            .attr("cy", position.y)
            .attr("r", ROUTING_HANDLE_RADIUS);
        if handle.edit_mode {
            node = node.class("edit-mode");
        }
        Some(decorate(node, element))
    }
}

struct EmptyView;

impl View for EmptyView {
    fn render(&self, _element: &Element, _ctx: &RenderContext<'_>) -> Option<VNode> {
        None
    }
}

struct MissingView;

impl View for MissingView {
    fn render(&self, element: &Element, ctx: &RenderContext<'_>) -> Option<VNode> {
        let label = VNode::new("text").class("missing").text(format!("?{}?", element.kind.name));
        let group = VNode::new("g")
            .attr("transform", translate(element.position.unwrap_or_default()))
            .child(label)
            .with_children(ctx.render_children(&element.id));
        Some(decorate(group, element))
    }
}

// =============================================================================
// RENDERER
// =============================================================================

/// Routes and renders whole models.
#[derive(Debug, Clone, Default)]
pub struct ModelRenderer {
    views: ViewRegistry,
    routers: Arc<EdgeRouterRegistry>,
}

impl ModelRenderer {
    #[must_use]
    pub fn new(views: ViewRegistry, routers: Arc<EdgeRouterRegistry>) -> Self {
        Self { views, routers }
    }

    #[must_use]
    pub fn routers(&self) -> &Arc<EdgeRouterRegistry> {
        &self.routers
    }

    /// Render the whole model. Returns an empty `g` when the root view skips it.
    #[must_use]
    pub fn render(&self, model: &Model) -> VNode {
        let routing = self.routers.route_all_children(model, model.root_id());
        let ctx = RenderContext { model, routing: &routing, routers: &self.routers, views: &self.views };
        ctx.render_element(model.root_id()).unwrap_or_else(|| VNode::new("g"))
    }
}
