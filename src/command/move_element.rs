//! Moving elements and routing handles.
//!
//! DESIGN
//! ======
//! A move resolves every entry once, at execute time, into either a node move
//! (`from` → `to` in the parent's coordinates) or a handle move grouped by its
//! edge. Edges touched by the move are snapshotted before and after so undo
//! and redo restore their routing exactly:
//!
//! - an edge whose source and target both move by the same delta is
//!   translated rigidly;
//! - an edge with only one moving end is cleaned up by its router;
//! - handle moves go through the router, which may detach an end onto a
//!   dangling anchor.
//!
//! Dangling anchors live under the root, outside the edge, so their state is
//! recorded separately and restored around the edge snapshots.

#[cfg(test)]
#[path = "move_element_test.rs"]
mod move_element_test;

use std::any::Any;

use indexmap::IndexMap;
use scene::geometry::{Point, add, points_almost_equal, subtract};
use scene::model::{Feature, HandleKind, Model, Subtree};
use scene::routing::{EdgeSnapshot, ResolvedHandleMove};
use tracing::{debug, warn};

use super::{Command, CommandContext, CommandError, CommandResult};
use crate::action::ElementMove;
use crate::animation::{ElementTween, MoveAnimation};

#[derive(Debug, Clone, Copy, PartialEq)]
struct NodeMove {
    from: Point,
    to: Point,
}

impl NodeMove {
    fn delta(self) -> Point {
        subtract(self.to, self.from)
    }
}

/// A dangling anchor's state before and after the move.
#[derive(Debug, Clone)]
struct AnchorState {
    id: String,
    before: Option<Subtree>,
    after: Option<Subtree>,
}

/// Move nodes and routing handles.
#[derive(Debug)]
pub struct MoveCommand {
    moves: Vec<ElementMove>,
    animate: bool,
    nodes: IndexMap<String, NodeMove>,
    handles: IndexMap<String, Vec<ResolvedHandleMove>>,
    before: IndexMap<String, EdgeSnapshot>,
    after: IndexMap<String, EdgeSnapshot>,
    anchors: Vec<AnchorState>,
}

impl MoveCommand {
    #[must_use]
    pub fn new(moves: Vec<ElementMove>, animate: bool) -> Self {
        Self {
            moves,
            animate,
            nodes: IndexMap::new(),
            handles: IndexMap::new(),
            before: IndexMap::new(),
            after: IndexMap::new(),
            anchors: Vec::new(),
        }
    }

    fn element_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str).chain(self.handles.values().flatten().map(|m| m.handle_id.as_str()))
    }

    fn resolve(&mut self, model: &Model, ctx: &CommandContext) {
        let moves = std::mem::take(&mut self.moves);
        for mv in &moves {
            let Some(element) = model.get(&mv.element_id) else {
                warn!(element_id = %mv.element_id, "move of unknown element skipped");
                continue;
            };
            if element.handle.is_some() {
                let Some(edge_id) = element.parent().filter(|p| model.get(p).is_some_and(|e| e.is_edge())) else {
                    continue;
                };
                let from = mv.from_position.or_else(|| {
                    let router = ctx.routers.for_edge(model, edge_id);
                    let route = router.route(model, edge_id);
                    router.handle_position(model, edge_id, &route, &mv.element_id)
                });
                let from = from.unwrap_or(mv.to_position);
                self.handles.entry(edge_id.to_string()).or_default().push(ResolvedHandleMove {
                    handle_id: mv.element_id.clone(),
                    from,
                    to: mv.to_position,
                });
            } else if element.has(Feature::Move) {
                let from = mv.from_position.or(element.position).unwrap_or_default();
                self.nodes.insert(mv.element_id.clone(), NodeMove { from, to: mv.to_position });
            } else {
                debug!(element_id = %mv.element_id, "element is not movable");
            }
        }
        self.moves = moves;
    }

    /// Delta of the moved node that carries `id` along, if any.
    fn carried_by(&self, model: &Model, id: &str) -> Option<Point> {
        let mut current = Some(id);
        while let Some(cid) = current {
            if let Some(m) = self.nodes.get(cid) {
                return Some(m.delta());
            }
            current = model.parent_id(cid);
        }
        None
    }

    fn touched_edges(&self, model: &Model) -> Vec<String> {
        let mut edges: Vec<String> = self.handles.keys().cloned().collect();
        for id in self.nodes.keys() {
            for edge in model.attached_edges(id) {
                if !edges.contains(&edge) {
                    edges.push(edge);
                }
            }
        }
        edges
    }

    fn set_positions(&self, model: &mut Model, to: bool) {
        for (id, m) in &self.nodes {
            if let Some(element) = model.get_mut(id) {
                element.position = Some(if to { m.to } else { m.from });
            }
        }
    }

    async fn move_nodes(&self, model: &mut Model, ctx: &CommandContext, forward: bool) {
        if self.animate && !self.nodes.is_empty() {
            let tweens = self
                .nodes
                .iter()
                .map(|(id, m)| ElementTween {
                    element_id: id.clone(),
                    from: if forward { m.from } else { m.to },
                    to: if forward { m.to } else { m.from },
                })
                .collect();
            ctx.animate(&MoveAnimation::new(tweens), model).await;
        }
        self.set_positions(model, forward);
    }

    fn follow_nodes(&self, model: &mut Model, ctx: &CommandContext) -> Result<(), CommandError> {
        for edge_id in self.before.keys() {
            if self.handles.contains_key(edge_id) {
                continue;
            }
            let Some((source, target, parent)) = model.get(edge_id).and_then(|e| {
                let data = e.edge.as_ref()?;
                Some((data.source_id().to_string(), data.target_id().to_string(), e.parent()?.to_string()))
            }) else {
                continue;
            };
            if self.carried_by(model, &parent).is_some() {
                continue;
            }
            match (self.carried_by(model, &source), self.carried_by(model, &target)) {
                (Some(a), Some(b)) if points_almost_equal(a, b) => {
                    if let Some(edge) = model.get_mut(edge_id).and_then(|e| e.edge.as_mut()) {
                        for p in &mut edge.routing_points {
                            *p = add(*p, a);
                        }
                    }
                }
                (None, None) => {}
                _ => ctx.routers.for_edge(model, edge_id).commit_cleanup(model, edge_id, false)?,
            }
        }
        Ok(())
    }

    fn anchor_ids(&self) -> Vec<String> {
        self.handles
            .keys()
            .flat_map(|edge| {
                [HandleKind::Source, HandleKind::Target].map(|kind| format!("{edge}_dangling-{}", kind.as_str()))
            })
            .collect()
    }

    fn restore_edges(&self, model: &mut Model, ctx: &CommandContext, after: bool) -> Result<(), CommandError> {
        let pick = |a: &AnchorState| if after { a.after.clone() } else { a.before.clone() };
        let root = model.root_id().to_string();
        for anchor in &self.anchors {
            let Some(state) = pick(anchor) else {
                continue;
            };
            match model.get_mut(&anchor.id) {
                Some(existing) => existing.position = state.element.position,
                None => model.insert(&root, None, state)?,
            }
        }
        let snapshots = if after { &self.after } else { &self.before };
        for snapshot in snapshots.values() {
            if model.contains(&snapshot.edge_id) {
                ctx.routers.get(snapshot.router_kind.as_deref()).apply_snapshot(model, snapshot)?;
            }
        }
        for anchor in &self.anchors {
            if pick(anchor).is_none() && model.contains(&anchor.id) {
                model.remove(&anchor.id)?;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Command for MoveCommand {
    fn name(&self) -> &'static str {
        "move"
    }

    async fn execute(&mut self, mut model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        self.resolve(&model, ctx);
        for edge_id in self.touched_edges(&model) {
            if let Some(snapshot) = ctx.routers.for_edge(&model, &edge_id).take_snapshot(&model, &edge_id) {
                self.before.insert(edge_id, snapshot);
            }
        }
        let anchors_before: Vec<(String, Option<Subtree>)> =
            self.anchor_ids().into_iter().map(|id| (id.clone(), model.subtree(&id))).collect();

        self.move_nodes(&mut model, ctx, true).await;
        self.follow_nodes(&mut model, ctx)?;
        for (edge_id, moves) in &self.handles {
            ctx.routers.for_edge(&model, edge_id).apply_handle_moves(&mut model, edge_id, moves)?;
        }

        for edge_id in self.before.keys() {
            if let Some(snapshot) = ctx.routers.for_edge(&model, edge_id).take_snapshot(&model, edge_id) {
                self.after.insert(edge_id.clone(), snapshot);
            }
        }
        self.anchors = anchors_before
            .into_iter()
            .map(|(id, before)| {
                let after = model.subtree(&id);
                AnchorState { id, before, after }
            })
            .filter(|a| a.before.is_some() || a.after.is_some())
            .collect();
        debug!(nodes = self.nodes.len(), edges = self.before.len(), animate = self.animate, "elements moved");
        Ok(CommandResult::changed(model))
    }

    async fn undo(&mut self, mut model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        self.move_nodes(&mut model, ctx, false).await;
        self.restore_edges(&mut model, ctx, false)?;
        Ok(CommandResult::changed(model))
    }

    async fn redo(&mut self, mut model: Model, ctx: &CommandContext) -> Result<CommandResult, CommandError> {
        self.move_nodes(&mut model, ctx, true).await;
        self.restore_edges(&mut model, ctx, true)?;
        Ok(CommandResult::changed(model))
    }

    /// Consecutive unanimated moves of overlapping elements form one undo
    /// step: the earliest "before" and the latest "after" are kept.
    fn merge(&mut self, other: &dyn Command, _ctx: &CommandContext) -> bool {
        let Some(other) = other.as_any().downcast_ref::<MoveCommand>() else {
            return false;
        };
        if self.animate || other.animate {
            return false;
        }
        let overlaps = other.element_ids().any(|id| self.element_ids().any(|own| own == id));
        if !overlaps {
            return false;
        }
        for (id, m) in &other.nodes {
            self.nodes.entry(id.clone()).and_modify(|own| own.to = m.to).or_insert(*m);
        }
        for (edge_id, moves) in &other.handles {
            self.handles.entry(edge_id.clone()).or_default().extend(moves.iter().cloned());
        }
        for (edge_id, snapshot) in &other.before {
            self.before.entry(edge_id.clone()).or_insert_with(|| snapshot.clone());
        }
        for (edge_id, snapshot) in &other.after {
            self.after.insert(edge_id.clone(), snapshot.clone());
        }
        for anchor in &other.anchors {
            match self.anchors.iter_mut().find(|a| a.id == anchor.id) {
                Some(own) => own.after.clone_from(&anchor.after),
                None => self.anchors.push(anchor.clone()),
            }
        }
        self.moves.extend(other.moves.iter().cloned());
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
