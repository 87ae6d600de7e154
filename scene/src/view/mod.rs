//! View synchronization.
//!
//! [`SceneView`] keeps one [`ViewNode`] per model node id and patches itself
//! from the change journal of executed operations. It is only reconciled
//! after a whole operation (a composite counts as one) has been applied, so
//! intermediate states are never visible.

mod node;

use std::collections::{HashMap, HashSet};

use canvas_core::math::{Mat3, Point2, Rect, inverse_transform_point};

use crate::asset::AssetRef;
use crate::id::NodeId;
use crate::model::{ModelNode, SceneDocument};
use crate::state::{SceneChange, SceneModel};

pub use node::{PLACEHOLDER_FRAME, ViewNode};

/// What one reconcile pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub created: usize,
    pub destroyed: usize,
    pub refreshed: usize,
    pub selection_changed: bool,
}

/// Arena of view nodes mirroring one scene document.
#[derive(Debug, Default)]
pub struct SceneView {
    root: Option<NodeId>,
    nodes: HashMap<NodeId, ViewNode>,
    pass: u64,
    library_revision: u64,
}

impl SceneView {
    /// Builds the view of the whole document.
    pub fn build(model: &SceneModel) -> Self {
        let mut view = Self {
            root: Some(model.document().root()),
            library_revision: model.library().read().revision(),
            ..Self::default()
        };
        let mut stats = ReconcileStats::default();
        view.sync_subtree(model, model.document().root(), &mut stats);
        log::debug!("built scene view with {} nodes", view.nodes.len());
        view
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&ViewNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of `id` in z-order (back to front).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Applies the changes of one executed operation.
    ///
    /// Nodes that leave the tree and come back in the same batch (moves,
    /// z-order changes) keep their view node; only nodes that are gone at
    /// the end of the batch are destroyed.
    pub fn reconcile(&mut self, model: &SceneModel, changes: &[SceneChange]) -> ReconcileStats {
        self.pass += 1;
        let mut stats = ReconcileStats::default();
        let doc = model.document();

        let revision = model.library().read().revision();
        if revision != self.library_revision {
            self.library_revision = revision;
            self.sync_subtree(model, doc.root(), &mut stats);
        }

        let mut detached = HashSet::new();
        let mut touched_parents = HashSet::new();
        for change in changes {
            match change {
                SceneChange::Removed { id, parent } => {
                    if let Some(p) = self.nodes.get_mut(parent) {
                        p.children.retain(|c| c != id);
                    }
                    detached.extend(self.view_subtree(*id));
                    touched_parents.insert(*parent);
                }
                SceneChange::Added(id) => {
                    if !doc.contains(*id) {
                        continue;
                    }
                    for n in doc.subtree(*id) {
                        detached.remove(&n);
                    }
                    self.sync_subtree(model, *id, &mut stats);
                    if let Some(parent) = doc.parent_of(*id) {
                        touched_parents.insert(parent);
                    }
                }
                SceneChange::Updated { id, .. } => {
                    if doc.contains(*id) {
                        self.sync_subtree(model, *id, &mut stats);
                    }
                }
                SceneChange::SelectionChanged => stats.selection_changed = true,
                SceneChange::RevealInOutline(ids) => {
                    for id in ids {
                        for ancestor in doc.ancestors(*id) {
                            if let Some(n) = self.nodes.get_mut(&ancestor) {
                                n.expanded = true;
                            }
                        }
                    }
                }
            }
        }

        for parent in touched_parents {
            if let Some(node) = doc.get(parent)
                && let Some(view) = self.nodes.get_mut(&parent)
            {
                view.children = node.children().to_vec();
            }
        }
        for id in detached {
            if !doc.contains(id) && self.nodes.remove(&id).is_some() {
                stats.destroyed += 1;
            }
        }
        stats
    }

    /// Creates or refreshes the view nodes of `id` and its descendants.
    fn sync_subtree(&mut self, model: &SceneModel, id: NodeId, stats: &mut ReconcileStats) {
        let doc = model.document();
        let parent_world = doc
            .parent_of(id)
            .and_then(|p| self.nodes.get(&p))
            .map_or_else(Mat3::identity, |p| p.world);
        let mut stack = vec![(id, parent_world)];
        while let Some((current, parent_world)) = stack.pop() {
            let resolved = match model.resolved(current) {
                Ok(node) => node,
                Err(err) => {
                    log::warn!("view sync skipped {current}: {err}");
                    continue;
                }
            };
            let world = match self.nodes.get_mut(&current) {
                Some(view) => {
                    view.refresh(&resolved, &parent_world, model.assets());
                    stats.refreshed += 1;
                    view.world
                }
                None => {
                    let view = ViewNode::new(&resolved, &parent_world, model.assets(), self.pass);
                    let world = view.world;
                    self.nodes.insert(current, view);
                    stats.created += 1;
                    world
                }
            };
            for child in resolved.children().iter().rev() {
                stack.push((*child, world));
            }
        }
    }

    fn view_subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                out.push(current);
                stack.extend(node.children.iter().copied());
            }
        }
        out
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Topmost pickable node under a world-space point.
    ///
    /// Hits inside a closed group report the outermost closed group, which
    /// is picked as a unit.
    pub fn hit_test(&self, point: Point2) -> Option<NodeId> {
        let root = self.root?;
        let hit = self.hit_in(root, point)?;
        Some(self.outermost_closed(hit).unwrap_or(hit))
    }

    fn hit_in(&self, id: NodeId, point: Point2) -> Option<NodeId> {
        let node = self.nodes.get(&id)?;
        if !node.visible {
            return None;
        }
        for child in node.children.iter().rev() {
            if let Some(hit) = self.hit_in(*child, point) {
                return Some(hit);
            }
        }
        let bounds = node.local_bounds?;
        let local = inverse_transform_point(&node.world, point)?;
        (node.pickable && bounds.contains(local)).then_some(id)
    }

    fn outermost_closed(&self, id: NodeId) -> Option<NodeId> {
        let mut found = None;
        let mut current = self.nodes.get(&id).and_then(|n| n.parent);
        while let Some(parent) = current {
            let Some(node) = self.nodes.get(&parent) else {
                break;
            };
            if node.closed && Some(parent) != self.root {
                found = Some(parent);
            }
            current = node.parent;
        }
        found
    }

    /// Depth-first walk in z-order yielding the model nodes behind the view.
    ///
    /// Groups are visited (before their children) only with
    /// `include_groups`; their children are always walked.
    pub fn walk_tree(
        &self,
        doc: &SceneDocument,
        include_groups: bool,
        visitor: &mut dyn FnMut(&ModelNode),
    ) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let (Some(view), Some(model)) = (self.nodes.get(&id), doc.get(id)) else {
                continue;
            };
            if !view.is_group || include_groups {
                visitor(model);
            }
            stack.extend(view.children.iter().rev().copied());
        }
    }

    /// Nodes whose world bounds lie inside `rect`.
    ///
    /// Open groups are searched, closed groups are taken as a unit when all
    /// of their content is inside.
    pub fn select_in_rect(&self, rect: Rect) -> Vec<NodeId> {
        let mut out = Vec::new();
        if let Some(root) = self.root {
            for child in self.children(root) {
                self.collect_in_rect(*child, &rect, &mut out);
            }
        }
        out
    }

    fn collect_in_rect(&self, id: NodeId, rect: &Rect, out: &mut Vec<NodeId>) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if !node.visible {
            return;
        }
        if node.is_group && !node.closed {
            for child in &node.children {
                self.collect_in_rect(*child, rect, out);
            }
        } else if node.pickable
            && let Some(bounds) = self.content_bounds(id)
            && rect.contains_rect(&bounds)
        {
            out.push(id);
        }
    }

    /// World bounds of a node and everything below it.
    pub fn content_bounds(&self, id: NodeId) -> Option<Rect> {
        let mut acc: Option<Rect> = None;
        for n in self.view_subtree(id) {
            let Some(b) = self.nodes.get(&n).and_then(ViewNode::world_bounds) else {
                continue;
            };
            acc = Some(match acc {
                None => b,
                Some(a) => Rect::from_corners(
                    Point2::new(a.x.min(b.x), a.y.min(b.y)),
                    Point2::new(a.right().max(b.right()), a.bottom().max(b.bottom())),
                ),
            });
        }
        acc
    }

    /// Every non-group node showing the same asset as `id`.
    ///
    /// Missing-asset placeholders compare by the reference recorded in their
    /// JSON, the same way as resolved nodes.
    pub fn nodes_with_same_asset(&self, doc: &SceneDocument, id: NodeId) -> Vec<NodeId> {
        let Some(asset) = self.nodes.get(&id).and_then(|n| n.asset.clone()) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        self.walk_tree(doc, false, &mut |node| {
            if self.asset_of(node.id) == Some(&asset) {
                out.push(node.id);
            }
        });
        out
    }

    fn asset_of(&self, id: NodeId) -> Option<&AssetRef> {
        self.nodes.get(&id).and_then(|n| n.asset.as_ref())
    }
}
