//! Arena document holding a scene tree.

use std::collections::HashMap;

use canvas_core::math::{Mat3, Point2, transform_point};

use crate::error::{SceneError, SceneResult};
use crate::id::NodeId;
use crate::model::node::ModelNode;

/// A scene tree stored as an id-indexed arena.
///
/// The root is always a group. Groups list child ids in z-order and every
/// other node points back at its group through `parent`, so the tree owns no
/// references and whole subtrees move by id.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDocument {
    root: NodeId,
    nodes: HashMap<NodeId, ModelNode>,
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneDocument {
    /// Creates a document with an empty root group.
    pub fn new() -> Self {
        Self::with_root(ModelNode::group().with_editor_name("world"))
    }

    /// Creates a document around `root`, which must be a group without
    /// children.
    pub(crate) fn with_root(mut root: ModelNode) -> Self {
        root.parent = None;
        let id = root.id;
        let mut nodes = HashMap::new();
        nodes.insert(id, root);
        Self { root: id, nodes }
    }

    /// Builds a document from a linked node list, root first, as produced by
    /// [`nodes_from_json`](crate::model::json::nodes_from_json).
    pub(crate) fn from_loaded(nodes: Vec<ModelNode>) -> Self {
        let root = nodes.first().map(|n| n.id).unwrap_or_else(NodeId::new);
        let nodes = nodes.into_iter().map(|n| (n.id, n)).collect();
        Self { root, nodes }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> &ModelNode {
        &self.nodes[&self.root]
    }

    pub fn get(&self, id: NodeId) -> Option<&ModelNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut ModelNode> {
        self.nodes.get_mut(&id)
    }

    pub fn node(&self, id: NodeId) -> SceneResult<&ModelNode> {
        self.nodes.get(&id).ok_or(SceneError::NodeNotFound(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> SceneResult<&mut ModelNode> {
        self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| n.children()).unwrap_or(&[])
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Position of `id` in its parent's child list.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent_of(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent_of(id);
        }
        false
    }

    /// Ancestors of `id` from its parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.parent_of(parent);
        }
        chain
    }

    /// Ids of `id` and all its descendants, depth-first pre-order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk(id, &mut |node| out.push(node.id));
        out
    }

    /// Depth-first pre-order traversal starting at `id`.
    pub fn walk(&self, id: NodeId, visitor: &mut dyn FnMut(&ModelNode)) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        visitor(node);
        for child in node.children() {
            self.walk(*child, visitor);
        }
    }

    /// All nodes except the root, depth-first in z-order.
    pub fn iter_depth_first(&self) -> impl Iterator<Item = &ModelNode> {
        self.subtree(self.root)
            .into_iter()
            .skip(1)
            .filter_map(move |id| self.nodes.get(&id))
    }

    /// Inserts a detached subtree under `parent` at `index` (clamped to the
    /// child count).
    ///
    /// `nodes` lists the subtree root first; the other entries must already
    /// link to each other through `parent` and group child lists. Fails
    /// without changing anything when the parent is missing or is not a
    /// group, or when an id is already in use.
    pub fn insert_subtree(
        &mut self,
        parent: NodeId,
        index: usize,
        mut nodes: Vec<ModelNode>,
    ) -> SceneResult<NodeId> {
        let Some(first) = nodes.first_mut() else {
            return Err(SceneError::InvalidProperty("empty subtree".into()));
        };
        if !self.nodes.get(&parent).is_some_and(|p| p.is_group()) {
            return Err(SceneError::ParentNotFound(parent));
        }
        first.parent = Some(parent);
        let root = first.id;
        if let Some(dup) = nodes.iter().find(|n| self.nodes.contains_key(&n.id)) {
            return Err(SceneError::DuplicateId(dup.id));
        }

        if let Some(children) = self.nodes.get_mut(&parent).and_then(|p| p.children_mut()) {
            let index = index.min(children.len());
            children.insert(index, root);
        }
        for node in nodes {
            self.nodes.insert(node.id, node);
        }
        Ok(root)
    }

    /// Detaches `id` and its descendants.
    ///
    /// Returns the former parent, the former index and the removed nodes
    /// (subtree root first). The root group cannot be removed.
    pub fn remove_subtree(&mut self, id: NodeId) -> SceneResult<(NodeId, usize, Vec<ModelNode>)> {
        if id == self.root {
            return Err(SceneError::InvalidProperty("the root group cannot be removed".into()));
        }
        let parent = self.parent_of(id).ok_or(SceneError::NodeNotFound(id))?;
        let index = self.index_of(id).ok_or(SceneError::NodeNotFound(id))?;
        if let Some(children) = self.nodes.get_mut(&parent).and_then(|p| p.children_mut()) {
            children.remove(index);
        }
        let removed = self
            .subtree(id)
            .into_iter()
            .filter_map(|n| self.nodes.remove(&n))
            .collect();
        Ok((parent, index, removed))
    }

    /// World matrix of `id`: the product of local matrices from the root down.
    pub fn world_matrix(&self, id: NodeId) -> Mat3 {
        let mut m = Mat3::identity();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|c| self.nodes.get(&c)) {
            m = node.local_matrix() * m;
            current = node.parent;
        }
        m
    }

    /// World matrix of the space `id` is positioned in (its parent's world).
    pub fn parent_world_matrix(&self, id: NodeId) -> Mat3 {
        self.parent_of(id)
            .map(|p| self.world_matrix(p))
            .unwrap_or_else(Mat3::identity)
    }

    /// World-space position of a node's `(x, y)`.
    pub fn world_position(&self, id: NodeId) -> Option<Point2> {
        let node = self.nodes.get(&id)?;
        let local = Point2::new(node.transform.x, node.transform.y);
        Some(transform_point(&self.parent_world_matrix(id), local))
    }

    /// Nearest ancestor-or-self carrying a prefab reference, together with
    /// the child-index path from it down to `id`.
    pub fn instance_root(&self, id: NodeId) -> Option<(NodeId, Vec<usize>)> {
        self.instance_roots(id).into_iter().next()
    }

    /// Every ancestor-or-self carrying a prefab reference, nearest first,
    /// each with the child-index path from it down to `id`.
    pub fn instance_roots(&self, id: NodeId) -> Vec<(NodeId, Vec<usize>)> {
        let mut roots = Vec::new();
        let mut path = Vec::new();
        let mut current = id;
        while let Some(node) = self.nodes.get(&current) {
            if node.prefab.is_some() {
                roots.push((current, path.iter().rev().copied().collect()));
            }
            let (Some(parent), Some(index)) = (node.parent, self.index_of(current)) else {
                break;
            };
            path.push(index);
            current = parent;
        }
        roots
    }

    /// Follows a child-index path from `from`.
    pub fn node_at_path(&self, from: NodeId, path: &[usize]) -> Option<NodeId> {
        let mut current = from;
        for index in path {
            current = *self.children(current).get(*index)?;
        }
        self.nodes.contains_key(&current).then_some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetRef;
    use canvas_core::math::approx_eq;

    fn sprite(x: f64, y: f64) -> ModelNode {
        ModelNode::sprite(AssetRef::new("ship")).at(x, y)
    }

    #[test]
    fn insert_and_remove() {
        let mut doc = SceneDocument::new();
        let root = doc.root();
        let a = doc.insert_subtree(root, 0, vec![sprite(0.0, 0.0)]).unwrap();
        let b = doc.insert_subtree(root, 0, vec![sprite(0.0, 0.0)]).unwrap();
        assert_eq!(doc.children(root), &[b, a]);
        assert_eq!(doc.index_of(a), Some(1));

        let (parent, index, removed) = doc.remove_subtree(a).unwrap();
        assert_eq!((parent, index, removed.len()), (root, 1, 1));
        assert_eq!(doc.children(root), &[b]);
        assert!(!doc.contains(a));
    }

    #[test]
    fn insert_index_is_clamped() {
        let mut doc = SceneDocument::new();
        let root = doc.root();
        let a = doc.insert_subtree(root, 0, vec![sprite(0.0, 0.0)]).unwrap();
        let b = doc
            .insert_subtree(root, usize::MAX, vec![sprite(0.0, 0.0)])
            .unwrap();
        assert_eq!(doc.children(root), &[a, b]);
    }

    #[test]
    fn insert_rejects_missing_parent_and_duplicates() {
        let mut doc = SceneDocument::new();
        let root = doc.root();
        let node = sprite(0.0, 0.0);
        let err = doc
            .insert_subtree(NodeId::new(), 0, vec![node.clone()])
            .unwrap_err();
        assert!(matches!(err, SceneError::ParentNotFound(_)));

        let id = doc.insert_subtree(root, 0, vec![node.clone()]).unwrap();
        let err = doc.insert_subtree(root, 0, vec![node]).unwrap_err();
        assert!(matches!(err, SceneError::DuplicateId(dup) if dup == id));
        assert_eq!(doc.children(root).len(), 1);

        let err = doc.insert_subtree(id, 0, vec![sprite(0.0, 0.0)]).unwrap_err();
        assert!(matches!(err, SceneError::ParentNotFound(_)));
    }

    #[test]
    fn root_cannot_be_removed() {
        let mut doc = SceneDocument::new();
        assert!(doc.remove_subtree(doc.root()).is_err());
    }

    #[test]
    fn ancestry() {
        let mut doc = SceneDocument::new();
        let root = doc.root();
        let g = doc.insert_subtree(root, 0, vec![ModelNode::group()]).unwrap();
        let s = doc.insert_subtree(g, 0, vec![sprite(0.0, 0.0)]).unwrap();
        assert!(doc.is_ancestor_or_self(g, s));
        assert!(doc.is_ancestor_or_self(s, s));
        assert!(!doc.is_ancestor_or_self(s, g));
        assert_eq!(doc.ancestors(s), vec![g, root]);
        assert_eq!(doc.subtree(root), vec![root, g, s]);
    }

    #[test]
    fn world_position_composes_groups() {
        let mut doc = SceneDocument::new();
        let root = doc.root();
        let g = doc
            .insert_subtree(root, 0, vec![ModelNode::group().at(50.0, 50.0)])
            .unwrap();
        let s = doc.insert_subtree(g, 0, vec![sprite(50.0, 50.0)]).unwrap();
        let p = doc.world_position(s).unwrap();
        assert!(approx_eq(p.x, 100.0) && approx_eq(p.y, 100.0));
    }

    #[test]
    fn instance_root_and_paths() {
        let mut doc = SceneDocument::new();
        let root = doc.root();
        let mut instance = ModelNode::group();
        instance.prefab = Some("prefabs/enemy.json".into());
        let inst = doc.insert_subtree(root, 0, vec![instance]).unwrap();
        let _first = doc.insert_subtree(inst, 0, vec![sprite(0.0, 0.0)]).unwrap();
        let second = doc.insert_subtree(inst, 1, vec![sprite(0.0, 0.0)]).unwrap();

        assert_eq!(doc.instance_root(second), Some((inst, vec![1])));
        assert_eq!(doc.instance_root(inst), Some((inst, vec![])));
        assert_eq!(doc.instance_root(root), None);

        let mut nested = ModelNode::sprite(AssetRef::new("ship"));
        nested.prefab = Some("prefabs/ship.json".into());
        let nested = doc.insert_subtree(inst, 2, vec![nested]).unwrap();
        assert_eq!(
            doc.instance_roots(nested),
            vec![(nested, vec![]), (inst, vec![2])]
        );
        assert_eq!(doc.node_at_path(inst, &[1]), Some(second));
        assert_eq!(doc.node_at_path(inst, &[5]), None);
    }
}
