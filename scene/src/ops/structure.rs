//! Structural operations: inserting and removing subtrees.

use canvas_core::abstract_editor::{Operation, OperationResult};
use serde_json::Value;

use crate::error::SceneError;
use crate::id::NodeId;
use crate::model::{json_node_id, nodes_from_json};
use crate::ops::OperationRecord;
use crate::state::{SceneChange, SceneModel};

/// Inserts a node rebuilt from its JSON form under `parent` at `index`,
/// placed at local `(x, y)`.
///
/// Undo removes the subtree again. The JSON keeps the node's id, so redo
/// recreates the very same node.
#[derive(Debug, Clone)]
pub struct AddNodeOperation {
    node: Value,
    index: usize,
    x: f64,
    y: f64,
    parent: NodeId,
    /// Selection entries dropped by the last undo.
    deselected: Vec<(usize, NodeId)>,
}

impl AddNodeOperation {
    pub fn new(node: Value, index: usize, x: f64, y: f64, parent: NodeId) -> Self {
        Self {
            node,
            index,
            x,
            y,
            parent,
            deselected: Vec::new(),
        }
    }

    /// Id of the node this operation inserts.
    pub fn node_id(&self) -> Option<NodeId> {
        json_node_id(&self.node).ok()
    }

    pub fn parent(&self) -> NodeId {
        self.parent
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn json(&self) -> &Value {
        &self.node
    }
}

impl Operation<SceneModel> for AddNodeOperation {
    fn apply(&mut self, target: &mut SceneModel) -> OperationResult {
        if !target.document().contains(self.parent) {
            return Err(target.reject(SceneError::ParentNotFound(self.parent)));
        }
        let mut nodes = match nodes_from_json(&self.node, target.assets()) {
            Ok(nodes) => nodes,
            Err(err) => return Err(target.reject(err)),
        };
        if let Some(root) = nodes.first_mut() {
            root.transform.x = self.x;
            root.transform.y = self.y;
        }
        let id = match target.document_mut().insert_subtree(self.parent, self.index, nodes) {
            Ok(id) => id,
            Err(err) => return Err(target.reject(err)),
        };
        log::debug!("added node {id} under {} at {}", self.parent, self.index);
        target.push_change(SceneChange::Added(id));
        let deselected = std::mem::take(&mut self.deselected);
        target.reselect(&deselected);
        Ok(())
    }

    fn undo(&mut self, target: &mut SceneModel) -> OperationResult {
        let id = match json_node_id(&self.node) {
            Ok(id) => id,
            Err(err) => return Err(target.reject(err)),
        };
        let subtree = target.document().subtree(id);
        let (parent, _, _) = match target.document_mut().remove_subtree(id) {
            Ok(removed) => removed,
            Err(err) => return Err(target.reject(err)),
        };
        target.push_change(SceneChange::Removed { id, parent });
        self.deselected = target.deselect(&subtree);
        Ok(())
    }

    fn description(&self) -> &str {
        "Add node"
    }

    fn record(&self) -> OperationRecord {
        OperationRecord::AddNode {
            node: self.node.clone(),
            index: self.index,
            x: self.x,
            y: self.y,
            parent: self.parent,
        }
    }
}

/// Removes a node and its subtree.
///
/// The node is snapshotted in its full JSON form together with its parent
/// and index when applied, which is what undo re-inserts. With
/// `clear_selection` the removed ids are also dropped from the selection;
/// move composites pass `false` because the node comes straight back.
#[derive(Debug, Clone)]
pub struct DeleteNodeOperation {
    id: NodeId,
    clear_selection: bool,
    snapshot: Option<Snapshot>,
}

#[derive(Debug, Clone)]
struct Snapshot {
    json: Value,
    parent: NodeId,
    index: usize,
    deselected: Vec<(usize, NodeId)>,
}

impl DeleteNodeOperation {
    pub fn new(id: NodeId) -> Self {
        Self::with_clear_selection(id, true)
    }

    pub fn with_clear_selection(id: NodeId, clear_selection: bool) -> Self {
        Self {
            id,
            clear_selection,
            snapshot: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn clears_selection(&self) -> bool {
        self.clear_selection
    }
}

impl Operation<SceneModel> for DeleteNodeOperation {
    fn apply(&mut self, target: &mut SceneModel) -> OperationResult {
        let json = match target.document().node_to_json(self.id, false) {
            Ok(json) => json,
            Err(err) => return Err(target.reject(err)),
        };
        let subtree = target.document().subtree(self.id);
        let (parent, index, _) = match target.document_mut().remove_subtree(self.id) {
            Ok(removed) => removed,
            Err(err) => return Err(target.reject(err)),
        };
        log::debug!("deleted node {} from {parent} at {index}", self.id);
        target.push_change(SceneChange::Removed {
            id: self.id,
            parent,
        });
        let deselected = if self.clear_selection {
            target.deselect(&subtree)
        } else {
            Vec::new()
        };
        self.snapshot = Some(Snapshot {
            json,
            parent,
            index,
            deselected,
        });
        Ok(())
    }

    fn undo(&mut self, target: &mut SceneModel) -> OperationResult {
        let Some(snapshot) = &self.snapshot else {
            return Err(target.reject(SceneError::NodeNotFound(self.id)));
        };
        let nodes = match nodes_from_json(&snapshot.json, target.assets()) {
            Ok(nodes) => nodes,
            Err(err) => return Err(target.reject(err)),
        };
        let (parent, index) = (snapshot.parent, snapshot.index);
        if let Err(err) = target.document_mut().insert_subtree(parent, index, nodes) {
            return Err(target.reject(err));
        }
        target.push_change(SceneChange::Added(self.id));
        if let Some(snapshot) = self.snapshot.take() {
            target.reselect(&snapshot.deselected);
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "Delete node"
    }

    fn record(&self) -> OperationRecord {
        OperationRecord::DeleteNode {
            id: self.id,
            clear_selection: self.clear_selection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetRef, UncheckedAssets};
    use crate::model::{ModelNode, SceneDocument};
    use crate::prefab::PrefabLibrary;
    use std::sync::Arc;

    fn model_with_sprite() -> (SceneModel, NodeId) {
        let mut doc = SceneDocument::new();
        let root = doc.root();
        let id = doc
            .insert_subtree(root, 0, vec![ModelNode::sprite(AssetRef::new("ship")).at(5.0, 6.0)])
            .unwrap();
        let model = SceneModel::new(
            doc,
            PrefabLibrary::in_memory().shared(),
            Arc::new(UncheckedAssets),
        );
        (model, id)
    }

    #[test]
    fn add_places_node_at_index_and_position() {
        let (mut model, existing) = model_with_sprite();
        let root = model.document().root();
        let mut json = model.document().node_to_json(existing, false).unwrap();
        let new_id = crate::model::regenerate_ids(&mut json).unwrap();

        let mut op = AddNodeOperation::new(json, 0, 40.0, 41.0, root);
        op.apply(&mut model).unwrap();
        assert_eq!(model.document().children(root), &[new_id, existing]);
        let node = model.document().node(new_id).unwrap();
        assert_eq!((node.transform.x, node.transform.y), (40.0, 41.0));
        assert_eq!(model.take_changes(), vec![SceneChange::Added(new_id)]);

        op.undo(&mut model).unwrap();
        assert_eq!(model.document().children(root), &[existing]);
    }

    #[test]
    fn add_to_missing_parent_fails_cleanly() {
        let (mut model, existing) = model_with_sprite();
        let json = model.document().node_to_json(existing, false).unwrap();
        let before = model.document().to_json_string(false).unwrap();
        let ghost = NodeId::new();

        let mut op = AddNodeOperation::new(json, 0, 0.0, 0.0, ghost);
        assert!(op.apply(&mut model).is_err());
        assert!(matches!(
            model.take_rejection(),
            Some(SceneError::ParentNotFound(id)) if id == ghost
        ));
        assert_eq!(model.document().to_json_string(false).unwrap(), before);
        assert!(model.take_changes().is_empty());
    }

    #[test]
    fn delete_then_undo_restores_index_and_selection() {
        let (mut model, first) = model_with_sprite();
        let root = model.document().root();
        let second = model
            .document_mut()
            .insert_subtree(root, 1, vec![ModelNode::text("hi")])
            .unwrap();
        model.selection_mut().set([second, first]);
        let before = model.document().to_json_string(false).unwrap();

        let mut op = DeleteNodeOperation::new(first);
        op.apply(&mut model).unwrap();
        assert!(!model.document().contains(first));
        assert_eq!(model.selection().ids(), &[second]);

        op.undo(&mut model).unwrap();
        assert_eq!(model.document().children(root), &[first, second]);
        assert_eq!(model.selection().ids(), &[second, first]);
        assert_eq!(model.document().to_json_string(false).unwrap(), before);
    }

    #[test]
    fn delete_can_keep_selection() {
        let (mut model, id) = model_with_sprite();
        model.selection_mut().set([id]);
        let mut op = DeleteNodeOperation::with_clear_selection(id, false);
        op.apply(&mut model).unwrap();
        assert_eq!(model.selection().ids(), &[id]);
    }

    #[test]
    fn root_cannot_be_deleted() {
        let (mut model, _) = model_with_sprite();
        let root = model.document().root();
        assert!(DeleteNodeOperation::new(root).apply(&mut model).is_err());
        assert!(model.document().contains(root));
    }
}
