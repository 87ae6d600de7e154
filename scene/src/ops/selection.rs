//! Selection operations and the outline hint.
//!
//! None of these touch the document, so they never make it dirty; they go
//! through the history so selection changes undo together with the edits
//! they belong to.

use canvas_core::abstract_editor::{Operation, OperationResult};

use crate::id::NodeId;
use crate::ops::OperationRecord;
use crate::state::{SceneChange, SceneModel};

/// Replaces the selection.
///
/// Ids that are not in the document when the operation applies are
/// skipped. When every requested id is gone the selection stays as it was;
/// an empty request clears it.
#[derive(Debug, Clone)]
pub struct SelectOperation {
    ids: Vec<NodeId>,
    previous: Option<Vec<NodeId>>,
}

impl SelectOperation {
    pub fn new(ids: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            previous: None,
        }
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }
}

impl Operation<SceneModel> for SelectOperation {
    fn apply(&mut self, target: &mut SceneModel) -> OperationResult {
        let present: Vec<NodeId> = self
            .ids
            .iter()
            .copied()
            .filter(|id| target.document().contains(*id))
            .collect();
        if present.len() != self.ids.len() {
            log::debug!(
                "select skipped {} id(s) not in the document",
                self.ids.len() - present.len()
            );
            if present.is_empty() {
                return Ok(());
            }
        }
        self.previous = Some(target.selection_mut().set(present));
        target.push_change(SceneChange::SelectionChanged);
        Ok(())
    }

    fn undo(&mut self, target: &mut SceneModel) -> OperationResult {
        if let Some(previous) = self.previous.take() {
            target.selection_mut().set(previous);
            target.push_change(SceneChange::SelectionChanged);
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "Select"
    }

    fn record(&self) -> OperationRecord {
        OperationRecord::Select {
            ids: self.ids.clone(),
        }
    }

    fn modifies_content(&self) -> bool {
        false
    }
}

/// Drops ids from the selection. Ids that are not selected are ignored.
#[derive(Debug, Clone)]
pub struct RemoveFromSelectionOperation {
    ids: Vec<NodeId>,
    removed: Vec<(usize, NodeId)>,
}

impl RemoveFromSelectionOperation {
    pub fn new(ids: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            removed: Vec::new(),
        }
    }
}

impl Operation<SceneModel> for RemoveFromSelectionOperation {
    fn apply(&mut self, target: &mut SceneModel) -> OperationResult {
        let ids = self.ids.clone();
        self.removed = target.deselect(&ids);
        Ok(())
    }

    fn undo(&mut self, target: &mut SceneModel) -> OperationResult {
        let removed = std::mem::take(&mut self.removed);
        target.reselect(&removed);
        Ok(())
    }

    fn description(&self) -> &str {
        "Remove from selection"
    }

    fn record(&self) -> OperationRecord {
        OperationRecord::RemoveFromSelection {
            ids: self.ids.clone(),
        }
    }

    fn modifies_content(&self) -> bool {
        false
    }
}

/// Asks the outline to reveal nodes. View-only; undo has nothing to revert.
#[derive(Debug, Clone)]
pub struct ExpandOutlineOperation {
    ids: Vec<NodeId>,
}

impl ExpandOutlineOperation {
    pub fn new(ids: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }
}

impl Operation<SceneModel> for ExpandOutlineOperation {
    fn apply(&mut self, target: &mut SceneModel) -> OperationResult {
        target.push_change(SceneChange::RevealInOutline(self.ids.clone()));
        Ok(())
    }

    fn undo(&mut self, _target: &mut SceneModel) -> OperationResult {
        Ok(())
    }

    fn description(&self) -> &str {
        "Expand outline"
    }

    fn record(&self) -> OperationRecord {
        OperationRecord::ExpandOutline {
            ids: self.ids.clone(),
        }
    }

    fn modifies_content(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::UncheckedAssets;
    use crate::model::{ModelNode, SceneDocument};
    use crate::prefab::PrefabLibrary;
    use std::sync::Arc;

    fn model() -> (SceneModel, NodeId, NodeId) {
        let mut doc = SceneDocument::new();
        let root = doc.root();
        let a = doc.insert_subtree(root, 0, vec![ModelNode::group()]).unwrap();
        let b = doc.insert_subtree(root, 1, vec![ModelNode::text("b")]).unwrap();
        let model = SceneModel::new(doc, PrefabLibrary::in_memory().shared(), Arc::new(UncheckedAssets));
        (model, a, b)
    }

    #[test]
    fn select_and_undo() {
        let (mut model, a, b) = model();
        model.selection_mut().set([a]);
        let mut op = SelectOperation::new([b, NodeId::new()]);
        op.apply(&mut model).unwrap();
        assert_eq!(model.selection().ids(), &[b]);
        op.undo(&mut model).unwrap();
        assert_eq!(model.selection().ids(), &[a]);
        assert!(!op.modifies_content());
    }

    #[test]
    fn select_of_absent_ids_keeps_the_selection() {
        let (mut model, a, _) = model();
        model.selection_mut().set([a]);
        let mut op = SelectOperation::new([NodeId::new()]);
        op.apply(&mut model).unwrap();
        assert_eq!(model.selection().ids(), &[a]);
        assert!(model.take_changes().is_empty());
        op.undo(&mut model).unwrap();
        assert_eq!(model.selection().ids(), &[a]);

        let mut clear = SelectOperation::new(Vec::new());
        clear.apply(&mut model).unwrap();
        assert!(model.selection().is_empty());
        clear.undo(&mut model).unwrap();
        assert_eq!(model.selection().ids(), &[a]);
    }

    #[test]
    fn remove_from_selection_is_idempotent() {
        let (mut model, a, b) = model();
        model.selection_mut().set([a, b]);
        let mut op = RemoveFromSelectionOperation::new([a]);
        op.apply(&mut model).unwrap();
        assert_eq!(model.selection().ids(), &[b]);

        let mut again = RemoveFromSelectionOperation::new([a]);
        again.apply(&mut model).unwrap();
        assert_eq!(model.selection().ids(), &[b]);
        again.undo(&mut model).unwrap();
        assert_eq!(model.selection().ids(), &[b]);

        op.undo(&mut model).unwrap();
        assert_eq!(model.selection().ids(), &[a, b]);
    }

    #[test]
    fn expand_outline_only_emits_a_hint() {
        let (mut model, a, _) = model();
        let before = model.document().to_json_string(false).unwrap();
        let mut op = ExpandOutlineOperation::new([a]);
        op.apply(&mut model).unwrap();
        assert_eq!(model.take_changes(), vec![SceneChange::RevealInOutline(vec![a])]);
        op.undo(&mut model).unwrap();
        assert_eq!(model.document().to_json_string(false).unwrap(), before);
    }
}
