//! Property edits with prefab override bookkeeping.

use canvas_core::abstract_editor::{Operation, OperationResult};

use crate::error::SceneResult;
use crate::id::NodeId;
use crate::model::{BodyModel, ModelNode, PropertyKey, PropertySet, PropertyValue};
use crate::ops::OperationRecord;
use crate::state::{SceneChange, SceneModel};

/// Sets one property.
#[derive(Debug, Clone)]
pub struct SetPropertyOperation {
    id: NodeId,
    key: PropertyKey,
    value: PropertyValue,
    previous: Option<ModelNode>,
}

impl SetPropertyOperation {
    pub fn new(id: NodeId, key: PropertyKey, value: PropertyValue) -> Self {
        Self {
            id,
            key,
            value,
            previous: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn key(&self) -> PropertyKey {
        self.key
    }
}

impl Operation<SceneModel> for SetPropertyOperation {
    fn apply(&mut self, target: &mut SceneModel) -> OperationResult {
        match apply_property(target, self.id, self.key, self.value.clone()) {
            Ok(previous) => {
                self.previous = Some(previous);
                Ok(())
            }
            Err(err) => Err(target.reject(err)),
        }
    }

    fn undo(&mut self, target: &mut SceneModel) -> OperationResult {
        restore_node(target, self.id, self.previous.take(), self.key.group())
    }

    fn description(&self) -> &str {
        "Set property"
    }

    fn record(&self) -> OperationRecord {
        OperationRecord::SetProperty {
            id: self.id,
            key: self.key,
            value: self.value.clone(),
        }
    }
}

/// Replaces the physics body of a sprite-like node; `None` removes it.
#[derive(Debug, Clone)]
pub struct ChangeBodyOperation {
    id: NodeId,
    body: Option<BodyModel>,
    previous: Option<ModelNode>,
}

impl ChangeBodyOperation {
    pub fn new(id: NodeId, body: Option<BodyModel>) -> Self {
        Self {
            id,
            body,
            previous: None,
        }
    }
}

impl Operation<SceneModel> for ChangeBodyOperation {
    fn apply(&mut self, target: &mut SceneModel) -> OperationResult {
        let value = PropertyValue::Body(self.body.clone());
        match apply_property(target, self.id, PropertyKey::Body, value) {
            Ok(previous) => {
                self.previous = Some(previous);
                Ok(())
            }
            Err(err) => Err(target.reject(err)),
        }
    }

    fn undo(&mut self, target: &mut SceneModel) -> OperationResult {
        restore_node(target, self.id, self.previous.take(), PropertySet::PHYSICS)
    }

    fn description(&self) -> &str {
        "Change body"
    }

    fn record(&self) -> OperationRecord {
        OperationRecord::ChangeBody {
            id: self.id,
            body: self.body.clone(),
        }
    }
}

/// Removes groups from a node's overrides so they resolve from the prefab
/// again. The local values stay in place and come back if undone.
#[derive(Debug, Clone)]
pub struct ClearOverrideOperation {
    id: NodeId,
    groups: PropertySet,
    previous: Option<PropertySet>,
}

impl ClearOverrideOperation {
    pub fn new(id: NodeId, groups: PropertySet) -> Self {
        Self {
            id,
            groups,
            previous: None,
        }
    }
}

impl Operation<SceneModel> for ClearOverrideOperation {
    fn apply(&mut self, target: &mut SceneModel) -> OperationResult {
        let node = match target.document_mut().node_mut(self.id) {
            Ok(node) => node,
            Err(err) => return Err(target.reject(err)),
        };
        self.previous = Some(node.overrides);
        node.overrides -= self.groups;
        target.push_change(SceneChange::Updated {
            id: self.id,
            groups: self.groups,
        });
        Ok(())
    }

    fn undo(&mut self, target: &mut SceneModel) -> OperationResult {
        let Some(previous) = self.previous.take() else {
            return Ok(());
        };
        let node = match target.document_mut().node_mut(self.id) {
            Ok(node) => node,
            Err(err) => return Err(target.reject(err)),
        };
        node.overrides = previous;
        target.push_change(SceneChange::Updated {
            id: self.id,
            groups: self.groups,
        });
        Ok(())
    }

    fn description(&self) -> &str {
        "Clear override"
    }

    fn record(&self) -> OperationRecord {
        OperationRecord::ClearOverride {
            id: self.id,
            groups: self.groups,
        }
    }
}

/// Writes `value` into `key` of `id` and swaps the updated node in,
/// returning the old one.
///
/// Read-only prefab groups are refused before anything changes. Inside a
/// prefab instance the key's group is added to the node's overrides.
fn apply_property(
    target: &mut SceneModel,
    id: NodeId,
    key: PropertyKey,
    value: PropertyValue,
) -> SceneResult<ModelNode> {
    target.with_resolver(|resolver, doc| resolver.check_writable(doc, id, key))?;
    let in_instance = target.document().instance_root(id).is_some();
    let node = target.document_mut().node_mut(id)?;
    let mut next = node.clone();
    next.set(key, value)?;
    if in_instance {
        next.overrides |= key.group();
    }
    let previous = std::mem::replace(node, next);
    target.push_change(SceneChange::Updated {
        id,
        groups: key.group(),
    });
    Ok(previous)
}

fn restore_node(
    target: &mut SceneModel,
    id: NodeId,
    previous: Option<ModelNode>,
    groups: PropertySet,
) -> OperationResult {
    let Some(previous) = previous else {
        return Ok(());
    };
    match target.document_mut().node_mut(id) {
        Ok(node) => *node = previous,
        Err(err) => return Err(target.reject(err)),
    }
    target.push_change(SceneChange::Updated { id, groups });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetRef, UncheckedAssets};
    use crate::error::SceneError;
    use crate::model::{CircleArcadeBody, SceneDocument};
    use crate::prefab::{Prefab, PrefabLibrary};
    use serde_json::json;
    use std::sync::Arc;

    fn plain_model() -> (SceneModel, NodeId) {
        let mut doc = SceneDocument::new();
        let root = doc.root();
        let id = doc
            .insert_subtree(root, 0, vec![ModelNode::sprite(AssetRef::new("ship"))])
            .unwrap();
        let model = SceneModel::new(doc, PrefabLibrary::in_memory().shared(), Arc::new(UncheckedAssets));
        (model, id)
    }

    fn instance_model(read_only: PropertySet) -> (SceneModel, NodeId) {
        let mut library = PrefabLibrary::in_memory();
        let template = json!({"type": "sprite", "info": {"texture": {"key": "ship"}}});
        let prefab = Prefab::new("prefabs/Ship.json", &template, read_only, &UncheckedAssets).unwrap();
        let instance = prefab.instance_json().unwrap();
        library.insert(prefab);

        let mut doc = SceneDocument::new();
        let root = doc.root();
        let nodes = crate::model::nodes_from_json(&instance, &UncheckedAssets).unwrap();
        let id = doc.insert_subtree(root, 0, nodes).unwrap();
        (SceneModel::new(doc, library.shared(), Arc::new(UncheckedAssets)), id)
    }

    #[test]
    fn set_and_undo_restore_the_node() {
        let (mut model, id) = plain_model();
        let before = model.document().to_json_string(false).unwrap();
        let mut op = SetPropertyOperation::new(id, PropertyKey::Angle, PropertyValue::Number(30.0));
        op.apply(&mut model).unwrap();
        assert_eq!(model.document().node(id).unwrap().transform.angle, 30.0);
        op.undo(&mut model).unwrap();
        assert_eq!(model.document().to_json_string(false).unwrap(), before);
    }

    #[test]
    fn plain_nodes_keep_their_overrides() {
        let (mut model, id) = plain_model();
        let overrides = model.document().node(id).unwrap().overrides;
        SetPropertyOperation::new(id, PropertyKey::Alpha, PropertyValue::Number(0.5))
            .apply(&mut model)
            .unwrap();
        assert_eq!(model.document().node(id).unwrap().overrides, overrides);
    }

    #[test]
    fn instance_edit_marks_the_group_overridden() {
        let (mut model, id) = instance_model(PropertySet::empty());
        assert!(!model.document().node(id).unwrap().overrides.contains(PropertySet::ANGLE));
        let mut op = SetPropertyOperation::new(id, PropertyKey::Angle, PropertyValue::Number(12.0));
        op.apply(&mut model).unwrap();
        assert!(model.document().node(id).unwrap().overrides.contains(PropertySet::ANGLE));
        assert_eq!(model.resolved(id).unwrap().transform.angle, 12.0);

        let mut clear = ClearOverrideOperation::new(id, PropertySet::ANGLE);
        clear.apply(&mut model).unwrap();
        assert_eq!(model.resolved(id).unwrap().transform.angle, 0.0);
        clear.undo(&mut model).unwrap();
        assert_eq!(model.resolved(id).unwrap().transform.angle, 12.0);
    }

    #[test]
    fn read_only_group_is_refused_without_change() {
        let (mut model, id) = instance_model(PropertySet::TEXTURE);
        let before = model.document().to_json_string(false).unwrap();
        let mut op = SetPropertyOperation::new(
            id,
            PropertyKey::Texture,
            PropertyValue::Asset(Some(AssetRef::new("other"))),
        );
        assert!(op.apply(&mut model).is_err());
        assert!(matches!(
            model.take_rejection(),
            Some(SceneError::ReadOnlyOverride { .. })
        ));
        assert_eq!(model.document().to_json_string(false).unwrap(), before);
        assert!(model.take_changes().is_empty());
    }

    #[test]
    fn change_body_and_undo() {
        let (mut model, id) = plain_model();
        let body = BodyModel::CircleArcade(CircleArcadeBody::default());
        let mut op = ChangeBodyOperation::new(id, Some(body.clone()));
        op.apply(&mut model).unwrap();
        assert_eq!(model.document().node(id).unwrap().body(), Some(&body));
        op.undo(&mut model).unwrap();
        assert_eq!(model.document().node(id).unwrap().body(), None);
    }

    #[test]
    fn body_on_a_group_is_invalid() {
        let (mut model, _) = plain_model();
        let root = model.document().root();
        let mut op = ChangeBodyOperation::new(root, None);
        assert!(op.apply(&mut model).is_err());
        assert!(matches!(
            model.take_rejection(),
            Some(SceneError::InvalidProperty(_))
        ));
    }
}
