//! Plain-data form of scene operations.

use canvas_core::abstract_editor::{CompositeOperation, Operation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::NodeId;
use crate::model::{BodyModel, PropertyKey, PropertySet, PropertyValue};
use crate::ops::{
    AddNodeOperation, ChangeBodyOperation, ClearOverrideOperation, DeleteNodeOperation,
    ExpandOutlineOperation, RemoveFromSelectionOperation, SelectOperation, SetPropertyOperation,
};
use crate::state::SceneModel;

/// One operation as ids, JSON fragments and indices.
///
/// Records reference no live objects, so a transcript can be written to disk
/// and rebuilt into operations against a freshly loaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OperationRecord {
    AddNode {
        node: Value,
        index: usize,
        x: f64,
        y: f64,
        parent: NodeId,
    },
    DeleteNode {
        id: NodeId,
        clear_selection: bool,
    },
    Select {
        ids: Vec<NodeId>,
    },
    RemoveFromSelection {
        ids: Vec<NodeId>,
    },
    ChangeBody {
        id: NodeId,
        body: Option<BodyModel>,
    },
    ExpandOutline {
        ids: Vec<NodeId>,
    },
    SetProperty {
        id: NodeId,
        key: PropertyKey,
        value: PropertyValue,
    },
    ClearOverride {
        id: NodeId,
        groups: PropertySet,
    },
    Composite {
        description: String,
        children: Vec<OperationRecord>,
    },
}

impl OperationRecord {
    /// Rebuilds an unapplied operation.
    pub fn into_operation(self) -> Box<dyn Operation<SceneModel>> {
        match self {
            Self::AddNode {
                node,
                index,
                x,
                y,
                parent,
            } => Box::new(AddNodeOperation::new(node, index, x, y, parent)),
            Self::DeleteNode {
                id,
                clear_selection,
            } => Box::new(DeleteNodeOperation::with_clear_selection(id, clear_selection)),
            Self::Select { ids } => Box::new(SelectOperation::new(ids)),
            Self::RemoveFromSelection { ids } => Box::new(RemoveFromSelectionOperation::new(ids)),
            Self::ChangeBody { id, body } => Box::new(ChangeBodyOperation::new(id, body)),
            Self::ExpandOutline { ids } => Box::new(ExpandOutlineOperation::new(ids)),
            Self::SetProperty { id, key, value } => {
                Box::new(SetPropertyOperation::new(id, key, value))
            }
            Self::ClearOverride { id, groups } => Box::new(ClearOverrideOperation::new(id, groups)),
            Self::Composite {
                description,
                children,
            } => {
                let mut composite = CompositeOperation::new(description);
                for child in children {
                    composite.push(child.into_operation());
                }
                Box::new(composite)
            }
        }
    }

    /// Short name of the record kind, as written in the `op` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddNode { .. } => "addNode",
            Self::DeleteNode { .. } => "deleteNode",
            Self::Select { .. } => "select",
            Self::RemoveFromSelection { .. } => "removeFromSelection",
            Self::ChangeBody { .. } => "changeBody",
            Self::ExpandOutline { .. } => "expandOutline",
            Self::SetProperty { .. } => "setProperty",
            Self::ClearOverride { .. } => "clearOverride",
            Self::Composite { .. } => "composite",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tagged_json_shape() {
        let id = NodeId::new();
        let record = OperationRecord::DeleteNode {
            id,
            clear_selection: false,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({"op": "deleteNode", "id": id.to_string(), "clearSelection": false})
        );
        assert_eq!(record.kind(), "deleteNode");
    }

    #[test]
    fn composite_records_nest() {
        let id = NodeId::new();
        let text = json!({
            "op": "composite",
            "description": "Move",
            "children": [
                {"op": "select", "ids": [id.to_string()]},
                {"op": "clearOverride", "id": id.to_string(), "groups": ["angle", "texture"]},
            ]
        });
        let record: OperationRecord = serde_json::from_value(text).unwrap();
        let OperationRecord::Composite { children, .. } = &record else {
            panic!("expected a composite");
        };
        assert_eq!(
            children[1],
            OperationRecord::ClearOverride {
                id,
                groups: PropertySet::ANGLE | PropertySet::TEXTURE,
            }
        );
        let op = record.into_operation();
        assert_eq!(op.description(), "Move");
    }
}
