//! Scene error types.

use canvas_core::abstract_editor::OperationError;

use crate::id::NodeId;

/// Error taxonomy of the scene layer, without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ParentNotFound,
    NodeNotFound,
    DuplicateId,
    ReadOnlyOverride,
    CyclicGroupMove,
    UnresolvedAsset,
    PrefabCycle,
    PrefabNotFound,
    InvalidProperty,
    Json,
    Io,
    Operation,
}

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("parent group {0} not found")]
    ParentNotFound(NodeId),

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("node id {0} is already used in this document")]
    DuplicateId(NodeId),

    #[error("property group '{group}' is read-only on prefab instance {node}")]
    ReadOnlyOverride { node: NodeId, group: &'static str },

    #[error("cannot move {group} into its own descendant {target}")]
    CyclicGroupMove { group: NodeId, target: NodeId },

    #[error("asset '{0}' cannot be resolved")]
    UnresolvedAsset(String),

    #[error("prefab chain through '{0}' refers back to itself")]
    PrefabCycle(String),

    #[error("prefab '{0}' not found")]
    PrefabNotFound(String),

    #[error("invalid property: {0}")]
    InvalidProperty(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

impl SceneError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ParentNotFound(_) => ErrorKind::ParentNotFound,
            Self::NodeNotFound(_) => ErrorKind::NodeNotFound,
            Self::DuplicateId(_) => ErrorKind::DuplicateId,
            Self::ReadOnlyOverride { .. } => ErrorKind::ReadOnlyOverride,
            Self::CyclicGroupMove { .. } => ErrorKind::CyclicGroupMove,
            Self::UnresolvedAsset(_) => ErrorKind::UnresolvedAsset,
            Self::PrefabCycle(_) => ErrorKind::PrefabCycle,
            Self::PrefabNotFound(_) => ErrorKind::PrefabNotFound,
            Self::InvalidProperty(_) => ErrorKind::InvalidProperty,
            Self::Json(_) => ErrorKind::Json,
            Self::Io(_) => ErrorKind::Io,
            Self::Operation(_) => ErrorKind::Operation,
        }
    }
}

impl From<serde_json::Error> for SceneError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<&SceneError> for OperationError {
    fn from(err: &SceneError) -> Self {
        match err {
            SceneError::ParentNotFound(_)
            | SceneError::NodeNotFound(_)
            | SceneError::PrefabNotFound(_) => OperationError::TargetNotFound(err.to_string()),
            SceneError::Operation(inner) => inner.clone(),
            _ => OperationError::InvalidState(err.to_string()),
        }
    }
}

pub type SceneResult<T = ()> = Result<T, SceneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        let id = NodeId::new();
        assert_eq!(SceneError::ParentNotFound(id).kind(), ErrorKind::ParentNotFound);
        assert_eq!(
            SceneError::CyclicGroupMove {
                group: id,
                target: id
            }
            .kind(),
            ErrorKind::CyclicGroupMove
        );
        assert_eq!(
            SceneError::from(OperationError::Custom("x".into())).kind(),
            ErrorKind::Operation
        );
    }

    #[test]
    fn conversion_to_operation_error() {
        let id = NodeId::new();
        let op: OperationError = (&SceneError::NodeNotFound(id)).into();
        assert!(matches!(op, OperationError::TargetNotFound(_)));
        let op: OperationError = (&SceneError::ReadOnlyOverride {
            node: id,
            group: "texture",
        })
            .into();
        assert!(matches!(op, OperationError::InvalidState(msg) if msg.contains("texture")));
    }
}
