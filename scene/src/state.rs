//! The editable scene state operations are applied to.

use std::sync::Arc;

use canvas_core::abstract_editor::{Editable, OperationError};

use crate::asset::AssetResolver;
use crate::error::{SceneError, SceneResult};
use crate::id::NodeId;
use crate::model::{ModelNode, PropertySet, SceneDocument};
use crate::ops::OperationRecord;
use crate::prefab::{OverrideResolver, SharedPrefabLibrary};
use crate::selection::Selection;

/// What an operation changed, consumed by the view synchronizer.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneChange {
    /// A subtree was inserted; the id is its root.
    Added(NodeId),
    /// A subtree was detached from `parent`.
    Removed { id: NodeId, parent: NodeId },
    /// Property groups of one node changed in place.
    Updated { id: NodeId, groups: PropertySet },
    SelectionChanged,
    /// Outline hint: make these nodes visible in the outline.
    RevealInOutline(Vec<NodeId>),
}

/// Document, selection and collaborators of one open scene.
///
/// Operations mutate this state and append to its change journal. The
/// journal is drained once per executed operation (a whole composite counts
/// as one), so views never see intermediate states.
pub struct SceneModel {
    document: SceneDocument,
    selection: Selection,
    library: SharedPrefabLibrary,
    assets: Arc<dyn AssetResolver>,
    changes: Vec<SceneChange>,
    rejection: Option<SceneError>,
}

impl std::fmt::Debug for SceneModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneModel")
            .field("nodes", &self.document.len())
            .field("selection", &self.selection)
            .field("pending_changes", &self.changes.len())
            .finish()
    }
}

impl Editable for SceneModel {
    type Record = OperationRecord;

    fn batch_record(description: &str, children: Vec<OperationRecord>) -> OperationRecord {
        OperationRecord::Composite {
            description: description.to_owned(),
            children,
        }
    }
}

impl SceneModel {
    pub fn new(
        document: SceneDocument,
        library: SharedPrefabLibrary,
        assets: Arc<dyn AssetResolver>,
    ) -> Self {
        Self {
            document,
            selection: Selection::new(),
            library,
            assets,
            changes: Vec::new(),
            rejection: None,
        }
    }

    pub fn document(&self) -> &SceneDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut SceneDocument {
        &mut self.document
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn library(&self) -> &SharedPrefabLibrary {
        &self.library
    }

    pub fn assets(&self) -> &dyn AssetResolver {
        self.assets.as_ref()
    }

    pub fn assets_arc(&self) -> Arc<dyn AssetResolver> {
        Arc::clone(&self.assets)
    }

    /// Effective values of `id` after prefab resolution.
    pub fn resolved(&self, id: NodeId) -> SceneResult<ModelNode> {
        let library = self.library.read();
        OverrideResolver::new(&library).resolve(&self.document, id)
    }

    /// Runs `f` with a resolver over the shared prefab library.
    pub fn with_resolver<R>(&self, f: impl FnOnce(&OverrideResolver<'_>, &SceneDocument) -> R) -> R {
        let library = self.library.read();
        f(&OverrideResolver::new(&library), &self.document)
    }

    pub(crate) fn push_change(&mut self, change: SceneChange) {
        self.changes.push(change);
    }

    /// Drains the change journal.
    pub fn take_changes(&mut self) -> Vec<SceneChange> {
        std::mem::take(&mut self.changes)
    }

    /// Parks the typed cause of a failing operation and returns the error the
    /// operation trait reports.
    pub(crate) fn reject(&mut self, err: SceneError) -> OperationError {
        let op_err = OperationError::from(&err);
        self.rejection = Some(err);
        op_err
    }

    /// Typed cause of the last rejected operation.
    pub fn take_rejection(&mut self) -> Option<SceneError> {
        self.rejection.take()
    }

    /// Drops selected ids that belong to the given nodes, returning what was
    /// removed for [`Selection::restore`].
    pub(crate) fn deselect(&mut self, ids: &[NodeId]) -> Vec<(usize, NodeId)> {
        let removed = self.selection.remove_where(|id| ids.contains(&id));
        if !removed.is_empty() {
            self.changes.push(SceneChange::SelectionChanged);
        }
        removed
    }

    pub(crate) fn reselect(&mut self, entries: &[(usize, NodeId)]) {
        if !entries.is_empty() {
            self.selection.restore(entries);
            self.changes.push(SceneChange::SelectionChanged);
        }
    }
}
