//! The command engine of one open scene.
//!
//! [`SceneEditor`] owns the model, its undo/redo history and the view. Every
//! execute, undo and redo is followed by exactly one view reconciliation
//! and, when the selection changed, a queued host notification that
//! [`pump_notifications`](SceneEditor::pump_notifications) delivers.

use std::path::Path;
use std::sync::Arc;

use canvas_core::abstract_editor::{
    DocumentState, Operation, OperationError, OperationHistory, OperationQueue,
};
use canvas_core::math::{Point2, Rect};
use serde_json::Value;

use crate::error::{SceneError, SceneResult};
use crate::grid::PropertyGrid;
use crate::id::NodeId;
use crate::model::{BodyModel, ModelNode, PropertyKey, PropertySet, PropertyValue, SceneDocument};
use crate::morph::{MorphTarget, morph};
use crate::ops::compose::{self, ZOrder};
use crate::ops::{
    AddNodeOperation, ChangeBodyOperation, ClearOverrideOperation, ExpandOutlineOperation,
    OperationRecord, RemoveFromSelectionOperation, SelectOperation, SetPropertyOperation,
};
use crate::selection::SelectionHost;
use crate::state::SceneModel;
use crate::view::{ReconcileStats, SceneView};

pub struct SceneEditor {
    model: SceneModel,
    history: OperationHistory<SceneModel>,
    view: SceneView,
    host: Box<dyn SelectionHost>,
    queue: Arc<OperationQueue<SceneModel>>,
    /// Selection to push into the host on the next pump.
    pending_selection: Option<Vec<NodeId>>,
    last_stats: ReconcileStats,
}

impl std::fmt::Debug for SceneEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneEditor")
            .field("model", &self.model)
            .field("history", &self.history)
            .field("view_nodes", &self.view.len())
            .finish()
    }
}

impl SceneEditor {
    pub fn new(model: SceneModel, host: Box<dyn SelectionHost>, max_undo: usize) -> Self {
        let view = SceneView::build(&model);
        Self {
            model,
            history: OperationHistory::new(max_undo),
            view,
            host,
            queue: Arc::new(OperationQueue::new()),
            pending_selection: None,
            last_stats: ReconcileStats::default(),
        }
    }

    pub fn model(&self) -> &SceneModel {
        &self.model
    }

    pub fn document(&self) -> &SceneDocument {
        self.model.document()
    }

    pub fn view(&self) -> &SceneView {
        &self.view
    }

    pub fn history(&self) -> &OperationHistory<SceneModel> {
        &self.history
    }

    pub fn selection(&self) -> &[NodeId] {
        self.model.selection().ids()
    }

    /// Handle for submitting operations from other threads; they run on
    /// [`flush_queue`](Self::flush_queue).
    pub fn queue(&self) -> Arc<OperationQueue<SceneModel>> {
        Arc::clone(&self.queue)
    }

    /// What the last reconcile pass did.
    pub fn last_reconcile(&self) -> &ReconcileStats {
        &self.last_stats
    }

    pub fn document_state(&self) -> DocumentState {
        self.history.document_state()
    }

    // -----------------------------------------------------------------------
    // Command engine
    // -----------------------------------------------------------------------

    /// Applies `op` and records it for undo.
    ///
    /// A refused operation leaves the model as it was and reports the typed
    /// cause.
    pub fn execute(&mut self, op: Box<dyn Operation<SceneModel>>) -> SceneResult {
        self.model.take_rejection();
        let description = op.description().to_owned();
        let result = self.history.execute(op, &mut self.model);
        self.after_change();
        result.map_err(|err| {
            log::warn!("'{description}' failed: {err}");
            self.failure(err)
        })
    }

    /// Undoes the last entry. `Ok(false)` when there is nothing to undo.
    pub fn undo(&mut self) -> SceneResult<bool> {
        self.model.take_rejection();
        let result = self.history.undo(&mut self.model);
        self.after_change();
        result.map_err(|err| self.failure(err))
    }

    /// Redoes the last undone entry. `Ok(false)` when there is nothing to
    /// redo.
    pub fn redo(&mut self) -> SceneResult<bool> {
        self.model.take_rejection();
        let result = self.history.redo(&mut self.model);
        self.after_change();
        result.map_err(|err| self.failure(err))
    }

    fn failure(&mut self, err: OperationError) -> SceneError {
        self.model
            .take_rejection()
            .unwrap_or(SceneError::Operation(err))
    }

    fn after_change(&mut self) {
        let changes = self.model.take_changes();
        let stats = self.view.reconcile(&self.model, &changes);
        if stats.selection_changed {
            self.pending_selection = Some(self.model.selection().ids().to_vec());
        }
        self.last_stats = stats;
    }

    /// Delivers the queued selection notification to the host.
    ///
    /// Returns whether one was delivered.
    pub fn pump_notifications(&mut self) -> bool {
        match self.pending_selection.take() {
            Some(ids) => {
                self.host.set_selection(&ids);
                true
            }
            None => false,
        }
    }

    /// Executes every queued operation in submission order.
    ///
    /// Failing operations are logged and skipped; returns how many were
    /// applied.
    pub fn flush_queue(&mut self) -> usize {
        let mut applied = 0;
        for op in self.queue.drain() {
            match self.execute(op) {
                Ok(()) => applied += 1,
                Err(err) => log::warn!("queued operation failed: {err}"),
            }
        }
        applied
    }

    /// Takes over a selection the user made in the host's own widgets.
    pub fn sync_from_host(&mut self) -> SceneResult {
        let ids = self.host.get_selection();
        if ids.as_slice() == self.selection() {
            return Ok(());
        }
        self.execute(Box::new(SelectOperation::new(ids)))
    }

    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
    }

    // -----------------------------------------------------------------------
    // Editing commands
    // -----------------------------------------------------------------------

    /// Adds a serialized node under `parent` and returns its id.
    pub fn add_node(
        &mut self,
        json: Value,
        parent: NodeId,
        index: usize,
        x: f64,
        y: f64,
    ) -> SceneResult<NodeId> {
        let op = AddNodeOperation::new(json, index, x, y, parent);
        let id = op
            .node_id()
            .ok_or_else(|| SceneError::Json("node has no id".into()))?;
        self.execute(Box::new(op))?;
        Ok(id)
    }

    /// Appends a node built in code under `parent` at its own position.
    pub fn add(&mut self, node: ModelNode, parent: NodeId) -> SceneResult<NodeId> {
        let (x, y) = (node.transform.x, node.transform.y);
        let id = node.id;
        let mut scratch = SceneDocument::new();
        let root = scratch.root();
        scratch.insert_subtree(root, 0, vec![node])?;
        let json = scratch.node_to_json(id, false)?;
        let index = self.document().children(parent).len();
        self.add_node(json, parent, index, x, y)
    }

    pub fn set_property(&mut self, id: NodeId, key: PropertyKey, value: PropertyValue) -> SceneResult {
        self.execute(Box::new(SetPropertyOperation::new(id, key, value)))
    }

    pub fn clear_override(&mut self, id: NodeId, groups: PropertySet) -> SceneResult {
        self.execute(Box::new(ClearOverrideOperation::new(id, groups)))
    }

    pub fn change_body(&mut self, id: NodeId, body: Option<BodyModel>) -> SceneResult {
        self.execute(Box::new(ChangeBodyOperation::new(id, body)))
    }

    pub fn select(&mut self, ids: &[NodeId]) -> SceneResult {
        self.execute(Box::new(SelectOperation::new(ids.iter().copied())))
    }

    pub fn remove_from_selection(&mut self, ids: &[NodeId]) -> SceneResult {
        self.execute(Box::new(RemoveFromSelectionOperation::new(ids.iter().copied())))
    }

    pub fn reveal(&mut self, ids: &[NodeId]) -> SceneResult {
        self.execute(Box::new(ExpandOutlineOperation::new(ids.iter().copied())))
    }

    pub fn delete(&mut self, ids: &[NodeId]) -> SceneResult {
        let op = compose::delete_nodes(&self.model, ids)?;
        self.execute(Box::new(op))
    }

    /// Moves nodes into `target`, keeping their world positions.
    pub fn move_to_group(&mut self, ids: &[NodeId], target: NodeId, index: Option<usize>) -> SceneResult {
        let op = compose::move_to_group(&self.model, ids, target, index)?;
        self.execute(Box::new(op))
    }

    pub fn z_order(&mut self, id: NodeId, order: ZOrder) -> SceneResult {
        let op = compose::z_order(&self.model, id, order)?;
        self.execute(Box::new(op))
    }

    pub fn copy(&self, ids: &[NodeId]) -> SceneResult<Vec<Value>> {
        compose::copy(&self.model, ids)
    }

    pub fn paste(&mut self, nodes: &[Value], parent: NodeId) -> SceneResult<Vec<NodeId>> {
        let (op, created) = compose::paste(&self.model, nodes, parent)?;
        self.execute(Box::new(op))?;
        Ok(created)
    }

    pub fn duplicate(&mut self, ids: &[NodeId]) -> SceneResult<Vec<NodeId>> {
        let (op, created) = compose::duplicate(&self.model, ids)?;
        self.execute(Box::new(op))?;
        Ok(created)
    }

    pub fn instantiate_prefab(
        &mut self,
        path: &str,
        parent: NodeId,
        x: f64,
        y: f64,
    ) -> SceneResult<NodeId> {
        let (op, created) = compose::instantiate_prefab(&self.model, path, parent, x, y)?;
        self.execute(Box::new(op))?;
        created
            .first()
            .copied()
            .ok_or_else(|| SceneError::Json("prefab instance has no id".into()))
    }

    /// Replaces `id` with a node of another type and returns the new id.
    pub fn morph(&mut self, id: NodeId, target: &MorphTarget) -> SceneResult<NodeId> {
        let (op, created) = morph(&self.model, id, target)?;
        self.execute(Box::new(op))?;
        created
            .first()
            .copied()
            .ok_or(SceneError::NodeNotFound(id))
    }

    /// Saves `id` as a new prefab document and returns its project path.
    ///
    /// The scene itself is not changed.
    pub fn create_prefab(&mut self, name: &str, id: NodeId, read_only: PropertySet) -> SceneResult<String> {
        let assets = self.model.assets_arc();
        let path = self.model.library().write().create_from_node(
            name,
            self.model.document(),
            id,
            read_only,
            assets.as_ref(),
        )?;
        Ok(path)
    }

    /// Re-reads the prefab directory and refreshes every view node.
    pub fn reload_prefabs(&mut self) -> SceneResult<usize> {
        let assets = self.model.assets_arc();
        let count = self.model.library().write().refresh(assets.as_ref())?;
        self.after_change();
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Queries and picking
    // -----------------------------------------------------------------------

    /// Topmost node under a world point.
    pub fn hit_test(&self, point: Point2) -> Option<&ModelNode> {
        self.view.hit_test(point).and_then(|id| self.document().get(id))
    }

    pub fn walk_tree(&self, include_groups: bool, visitor: &mut dyn FnMut(&ModelNode)) {
        self.view.walk_tree(self.model.document(), include_groups, visitor);
    }

    pub fn resolved(&self, id: NodeId) -> SceneResult<ModelNode> {
        self.model.resolved(id)
    }

    pub fn property_grid(&self, id: NodeId) -> SceneResult<PropertyGrid> {
        PropertyGrid::build(&self.model, id)
    }

    /// Selects what is under `point`, or clears the selection on a miss.
    pub fn select_at(&mut self, point: Point2) -> SceneResult<Option<NodeId>> {
        let hit = self.view.hit_test(point);
        self.select(hit.as_slice())?;
        Ok(hit)
    }

    pub fn select_in_rect(&mut self, rect: Rect) -> SceneResult<Vec<NodeId>> {
        let ids = self.view.select_in_rect(rect);
        self.select(&ids)?;
        Ok(ids)
    }

    /// Selects every node showing the same asset as `id`.
    pub fn select_same_texture(&mut self, id: NodeId) -> SceneResult<Vec<NodeId>> {
        let ids = self.view.nodes_with_same_asset(self.model.document(), id);
        self.select(&ids)?;
        Ok(ids)
    }

    // -----------------------------------------------------------------------
    // Transcripts and persistence
    // -----------------------------------------------------------------------

    /// Records of the undo stack, oldest first.
    pub fn transcript(&self) -> Vec<OperationRecord> {
        self.history.transcript()
    }

    /// Rebuilds and executes records in order, stopping at the first
    /// failure. Returns how many were applied.
    pub fn replay(&mut self, records: Vec<OperationRecord>) -> SceneResult<usize> {
        let mut applied = 0;
        for record in records {
            let kind = record.kind();
            self.execute(record.into_operation()).inspect_err(|err| {
                log::warn!("replay stopped at record {applied} ({kind}): {err}");
            })?;
            applied += 1;
        }
        Ok(applied)
    }

    pub fn to_json(&self, relative_to_project: bool) -> SceneResult<Value> {
        self.model.document().to_json(relative_to_project)
    }

    /// Writes the saved form of the document and marks the history clean.
    pub fn save(&mut self, path: &Path) -> SceneResult {
        let text = self.model.document().to_json_string(true)?;
        std::fs::write(path, text)?;
        self.history.mark_saved();
        log::info!("saved scene to {}", path.display());
        Ok(())
    }
}
