//! Editing commands expressed as composites of the primitive operations.
//!
//! Every builder validates against the current model and either returns a
//! ready-to-execute composite or refuses before any operation exists. Moves
//! and z-order changes are delete + add pairs; the add re-inserts the
//! deleted node's own JSON, so ids survive.

use std::collections::{HashMap, HashSet};

use canvas_core::abstract_editor::CompositeOperation;
use canvas_core::math::{Point2, project_to_local};
use serde_json::Value;

use crate::error::{SceneError, SceneResult};
use crate::id::NodeId;
use crate::model::{SceneDocument, json_node_id, regenerate_ids};
use crate::ops::{AddNodeOperation, DeleteNodeOperation, ExpandOutlineOperation, SelectOperation};
use crate::state::SceneModel;

/// Composite plus the ids of the nodes it creates.
pub type Built = (CompositeOperation<SceneModel>, Vec<NodeId>);

/// Direction of a z-order change within the parent group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrder {
    /// One step towards the front.
    Raise,
    /// One step towards the back.
    Lower,
    Top,
    Bottom,
}

impl ZOrder {
    fn description(self) -> &'static str {
        match self {
            Self::Raise => "Raise",
            Self::Lower => "Lower",
            Self::Top => "Bring to top",
            Self::Bottom => "Send to bottom",
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Existing ids without those already covered by a selected ancestor, in
/// document order.
fn top_level(doc: &SceneDocument, ids: &[NodeId]) -> SceneResult<Vec<NodeId>> {
    let mut wanted = HashSet::new();
    for id in ids {
        if !doc.contains(*id) {
            return Err(SceneError::NodeNotFound(*id));
        }
        wanted.insert(*id);
    }
    Ok(doc
        .subtree(doc.root())
        .into_iter()
        .filter(|id| wanted.contains(id))
        .filter(|id| !doc.ancestors(*id).iter().any(|a| wanted.contains(a)))
        .collect())
}

/// Refuses structural edits of the root and of nodes owned by a prefab
/// instance (the instance root itself may move).
pub(crate) fn ensure_movable(doc: &SceneDocument, id: NodeId) -> SceneResult {
    if id == doc.root() {
        return Err(SceneError::InvalidProperty(
            "the root group cannot be moved or removed".into(),
        ));
    }
    if doc.instance_roots(id).iter().any(|(root, _)| *root != id) {
        return Err(SceneError::InvalidProperty(format!(
            "node {id} belongs to a prefab instance"
        )));
    }
    Ok(())
}

/// Target groups must exist and must not be prefab instance content.
fn ensure_open_group(doc: &SceneDocument, target: NodeId) -> SceneResult {
    if !doc.get(target).is_some_and(|n| n.is_group()) {
        return Err(SceneError::ParentNotFound(target));
    }
    if !doc.instance_roots(target).is_empty() {
        return Err(SceneError::InvalidProperty(format!(
            "group {target} belongs to a prefab instance"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Moves nodes into `target`, keeping each node's world position.
///
/// Nodes are inserted from `index` on (appended when `None`) in document
/// order. Moving a group into itself or into one of its descendants fails
/// with [`SceneError::CyclicGroupMove`].
pub fn move_to_group(
    model: &SceneModel,
    ids: &[NodeId],
    target: NodeId,
    index: Option<usize>,
) -> SceneResult<CompositeOperation<SceneModel>> {
    let doc = model.document();
    ensure_open_group(doc, target)?;
    let ids = top_level(doc, ids)?;
    for id in &ids {
        if doc.is_ancestor_or_self(*id, target) {
            return Err(SceneError::CyclicGroupMove {
                group: *id,
                target,
            });
        }
        ensure_movable(doc, *id)?;
    }

    let target_world = doc.world_matrix(target);
    let mut slots = doc.children(target).to_vec();
    let mut insert_at = index.unwrap_or(slots.len());
    let mut composite = CompositeOperation::new("Move to group");
    for id in &ids {
        let world = doc
            .world_position(*id)
            .ok_or(SceneError::NodeNotFound(*id))?;
        let local: Point2 = project_to_local(world, &target_world).ok_or_else(|| {
            SceneError::InvalidProperty(format!("group {target} has a degenerate transform"))
        })?;
        if let Some(pos) = slots.iter().position(|s| s == id) {
            slots.remove(pos);
            if pos < insert_at {
                insert_at -= 1;
            }
        }
        let at = insert_at.min(slots.len());
        slots.insert(at, *id);
        insert_at = at + 1;

        let json = doc.node_to_json(*id, false)?;
        composite.push(Box::new(DeleteNodeOperation::with_clear_selection(*id, false)));
        composite.push(Box::new(AddNodeOperation::new(json, at, local.x, local.y, target)));
    }
    composite.push(Box::new(ExpandOutlineOperation::new(ids)));
    Ok(composite)
}

/// Changes the stacking position of `id` among its siblings.
///
/// Already at the requested end, the composite is empty.
pub fn z_order(
    model: &SceneModel,
    id: NodeId,
    order: ZOrder,
) -> SceneResult<CompositeOperation<SceneModel>> {
    let doc = model.document();
    let node = doc.node(id)?;
    ensure_movable(doc, id)?;
    let parent = doc.parent_of(id).ok_or(SceneError::NodeNotFound(id))?;
    let index = doc.index_of(id).ok_or(SceneError::NodeNotFound(id))?;
    let last = doc.children(parent).len().saturating_sub(1);
    let next = match order {
        ZOrder::Raise => (index + 1).min(last),
        ZOrder::Lower => index.saturating_sub(1),
        ZOrder::Top => last,
        ZOrder::Bottom => 0,
    };

    let mut composite = CompositeOperation::new(order.description());
    if next != index {
        let json = doc.node_to_json(id, false)?;
        let (x, y) = (node.transform.x, node.transform.y);
        composite.push(Box::new(DeleteNodeOperation::with_clear_selection(id, false)));
        composite.push(Box::new(AddNodeOperation::new(json, next, x, y, parent)));
    }
    Ok(composite)
}

/// Deletes nodes with their subtrees and drops them from the selection.
pub fn delete_nodes(model: &SceneModel, ids: &[NodeId]) -> SceneResult<CompositeOperation<SceneModel>> {
    let doc = model.document();
    let ids = top_level(doc, ids)?;
    let mut composite = CompositeOperation::new("Delete");
    for id in ids {
        ensure_movable(doc, id)?;
        composite.push(Box::new(DeleteNodeOperation::new(id)));
    }
    Ok(composite)
}

/// Full JSON snapshots of the given nodes, for the clipboard.
pub fn copy(model: &SceneModel, ids: &[NodeId]) -> SceneResult<Vec<Value>> {
    let doc = model.document();
    top_level(doc, ids)?
        .into_iter()
        .map(|id| doc.node_to_json(id, false))
        .collect()
}

/// Inserts a copy of each node right after the original and selects the
/// copies.
pub fn duplicate(model: &SceneModel, ids: &[NodeId]) -> SceneResult<Built> {
    let doc = model.document();
    let ids = top_level(doc, ids)?;
    let mut slots: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    let mut composite = CompositeOperation::new("Duplicate");
    let mut created = Vec::new();
    for id in ids {
        ensure_movable(doc, id)?;
        let node = doc.node(id)?;
        let parent = doc.parent_of(id).ok_or(SceneError::NodeNotFound(id))?;
        let siblings = slots
            .entry(parent)
            .or_insert_with(|| doc.children(parent).to_vec());
        let at = siblings.iter().position(|s| *s == id).map_or(siblings.len(), |p| p + 1);

        let mut json = doc.node_to_json(id, false)?;
        let copy = regenerate_ids(&mut json)
            .ok_or_else(|| SceneError::Json("node must be a JSON object".into()))?;
        siblings.insert(at, copy);
        let (x, y) = (node.transform.x, node.transform.y);
        composite.push(Box::new(AddNodeOperation::new(json, at, x, y, parent)));
        created.push(copy);
    }
    composite.push(Box::new(SelectOperation::new(created.clone())));
    Ok((composite, created))
}

/// Appends clipboard nodes to `parent` under fresh ids and selects them.
pub fn paste(model: &SceneModel, nodes: &[Value], parent: NodeId) -> SceneResult<Built> {
    let doc = model.document();
    ensure_open_group(doc, parent)?;
    let mut at = doc.children(parent).len();
    let mut composite = CompositeOperation::new("Paste");
    let mut created = Vec::new();
    for node in nodes {
        let mut json = node.clone();
        let id = regenerate_ids(&mut json)
            .ok_or_else(|| SceneError::Json("node must be a JSON object".into()))?;
        let coord = |key: &str| {
            json.get("info")
                .and_then(|info| info.get(key))
                .and_then(Value::as_f64)
                .unwrap_or(0.0)
        };
        let (x, y) = (coord("x"), coord("y"));
        composite.push(Box::new(AddNodeOperation::new(json, at, x, y, parent)));
        created.push(id);
        at += 1;
    }
    composite.push(Box::new(SelectOperation::new(created.clone())));
    Ok((composite, created))
}

/// Adds a new instance of the prefab at `path` and selects it.
pub fn instantiate_prefab(
    model: &SceneModel,
    path: &str,
    parent: NodeId,
    x: f64,
    y: f64,
) -> SceneResult<Built> {
    let doc = model.document();
    ensure_open_group(doc, parent)?;
    let json = {
        let library = model.library().read();
        let prefab = library
            .get(path)
            .ok_or_else(|| SceneError::PrefabNotFound(path.to_owned()))?;
        prefab.instance_json()?
    };
    let id = json_node_id(&json)?;
    let at = doc.children(parent).len();
    let composite = CompositeOperation::new("Add prefab")
        .with(AddNodeOperation::new(json, at, x, y, parent))
        .with(SelectOperation::new([id]));
    Ok((composite, vec![id]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetRef, UncheckedAssets};
    use crate::model::ModelNode;
    use crate::prefab::PrefabLibrary;
    use canvas_core::abstract_editor::Operation;
    use std::sync::Arc;

    struct Fixture {
        model: SceneModel,
        g1: NodeId,
        g2: NodeId,
        sprite: NodeId,
    }

    fn fixture() -> Fixture {
        let mut doc = SceneDocument::new();
        let root = doc.root();
        let g1 = doc.insert_subtree(root, 0, vec![ModelNode::group().at(50.0, 50.0)]).unwrap();
        let g2 = doc.insert_subtree(root, 1, vec![ModelNode::group()]).unwrap();
        let sprite = doc
            .insert_subtree(g1, 0, vec![ModelNode::sprite(AssetRef::new("ship")).at(50.0, 50.0)])
            .unwrap();
        let model = SceneModel::new(doc, PrefabLibrary::in_memory().shared(), Arc::new(UncheckedAssets));
        Fixture {
            model,
            g1,
            g2,
            sprite,
        }
    }

    #[test]
    fn move_keeps_world_position() {
        let mut f = fixture();
        let mut op = move_to_group(&f.model, &[f.sprite], f.g2, None).unwrap();
        op.apply(&mut f.model).unwrap();
        let node = f.model.document().node(f.sprite).unwrap();
        assert_eq!(node.parent, Some(f.g2));
        assert!((node.transform.x - 100.0).abs() < 1e-9);
        assert!((node.transform.y - 100.0).abs() < 1e-9);
        assert!(f.model.document().children(f.g1).is_empty());
    }

    #[test]
    fn move_into_descendant_is_refused() {
        let f = fixture();
        let err = move_to_group(&f.model, &[f.g1], f.g1, None).unwrap_err();
        assert!(matches!(err, SceneError::CyclicGroupMove { .. }));
        let inner = f.sprite;
        let err = move_to_group(&f.model, &[f.g1], inner, None).unwrap_err();
        assert!(matches!(err, SceneError::ParentNotFound(_)));
    }

    #[test]
    fn move_to_missing_group_is_refused() {
        let f = fixture();
        let err = move_to_group(&f.model, &[f.sprite], NodeId::new(), None).unwrap_err();
        assert!(matches!(err, SceneError::ParentNotFound(_)));
    }

    #[test]
    fn z_order_moves_within_parent() {
        let mut f = fixture();
        let root = f.model.document().root();
        let mut op = z_order(&f.model, f.g1, ZOrder::Top).unwrap();
        op.apply(&mut f.model).unwrap();
        assert_eq!(f.model.document().children(root), &[f.g2, f.g1]);
        assert!(z_order(&f.model, f.g1, ZOrder::Raise).unwrap().is_empty());
        op.undo(&mut f.model).unwrap();
        assert_eq!(f.model.document().children(root), &[f.g1, f.g2]);
    }

    #[test]
    fn duplicate_inserts_after_original_and_selects() {
        let mut f = fixture();
        let (mut op, created) = duplicate(&f.model, &[f.sprite]).unwrap();
        op.apply(&mut f.model).unwrap();
        assert_eq!(f.model.document().children(f.g1), &[f.sprite, created[0]]);
        assert_eq!(f.model.selection().ids(), created.as_slice());
        assert_ne!(created[0], f.sprite);
    }

    #[test]
    fn paste_uses_fresh_ids() {
        let mut f = fixture();
        let clipboard = copy(&f.model, &[f.g1, f.sprite]).unwrap();
        assert_eq!(clipboard.len(), 1);
        let (mut op, created) = paste(&f.model, &clipboard, f.g2).unwrap();
        op.apply(&mut f.model).unwrap();
        let pasted = f.model.document().node(created[0]).unwrap();
        assert_eq!(pasted.children().len(), 1);
        assert_ne!(pasted.children()[0], f.sprite);
        assert_eq!((pasted.transform.x, pasted.transform.y), (50.0, 50.0));
    }

    #[test]
    fn unknown_prefab_is_refused() {
        let f = fixture();
        let root = f.model.document().root();
        let err = instantiate_prefab(&f.model, "prefabs/Nope.json", root, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, SceneError::PrefabNotFound(_)));
    }
}
