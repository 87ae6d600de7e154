mod common;

use canvas_core::abstract_editor::DocumentState;
use canvas_scene::{ModelNode, PropertyKey, PropertyValue, SceneError};
use common::*;

// ---------------------------------------------------------------------------
// Undo idempotence and redo fidelity
// ---------------------------------------------------------------------------

#[test]
fn add_then_delete_then_undo_twice() {
    let mut editor = empty_editor();
    let r = root(&editor);
    let empty = snapshot(&editor);

    let a = editor.add(ModelNode::sprite(ship()), r).unwrap();
    assert_eq!(editor.document().children(r), &[a]);
    editor.delete(&[a]).unwrap();
    assert!(editor.document().children(r).is_empty());

    assert!(editor.undo().unwrap());
    assert_eq!(editor.document().children(r), &[a]);
    assert!(editor.undo().unwrap());
    assert!(editor.document().children(r).is_empty());
    assert_eq!(snapshot(&editor), empty);
}

#[test]
fn composite_undo_and_redo_are_byte_identical() {
    let mut editor = empty_editor();
    let r = root(&editor);
    let g1 = editor.add(ModelNode::group().at(50.0, 50.0), r).unwrap();
    let g2 = editor.add(ModelNode::group(), r).unwrap();
    let s = editor.add(ModelNode::sprite(ship()).at(5.0, 5.0), g1).unwrap();
    editor.select(&[s]).unwrap();

    let before = snapshot(&editor);
    editor.move_to_group(&[s], g2, None).unwrap();
    let after = snapshot(&editor);
    assert_ne!(before, after);

    editor.undo().unwrap();
    assert_eq!(snapshot(&editor), before);
    editor.redo().unwrap();
    assert_eq!(snapshot(&editor), after);
    assert_eq!(editor.selection(), &[s]);
}

#[test]
fn empty_stacks_are_silent() {
    let mut editor = empty_editor();
    assert!(!editor.undo().unwrap());
    assert!(!editor.redo().unwrap());
    assert_eq!(editor.document_state(), DocumentState::Clean);
}

#[test]
fn new_operation_clears_redo() {
    let mut editor = empty_editor();
    let r = root(&editor);
    let a = editor.add(ModelNode::text("a"), r).unwrap();
    editor.undo().unwrap();
    assert_eq!(editor.history().redo_count(), 1);
    editor.add(ModelNode::text("b"), r).unwrap();
    assert_eq!(editor.history().redo_count(), 0);
    assert!(!editor.document().contains(a));
}

#[test]
fn selection_changes_do_not_dirty_the_document() {
    let mut editor = empty_editor();
    let r = root(&editor);
    let a = editor.add(ModelNode::text("a"), r).unwrap();
    editor.mark_saved();
    editor.select(&[a]).unwrap();
    assert_eq!(editor.document_state(), DocumentState::Clean);
    editor
        .set_property(a, PropertyKey::Alpha, PropertyValue::Number(0.5))
        .unwrap();
    assert_eq!(editor.document_state(), DocumentState::Dirty);
    editor.undo().unwrap();
    assert_eq!(editor.document_state(), DocumentState::Clean);
}

#[test]
fn refused_operations_are_not_recorded() {
    let mut editor = empty_editor();
    let r = root(&editor);
    let a = editor.add(ModelNode::text("a"), r).unwrap();
    let before = snapshot(&editor);
    let depth = editor.history().undo_count();

    let err = editor
        .set_property(a, PropertyKey::Texture, PropertyValue::Asset(Some(ship())))
        .unwrap_err();
    assert!(matches!(err, SceneError::InvalidProperty(_)));
    assert_eq!(editor.history().undo_count(), depth);
    assert_eq!(snapshot(&editor), before);
}

#[test]
fn transcript_replays_on_a_fresh_document() {
    let mut editor = empty_editor();
    let r = root(&editor);
    let g = editor.add(ModelNode::group(), r).unwrap();
    let s = editor.add(ModelNode::sprite(ship()).at(1.0, 2.0), r).unwrap();
    editor.move_to_group(&[s], g, None).unwrap();
    editor
        .set_property(s, PropertyKey::Angle, PropertyValue::Number(30.0))
        .unwrap();
    let records = editor.transcript();
    let text = serde_json::to_string(&records).unwrap();

    let mut fresh = editor_with(
        canvas_scene::SceneDocument::from_json(
            &serde_json::json!({"type": "group", "id": r.to_string(), "info": {"editorName": "world"}}),
            &assets(),
        )
        .unwrap(),
        canvas_scene::PrefabLibrary::in_memory().shared(),
    );
    let records: Vec<canvas_scene::OperationRecord> = serde_json::from_str(&text).unwrap();
    assert_eq!(fresh.replay(records).unwrap(), 4);
    assert_eq!(snapshot(&fresh), snapshot(&editor));
}
