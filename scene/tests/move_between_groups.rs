mod common;

use canvas_scene::{ErrorKind, ModelNode, PropertyKey, PropertyValue, ZOrder};
use common::*;

fn position(editor: &canvas_scene::SceneEditor, id: canvas_scene::NodeId) -> (f64, f64) {
    let node = editor.document().node(id).unwrap();
    (node.transform.x, node.transform.y)
}

fn close(a: (f64, f64), b: (f64, f64)) -> bool {
    (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
}

#[test]
fn world_position_is_preserved() {
    let mut editor = empty_editor();
    let r = root(&editor);
    let g1 = editor.add(ModelNode::group().at(50.0, 50.0), r).unwrap();
    let g2 = editor.add(ModelNode::group(), r).unwrap();
    let s = editor.add(ModelNode::sprite(ship()).at(50.0, 50.0), g1).unwrap();

    editor.move_to_group(&[s], g2, None).unwrap();
    assert_eq!(editor.document().parent_of(s), Some(g2));
    assert!(close(position(&editor, s), (100.0, 100.0)));
}

#[test]
fn rotated_and_scaled_targets_reproject() {
    let mut editor = empty_editor();
    let r = root(&editor);
    let s = editor.add(ModelNode::sprite(ship()).at(10.0, 0.0), r).unwrap();
    let g = editor.add(ModelNode::group().at(10.0, 0.0), r).unwrap();
    editor
        .set_property(g, PropertyKey::Angle, PropertyValue::Number(90.0))
        .unwrap();
    editor
        .set_property(g, PropertyKey::ScaleX, PropertyValue::Number(2.0))
        .unwrap();

    let world = editor.document().world_position(s).unwrap();
    editor.move_to_group(&[s], g, None).unwrap();
    let after = editor.document().world_position(s).unwrap();
    assert!(close((world.x, world.y), (after.x, after.y)));
}

#[test]
fn cyclic_moves_are_refused_without_change() {
    let mut editor = empty_editor();
    let r = root(&editor);
    let outer = editor.add(ModelNode::group(), r).unwrap();
    let inner = editor.add(ModelNode::group(), outer).unwrap();
    let before = snapshot(&editor);
    let depth = editor.history().undo_count();

    let err = editor.move_to_group(&[outer], inner, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CyclicGroupMove);
    let err = editor.move_to_group(&[outer], outer, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CyclicGroupMove);

    assert_eq!(snapshot(&editor), before);
    assert_eq!(editor.history().undo_count(), depth);
}

#[test]
fn missing_target_is_parent_not_found() {
    let mut editor = empty_editor();
    let r = root(&editor);
    let s = editor.add(ModelNode::sprite(ship()), r).unwrap();
    let err = editor
        .move_to_group(&[s], canvas_scene::NodeId::new(), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParentNotFound);
}

#[test]
fn several_nodes_keep_document_order_at_index() {
    let mut editor = empty_editor();
    let r = root(&editor);
    let a = editor.add(ModelNode::text("a"), r).unwrap();
    let b = editor.add(ModelNode::text("b"), r).unwrap();
    let g = editor.add(ModelNode::group(), r).unwrap();
    let existing = editor.add(ModelNode::text("c"), g).unwrap();

    editor.move_to_group(&[b, a], g, Some(0)).unwrap();
    assert_eq!(editor.document().children(g), &[a, b, existing]);
    editor.undo().unwrap();
    assert_eq!(editor.document().children(r), &[a, b, g]);
}

#[test]
fn z_order_round_trip() {
    let mut editor = empty_editor();
    let r = root(&editor);
    let a = editor.add(ModelNode::text("a"), r).unwrap();
    let b = editor.add(ModelNode::text("b"), r).unwrap();
    let c = editor.add(ModelNode::text("c"), r).unwrap();

    editor.z_order(a, ZOrder::Raise).unwrap();
    assert_eq!(editor.document().children(r), &[b, a, c]);
    editor.z_order(c, ZOrder::Bottom).unwrap();
    assert_eq!(editor.document().children(r), &[c, b, a]);
    editor.undo().unwrap();
    editor.undo().unwrap();
    assert_eq!(editor.document().children(r), &[a, b, c]);
}
