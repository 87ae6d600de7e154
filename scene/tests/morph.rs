mod common;

use canvas_scene::{AssetRef, ErrorKind, ModelNode, MorphTarget, PropertyKey, PropertyValue};
use common::*;

#[test]
fn morph_preserves_transform_and_slot() {
    let mut editor = empty_editor();
    let r = root(&editor);
    editor.add(ModelNode::text("first"), r).unwrap();
    let source = editor.add(ModelNode::sprite(ship()).at(10.0, 20.0), r).unwrap();
    editor
        .set_property(source, PropertyKey::Angle, PropertyValue::Number(45.0))
        .unwrap();
    editor.select(&[source]).unwrap();

    let morphed = editor
        .morph(source, &MorphTarget::Button { texture: coin() })
        .unwrap();
    assert_ne!(morphed, source);
    assert!(!editor.document().contains(source));
    assert_eq!(editor.document().index_of(morphed), Some(1));
    let node = editor.document().node(morphed).unwrap();
    assert_eq!(node.type_name(), "button");
    assert_eq!(
        (node.transform.x, node.transform.y, node.transform.angle),
        (10.0, 20.0, 45.0)
    );
    assert_eq!(node.texture(), Some(&coin()));
    assert_eq!(editor.selection(), &[morphed]);
    assert!(editor.view().contains(morphed));
    assert!(!editor.view().contains(source));
}

#[test]
fn morph_undoes_as_one_step() {
    let mut editor = empty_editor();
    let r = root(&editor);
    let source = editor.add(ModelNode::sprite(ship()), r).unwrap();
    editor.select(&[source]).unwrap();
    let before = snapshot(&editor);

    editor.morph(source, &MorphTarget::Sprite { texture: coin() }).unwrap();
    let after = snapshot(&editor);
    editor.undo().unwrap();
    assert_eq!(snapshot(&editor), before);
    assert_eq!(editor.selection(), &[source]);
    editor.redo().unwrap();
    assert_eq!(snapshot(&editor), after);
}

#[test]
fn unresolved_asset_leaves_everything_alone() {
    let mut editor = empty_editor();
    let r = root(&editor);
    let source = editor.add(ModelNode::sprite(ship()), r).unwrap();
    let before = snapshot(&editor);
    let depth = editor.history().undo_count();

    let err = editor
        .morph(
            source,
            &MorphTarget::Sprite {
                texture: AssetRef::new("nowhere"),
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnresolvedAsset);
    assert_eq!(snapshot(&editor), before);
    assert_eq!(editor.history().undo_count(), depth);
}

#[test]
fn text_to_bitmap_text_keeps_text_and_size() {
    let mut editor = empty_editor();
    let r = root(&editor);
    let source = editor.add(ModelNode::text("score"), r).unwrap();
    editor
        .set_property(source, PropertyKey::FontSize, PropertyValue::Number(48.0))
        .unwrap();

    let morphed = editor
        .morph(
            source,
            &MorphTarget::BitmapText {
                font: AssetRef::new("font"),
                text: None,
            },
        )
        .unwrap();
    let node = editor.document().node(morphed).unwrap();
    assert_eq!(node.text_content(), Some("score"));
    assert_eq!(node.get(PropertyKey::FontSize), Some(PropertyValue::Number(48.0)));
}
