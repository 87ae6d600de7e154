mod common;

use canvas_scene::model::{BitmapFont, BodyModel, RectArcadeBody};
use canvas_scene::{
    AssetRef, ModelNode, NodeKind, PrefabLibrary, PropertyKey, PropertySet, PropertyValue,
    SceneDocument,
};
use common::*;
use serde_json::json;

fn every_kind() -> SceneDocument {
    let mut doc = SceneDocument::new();
    let root = doc.root();

    let mut sprite = ModelNode::sprite(ship()).with_editor_name("hero").at(3.0, 4.0);
    sprite.transform.angle = 12.5;
    sprite.alpha = 0.75;
    sprite
        .set(PropertyKey::Tint, PropertyValue::Text("#ff00ff".into()))
        .unwrap();
    sprite
        .set(PropertyKey::Data, PropertyValue::Json(json!({"hp": 3})))
        .unwrap();
    sprite
        .set(
            PropertyKey::Body,
            PropertyValue::Body(Some(BodyModel::RectArcade(RectArcadeBody::default()))),
        )
        .unwrap();

    let mut button = ModelNode::button(coin());
    if let NodeKind::Button { button: data, .. } = &mut button.kind {
        data.callback = "onPlay".into();
        data.over_frame = Some("over".into());
    }
    let tile = ModelNode::tile_sprite(ship(), 128.0, 32.0);
    let mut text = ModelNode::text("Hello\nworld");
    text.set(PropertyKey::Fill, PropertyValue::Text("#ffffff".into()))
        .unwrap();
    let mut bitmap = ModelNode::bitmap_text(AssetRef::new("font"), "42");
    if let NodeKind::BitmapText { font, .. } = &mut bitmap.kind {
        *font = BitmapFont {
            size: 20.0,
            ..BitmapFont::new(AssetRef::new("font"))
        };
    }

    let group = doc
        .insert_subtree(root, 0, vec![ModelNode::group().with_editor_name("layer").at(1.0, 1.0)])
        .unwrap();
    for (i, node) in [sprite, button, tile, text, bitmap].into_iter().enumerate() {
        doc.insert_subtree(group, i, vec![node]).unwrap();
    }
    doc
}

#[test]
fn every_node_kind_round_trips() {
    let doc = every_kind();
    let text = doc.to_json_string(false).unwrap();
    let loaded = SceneDocument::from_json_str(&text, &assets()).unwrap();

    assert_eq!(loaded.root(), doc.root());
    assert_eq!(loaded.len(), doc.len());
    for node in doc.iter_depth_first() {
        assert_eq!(loaded.get(node.id), Some(node), "node {}", node.type_name());
    }
    assert_eq!(loaded.to_json_string(false).unwrap(), text);
}

#[test]
fn missing_asset_nodes_survive_load_save_and_undo() {
    let original = json!({
        "type": "group",
        "info": {"children": [{
            "type": "sprite",
            "id": "0f7a3c52-1c1e-4b5e-9a53-3b5b2f6f5d01",
            "custom": {"kept": true},
            "info": {"texture": {"key": "gone"}, "x": 7.0, "futureKey": [1, 2]}
        }]}
    });
    let doc = SceneDocument::from_json(&original, &assets()).unwrap();
    let id = doc.children(doc.root())[0];
    assert!(doc.node(id).unwrap().is_missing_asset());

    let mut editor = editor_with(doc, PrefabLibrary::in_memory().shared());
    let saved = editor.to_json(false).unwrap();
    let node = &saved["info"]["children"][0];
    assert_eq!(node["custom"], json!({"kept": true}));
    assert_eq!(node["info"]["futureKey"], json!([1, 2]));
    assert_eq!(node["info"]["texture"], json!({"key": "gone"}));

    let before = snapshot(&editor);
    editor.delete(&[id]).unwrap();
    editor.undo().unwrap();
    assert_eq!(snapshot(&editor), before);

    editor
        .set_property(id, PropertyKey::X, PropertyValue::Number(9.0))
        .unwrap();
    assert_eq!(editor.to_json(false).unwrap()["info"]["children"][0]["info"]["x"], 9.0);
}

#[test]
fn prefabs_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let library = PrefabLibrary::new(dir.path(), "prefabs").shared();
    let mut editor = editor_with(every_kind(), library.clone());
    let r = root(&editor);
    let layer = editor.document().children(r)[0];

    let path = editor.create_prefab("Layer", layer, PropertySet::TEXTURE).unwrap();
    assert_eq!(path, "prefabs/Layer.json");
    assert!(dir.path().join("prefabs/Layer.json").exists());

    library.write().clear();
    assert_eq!(editor.reload_prefabs().unwrap(), 1);
    let instance = editor.instantiate_prefab(&path, r, 0.0, 0.0).unwrap();
    let first = editor.document().children(instance)[0];
    assert_eq!(editor.resolved(first).unwrap().editor.name, "hero");
    assert_eq!(editor.resolved(first).unwrap().transform.angle, 12.5);
    assert_eq!(
        editor.document().node(instance).unwrap().prefab.as_deref(),
        Some("prefabs/Layer.json")
    );
}
