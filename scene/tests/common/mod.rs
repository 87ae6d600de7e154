//! Shared fixtures for the scene integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use canvas_scene::{
    AssetRef, AssetTable, FrameDescriptor, NodeId, PrefabLibrary, SceneDocument, SceneEditor,
    SceneModel, SelectionMirror, SharedPrefabLibrary,
};

pub fn ship() -> AssetRef {
    AssetRef::new("ship")
}

pub fn coin() -> AssetRef {
    AssetRef::new("atlas").with_frame("coin")
}

/// Manifest with a 20x10 ship and a 16x16 coin frame.
pub fn assets() -> AssetTable {
    AssetTable::new()
        .with(&ship(), FrameDescriptor::new(20.0, 10.0))
        .with(&coin(), FrameDescriptor::new(16.0, 16.0))
        .with(&AssetRef::new("font"), FrameDescriptor::new(8.0, 8.0))
}

pub fn editor_with(doc: SceneDocument, library: SharedPrefabLibrary) -> SceneEditor {
    let model = SceneModel::new(doc, library, Arc::new(assets()));
    SceneEditor::new(model, Box::new(SelectionMirror::default()), 100)
}

pub fn empty_editor() -> SceneEditor {
    editor_with(SceneDocument::new(), PrefabLibrary::in_memory().shared())
}

/// Full serialization used to compare states.
pub fn snapshot(editor: &SceneEditor) -> String {
    editor.document().to_json_string(false).unwrap()
}

pub fn root(editor: &SceneEditor) -> NodeId {
    editor.document().root()
}
