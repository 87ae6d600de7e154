//! # Canvas Scene
//!
//! The scene-authoring core of the Canvas editor:
//!
//! - [`model`]: node tree, property groups and the JSON document format
//! - [`prefab`]: prefab library and override resolution
//! - [`ops`]: undoable scene operations and the composites built from them
//! - [`editor`]: [`SceneEditor`], the per-document command engine
//! - [`view`]: the view mirror reconciled after every operation
//! - [`grid`]: property grid binding
//! - [`morph`]: in-place node type changes

pub mod asset;
pub mod editor;
pub mod error;
pub mod grid;
pub mod id;
pub mod model;
pub mod morph;
pub mod ops;
pub mod prefab;
pub mod selection;
pub mod state;
pub mod view;

pub use asset::{AssetRef, AssetResolver, AssetTable, FrameDescriptor, UncheckedAssets};
pub use editor::SceneEditor;
pub use error::{ErrorKind, SceneError, SceneResult};
pub use grid::{GridProperty, GridSection, PropertyGrid};
pub use id::NodeId;
pub use model::{ModelNode, NodeKind, PropertyKey, PropertySet, PropertyValue, SceneDocument};
pub use morph::MorphTarget;
pub use ops::{OperationRecord, ZOrder};
pub use prefab::{OverrideResolver, Prefab, PrefabLibrary, PropertySource, SharedPrefabLibrary};
pub use selection::{Selection, SelectionHost, SelectionMirror};
pub use state::{SceneChange, SceneModel};
pub use view::{SceneView, ViewNode};
