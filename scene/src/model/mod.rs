//! The scene object model.
//!
//! - [`ModelNode`] / [`NodeKind`]: nodes and their typed payloads
//! - [`SceneDocument`]: id-indexed arena holding one scene tree
//! - [`BodyModel`]: arcade physics bodies
//! - [`PropertySet`], [`PropertyKey`], [`PropertyValue`]: the property system
//!   shared by prefab overrides, operations and the property grid

pub mod body;
pub mod document;
pub mod json;
pub mod node;
pub mod property;

pub use body::{ArcadeBody, BodyModel, BodyShape, CheckCollision, CircleArcadeBody, RectArcadeBody};
pub use document::SceneDocument;
pub use json::{json_node_id, nodes_from_json, regenerate_ids};
pub use node::{
    BitmapFont, ButtonData, DEFAULT_OVERRIDES, EditorInfo, ModelNode, NodeKind, SpriteData,
    TextStyle, TileData, Transform,
};
pub use property::{PropertyKey, PropertySet, PropertyValue};
