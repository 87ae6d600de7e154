//! Changing the concrete type of a node in place.
//!
//! A morph deletes the source node and adds a freshly built node of the new
//! type at the same parent, index and position, then selects it. The new
//! node takes over the source's editor metadata, overrides and every
//! property group the two types share, except the texture.

use canvas_core::abstract_editor::CompositeOperation;

use crate::asset::AssetRef;
use crate::error::{SceneError, SceneResult};
use crate::id::NodeId;
use crate::model::{ModelNode, PropertyKey, PropertyValue, SceneDocument};
use crate::ops::compose::ensure_movable;
use crate::ops::{AddNodeOperation, Built, DeleteNodeOperation, SelectOperation};
use crate::state::SceneModel;

/// Destination type of a morph with the input it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum MorphTarget {
    Sprite { texture: AssetRef },
    /// An explicit size wins. Otherwise a tile sprite source keeps its own
    /// size and other sources get the texture's frame size.
    TileSprite {
        texture: AssetRef,
        width: Option<f64>,
        height: Option<f64>,
    },
    Button { texture: AssetRef },
    /// `text` is only used when the source carries no text of its own.
    Text { text: Option<String> },
    BitmapText { font: AssetRef, text: Option<String> },
}

impl MorphTarget {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Sprite { .. } => "sprite",
            Self::TileSprite { .. } => "tileSprite",
            Self::Button { .. } => "button",
            Self::Text { .. } => "text",
            Self::BitmapText { .. } => "bitmapText",
        }
    }

    fn asset(&self) -> Option<&AssetRef> {
        match self {
            Self::Sprite { texture }
            | Self::TileSprite { texture, .. }
            | Self::Button { texture } => Some(texture),
            Self::BitmapText { font, .. } => Some(font),
            Self::Text { .. } => None,
        }
    }
}

/// Builds the morph of `id` into `target`.
///
/// Refused with [`SceneError::UnresolvedAsset`] when the new type's asset
/// does not resolve; nothing is built in that case.
pub fn morph(model: &SceneModel, id: NodeId, target: &MorphTarget) -> SceneResult<Built> {
    let doc = model.document();
    let source = doc.node(id)?;
    if source.is_group() {
        return Err(SceneError::InvalidProperty("groups cannot be morphed".into()));
    }
    ensure_movable(doc, id)?;

    let frame = match target.asset() {
        Some(asset) => match model.assets().resolve_asset_key(asset) {
            Some(frame) => Some(frame),
            None => {
                log::warn!("morph of {id} refused: asset '{asset}' does not resolve");
                return Err(SceneError::UnresolvedAsset(asset.to_string()));
            }
        },
        None => None,
    };
    let text = |fallback: &Option<String>| -> SceneResult<String> {
        source
            .text_content()
            .map(str::to_owned)
            .or_else(|| fallback.clone())
            .ok_or_else(|| SceneError::InvalidProperty("morphing to text needs a text".into()))
    };

    let mut next = match target {
        MorphTarget::Sprite { texture } => ModelNode::sprite(texture.clone()),
        MorphTarget::TileSprite {
            texture,
            width,
            height,
        } => {
            let frame = frame.unwrap_or_default();
            ModelNode::tile_sprite(
                texture.clone(),
                width.unwrap_or(frame.width),
                height.unwrap_or(frame.height),
            )
        }
        MorphTarget::Button { texture } => ModelNode::button(texture.clone()),
        MorphTarget::Text { text: fallback } => ModelNode::text(text(fallback)?),
        MorphTarget::BitmapText {
            font,
            text: fallback,
        } => ModelNode::bitmap_text(font.clone(), text(fallback)?),
    };
    next.update_with(source);
    if let MorphTarget::TileSprite { width, height, .. } = target {
        if let Some(width) = width {
            next.set(PropertyKey::TileWidth, PropertyValue::Number(*width))?;
        }
        if let Some(height) = height {
            next.set(PropertyKey::TileHeight, PropertyValue::Number(*height))?;
        }
    }
    let new_id = next.id;

    let parent = doc.parent_of(id).ok_or(SceneError::NodeNotFound(id))?;
    let index = doc.index_of(id).ok_or(SceneError::NodeNotFound(id))?;
    let (x, y) = (source.transform.x, source.transform.y);

    let mut scratch = SceneDocument::new();
    let scratch_root = scratch.root();
    scratch.insert_subtree(scratch_root, 0, vec![next])?;
    let json = scratch.node_to_json(new_id, false)?;

    let composite = CompositeOperation::new(format!("Morph to {}", target.type_name()))
        .with(DeleteNodeOperation::new(id))
        .with(AddNodeOperation::new(json, index, x, y, parent))
        .with(SelectOperation::new([new_id]));
    Ok((composite, vec![new_id]))
}
