//! Model nodes.
//!
//! Nodes live in a [`SceneDocument`](crate::model::SceneDocument) arena and
//! point at their parent by id only. The concrete node type is the
//! [`NodeKind`] payload; shared state (editor metadata, transform, display
//! flags, prefab bookkeeping) sits on [`ModelNode`] itself.

use canvas_core::math::{Mat3, affine_from_layout};
use serde_json::{Map, Value};

use crate::asset::AssetRef;
use crate::error::{SceneError, SceneResult};
use crate::id::NodeId;
use crate::model::body::BodyModel;
use crate::model::property::{PropertyKey, PropertySet, PropertyValue};

/// Editor-only metadata, used by code generation and the outline.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorInfo {
    pub name: String,
    pub pick: bool,
    pub generate: bool,
    pub public: bool,
    pub field: bool,
    pub show: bool,
}

impl Default for EditorInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            pick: true,
            generate: true,
            public: false,
            field: false,
            show: true,
        }
    }
}

/// Position, rotation, scale and pivot relative to the parent group.
///
/// `angle` is in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub pivot_x: f64,
    pub pivot_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            pivot_x: 0.0,
            pivot_y: 0.0,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat3 {
        affine_from_layout(
            self.x,
            self.y,
            self.angle,
            self.scale_x,
            self.scale_y,
            self.pivot_x,
            self.pivot_y,
        )
    }
}

/// State shared by every displayable (non-group) node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpriteData {
    pub anchor_x: f64,
    pub anchor_y: f64,
    pub tint: Option<String>,
    pub data: Option<Value>,
    pub body: Option<BodyModel>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileData {
    pub width: f64,
    pub height: f64,
    pub tile_position_x: f64,
    pub tile_position_y: f64,
    pub tile_scale_x: f64,
    pub tile_scale_y: f64,
}

impl Default for TileData {
    fn default() -> Self {
        Self {
            width: 64.0,
            height: 64.0,
            tile_position_x: 0.0,
            tile_position_y: 0.0,
            tile_scale_x: 1.0,
            tile_scale_y: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ButtonData {
    pub callback: String,
    pub callback_context: String,
    pub over_frame: Option<String>,
    pub out_frame: Option<String>,
    pub down_frame: Option<String>,
    pub up_frame: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: String,
    pub font_size: f64,
    pub fill: String,
    pub align: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: "Arial".into(),
            font_size: 32.0,
            fill: "#000000".into(),
            align: "left".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BitmapFont {
    pub font: AssetRef,
    pub size: f64,
    pub align: String,
}

impl BitmapFont {
    pub fn new(font: AssetRef) -> Self {
        Self {
            font,
            size: 32.0,
            align: "left".into(),
        }
    }
}

/// Concrete node type and its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Ordered children; later children draw on top. A closed group is
    /// picked and selected as a unit.
    Group { children: Vec<NodeId>, closed: bool },
    Sprite {
        texture: AssetRef,
        sprite: SpriteData,
    },
    TileSprite {
        texture: AssetRef,
        sprite: SpriteData,
        tile: TileData,
    },
    Button {
        texture: AssetRef,
        sprite: SpriteData,
        button: ButtonData,
    },
    Text {
        text: String,
        style: TextStyle,
        sprite: SpriteData,
    },
    BitmapText {
        text: String,
        font: BitmapFont,
        sprite: SpriteData,
    },
    /// Placeholder for an asset-backed node whose asset did not resolve.
    ///
    /// `original` is the node's persisted JSON, written back verbatim apart
    /// from the id and the common properties.
    MissingAsset {
        type_name: String,
        asset: Option<AssetRef>,
        original: Map<String, Value>,
    },
}

/// A node of the scene tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    pub id: NodeId,
    /// Owning group. Non-owning back reference resolved through the document.
    pub parent: Option<NodeId>,
    pub editor: EditorInfo,
    pub name: Option<String>,
    pub transform: Transform,
    pub alpha: f64,
    pub renderable: bool,
    pub fixed_to_camera: bool,
    /// Groups authored locally instead of inherited from the prefab.
    pub overrides: PropertySet,
    /// Project-relative path of the prefab this node instantiates.
    pub prefab: Option<String>,
    pub kind: NodeKind,
}

/// Groups every instance owns unless told otherwise.
pub const DEFAULT_OVERRIDES: PropertySet = PropertySet::POSITION;

const COMMON_GROUPS: PropertySet = PropertySet::POSITION
    .union(PropertySet::ANGLE)
    .union(PropertySet::SCALE)
    .union(PropertySet::PIVOT)
    .union(PropertySet::ALPHA)
    .union(PropertySet::RENDERABLE)
    .union(PropertySet::FIXED_TO_CAMERA);

const SPRITE_GROUPS: PropertySet = PropertySet::ANCHOR
    .union(PropertySet::TINT)
    .union(PropertySet::DATA)
    .union(PropertySet::PHYSICS);

impl ModelNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            editor: EditorInfo::default(),
            name: None,
            transform: Transform::default(),
            alpha: 1.0,
            renderable: true,
            fixed_to_camera: false,
            overrides: DEFAULT_OVERRIDES,
            prefab: None,
            kind,
        }
    }

    pub fn group() -> Self {
        Self::new(NodeKind::Group {
            children: Vec::new(),
            closed: false,
        })
    }

    pub fn sprite(texture: AssetRef) -> Self {
        Self::new(NodeKind::Sprite {
            texture,
            sprite: SpriteData::default(),
        })
    }

    pub fn tile_sprite(texture: AssetRef, width: f64, height: f64) -> Self {
        Self::new(NodeKind::TileSprite {
            texture,
            sprite: SpriteData::default(),
            tile: TileData {
                width,
                height,
                ..Default::default()
            },
        })
    }

    pub fn button(texture: AssetRef) -> Self {
        Self::new(NodeKind::Button {
            texture,
            sprite: SpriteData::default(),
            button: ButtonData::default(),
        })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Text {
            text: text.into(),
            style: TextStyle::default(),
            sprite: SpriteData::default(),
        })
    }

    pub fn bitmap_text(font: AssetRef, text: impl Into<String>) -> Self {
        Self::new(NodeKind::BitmapText {
            text: text.into(),
            font: BitmapFont::new(font),
            sprite: SpriteData::default(),
        })
    }

    pub fn with_editor_name(mut self, name: impl Into<String>) -> Self {
        self.editor.name = name.into();
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.transform.x = x;
        self.transform.y = y;
        self
    }

    /// `type` discriminator of the persisted form.
    pub fn type_name(&self) -> &str {
        match &self.kind {
            NodeKind::Group { .. } => "group",
            NodeKind::Sprite { .. } => "sprite",
            NodeKind::TileSprite { .. } => "tileSprite",
            NodeKind::Button { .. } => "button",
            NodeKind::Text { .. } => "text",
            NodeKind::BitmapText { .. } => "bitmapText",
            NodeKind::MissingAsset { type_name, .. } => type_name,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group { .. })
    }

    pub fn is_missing_asset(&self) -> bool {
        matches!(self.kind, NodeKind::MissingAsset { .. })
    }

    pub fn is_closed_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group { closed: true, .. })
    }

    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Group { children, .. } => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match &mut self.kind {
            NodeKind::Group { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn sprite_data(&self) -> Option<&SpriteData> {
        match &self.kind {
            NodeKind::Sprite { sprite, .. }
            | NodeKind::TileSprite { sprite, .. }
            | NodeKind::Button { sprite, .. }
            | NodeKind::Text { sprite, .. }
            | NodeKind::BitmapText { sprite, .. } => Some(sprite),
            NodeKind::Group { .. } | NodeKind::MissingAsset { .. } => None,
        }
    }

    pub fn sprite_data_mut(&mut self) -> Option<&mut SpriteData> {
        match &mut self.kind {
            NodeKind::Sprite { sprite, .. }
            | NodeKind::TileSprite { sprite, .. }
            | NodeKind::Button { sprite, .. }
            | NodeKind::Text { sprite, .. }
            | NodeKind::BitmapText { sprite, .. } => Some(sprite),
            NodeKind::Group { .. } | NodeKind::MissingAsset { .. } => None,
        }
    }

    pub fn texture(&self) -> Option<&AssetRef> {
        match &self.kind {
            NodeKind::Sprite { texture, .. }
            | NodeKind::TileSprite { texture, .. }
            | NodeKind::Button { texture, .. } => Some(texture),
            _ => None,
        }
    }

    pub fn texture_mut(&mut self) -> Option<&mut AssetRef> {
        match &mut self.kind {
            NodeKind::Sprite { texture, .. }
            | NodeKind::TileSprite { texture, .. }
            | NodeKind::Button { texture, .. } => Some(texture),
            _ => None,
        }
    }

    /// The visual source: texture, bitmap font, or the unresolved reference
    /// of a missing-asset node.
    pub fn asset(&self) -> Option<&AssetRef> {
        match &self.kind {
            NodeKind::Sprite { texture, .. }
            | NodeKind::TileSprite { texture, .. }
            | NodeKind::Button { texture, .. } => Some(texture),
            NodeKind::BitmapText { font, .. } => Some(&font.font),
            NodeKind::MissingAsset { asset, .. } => asset.as_ref(),
            NodeKind::Group { .. } | NodeKind::Text { .. } => None,
        }
    }

    pub fn body(&self) -> Option<&BodyModel> {
        self.sprite_data().and_then(|s| s.body.as_ref())
    }

    /// Text content of text-bearing nodes.
    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text { text, .. } | NodeKind::BitmapText { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn local_matrix(&self) -> Mat3 {
        self.transform.matrix()
    }

    /// Property groups this node type carries.
    pub fn supported_groups(&self) -> PropertySet {
        match &self.kind {
            NodeKind::Group { .. } | NodeKind::MissingAsset { .. } => COMMON_GROUPS,
            NodeKind::Sprite { .. } | NodeKind::Button { .. } => {
                COMMON_GROUPS | SPRITE_GROUPS | PropertySet::TEXTURE
            }
            NodeKind::TileSprite { .. } => {
                COMMON_GROUPS | SPRITE_GROUPS | PropertySet::TEXTURE | PropertySet::TILE
            }
            NodeKind::Text { .. } | NodeKind::BitmapText { .. } => {
                COMMON_GROUPS | SPRITE_GROUPS | PropertySet::TEXT | PropertySet::FONT
            }
        }
    }

    /// Editable keys of this node, in display order.
    pub fn keys(&self) -> Vec<PropertyKey> {
        use PropertyKey::*;
        let mut keys = vec![
            EditorName,
            EditorPick,
            EditorGenerate,
            EditorPublic,
            EditorField,
            EditorShow,
            Name,
            X,
            Y,
            Angle,
            ScaleX,
            ScaleY,
            PivotX,
            PivotY,
            Alpha,
            Renderable,
            FixedToCamera,
        ];
        match &self.kind {
            NodeKind::Group { .. } => keys.push(Closed),
            NodeKind::MissingAsset { .. } => {}
            NodeKind::Sprite { .. } => keys.push(Texture),
            NodeKind::TileSprite { .. } => keys.extend([
                Texture,
                TileWidth,
                TileHeight,
                TilePositionX,
                TilePositionY,
                TileScaleX,
                TileScaleY,
            ]),
            NodeKind::Button { .. } => keys.extend([Texture, Callback, CallbackContext]),
            NodeKind::Text { .. } => keys.extend([Text, FontFamily, FontSize, Fill, Align]),
            NodeKind::BitmapText { .. } => keys.extend([Text, BitmapFont, FontSize, Align]),
        }
        if self.sprite_data().is_some() {
            keys.extend([AnchorX, AnchorY, Tint, Data, Body]);
        }
        keys
    }

    /// Reads a property from the locally stored values.
    pub fn get(&self, key: PropertyKey) -> Option<PropertyValue> {
        use PropertyKey as K;
        use PropertyValue as V;
        let t = &self.transform;
        let value = match key {
            K::EditorName => V::Text(self.editor.name.clone()),
            K::EditorPick => V::Bool(self.editor.pick),
            K::EditorGenerate => V::Bool(self.editor.generate),
            K::EditorPublic => V::Bool(self.editor.public),
            K::EditorField => V::Bool(self.editor.field),
            K::EditorShow => V::Bool(self.editor.show),
            K::Name => V::Text(self.name.clone().unwrap_or_default()),
            K::X => V::Number(t.x),
            K::Y => V::Number(t.y),
            K::Angle => V::Number(t.angle),
            K::ScaleX => V::Number(t.scale_x),
            K::ScaleY => V::Number(t.scale_y),
            K::PivotX => V::Number(t.pivot_x),
            K::PivotY => V::Number(t.pivot_y),
            K::Alpha => V::Number(self.alpha),
            K::Renderable => V::Bool(self.renderable),
            K::FixedToCamera => V::Bool(self.fixed_to_camera),
            K::Closed => match &self.kind {
                NodeKind::Group { closed, .. } => V::Bool(*closed),
                _ => return None,
            },
            K::AnchorX => V::Number(self.sprite_data()?.anchor_x),
            K::AnchorY => V::Number(self.sprite_data()?.anchor_y),
            K::Tint => V::Text(self.sprite_data()?.tint.clone().unwrap_or_default()),
            K::Data => V::Json(self.sprite_data()?.data.clone().unwrap_or(Value::Null)),
            K::Body => V::Body(self.sprite_data()?.body.clone()),
            K::Texture => match &self.kind {
                NodeKind::Sprite { texture, .. }
                | NodeKind::TileSprite { texture, .. }
                | NodeKind::Button { texture, .. } => V::Asset(Some(texture.clone())),
                _ => return None,
            },
            K::TileWidth
            | K::TileHeight
            | K::TilePositionX
            | K::TilePositionY
            | K::TileScaleX
            | K::TileScaleY => {
                let NodeKind::TileSprite { tile, .. } = &self.kind else {
                    return None;
                };
                V::Number(match key {
                    K::TileWidth => tile.width,
                    K::TileHeight => tile.height,
                    K::TilePositionX => tile.tile_position_x,
                    K::TilePositionY => tile.tile_position_y,
                    K::TileScaleX => tile.tile_scale_x,
                    _ => tile.tile_scale_y,
                })
            }
            K::Callback | K::CallbackContext => {
                let NodeKind::Button { button, .. } = &self.kind else {
                    return None;
                };
                V::Text(if key == K::Callback {
                    button.callback.clone()
                } else {
                    button.callback_context.clone()
                })
            }
            K::Text => V::Text(self.text_content()?.to_owned()),
            K::FontFamily | K::Fill => {
                let NodeKind::Text { style, .. } = &self.kind else {
                    return None;
                };
                V::Text(if key == K::FontFamily {
                    style.font.clone()
                } else {
                    style.fill.clone()
                })
            }
            K::FontSize => match &self.kind {
                NodeKind::Text { style, .. } => V::Number(style.font_size),
                NodeKind::BitmapText { font, .. } => V::Number(font.size),
                _ => return None,
            },
            K::Align => match &self.kind {
                NodeKind::Text { style, .. } => V::Text(style.align.clone()),
                NodeKind::BitmapText { font, .. } => V::Text(font.align.clone()),
                _ => return None,
            },
            K::BitmapFont => match &self.kind {
                NodeKind::BitmapText { font, .. } => V::Asset(Some(font.font.clone())),
                _ => return None,
            },
        };
        Some(value)
    }

    /// Writes a property into the locally stored values.
    ///
    /// Fails with [`SceneError::InvalidProperty`] when the key does not apply
    /// to this node type or the value has the wrong type. Override flags are
    /// not touched; that is the job of the calling operation.
    pub fn set(&mut self, key: PropertyKey, value: PropertyValue) -> SceneResult {
        use PropertyKey as K;
        use PropertyValue as V;

        let mismatch = |value: &PropertyValue| {
            SceneError::InvalidProperty(format!(
                "{key} does not accept a {} value",
                value.type_name()
            ))
        };
        let unsupported =
            SceneError::InvalidProperty(format!("{key} does not apply to a {}", self.type_name()));

        match (key, value) {
            (K::EditorName, V::Text(v)) => self.editor.name = v,
            (K::EditorPick, V::Bool(v)) => self.editor.pick = v,
            (K::EditorGenerate, V::Bool(v)) => self.editor.generate = v,
            (K::EditorPublic, V::Bool(v)) => {
                self.editor.public = v;
                if v {
                    self.editor.field = true;
                }
            }
            (K::EditorField, V::Bool(v)) => self.editor.field = v,
            (K::EditorShow, V::Bool(v)) => self.editor.show = v,
            (K::Name, V::Text(v)) => self.name = (!v.is_empty()).then_some(v),
            (K::X, V::Number(v)) => self.transform.x = v,
            (K::Y, V::Number(v)) => self.transform.y = v,
            (K::Angle, V::Number(v)) => self.transform.angle = v,
            (K::ScaleX, V::Number(v)) => self.transform.scale_x = v,
            (K::ScaleY, V::Number(v)) => self.transform.scale_y = v,
            (K::PivotX, V::Number(v)) => self.transform.pivot_x = v,
            (K::PivotY, V::Number(v)) => self.transform.pivot_y = v,
            (K::Alpha, V::Number(v)) => self.alpha = v,
            (K::Renderable, V::Bool(v)) => self.renderable = v,
            (K::FixedToCamera, V::Bool(v)) => self.fixed_to_camera = v,
            (K::Closed, V::Bool(v)) => match &mut self.kind {
                NodeKind::Group { closed, .. } => *closed = v,
                _ => return Err(unsupported),
            },
            (K::AnchorX | K::AnchorY | K::Tint | K::Data | K::Body, value) => {
                let Some(sprite) = self.sprite_data_mut() else {
                    return Err(unsupported);
                };
                match (key, value) {
                    (K::AnchorX, V::Number(v)) => sprite.anchor_x = v,
                    (K::AnchorY, V::Number(v)) => sprite.anchor_y = v,
                    (K::Tint, V::Text(v)) => sprite.tint = (!v.is_empty()).then_some(v),
                    (K::Data, V::Json(v)) => sprite.data = (!v.is_null()).then_some(v),
                    (K::Body, V::Body(v)) => sprite.body = v,
                    (_, other) => return Err(mismatch(&other)),
                }
            }
            (K::Texture, V::Asset(Some(asset))) => match &mut self.kind {
                NodeKind::Sprite { texture, .. }
                | NodeKind::TileSprite { texture, .. }
                | NodeKind::Button { texture, .. } => *texture = asset,
                _ => return Err(unsupported),
            },
            (
                key @ (K::TileWidth
                | K::TileHeight
                | K::TilePositionX
                | K::TilePositionY
                | K::TileScaleX
                | K::TileScaleY),
                V::Number(v),
            ) => {
                let NodeKind::TileSprite { tile, .. } = &mut self.kind else {
                    return Err(unsupported);
                };
                match key {
                    K::TileWidth => tile.width = v,
                    K::TileHeight => tile.height = v,
                    K::TilePositionX => tile.tile_position_x = v,
                    K::TilePositionY => tile.tile_position_y = v,
                    K::TileScaleX => tile.tile_scale_x = v,
                    _ => tile.tile_scale_y = v,
                }
            }
            (key @ (K::Callback | K::CallbackContext), V::Text(v)) => {
                let NodeKind::Button { button, .. } = &mut self.kind else {
                    return Err(unsupported);
                };
                if key == K::Callback {
                    button.callback = v;
                } else {
                    button.callback_context = v;
                }
            }
            (K::Text, V::Text(v)) => match &mut self.kind {
                NodeKind::Text { text, .. } | NodeKind::BitmapText { text, .. } => *text = v,
                _ => return Err(unsupported),
            },
            (key @ (K::FontFamily | K::Fill), V::Text(v)) => {
                let NodeKind::Text { style, .. } = &mut self.kind else {
                    return Err(unsupported);
                };
                if key == K::FontFamily {
                    style.font = v;
                } else {
                    style.fill = v;
                }
            }
            (K::FontSize, V::Number(v)) => match &mut self.kind {
                NodeKind::Text { style, .. } => style.font_size = v,
                NodeKind::BitmapText { font, .. } => font.size = v,
                _ => return Err(unsupported),
            },
            (K::Align, V::Text(v)) => match &mut self.kind {
                NodeKind::Text { style, .. } => style.align = v,
                NodeKind::BitmapText { font, .. } => font.align = v,
                _ => return Err(unsupported),
            },
            (K::BitmapFont, V::Asset(Some(asset))) => match &mut self.kind {
                NodeKind::BitmapText { font, .. } => font.font = asset,
                _ => return Err(unsupported),
            },
            (_, other) => return Err(mismatch(&other)),
        }
        Ok(())
    }

    /// Copies the values of `groups` from `src`.
    ///
    /// Groups that either node does not carry are skipped, so copying between
    /// different node types only moves what they share.
    pub fn copy_groups_from(&mut self, src: &ModelNode, groups: PropertySet) {
        let groups = groups & self.supported_groups() & src.supported_groups();
        if groups.contains(PropertySet::POSITION) {
            self.transform.x = src.transform.x;
            self.transform.y = src.transform.y;
        }
        if groups.contains(PropertySet::ANGLE) {
            self.transform.angle = src.transform.angle;
        }
        if groups.contains(PropertySet::SCALE) {
            self.transform.scale_x = src.transform.scale_x;
            self.transform.scale_y = src.transform.scale_y;
        }
        if groups.contains(PropertySet::PIVOT) {
            self.transform.pivot_x = src.transform.pivot_x;
            self.transform.pivot_y = src.transform.pivot_y;
        }
        if groups.contains(PropertySet::ALPHA) {
            self.alpha = src.alpha;
        }
        if groups.contains(PropertySet::RENDERABLE) {
            self.renderable = src.renderable;
        }
        if groups.contains(PropertySet::FIXED_TO_CAMERA) {
            self.fixed_to_camera = src.fixed_to_camera;
        }

        if let (Some(dst), Some(from)) = (self.sprite_data_mut(), src.sprite_data()) {
            if groups.contains(PropertySet::ANCHOR) {
                dst.anchor_x = from.anchor_x;
                dst.anchor_y = from.anchor_y;
            }
            if groups.contains(PropertySet::TINT) {
                dst.tint = from.tint.clone();
            }
            if groups.contains(PropertySet::DATA) {
                dst.data = from.data.clone();
            }
            if groups.contains(PropertySet::PHYSICS) {
                dst.body = from.body.clone();
            }
        }

        if groups.contains(PropertySet::TEXTURE) {
            if let (Some(dst), Some(from)) = (self.texture_mut(), src.texture()) {
                *dst = from.clone();
            }
            if let (NodeKind::Button { button, .. }, NodeKind::Button { button: from, .. }) =
                (&mut self.kind, &src.kind)
            {
                *button = from.clone();
            }
        }

        if let (NodeKind::TileSprite { tile, .. }, NodeKind::TileSprite { tile: from, .. }) =
            (&mut self.kind, &src.kind)
            && groups.contains(PropertySet::TILE)
        {
            *tile = *from;
        }

        if groups.contains(PropertySet::TEXT)
            && let Some(from) = src.text_content()
        {
            match &mut self.kind {
                NodeKind::Text { text, .. } | NodeKind::BitmapText { text, .. } => {
                    *text = from.to_owned()
                }
                _ => {}
            }
        }

        if groups.contains(PropertySet::FONT) {
            match (&mut self.kind, &src.kind) {
                (NodeKind::Text { style, .. }, NodeKind::Text { style: from, .. }) => {
                    *style = from.clone()
                }
                (NodeKind::BitmapText { font, .. }, NodeKind::BitmapText { font: from, .. }) => {
                    *font = from.clone()
                }
                (NodeKind::Text { style, .. }, NodeKind::BitmapText { font, .. }) => {
                    style.font_size = font.size;
                    style.align = font.align.clone();
                }
                (NodeKind::BitmapText { font, .. }, NodeKind::Text { style, .. }) => {
                    font.size = style.font_size;
                    font.align = style.align.clone();
                }
                _ => {}
            }
        }
    }

    /// Takes over the state a morph keeps: editor metadata, name, prefab
    /// bookkeeping and every shared property group except the texture.
    pub fn update_with(&mut self, src: &ModelNode) {
        self.editor = src.editor.clone();
        self.name = src.name.clone();
        self.overrides = src.overrides;
        self.prefab = src.prefab.clone();
        self.copy_groups_from(src, PropertySet::all() - PropertySet::TEXTURE);
    }
}
