//! Persisted JSON form of scene documents.
//!
//! Every node is an object with a `type` discriminator, an `id`, an optional
//! `prefab` path and an `info` object holding its properties. Properties at
//! their default value are omitted. Groups list their children in
//! `info.children`.
//!
//! ```json
//! { "type": "sprite", "id": "7b6c…", "info": { "x": 10.0, "texture": { "key": "ship" } } }
//! ```

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::asset::{AssetRef, AssetResolver};
use crate::error::{SceneError, SceneResult};
use crate::id::NodeId;
use crate::model::document::SceneDocument;
use crate::model::node::{
    BitmapFont, ButtonData, DEFAULT_OVERRIDES, EditorInfo, ModelNode, NodeKind, SpriteData,
    TextStyle, TileData, Transform,
};
use crate::model::property::PropertySet;

impl SceneDocument {
    /// Serializes the whole document.
    ///
    /// With `relative_to_project` set this is the saved form: nodes inside
    /// prefab instances only write the groups they override, the rest is
    /// resolved from the prefab on load. Without it every local value is
    /// written, which is what copies and operation snapshots need.
    pub fn to_json(&self, relative_to_project: bool) -> SceneResult<Value> {
        self.node_to_json(self.root(), relative_to_project)
    }

    /// Serializes `id` and its subtree.
    pub fn node_to_json(&self, id: NodeId, relative_to_project: bool) -> SceneResult<Value> {
        let node = self.node(id)?;
        let skip = if relative_to_project && self.instance_root(id).is_some() {
            PropertySet::all() - node.overrides
        } else {
            PropertySet::empty()
        };

        let mut obj = match &node.kind {
            NodeKind::MissingAsset { original, .. } => original.clone(),
            _ => Map::new(),
        };
        obj.insert("type".into(), Value::from(node.type_name()));
        obj.insert("id".into(), Value::from(node.id.to_string()));
        match &node.prefab {
            Some(path) => obj.insert("prefab".into(), Value::from(path.as_str())),
            None => obj.remove("prefab"),
        };

        let mut info = match obj.remove("info") {
            Some(Value::Object(info)) => info,
            _ => Map::new(),
        };
        let mut w = InfoWriter {
            info: &mut info,
            skip,
        };
        w.write_common(node);
        w.write_kind(node)?;
        if node.is_group() {
            let children = node
                .children()
                .iter()
                .map(|c| self.node_to_json(*c, relative_to_project))
                .collect::<SceneResult<Vec<_>>>()?;
            if !children.is_empty() {
                info.insert("children".into(), Value::Array(children));
            }
        }
        obj.insert("info".into(), Value::Object(info));
        Ok(Value::Object(obj))
    }

    pub fn to_json_string(&self, relative_to_project: bool) -> SceneResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_json(relative_to_project)?)?)
    }

    /// Loads a document whose root object must be a group.
    ///
    /// Asset-backed nodes whose asset `assets` cannot resolve load as
    /// missing-asset placeholders instead of failing the document.
    pub fn from_json(value: &Value, assets: &dyn AssetResolver) -> SceneResult<Self> {
        let nodes = nodes_from_json(value, assets)?;
        match nodes.first() {
            None => Err(SceneError::Json("empty document".into())),
            Some(root) if !root.is_group() => Err(SceneError::Json(format!(
                "document root must be a group, found '{}'",
                root.type_name()
            ))),
            Some(_) => Ok(SceneDocument::from_loaded(nodes)),
        }
    }

    pub fn from_json_str(text: &str, assets: &dyn AssetResolver) -> SceneResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value, assets)
    }
}

/// Parses a node and its subtree into a detached node list, root first.
///
/// The root's `parent` is `None`; descendants are linked to each other.
/// Fails with [`SceneError::DuplicateId`] when the JSON repeats an id.
pub fn nodes_from_json(value: &Value, assets: &dyn AssetResolver) -> SceneResult<Vec<ModelNode>> {
    let mut out = Vec::new();
    read_node(value, None, assets, &mut out)?;
    let mut seen = HashSet::new();
    if let Some(dup) = out.iter().find(|n| !seen.insert(n.id)) {
        return Err(SceneError::DuplicateId(dup.id));
    }
    Ok(out)
}

/// Replaces every node id in a serialized subtree with a fresh one.
///
/// Returns the new id of the subtree root.
pub fn regenerate_ids(value: &mut Value) -> Option<NodeId> {
    let obj = value.as_object_mut()?;
    let id = NodeId::new();
    obj.insert("id".into(), Value::from(id.to_string()));
    if let Some(Value::Array(children)) = obj
        .get_mut("info")
        .and_then(|info| info.get_mut("children"))
    {
        for child in children {
            regenerate_ids(child);
        }
    }
    Some(id)
}

/// Reads the `id` of a serialized node.
pub fn json_node_id(value: &Value) -> SceneResult<NodeId> {
    value
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| SceneError::Json("node has no id".into()))?
        .parse()
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

struct InfoWriter<'a> {
    info: &'a mut Map<String, Value>,
    /// Inherited groups left out of the saved form.
    skip: PropertySet,
}

impl InfoWriter<'_> {
    fn put(&mut self, group: PropertySet, key: &str, value: Option<Value>) {
        if self.skip.intersects(group) {
            self.info.remove(key);
            return;
        }
        match value {
            Some(value) => self.info.insert(key.into(), value),
            None => self.info.remove(key),
        };
    }

    fn num(&mut self, group: PropertySet, key: &str, value: f64, default: f64) {
        self.put(group, key, (value != default).then(|| Value::from(value)));
    }

    fn flag(&mut self, group: PropertySet, key: &str, value: bool, default: bool) {
        self.put(group, key, (value != default).then_some(Value::Bool(value)));
    }

    fn text(&mut self, group: PropertySet, key: &str, value: &str, default: &str) {
        self.put(group, key, (value != default).then(|| Value::from(value)));
    }

    fn opt_text(&mut self, group: PropertySet, key: &str, value: Option<&str>) {
        self.put(group, key, value.map(Value::from));
    }

    fn asset(&mut self, key: &str, asset: &AssetRef) -> SceneResult {
        self.put(PropertySet::empty(), key, Some(serde_json::to_value(asset)?));
        Ok(())
    }

    fn write_common(&mut self, node: &ModelNode) {
        let none = PropertySet::empty();
        let editor = &node.editor;
        let defaults = EditorInfo::default();
        self.text(none, "editorName", &editor.name, &defaults.name);
        self.flag(none, "editorPick", editor.pick, defaults.pick);
        self.flag(none, "editorGenerate", editor.generate, defaults.generate);
        self.flag(none, "editorPublic", editor.public, defaults.public);
        self.flag(none, "editorField", editor.field, defaults.field);
        self.flag(none, "editorShow", editor.show, defaults.show);
        let overrides = (node.overrides != DEFAULT_OVERRIDES)
            .then(|| Value::from(node.overrides.names().collect::<Vec<_>>()));
        self.put(none, "prefabOverride", overrides);
        self.opt_text(none, "name", node.name.as_deref());

        let t = &node.transform;
        let d = Transform::default();
        self.num(PropertySet::POSITION, "x", t.x, d.x);
        self.num(PropertySet::POSITION, "y", t.y, d.y);
        self.num(PropertySet::ANGLE, "rotation", t.angle, d.angle);
        self.num(PropertySet::SCALE, "scale.x", t.scale_x, d.scale_x);
        self.num(PropertySet::SCALE, "scale.y", t.scale_y, d.scale_y);
        self.num(PropertySet::PIVOT, "pivot.x", t.pivot_x, d.pivot_x);
        self.num(PropertySet::PIVOT, "pivot.y", t.pivot_y, d.pivot_y);
        self.num(PropertySet::ALPHA, "alpha", node.alpha, 1.0);
        self.flag(PropertySet::RENDERABLE, "renderable", node.renderable, true);
        self.flag(
            PropertySet::FIXED_TO_CAMERA,
            "fixedToCamera",
            node.fixed_to_camera,
            false,
        );
    }

    fn write_sprite(&mut self, sprite: &SpriteData) -> SceneResult {
        self.num(PropertySet::ANCHOR, "anchor.x", sprite.anchor_x, 0.0);
        self.num(PropertySet::ANCHOR, "anchor.y", sprite.anchor_y, 0.0);
        self.opt_text(PropertySet::TINT, "tint", sprite.tint.as_deref());
        self.put(PropertySet::DATA, "data", sprite.data.clone());
        let body = sprite.body.as_ref().map(serde_json::to_value).transpose()?;
        self.put(PropertySet::PHYSICS, "body", body);
        Ok(())
    }

    fn write_kind(&mut self, node: &ModelNode) -> SceneResult {
        match &node.kind {
            NodeKind::Group { closed, .. } => {
                self.flag(PropertySet::empty(), "closed", *closed, false);
            }
            NodeKind::Sprite { texture, sprite } => {
                self.asset("texture", texture)?;
                self.write_sprite(sprite)?;
            }
            NodeKind::TileSprite {
                texture,
                sprite,
                tile,
            } => {
                self.asset("texture", texture)?;
                self.write_sprite(sprite)?;
                let d = TileData::default();
                let g = PropertySet::TILE;
                self.num(g, "width", tile.width, d.width);
                self.num(g, "height", tile.height, d.height);
                self.num(g, "tilePosition.x", tile.tile_position_x, d.tile_position_x);
                self.num(g, "tilePosition.y", tile.tile_position_y, d.tile_position_y);
                self.num(g, "tileScale.x", tile.tile_scale_x, d.tile_scale_x);
                self.num(g, "tileScale.y", tile.tile_scale_y, d.tile_scale_y);
            }
            NodeKind::Button {
                texture,
                sprite,
                button,
            } => {
                self.asset("texture", texture)?;
                self.write_sprite(sprite)?;
                let g = PropertySet::TEXTURE;
                self.text(g, "callback", &button.callback, "");
                self.text(g, "callbackContext", &button.callback_context, "");
                self.opt_text(g, "overFrame", button.over_frame.as_deref());
                self.opt_text(g, "outFrame", button.out_frame.as_deref());
                self.opt_text(g, "downFrame", button.down_frame.as_deref());
                self.opt_text(g, "upFrame", button.up_frame.as_deref());
            }
            NodeKind::Text {
                text,
                style,
                sprite,
            } => {
                self.write_sprite(sprite)?;
                self.text(PropertySet::TEXT, "text", text, "");
                let d = TextStyle::default();
                let g = PropertySet::FONT;
                self.text(g, "style.font", &style.font, &d.font);
                self.num(g, "style.fontSize", style.font_size, d.font_size);
                self.text(g, "style.fill", &style.fill, &d.fill);
                self.text(g, "style.align", &style.align, &d.align);
            }
            NodeKind::BitmapText { text, font, sprite } => {
                self.asset("font", &font.font)?;
                self.write_sprite(sprite)?;
                self.text(PropertySet::TEXT, "text", text, "");
                let d = BitmapFont::new(font.font.clone());
                self.num(PropertySet::FONT, "size", font.size, d.size);
                self.text(PropertySet::FONT, "align", &font.align, &d.align);
            }
            NodeKind::MissingAsset { .. } => {}
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

fn num(info: &Map<String, Value>, key: &str, default: f64) -> f64 {
    info.get(key).and_then(Value::as_f64).unwrap_or(default)
}

fn flag(info: &Map<String, Value>, key: &str, default: bool) -> bool {
    info.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn text(info: &Map<String, Value>, key: &str) -> Option<String> {
    info.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn asset(info: &Map<String, Value>, key: &str) -> SceneResult<Option<AssetRef>> {
    info.get(key)
        .map(|v| serde_json::from_value(v.clone()))
        .transpose()
        .map_err(SceneError::from)
}

fn read_sprite(info: &Map<String, Value>) -> SceneResult<SpriteData> {
    Ok(SpriteData {
        anchor_x: num(info, "anchor.x", 0.0),
        anchor_y: num(info, "anchor.y", 0.0),
        tint: text(info, "tint"),
        data: info.get("data").filter(|v| !v.is_null()).cloned(),
        body: info
            .get("body")
            .filter(|v| !v.is_null())
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()?,
    })
}

fn read_node(
    value: &Value,
    parent: Option<NodeId>,
    assets: &dyn AssetResolver,
    out: &mut Vec<ModelNode>,
) -> SceneResult<NodeId> {
    let obj = value
        .as_object()
        .ok_or_else(|| SceneError::Json("node must be a JSON object".into()))?;
    let type_name = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| SceneError::Json("node has no type".into()))?;
    let id = match obj.get("id").and_then(Value::as_str) {
        Some(id) => id.parse()?,
        None => NodeId::new(),
    };
    let empty = Map::new();
    let info = match obj.get("info") {
        Some(Value::Object(info)) => info,
        None => &empty,
        Some(_) => return Err(SceneError::Json(format!("node {id}: info must be an object"))),
    };

    let resolved = |asset: Option<AssetRef>| -> Result<AssetRef, Option<AssetRef>> {
        match asset {
            Some(asset) if assets.resolve_asset_key(&asset).is_some() => Ok(asset),
            other => Err(other),
        }
    };
    let missing = |asset: Option<AssetRef>| {
        match &asset {
            Some(asset) => log::warn!(
                "{type_name} {id}: asset '{asset}' does not resolve, loading a placeholder"
            ),
            None => log::warn!("{type_name} {id}: no asset reference, loading a placeholder"),
        }
        NodeKind::MissingAsset {
            type_name: type_name.to_owned(),
            asset,
            original: obj.clone(),
        }
    };

    let kind = match type_name {
        "group" => NodeKind::Group {
            children: Vec::new(),
            closed: flag(info, "closed", false),
        },
        "sprite" => match resolved(asset(info, "texture")?) {
            Ok(texture) => NodeKind::Sprite {
                texture,
                sprite: read_sprite(info)?,
            },
            Err(asset) => missing(asset),
        },
        "tileSprite" => match resolved(asset(info, "texture")?) {
            Ok(texture) => {
                let d = TileData::default();
                NodeKind::TileSprite {
                    texture,
                    sprite: read_sprite(info)?,
                    tile: TileData {
                        width: num(info, "width", d.width),
                        height: num(info, "height", d.height),
                        tile_position_x: num(info, "tilePosition.x", d.tile_position_x),
                        tile_position_y: num(info, "tilePosition.y", d.tile_position_y),
                        tile_scale_x: num(info, "tileScale.x", d.tile_scale_x),
                        tile_scale_y: num(info, "tileScale.y", d.tile_scale_y),
                    },
                }
            }
            Err(asset) => missing(asset),
        },
        "button" => match resolved(asset(info, "texture")?) {
            Ok(texture) => NodeKind::Button {
                texture,
                sprite: read_sprite(info)?,
                button: ButtonData {
                    callback: text(info, "callback").unwrap_or_default(),
                    callback_context: text(info, "callbackContext").unwrap_or_default(),
                    over_frame: text(info, "overFrame"),
                    out_frame: text(info, "outFrame"),
                    down_frame: text(info, "downFrame"),
                    up_frame: text(info, "upFrame"),
                },
            },
            Err(asset) => missing(asset),
        },
        "text" => {
            let d = TextStyle::default();
            NodeKind::Text {
                text: text(info, "text").unwrap_or_default(),
                style: TextStyle {
                    font: text(info, "style.font").unwrap_or(d.font),
                    font_size: num(info, "style.fontSize", d.font_size),
                    fill: text(info, "style.fill").unwrap_or(d.fill),
                    align: text(info, "style.align").unwrap_or(d.align),
                },
                sprite: read_sprite(info)?,
            }
        }
        "bitmapText" => match resolved(asset(info, "font")?) {
            Ok(font) => {
                let d = BitmapFont::new(font);
                NodeKind::BitmapText {
                    text: text(info, "text").unwrap_or_default(),
                    font: BitmapFont {
                        size: num(info, "size", d.size),
                        align: text(info, "align").unwrap_or(d.align),
                        font: d.font,
                    },
                    sprite: read_sprite(info)?,
                }
            }
            Err(asset) => missing(asset),
        },
        other => {
            return Err(SceneError::Json(format!(
                "node {id}: unknown node type '{other}'"
            )));
        }
    };

    let editor_defaults = EditorInfo::default();
    let public = flag(info, "editorPublic", editor_defaults.public);
    let t = Transform::default();
    let overrides = match info.get("prefabOverride").and_then(Value::as_array) {
        Some(names) => PropertySet::from_names(names.iter().filter_map(Value::as_str)),
        None => DEFAULT_OVERRIDES,
    };
    let node = ModelNode {
        id,
        parent,
        editor: EditorInfo {
            name: text(info, "editorName").unwrap_or_default(),
            pick: flag(info, "editorPick", editor_defaults.pick),
            generate: flag(info, "editorGenerate", editor_defaults.generate),
            public,
            field: public || flag(info, "editorField", editor_defaults.field),
            show: flag(info, "editorShow", editor_defaults.show),
        },
        name: text(info, "name"),
        transform: Transform {
            x: num(info, "x", t.x),
            y: num(info, "y", t.y),
            angle: num(info, "rotation", t.angle),
            scale_x: num(info, "scale.x", t.scale_x),
            scale_y: num(info, "scale.y", t.scale_y),
            pivot_x: num(info, "pivot.x", t.pivot_x),
            pivot_y: num(info, "pivot.y", t.pivot_y),
        },
        alpha: num(info, "alpha", 1.0),
        renderable: flag(info, "renderable", true),
        fixed_to_camera: flag(info, "fixedToCamera", false),
        overrides,
        prefab: obj.get("prefab").and_then(Value::as_str).map(str::to_owned),
        kind,
    };

    let index = out.len();
    let is_group = node.is_group();
    out.push(node);
    if is_group && let Some(Value::Array(children)) = info.get("children") {
        let mut ids = Vec::with_capacity(children.len());
        for child in children {
            ids.push(read_node(child, Some(id), assets, out)?);
        }
        if let Some(list) = out[index].children_mut() {
            *list = ids;
        }
    }
    Ok(id)
}
