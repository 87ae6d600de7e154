//! Property groups, keys and values.
//!
//! A [`PropertySet`] is the unit of prefab inheritance: an instance either
//! overrides a whole group (e.g. `scale` covers both axes) or inherits it.
//! [`PropertyKey`] names one editable field and maps to its group.

use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::asset::AssetRef;
use crate::model::body::BodyModel;

bitflags::bitflags! {
    /// Groups of properties whose prefab inheritance is toggled as a unit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct PropertySet: u32 {
        const POSITION = 1 << 0;
        const ANGLE = 1 << 1;
        const SCALE = 1 << 2;
        const PIVOT = 1 << 3;
        const ALPHA = 1 << 4;
        const RENDERABLE = 1 << 5;
        const FIXED_TO_CAMERA = 1 << 6;
        const TEXTURE = 1 << 7;
        const ANCHOR = 1 << 8;
        const TINT = 1 << 9;
        const DATA = 1 << 10;
        const PHYSICS = 1 << 11;
        const TEXT = 1 << 12;
        const FONT = 1 << 13;
        const TILE = 1 << 14;
    }
}

const GROUP_NAMES: [(PropertySet, &str); 15] = [
    (PropertySet::POSITION, "position"),
    (PropertySet::ANGLE, "angle"),
    (PropertySet::SCALE, "scale"),
    (PropertySet::PIVOT, "pivot"),
    (PropertySet::ALPHA, "alpha"),
    (PropertySet::RENDERABLE, "renderable"),
    (PropertySet::FIXED_TO_CAMERA, "fixedToCamera"),
    (PropertySet::TEXTURE, "texture"),
    (PropertySet::ANCHOR, "anchor"),
    (PropertySet::TINT, "tint"),
    (PropertySet::DATA, "data"),
    (PropertySet::PHYSICS, "physics"),
    (PropertySet::TEXT, "text"),
    (PropertySet::FONT, "font"),
    (PropertySet::TILE, "tile"),
];

impl PropertySet {
    /// Persisted name of a single group, `None` for combinations.
    pub fn name(self) -> Option<&'static str> {
        GROUP_NAMES
            .iter()
            .find(|(set, _)| *set == self)
            .map(|(_, name)| *name)
    }

    /// Group for a persisted name such as `fixedToCamera`.
    pub fn from_group_name(name: &str) -> Option<Self> {
        GROUP_NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(set, _)| *set)
    }

    /// Names of the contained groups, in declaration order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        GROUP_NAMES
            .iter()
            .filter(move |(set, _)| self.contains(*set))
            .map(|(_, name)| *name)
    }

    /// Parses a list of group names. Unknown names are logged and skipped.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut set = Self::empty();
        for name in names {
            match Self::from_group_name(name) {
                Some(group) => set |= group,
                None => log::warn!("ignoring unknown property group '{name}'"),
            }
        }
        set
    }
}

impl fmt::Display for PropertySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.names().collect();
        write!(f, "[{}]", names.join(", "))
    }
}

impl Serialize for PropertySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(None)?;
        for name in self.names() {
            seq.serialize_element(name)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for PropertySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SetVisitor;

        impl<'de> Visitor<'de> for SetVisitor {
            type Value = PropertySet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a list of property group names")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<PropertySet, A::Error> {
                let mut set = PropertySet::empty();
                while let Some(name) = seq.next_element::<String>()? {
                    set |= PropertySet::from_group_name(&name).ok_or_else(|| {
                        de::Error::custom(format!("unknown property group '{name}'"))
                    })?;
                }
                Ok(set)
            }
        }

        deserializer.deserialize_seq(SetVisitor)
    }
}

/// One editable property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKey {
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
    Texture,
    AnchorX,
    AnchorY,
    Tint,
    Data,
    Body,
    Text,
    FontFamily,
    FontSize,
    Fill,
    Align,
    BitmapFont,
    TileWidth,
    TileHeight,
    TilePositionX,
    TilePositionY,
    TileScaleX,
    TileScaleY,
    Callback,
    CallbackContext,
    Closed,
}

impl PropertyKey {
    /// The inheritance group this key belongs to.
    ///
    /// Editor metadata and structural flags are always local and return an
    /// empty set.
    pub fn group(self) -> PropertySet {
        use PropertyKey::*;
        match self {
            EditorName | EditorPick | EditorGenerate | EditorPublic | EditorField | EditorShow
            | Name | Closed => PropertySet::empty(),
            X | Y => PropertySet::POSITION,
            Angle => PropertySet::ANGLE,
            ScaleX | ScaleY => PropertySet::SCALE,
            PivotX | PivotY => PropertySet::PIVOT,
            Alpha => PropertySet::ALPHA,
            Renderable => PropertySet::RENDERABLE,
            FixedToCamera => PropertySet::FIXED_TO_CAMERA,
            Texture | Callback | CallbackContext => PropertySet::TEXTURE,
            AnchorX | AnchorY => PropertySet::ANCHOR,
            Tint => PropertySet::TINT,
            Data => PropertySet::DATA,
            Body => PropertySet::PHYSICS,
            Text => PropertySet::TEXT,
            FontFamily | FontSize | Fill | Align | BitmapFont => PropertySet::FONT,
            TileWidth | TileHeight | TilePositionX | TilePositionY | TileScaleX | TileScaleY => {
                PropertySet::TILE
            }
        }
    }

    pub fn label(self) -> &'static str {
        use PropertyKey::*;
        match self {
            EditorName => "Editor Name",
            EditorPick => "Pick",
            EditorGenerate => "Generate",
            EditorPublic => "Public",
            EditorField => "Field",
            EditorShow => "Show",
            Name => "Name",
            X => "X",
            Y => "Y",
            Angle => "Angle",
            ScaleX => "Scale X",
            ScaleY => "Scale Y",
            PivotX => "Pivot X",
            PivotY => "Pivot Y",
            Alpha => "Alpha",
            Renderable => "Renderable",
            FixedToCamera => "Fixed To Camera",
            Texture => "Texture",
            AnchorX => "Anchor X",
            AnchorY => "Anchor Y",
            Tint => "Tint",
            Data => "Data",
            Body => "Body",
            Text => "Text",
            FontFamily => "Font",
            FontSize => "Font Size",
            Fill => "Fill",
            Align => "Align",
            BitmapFont => "Bitmap Font",
            TileWidth => "Width",
            TileHeight => "Height",
            TilePositionX => "Tile Position X",
            TilePositionY => "Tile Position Y",
            TileScaleX => "Tile Scale X",
            TileScaleY => "Tile Scale Y",
            Callback => "Callback",
            CallbackContext => "Callback Context",
            Closed => "Closed",
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Dynamically typed property value.
///
/// Optional string fields (name, tint) use an empty [`Text`](Self::Text) for
/// "unset".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum PropertyValue {
    Number(f64),
    Bool(bool),
    Text(String),
    Asset(Option<AssetRef>),
    Body(Option<BodyModel>),
    Json(serde_json::Value),
}

impl PropertyValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
            Self::Asset(_) => "asset",
            Self::Body(_) => "body",
            Self::Json(_) => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_names_roundtrip() {
        for (set, name) in GROUP_NAMES {
            assert_eq!(set.name(), Some(name));
            assert_eq!(PropertySet::from_group_name(name), Some(set));
        }
        assert_eq!((PropertySet::POSITION | PropertySet::ANGLE).name(), None);
    }

    #[test]
    fn persisted_and_constant_names_differ() {
        assert_eq!(
            PropertySet::from_group_name("fixedToCamera"),
            Some(PropertySet::FIXED_TO_CAMERA)
        );
        assert_eq!(PropertySet::from_group_name("FIXED_TO_CAMERA"), None);
        assert_eq!(
            PropertySet::from_name("FIXED_TO_CAMERA"),
            Some(PropertySet::FIXED_TO_CAMERA)
        );
    }

    #[test]
    fn serializes_as_name_list() {
        let set = PropertySet::TEXTURE | PropertySet::POSITION;
        let json = serde_json::to_value(set).unwrap();
        assert_eq!(json, serde_json::json!(["position", "texture"]));
        let back: PropertySet = serde_json::from_value(json).unwrap();
        assert_eq!(back, set);
        assert!(serde_json::from_value::<PropertySet>(serde_json::json!(["bogus"])).is_err());
    }

    #[test]
    fn from_names_skips_unknown() {
        let set = PropertySet::from_names(["scale", "nope", "tint"]);
        assert_eq!(set, PropertySet::SCALE | PropertySet::TINT);
    }

    #[test]
    fn every_key_has_a_label() {
        assert_eq!(PropertyKey::ScaleY.group(), PropertySet::SCALE);
        assert_eq!(PropertyKey::EditorName.group(), PropertySet::empty());
        assert_eq!(PropertyKey::FixedToCamera.label(), "Fixed To Camera");
    }
}
