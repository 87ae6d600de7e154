//! Property grid binding.
//!
//! A [`PropertyGrid`] is a snapshot of the effective properties of one node,
//! laid out in sections, with the override state of every row. Edits do not
//! touch the model directly: they come back as operations for the editor's
//! history (or its operation queue).

use crate::error::{SceneError, SceneResult};
use crate::id::NodeId;
use crate::model::{PropertyKey, PropertyValue};
use crate::ops::{ClearOverrideOperation, SetPropertyOperation};
use crate::prefab::PropertySource;
use crate::state::SceneModel;

/// One row of the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridProperty {
    pub key: PropertyKey,
    pub label: &'static str,
    /// Effective value after prefab resolution.
    pub value: PropertyValue,
    /// Where the value comes from.
    pub source: PropertySource,
    /// The node overrides this row's group of a prefab it belongs to.
    pub modified: bool,
    pub read_only: bool,
}

impl GridProperty {
    /// Whether the value is inherited from a prefab.
    pub fn inherited(&self) -> bool {
        matches!(self.source, PropertySource::Prefab(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridSection {
    pub title: &'static str,
    pub properties: Vec<GridProperty>,
}

/// Sections of one node's properties.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyGrid {
    node: NodeId,
    type_name: String,
    in_instance: bool,
    sections: Vec<GridSection>,
}

fn section_of(key: PropertyKey) -> &'static str {
    use PropertyKey::*;
    match key {
        EditorName | EditorPick | EditorGenerate | EditorPublic | EditorField | EditorShow => {
            "Editor"
        }
        Name | X | Y | Angle | ScaleX | ScaleY | PivotX | PivotY | Alpha | Renderable
        | FixedToCamera | Closed => "Object",
        Texture | AnchorX | AnchorY | Tint | Data => "Sprite",
        Body => "Physics",
        Text | FontFamily | FontSize | Fill | Align | BitmapFont => "Text",
        TileWidth | TileHeight | TilePositionX | TilePositionY | TileScaleX | TileScaleY => "Tile",
        Callback | CallbackContext => "Button",
    }
}

impl PropertyGrid {
    /// Binds the grid to `id`.
    pub fn build(model: &SceneModel, id: NodeId) -> SceneResult<Self> {
        let resolved = model.resolved(id)?;
        let local = model.document().node(id)?;
        let in_instance = model.document().instance_root(id).is_some();

        let mut sections: Vec<GridSection> = Vec::new();
        model.with_resolver(|resolver, doc| {
            for key in resolved.keys() {
                let Some(value) = resolved.get(key) else {
                    continue;
                };
                let group = key.group();
                let source = if group.is_empty() {
                    PropertySource::Local
                } else {
                    resolver.source_of(doc, id, group)
                };
                let row = GridProperty {
                    key,
                    label: key.label(),
                    value,
                    source,
                    modified: in_instance && !group.is_empty() && local.overrides.contains(group),
                    read_only: resolver.is_read_only(doc, id, group),
                };
                let title = section_of(key);
                match sections.iter_mut().find(|s| s.title == title) {
                    Some(section) => section.properties.push(row),
                    None => sections.push(GridSection {
                        title,
                        properties: vec![row],
                    }),
                }
            }
        });

        Ok(Self {
            node: id,
            type_name: resolved.type_name().to_owned(),
            in_instance,
            sections,
        })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn sections(&self) -> &[GridSection] {
        &self.sections
    }

    pub fn properties(&self) -> impl Iterator<Item = &GridProperty> {
        self.sections.iter().flat_map(|s| s.properties.iter())
    }

    pub fn property(&self, key: PropertyKey) -> Option<&GridProperty> {
        self.properties().find(|p| p.key == key)
    }

    /// Operation writing `value` into `key`.
    ///
    /// Rows the node does not have and read-only rows are refused here, so
    /// nothing is queued that would be rejected anyway.
    pub fn edit(&self, key: PropertyKey, value: PropertyValue) -> SceneResult<SetPropertyOperation> {
        let row = self.property(key).ok_or_else(|| {
            SceneError::InvalidProperty(format!("{key} does not apply to a {}", self.type_name))
        })?;
        if row.read_only {
            return Err(SceneError::ReadOnlyOverride {
                node: self.node,
                group: key.group().name().unwrap_or("?"),
            });
        }
        Ok(SetPropertyOperation::new(self.node, key, value))
    }

    /// Operation reverting `key` to its prefab value, if the row is
    /// overridden.
    pub fn reset(&self, key: PropertyKey) -> Option<ClearOverrideOperation> {
        let row = self.property(key)?;
        (self.in_instance && row.modified)
            .then(|| ClearOverrideOperation::new(self.node, key.group()))
    }
}
