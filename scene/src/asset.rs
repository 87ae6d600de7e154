//! Asset references and the resolver contract.
//!
//! The scene never loads textures itself. Nodes carry an [`AssetRef`] and
//! ask an [`AssetResolver`] for the frame geometry; a reference that does not
//! resolve turns the node into a missing-asset placeholder at load time.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SceneResult;

/// Reference to a texture, atlas frame or bitmap font in the asset packs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
}

impl AssetRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            section: None,
            key: key.into(),
            frame: None,
        }
    }

    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.frame = Some(frame.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Lookup key used by [`AssetTable`]: `key` or `key/frame`.
    pub fn table_key(&self) -> String {
        match &self.frame {
            Some(frame) => format!("{}/{}", self.key, frame),
            None => self.key.clone(),
        }
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(section) = &self.section {
            write!(f, "{section}:")?;
        }
        write!(f, "{}", self.table_key())
    }
}

/// Geometry of a resolved frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameDescriptor {
    pub width: f64,
    pub height: f64,
}

impl FrameDescriptor {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Looks up assets referenced by nodes.
pub trait AssetResolver: Send + Sync {
    /// Returns the frame geometry, or `None` when the reference is dangling.
    fn resolve_asset_key(&self, asset: &AssetRef) -> Option<FrameDescriptor>;
}

/// In-memory asset manifest keyed by [`AssetRef::table_key`].
///
/// The manifest file is a JSON object mapping keys to frame sizes:
///
/// ```json
/// { "ship": { "width": 64, "height": 32 }, "atlas/coin": { "width": 16, "height": 16 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetTable {
    frames: HashMap<String, FrameDescriptor>,
}

impl AssetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `asset` with the given frame size.
    pub fn insert(&mut self, asset: &AssetRef, frame: FrameDescriptor) {
        self.frames.insert(asset.table_key(), frame);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, asset: &AssetRef, frame: FrameDescriptor) -> Self {
        self.insert(asset, frame);
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn load(path: &Path) -> SceneResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let table: Self = serde_json::from_str(&text)?;
        log::info!("loaded {} asset frames from {}", table.len(), path.display());
        Ok(table)
    }
}

impl AssetResolver for AssetTable {
    fn resolve_asset_key(&self, asset: &AssetRef) -> Option<FrameDescriptor> {
        self.frames.get(&asset.table_key()).copied()
    }
}

/// Resolver that accepts every reference with an empty frame.
///
/// Used when a project has no asset manifest, so documents load unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct UncheckedAssets;

impl AssetResolver for UncheckedAssets {
    fn resolve_asset_key(&self, _asset: &AssetRef) -> Option<FrameDescriptor> {
        Some(FrameDescriptor::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_resolves_frames() {
        let ship = AssetRef::new("ship");
        let coin = AssetRef::new("atlas").with_frame("coin");
        let table = AssetTable::new()
            .with(&ship, FrameDescriptor::new(64.0, 32.0))
            .with(&coin, FrameDescriptor::new(16.0, 16.0));

        assert_eq!(
            table.resolve_asset_key(&ship),
            Some(FrameDescriptor::new(64.0, 32.0))
        );
        assert_eq!(
            table.resolve_asset_key(&coin).map(|f| f.width),
            Some(16.0)
        );
        assert_eq!(table.resolve_asset_key(&AssetRef::new("atlas")), None);
    }

    #[test]
    fn manifest_format() {
        let table: AssetTable =
            serde_json::from_str(r#"{ "atlas/coin": { "width": 16, "height": 8 } }"#).unwrap();
        let coin = AssetRef::new("atlas").with_frame("coin");
        assert_eq!(
            table.resolve_asset_key(&coin),
            Some(FrameDescriptor::new(16.0, 8.0))
        );
    }

    #[test]
    fn display_includes_section() {
        let asset = AssetRef::new("atlas").with_frame("coin").with_section("level1");
        assert_eq!(asset.to_string(), "level1:atlas/coin");
    }
}
