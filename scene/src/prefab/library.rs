//! Prefab documents and the per-project prefab cache.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::asset::AssetResolver;
use crate::error::{SceneError, SceneResult};
use crate::id::NodeId;
use crate::model::{DEFAULT_OVERRIDES, PropertySet, SceneDocument, regenerate_ids};

/// A reusable node template stored in its own file.
///
/// The file holds the template node and the property groups instances may
/// not override:
///
/// ```json
/// { "readOnly": ["texture"], "node": { "type": "sprite", "id": "…", "info": { … } } }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Prefab {
    path: String,
    read_only: PropertySet,
    document: SceneDocument,
    template: NodeId,
}

impl Prefab {
    /// Wraps a template node JSON.
    pub fn new(
        path: impl Into<String>,
        node: &Value,
        read_only: PropertySet,
        assets: &dyn AssetResolver,
    ) -> SceneResult<Self> {
        let mut document = SceneDocument::new();
        let root = document.root();
        let nodes = crate::model::nodes_from_json(node, assets)?;
        let template = document.insert_subtree(root, 0, nodes)?;
        Ok(Self {
            path: path.into(),
            read_only,
            document,
            template,
        })
    }

    pub fn from_json(
        path: impl Into<String>,
        value: &Value,
        assets: &dyn AssetResolver,
    ) -> SceneResult<Self> {
        let path = path.into();
        let node = value
            .get("node")
            .ok_or_else(|| SceneError::Json(format!("prefab '{path}' has no node")))?;
        let read_only = match value.get("readOnly") {
            Some(names) => serde_json::from_value(names.clone())?,
            None => PropertySet::empty(),
        };
        Self::new(path, node, read_only, assets)
    }

    /// Copies node `id` of `doc` into a new prefab.
    ///
    /// The copy is made through JSON once and gets fresh ids, so the prefab
    /// shares no state with the source document.
    pub fn from_node(
        path: impl Into<String>,
        doc: &SceneDocument,
        id: NodeId,
        read_only: PropertySet,
        assets: &dyn AssetResolver,
    ) -> SceneResult<Self> {
        let mut json = doc.node_to_json(id, false)?;
        regenerate_ids(&mut json);
        Self::new(path, &json, read_only, assets)
    }

    pub fn to_json(&self) -> SceneResult<Value> {
        let mut obj = Map::new();
        if !self.read_only.is_empty() {
            obj.insert("readOnly".into(), serde_json::to_value(self.read_only)?);
        }
        obj.insert(
            "node".into(),
            self.document.node_to_json(self.template, true)?,
        );
        Ok(Value::Object(obj))
    }

    /// Project-relative path, also the key instances refer to.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn read_only(&self) -> PropertySet {
        self.read_only
    }

    pub fn document(&self) -> &SceneDocument {
        &self.document
    }

    pub fn template(&self) -> NodeId {
        self.template
    }

    /// JSON for a new instance: the template with fresh ids, a `prefab`
    /// reference on its root, only `position` overridden on the root and
    /// nothing overridden below it.
    pub fn instance_json(&self) -> SceneResult<Value> {
        let mut json = self.document.node_to_json(self.template, false)?;
        regenerate_ids(&mut json);
        mark_inherited(&mut json, DEFAULT_OVERRIDES)?;
        if let Some(obj) = json.as_object_mut() {
            obj.insert("prefab".into(), Value::from(self.path.as_str()));
        }
        Ok(json)
    }
}

fn mark_inherited(node: &mut Value, overrides: PropertySet) -> SceneResult {
    let info = node
        .as_object_mut()
        .ok_or_else(|| SceneError::Json("node must be a JSON object".into()))?
        .entry("info")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(info) = info.as_object_mut() else {
        return Err(SceneError::Json("info must be an object".into()));
    };
    if overrides == DEFAULT_OVERRIDES {
        info.remove("prefabOverride");
    } else {
        info.insert("prefabOverride".into(), serde_json::to_value(overrides)?);
    }
    if let Some(Value::Array(children)) = info.get_mut("children") {
        for child in children {
            mark_inherited(child, PropertySet::empty())?;
        }
    }
    Ok(())
}

/// Prefab library shared between the documents of one project.
pub type SharedPrefabLibrary = Arc<RwLock<PrefabLibrary>>;

/// Cache of the prefabs of one project, keyed by project-relative path.
///
/// The cache is explicit state: callers invalidate entries when a prefab
/// file is saved or reloaded, and every change bumps
/// [`revision`](Self::revision) so dependents know to re-resolve.
#[derive(Debug)]
pub struct PrefabLibrary {
    project_root: PathBuf,
    prefab_dir: String,
    prefabs: BTreeMap<String, Prefab>,
    revision: u64,
}

impl PrefabLibrary {
    /// `prefab_dir` is relative to `project_root`.
    pub fn new(project_root: impl Into<PathBuf>, prefab_dir: impl Into<String>) -> Self {
        Self {
            project_root: project_root.into(),
            prefab_dir: prefab_dir.into().trim_matches('/').to_owned(),
            prefabs: BTreeMap::new(),
            revision: 0,
        }
    }

    /// Library without a backing directory, for documents built in memory.
    pub fn in_memory() -> Self {
        Self::new(PathBuf::new(), "prefabs")
    }

    pub fn shared(self) -> SharedPrefabLibrary {
        Arc::new(RwLock::new(self))
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn prefab_dir(&self) -> PathBuf {
        self.project_root.join(&self.prefab_dir)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, path: &str) -> Option<&Prefab> {
        self.prefabs.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.prefabs.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.prefabs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prefabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefabs.is_empty()
    }

    pub fn insert(&mut self, prefab: Prefab) {
        self.prefabs.insert(prefab.path.clone(), prefab);
        self.bump();
    }

    /// Drops a cached prefab. Returns whether it was cached.
    pub fn invalidate(&mut self, path: &str) -> bool {
        let removed = self.prefabs.remove(path).is_some();
        if removed {
            log::debug!("invalidated prefab '{path}'");
            self.bump();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.prefabs.clear();
        self.bump();
    }

    /// Reads one prefab from disk and caches it.
    pub fn load(&mut self, path: &str, assets: &dyn AssetResolver) -> SceneResult<&Prefab> {
        let file = self.project_root.join(path);
        let text = fs::read_to_string(&file).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                SceneError::PrefabNotFound(path.to_owned())
            } else {
                err.into()
            }
        })?;
        let value: Value = serde_json::from_str(&text)?;
        let prefab = Prefab::from_json(path, &value, assets)?;
        self.insert(prefab);
        self.prefabs
            .get(path)
            .ok_or_else(|| SceneError::PrefabNotFound(path.to_owned()))
    }

    /// Re-reads every `*.json` file of the prefab directory.
    ///
    /// Files that fail to parse are logged and skipped. Returns the number of
    /// prefabs loaded.
    pub fn refresh(&mut self, assets: &dyn AssetResolver) -> SceneResult<usize> {
        let dir = self.prefab_dir();
        self.prefabs.clear();
        if !dir.exists() {
            self.bump();
            return Ok(0);
        }
        let mut paths = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file = entry.path();
            if file.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            paths.push(self.relative_path(name));
        }
        paths.sort();
        let mut loaded = 0;
        for path in paths {
            match self.load(&path, assets) {
                Ok(_) => loaded += 1,
                Err(err) => log::warn!("skipping prefab '{path}': {err}"),
            }
        }
        self.bump();
        log::info!("loaded {loaded} prefabs from {}", dir.display());
        Ok(loaded)
    }

    /// Project-relative path a prefab called `name` is saved at.
    pub fn path_for(&self, name: &str) -> String {
        let mut file_name = name.trim().to_string();
        if file_name.is_empty() {
            file_name.push_str("prefab");
        }
        let sanitized: String = file_name
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.relative_path(&format!("{sanitized}.json"))
    }

    /// Creates a prefab called `name` from node `id` of `doc`, writes it to
    /// the prefab directory and caches it. Returns its path.
    pub fn create_from_node(
        &mut self,
        name: &str,
        doc: &SceneDocument,
        id: NodeId,
        read_only: PropertySet,
        assets: &dyn AssetResolver,
    ) -> SceneResult<String> {
        let path = self.path_for(name);
        let prefab = Prefab::from_node(path.clone(), doc, id, read_only, assets)?;
        self.save(&prefab)?;
        log::info!(
            "created prefab '{path}' from node {id} (template {})",
            prefab.template
        );
        self.insert(prefab);
        Ok(path)
    }

    /// Writes `prefab` to its file under the project root.
    pub fn save(&self, prefab: &Prefab) -> SceneResult {
        let file = self.project_root.join(&prefab.path);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file, serde_json::to_string_pretty(&prefab.to_json()?)?)?;
        Ok(())
    }

    fn relative_path(&self, file_name: &str) -> String {
        if self.prefab_dir.is_empty() {
            file_name.to_owned()
        } else {
            format!("{}/{file_name}", self.prefab_dir)
        }
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetRef, UncheckedAssets};
    use crate::model::{ModelNode, json_node_id};

    fn source_doc() -> (SceneDocument, NodeId) {
        let mut doc = SceneDocument::new();
        let root = doc.root();
        let group = doc.insert_subtree(root, 0, vec![ModelNode::group()]).unwrap();
        doc.insert_subtree(group, 0, vec![ModelNode::sprite(AssetRef::new("ship"))])
            .unwrap();
        (doc, group)
    }

    #[test]
    fn instance_json_has_fresh_ids_and_reference() {
        let (doc, group) = source_doc();
        let prefab = Prefab::from_node(
            "prefabs/squad.json",
            &doc,
            group,
            PropertySet::TEXTURE,
            &UncheckedAssets,
        )
        .unwrap();
        assert_ne!(prefab.template(), group);

        let json = prefab.instance_json().unwrap();
        assert_eq!(json["prefab"], "prefabs/squad.json");
        assert_ne!(json_node_id(&json).unwrap(), prefab.template());
        assert!(json["info"].get("prefabOverride").is_none());
        assert_eq!(
            json["info"]["children"][0]["info"]["prefabOverride"],
            serde_json::json!([])
        );
    }

    #[test]
    fn file_roundtrip() {
        let (doc, group) = source_doc();
        let prefab =
            Prefab::from_node("p.json", &doc, group, PropertySet::TEXTURE, &UncheckedAssets)
                .unwrap();
        let back = Prefab::from_json("p.json", &prefab.to_json().unwrap(), &UncheckedAssets)
            .unwrap();
        assert_eq!(back.read_only(), PropertySet::TEXTURE);
        assert_eq!(back.template(), prefab.template());
    }

    #[test]
    fn create_refresh_and_invalidate() {
        let dir = tempfile::tempdir().unwrap();
        let (doc, group) = source_doc();
        let mut library = PrefabLibrary::new(dir.path(), "prefabs");
        let path = library
            .create_from_node("Enemy Squad", &doc, group, PropertySet::empty(), &UncheckedAssets)
            .unwrap();
        assert_eq!(path, "prefabs/Enemy_Squad.json");
        assert!(dir.path().join(&path).exists());

        let before = library.revision();
        assert!(library.invalidate(&path));
        assert!(!library.contains(&path));
        assert!(library.revision() > before);

        assert_eq!(library.refresh(&UncheckedAssets).unwrap(), 1);
        assert!(library.get(&path).is_some());
    }

    #[test]
    fn load_missing_prefab() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = PrefabLibrary::new(dir.path(), "prefabs");
        let err = library.load("prefabs/none.json", &UncheckedAssets).unwrap_err();
        assert!(matches!(err, SceneError::PrefabNotFound(_)));
        assert_eq!(library.refresh(&UncheckedAssets).unwrap(), 0);
    }
}
