//! Effective property values of prefab instances.
//!
//! A node inside a prefab instance (the instance root or any descendant)
//! inherits every property group it does not list in
//! [`overrides`](crate::model::ModelNode::overrides). Inherited groups are
//! read from the node at the same child-index path inside the prefab
//! template, which may itself be an instance of another prefab. Nodes
//! outside any instance own all their properties.

use crate::error::{SceneError, SceneResult};
use crate::id::NodeId;
use crate::model::{ModelNode, PropertyKey, PropertySet, PropertyValue, SceneDocument};
use crate::prefab::library::{Prefab, PrefabLibrary};

/// Where the effective value of a property group comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertySource {
    /// Stored on the node itself.
    Local,
    /// Inherited from the prefab at this path.
    Prefab(String),
}

/// Resolves prefab inheritance against a [`PrefabLibrary`].
#[derive(Debug, Clone, Copy)]
pub struct OverrideResolver<'a> {
    library: &'a PrefabLibrary,
}

impl<'a> OverrideResolver<'a> {
    pub fn new(library: &'a PrefabLibrary) -> Self {
        Self { library }
    }

    /// The node with all inherited groups replaced by their effective values.
    ///
    /// Broken chains (missing prefab, missing template node, cycles) fall
    /// back to the local values and are logged.
    pub fn resolve(&self, doc: &SceneDocument, id: NodeId) -> SceneResult<ModelNode> {
        let mut report = Vec::new();
        let node = self.resolve_reporting(doc, id, &mut report)?;
        for problem in report {
            log::warn!("resolving {id}: {problem}");
        }
        Ok(node)
    }

    /// Like [`resolve`](Self::resolve), collecting fallbacks into `report`
    /// instead of logging them.
    pub fn resolve_reporting(
        &self,
        doc: &SceneDocument,
        id: NodeId,
        report: &mut Vec<SceneError>,
    ) -> SceneResult<ModelNode> {
        let node = doc.node(id)?;
        let mut chain = Vec::new();
        Ok(self
            .resolve_in(doc, node, &mut chain, report)
            .unwrap_or_else(|| node.clone()))
    }

    /// Effective value of one property.
    pub fn property(
        &self,
        doc: &SceneDocument,
        id: NodeId,
        key: PropertyKey,
    ) -> SceneResult<Option<PropertyValue>> {
        Ok(self.resolve(doc, id)?.get(key))
    }

    /// Prefabs whose instances contain `id`, nearest first.
    pub fn prefabs_of(&self, doc: &SceneDocument, id: NodeId) -> Vec<&'a Prefab> {
        doc.instance_roots(id)
            .into_iter()
            .filter_map(|(root, _)| doc.get(root)?.prefab.as_deref())
            .filter_map(|path| self.library.get(path))
            .collect()
    }

    /// Whether `group` of `id` is inherited from a prefab or authored locally.
    pub fn source_of(&self, doc: &SceneDocument, id: NodeId, group: PropertySet) -> PropertySource {
        let Some(node) = doc.get(id) else {
            return PropertySource::Local;
        };
        if group.is_empty() || node.overrides.contains(group) {
            return PropertySource::Local;
        }
        match self.template_source(doc, id, &mut Vec::new()) {
            Some((prefab, _)) => PropertySource::Prefab(prefab.path().to_owned()),
            None => PropertySource::Local,
        }
    }

    /// Whether an enclosing prefab bars its instances from overriding
    /// `group`.
    pub fn is_read_only(&self, doc: &SceneDocument, id: NodeId, group: PropertySet) -> bool {
        !group.is_empty()
            && self
                .prefabs_of(doc, id)
                .iter()
                .any(|prefab| prefab.read_only().intersects(group))
    }

    /// Fails with [`SceneError::ReadOnlyOverride`] when `key` may not be set
    /// on `id`.
    pub fn check_writable(&self, doc: &SceneDocument, id: NodeId, key: PropertyKey) -> SceneResult {
        let group = key.group();
        if self.is_read_only(doc, id, group) {
            return Err(SceneError::ReadOnlyOverride {
                node: id,
                group: group.name().unwrap_or("?"),
            });
        }
        Ok(())
    }

    /// Template node `id` inherits from.
    ///
    /// Enclosing instances are tried outermost first, so overrides made
    /// inside a prefab apply to the instances of that prefab. An instance
    /// whose path has no counterpart in the outer template (a child added
    /// after instantiation) falls through to the next nearer instance.
    fn template_source(
        &self,
        doc: &SceneDocument,
        id: NodeId,
        report: &mut Vec<SceneError>,
    ) -> Option<(&'a Prefab, NodeId)> {
        for (root, path) in doc.instance_roots(id).iter().rev() {
            let Some(prefab_path) = doc.get(*root).and_then(|r| r.prefab.as_deref()) else {
                continue;
            };
            let Some(prefab) = self.library.get(prefab_path) else {
                report.push(SceneError::PrefabNotFound(prefab_path.to_owned()));
                continue;
            };
            if let Some(source) = prefab.document().node_at_path(prefab.template(), path) {
                return Some((prefab, source));
            }
        }
        None
    }

    /// `None` when the chain below `node` runs into a prefab cycle; every
    /// level then keeps its own local values.
    fn resolve_in(
        &self,
        doc: &SceneDocument,
        node: &ModelNode,
        chain: &mut Vec<String>,
        report: &mut Vec<SceneError>,
    ) -> Option<ModelNode> {
        let mut effective = node.clone();
        let inherited = node.supported_groups() - node.overrides;
        if inherited.is_empty() {
            return Some(effective);
        }
        let Some((prefab, source)) = self.template_source(doc, node.id, report) else {
            return Some(effective);
        };
        if chain.iter().any(|p| p == prefab.path()) {
            report.push(SceneError::PrefabCycle(prefab.path().to_owned()));
            return None;
        }
        let Some(source) = prefab.document().get(source) else {
            return Some(effective);
        };

        chain.push(prefab.path().to_owned());
        let source = self.resolve_in(prefab.document(), source, chain, report);
        chain.pop();

        effective.copy_groups_from(&source?, inherited);
        Some(effective)
    }
}
