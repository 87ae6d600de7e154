//! Ordered selection state and the host contract.

use crate::id::NodeId;

/// Ordered set of selected node ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<NodeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Replaces the selection, dropping duplicates but keeping first-seen
    /// order. Returns the previous selection.
    pub fn set(&mut self, ids: impl IntoIterator<Item = NodeId>) -> Vec<NodeId> {
        let mut next = Vec::new();
        for id in ids {
            if !next.contains(&id) {
                next.push(id);
            }
        }
        std::mem::replace(&mut self.ids, next)
    }

    /// Removes `id`, returning its former position.
    pub fn remove(&mut self, id: NodeId) -> Option<usize> {
        let index = self.ids.iter().position(|s| *s == id)?;
        self.ids.remove(index);
        Some(index)
    }

    /// Removes every id matching `f`, returning `(position, id)` pairs in
    /// ascending position order so they can be reinserted.
    pub fn remove_where(&mut self, mut f: impl FnMut(NodeId) -> bool) -> Vec<(usize, NodeId)> {
        let removed: Vec<_> = self
            .ids
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, id)| f(*id))
            .collect();
        self.ids.retain(|id| !f(*id));
        removed
    }

    /// Reinserts entries returned by [`remove_where`](Self::remove_where).
    pub fn restore(&mut self, entries: &[(usize, NodeId)]) {
        for (index, id) in entries {
            if !self.ids.contains(id) {
                let index = (*index).min(self.ids.len());
                self.ids.insert(index, *id);
            }
        }
    }

    pub fn clear(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.ids)
    }
}

/// The UI side of the selection.
///
/// The editor pushes every selection change into the host and reads it back
/// when the user picks nodes through the host's own widgets.
pub trait SelectionHost {
    fn set_selection(&mut self, ids: &[NodeId]);
    fn get_selection(&self) -> Vec<NodeId>;
}

/// Host that just stores what it is told, for headless sessions and tests.
#[derive(Debug, Clone, Default)]
pub struct SelectionMirror {
    ids: Vec<NodeId>,
    updates: usize,
}

impl SelectionMirror {
    /// How many selection notifications were delivered.
    pub fn updates(&self) -> usize {
        self.updates
    }
}

impl SelectionHost for SelectionMirror {
    fn set_selection(&mut self, ids: &[NodeId]) {
        self.ids = ids.to_vec();
        self.updates += 1;
    }

    fn get_selection(&self) -> Vec<NodeId> {
        self.ids.clone()
    }
}
