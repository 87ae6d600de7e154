//! Undo/redo operation history.
//!
//! [`OperationHistory`] owns a linear undo/redo stack of [`Operation`] trait
//! objects for one document. Executing a new operation after undoing clears
//! the redo stack.

use std::collections::VecDeque;
use std::fmt;

use super::operation::{Editable, Operation, OperationResult, OperationState};

/// Default maximum number of undo steps.
pub const DEFAULT_MAX_UNDO: usize = 100;

/// Persistence state of the document a history belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    /// Matches the last save (or was never modified).
    Clean,
    /// Has content changes not yet saved.
    Dirty,
}

struct HistoryEntry<T: Editable> {
    op: Box<dyn Operation<T>>,
    state: OperationState,
}

/// Manages the undo/redo stacks of one document.
///
/// The undo stack is bounded: when it exceeds `max_undo`, the oldest entry is
/// dropped from the front.
///
/// ```ignore
/// let mut history = OperationHistory::new(50);
/// history.execute(Box::new(op), &mut model)?;
/// history.undo(&mut model)?;
/// history.redo(&mut model)?;
/// ```
pub struct OperationHistory<T: Editable> {
    undo_stack: VecDeque<HistoryEntry<T>>,
    redo_stack: Vec<HistoryEntry<T>>,
    max_undo: usize,
    /// Distance from the saved state, counted in content-modifying entries.
    ///
    /// - `Some(0)`: the current state matches the last save.
    /// - `Some(n)`, `n > 0`: `n` undos lead back to the saved state.
    /// - `Some(n)`, `n < 0`: `|n|` redos lead back to the saved state.
    /// - `None`: the save point is unreachable (dropped by capacity or
    ///   discarded with the redo branch).
    save_distance: Option<i64>,
}

impl<T: Editable> OperationHistory<T> {
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_undo: max_undo.max(1),
            save_distance: Some(0),
        }
    }

    /// Applies `op` and, if it is [recorded](Operation::is_recorded), pushes
    /// it onto the undo stack and clears the redo stack.
    ///
    /// A failing operation is dropped and the history is left unchanged.
    pub fn execute(&mut self, mut op: Box<dyn Operation<T>>, target: &mut T) -> OperationResult {
        op.apply(target)?;
        log::debug!("executed '{}'", op.description());

        if !op.is_recorded() {
            return Ok(());
        }

        let is_content = op.modifies_content();

        // A save point sitting in the discarded redo branch becomes unreachable.
        if !self.redo_stack.is_empty()
            && let Some(d) = self.save_distance
            && d < 0
        {
            self.save_distance = None;
        }
        self.redo_stack.clear();

        if is_content && let Some(d) = &mut self.save_distance {
            *d += 1;
        }

        self.undo_stack.push_back(HistoryEntry {
            op,
            state: OperationState::Applied,
        });
        self.enforce_capacity();
        Ok(())
    }

    /// Undoes the most recent entry.
    ///
    /// Returns `Ok(false)` without touching anything when there is nothing to
    /// undo. If the undo itself fails, the entry stays on the undo stack.
    pub fn undo(&mut self, target: &mut T) -> OperationResult<bool> {
        let Some(mut entry) = self.undo_stack.pop_back() else {
            return Ok(false);
        };
        if let Err(err) = entry.op.undo(target) {
            self.undo_stack.push_back(entry);
            return Err(err);
        }
        log::debug!("undid '{}'", entry.op.description());
        if entry.op.modifies_content()
            && let Some(d) = &mut self.save_distance
        {
            *d -= 1;
        }
        entry.state = OperationState::Undone;
        self.redo_stack.push(entry);
        Ok(true)
    }

    /// Re-applies the most recently undone entry.
    ///
    /// Returns `Ok(false)` when the redo stack is empty.
    pub fn redo(&mut self, target: &mut T) -> OperationResult<bool> {
        let Some(mut entry) = self.redo_stack.pop() else {
            return Ok(false);
        };
        if let Err(err) = entry.op.apply(target) {
            self.redo_stack.push(entry);
            return Err(err);
        }
        log::debug!("redid '{}'", entry.op.description());
        if entry.op.modifies_content()
            && let Some(d) = &mut self.save_distance
        {
            *d += 1;
        }
        entry.state = OperationState::Reapplied;
        self.undo_stack.push_back(entry);
        self.enforce_capacity();
        Ok(true)
    }

    fn enforce_capacity(&mut self) {
        while self.undo_stack.len() > self.max_undo {
            self.undo_stack.pop_front();
            if let Some(d) = self.save_distance
                && d > self.undo_stack.len() as i64
            {
                self.save_distance = None;
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Undo entries as `(description, state)`, most recent first.
    pub fn undo_entries(&self) -> impl Iterator<Item = (&str, OperationState)> {
        self.undo_stack
            .iter()
            .rev()
            .map(|e| (e.op.description(), e.state))
    }

    /// Redo entries as `(description, state)`, next-to-redo first.
    pub fn redo_entries(&self) -> impl Iterator<Item = (&str, OperationState)> {
        self.redo_stack
            .iter()
            .rev()
            .map(|e| (e.op.description(), e.state))
    }

    /// Records of the undo stack, oldest first.
    ///
    /// Replaying these in order against the document as it was when the
    /// history started reproduces the current document.
    pub fn transcript(&self) -> Vec<T::Record> {
        self.undo_stack.iter().map(|e| e.op.record()).collect()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_undo(&self) -> usize {
        self.max_undo
    }

    /// Records the current state as saved.
    pub fn mark_saved(&mut self) {
        self.save_distance = Some(0);
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.save_distance != Some(0)
    }

    pub fn document_state(&self) -> DocumentState {
        if self.has_unsaved_changes() {
            DocumentState::Dirty
        } else {
            DocumentState::Clean
        }
    }

    /// Clears both stacks. The document stays clean only if it was clean.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        if self.save_distance != Some(0) {
            self.save_distance = None;
        }
    }
}

impl<T: Editable> fmt::Debug for OperationHistory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationHistory")
            .field("undo_count", &self.undo_stack.len())
            .field("redo_count", &self.redo_stack.len())
            .field("max_undo", &self.max_undo)
            .field("save_distance", &self.save_distance)
            .finish()
    }
}
