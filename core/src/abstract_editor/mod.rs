//! Framework for reversible editing operations.
//!
//! Decoupled from the scene model so that the same history, composite and
//! queue types drive every editable document.
//!
//! - [`Editable`]: trait for types that operations mutate
//! - [`Operation`]: a reversible mutation (Command pattern)
//! - [`CompositeOperation`]: an ordered batch applied and undone atomically
//! - [`OperationHistory`]: undo/redo stack with save-point tracking
//! - [`OperationQueue`]: thread-safe queue for operations requested via `&self`
//!
//! # Recorded vs content-modifying operations
//!
//! Operations are recorded in the history by default. Override
//! [`Operation::is_recorded`] to return `false` for transient requests that
//! must not be undoable.
//!
//! Recorded operations may return `false` from [`Operation::modifies_content`]
//! when they only touch editor state such as the selection. They are still
//! undoable but do not move the save point, so
//! [`OperationHistory::has_unsaved_changes`] ignores them.

mod composite;
mod history;
mod operation;
mod operation_queue;

pub use composite::CompositeOperation;
pub use history::{DEFAULT_MAX_UNDO, DocumentState, OperationHistory};
pub use operation::{Editable, Operation, OperationError, OperationResult, OperationState};
pub use operation_queue::OperationQueue;
