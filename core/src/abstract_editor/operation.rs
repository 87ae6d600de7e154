//! Editable targets and reversible operations.
//!
//! - [`Editable`]: trait for types that operations mutate
//! - [`Operation`]: a reversible mutation request (Command pattern)
//! - [`OperationError`] / [`OperationResult`]: error handling for operations
//! - [`OperationState`]: lifecycle of one recorded operation
//!
//! Operations are self-contained: each implementation stores the ids, values
//! and snapshots it needs to apply and to undo itself, and never holds
//! references into the target. That makes them replayable after the target
//! was reloaded and lets them be exported as plain records.

use std::fmt;

/// A type that operations can be applied to.
///
/// `Record` is the plain-data form of an operation on this target (ids,
/// snapshots, indices). It is what transcripts store and what a host
/// undo-history integration receives.
pub trait Editable: 'static {
    /// Plain-data description of one operation.
    type Record: Clone + fmt::Debug;

    /// Packs the records of a composite's children, in application order,
    /// into the composite's own record.
    fn batch_record(description: &str, children: Vec<Self::Record>) -> Self::Record;
}

/// Error type for operation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// The object the operation refers to does not exist.
    TargetNotFound(String),
    /// The target is in a state that forbids this operation.
    InvalidState(String),
    /// A custom error with a description.
    Custom(String),
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetNotFound(msg) => write!(f, "target not found: {msg}"),
            Self::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            Self::Custom(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for OperationError {}

/// Result type for operation methods.
pub type OperationResult<T = ()> = Result<T, OperationError>;

/// Lifecycle of an operation owned by an
/// [`OperationHistory`](super::OperationHistory).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    /// Built but not applied yet.
    Pending,
    /// Applied by `execute`.
    Applied,
    /// Reverted by `undo`; sits on the redo stack.
    Undone,
    /// Applied again by `redo`.
    Reapplied,
}

/// A reversible operation against a target `T`.
///
/// `apply` is the forward (execute / redo) direction and `undo` must restore
/// the target to exactly the state observed before the matching `apply`.
/// A failing `apply` or `undo` must leave the target untouched.
///
/// The trait is dyn-compatible so heterogeneous operations can share one
/// history as `Box<dyn Operation<T>>`.
pub trait Operation<T: Editable>: fmt::Debug + Send {
    /// Applies the operation to the target.
    fn apply(&mut self, target: &mut T) -> OperationResult;

    /// Reverses a previous [`apply`](Self::apply).
    fn undo(&mut self, target: &mut T) -> OperationResult;

    /// Short human-readable label, e.g. `"Delete node"`.
    fn description(&self) -> &str;

    /// Plain-data form of this operation.
    fn record(&self) -> T::Record;

    /// Whether the operation goes onto the undo stack.
    ///
    /// Default: `true`.
    fn is_recorded(&self) -> bool {
        true
    }

    /// Whether the operation changes the persisted document.
    ///
    /// Selection changes and view hints return `false`: they are undoable
    /// but do not make the document dirty.
    ///
    /// Default: `true`.
    fn modifies_content(&self) -> bool {
        true
    }
}
