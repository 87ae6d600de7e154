//! Concrete scene operations.
//!
//! - [`AddNodeOperation`] / [`DeleteNodeOperation`]: subtree insertion and removal
//! - [`SelectOperation`] / [`RemoveFromSelectionOperation`]: selection state
//! - [`SetPropertyOperation`], [`ChangeBodyOperation`], [`ClearOverrideOperation`]:
//!   property edits with prefab override bookkeeping
//! - [`ExpandOutlineOperation`]: outline hint
//! - [`compose`]: moves, z-order, duplicate, paste and prefab instantiation
//!   built from the primitives above
//! - [`OperationRecord`]: the plain-data form used by transcripts

pub mod compose;
mod property;
mod record;
mod selection;
mod structure;

pub use compose::{Built, ZOrder};
pub use property::{ChangeBodyOperation, ClearOverrideOperation, SetPropertyOperation};
pub use record::OperationRecord;
pub use selection::{ExpandOutlineOperation, RemoveFromSelectionOperation, SelectOperation};
pub use structure::{AddNodeOperation, DeleteNodeOperation};
