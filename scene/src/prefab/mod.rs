//! Prefab templates and override resolution.

pub mod library;
pub mod resolver;

pub use library::{Prefab, PrefabLibrary, SharedPrefabLibrary};
pub use resolver::{OverrideResolver, PropertySource};
