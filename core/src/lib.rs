//! # Canvas Core
//!
//! Scene-agnostic building blocks for the Canvas editor: the reversible
//! operation framework and the 2D affine math used for transform
//! re-projection and hit-testing.

pub mod abstract_editor;
pub mod math;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
