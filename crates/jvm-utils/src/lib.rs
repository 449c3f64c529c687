//! # jvm-utils
//!
//! Shared utilities for the jvm-rs workspace: synchronization primitives that
//! switch between `parking_lot` and a single-threaded fallback, and the small
//! index newtypes used throughout the class model.
pub mod newtypes;
pub mod sync;

pub use newtypes::{ConstIndex, LoaderId};

/// Converts a dotted binary name (`java.lang.String`) into the internal
/// slash-separated form (`java/lang/String`).
pub fn classname_to_pathname(name: &str) -> String {
    name.replace('.', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_conversions() {
        assert_eq!(classname_to_pathname("java.lang.String"), "java/lang/String");
        assert_eq!(
            classname_to_pathname("[Ljava.lang.Object;"),
            "[Ljava/lang/Object;"
        );
        assert_eq!(classname_to_pathname("Plain"), "Plain");
    }
}
