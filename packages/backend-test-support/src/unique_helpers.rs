//! Unique identifiers for test fixtures.
//!
//! Wizards and players are owned by external services, so tests mint opaque
//! ids the same way those services would.

use ulid::Ulid;

/// Generate a unique string in the format `{prefix}-{ulid}`.
///
/// ```
/// use backend_test_support::unique_helpers::unique_str;
///
/// let a = unique_str("wizard");
/// let b = unique_str("wizard");
/// assert_ne!(a, b);
/// assert!(a.starts_with("wizard-"));
/// ```
pub fn unique_str(prefix: &str) -> String {
    format!("{prefix}-{}", Ulid::new())
}

/// Generate `count` unique ids sharing a prefix.
pub fn unique_strs(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|_| unique_str(prefix)).collect()
}
