//! Name conversion helpers

use convert_case::{Case, Casing};

/// Convert a Rust identifier to snake_case
///
/// Identifiers without uppercase letters are returned unchanged, so field names that
/// already follow Rust conventions (including digits) are stable.
pub fn snake_case(name: &str) -> String {
    if name.chars().any(char::is_uppercase) {
        name.to_case(Case::Snake)
    } else {
        name.to_string()
    }
}
