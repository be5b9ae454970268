//! Item identifier helper

use uuid::Uuid;

/// Generate a random version-4 UUID string suitable for use as an item id
///
/// Convenience only; the loop accepts any string id the caller supplies.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
