// ABOUTME: Serde helper for partial-update structs
// ABOUTME: Distinguishes an absent field from an explicit null

use serde::{Deserialize, Deserializer};

/// Deserializer for patch fields where `null` means "clear the value" and an
/// absent key means "leave it alone". Use together with `#[serde(default)]`:
///
/// ```ignore
/// #[serde(default, deserialize_with = "patch_field")]
/// pub assignee_id: Option<Option<i64>>,
/// ```
pub fn patch_field<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
