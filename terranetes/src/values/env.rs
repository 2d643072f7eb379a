//! Values taken from environment variables.

use serde_json::{Map, Value};

/// Snapshot the process environment as a flat layer of strings.
///
/// Variables whose name or value is not valid UTF-8 are skipped.
#[must_use]
pub fn values_from_env() -> Map<String, Value> {
    values_from_vars(std::env::vars_os().filter_map(|(key, value)| {
        Some((key.into_string().ok()?, value.into_string().ok()?))
    }))
}

/// Build a flat layer of strings from `(name, value)` pairs.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
///
/// let layer = terranetes::values::values_from_vars([("HOME", "/root")]);
/// assert_eq!(layer.get("HOME"), Some(&json!("/root")));
/// ```
pub fn values_from_vars<I, K, V>(vars: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    vars.into_iter()
        .map(|(key, value)| (key.into(), Value::String(value.into())))
        .collect()
}
