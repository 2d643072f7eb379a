//! Recursive deep-merge of nested mappings.
//!
//! [`merge_value`] is destructive: it overlays a layer onto a target in
//! place. [`merged`] and [`merge_all`] build their result in a fresh
//! accumulator so callers never alias an argument by accident.

use serde_json::{Map, Value};

/// Overlay `layer` onto `target`, updating `target` in place.
///
/// Behaviour:
/// - Objects are merged recursively; keys only present in `layer` are
///   inserted and keys only present in `target` are left alone.
/// - When merging an object into a non-object target, the target is replaced
///   by an empty object first.
/// - Arrays and scalars replace `target` wholesale (no concatenation).
///
/// # Examples
///
/// ```rust
/// use terranetes::merge::merge_value;
/// use serde_json::json;
///
/// let mut acc = json!({"a": 1, "b": {"x": 1}});
/// merge_value(&mut acc, json!({"b": {"y": 2}, "c": 3}));
/// assert_eq!(acc, json!({"a": 1, "b": {"x": 1, "y": 2}, "c": 3}));
///
/// merge_value(&mut acc, json!({"b": [1, 2, 3]}));
/// assert_eq!(acc["b"], json!([1, 2, 3]));
/// ```
pub fn merge_value(target: &mut Value, layer: Value) {
    match layer {
        Value::Object(map) => merge_object(target, map),
        other => *target = other,
    }
}

fn merge_object(target: &mut Value, map: Map<String, Value>) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }

    if let Some(target_map) = target.as_object_mut() {
        merge_map(target_map, map);
    }
}

/// Overlay the entries of `layer` onto the mapping `target`.
///
/// Same rules as [`merge_value`], applied key by key.
pub fn merge_map(target: &mut Map<String, Value>, layer: Map<String, Value>) {
    for (key, value) in layer {
        match target.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

/// Returns `a` with `b` merged over it.
#[must_use]
pub fn merged(a: Value, b: Value) -> Value {
    let mut acc = a;
    merge_value(&mut acc, b);
    acc
}

/// Fold `values` left to right, each one overriding the accumulated result.
///
/// An empty input yields an empty object; `merge_all([a, b, c])` equals
/// `merged(merged(a, b), c)`.
///
/// # Examples
///
/// ```rust
/// use terranetes::merge::merge_all;
/// use serde_json::json;
///
/// let out = merge_all([json!({"a": 1}), json!({"b": {}}), json!({"b": {"c": true}})]);
/// assert_eq!(out, json!({"a": 1, "b": {"c": true}}));
/// ```
#[must_use]
pub fn merge_all<I>(values: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    let mut iter = values.into_iter();
    let Some(mut acc) = iter.next() else {
        return Value::Object(Map::new());
    };
    for value in iter {
        merge_value(&mut acc, value);
    }
    acc
}
