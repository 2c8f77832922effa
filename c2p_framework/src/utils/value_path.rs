//! Dotted-path access over generic document trees
//!
//! Lookups return `None` on any miss instead of raising, so adapters can probe
//! tool output whose shape is not guaranteed.

use serde_json::{Map, Value};

/// Resolve `segments` against `value`, descending through objects only
pub fn get_path<'a, S: AsRef<str>>(value: &'a Value, segments: &[S]) -> Option<&'a Value> {
    let mut current = value;
    for segment in segments {
        current = current.as_object()?.get(segment.as_ref())?;
    }
    Some(current)
}

/// String at a path, if the value there is a string
pub fn get_str<'a, S: AsRef<str>>(value: &'a Value, segments: &[S]) -> Option<&'a str> {
    get_path(value, segments).and_then(Value::as_str)
}

/// Set the value at `segments`, creating intermediate objects as needed
///
/// Existing sibling keys are preserved. A non-object met on the way is
/// replaced by an object.
pub fn set_path<S: AsRef<str>>(root: &mut Value, segments: &[S], new_value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        *root = new_value;
        return;
    };

    let mut current = root;
    for segment in parents {
        let Some(map) = ensure_object(current) else {
            return;
        };
        current = map
            .entry(segment.as_ref().to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if let Some(map) = ensure_object(current) {
        map.insert(last.as_ref().to_string(), new_value);
    }
}

fn ensure_object(value: &mut Value) -> Option<&mut Map<String, Value>> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    value.as_object_mut()
}

/// Drop `null` members of objects and `null` items of arrays, recursively
pub fn remove_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, remove_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(remove_nulls)
                .collect(),
        ),
        other => other,
    }
}
