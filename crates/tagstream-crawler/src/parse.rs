//! First-present-wins probing over loosely-shaped upstream JSON.
//!
//! The aggregation API's `data` payload varies between response versions of
//! the same endpoint, so adapters look up values through prioritized lists
//! of candidate paths instead of deserializing into fixed structs.

use serde_json::Value;

/// Walk `path` (object keys and array indices) from `root`.
pub(crate) fn value_at<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for segment in path {
        current = match current {
            Value::Object(map) => map.get(*segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// First non-empty string found at any of `paths`, else empty string.
pub(crate) fn pick_str(root: &Value, paths: &[&[&str]]) -> String {
    for path in paths {
        if let Some(s) = value_at(root, path).and_then(Value::as_str) {
            if !s.is_empty() {
                return s.to_string();
            }
        }
    }
    String::new()
}

/// First numeric value found at any of `paths`, else `None`.
///
/// Tolerates numbers serialized as strings (the upstream does this for
/// large view counts) and clamps negatives to zero.
pub(crate) fn pick_u64(root: &Value, paths: &[&[&str]]) -> Option<u64> {
    for path in paths {
        match value_at(root, path) {
            Some(Value::Number(n)) => {
                if let Some(v) = n.as_u64() {
                    return Some(v);
                }
                if n.as_i64().is_some() || n.as_f64().is_some() {
                    return Some(0);
                }
            }
            Some(Value::String(s)) => {
                if let Ok(v) = s.trim().parse::<u64>() {
                    return Some(v);
                }
            }
            _ => {}
        }
    }
    None
}

/// First boolean found at any of `paths`, else false.
pub(crate) fn pick_bool(root: &Value, paths: &[&[&str]]) -> bool {
    paths
        .iter()
        .find_map(|path| value_at(root, path).and_then(Value::as_bool))
        .unwrap_or(false)
}

/// First array found at any of `paths`, else an empty slice.
pub(crate) fn pick_array<'a>(root: &'a Value, paths: &[&[&str]]) -> &'a [Value] {
    for path in paths {
        if let Some(items) = value_at(root, path).and_then(Value::as_array) {
            return items;
        }
    }
    &[]
}

/// Id-ish value as a string: accepts JSON strings and numbers.
pub(crate) fn pick_id(root: &Value, paths: &[&[&str]]) -> String {
    for path in paths {
        match value_at(root, path) {
            Some(Value::String(s)) if !s.is_empty() => return s.clone(),
            Some(Value::Number(n)) => return n.to_string(),
            _ => {}
        }
    }
    String::new()
}
