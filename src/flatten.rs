//! Flattening of nested trees into dot-addressed leaf tables

use crate::types::FlatTable;
use serde_json::{Map, Value};

/// Flatten a nested object into `path -> scalar` pairs.
///
/// Nested objects are descended into with their key appended to the path;
/// everything else (strings, numbers, booleans, null) is recorded as a leaf.
/// Arrays are not repeated elements here: they are walked like objects keyed
/// by index, so `tags.0`, `tags.1`. When two paths collapse to the same key
/// the later one wins.
pub fn flatten(tree: &Value) -> FlatTable {
    let mut out = Map::new();
    flatten_into(tree, "", &mut out);
    out
}

/// Flatten `tree` under `prefix`, writing into an existing table
pub fn flatten_into(tree: &Value, prefix: &str, out: &mut FlatTable) {
    match tree {
        Value::Object(obj) => {
            for (key, value) in obj {
                descend(value, &join(prefix, key), out);
            }
        }
        Value::Array(arr) => {
            for (idx, value) in arr.iter().enumerate() {
                descend(value, &join(prefix, &idx.to_string()), out);
            }
        }
        // A bare scalar has no key of its own unless we are already inside a path
        scalar => {
            if !prefix.is_empty() {
                out.insert(prefix.to_string(), scalar.clone());
            }
        }
    }
}

fn descend(value: &Value, path: &str, out: &mut FlatTable) {
    match value {
        Value::Object(_) | Value::Array(_) => flatten_into(value, path, out),
        scalar => {
            out.insert(path.to_string(), scalar.clone());
        }
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}
