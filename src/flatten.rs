//! Flattening of nested raw records for column-based output

use serde_json::{Map, Value};

use crate::event::RawRecord;

/// Flatten a raw record into dot-notation columns.
///
/// Examples:
/// - `{"actor": {"upn": "a@x"}}` → `{"actor.upn": "a@x"}`
/// - `{"targets": ["a", "b"]}` → `{"targets.0": "a", "targets.1": "b"}`
///
/// Empty containers become a single empty-string column so that they still
/// show up in the header.
pub fn flatten_record(record: &RawRecord) -> Map<String, Value> {
    let mut result = Map::new();
    for (key, value) in record {
        flatten_into(value, key.clone(), &mut result);
    }
    result
}

fn flatten_into(value: &Value, prefix: String, result: &mut Map<String, Value>) {
    match value {
        Value::Object(obj) if !obj.is_empty() => {
            for (key, val) in obj {
                flatten_into(val, format!("{}.{}", prefix, key), result);
            }
        }
        Value::Array(arr) if !arr.is_empty() => {
            for (index, val) in arr.iter().enumerate() {
                flatten_into(val, format!("{}.{}", prefix, index), result);
            }
        }
        Value::Object(_) | Value::Array(_) => {
            result.insert(prefix, Value::String(String::new()));
        }
        _ => {
            result.insert(prefix, value.clone());
        }
    }
}

/// True when any top-level value is an object or array
pub fn has_nested_values(record: &RawRecord) -> bool {
    record
        .values()
        .any(|v| matches!(v, Value::Object(_) | Value::Array(_)))
}
