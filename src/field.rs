//! Key lookup over raw records.
//!
//! Export columns drift in case and spacing between tenants and tool
//! versions, so every lookup here is case-insensitive and ignores surrounding
//! whitespace. Dotted paths (`actor.userPrincipalName`) walk nested objects;
//! a flat key spelled with dots wins over the nested walk.

use serde_json::Value;

use crate::event::RawRecord;

/// Find a top-level key, ignoring case and surrounding whitespace.
pub fn get_key<'a>(record: &'a RawRecord, key: &str) -> Option<&'a Value> {
    if let Some(v) = record.get(key) {
        return Some(v);
    }
    record
        .iter()
        .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

/// Get a field by name, supporting dot notation for nested access.
pub fn get_path<'a>(record: &'a RawRecord, path: &str) -> Option<&'a Value> {
    if let Some(v) = get_key(record, path) {
        return Some(v);
    }

    if path.contains('.') {
        let parts: Vec<&str> = path.split('.').collect();
        let head = get_key(record, parts[0])?;
        return traverse(head, &parts[1..]);
    }

    None
}

fn traverse<'a>(current: &'a Value, parts: &[&str]) -> Option<&'a Value> {
    if parts.is_empty() {
        return Some(current);
    }

    match current {
        Value::Object(map) => {
            let next = map.get(parts[0]).or_else(|| {
                map.iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(parts[0]))
                    .map(|(_, v)| v)
            })?;
            traverse(next, &parts[1..])
        }
        Value::Array(arr) => arr.iter().find_map(|item| traverse(item, parts)),
        _ => None,
    }
}

/// Render a scalar as text. Empty strings, nulls and containers count as
/// absent.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First non-empty scalar found among `keys`, tried in order.
pub fn first_string(record: &RawRecord, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| get_path(record, k))
        .find_map(scalar_string)
}

/// First value among `keys` that is present and not blank.
pub fn first_value<'a>(record: &'a RawRecord, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| get_path(record, k))
        .find(|v| !is_blank(v))
}

/// Numeric view of a value; numeric strings are accepted.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

pub fn has_key(record: &RawRecord, key: &str) -> bool {
    get_key(record, key).is_some()
}
