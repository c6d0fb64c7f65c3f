//! Lenient field extraction for the stats payload.
//!
//! Each `take_*` removes `key` from the object. When the value converts it is
//! returned; when it doesn't, it goes back into the map so it still reaches
//! `extra`. Nulls are dropped.

use serde_json::{Map, Value};

/// Integers as-is, finite floats rounded, anything else left in place.
pub fn take_int(map: &mut Map<String, Value>, key: &str) -> Option<i64> {
    let value = map.remove(key)?;
    let converted = match &value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        _ => None,
    };
    if converted.is_none() {
        put_back(map, key, value);
    }
    converted
}

pub fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::String(s) => Some(s),
        other => {
            put_back(map, key, other);
            None
        }
    }
}

/// Null or missing is `""`; numbers and booleans use their JSON text.
/// Arrays and objects stay in the map and the name is `""`.
pub fn take_name(map: &mut Map<String, Value>, key: &str) -> String {
    match map.remove(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        Some(other) => {
            put_back(map, key, other);
            String::new()
        }
    }
}

/// Template truthiness: null, false, 0, "" and [] are false.
pub fn take_flag(map: &mut Map<String, Value>, key: &str) -> bool {
    match map.remove(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(_)) => true,
    }
}

/// Arrays map element-wise through `item`; any other value stays in place.
pub fn take_list<T>(
    map: &mut Map<String, Value>,
    key: &str,
    item: impl Fn(Value) -> T,
) -> Option<Vec<T>> {
    match map.remove(key)? {
        Value::Array(values) => Some(values.into_iter().map(item).collect()),
        other => {
            put_back(map, key, other);
            None
        }
    }
}

fn put_back(map: &mut Map<String, Value>, key: &str, value: Value) {
    if !value.is_null() {
        map.insert(key.to_string(), value);
    }
}
