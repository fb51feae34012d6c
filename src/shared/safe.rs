//! Type-directed field extraction from loosely typed JSON.
//!
//! Raw exchange payloads stay `serde_json::Value` and are read only through
//! these accessors. Every accessor returns `None` when the container is null,
//! the wrong type, or missing the key, and when the field cannot be coerced.
//! Callers supply defaults with `unwrap_or`.
//!
//! Empty strings count as absent, matching how exchanges use `""` for
//! "not set".

use rust_decimal::prelude::*;
use serde_json::{Map, Value};

use super::precise;

/// Something that can index into a JSON value: object keys and array indices.
pub trait Key: Copy {
    fn lookup<'a>(&self, container: &'a Value) -> Option<&'a Value>;
}

impl Key for &str {
    fn lookup<'a>(&self, container: &'a Value) -> Option<&'a Value> {
        container.as_object()?.get(*self)
    }
}

impl Key for usize {
    fn lookup<'a>(&self, container: &'a Value) -> Option<&'a Value> {
        container.as_array()?.get(*self)
    }
}

/// The raw field, if present and not null.
pub fn safe_value<'a, K: Key>(container: &'a Value, key: K) -> Option<&'a Value> {
    match key.lookup(container)? {
        Value::Null => None,
        value => Some(value),
    }
}

/// Render a scalar as a string; numbers keep their JSON text.
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn safe_string<K: Key>(container: &Value, key: K) -> Option<String> {
    value_to_string(safe_value(container, key)?)
}

pub fn safe_string_lower<K: Key>(container: &Value, key: K) -> Option<String> {
    safe_string(container, key).map(|s| s.to_lowercase())
}

pub fn safe_string_upper<K: Key>(container: &Value, key: K) -> Option<String> {
    safe_string(container, key).map(|s| s.to_uppercase())
}

/// Integer field; fractional values and numeric strings are truncated.
pub fn safe_integer<K: Key>(container: &Value, key: K) -> Option<i64> {
    value_to_integer(safe_value(container, key)?)
}

fn value_to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok()))
            .or_else(|| precise::parse(&n.to_string()).ok()?.trunc().to_i64()),
        Value::String(s) => precise::parse(s).ok()?.trunc().to_i64(),
        _ => None,
    }
}

/// Decimal field. Never goes through `f64`.
pub fn safe_number<K: Key>(container: &Value, key: K) -> Option<Decimal> {
    match safe_value(container, key)? {
        Value::Number(n) => precise::parse(&n.to_string()).ok(),
        Value::String(s) => precise::parse(s).ok(),
        _ => None,
    }
}

/// Boolean field. Accepts `true`/`false`, their string forms and `1`/`0`.
pub fn safe_bool<K: Key>(container: &Value, key: K) -> Option<bool> {
    match safe_value(container, key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn safe_list<K: Key>(container: &Value, key: K) -> Option<&Vec<Value>> {
    safe_value(container, key)?.as_array()
}

pub fn safe_dict<K: Key>(container: &Value, key: K) -> Option<&Map<String, Value>> {
    safe_value(container, key)?.as_object()
}

/// A numeric field holding Unix **seconds**, returned as milliseconds.
/// Fractional seconds are kept down to the millisecond.
pub fn safe_timestamp<K: Key>(container: &Value, key: K) -> Option<i64> {
    let seconds = safe_number(container, key)?;
    seconds.checked_mul(Decimal::from(1000))?.trunc().to_i64()
}

/// Integer field scaled by `factor` (e.g. microseconds to milliseconds).
pub fn safe_integer_product<K: Key>(container: &Value, key: K, factor: Decimal) -> Option<i64> {
    safe_number(container, key)?.checked_mul(factor)?.trunc().to_i64()
}

// ─── Alternate keys ──────────────────────────────────────────────────────────

macro_rules! alternates {
    ($two:ident, $three:ident, $base:ident -> $ret:ty) => {
        /// First present of two alternate keys.
        pub fn $two<K: Key>(container: &Value, first: K, second: K) -> Option<$ret> {
            $base(container, first).or_else(|| $base(container, second))
        }

        /// First present of three alternate keys.
        pub fn $three<K: Key>(container: &Value, first: K, second: K, third: K) -> Option<$ret> {
            $base(container, first)
                .or_else(|| $base(container, second))
                .or_else(|| $base(container, third))
        }
    };
}

alternates!(safe_string2, safe_string3, safe_string -> String);
alternates!(safe_string_lower2, safe_string_lower3, safe_string_lower -> String);
alternates!(safe_integer2, safe_integer3, safe_integer -> i64);
alternates!(safe_number2, safe_number3, safe_number -> Decimal);
alternates!(safe_bool2, safe_bool3, safe_bool -> bool);
alternates!(safe_timestamp2, safe_timestamp3, safe_timestamp -> i64);

pub fn safe_value2<'a, K: Key>(container: &'a Value, first: K, second: K) -> Option<&'a Value> {
    safe_value(container, first).or_else(|| safe_value(container, second))
}

pub fn safe_list2<'a, K: Key>(container: &'a Value, first: K, second: K) -> Option<&'a Vec<Value>> {
    safe_list(container, first).or_else(|| safe_list(container, second))
}

pub fn safe_dict2<'a, K: Key>(
    container: &'a Value,
    first: K,
    second: K,
) -> Option<&'a Map<String, Value>> {
    safe_dict(container, first).or_else(|| safe_dict(container, second))
}

/// The elements of a list payload, or of a map payload's values.
///
/// Some endpoints return `[{...}, {...}]`, others `{"BTC": {...}, ...}`.
pub fn to_array(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    }
}
