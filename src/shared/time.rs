//! Timestamp parsing and the wall clock used for nonces.
//!
//! Every canonical timestamp is epoch milliseconds (`i64`).

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::prelude::*;
use serde_json::Value;

use super::safe;

/// Integers below this are Unix seconds, at or above it milliseconds.
/// `10^11` seconds is the year 5138; `10^11` ms is March 1973.
const SECONDS_CUTOFF: i64 = 100_000_000_000;

/// Parse an ISO-8601 / RFC 3339 date into epoch milliseconds.
///
/// Also accepts the zone-less `2022-09-23 14:30:41` form, read as UTC.
pub fn parse8601(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    None
}

/// Render epoch milliseconds as `2021-05-19T15:54:35.342Z`.
pub fn iso8601(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Interpret one raw field as a timestamp.
///
/// Non-numeric strings are parsed as ISO-8601. Numbers (or numeric strings)
/// below [`SECONDS_CUTOFF`] are seconds, the rest milliseconds.
pub fn timestamp_from_value(value: &Value) -> Option<i64> {
    let text = safe::value_to_string(value)?;
    let Ok(number) = super::precise::parse(&text) else {
        return parse8601(&text);
    };
    let millis = if number.abs() < Decimal::from(SECONDS_CUTOFF) {
        number.checked_mul(Decimal::from(1000))?
    } else {
        number
    };
    millis.trunc().to_i64()
}

/// Resolve a timestamp from candidate fields tried in the given order.
pub fn resolve_timestamp(raw: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter()
        .filter_map(|key| safe::safe_value(raw, *key))
        .find_map(timestamp_from_value)
}

// ─── Clock ───────────────────────────────────────────────────────────────────

/// Source of wall-clock milliseconds.
pub trait Clock: Send + Sync {
    fn milliseconds(&self) -> i64;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn milliseconds(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn milliseconds(&self) -> i64 {
        self.0
    }
}
