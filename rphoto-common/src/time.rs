//! Timestamp utilities
//!
//! Vendors deliver capture times as `YYYY-MM-DD HH:MM:SS`, EXIF-style
//! `YYYY:MM:DD HH:MM:SS`, or unix epochs in seconds or milliseconds. All of
//! them are normalized to local-time strings in [`TIMESTAMP_FORMAT`]. Epoch
//! values carry no zone, so they are always rendered in the vendors' fixed
//! UTC+8 offset.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Canonical capture time format
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Canonical race date format
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fixed offset applied to every epoch-based vendor timestamp
pub const VENDOR_UTC_OFFSET_SECS: i32 = 8 * 3600;

/// Epoch values at or above this are milliseconds (year 5138 in seconds)
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

const TEXT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y:%m:%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y:%m:%d"];

/// Render a unix epoch (seconds or milliseconds) in the vendor offset.
///
/// Zero and negative values are treated as "not set".
pub fn epoch_to_timestamp(raw: i64) -> Option<String> {
    if raw <= 0 {
        return None;
    }
    let offset = FixedOffset::east_opt(VENDOR_UTC_OFFSET_SECS)?;
    let utc = if raw >= MILLIS_THRESHOLD {
        DateTime::<Utc>::from_timestamp_millis(raw)?
    } else {
        DateTime::<Utc>::from_timestamp(raw, 0)?
    };
    Some(utc.with_timezone(&offset).format(TIMESTAMP_FORMAT).to_string())
}

/// Parse a textual timestamp in any known vendor format.
///
/// All-digit strings are treated as epochs. Trailing fractions or zone
/// designators after the seconds field are ignored.
pub fn parse_text_timestamp(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.bytes().all(|b| b.is_ascii_digit()) {
        return text.parse::<i64>().ok().and_then(epoch_to_timestamp);
    }

    let head = text.get(..19).unwrap_or(text);
    TEXT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(head, fmt).ok())
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
}

/// Normalize a JSON timestamp value (string or number).
pub fn normalize_timestamp(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => parse_text_timestamp(s),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(epoch_to_timestamp),
        _ => None,
    }
}

/// Normalize a JSON date value to `YYYY-MM-DD`.
///
/// Accepts everything [`normalize_timestamp`] accepts plus bare dates.
pub fn normalize_date(value: &Value) -> Option<String> {
    if let Some(ts) = normalize_timestamp(value) {
        return date_of(&ts);
    }
    let text = value.as_str()?.trim();
    let head = text.get(..10).unwrap_or(text);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(head, fmt).ok())
        .map(|d| d.format(DATE_FORMAT).to_string())
}

/// True when `text` is already a canonical timestamp.
pub fn is_canonical_timestamp(text: &str) -> bool {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).is_ok()
}

/// Date part of a canonical timestamp
pub fn date_of(timestamp: &str) -> Option<String> {
    if !is_canonical_timestamp(timestamp) {
        return None;
    }
    timestamp.get(..10).map(str::to_string)
}
