//! Row-to-entity parsing helpers.
//!
//! Every repo needs to convert `libsql::Row` (column-indexed) into typed entity
//! structs. These helpers isolate the parsing logic: timestamps, enum columns,
//! nullable text, and JSON-encoded document fields.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DatabaseError;

/// Format a timestamp for storage.
///
/// Fixed microsecond precision keeps stored values lexically ordered, so
/// `ORDER BY created_at` matches chronological order.
#[must_use]
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time, truncated to the stored precision.
#[must_use]
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    parse_datetime(&format_datetime(&now)).unwrap_or(now)
}

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-02-09T14:30:00.000000Z"`) and `SQLite`'s default
/// format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with every stash-core enum, whatever its `rename_all` casing, because
/// the stored text is exactly the serde name.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any enum variant.
pub fn parse_enum<T: DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
/// You must use `get::<Option<String>>()` for nullable columns.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Decode a JSON-encoded TEXT column into `T`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` naming the column if the JSON is invalid.
pub fn parse_json<T: DeserializeOwned>(s: &str, column: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(s)
        .map_err(|e| DatabaseError::Query(format!("Invalid JSON in column {column}: {e}")))
}

/// Decode an optional JSON-encoded TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string contains invalid JSON.
pub fn parse_optional_json<T: DeserializeOwned>(
    s: Option<&str>,
    column: &str,
) -> Result<Option<T>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_json(s, column)?)),
        _ => Ok(None),
    }
}

/// Encode a value for a JSON TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Other` if serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::Other(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_core::enums::{ActivityType, CaptureStatus, TimeEstimate};

    #[test]
    fn parses_both_datetime_formats() {
        let rfc = parse_datetime("2026-02-09T14:30:00.000000Z").unwrap();
        let sqlite = parse_datetime("2026-02-09 14:30:00").unwrap();
        assert_eq!(rfc, sqlite);
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn formatted_datetimes_sort_chronologically() {
        let earlier = parse_datetime("2026-02-09T14:30:00Z").unwrap();
        let later = earlier + chrono::Duration::microseconds(1500);
        assert!(format_datetime(&earlier) < format_datetime(&later));
        assert_eq!(format_datetime(&earlier), "2026-02-09T14:30:00.000000Z");
    }

    #[test]
    fn parses_kebab_and_spaced_enums() {
        let status: CaptureStatus = parse_enum("needs-review").unwrap();
        assert_eq!(status, CaptureStatus::NeedsReview);
        let kind: ActivityType = parse_enum("ai-processed").unwrap();
        assert_eq!(kind, ActivityType::AiProcessed);
        let time: TimeEstimate = parse_enum("60 min+").unwrap();
        assert_eq!(time, TimeEstimate::SixtyPlus);
        assert!(parse_enum::<CaptureStatus>("needs_review").is_err());
    }

    #[test]
    fn optional_json_treats_empty_as_none() {
        let none: Option<Vec<String>> = parse_optional_json(Some(""), "sections").unwrap();
        assert_eq!(none, None);
        let some: Option<Vec<String>> = parse_optional_json(Some("[\"a\"]"), "sections").unwrap();
        assert_eq!(some, Some(vec!["a".to_string()]));
        assert!(parse_optional_json::<Vec<String>>(Some("{"), "sections").is_err());
    }
}
