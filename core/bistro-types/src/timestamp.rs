//! ISO-8601 timestamp helpers.
//!
//! Records carry their `created_at`/`updated_at` columns as the strings the
//! backend returned. Ordering by date parses them into instants here.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Parses an ISO-8601 timestamp into a UTC instant.
///
/// Accepts RFC 3339 (`2024-05-01T12:00:00Z`, `...+02:00`), the space
/// separated form Postgres emits (`2024-05-01 12:00:00.123+00`), and
/// offset-less timestamps, which are taken as UTC.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let normalized = s.replacen(' ', "T", 1);
    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }
    // Postgres short offsets: "+00" -> "+00:00"
    if let Some(idx) = normalized.rfind(['+', '-']).filter(|&i| i > 10) {
        let offset = &normalized[idx..];
        if offset.len() == 3 {
            let padded = format!("{normalized}:00");
            if let Ok(dt) = DateTime::parse_from_rfc3339(&padded) {
                return Some(dt.with_timezone(&Utc));
            }
        }
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Returns the current instant as an RFC 3339 string with millisecond precision.
#[must_use]
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
