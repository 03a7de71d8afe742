//! ISO-8601 helpers shared by the query builder and the normaliser.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;

fn utc_timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}(:\d{2}(\.\d+)?)?Z$")
            .expect("timestamp pattern is valid")
    })
}

/// Formats an instant as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn to_iso_string(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Reparses a UTC timestamp string and re-emits it in canonical form.
///
/// Returns `None` when `raw` is not a UTC timestamp or names an impossible
/// date; callers keep the input text in that case.
pub fn canonicalize_utc_timestamp(raw: &str) -> Option<String> {
    if !utc_timestamp_pattern().is_match(raw) {
        return None;
    }
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ").map(|ndt| ndt.and_utc()))
        .ok()?;
    Some(to_iso_string(parsed))
}
