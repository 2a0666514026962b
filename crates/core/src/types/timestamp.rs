//! Lenient timestamp deserialization.
//!
//! The API emits `createdAt`/`updatedAt` either as RFC 3339 with an offset or
//! as a naive `2025-03-14T09:26:53.123` string that is implicitly UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Parse either accepted timestamp shape.
#[must_use]
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// `#[serde(deserialize_with = "...")]` helper for optional timestamps.
///
/// Missing, null and unparseable values all become `None`.
///
/// # Errors
///
/// Only fails when the value is not a string or null.
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse))
}

#[cfg(test)]
mod tests {
    use chrono::Datelike;

    use super::*;

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse("2025-03-14T09:26:53Z");
        assert_eq!(dt.map(|d| d.day()), Some(14));
    }

    #[test]
    fn test_parse_naive() {
        assert!(parse("2025-03-14T09:26:53.1234567").is_some());
        assert!(parse("2025-03-14T09:26:53").is_some());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse("yesterday").is_none());
    }
}
