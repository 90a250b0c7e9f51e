//! ISO-8601 timestamps for record bounds.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};

use crate::error::{CoreError, Result};

/// Current UTC time as ISO-8601 with microseconds and a `+00:00` offset.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parse an ISO-8601 / RFC 3339 timestamp with an explicit offset.
pub fn parse_iso(value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).map_err(|e| CoreError::InvalidTimestamp {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Whole seconds from `start` to `end`, truncating any fraction.
///
/// An `end` earlier than `start` yields 0.
pub fn duration_between(start: &str, end: &str) -> Result<u64> {
    let start = parse_iso(start)?;
    let end = parse_iso(end)?;
    let elapsed = end.signed_duration_since(start).num_seconds();
    Ok(elapsed.max(0) as u64)
}

/// `end`, or `start` when `end` falls before it.
///
/// Wall clocks can step backwards between two readings; the later reading
/// must never precede the earlier one in a record.
pub fn clamp_end(start: &str, end: &str) -> Result<String> {
    if parse_iso(end)? < parse_iso(start)? {
        Ok(start.to_string())
    } else {
        Ok(end.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_exact_seconds() {
        let d = duration_between("2024-01-01T00:00:00+00:00", "2024-01-01T00:01:05+00:00");
        assert_eq!(d.unwrap(), 65);
    }

    #[test]
    fn test_duration_floors_fraction() {
        let d = duration_between(
            "2024-01-01T00:00:00.900000+00:00",
            "2024-01-01T00:00:02.100000+00:00",
        );
        assert_eq!(d.unwrap(), 1);
    }

    #[test]
    fn test_duration_across_offsets() {
        let d = duration_between("2024-01-01T01:00:00+01:00", "2024-01-01T00:00:30Z");
        assert_eq!(d.unwrap(), 30);
    }

    #[test]
    fn test_duration_never_negative() {
        let d = duration_between("2024-01-01T00:01:00+00:00", "2024-01-01T00:00:00+00:00");
        assert_eq!(d.unwrap(), 0);
    }

    #[test]
    fn test_clamp_end() {
        let start = "2024-01-01T00:01:00.500000+00:00";
        assert_eq!(clamp_end(start, "2024-01-01T00:00:59+00:00").unwrap(), start);
        assert_eq!(
            clamp_end(start, "2024-01-01T00:02:00+00:00").unwrap(),
            "2024-01-01T00:02:00+00:00"
        );
        assert_eq!(clamp_end(start, start).unwrap(), start);
        // Compared as instants, not as text.
        assert_eq!(
            clamp_end("2024-01-01T01:00:00+01:00", "2024-01-01T00:00:30Z").unwrap(),
            "2024-01-01T00:00:30Z"
        );
        assert!(clamp_end(start, "later").is_err());
    }

    #[test]
    fn test_invalid_timestamp() {
        assert!(duration_between("yesterday", "2024-01-01T00:00:00+00:00").is_err());
    }

    #[test]
    fn test_now_iso_parses_and_is_utc() {
        let now = now_iso();
        assert!(now.ends_with("+00:00"));
        parse_iso(&now).unwrap();
    }
}
