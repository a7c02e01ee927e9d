//! Client-supplied timestamps.
//!
//! Browsers send RFC 3339 with an offset (`Date.toISOString()` gives
//! `2030-01-01T10:00:00.000Z`); other clients send naive ISO datetimes,
//! which are taken as UTC. Either way the value is normalised to naive UTC
//! at whole-second precision, the precision rows are stored at.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an offset or naive timestamp into naive UTC, truncated to seconds.
pub fn parse(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).naive_utc())
        .ok()
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        })?;
    Some(truncate(parsed))
}

/// Drop sub-second precision.
pub fn truncate(value: NaiveDateTime) -> NaiveDateTime {
    value.with_nanosecond(0).unwrap_or(value)
}

/// `deserialize_with` adapter for [`parse`].
pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "invalid timestamp {raw:?}, expected RFC 3339 or YYYY-MM-DDTHH:MM:SS"
        ))
    })
}
