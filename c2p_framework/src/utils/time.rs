//! Timestamp helpers
//!
//! Generated timestamps are UTC with sub-second precision dropped.

use chrono::{DateTime, SubsecRound, TimeZone, Utc};

/// Current UTC time truncated to whole seconds
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Convert epoch seconds (integer or fractional) to UTC
pub fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let total_nanos = (seconds * 1e9).round() as i128;
    let whole = i64::try_from(total_nanos.div_euclid(1_000_000_000)).ok()?;
    let nanos = u32::try_from(total_nanos.rem_euclid(1_000_000_000)).ok()?;
    Utc.timestamp_opt(whole, nanos).single()
}

/// Parse an RFC 3339 timestamp such as `2024-01-01T00:00:00Z`
pub fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// ISO 8601 text with an explicit `+00:00` offset
pub fn to_iso(value: &DateTime<Utc>) -> String {
    value.to_rfc3339()
}
