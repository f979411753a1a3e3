//! Time utilities for soul-identity.
//!
//! Every timestamp that appears in a signed record is an ISO-8601 UTC string
//! with millisecond precision and a `Z` suffix, e.g. `2026-10-16T09:30:00.000Z`.

use chrono::{DateTime, SecondsFormat, Utc};

/// Return the current time as an ISO-8601 UTC string.
pub fn now_iso8601() -> String {
    to_iso8601(&Utc::now())
}

/// Render a timestamp in the wire format.
pub fn to_iso8601(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
