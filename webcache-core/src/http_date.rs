//! HTTP-date formatting for `Last-Modified` style header values.

use chrono::{DateTime, Utc};

use crate::constants::HTTP_DATE_FORMAT;

/// Timestamp reported for a cache that has never committed.
pub const UNIX_EPOCH: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// Formats a UTC timestamp as an IMF-fixdate, e.g. `Mon, 02 Jan 2006 15:04:05 GMT`.
///
/// Sub-second precision is truncated.
pub fn format(at: DateTime<Utc>) -> String {
    at.format(HTTP_DATE_FORMAT).to_string()
}
