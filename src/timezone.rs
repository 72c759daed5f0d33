//! Resolves a canonical timezone name to a UTC offset.
//!
//! The dashboard needs the user's local calendar date to decide which
//! transactions fall in "this month", so the server is configured with a
//! canonical timezone name (e.g. "Africa/Nairobi") rather than assuming
//! UTC.

use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

/// Get the current UTC offset for `canonical_timezone`, e.g. "Africa/Nairobi".
///
/// Returns [None] if the timezone name is not recognised.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}
