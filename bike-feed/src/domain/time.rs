//! Upstream timestamp parsing.

use chrono::NaiveDateTime;

/// Format of the fixed-width `mday` field, e.g. `20250101120000`.
pub const COMPACT_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Parse a fixed-width `YYYYMMDDHHMMSS` timestamp.
///
/// Returns `None` for anything that is not exactly fourteen ASCII digits
/// forming a valid calendar date and time. The feed publishes local time
/// without an offset, so the result is naive.
///
/// # Examples
///
/// ```
/// use bike_feed::domain::parse_compact_timestamp;
///
/// let t = parse_compact_timestamp("20250101120000").unwrap();
/// assert_eq!(t.to_string(), "2025-01-01 12:00:00");
///
/// assert!(parse_compact_timestamp("2025-01-01 12:00:00").is_none());
/// assert!(parse_compact_timestamp("20251301120000").is_none());
/// ```
pub fn parse_compact_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.len() != 14 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDateTime::parse_from_str(s, COMPACT_TIMESTAMP_FORMAT).ok()
}
