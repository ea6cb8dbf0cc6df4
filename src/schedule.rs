use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// Accepted `startTime` layouts, tried in order.
const START_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parse a stored `startTime` as wall-clock time in `tz`.
///
/// The string carries no offset of its own; the configured one is always
/// attached. Returns `None` when neither layout matches.
pub fn parse_start_time(raw: &str, tz: FixedOffset) -> Option<DateTime<FixedOffset>> {
    START_TIME_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(raw, fmt)
            .ok()
            .and_then(|naive| naive.and_local_timezone(tz).single())
    })
}

/// Due when the scheduled instant is at or before `now`.
pub fn is_due(scheduled: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> bool {
    scheduled <= now
}
