use time::OffsetDateTime;

/// Current wall-clock time as Unix epoch milliseconds.
///
/// Unlock cooldowns persist this value so a restart can recompute the
/// remaining wait from elapsed real time.
pub(crate) fn now_unix_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

pub(crate) fn now_unix_seconds() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Render a second count as `HH:MM:SS` for countdown displays.
pub fn format_clock(total_seconds: u32) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
