//! Human-readable rendering of durations and fire instants.

use chrono::NaiveDateTime;

/// Format whole seconds as a single, floored unit: `45 seconds`, `5 minutes`,
/// `2 hours`, `3 days`, `1 week`.
pub fn format_duration(seconds: u64) -> String {
    let (value, unit) = match seconds {
        s if s < 60 => (s, "second"),
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 604_800 => (s / 86_400, "day"),
        s => (s / 604_800, "week"),
    };
    format!("{} {}{}", value, unit, if value == 1 { "" } else { "s" })
}

pub fn format_naive(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// Long form used in confirmations, e.g. `Monday, March 17 at 9:00 AM`.
pub fn format_occurrence(dt: NaiveDateTime) -> String {
    dt.format("%A, %B %-d at %-I:%M %p").to_string()
}
