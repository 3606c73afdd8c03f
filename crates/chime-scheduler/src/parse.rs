//! Parsers for the three kinds of user-supplied time text: relative
//! durations (`5m`), times of day (`9:30 AM`) and schedule patterns
//! (`weekdays`, `every friday`).
//!
//! All parsers trim and lowercase their input and return `None` on any
//! malformed or out-of-range text. Turning `None` into a user-facing error
//! is left to the caller, which knows which field was being parsed.

use std::sync::LazyLock;

use chime_core::{ClockTime, SchedulePattern};
use regex::Regex;

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)([smhdw])$").expect("valid duration regex"));

static AM_PM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}):?(\d{2})?\s*(am|pm)$").expect("valid am/pm regex")
});

static TWENTY_FOUR_HOUR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("valid 24h regex"));

static HOUR_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})(am|pm)?$").expect("valid hour-only regex"));

/// Weekday names and abbreviations, 0 = Monday … 6 = Sunday.
const WEEKDAYS: &[(&str, u8)] = &[
    ("monday", 0),
    ("mon", 0),
    ("tuesday", 1),
    ("tue", 1),
    ("tues", 1),
    ("wednesday", 2),
    ("wed", 2),
    ("thursday", 3),
    ("thu", 3),
    ("thurs", 3),
    ("friday", 4),
    ("fri", 4),
    ("saturday", 5),
    ("sat", 5),
    ("sunday", 6),
    ("sun", 6),
];

const DAILY: &[&str] = &["daily", "every day", "everyday"];
const WEEKDAYS_ONLY: &[&str] = &["weekdays", "weekday", "monday-friday", "mon-fri"];
const WEEKENDS_ONLY: &[&str] = &["weekends", "weekend", "saturday-sunday", "sat-sun"];
const MONTHLY: &[&str] = &["monthly", "every month"];

/// Seconds per unit letter.
fn unit_seconds(unit: &str) -> Option<u64> {
    match unit {
        "s" => Some(1),
        "m" => Some(60),
        "h" => Some(3_600),
        "d" => Some(86_400),
        "w" => Some(604_800),
        _ => None,
    }
}

/// Parse a relative duration such as `30s`, `5m`, `2h`, `1d` or `1w` into seconds.
///
/// Exactly one number followed by exactly one unit letter; embedded
/// whitespace, compound forms (`1h30m`) and overflow are rejected.
pub fn parse_duration(text: &str) -> Option<u64> {
    let text = text.trim().to_lowercase();
    let caps = DURATION_RE.captures(&text)?;
    let amount: u64 = caps[1].parse().ok()?;
    let multiplier = unit_seconds(&caps[2])?;
    amount.checked_mul(multiplier)
}

/// Parse a time of day.
///
/// Grammars, tried in order:
/// 1. `H[:MM] am|pm` (`9am`, `2:30 PM`, `930pm`), hour 1..=12
/// 2. `HH:MM` 24-hour (`14:30`, `09:00`)
/// 3. `H` hour only, optional am/pm (`14`, `9pm`); minute defaults to 0
pub fn parse_clock_time(text: &str) -> Option<ClockTime> {
    let text = text.trim().to_lowercase();

    if let Some(caps) = AM_PM_RE.captures(&text) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = match caps.get(2) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        return ClockTime::new(to_24h(hour, &caps[3])?, minute);
    }

    if let Some(caps) = TWENTY_FOUR_HOUR_RE.captures(&text) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        return ClockTime::new(hour, minute);
    }

    if let Some(caps) = HOUR_ONLY_RE.captures(&text) {
        let hour: u32 = caps[1].parse().ok()?;
        let hour = match caps.get(2) {
            Some(period) => to_24h(hour, period.as_str())?,
            None => hour,
        };
        return ClockTime::new(hour, 0);
    }

    None
}

/// Convert a 12-hour clock hour to 24-hour form. `None` unless `hour ∈ [1,12]`.
fn to_24h(hour: u32, period: &str) -> Option<u32> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    match (period, hour) {
        ("am", 12) => Some(0),
        ("am", h) => Some(h),
        ("pm", 12) => Some(12),
        ("pm", h) => Some(h + 12),
        _ => None,
    }
}

/// Parse a recurrence pattern (`daily`, `weekdays`, `weekends`, a weekday
/// name, `every <weekday>`, `monthly`).
pub fn parse_schedule_pattern(text: &str) -> Option<SchedulePattern> {
    let text = text.trim().to_lowercase();
    let text = text.as_str();

    if DAILY.contains(&text) {
        return Some(SchedulePattern::Daily);
    }
    if WEEKDAYS_ONLY.contains(&text) {
        return Some(SchedulePattern::Weekdays);
    }
    if WEEKENDS_ONLY.contains(&text) {
        return Some(SchedulePattern::Weekends);
    }
    if let Some(weekday) = lookup_weekday(text) {
        return Some(SchedulePattern::Weekly { weekday });
    }
    if let Some(day_part) = text.strip_prefix("every ") {
        if let Some(weekday) = lookup_weekday(day_part) {
            return Some(SchedulePattern::Weekly { weekday });
        }
    }
    if MONTHLY.contains(&text) {
        return Some(SchedulePattern::Monthly { day: 1 });
    }

    None
}

fn lookup_weekday(name: &str) -> Option<u8> {
    WEEKDAYS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, index)| *index)
}
