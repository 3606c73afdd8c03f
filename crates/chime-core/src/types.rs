use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Weekday names indexed by `num_days_from_monday` (0 = Monday … 6 = Sunday).
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Unique identifier for an active reminder (UUIDv4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReminderId(pub String);

impl ReminderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ReminderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ReminderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The user who owns a reminder (Discord user snowflake).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerId(pub u64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OwnerId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Where a reminder is delivered (Discord channel snowflake).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DestinationId(pub u64);

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DestinationId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A wall-clock time of day, minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    /// Returns `None` unless `hour ∈ [0,23]` and `minute ∈ [0,59]`.
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    pub fn hour(&self) -> u32 {
        self.hour as u32
    }

    pub fn minute(&self) -> u32 {
        self.minute as u32
    }

    pub fn to_naive_time(self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0)
    }

    /// 12-hour rendering without a leading zero, e.g. `9:05 AM`, `12:00 PM`.
    pub fn to_12h_string(self) -> String {
        let (hour, period) = match self.hour {
            0 => (12, "AM"),
            h @ 1..=11 => (h, "AM"),
            12 => (12, "PM"),
            h => (h - 12, "PM"),
        };
        format!("{}:{:02} {}", hour, self.minute, period)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Calendar recurrence for scheduled reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchedulePattern {
    /// Every day.
    Daily,

    /// Monday through Friday.
    Weekdays,

    /// Saturday and Sunday.
    Weekends,

    /// One specific weekday (0 = Monday … 6 = Sunday).
    Weekly { weekday: u8 },

    /// One day of the month (1..=31); short months fall back to their last day.
    Monthly { day: u8 },
}

impl SchedulePattern {
    /// Short description used in confirmations and notifications ("daily", "Mondays").
    pub fn description(&self) -> String {
        match self {
            SchedulePattern::Daily => "daily".to_string(),
            SchedulePattern::Weekdays => "weekdays".to_string(),
            SchedulePattern::Weekends => "weekends".to_string(),
            SchedulePattern::Weekly { weekday } => WEEKDAY_NAMES
                .get(*weekday as usize)
                .map(|name| format!("{name}s"))
                .unwrap_or_else(|| "weekly".to_string()),
            SchedulePattern::Monthly { .. } => "monthly".to_string(),
        }
    }
}

impl fmt::Display for SchedulePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// What a reminder does once armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReminderKind {
    /// Fire once after `delay_secs`, then terminate.
    OneShot { delay_secs: u64 },

    /// Fire every `interval_secs` until cancelled.
    Recurring { interval_secs: u64 },

    /// Fire on each calendar occurrence of `pattern` at `time`.
    Scheduled {
        pattern: SchedulePattern,
        time: ClockTime,
    },
}

impl ReminderKind {
    pub fn is_recurring(&self) -> bool {
        matches!(self, ReminderKind::Recurring { .. })
    }

    pub fn is_scheduled(&self) -> bool {
        matches!(self, ReminderKind::Scheduled { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReminderKind::OneShot { .. } => "one_shot",
            ReminderKind::Recurring { .. } => "recurring",
            ReminderKind::Scheduled { .. } => "scheduled",
        }
    }
}

/// Lifecycle state of a reminder's worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderState {
    /// Registered; the worker has not started waiting yet.
    Pending,
    /// Suspended until the next fire instant.
    Armed,
    /// Delivering a notification.
    Fired,
    /// Terminated after its final delivery (one-shot) or a calculation failure.
    Completed,
    /// Cancelled by the owner or by shutdown.
    Cancelled,
}

impl fmt::Display for ReminderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReminderState::Pending => "pending",
            ReminderState::Armed => "armed",
            ReminderState::Fired => "fired",
            ReminderState::Completed => "completed",
            ReminderState::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_time_rejects_out_of_range() {
        assert!(ClockTime::new(24, 0).is_none());
        assert!(ClockTime::new(0, 60).is_none());
        assert!(ClockTime::new(23, 59).is_some());
    }

    #[test]
    fn clock_time_12h_rendering() {
        assert_eq!(ClockTime::new(0, 0).unwrap().to_12h_string(), "12:00 AM");
        assert_eq!(ClockTime::new(9, 5).unwrap().to_12h_string(), "9:05 AM");
        assert_eq!(ClockTime::new(12, 30).unwrap().to_12h_string(), "12:30 PM");
        assert_eq!(ClockTime::new(23, 59).unwrap().to_12h_string(), "11:59 PM");
    }

    #[test]
    fn pattern_descriptions() {
        assert_eq!(SchedulePattern::Daily.description(), "daily");
        assert_eq!(SchedulePattern::Weekly { weekday: 0 }.description(), "Mondays");
        assert_eq!(SchedulePattern::Weekly { weekday: 6 }.description(), "Sundays");
        assert_eq!(SchedulePattern::Monthly { day: 1 }.description(), "monthly");
    }

    #[test]
    fn pattern_serializes_with_kind_tag() {
        let json = serde_json::to_string(&SchedulePattern::Weekly { weekday: 2 }).unwrap();
        assert_eq!(json, r#"{"kind":"weekly","weekday":2}"#);
    }
}
