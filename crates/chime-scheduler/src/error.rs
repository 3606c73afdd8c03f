use std::fmt;

use chime_core::{ChimeError, OwnerId, ReminderId};
use thiserror::Error;

/// Which user-supplied field a parse or range error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// One-shot delay, e.g. `5m`.
    Delay,
    /// Recurring interval, e.g. `30m`.
    Interval,
    /// Time of day, e.g. `9:00 AM`.
    ClockTime,
    /// Schedule pattern, e.g. `weekdays`.
    Pattern,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InputKind::Delay => "delay",
            InputKind::Interval => "interval",
            InputKind::ClockTime => "time of day",
            InputKind::Pattern => "schedule pattern",
        };
        write!(f, "{s}")
    }
}

/// Which per-owner cap a rejected request ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaScope {
    /// All active reminders of every kind.
    Total,
    /// Active recurring reminders.
    Recurring,
    /// Active scheduled reminders (only when a dedicated cap is configured).
    Scheduled,
}

impl fmt::Display for QuotaScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuotaScope::Total => "active",
            QuotaScope::Recurring => "recurring",
            QuotaScope::Scheduled => "scheduled",
        };
        write!(f, "{s}")
    }
}

/// Errors that can occur within the reminder engine.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The text could not be parsed at all.
    #[error("Invalid {input_kind}: {input:?}")]
    Parse { input_kind: InputKind, input: String },

    /// The text parsed but the value is outside the accepted bounds.
    #[error("{input_kind} of {value}s is outside {min}s..={max}s")]
    OutOfRange {
        input_kind: InputKind,
        value: u64,
        min: u64,
        max: u64,
    },

    /// The reminder message exceeds the configured length.
    #[error("Message is {len} characters (max {max})")]
    MessageTooLong { len: usize, max: usize },

    /// The owner already holds the maximum number of reminders for `scope`.
    #[error("Owner {owner} already has {limit} {scope} reminders")]
    QuotaExceeded {
        owner: OwnerId,
        scope: QuotaScope,
        limit: usize,
    },

    /// No next fire instant could be computed for an accepted pattern.
    #[error("Could not calculate next occurrence: {0}")]
    Calculation(String),

    /// Reminder limits could not be turned into a working engine.
    #[error("Configuration error: {0}")]
    Config(#[from] ChimeError),

    /// No active reminder with the given ID exists.
    #[error("Reminder not found: {id}")]
    NotFound { id: ReminderId },
}

impl SchedulerError {
    /// Short error code string for logs and command responses.
    pub fn code(&self) -> &'static str {
        match self {
            SchedulerError::Parse { .. } => "PARSE_ERROR",
            SchedulerError::OutOfRange { .. } => "RANGE_ERROR",
            SchedulerError::MessageTooLong { .. } => "RANGE_ERROR",
            SchedulerError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            SchedulerError::Calculation(_) => "CALCULATION_ERROR",
            SchedulerError::Config(_) => "CONFIG_ERROR",
            SchedulerError::NotFound { .. } => "NOT_FOUND",
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
