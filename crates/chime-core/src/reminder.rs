//! Reminder delivery types: shared between the scheduler workers and the
//! channel adapter that actually sends the message.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ClockTime, DestinationId, OwnerId, ReminderId, SchedulePattern};

/// Kind-specific context rendered alongside the reminder text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationKind {
    /// The reminder was set `delay_secs` ago and will not fire again.
    OneShot { delay_secs: u64 },

    /// The reminder repeats every `interval_secs`.
    Recurring { interval_secs: u64 },

    /// Calendar reminder. `next` is the following occurrence in the
    /// configured wall-clock offset, if one could be computed.
    Scheduled {
        pattern: SchedulePattern,
        time: ClockTime,
        next: Option<NaiveDateTime>,
    },
}

/// One firing of a reminder, handed to a [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Originating reminder, used for logging.
    pub reminder_id: ReminderId,
    pub owner: OwnerId,
    pub destination: DestinationId,
    /// The text the owner asked to be reminded of.
    pub message: String,
    pub kind: NotificationKind,
}

/// Why a notification could not be delivered.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The destination no longer exists or is not visible to the bot.
    #[error("destination {0} not found")]
    DestinationNotFound(u64),

    /// The bot is not allowed to post in the destination.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Transport or API failure.
    #[error("delivery failed: {0}")]
    Transport(String),
}

/// Best-effort delivery of fired reminders.
///
/// Callers log failures and never retry; the returned error carries no
/// information the scheduler acts on beyond logging.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError>;
}
