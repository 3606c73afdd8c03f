//! `chime-core`: shared reminder data model, clock and delivery boundary,
//! configuration and error types.

pub mod clock;
pub mod config;
pub mod error;
pub mod reminder;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use config::{ChimeConfig, DiscordConfig, ReminderConfig};
pub use error::{ChimeError, Result};
pub use reminder::{DeliveryError, Notification, NotificationKind, Notifier};
pub use types::{
    ClockTime, DestinationId, OwnerId, ReminderId, ReminderKind, ReminderState, SchedulePattern,
};
