//! `chime-scheduler`: in-memory reminder engine.
//!
//! # Overview
//!
//! User text is parsed by [`parse`] into delays, intervals, times of day and
//! calendar patterns. The [`engine::ReminderScheduler`] validates a request
//! against the configured ranges and hands it to the
//! [`registry::ReminderRegistry`], which enforces per-owner quotas and spawns
//! one Tokio task per reminder. Workers deliver through a
//! [`chime_core::Notifier`] when their fire instant arrives.
//!
//! # Reminder kinds
//!
//! | Kind        | Behaviour                                                    |
//! |-------------|--------------------------------------------------------------|
//! | `OneShot`   | Fire once after a delay, then drop out of the registry       |
//! | `Recurring` | Fire every N seconds, measured from the end of each delivery |
//! | `Scheduled` | Fire at HH:MM on a daily/weekday/weekend/weekly/monthly rule |
//!
//! Nothing is persisted: every reminder is lost when the process exits.

pub mod engine;
pub mod error;
pub mod format;
pub mod parse;
pub mod registry;
pub mod schedule;
pub mod types;
mod worker;

pub use engine::ReminderScheduler;
pub use error::{InputKind, QuotaScope, Result, SchedulerError};
pub use registry::{Quota, ReminderRegistry};
pub use types::{CreatedReminder, NewReminder, RegistryStats, ReminderListing, ReminderRecord};
