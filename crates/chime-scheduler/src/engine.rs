use std::sync::Arc;

use chime_core::{
    Clock, DestinationId, Notifier, OwnerId, ReminderConfig, ReminderId, ReminderKind,
};

use crate::{
    error::{InputKind, Result, SchedulerError},
    parse::{parse_clock_time, parse_duration, parse_schedule_pattern},
    registry::{Quota, ReminderRegistry},
    types::{CreatedReminder, NewReminder, RegistryStats, ReminderListing, ReminderRecord},
};

/// Entry point for the command surface: turns raw user text into validated
/// reminders and forwards management calls to the [`ReminderRegistry`].
///
/// Validation runs parse → range → message length → quota, so the first
/// problem with a request is the one reported.
#[derive(Clone)]
pub struct ReminderScheduler {
    registry: ReminderRegistry,
    limits: ReminderConfig,
}

impl ReminderScheduler {
    pub fn new(
        limits: ReminderConfig,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let offset = limits.utc_offset()?;
        let registry = ReminderRegistry::new(Quota::from(&limits), notifier, clock, offset);
        Ok(Self { registry, limits })
    }

    pub fn registry(&self) -> &ReminderRegistry {
        &self.registry
    }

    pub fn limits(&self) -> &ReminderConfig {
        &self.limits
    }

    /// Fire once after `duration_text` (e.g. `5m`).
    pub fn create_one_shot(
        &self,
        owner: OwnerId,
        destination: DestinationId,
        duration_text: &str,
        message: &str,
    ) -> Result<CreatedReminder> {
        let delay_secs = self.parse_seconds(
            InputKind::Delay,
            duration_text,
            self.limits.one_shot_min_secs,
            self.limits.one_shot_max_secs,
        )?;
        self.submit(owner, destination, message, ReminderKind::OneShot { delay_secs })
    }

    /// Fire every `interval_text` (e.g. `1h`) until cancelled.
    pub fn create_recurring(
        &self,
        owner: OwnerId,
        destination: DestinationId,
        interval_text: &str,
        message: &str,
    ) -> Result<CreatedReminder> {
        let interval_secs = self.parse_seconds(
            InputKind::Interval,
            interval_text,
            self.limits.recurring_min_secs,
            self.limits.recurring_max_secs,
        )?;
        self.submit(
            owner,
            destination,
            message,
            ReminderKind::Recurring { interval_secs },
        )
    }

    /// Fire on a calendar pattern (e.g. `weekdays`) at `time_text` (e.g. `9:00 AM`).
    pub fn create_scheduled(
        &self,
        owner: OwnerId,
        destination: DestinationId,
        pattern_text: &str,
        time_text: &str,
        message: &str,
    ) -> Result<CreatedReminder> {
        let pattern = parse_schedule_pattern(pattern_text).ok_or_else(|| SchedulerError::Parse {
            input_kind: InputKind::Pattern,
            input: pattern_text.to_string(),
        })?;
        let time = parse_clock_time(time_text).ok_or_else(|| SchedulerError::Parse {
            input_kind: InputKind::ClockTime,
            input: time_text.to_string(),
        })?;
        self.submit(
            owner,
            destination,
            message,
            ReminderKind::Scheduled { pattern, time },
        )
    }

    fn parse_seconds(&self, input_kind: InputKind, text: &str, min: u64, max: u64) -> Result<u64> {
        let value = parse_duration(text).ok_or_else(|| SchedulerError::Parse {
            input_kind,
            input: text.to_string(),
        })?;
        if !(min..=max).contains(&value) {
            return Err(SchedulerError::OutOfRange {
                input_kind,
                value,
                min,
                max,
            });
        }
        Ok(value)
    }

    fn submit(
        &self,
        owner: OwnerId,
        destination: DestinationId,
        message: &str,
        kind: ReminderKind,
    ) -> Result<CreatedReminder> {
        let len = message.chars().count();
        if len > self.limits.max_message_chars {
            return Err(SchedulerError::MessageTooLong {
                len,
                max: self.limits.max_message_chars,
            });
        }
        self.registry.create(NewReminder {
            owner,
            destination,
            message: message.to_string(),
            kind,
        })
    }

    // --- pass-through management ---------------------------------------------

    pub fn list(&self, owner: OwnerId) -> ReminderListing {
        self.registry.list(owner)
    }

    pub fn active_count(&self, owner: OwnerId) -> usize {
        self.registry.active_count(owner)
    }

    pub fn cancel(&self, id: &ReminderId) -> Result<ReminderRecord> {
        self.registry.cancel(id)
    }

    pub fn cancel_by_content(&self, owner: OwnerId, needle: &str) -> usize {
        self.registry.cancel_by_content(owner, needle)
    }

    pub fn cancel_all_recurring(&self, owner: OwnerId) -> usize {
        self.registry.cancel_all_recurring(owner)
    }

    pub fn cancel_all_scheduled(&self, owner: OwnerId) -> usize {
        self.registry.cancel_all_scheduled(owner)
    }

    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// Cancel everything; returns the number of reminders dropped.
    pub async fn shutdown(&self) -> usize {
        self.registry.shutdown().await
    }
}
