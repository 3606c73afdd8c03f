//! Per-reminder worker tasks.
//!
//! Each active reminder is driven by exactly one Tokio task. The task
//! suspends until its next fire instant, delivers through the configured
//! [`Notifier`](chime_core::Notifier), and either terminates (one-shot) or
//! loops. Every suspension and every delivery races the reminder's
//! [`CancellationToken`], so a cancel takes effect immediately and no
//! delivery starts after the registry has dropped the reminder.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use chime_core::{
    ClockTime, DestinationId, Notification, NotificationKind, OwnerId, ReminderId, ReminderKind,
    SchedulePattern,
};

use crate::{registry::ReminderRegistry, schedule::next_fire_instant, types::ReminderRecord};

/// Minimum suspension for calendar reminders, so a late wake-up can never
/// spin on an occurrence that is already due.
const MIN_SCHEDULED_WAIT: Duration = Duration::from_secs(1);

pub(crate) struct Worker {
    registry: ReminderRegistry,
    id: ReminderId,
    owner: OwnerId,
    destination: DestinationId,
    message: String,
    kind: ReminderKind,
    cancel: CancellationToken,
}

impl Worker {
    pub(crate) fn new(
        registry: ReminderRegistry,
        record: &ReminderRecord,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            registry,
            id: record.id.clone(),
            owner: record.owner,
            destination: record.destination,
            message: record.message.clone(),
            kind: record.kind,
            cancel,
        }
    }

    pub(crate) async fn run(self, first_fire: DateTime<Utc>) {
        let kind = self.kind;
        match kind {
            ReminderKind::OneShot { delay_secs } => self.run_one_shot(first_fire, delay_secs).await,
            ReminderKind::Recurring { interval_secs } => {
                self.run_recurring(first_fire, interval_secs).await
            }
            ReminderKind::Scheduled { pattern, time } => {
                self.run_scheduled(first_fire, pattern, time).await
            }
        }
    }

    async fn run_one_shot(self, fire_at: DateTime<Utc>, delay_secs: u64) {
        if !self.wait_until(fire_at, Duration::ZERO).await {
            return;
        }
        if self.deliver(NotificationKind::OneShot { delay_secs }).await {
            self.registry.complete(&self.id);
        }
    }

    async fn run_recurring(self, first_fire: DateTime<Utc>, interval_secs: u64) {
        // Range was checked when the first fire instant was computed.
        let interval = i64::try_from(interval_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        let mut fire_at = first_fire;
        loop {
            if !self.wait_until(fire_at, Duration::ZERO).await {
                return;
            }
            if !self.deliver(NotificationKind::Recurring { interval_secs }).await {
                return;
            }
            // The interval runs from the end of delivery, so drift is bounded
            // by delivery latency.
            fire_at = self
                .registry
                .now()
                .checked_add_signed(interval)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
        }
    }

    async fn run_scheduled(
        self,
        first_fire: DateTime<Utc>,
        pattern: SchedulePattern,
        time: ClockTime,
    ) {
        let offset = self.registry.offset();
        let mut fire_at = first_fire;
        loop {
            if !self.wait_until(fire_at, MIN_SCHEDULED_WAIT).await {
                return;
            }

            // Recompute from no earlier than the instant just fired, so an
            // early wake-up cannot pick the same occurrence twice.
            let following = next_fire_instant(&pattern, time, self.floor(fire_at), offset);
            let next = following
                .as_ref()
                .ok()
                .map(|n| n.with_timezone(&offset).naive_local());
            let kind = NotificationKind::Scheduled {
                pattern,
                time,
                next,
            };
            if !self.deliver(kind).await {
                return;
            }

            match next_fire_instant(&pattern, time, self.floor(fire_at), offset) {
                Ok(next) => fire_at = next,
                Err(e) => {
                    error!(
                        reminder_id = %self.id,
                        pattern = %pattern,
                        error = %e,
                        "cannot compute next occurrence, stopping scheduled reminder"
                    );
                    self.registry.complete(&self.id);
                    return;
                }
            }
        }
    }

    fn floor(&self, last_fire: DateTime<Utc>) -> DateTime<Utc> {
        self.registry.now().max(last_fire)
    }

    /// Suspend until `fire_at`. Returns false if the reminder was cancelled
    /// first or is no longer registered.
    async fn wait_until(&self, fire_at: DateTime<Utc>, min_wait: Duration) -> bool {
        if !self.registry.mark_armed(&self.id, fire_at) {
            return false;
        }
        let wait = (fire_at - self.registry.now())
            .to_std()
            .unwrap_or(Duration::ZERO)
            .max(min_wait);

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(wait) => true,
        }
    }

    /// Deliver one notification. Failures are logged and swallowed; returns
    /// false only if the reminder was cancelled before or during delivery.
    async fn deliver(&self, kind: NotificationKind) -> bool {
        if !self.registry.mark_fired(&self.id) {
            return false;
        }

        let notification = Notification {
            reminder_id: self.id.clone(),
            owner: self.owner,
            destination: self.destination,
            message: self.message.clone(),
            kind,
        };
        let notifier = self.registry.env().notifier.clone();

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return false,
            result = notifier.deliver(&notification) => result,
        };

        match result {
            Ok(()) => {
                info!(
                    reminder_id = %self.id,
                    owner = %self.owner,
                    destination = %self.destination,
                    "reminder delivered"
                );
                self.registry.record_delivery(true);
            }
            Err(e) => {
                warn!(
                    reminder_id = %self.id,
                    owner = %self.owner,
                    destination = %self.destination,
                    error = %e,
                    "reminder delivery failed"
                );
                self.registry.record_delivery(false);
            }
        }
        true
    }
}
