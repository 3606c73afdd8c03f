//! `ReminderRegistry`: owns every active reminder, enforces per-owner
//! quotas and spawns one worker task per reminder.
//!
//! The registry is cheap to clone (an `Arc` inside) and is shared between
//! the command surface and the workers themselves. All mutation happens
//! under a single `std::sync::Mutex` that is never held across an `.await`,
//! so a quota check and the insert that follows it are atomic even on a
//! multi-threaded runtime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, FixedOffset, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use chime_core::{
    Clock, Notifier, OwnerId, ReminderConfig, ReminderId, ReminderKind, ReminderState,
};

use crate::{
    error::{QuotaScope, Result, SchedulerError},
    schedule::next_fire_instant,
    types::{CreatedReminder, NewReminder, RegistryStats, ReminderListing, ReminderRecord},
    worker::Worker,
};

/// Per-owner caps on simultaneously active reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub max_active: usize,
    pub max_recurring: usize,
    /// `None` leaves scheduled reminders bounded by `max_active` only.
    pub max_scheduled: Option<usize>,
}

impl Default for Quota {
    fn default() -> Self {
        Self::from(&ReminderConfig::default())
    }
}

impl From<&ReminderConfig> for Quota {
    fn from(cfg: &ReminderConfig) -> Self {
        Self {
            max_active: cfg.max_active,
            max_recurring: cfg.max_recurring,
            max_scheduled: cfg.max_scheduled,
        }
    }
}

/// Collaborators every worker needs.
pub(crate) struct WorkerEnv {
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) offset: FixedOffset,
}

struct Entry {
    record: ReminderRecord,
    /// Insertion sequence, for stable creation-order listings.
    seq: u64,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<ReminderId, Entry>,
    next_seq: u64,
    created: u64,
    delivered: u64,
    failed_deliveries: u64,
    completed: u64,
    cancelled: u64,
}

impl RegistryState {
    fn owned_by(&self, owner: OwnerId) -> impl Iterator<Item = &Entry> {
        self.entries.values().filter(move |e| e.record.owner == owner)
    }

    /// Remove matching entries, cancel their workers and return the removed records.
    fn cancel_matching(&mut self, pred: impl Fn(&ReminderRecord) -> bool) -> Vec<ReminderRecord> {
        let ids: Vec<ReminderId> = self
            .entries
            .values()
            .filter(|e| pred(&e.record))
            .map(|e| e.record.id.clone())
            .collect();

        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entry) = self.entries.remove(&id) {
                entry.cancel.cancel();
                let mut record = entry.record;
                record.state = ReminderState::Cancelled;
                record.next_fire = None;
                removed.push(record);
            }
        }
        self.cancelled += removed.len() as u64;
        removed
    }
}

struct Inner {
    state: Mutex<RegistryState>,
    quota: Quota,
    env: WorkerEnv,
}

/// Shared handle to the set of active reminders.
#[derive(Clone)]
pub struct ReminderRegistry {
    inner: Arc<Inner>,
}

impl ReminderRegistry {
    /// Create an empty registry.
    ///
    /// `offset` is the wall-clock offset in which scheduled reminders are
    /// evaluated.
    pub fn new(
        quota: Quota,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        offset: FixedOffset,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(RegistryState::default()),
                quota,
                env: WorkerEnv {
                    notifier,
                    clock,
                    offset,
                },
            }),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.inner.env.offset
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.inner.env.clock.now()
    }

    pub(crate) fn env(&self) -> &WorkerEnv {
        &self.inner.env
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a reminder and spawn its worker.
    ///
    /// Fails with `QuotaExceeded` if the owner is at the total cap, or at
    /// the recurring (or configured scheduled) cap for that kind; nothing is
    /// mutated in that case. Must be called from within a Tokio runtime.
    pub fn create(&self, request: NewReminder) -> Result<CreatedReminder> {
        let now = self.now();
        let first_fire = self.first_fire(&request.kind, now)?;

        let mut state = self.lock();
        self.check_quota(&state, request.owner, &request.kind)?;

        let id = ReminderId::new();
        let cancel = CancellationToken::new();
        let record = ReminderRecord {
            id: id.clone(),
            owner: request.owner,
            destination: request.destination,
            message: request.message,
            kind: request.kind,
            state: ReminderState::Pending,
            created_at: now,
            next_fire: Some(first_fire),
            fire_count: 0,
        };

        let worker = Worker::new(self.clone(), &record, cancel.clone());
        let task = tokio::spawn(worker.run(first_fire));

        let seq = state.next_seq;
        state.next_seq += 1;
        state.created += 1;
        state.entries.insert(
            id.clone(),
            Entry {
                record,
                seq,
                cancel,
                task: Some(task),
            },
        );
        let active = state.owned_by(request.owner).count();
        drop(state);

        info!(
            reminder_id = %id,
            owner = %request.owner,
            kind = request.kind.label(),
            first_fire = %first_fire,
            active,
            "reminder created"
        );

        Ok(CreatedReminder {
            id,
            kind: request.kind,
            first_fire,
        })
    }

    fn first_fire(&self, kind: &ReminderKind, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        match kind {
            ReminderKind::OneShot { delay_secs } => offset_by_secs(now, *delay_secs),
            ReminderKind::Recurring { interval_secs } => offset_by_secs(now, *interval_secs),
            ReminderKind::Scheduled { pattern, time } => {
                next_fire_instant(pattern, *time, now, self.inner.env.offset)
            }
        }
    }

    fn check_quota(
        &self,
        state: &RegistryState,
        owner: OwnerId,
        kind: &ReminderKind,
    ) -> Result<()> {
        let quota = self.inner.quota;
        let owned: Vec<&ReminderKind> = state.owned_by(owner).map(|e| &e.record.kind).collect();

        let exceeded = |scope, limit| SchedulerError::QuotaExceeded {
            owner,
            scope,
            limit,
        };

        if owned.len() >= quota.max_active {
            return Err(exceeded(QuotaScope::Total, quota.max_active));
        }
        if kind.is_recurring() {
            let recurring = owned.iter().filter(|k| k.is_recurring()).count();
            if recurring >= quota.max_recurring {
                return Err(exceeded(QuotaScope::Recurring, quota.max_recurring));
            }
        }
        if let (true, Some(max)) = (kind.is_scheduled(), quota.max_scheduled) {
            let scheduled = owned.iter().filter(|k| k.is_scheduled()).count();
            if scheduled >= max {
                return Err(exceeded(QuotaScope::Scheduled, max));
            }
        }
        Ok(())
    }

    /// The owner's active reminders, partitioned by kind in creation order.
    pub fn list(&self, owner: OwnerId) -> ReminderListing {
        let state = self.lock();
        let mut owned: Vec<&Entry> = state.owned_by(owner).collect();
        owned.sort_by_key(|e| e.seq);

        let mut listing = ReminderListing::default();
        for entry in owned {
            let record = entry.record.clone();
            match record.kind {
                ReminderKind::OneShot { .. } => listing.one_shot.push(record),
                ReminderKind::Recurring { .. } => listing.recurring.push(record),
                ReminderKind::Scheduled { .. } => listing.scheduled.push(record),
            }
        }
        listing
    }

    pub fn get(&self, id: &ReminderId) -> Option<ReminderRecord> {
        self.lock().entries.get(id).map(|e| e.record.clone())
    }

    pub fn active_count(&self, owner: OwnerId) -> usize {
        self.lock().owned_by(owner).count()
    }

    /// Cancel every reminder of `owner` whose message contains `needle`,
    /// ignoring case. The needle is matched as given, surrounding whitespace
    /// included. An empty needle matches nothing.
    pub fn cancel_by_content(&self, owner: OwnerId, needle: &str) -> usize {
        let needle = needle.to_lowercase();
        if needle.is_empty() {
            return 0;
        }
        self.cancel_where(owner, "content", |r| {
            r.message.to_lowercase().contains(&needle)
        })
    }

    pub fn cancel_all_recurring(&self, owner: OwnerId) -> usize {
        self.cancel_where(owner, "recurring", |r| r.kind.is_recurring())
    }

    pub fn cancel_all_scheduled(&self, owner: OwnerId) -> usize {
        self.cancel_where(owner, "scheduled", |r| r.kind.is_scheduled())
    }

    fn cancel_where(
        &self,
        owner: OwnerId,
        reason: &'static str,
        pred: impl Fn(&ReminderRecord) -> bool,
    ) -> usize {
        let removed = self
            .lock()
            .cancel_matching(|r| r.owner == owner && pred(r));
        for record in &removed {
            info!(reminder_id = %record.id, owner = %owner, reason, "reminder cancelled");
        }
        removed.len()
    }

    /// Cancel a single reminder by ID.
    pub fn cancel(&self, id: &ReminderId) -> Result<ReminderRecord> {
        let mut removed = self.lock().cancel_matching(|r| &r.id == id);
        match removed.pop() {
            Some(record) => {
                info!(reminder_id = %id, owner = %record.owner, "reminder cancelled");
                Ok(record)
            }
            None => Err(SchedulerError::NotFound { id: id.clone() }),
        }
    }

    pub fn stats(&self) -> RegistryStats {
        let state = self.lock();
        let mut stats = RegistryStats {
            active: state.entries.len(),
            created: state.created,
            delivered: state.delivered,
            failed_deliveries: state.failed_deliveries,
            completed: state.completed,
            cancelled: state.cancelled,
            ..RegistryStats::default()
        };
        for entry in state.entries.values() {
            match entry.record.kind {
                ReminderKind::OneShot { .. } => stats.active_one_shot += 1,
                ReminderKind::Recurring { .. } => stats.active_recurring += 1,
                ReminderKind::Scheduled { .. } => stats.active_scheduled += 1,
            }
        }
        stats
    }

    /// Cancel every active reminder and wait for the workers to exit.
    ///
    /// Returns how many reminders were dropped. State is memory-only, so
    /// these reminders are gone for good.
    pub async fn shutdown(&self) -> usize {
        let handles: Vec<JoinHandle<()>> = {
            let mut state = self.lock();
            let mut handles = Vec::with_capacity(state.entries.len());
            for entry in state.entries.values_mut() {
                entry.cancel.cancel();
                if let Some(task) = entry.task.take() {
                    handles.push(task);
                }
            }
            let dropped = state.entries.len();
            state.cancelled += dropped as u64;
            state.entries.clear();
            handles
        };

        let dropped = handles.len();
        for handle in handles {
            let _ = handle.await;
        }
        info!(dropped, "reminder registry shut down");
        dropped
    }

    // --- worker callbacks ----------------------------------------------------

    /// Record that the worker is suspended until `fire_at`. Returns false if
    /// the reminder is no longer registered.
    pub(crate) fn mark_armed(&self, id: &ReminderId, fire_at: DateTime<Utc>) -> bool {
        let mut state = self.lock();
        match state.entries.get_mut(id) {
            Some(entry) => {
                entry.record.state = ReminderState::Armed;
                entry.record.next_fire = Some(fire_at);
                debug!(reminder_id = %id, next_fire = %fire_at, "reminder armed");
                true
            }
            None => false,
        }
    }

    /// Transition to `Fired` just before delivery. Returns false if the
    /// reminder was cancelled in the meantime, in which case the worker must
    /// not deliver.
    pub(crate) fn mark_fired(&self, id: &ReminderId) -> bool {
        let mut state = self.lock();
        match state.entries.get_mut(id) {
            Some(entry) if !entry.cancel.is_cancelled() => {
                entry.record.state = ReminderState::Fired;
                entry.record.next_fire = None;
                entry.record.fire_count += 1;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn record_delivery(&self, delivered: bool) {
        let mut state = self.lock();
        if delivered {
            state.delivered += 1;
        } else {
            state.failed_deliveries += 1;
        }
    }

    /// Remove a reminder whose worker terminated on its own. Returns the
    /// final record, or `None` if it was cancelled first.
    pub(crate) fn complete(&self, id: &ReminderId) -> Option<ReminderRecord> {
        let mut record = {
            let mut state = self.lock();
            let entry = state.entries.remove(id)?;
            state.completed += 1;
            entry.record
        };
        record.state = ReminderState::Completed;
        record.next_fire = None;
        info!(
            reminder_id = %id,
            owner = %record.owner,
            fire_count = record.fire_count,
            state = %record.state,
            "reminder completed"
        );
        Some(record)
    }
}

fn offset_by_secs(now: DateTime<Utc>, secs: u64) -> Result<DateTime<Utc>> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|d| now.checked_add_signed(d))
        .ok_or_else(|| SchedulerError::Calculation(format!("{secs}s from {now} overflows")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chime_core::{
        ClockTime, DeliveryError, DestinationId, Notification, SchedulePattern, SystemClock,
    };

    struct NullNotifier;

    #[async_trait]
    impl Notifier for NullNotifier {
        async fn deliver(&self, _: &Notification) -> std::result::Result<(), DeliveryError> {
            Ok(())
        }
    }

    fn registry(quota: Quota) -> ReminderRegistry {
        ReminderRegistry::new(
            quota,
            Arc::new(NullNotifier),
            Arc::new(SystemClock),
            FixedOffset::east_opt(0).unwrap(),
        )
    }

    fn request(owner: u64, message: &str, kind: ReminderKind) -> NewReminder {
        NewReminder {
            owner: OwnerId(owner),
            destination: DestinationId(99),
            message: message.to_string(),
            kind,
        }
    }

    fn one_shot() -> ReminderKind {
        ReminderKind::OneShot { delay_secs: 600 }
    }

    fn recurring() -> ReminderKind {
        ReminderKind::Recurring { interval_secs: 3_600 }
    }

    fn scheduled() -> ReminderKind {
        ReminderKind::Scheduled {
            pattern: SchedulePattern::Daily,
            time: ClockTime::new(9, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn total_quota_is_per_owner() {
        let reg = registry(Quota::default());
        for i in 0..5 {
            reg.create(request(1, &format!("task {i}"), one_shot())).unwrap();
        }
        let err = reg.create(request(1, "one too many", one_shot())).unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::QuotaExceeded {
                scope: QuotaScope::Total,
                limit: 5,
                ..
            }
        ));
        assert_eq!(err.code(), "QUOTA_EXCEEDED");

        // Another owner is unaffected.
        reg.create(request(2, "mine", one_shot())).unwrap();
        assert_eq!(reg.active_count(OwnerId(1)), 5);
        assert_eq!(reg.active_count(OwnerId(2)), 1);
    }

    #[tokio::test]
    async fn recurring_quota_leaves_other_kinds_open() {
        let reg = registry(Quota::default());
        for i in 0..3 {
            reg.create(request(1, &format!("r{i}"), recurring())).unwrap();
        }
        let err = reg.create(request(1, "r3", recurring())).unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::QuotaExceeded {
                scope: QuotaScope::Recurring,
                limit: 3,
                ..
            }
        ));
        reg.create(request(1, "one-shot still fits", one_shot())).unwrap();
        reg.create(request(1, "scheduled too", scheduled())).unwrap();
        assert_eq!(reg.active_count(OwnerId(1)), 5);
    }

    #[tokio::test]
    async fn total_cap_is_checked_before_recurring_cap() {
        let reg = registry(Quota::default());
        for i in 0..5 {
            reg.create(request(1, &format!("s{i}"), scheduled())).unwrap();
        }
        let err = reg.create(request(1, "r", recurring())).unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::QuotaExceeded {
                scope: QuotaScope::Total,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn optional_scheduled_cap() {
        let reg = registry(Quota {
            max_scheduled: Some(2),
            ..Quota::default()
        });
        reg.create(request(1, "a", scheduled())).unwrap();
        reg.create(request(1, "b", scheduled())).unwrap();
        let err = reg.create(request(1, "c", scheduled())).unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::QuotaExceeded {
                scope: QuotaScope::Scheduled,
                limit: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn rejected_request_leaves_no_trace() {
        let reg = registry(Quota {
            max_active: 1,
            max_recurring: 1,
            max_scheduled: None,
        });
        reg.create(request(1, "first", one_shot())).unwrap();
        let before = reg.stats();
        assert!(reg.create(request(1, "second", one_shot())).is_err());
        assert_eq!(reg.stats(), before);
        assert_eq!(reg.list(OwnerId(1)).len(), 1);
    }

    #[tokio::test]
    async fn listing_is_partitioned_in_creation_order() {
        let reg = registry(Quota::default());
        reg.create(request(1, "first", one_shot())).unwrap();
        reg.create(request(1, "every hour", recurring())).unwrap();
        reg.create(request(1, "second", one_shot())).unwrap();
        reg.create(request(1, "morning", scheduled())).unwrap();
        reg.create(request(2, "not mine", one_shot())).unwrap();

        let listing = reg.list(OwnerId(1));
        let messages = |records: &[ReminderRecord]| {
            records.iter().map(|r| r.message.clone()).collect::<Vec<_>>()
        };
        assert_eq!(messages(&listing.one_shot), ["first", "second"]);
        assert_eq!(messages(&listing.recurring), ["every hour"]);
        assert_eq!(messages(&listing.scheduled), ["morning"]);
        assert!(reg.list(OwnerId(3)).is_empty());
    }

    #[tokio::test]
    async fn cancel_by_content_ignores_case_and_scopes_to_owner() {
        let reg = registry(Quota::default());
        reg.create(request(1, "Stand up and stretch", one_shot())).unwrap();
        reg.create(request(1, "standup meeting", recurring())).unwrap();
        reg.create(request(1, "drink water", one_shot())).unwrap();
        reg.create(request(2, "STAND UP", one_shot())).unwrap();

        assert_eq!(reg.cancel_by_content(OwnerId(1), "STAND"), 2);
        assert_eq!(reg.active_count(OwnerId(1)), 1);
        assert_eq!(reg.active_count(OwnerId(2)), 1);
        assert_eq!(reg.cancel_by_content(OwnerId(1), "nothing matches"), 0);
        assert_eq!(reg.cancel_by_content(OwnerId(1), ""), 0);
        assert_eq!(reg.stats().cancelled, 2);
    }

    #[tokio::test]
    async fn cancel_by_content_keeps_surrounding_whitespace() {
        let reg = registry(Quota::default());
        reg.create(request(1, "drink water", one_shot())).unwrap();
        reg.create(request(1, "water the plants", one_shot())).unwrap();

        assert_eq!(reg.cancel_by_content(OwnerId(1), "water "), 1);
        let listing = reg.list(OwnerId(1));
        assert_eq!(listing.one_shot[0].message, "drink water");
        assert_eq!(reg.cancel_by_content(OwnerId(1), " water"), 1);
        assert_eq!(reg.active_count(OwnerId(1)), 0);
    }

    #[tokio::test]
    async fn cancel_all_by_kind() {
        let reg = registry(Quota::default());
        reg.create(request(1, "a", recurring())).unwrap();
        reg.create(request(1, "b", recurring())).unwrap();
        reg.create(request(1, "c", scheduled())).unwrap();
        reg.create(request(1, "d", one_shot())).unwrap();

        assert_eq!(reg.cancel_all_recurring(OwnerId(1)), 2);
        assert_eq!(reg.cancel_all_recurring(OwnerId(1)), 0);
        assert_eq!(reg.cancel_all_scheduled(OwnerId(1)), 1);

        let stats = reg.stats();
        assert_eq!(stats.active, 1);
        assert_eq!(stats.active_one_shot, 1);
        assert_eq!(stats.created, 4);
        assert_eq!(stats.cancelled, 3);
    }

    #[tokio::test]
    async fn cancel_by_id() {
        let reg = registry(Quota::default());
        let created = reg.create(request(1, "a", one_shot())).unwrap();
        assert_eq!(reg.get(&created.id).unwrap().state, ReminderState::Pending);

        let record = reg.cancel(&created.id).unwrap();
        assert_eq!(record.state, ReminderState::Cancelled);
        assert!(reg.get(&created.id).is_none());

        let err = reg.cancel(&created.id).unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn complete_returns_final_record_once() {
        let reg = registry(Quota::default());
        let created = reg.create(request(1, "a", one_shot())).unwrap();
        assert!(reg.mark_fired(&created.id));

        let record = reg.complete(&created.id).unwrap();
        assert_eq!(record.state, ReminderState::Completed);
        assert_eq!(record.fire_count, 1);
        assert!(record.next_fire.is_none());
        assert!(reg.get(&created.id).is_none());
        assert_eq!(reg.stats().completed, 1);

        assert!(reg.complete(&created.id).is_none());
        assert_eq!(reg.stats().completed, 1);
    }

    #[tokio::test]
    async fn shutdown_drops_everything() {
        let reg = registry(Quota::default());
        reg.create(request(1, "a", one_shot())).unwrap();
        reg.create(request(2, "b", recurring())).unwrap();
        assert_eq!(reg.shutdown().await, 2);
        assert_eq!(reg.stats().active, 0);
        assert_eq!(reg.shutdown().await, 0);
    }
}
