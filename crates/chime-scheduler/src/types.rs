use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chime_core::{DestinationId, OwnerId, ReminderId, ReminderKind, ReminderState};

/// A validated request to create a reminder; quota is checked on insert.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub owner: OwnerId,
    pub destination: DestinationId,
    pub message: String,
    pub kind: ReminderKind,
}

/// Snapshot of an active reminder, as held by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderRecord {
    pub id: ReminderId,
    pub owner: OwnerId,
    pub destination: DestinationId,
    pub message: String,
    pub kind: ReminderKind,
    /// Current lifecycle state.
    pub state: ReminderState,
    pub created_at: DateTime<Utc>,
    /// Instant the worker is currently waiting for, if armed.
    pub next_fire: Option<DateTime<Utc>>,
    /// Number of delivery attempts made so far.
    pub fire_count: u32,
}

/// One owner's active reminders, partitioned by kind, each in creation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReminderListing {
    pub one_shot: Vec<ReminderRecord>,
    pub recurring: Vec<ReminderRecord>,
    pub scheduled: Vec<ReminderRecord>,
}

impl ReminderListing {
    pub fn len(&self) -> usize {
        self.one_shot.len() + self.recurring.len() + self.scheduled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registry-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Currently active reminders, all owners.
    pub active: usize,
    pub active_one_shot: usize,
    pub active_recurring: usize,
    pub active_scheduled: usize,
    /// Lifetime counters since process start.
    pub created: u64,
    pub delivered: u64,
    pub failed_deliveries: u64,
    pub completed: u64,
    pub cancelled: u64,
}

/// Returned to the caller once the worker is registered and armed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedReminder {
    pub id: ReminderId,
    pub kind: ReminderKind,
    /// First computed fire instant.
    pub first_fire: DateTime<Utc>,
}
