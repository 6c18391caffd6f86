//! The trigger store boundary.
//!
//! [`TriggerStore`] is the narrow interface a ring session (and the
//! scheduler probe, in tests) needs from the shared store: guarded
//! insertion and the conditional `ringing -> dismissed` transition. Both
//! operations are intent-idempotent: a skipped insert and a lost
//! dismissal race are ordinary outcomes, not errors.
//!
//! [`MemoryTriggerStore`] is the reference in-memory implementation used
//! by the test-suite; the server side realizes the same conditional
//! statements in SQL (`hearth-db`'s `TriggerRepo`).

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use hearth_core::ring::TriggerStatus;
use hearth_core::types::{DbId, Timestamp};

/// The store could not be reached. The local session has already stopped
/// by the time this surfaces; the change feed reconciles on reconnect.
#[derive(Debug, thiserror::Error)]
#[error("trigger store unavailable: {0}")]
pub struct StoreUnavailable(pub String);

/// Result of a guarded trigger insertion.
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    /// A new ringing trigger was created.
    Inserted(TriggerSnapshot),
    /// A trigger for this alarm already exists within the idempotency
    /// window; the firing was already handled.
    AlreadyExists,
}

/// Result of a conditional dismissal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissOutcome {
    /// This call performed the `ringing -> dismissed` transition.
    Applied,
    /// Another party had already dismissed the trigger.
    NotApplied,
}

/// The fields of a trigger row a session needs to run.
#[derive(Debug, Clone)]
pub struct TriggerSnapshot {
    pub trigger_id: DbId,
    pub alarm_id: DbId,
    pub triggered_at: Timestamp,
}

/// Conditional operations on the shared trigger store.
///
/// Among any set of concurrent [`dismiss_trigger`](Self::dismiss_trigger)
/// calls for one trigger, implementations must report [`DismissOutcome::Applied`]
/// to exactly one caller.
#[async_trait]
pub trait TriggerStore: Send + Sync {
    /// Insert a ringing trigger for `alarm_id` unless one was fired within
    /// the trailing `window`.
    async fn insert_trigger(
        &self,
        alarm_id: DbId,
        window: Duration,
    ) -> Result<InsertOutcome, StoreUnavailable>;

    /// Attempt the `ringing -> dismissed` transition.
    async fn dismiss_trigger(
        &self,
        trigger_id: DbId,
        by_user: DbId,
    ) -> Result<DismissOutcome, StoreUnavailable>;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredTrigger {
    trigger_id: DbId,
    alarm_id: DbId,
    status: TriggerStatus,
    triggered_at: Timestamp,
    dismissed_by: Option<DbId>,
}

/// In-memory [`TriggerStore`] with the same conditional semantics as the
/// SQL implementation. A single lock around the rows makes every
/// operation atomic, so concurrent dismissals race exactly as they do
/// against the database's conditional update.
#[derive(Default)]
pub struct MemoryTriggerStore {
    rows: Mutex<Vec<StoredTrigger>>,
    next_id: Mutex<DbId>,
}

impl MemoryTriggerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a ringing trigger directly, bypassing the window check.
    /// Test seeding helper.
    pub fn seed_ringing(&self, alarm_id: DbId, triggered_at: Timestamp) -> TriggerSnapshot {
        let trigger_id = self.allocate_id();
        self.rows.lock().unwrap().push(StoredTrigger {
            trigger_id,
            alarm_id,
            status: TriggerStatus::Ringing,
            triggered_at,
            dismissed_by: None,
        });
        TriggerSnapshot {
            trigger_id,
            alarm_id,
            triggered_at,
        }
    }

    /// Current status of a trigger, if it exists.
    pub fn status(&self, trigger_id: DbId) -> Option<TriggerStatus> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.trigger_id == trigger_id)
            .map(|t| t.status)
    }

    /// Who dismissed a trigger, if anyone has.
    pub fn dismissed_by(&self, trigger_id: DbId) -> Option<DbId> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.trigger_id == trigger_id)
            .and_then(|t| t.dismissed_by)
    }

    /// Number of ringing triggers for an alarm.
    pub fn ringing_count(&self, alarm_id: DbId) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.alarm_id == alarm_id && t.status == TriggerStatus::Ringing)
            .count()
    }

    fn allocate_id(&self) -> DbId {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        *next
    }
}

#[async_trait]
impl TriggerStore for MemoryTriggerStore {
    async fn insert_trigger(
        &self,
        alarm_id: DbId,
        window: Duration,
    ) -> Result<InsertOutcome, StoreUnavailable> {
        let now = Utc::now();
        let cutoff = now - chrono::Duration::from_std(window).unwrap_or(chrono::Duration::zero());
        let trigger_id = self.allocate_id();

        let mut rows = self.rows.lock().unwrap();
        let recent = rows.iter().any(|t| {
            t.alarm_id == alarm_id
                && (t.status == TriggerStatus::Ringing || t.triggered_at > cutoff)
        });
        if recent {
            return Ok(InsertOutcome::AlreadyExists);
        }

        rows.push(StoredTrigger {
            trigger_id,
            alarm_id,
            status: TriggerStatus::Ringing,
            triggered_at: now,
            dismissed_by: None,
        });
        Ok(InsertOutcome::Inserted(TriggerSnapshot {
            trigger_id,
            alarm_id,
            triggered_at: now,
        }))
    }

    async fn dismiss_trigger(
        &self,
        trigger_id: DbId,
        by_user: DbId,
    ) -> Result<DismissOutcome, StoreUnavailable> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|t| t.trigger_id == trigger_id) else {
            return Ok(DismissOutcome::NotApplied);
        };
        if row.status != TriggerStatus::Ringing {
            return Ok(DismissOutcome::NotApplied);
        }
        row.status = TriggerStatus::Dismissed;
        row.dismissed_by = Some(by_user);
        Ok(DismissOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const WINDOW: Duration = Duration::from_secs(120);

    #[tokio::test]
    async fn insert_then_duplicate_within_window_is_skipped() {
        let store = MemoryTriggerStore::new();

        let first = store.insert_trigger(1, WINDOW).await.unwrap();
        assert_matches!(first, InsertOutcome::Inserted(_));

        let second = store.insert_trigger(1, WINDOW).await.unwrap();
        assert_matches!(second, InsertOutcome::AlreadyExists);

        assert_eq!(store.ringing_count(1), 1);
    }

    #[tokio::test]
    async fn at_most_one_ringing_trigger_per_alarm() {
        let store = MemoryTriggerStore::new();

        // Even with a zero window, a still-ringing trigger blocks a new one.
        store.insert_trigger(1, Duration::ZERO).await.unwrap();
        let second = store.insert_trigger(1, Duration::ZERO).await.unwrap();

        assert_matches!(second, InsertOutcome::AlreadyExists);
        assert_eq!(store.ringing_count(1), 1);
    }

    #[tokio::test]
    async fn different_alarms_do_not_block_each_other() {
        let store = MemoryTriggerStore::new();

        assert_matches!(
            store.insert_trigger(1, WINDOW).await.unwrap(),
            InsertOutcome::Inserted(_)
        );
        assert_matches!(
            store.insert_trigger(2, WINDOW).await.unwrap(),
            InsertOutcome::Inserted(_)
        );
    }

    #[tokio::test]
    async fn exactly_one_dismissal_applies() {
        let store = MemoryTriggerStore::new();
        let snap = store.seed_ringing(1, Utc::now());

        let a = store.dismiss_trigger(snap.trigger_id, 10).await.unwrap();
        let b = store.dismiss_trigger(snap.trigger_id, 11).await.unwrap();
        let c = store.dismiss_trigger(snap.trigger_id, 12).await.unwrap();

        let applied = [a, b, c]
            .iter()
            .filter(|o| **o == DismissOutcome::Applied)
            .count();
        assert_eq!(applied, 1);
        assert_eq!(store.status(snap.trigger_id), Some(TriggerStatus::Dismissed));
        assert_eq!(store.dismissed_by(snap.trigger_id), Some(10));
    }

    #[tokio::test]
    async fn dismissing_unknown_trigger_is_not_applied() {
        let store = MemoryTriggerStore::new();
        let outcome = store.dismiss_trigger(999, 1).await.unwrap();
        assert_eq!(outcome, DismissOutcome::NotApplied);
    }
}
