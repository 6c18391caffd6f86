//! Repository for the `alarm_triggers` table.
//!
//! The two conditional statements in here carry the protocol's
//! correctness guarantees: [`TriggerRepo::insert_if_absent`] enforces the
//! trailing idempotency window against overlapping probe invocations, and
//! [`TriggerRepo::dismiss`] performs the at-most-once `ringing ->
//! dismissed` transition under concurrent attempts.

use std::time::Duration;

use sqlx::PgPool;

use hearth_core::types::DbId;

use crate::models::trigger::{ActiveTrigger, AlarmTrigger};

/// Column list for `alarm_triggers` queries.
const COLUMNS: &str = "id, alarm_id, status, triggered_at, dismissed_by, dismissed_at";

/// Provides trigger lifecycle operations.
pub struct TriggerRepo;

impl TriggerRepo {
    /// Insert a ringing trigger for an alarm unless one already exists
    /// within the trailing `window`.
    ///
    /// Returns the inserted row, or `None` when the insert was skipped:
    /// either a trigger was fired for this alarm within the window
    /// (status regardless), or a concurrent insert won the partial unique
    /// index race on `status = 'ringing'`. Both cases mean "already
    /// handled" and callers proceed silently.
    pub async fn insert_if_absent(
        pool: &PgPool,
        alarm_id: DbId,
        window: Duration,
    ) -> Result<Option<AlarmTrigger>, sqlx::Error> {
        let query = format!(
            "INSERT INTO alarm_triggers (alarm_id, status) \
             SELECT $1, 'ringing' \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM alarm_triggers \
                 WHERE alarm_id = $1 \
                   AND (status = 'ringing' \
                        OR triggered_at > NOW() - ($2::BIGINT * INTERVAL '1 second')) \
             ) \
             ON CONFLICT DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AlarmTrigger>(&query)
            .bind(alarm_id)
            .bind(window.as_secs() as i64)
            .fetch_optional(pool)
            .await
    }

    /// Conditionally dismiss a trigger.
    ///
    /// Returns `true` when this call performed the `ringing -> dismissed`
    /// transition, `false` when another party already had. The `WHERE
    /// status = 'ringing'` guard makes the transition atomic at the store
    /// layer: among any set of concurrent attempts exactly one observes
    /// `true`.
    pub async fn dismiss(
        pool: &PgPool,
        trigger_id: DbId,
        by_user: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE alarm_triggers \
             SET status = 'dismissed', dismissed_by = $2, dismissed_at = NOW() \
             WHERE id = $1 AND status = 'ringing'",
        )
        .bind(trigger_id)
        .bind(by_user)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Fetch a trigger by id.
    pub async fn get(pool: &PgPool, trigger_id: DbId) -> Result<Option<AlarmTrigger>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM alarm_triggers WHERE id = $1");
        sqlx::query_as::<_, AlarmTrigger>(&query)
            .bind(trigger_id)
            .fetch_optional(pool)
            .await
    }

    /// The room an alarm trigger belongs to, for membership checks.
    pub async fn room_id(pool: &PgPool, trigger_id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT a.room_id FROM alarm_triggers t \
             JOIN alarms a ON a.id = t.alarm_id \
             WHERE t.id = $1",
        )
        .bind(trigger_id)
        .fetch_optional(pool)
        .await
    }

    /// List ringing triggers for a room, joined with the alarm fields
    /// clients need to resolve their ring role.
    pub async fn active_for_room(
        pool: &PgPool,
        room_id: DbId,
    ) -> Result<Vec<ActiveTrigger>, sqlx::Error> {
        sqlx::query_as::<_, ActiveTrigger>(
            "SELECT t.id, t.alarm_id, t.status, t.triggered_at, \
                    a.room_id, a.title AS alarm_title, \
                    a.created_by AS alarm_created_by, a.owner_device_id \
             FROM alarm_triggers t \
             JOIN alarms a ON a.id = t.alarm_id \
             WHERE a.room_id = $1 AND t.status = 'ringing' \
             ORDER BY t.triggered_at",
        )
        .bind(room_id)
        .fetch_all(pool)
        .await
    }
}
