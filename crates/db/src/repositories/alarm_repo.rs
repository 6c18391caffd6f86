//! Repository for the `alarms` table.

use sqlx::PgPool;

use hearth_core::types::DbId;

use crate::models::alarm::{Alarm, UpdateAlarm};

/// Column list for `alarms` queries.
const COLUMNS: &str = "id, room_id, title, ring_at_minutes, days, is_active, \
                       created_by, owner_device_id, created_at, updated_at";

/// Provides CRUD operations for alarms.
pub struct AlarmRepo;

impl AlarmRepo {
    /// Create an alarm, binding the creating client's device as the
    /// owning device. Returns the full row.
    pub async fn create(
        pool: &PgPool,
        room_id: DbId,
        title: &str,
        ring_at_minutes: i32,
        days: i32,
        created_by: DbId,
        owner_device_id: Option<&str>,
    ) -> Result<Alarm, sqlx::Error> {
        let query = format!(
            "INSERT INTO alarms \
                 (room_id, title, ring_at_minutes, days, created_by, owner_device_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Alarm>(&query)
            .bind(room_id)
            .bind(title)
            .bind(ring_at_minutes)
            .bind(days)
            .bind(created_by)
            .bind(owner_device_id)
            .fetch_one(pool)
            .await
    }

    /// Fetch an alarm by id.
    pub async fn get(pool: &PgPool, alarm_id: DbId) -> Result<Option<Alarm>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM alarms WHERE id = $1");
        sqlx::query_as::<_, Alarm>(&query)
            .bind(alarm_id)
            .fetch_optional(pool)
            .await
    }

    /// List a room's alarms, newest first.
    pub async fn list_for_room(pool: &PgPool, room_id: DbId) -> Result<Vec<Alarm>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alarms WHERE room_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Alarm>(&query)
            .bind(room_id)
            .fetch_all(pool)
            .await
    }

    /// List every active alarm across all rooms, for the scheduler probe.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Alarm>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM alarms WHERE is_active = true");
        sqlx::query_as::<_, Alarm>(&query).fetch_all(pool).await
    }

    /// Apply a partial update. Absent fields keep their current value.
    ///
    /// Returns the updated row, or `None` if the alarm does not exist.
    pub async fn update(
        pool: &PgPool,
        alarm_id: DbId,
        changes: &UpdateAlarm,
    ) -> Result<Option<Alarm>, sqlx::Error> {
        let query = format!(
            "UPDATE alarms SET \
                 title = COALESCE($2, title), \
                 ring_at_minutes = COALESCE($3, ring_at_minutes), \
                 days = COALESCE($4, days), \
                 is_active = COALESCE($5, is_active), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Alarm>(&query)
            .bind(alarm_id)
            .bind(changes.title.as_deref())
            .bind(changes.ring_at_minutes)
            .bind(changes.days)
            .bind(changes.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Deactivate an alarm (the normal-flow alternative to deletion).
    ///
    /// Returns `true` if the alarm existed and was active.
    pub async fn deactivate(pool: &PgPool, alarm_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE alarms SET is_active = false, updated_at = NOW() \
             WHERE id = $1 AND is_active = true",
        )
        .bind(alarm_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
