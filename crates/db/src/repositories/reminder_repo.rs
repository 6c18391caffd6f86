//! Repository for the `reminders` table.

use sqlx::PgPool;

use hearth_core::types::{DbId, Timestamp};

use crate::models::reminder::Reminder;

/// Column list for `reminders` queries.
const COLUMNS: &str =
    "id, room_id, title, due_at, is_done, notified_at, created_by, created_at";

/// Provides CRUD and due-claim operations for reminders.
pub struct ReminderRepo;

impl ReminderRepo {
    /// Create a reminder.
    pub async fn create(
        pool: &PgPool,
        room_id: DbId,
        title: &str,
        due_at: Timestamp,
        created_by: DbId,
    ) -> Result<Reminder, sqlx::Error> {
        let query = format!(
            "INSERT INTO reminders (room_id, title, due_at, created_by) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reminder>(&query)
            .bind(room_id)
            .bind(title)
            .bind(due_at)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    /// List a room's reminders, soonest due first.
    pub async fn list_for_room(pool: &PgPool, room_id: DbId) -> Result<Vec<Reminder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reminders WHERE room_id = $1 ORDER BY due_at");
        sqlx::query_as::<_, Reminder>(&query)
            .bind(room_id)
            .fetch_all(pool)
            .await
    }

    /// Claim every due, not-yet-notified reminder by stamping
    /// `notified_at`, returning the claimed rows.
    ///
    /// The conditional `WHERE notified_at IS NULL` makes delivery
    /// exactly-once across overlapping probe invocations: a reminder is
    /// returned to exactly one caller.
    pub async fn claim_due(pool: &PgPool) -> Result<Vec<Reminder>, sqlx::Error> {
        let query = format!(
            "UPDATE reminders SET notified_at = NOW() \
             WHERE due_at <= NOW() AND notified_at IS NULL AND is_done = false \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reminder>(&query).fetch_all(pool).await
    }

    /// Mark a reminder done. Returns `true` if it existed and was open.
    pub async fn mark_done(pool: &PgPool, reminder_id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE reminders SET is_done = true WHERE id = $1 AND is_done = false")
                .bind(reminder_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The room a reminder belongs to, for membership checks.
    pub async fn room_id(pool: &PgPool, reminder_id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT room_id FROM reminders WHERE id = $1")
            .bind(reminder_id)
            .fetch_optional(pool)
            .await
    }
}
