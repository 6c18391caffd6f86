//! Repository for the `events` table.

use sqlx::PgPool;

use hearth_core::types::DbId;

use crate::models::event::Event;

/// Column list for `events` queries.
const COLUMNS: &str = "id, event_type, room_id, actor_user_id, payload, created_at";

/// Provides read/write operations for persisted domain events.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new event row, returning the generated ID.
    pub async fn insert(
        pool: &PgPool,
        event_type: &str,
        room_id: Option<DbId>,
        actor_user_id: Option<DbId>,
        payload: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO events (event_type, room_id, actor_user_id, payload) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(event_type)
        .bind(room_id)
        .bind(actor_user_id)
        .bind(payload)
        .fetch_one(pool)
        .await
    }

    /// List recent events for a room, newest first.
    pub async fn list_for_room(
        pool: &PgPool,
        room_id: DbId,
        limit: i64,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events \
             WHERE room_id = $1 ORDER BY created_at DESC LIMIT $2"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(room_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
