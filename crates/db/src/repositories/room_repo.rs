//! Repository for the `rooms` and `room_members` tables.

use sqlx::PgPool;

use hearth_core::types::DbId;

use crate::models::room::Room;
use crate::models::user::User;

/// Column list for `rooms` queries.
const COLUMNS: &str = "id, name, invite_code, created_by, created_at";

/// Provides room and membership operations.
pub struct RoomRepo;

impl RoomRepo {
    /// Create a room and enroll the creator as its first member.
    pub async fn create(
        pool: &PgPool,
        name: &str,
        invite_code: &str,
        created_by: DbId,
    ) -> Result<Room, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO rooms (name, invite_code, created_by) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        let room = sqlx::query_as::<_, Room>(&query)
            .bind(name)
            .bind(invite_code)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO room_members (room_id, user_id) VALUES ($1, $2)")
            .bind(room.id)
            .bind(created_by)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(room)
    }

    /// Fetch a room by id.
    pub async fn get(pool: &PgPool, room_id: DbId) -> Result<Option<Room>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM rooms WHERE id = $1");
        sqlx::query_as::<_, Room>(&query)
            .bind(room_id)
            .fetch_optional(pool)
            .await
    }

    /// Look up a room by its invite code.
    pub async fn find_by_invite(
        pool: &PgPool,
        invite_code: &str,
    ) -> Result<Option<Room>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM rooms WHERE invite_code = $1");
        sqlx::query_as::<_, Room>(&query)
            .bind(invite_code)
            .fetch_optional(pool)
            .await
    }

    /// Add a user to a room. Joining twice is a no-op.
    pub async fn add_member(pool: &PgPool, room_id: DbId, user_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO room_members (room_id, user_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(room_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// All member user ids of a room, for notification fan-out.
    pub async fn member_ids(pool: &PgPool, room_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT user_id FROM room_members WHERE room_id = $1 ORDER BY user_id")
            .bind(room_id)
            .fetch_all(pool)
            .await
    }

    /// All members of a room, joined with their user rows.
    pub async fn members(pool: &PgPool, room_id: DbId) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT u.id, u.display_name, u.created_at \
             FROM room_members m \
             JOIN users u ON u.id = m.user_id \
             WHERE m.room_id = $1 \
             ORDER BY m.joined_at",
        )
        .bind(room_id)
        .fetch_all(pool)
        .await
    }

    /// Whether a user belongs to a room. Membership is the authorization
    /// boundary for alarm CRUD and dismissal.
    pub async fn is_member(pool: &PgPool, room_id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM room_members WHERE room_id = $1 AND user_id = $2",
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0) > 0)
    }
}
