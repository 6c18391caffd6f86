//! Room and membership entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use hearth_core::types::{DbId, Timestamp};

/// A row from the `rooms` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Room {
    pub id: DbId,
    pub name: String,
    pub invite_code: String,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

/// A row from the `room_members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RoomMember {
    pub room_id: DbId,
    pub user_id: DbId,
    pub joined_at: Timestamp,
}

/// DTO for creating a room.
#[derive(Debug, Deserialize)]
pub struct CreateRoom {
    pub name: String,
}

/// DTO for joining a room by invite code.
#[derive(Debug, Deserialize)]
pub struct JoinRoom {
    pub invite_code: String,
}
