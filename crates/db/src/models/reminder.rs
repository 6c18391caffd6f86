//! Reminder entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use hearth_core::types::{DbId, Timestamp};

/// A row from the `reminders` table: a one-shot dated note delivered to
/// every room member when it comes due.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reminder {
    pub id: DbId,
    pub room_id: DbId,
    pub title: String,
    pub due_at: Timestamp,
    pub is_done: bool,
    pub notified_at: Option<Timestamp>,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

/// DTO for creating a reminder.
#[derive(Debug, Deserialize)]
pub struct CreateReminder {
    pub title: String,
    pub due_at: Timestamp,
}
