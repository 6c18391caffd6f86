//! Notification entity model.

use serde::Serialize;
use sqlx::FromRow;

use hearth_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
///
/// `kind` is one of the `hearth_core::kinds::NOTIFY_*` constants; at most
/// one of `trigger_id` / `reminder_id` is set, matching the kind.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub room_id: DbId,
    pub kind: String,
    pub body: String,
    pub trigger_id: Option<DbId>,
    pub reminder_id: Option<DbId>,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}
