//! Alarm entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use hearth_core::types::{DbId, Timestamp};

/// A row from the `alarms` table.
///
/// `owner_device_id` is bound once at creation from the creating client's
/// device header and never migrates automatically; when it is `NULL` no
/// device rings audibly for this alarm.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Alarm {
    pub id: DbId,
    pub room_id: DbId,
    pub title: String,
    /// Minutes since midnight UTC.
    pub ring_at_minutes: i32,
    /// Weekday bitmask, bit 0 = Monday.
    pub days: i32,
    pub is_active: bool,
    pub created_by: DbId,
    pub owner_device_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an alarm.
#[derive(Debug, Deserialize)]
pub struct CreateAlarm {
    pub title: String,
    pub ring_at_minutes: i32,
    pub days: i32,
}

/// DTO for updating an alarm. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateAlarm {
    pub title: Option<String>,
    pub ring_at_minutes: Option<i32>,
    pub days: Option<i32>,
    pub is_active: Option<bool>,
}
