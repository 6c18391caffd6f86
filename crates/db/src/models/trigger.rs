//! Alarm trigger entity models.

use serde::Serialize;
use sqlx::FromRow;

use hearth_core::ring::TriggerStatus;
use hearth_core::types::{DbId, Timestamp};

/// A row from the `alarm_triggers` table: one concrete firing of an
/// alarm.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlarmTrigger {
    pub id: DbId,
    pub alarm_id: DbId,
    pub status: String,
    pub triggered_at: Timestamp,
    pub dismissed_by: Option<DbId>,
    pub dismissed_at: Option<Timestamp>,
}

impl AlarmTrigger {
    pub fn is_ringing(&self) -> bool {
        self.status == TriggerStatus::Ringing.as_str()
    }
}

/// A ringing trigger joined with the alarm fields a client needs to
/// resolve its ring role and render the session.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActiveTrigger {
    pub id: DbId,
    pub alarm_id: DbId,
    pub status: String,
    pub triggered_at: Timestamp,
    pub room_id: DbId,
    pub alarm_title: String,
    pub alarm_created_by: DbId,
    pub owner_device_id: Option<String>,
}
