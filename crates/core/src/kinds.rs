//! Well-known event type and notification kind names.
//!
//! Event types are the dot-separated names published on the in-process
//! bus and persisted to the `events` table. Notification kinds are stored
//! in `notifications.kind` and interpreted by clients when rendering the
//! notification feed.

/// A trigger row was inserted; the alarm is ringing.
pub const EVENT_ALARM_TRIGGERED: &str = "alarm.triggered";

/// A trigger row transitioned to dismissed.
pub const EVENT_ALARM_DISMISSED: &str = "alarm.dismissed";

/// A one-shot reminder came due.
pub const EVENT_REMINDER_DUE: &str = "reminder.due";

/// Notification kind: a roommate's alarm is ringing and dismissible.
pub const NOTIFY_ALARM_RINGING: &str = "alarm_ringing";

/// Notification kind: an alarm was dismissed.
pub const NOTIFY_ALARM_DISMISSED: &str = "alarm_dismissed";

/// Notification kind: a reminder came due.
pub const NOTIFY_REMINDER_DUE: &str = "reminder_due";
