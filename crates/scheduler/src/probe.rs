//! Due-alarm evaluation and idempotent trigger insertion.
//!
//! Each tick the probe walks the active alarms, fires the due ones
//! through [`TriggerRepo::insert_if_absent`], and claims due reminders
//! through [`ReminderRepo::claim_due`]. Both statements are conditional,
//! so overlapping probe invocations (a slow tick overtaken by the next,
//! or two probe processes) cannot double-fire: the loser of either race
//! observes a skip and moves on.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use hearth_core::kinds::{
    EVENT_ALARM_TRIGGERED, EVENT_REMINDER_DUE, NOTIFY_ALARM_RINGING, NOTIFY_REMINDER_DUE,
};
use hearth_core::recurrence::is_due;
use hearth_core::types::DbId;
use hearth_db::models::alarm::Alarm;
use hearth_db::models::reminder::Reminder;
use hearth_db::models::trigger::AlarmTrigger;
use hearth_db::repositories::{AlarmRepo, NotificationRepo, ReminderRepo, RoomRepo, TriggerRepo};
use hearth_db::DbPool;
use hearth_events::{EventBus, RoomEvent};

use crate::config::SchedulerConfig;

/// Background service that fires due alarms and reminders.
pub struct SchedulerProbe {
    pool: DbPool,
    bus: Arc<EventBus>,
    config: SchedulerConfig,
}

impl SchedulerProbe {
    pub fn new(pool: DbPool, bus: Arc<EventBus>, config: SchedulerConfig) -> Self {
        Self { pool, bus, config }
    }

    /// Run the probe loop.
    ///
    /// Evaluates due alarms and reminders on the configured cadence. The
    /// loop exits gracefully when the provided [`CancellationToken`] is
    /// cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.probe_interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Scheduler probe cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        tracing::error!(error = %e, "Scheduler probe tick failed");
                    }
                }
            }
        }
    }

    /// One probe pass: fire due alarms, then deliver due reminders.
    pub async fn tick(&self) -> Result<(), sqlx::Error> {
        let fired = self.fire_due_alarms().await?;
        let delivered = self.deliver_due_reminders().await?;

        if fired > 0 || delivered > 0 {
            tracing::info!(
                alarms_fired = fired,
                reminders_delivered = delivered,
                "Scheduler probe tick"
            );
        }

        Ok(())
    }

    /// Insert a trigger for every due alarm, skipping alarms already
    /// handled within the idempotency window.
    async fn fire_due_alarms(&self) -> Result<usize, sqlx::Error> {
        let now = Utc::now();
        let alarms = AlarmRepo::list_active(&self.pool).await?;
        let mut fired = 0;

        for alarm in alarms
            .iter()
            .filter(|a| is_due(a.ring_at_minutes, a.days, now))
        {
            match TriggerRepo::insert_if_absent(&self.pool, alarm.id, self.config.dedup_window)
                .await?
            {
                Some(trigger) => {
                    self.fan_out_trigger(alarm, &trigger).await?;
                    fired += 1;
                }
                None => {
                    // Already handled: a recent trigger exists or a
                    // concurrent probe won the insert. Not retried.
                    tracing::debug!(alarm_id = alarm.id, "Trigger already exists, skipping");
                }
            }
        }

        Ok(fired)
    }

    /// Notify every room member that an alarm is ringing and publish the
    /// `alarm.triggered` event.
    async fn fan_out_trigger(
        &self,
        alarm: &Alarm,
        trigger: &AlarmTrigger,
    ) -> Result<(), sqlx::Error> {
        let members = RoomRepo::member_ids(&self.pool, alarm.room_id).await?;
        let body = format!("Alarm \"{}\" is ringing", alarm.title);

        for user_id in &members {
            self.create_notification(
                *user_id,
                alarm.room_id,
                NOTIFY_ALARM_RINGING,
                &body,
                Some(trigger.id),
                None,
            )
            .await;
        }

        tracing::info!(
            alarm_id = alarm.id,
            trigger_id = trigger.id,
            room_id = alarm.room_id,
            members = members.len(),
            "Alarm fired"
        );

        self.bus.publish(
            RoomEvent::new(EVENT_ALARM_TRIGGERED)
                .with_room(alarm.room_id)
                .with_payload(serde_json::json!({
                    "trigger_id": trigger.id,
                    "alarm_id": alarm.id,
                    "alarm_title": alarm.title,
                    "alarm_created_by": alarm.created_by,
                    "owner_device_id": alarm.owner_device_id,
                    "triggered_at": trigger.triggered_at,
                })),
        );

        Ok(())
    }

    /// Claim and deliver every due reminder. `claim_due` stamps
    /// `notified_at` conditionally, so each reminder is delivered exactly
    /// once across overlapping invocations.
    async fn deliver_due_reminders(&self) -> Result<usize, sqlx::Error> {
        let due = ReminderRepo::claim_due(&self.pool).await?;

        for reminder in &due {
            self.fan_out_reminder(reminder).await?;
        }

        Ok(due.len())
    }

    async fn fan_out_reminder(&self, reminder: &Reminder) -> Result<(), sqlx::Error> {
        let members = RoomRepo::member_ids(&self.pool, reminder.room_id).await?;
        let body = format!("Reminder: {}", reminder.title);

        for user_id in &members {
            self.create_notification(
                *user_id,
                reminder.room_id,
                NOTIFY_REMINDER_DUE,
                &body,
                None,
                Some(reminder.id),
            )
            .await;
        }

        tracing::info!(
            reminder_id = reminder.id,
            room_id = reminder.room_id,
            members = members.len(),
            "Reminder delivered"
        );

        self.bus.publish(
            RoomEvent::new(EVENT_REMINDER_DUE)
                .with_room(reminder.room_id)
                .with_payload(serde_json::json!({
                    "reminder_id": reminder.id,
                    "title": reminder.title,
                    "due_at": reminder.due_at,
                })),
        );

        Ok(())
    }

    /// Insert one notification row, absorbing failures: a missed
    /// notification must not abort the rest of the fan-out.
    async fn create_notification(
        &self,
        user_id: DbId,
        room_id: DbId,
        kind: &str,
        body: &str,
        trigger_id: Option<DbId>,
        reminder_id: Option<DbId>,
    ) {
        if let Err(e) = NotificationRepo::create(
            &self.pool,
            user_id,
            room_id,
            kind,
            body,
            trigger_id,
            reminder_id,
        )
        .await
        {
            tracing::error!(user_id, room_id, kind, error = %e, "Failed to create notification");
        }
    }
}
