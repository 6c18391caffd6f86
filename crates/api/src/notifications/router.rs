//! Event-to-device push routing.
//!
//! [`PushRouter`] subscribes to the room event bus and pushes each
//! room-scoped event to the WebSocket connections of that room's
//! members. This is the server half of the trigger change feed: the
//! frames it emits are what a device turns into `TriggerChange`s for its
//! ring sessions. Notification *rows* are written by whoever emits the
//! event (the scheduler probe on firing, the dismissal handler on
//! dismissal); this router only does transport.

use std::sync::Arc;

use axum::extract::ws::Message;
use hearth_core::kinds::{EVENT_ALARM_DISMISSED, EVENT_ALARM_TRIGGERED, EVENT_REMINDER_DUE};
use hearth_db::repositories::RoomRepo;
use hearth_db::DbPool;
use hearth_events::RoomEvent;
use tokio::sync::broadcast;

use crate::ws::WsManager;

/// Routes room events to member devices over WebSocket.
pub struct PushRouter {
    pool: DbPool,
    ws_manager: Arc<WsManager>,
}

impl PushRouter {
    /// Create a new router with the given database pool and WebSocket manager.
    pub fn new(pool: DbPool, ws_manager: Arc<WsManager>) -> Self {
        Self { pool, ws_manager }
    }

    /// Run the main routing loop.
    ///
    /// Subscribes to the event bus via `receiver` and processes each event.
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](hearth_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<RoomEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to push event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Push router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, push router shutting down");
                    break;
                }
            }
        }
    }

    /// Push a single event to all members of its room.
    async fn route_event(&self, event: &RoomEvent) -> Result<(), sqlx::Error> {
        let Some(frame_type) = frame_type(&event.event_type) else {
            tracing::debug!(event_type = %event.event_type, "No push frame for event type");
            return Ok(());
        };
        let Some(room_id) = event.room_id else {
            return Ok(());
        };

        let members = RoomRepo::member_ids(&self.pool, room_id).await?;

        let frame = serde_json::json!({
            "type": frame_type,
            "room_id": room_id,
            "payload": event.payload,
            "timestamp": event.timestamp,
        });
        let message = Message::Text(frame.to_string().into());

        let mut delivered = 0;
        for user_id in members {
            delivered += self.ws_manager.send_to_user(user_id, message.clone()).await;
        }
        tracing::debug!(
            event_type = %event.event_type,
            room_id,
            connections = delivered,
            "Pushed event to room members"
        );

        Ok(())
    }
}

/// The WebSocket frame type for a bus event, if it is pushed at all.
fn frame_type(event_type: &str) -> Option<&'static str> {
    match event_type {
        EVENT_ALARM_TRIGGERED => Some("trigger.ringing"),
        EVENT_ALARM_DISMISSED => Some("trigger.dismissed"),
        EVENT_REMINDER_DUE => Some("reminder.due"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_event_types_map_to_frames() {
        assert_eq!(frame_type(EVENT_ALARM_TRIGGERED), Some("trigger.ringing"));
        assert_eq!(frame_type(EVENT_ALARM_DISMISSED), Some("trigger.dismissed"));
        assert_eq!(frame_type(EVENT_REMINDER_DUE), Some("reminder.due"));
    }

    #[test]
    fn unknown_event_types_are_not_pushed() {
        assert_eq!(frame_type("room.created"), None);
    }
}
