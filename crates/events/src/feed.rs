//! Typed trigger change feed.
//!
//! Where [`EventBus`](crate::bus::EventBus) carries every domain event for
//! persistence and notification routing, [`TriggerFeed`] is the narrow,
//! typed channel a client ring session cares about: one [`TriggerChange`]
//! per observed state of a trigger row. On a device the feed is fed by
//! whatever transport the client uses (the WebSocket frames pushed by the
//! API, or a poll loop); in-process consumers subscribe directly.
//!
//! Delivery is at-least-once: a reconnecting transport may replay the
//! current row state, so consumers must treat repeated changes as no-ops.

use hearth_core::ring::TriggerStatus;
use hearth_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default buffer capacity for the feed channel.
const DEFAULT_CAPACITY: usize = 256;

/// A snapshot of one trigger row as observed through the change feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerChange {
    pub trigger_id: DbId,
    pub alarm_id: DbId,
    pub room_id: DbId,
    pub status: TriggerStatus,
    pub triggered_at: Timestamp,
    /// Set once the trigger reaches `Dismissed`.
    pub dismissed_by: Option<DbId>,
}

impl TriggerChange {
    pub fn is_dismissed(&self) -> bool {
        self.status == TriggerStatus::Dismissed
    }
}

/// Broadcast channel of [`TriggerChange`]s.
///
/// Cloneable handle; every subscriber receives every published change.
#[derive(Clone)]
pub struct TriggerFeed {
    sender: broadcast::Sender<TriggerChange>,
}

impl TriggerFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a change to all current subscribers. With zero subscribers
    /// the change is dropped, which is fine: nobody had a session open.
    pub fn publish(&self, change: TriggerChange) {
        let _ = self.sender.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TriggerChange> {
        self.sender.subscribe()
    }
}

impl Default for TriggerFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn change(trigger_id: DbId, status: TriggerStatus) -> TriggerChange {
        TriggerChange {
            trigger_id,
            alarm_id: 1,
            room_id: 1,
            status,
            triggered_at: Utc::now(),
            dismissed_by: None,
        }
    }

    #[tokio::test]
    async fn subscribers_see_published_changes() {
        let feed = TriggerFeed::default();
        let mut rx = feed.subscribe();

        feed.publish(change(5, TriggerStatus::Ringing));

        let received = rx.recv().await.expect("should receive the change");
        assert_eq!(received.trigger_id, 5);
        assert!(!received.is_dismissed());
    }

    #[tokio::test]
    async fn every_subscriber_gets_every_change() {
        let feed = TriggerFeed::default();
        let mut rx1 = feed.subscribe();
        let mut rx2 = feed.subscribe();

        feed.publish(change(5, TriggerStatus::Dismissed));

        assert!(rx1.recv().await.unwrap().is_dismissed());
        assert!(rx2.recv().await.unwrap().is_dismissed());
    }

    #[test]
    fn publish_without_subscribers_is_a_noop() {
        let feed = TriggerFeed::default();
        feed.publish(change(5, TriggerStatus::Ringing));
    }
}
