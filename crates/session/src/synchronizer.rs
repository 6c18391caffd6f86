//! Cross-device dismissal propagation.
//!
//! [`DismissalSynchronizer`] is the consumer side of the trigger change
//! feed: a task bound to one session that watches for its trigger to
//! reach `dismissed` and then runs the session's ordinary teardown path.
//! Feed delivery is at-least-once, so the handler leans on the session's
//! re-entrancy guard: the device that performed the dismissal sees its
//! own echoed change and does nothing.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use hearth_events::TriggerChange;

use crate::controller::RingSession;

/// Watches the change feed on behalf of one ring session.
pub struct DismissalSynchronizer;

impl DismissalSynchronizer {
    /// Spawn the watch task. It ends when the session's trigger is
    /// dismissed or the feed closes.
    pub fn spawn(
        receiver: broadcast::Receiver<TriggerChange>,
        session: Arc<RingSession>,
    ) -> JoinHandle<()> {
        tokio::spawn(Self::run(receiver, session))
    }

    /// Consume changes until the watched trigger is dismissed.
    pub async fn run(mut receiver: broadcast::Receiver<TriggerChange>, session: Arc<RingSession>) {
        loop {
            match receiver.recv().await {
                Ok(change) => {
                    if change.trigger_id != session.trigger_id() {
                        continue;
                    }
                    if change.is_dismissed() {
                        tracing::debug!(
                            trigger_id = change.trigger_id,
                            dismissed_by = ?change.dismissed_by,
                            "Dismissal observed on change feed"
                        );
                        session.handle_remote_dismissal().await;
                        break;
                    }
                    // A replayed `ringing` state (feed reconnect) carries
                    // no new information.
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // At-least-once feed: the terminal state will be
                    // re-delivered, so dropped intermediate changes are
                    // safe to skip.
                    tracing::warn!(skipped = n, "Dismissal synchronizer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!("Trigger change feed closed");
                    break;
                }
            }
            if session.is_terminal() {
                break;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use chrono::Utc;

    use crate::alert::LayeredAlerter;
    use crate::alert::{LocalNotification, Notifier};
    use crate::controller::SessionParams;
    use crate::store::{MemoryTriggerStore, TriggerStore};
    use hearth_core::device::RingRole;
    use hearth_core::ring::{RingConfig, TriggerStatus};
    use hearth_core::types::DbId;
    use hearth_events::TriggerFeed;

    struct NullNotifier;
    impl Notifier for NullNotifier {
        fn notify(&self, _note: LocalNotification) {}
    }

    fn observer_session(
        store: &Arc<MemoryTriggerStore>,
        alarm_id: DbId,
        user_id: DbId,
    ) -> (Arc<RingSession>, Arc<AtomicUsize>) {
        let trigger = store.seed_ringing(alarm_id, Utc::now());
        let session = RingSession::new(
            SessionParams {
                trigger,
                alarm_title: "Wake up".to_string(),
                role: RingRole::Observer,
                user_id,
                config: RingConfig::default(),
            },
            Arc::clone(store) as Arc<dyn TriggerStore>,
            Arc::new(LayeredAlerter::silent()),
            Arc::new(NullNotifier),
        );
        let terminal_count = Arc::new(AtomicUsize::new(0));
        let tc = Arc::clone(&terminal_count);
        session.on_terminal(move || {
            tc.fetch_add(1, Ordering::SeqCst);
        });
        (session, terminal_count)
    }

    fn change(trigger_id: DbId, status: TriggerStatus, by: Option<DbId>) -> TriggerChange {
        TriggerChange {
            trigger_id,
            alarm_id: 10,
            room_id: 1,
            status,
            triggered_at: Utc::now(),
            dismissed_by: by,
        }
    }

    async fn finished(handle: JoinHandle<()>) {
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("synchronizer should finish")
            .expect("synchronizer should not panic");
    }

    #[tokio::test]
    async fn remote_dismissal_tears_down_session() {
        let store = Arc::new(MemoryTriggerStore::new());
        let (session, terminal_count) = observer_session(&store, 10, 2);
        session.start().await;

        let feed = TriggerFeed::default();
        let handle = DismissalSynchronizer::spawn(feed.subscribe(), Arc::clone(&session));

        feed.publish(change(
            session.trigger_id(),
            TriggerStatus::Dismissed,
            Some(1),
        ));
        finished(handle).await;

        assert!(session.is_terminal());
        assert_eq!(terminal_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn own_echo_is_not_double_processed() {
        let store = Arc::new(MemoryTriggerStore::new());
        let (session, terminal_count) = observer_session(&store, 10, 2);
        session.start().await;

        let feed = TriggerFeed::default();
        let handle = DismissalSynchronizer::spawn(feed.subscribe(), Arc::clone(&session));

        // This device dismisses first; the UI callback fires here.
        session.dismiss(2).await;
        assert_eq!(terminal_count.load(Ordering::SeqCst), 1);

        // The store change echoes back through the feed.
        feed.publish(change(
            session.trigger_id(),
            TriggerStatus::Dismissed,
            Some(2),
        ));
        finished(handle).await;

        // Still exactly one UI notification.
        assert_eq!(terminal_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn changes_for_other_triggers_are_ignored() {
        let store = Arc::new(MemoryTriggerStore::new());
        let (session, terminal_count) = observer_session(&store, 10, 2);
        session.start().await;

        let feed = TriggerFeed::default();
        let handle = DismissalSynchronizer::spawn(feed.subscribe(), Arc::clone(&session));

        feed.publish(change(9999, TriggerStatus::Dismissed, Some(1)));
        feed.publish(change(
            session.trigger_id(),
            TriggerStatus::Dismissed,
            Some(1),
        ));
        finished(handle).await;

        assert!(session.is_terminal());
        assert_eq!(terminal_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn replayed_ringing_state_does_not_tear_down() {
        let store = Arc::new(MemoryTriggerStore::new());
        let (session, terminal_count) = observer_session(&store, 10, 2);
        session.start().await;

        let feed = TriggerFeed::default();
        let handle = DismissalSynchronizer::spawn(feed.subscribe(), Arc::clone(&session));

        // A reconnecting transport replays the current (ringing) state.
        feed.publish(change(session.trigger_id(), TriggerStatus::Ringing, None));
        feed.publish(change(session.trigger_id(), TriggerStatus::Ringing, None));
        tokio::task::yield_now().await;
        assert!(!session.is_terminal());
        assert_eq!(terminal_count.load(Ordering::SeqCst), 0);

        feed.publish(change(
            session.trigger_id(),
            TriggerStatus::Dismissed,
            Some(1),
        ));
        finished(handle).await;
        assert!(session.is_terminal());
    }
}
