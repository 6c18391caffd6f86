//! End-to-end scenarios for the shared alarm protocol.
//!
//! These tests wire real sessions, the in-memory trigger store, and the
//! trigger change feed together the way a deployment does, with the test
//! body standing in for the transport that bridges store changes onto
//! each device's feed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use hearth_core::device::{resolve_ring_role, RingRole};
use hearth_core::ring::{RingConfig, TriggerStatus};
use hearth_core::types::DbId;
use hearth_events::{TriggerChange, TriggerFeed};
use hearth_session::{
    AlertStrategy, DismissOutcome, DismissalSynchronizer, LayeredAlerter, LocalNotification,
    MemoryTriggerStore, Notifier, RingSession, SessionParams, TriggerSnapshot, TriggerStore,
};

const ALARM_ID: DbId = 10;
const CREATOR: DbId = 1;
const ROOMMATE: DbId = 2;

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

struct CountingAudio {
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl CountingAudio {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl AlertStrategy for CountingAudio {
    fn name(&self) -> &'static str {
        "audio"
    }
    async fn start(&self) -> Result<(), hearth_session::alert::AlertFailure> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

struct NullNotifier;
impl Notifier for NullNotifier {
    fn notify(&self, _note: LocalNotification) {}
}

/// One simulated device: a session plus its audio double.
struct Device {
    session: Arc<RingSession>,
    audio: Arc<CountingAudio>,
    dismissals_seen: Arc<AtomicUsize>,
}

fn device(
    store: &Arc<MemoryTriggerStore>,
    trigger: TriggerSnapshot,
    user_id: DbId,
    device_id: &str,
    alarm_created_by: DbId,
    owner_device_id: Option<&str>,
) -> Device {
    let role = resolve_ring_role(user_id, device_id, alarm_created_by, owner_device_id);
    let audio = CountingAudio::new();
    let session = RingSession::new(
        SessionParams {
            trigger,
            alarm_title: "Wake up".to_string(),
            role,
            user_id,
            config: RingConfig::default(),
        },
        Arc::clone(store) as Arc<dyn TriggerStore>,
        Arc::new(LayeredAlerter::new(vec![
            audio.clone() as Arc<dyn AlertStrategy>
        ])),
        Arc::new(NullNotifier),
    );
    let dismissals_seen = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&dismissals_seen);
    session.on_terminal(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    Device {
        session,
        audio,
        dismissals_seen,
    }
}

fn dismissed_change(store: &MemoryTriggerStore, trigger: &TriggerSnapshot) -> TriggerChange {
    TriggerChange {
        trigger_id: trigger.trigger_id,
        alarm_id: trigger.alarm_id,
        room_id: 1,
        status: TriggerStatus::Dismissed,
        triggered_at: trigger.triggered_at,
        dismissed_by: store.dismissed_by(trigger.trigger_id),
    }
}

// ---------------------------------------------------------------------------
// Scenario: owner auto-dismisses, observer follows via the change feed
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn owner_auto_dismiss_propagates_to_silent_observer() {
    let store = Arc::new(MemoryTriggerStore::new());
    let trigger = store.seed_ringing(ALARM_ID, Utc::now());
    let feed = TriggerFeed::default();

    // Device "dev-A": the creator on the owning device.
    let dev_a = device(&store, trigger.clone(), CREATOR, "dev-A", CREATOR, Some("dev-A"));
    // Device "dev-B": a roommate in the same room.
    let dev_b = device(&store, trigger.clone(), ROOMMATE, "dev-B", CREATOR, Some("dev-A"));

    assert_eq!(dev_a.session.state(), hearth_core::ring::RingState::Idle);

    dev_a.session.start().await;
    dev_b.session.start().await;
    let sync_b = DismissalSynchronizer::spawn(feed.subscribe(), Arc::clone(&dev_b.session));

    // Owner rings audibly; observer is silent.
    assert_eq!(dev_a.audio.starts.load(Ordering::SeqCst), 1);
    assert_eq!(dev_b.audio.starts.load(Ordering::SeqCst), 0);

    // Three rings at the default 5s cadence, then auto-dismissal.
    tokio::time::sleep(Duration::from_secs(16)).await;
    assert_eq!(store.status(trigger.trigger_id), Some(TriggerStatus::Dismissed));
    assert_eq!(store.dismissed_by(trigger.trigger_id), Some(CREATOR));

    // The transport bridges the store change onto dev-B's feed.
    feed.publish(dismissed_change(&store, &trigger));
    tokio::time::timeout(Duration::from_secs(5), sync_b)
        .await
        .expect("observer should tear down")
        .unwrap();

    assert!(dev_a.session.is_terminal());
    assert!(dev_b.session.is_terminal());
    assert_eq!(dev_a.dismissals_seen.load(Ordering::SeqCst), 1);
    assert_eq!(dev_b.dismissals_seen.load(Ordering::SeqCst), 1);

    // The observer never produced audio, so there is nothing to stop.
    assert_eq!(dev_b.audio.starts.load(Ordering::SeqCst), 0);
    assert_eq!(dev_a.audio.stops.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Scenario: two devices dismiss within the same instant
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn near_simultaneous_dismissals_accept_exactly_one() {
    let store = Arc::new(MemoryTriggerStore::new());
    let trigger = store.seed_ringing(ALARM_ID, Utc::now());
    let feed = TriggerFeed::default();

    let dev_a = device(&store, trigger.clone(), CREATOR, "dev-A", CREATOR, Some("dev-A"));
    let dev_c = device(&store, trigger.clone(), ROOMMATE, "dev-C", CREATOR, Some("dev-A"));

    dev_a.session.start().await;
    dev_c.session.start().await;
    let sync_a = DismissalSynchronizer::spawn(feed.subscribe(), Arc::clone(&dev_a.session));
    let sync_c = DismissalSynchronizer::spawn(feed.subscribe(), Arc::clone(&dev_c.session));

    // Both click dismiss at effectively the same moment.
    let (oa, oc) = tokio::join!(
        dev_a.session.dismiss(CREATOR),
        dev_c.session.dismiss(ROOMMATE)
    );

    let applied = [oa, oc]
        .iter()
        .filter(|o| **o == DismissOutcome::Applied)
        .count();
    assert_eq!(applied, 1);
    assert_eq!(store.status(trigger.trigger_id), Some(TriggerStatus::Dismissed));

    // Both devices see their echoes; neither double-processes.
    feed.publish(dismissed_change(&store, &trigger));
    tokio::time::timeout(Duration::from_secs(5), sync_a)
        .await
        .expect("dev-A synchronizer should finish")
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), sync_c)
        .await
        .expect("dev-C synchronizer should finish")
        .unwrap();

    assert!(dev_a.session.is_terminal());
    assert!(dev_c.session.is_terminal());
    assert_eq!(dev_a.dismissals_seen.load(Ordering::SeqCst), 1);
    assert_eq!(dev_c.dismissals_seen.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Scenario: same physical device id, wrong user
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn owner_device_with_different_user_observes_silently() {
    let store = Arc::new(MemoryTriggerStore::new());
    let trigger = store.seed_ringing(ALARM_ID, Utc::now());

    // A roommate logged in on the creator's phone is still an observer.
    let dev = device(&store, trigger, ROOMMATE, "dev-A", CREATOR, Some("dev-A"));
    assert_eq!(
        resolve_ring_role(ROOMMATE, "dev-A", CREATOR, Some("dev-A")),
        RingRole::Observer
    );

    dev.session.start().await;
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(dev.audio.starts.load(Ordering::SeqCst), 0);
}
