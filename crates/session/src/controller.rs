//! Per-device ring session.
//!
//! One [`RingSession`] is created when a client observes a ringing
//! trigger for an alarm it cares about, and destroyed when the trigger is
//! dismissed (by anyone, anywhere) or the client tears it down. The
//! session owns the device-local side of the protocol:
//!
//! - the owning device starts audible alerting and a local ring counter
//!   that auto-dismisses after a configured number of rings;
//! - observers stay silent but are notified the alarm is dismissible;
//! - a manual dismissal stops everything locally before the store call
//!   resolves, so the user-perceived stop never waits on the network;
//! - teardown is idempotent and guaranteed to clear every timer and
//!   release the alert output on every exit path.
//!
//! The role is decided before construction (`hearth_core::device`), never
//! read from ambient device state inside the session.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::task::JoinHandle;

use hearth_core::device::RingRole;
use hearth_core::ring::{display_ring_count, RingConfig, RingState};
use hearth_core::types::{DbId, Timestamp};

use crate::alert::{LayeredAlerter, LocalNotification, Notifier};
use crate::store::{DismissOutcome, TriggerSnapshot, TriggerStore};

/// Everything a session needs to know about itself at construction.
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub trigger: TriggerSnapshot,
    pub alarm_title: String,
    /// Resolved before construction; fixed for the session's lifetime.
    pub role: RingRole,
    /// The user this device is connected as. Auto-dismiss is attributed
    /// to this user.
    pub user_id: DbId,
    pub config: RingConfig,
}

/// Device-local state machine for one active trigger.
pub struct RingSession {
    params: SessionParams,
    store: Arc<dyn TriggerStore>,
    alerter: Arc<LayeredAlerter>,
    notifier: Arc<dyn Notifier>,

    /// Self-reference handed to the ticker task so a finished session
    /// can be dropped while the detached task unwinds.
    weak: Weak<RingSession>,
    state: Mutex<RingState>,
    /// Local-timer-driven counter behind auto-dismiss. Not the wall-clock
    /// display counter; see [`RingSession::display_ring_count`].
    ring_count: AtomicU32,
    ticker: Mutex<Option<JoinHandle<()>>>,
    /// Re-entrancy guard: the first teardown path to flip this wins, and
    /// everything after (including our own echoed change-feed event) is a
    /// no-op.
    terminal: AtomicBool,
    on_terminal: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl RingSession {
    pub fn new(
        params: SessionParams,
        store: Arc<dyn TriggerStore>,
        alerter: Arc<LayeredAlerter>,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            params,
            store,
            alerter,
            notifier,
            weak: weak.clone(),
            state: Mutex::new(RingState::Idle),
            ring_count: AtomicU32::new(0),
            ticker: Mutex::new(None),
            terminal: AtomicBool::new(false),
            on_terminal: Mutex::new(None),
        })
    }

    /// Register the callback invoked exactly once when the session
    /// reaches its terminal state, however it gets there.
    pub fn on_terminal(&self, callback: impl FnOnce() + Send + 'static) {
        *self.on_terminal.lock().unwrap() = Some(Box::new(callback));
    }

    /// Enter the active state for this device's role.
    ///
    /// Owners start alerting and the auto-dismiss ticker; observers post
    /// a silent notification and wait for the change feed.
    pub async fn start(&self) {
        if self.is_terminal() {
            return;
        }
        match self.params.role {
            RingRole::Owner => self.enter_owner_ringing().await,
            RingRole::Observer => self.enter_observer_silent(),
        }
    }

    async fn enter_owner_ringing(&self) {
        self.transition(RingState::OwnerRinging);
        self.notifier.notify(LocalNotification {
            title: self.params.alarm_title.clone(),
            body: "Alarm ringing. Tap to dismiss.".to_string(),
            silent: false,
        });
        self.alerter.start().await;
        self.spawn_ticker();
    }

    fn enter_observer_silent(&self) {
        self.transition(RingState::ObserverSilent);
        self.notifier.notify(LocalNotification {
            title: self.params.alarm_title.clone(),
            body: "A roommate's alarm is ringing. You can dismiss it.".to_string(),
            silent: true,
        });
    }

    /// Spawn the owner's ring ticker: one increment per ring interval,
    /// auto-dismiss at the configured maximum.
    fn spawn_ticker(&self) {
        let weak = self.weak.clone();
        let config = self.params.config;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.ring_interval);
            // The first tick completes immediately; rings are counted
            // from the next one.
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(session) = weak.upgrade() else { break };
                if session.is_terminal() {
                    break;
                }
                let count = session.ring_count.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::debug!(
                    trigger_id = session.params.trigger.trigger_id,
                    count,
                    "Ring"
                );
                if count >= config.max_rings {
                    // Drop our own handle first so the optimistic local
                    // stop inside dismiss() cannot abort this task before
                    // the store call goes out.
                    session.ticker.lock().unwrap().take();
                    let user_id = session.params.user_id;
                    tracing::info!(
                        trigger_id = session.params.trigger.trigger_id,
                        max_rings = config.max_rings,
                        "Max rings reached, auto-dismissing"
                    );
                    session.dismiss(user_id).await;
                    break;
                }
            }
        });
        *self.ticker.lock().unwrap() = Some(handle);
    }

    /// Dismiss the trigger on behalf of `by_user`.
    ///
    /// The local stop happens first and unconditionally; only then is the
    /// store's conditional transition attempted. A lost race
    /// ([`DismissOutcome::NotApplied`]) means someone else already
    /// dismissed, which is the same outcome from this device's point of
    /// view. A store failure is logged and treated the same way; the
    /// change feed reconciles on reconnect.
    pub async fn dismiss(&self, by_user: DbId) -> DismissOutcome {
        self.finish_locally().await;
        match self
            .store
            .dismiss_trigger(self.params.trigger.trigger_id, by_user)
            .await
        {
            Ok(DismissOutcome::Applied) => {
                tracing::debug!(
                    trigger_id = self.params.trigger.trigger_id,
                    by_user,
                    "Dismissal applied"
                );
                DismissOutcome::Applied
            }
            Ok(DismissOutcome::NotApplied) => {
                tracing::debug!(
                    trigger_id = self.params.trigger.trigger_id,
                    "Trigger was already dismissed"
                );
                DismissOutcome::NotApplied
            }
            Err(e) => {
                tracing::warn!(
                    trigger_id = self.params.trigger.trigger_id,
                    error = %e,
                    "Dismissal not confirmed by store, local stop already done"
                );
                DismissOutcome::NotApplied
            }
        }
    }

    /// React to a dismissal observed through the change feed.
    ///
    /// Idempotent: a device that just dismissed locally will see its own
    /// echoed change event and must not double-process it.
    pub async fn handle_remote_dismissal(&self) {
        self.finish_locally().await;
    }

    /// Tear the session down (unmount, disconnect). Clears all timers and
    /// releases the alert output; does NOT dismiss the trigger in the
    /// store. Safe to call any number of times.
    pub async fn teardown(&self) {
        self.finish_locally().await;
    }

    /// The single teardown path shared by manual dismissal, auto-dismiss,
    /// remote dismissal, and unmount.
    async fn finish_locally(&self) {
        if self.terminal.swap(true, Ordering::SeqCst) {
            return;
        }
        let ticker = self.ticker.lock().unwrap().take();
        if let Some(handle) = ticker {
            handle.abort();
        }
        self.alerter.stop().await;
        {
            let mut state = self.state.lock().unwrap();
            if state.can_transition(RingState::Dismissed) {
                *state = RingState::Dismissed;
            }
        }
        let callback = self.on_terminal.lock().unwrap().take();
        if let Some(callback) = callback {
            callback();
        }
    }

    fn transition(&self, to: RingState) {
        let mut state = self.state.lock().unwrap();
        if state.can_transition(to) {
            *state = to;
        } else {
            tracing::warn!(from = ?*state, ?to, "Ignoring invalid ring state transition");
        }
    }

    // -- Accessors ----------------------------------------------------------

    pub fn trigger_id(&self) -> DbId {
        self.params.trigger.trigger_id
    }

    pub fn state(&self) -> RingState {
        *self.state.lock().unwrap()
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal.load(Ordering::SeqCst)
    }

    /// The local auto-dismiss counter.
    pub fn local_ring_count(&self) -> u32 {
        self.ring_count.load(Ordering::SeqCst)
    }

    /// The cross-device UI counter, derived from wall-clock time since
    /// the trigger fired. Distinct from [`local_ring_count`]
    /// (`local_ring_count`) by design: this one agrees across devices,
    /// that one drives auto-dismiss without a server round trip.
    ///
    /// [`local_ring_count`]: RingSession::local_ring_count
    pub fn display_ring_count(&self, now: Timestamp) -> u32 {
        display_ring_count(
            self.params.trigger.triggered_at,
            now,
            self.params.config.ring_interval,
        )
    }
}

impl Drop for RingSession {
    fn drop(&mut self) {
        // Last-resort timer cleanup for sessions dropped without an
        // explicit teardown. The alerter is shared and stops with its own
        // owner.
        if let Ok(mut ticker) = self.ticker.lock() {
            if let Some(handle) = ticker.take() {
                handle.abort();
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
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;

    use crate::alert::{AlertFailure, AlertStrategy};
    use crate::store::MemoryTriggerStore;
    use hearth_core::ring::TriggerStatus;

    const OWNER_USER: DbId = 1;
    const OTHER_USER: DbId = 2;

    /// Strategy that always starts and counts starts/stops.
    struct Recording {
        starts: AtomicUsize,
        stops: AtomicUsize,
    }

    impl Recording {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                starts: AtomicUsize::new(0),
                stops: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl AlertStrategy for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }
        async fn start(&self) -> Result<(), AlertFailure> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Notifier that remembers every posted notification.
    struct Remembering {
        notes: Mutex<Vec<LocalNotification>>,
    }

    impl Remembering {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                notes: Mutex::new(Vec::new()),
            })
        }
    }

    impl Notifier for Remembering {
        fn notify(&self, note: LocalNotification) {
            self.notes.lock().unwrap().push(note);
        }
    }

    struct Fixture {
        store: Arc<MemoryTriggerStore>,
        audio: Arc<Recording>,
        notifier: Arc<Remembering>,
        session: Arc<RingSession>,
        terminal_count: Arc<AtomicUsize>,
    }

    fn fixture(role: RingRole, user_id: DbId) -> Fixture {
        let store = Arc::new(MemoryTriggerStore::new());
        let trigger = store.seed_ringing(10, Utc::now());
        fixture_for_trigger(Arc::clone(&store), trigger, role, user_id)
    }

    fn fixture_for_trigger(
        store: Arc<MemoryTriggerStore>,
        trigger: TriggerSnapshot,
        role: RingRole,
        user_id: DbId,
    ) -> Fixture {
        let audio = Recording::new();
        let notifier = Remembering::new();
        let alerter = Arc::new(LayeredAlerter::new(vec![
            audio.clone() as Arc<dyn AlertStrategy>
        ]));
        let session = RingSession::new(
            SessionParams {
                trigger,
                alarm_title: "Wake up".to_string(),
                role,
                user_id,
                config: RingConfig::default(),
            },
            Arc::clone(&store) as Arc<dyn TriggerStore>,
            alerter,
            notifier.clone() as Arc<dyn Notifier>,
        );
        let terminal_count = Arc::new(AtomicUsize::new(0));
        let tc = Arc::clone(&terminal_count);
        session.on_terminal(move || {
            tc.fetch_add(1, Ordering::SeqCst);
        });
        Fixture {
            store,
            audio,
            notifier,
            session,
            terminal_count,
        }
    }

    async fn sleep_secs(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn owner_enters_ringing_and_starts_audio() {
        let f = fixture(RingRole::Owner, OWNER_USER);
        f.session.start().await;

        assert_eq!(f.session.state(), RingState::OwnerRinging);
        assert_eq!(f.audio.starts.load(Ordering::SeqCst), 1);

        let notes = f.notifier.notes.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert!(!notes[0].silent);
    }

    #[tokio::test(start_paused = true)]
    async fn observer_stays_silent_for_entire_session() {
        let f = fixture(RingRole::Observer, OTHER_USER);
        f.session.start().await;

        assert_eq!(f.session.state(), RingState::ObserverSilent);

        // Well past several ring intervals: still zero audio starts.
        sleep_secs(30).await;
        assert_eq!(f.audio.starts.load(Ordering::SeqCst), 0);
        assert_eq!(f.session.local_ring_count(), 0);

        // But the observer was told the alarm is dismissible.
        let notes = f.notifier.notes.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].silent);
    }

    #[tokio::test(start_paused = true)]
    async fn owner_auto_dismisses_after_max_rings() {
        let f = fixture(RingRole::Owner, OWNER_USER);
        f.session.start().await;

        // Default cadence: rings at 5s, 10s, 15s; auto-dismiss at ring 3.
        sleep_secs(16).await;

        assert!(f.session.is_terminal());
        assert_eq!(f.session.state(), RingState::Dismissed);
        assert_eq!(
            f.store.status(f.session.trigger_id()),
            Some(TriggerStatus::Dismissed)
        );
        assert_eq!(f.store.dismissed_by(f.session.trigger_id()), Some(OWNER_USER));
        assert_eq!(f.terminal_count.load(Ordering::SeqCst), 1);
        assert_eq!(f.audio.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ring_counter_increments_per_interval() {
        let f = fixture(RingRole::Owner, OWNER_USER);
        f.session.start().await;

        sleep_secs(6).await;
        assert_eq!(f.session.local_ring_count(), 1);
        sleep_secs(5).await;
        assert_eq!(f.session.local_ring_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_dismiss_stops_locally_and_applies() {
        let f = fixture(RingRole::Owner, OWNER_USER);
        f.session.start().await;
        sleep_secs(6).await;

        let outcome = f.session.dismiss(OWNER_USER).await;

        assert_eq!(outcome, DismissOutcome::Applied);
        assert!(f.session.is_terminal());
        assert_eq!(f.audio.stops.load(Ordering::SeqCst), 1);
        assert_eq!(f.terminal_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn lost_dismissal_race_is_not_an_error() {
        let f = fixture(RingRole::Owner, OWNER_USER);
        f.session.start().await;

        // Someone else wins the race at the store level.
        f.store
            .dismiss_trigger(f.session.trigger_id(), OTHER_USER)
            .await
            .unwrap();

        let outcome = f.session.dismiss(OWNER_USER).await;

        // Local stop still happened; the store keeps the first winner.
        assert_eq!(outcome, DismissOutcome::NotApplied);
        assert!(f.session.is_terminal());
        assert_eq!(f.store.dismissed_by(f.session.trigger_id()), Some(OTHER_USER));
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_clears_timers_and_stops_audio() {
        let f = fixture(RingRole::Owner, OWNER_USER);
        f.session.start().await;
        sleep_secs(6).await;
        let count_at_teardown = f.session.local_ring_count();

        f.session.teardown().await;

        // A full ring interval later: no further increments, no dismissal
        // written to the store by a stray timer.
        sleep_secs(10).await;
        assert_eq!(f.session.local_ring_count(), count_at_teardown);
        assert_eq!(f.audio.stops.load(Ordering::SeqCst), 1);
        assert_eq!(
            f.store.status(f.session.trigger_id()),
            Some(TriggerStatus::Ringing)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_is_idempotent() {
        let f = fixture(RingRole::Owner, OWNER_USER);
        f.session.start().await;

        f.session.teardown().await;
        f.session.teardown().await;
        f.session.handle_remote_dismissal().await;

        assert_eq!(f.audio.stops.load(Ordering::SeqCst), 1);
        assert_eq!(f.terminal_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_dismissals_accept_exactly_one() {
        let store = Arc::new(MemoryTriggerStore::new());
        let trigger = store.seed_ringing(10, Utc::now());

        let a = fixture_for_trigger(
            Arc::clone(&store),
            trigger.clone(),
            RingRole::Owner,
            OWNER_USER,
        );
        let b = fixture_for_trigger(
            Arc::clone(&store),
            trigger.clone(),
            RingRole::Observer,
            OTHER_USER,
        );
        a.session.start().await;
        b.session.start().await;

        let (oa, ob) = tokio::join!(a.session.dismiss(OWNER_USER), b.session.dismiss(OTHER_USER));

        let applied = [oa, ob]
            .iter()
            .filter(|o| **o == DismissOutcome::Applied)
            .count();
        assert_eq!(applied, 1);

        // Both devices end in the stopped local state regardless of who won.
        assert!(a.session.is_terminal());
        assert!(b.session.is_terminal());
        assert_eq!(store.status(trigger.trigger_id), Some(TriggerStatus::Dismissed));
    }

    #[tokio::test(start_paused = true)]
    async fn display_count_tracks_wall_clock_not_local_timer() {
        let triggered_at = Utc::now();
        let store = Arc::new(MemoryTriggerStore::new());
        let trigger = store.seed_ringing(10, triggered_at);
        let f = fixture_for_trigger(store, trigger, RingRole::Observer, OTHER_USER);
        f.session.start().await;

        // Observers never tick a local counter, but the display counter
        // still advances with wall-clock time.
        let later = triggered_at + chrono::Duration::seconds(12);
        assert_eq!(f.session.local_ring_count(), 0);
        assert_eq!(f.session.display_ring_count(later), 3);
    }
}
