//! Ring cadence configuration, trigger status, and the ring session
//! state machine.
//!
//! The state machine here is pure data: the session runtime in
//! `hearth-session` drives it, and the scheduler and API consult
//! [`TriggerStatus`] when reading or writing trigger rows.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Cadence constants
// ---------------------------------------------------------------------------

/// Default delay between consecutive rings of an owning device.
pub const DEFAULT_RING_INTERVAL: Duration = Duration::from_secs(5);

/// Default number of rings after which the owning device dismisses the
/// alarm on its own.
pub const DEFAULT_MAX_RINGS: u32 = 3;

/// Default trailing window within which a second trigger insert for the
/// same alarm is treated as a duplicate and skipped.
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_secs(120);

/// Cadence parameters for a ring session.
///
/// The defaults mirror the observed product behavior; both values are
/// tunable per deployment rather than hard-wired into the session logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingConfig {
    /// Delay between consecutive rings.
    pub ring_interval: Duration,
    /// Ring count at which the owning device auto-dismisses.
    pub max_rings: u32,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            ring_interval: DEFAULT_RING_INTERVAL,
            max_rings: DEFAULT_MAX_RINGS,
        }
    }
}

// ---------------------------------------------------------------------------
// Trigger status
// ---------------------------------------------------------------------------

/// Persisted status of an alarm trigger row.
///
/// A trigger is born `Ringing` and moves to `Dismissed` at most once; the
/// store-level conditional update guarantees the transition is accepted
/// for exactly one dismissal attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerStatus {
    Ringing,
    Dismissed,
}

impl TriggerStatus {
    /// The column value stored in `alarm_triggers.status`.
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerStatus::Ringing => "ringing",
            TriggerStatus::Dismissed => "dismissed",
        }
    }

    /// Parse a stored column value. Unknown values return `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ringing" => Some(TriggerStatus::Ringing),
            "dismissed" => Some(TriggerStatus::Dismissed),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Ring session state machine
// ---------------------------------------------------------------------------

/// Per-client state of one ring session.
///
/// `Dismissed` is terminal; there is no path back to an active state, and
/// an owner never becomes an observer (or vice versa) within one session
/// because the role is fixed at session construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingState {
    /// No active trigger observed yet.
    Idle,
    /// This device owns the alarm and is producing sound/vibration.
    OwnerRinging,
    /// Another device owns the alarm; this client observes silently.
    ObserverSilent,
    /// The trigger was dismissed (locally, automatically, or remotely).
    Dismissed,
}

impl RingState {
    /// Returns the set of states reachable from `self`.
    pub fn valid_transitions(self) -> &'static [RingState] {
        match self {
            RingState::Idle => &[RingState::OwnerRinging, RingState::ObserverSilent],
            RingState::OwnerRinging => &[RingState::Dismissed],
            RingState::ObserverSilent => &[RingState::Dismissed],
            RingState::Dismissed => &[],
        }
    }

    /// Check whether a transition from `self` to `to` is valid.
    pub fn can_transition(self, to: RingState) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// A terminal state has no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        self.valid_transitions().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Display ring count
// ---------------------------------------------------------------------------

/// Ring count shown in the UI, derived from wall-clock time.
///
/// Every device computes this from the trigger's `triggered_at` timestamp
/// so the displayed count agrees across devices regardless of when each
/// one observed the trigger. It is NOT the counter that drives the owning
/// device's auto-dismiss; that one is local-timer driven and lives in the
/// session runtime.
///
/// The first ring is count 1 at `triggered_at`; a clock slightly behind
/// the server (negative elapsed) still reports 1.
pub fn display_ring_count(triggered_at: Timestamp, now: Timestamp, ring_interval: Duration) -> u32 {
    let elapsed = (now - triggered_at).num_milliseconds();
    if elapsed < 0 {
        return 1;
    }
    let interval_ms = ring_interval.as_millis().max(1) as i64;
    (elapsed / interval_ms + 1).min(u32::MAX as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------

    #[test]
    fn idle_to_owner_ringing() {
        assert!(RingState::Idle.can_transition(RingState::OwnerRinging));
    }

    #[test]
    fn idle_to_observer_silent() {
        assert!(RingState::Idle.can_transition(RingState::ObserverSilent));
    }

    #[test]
    fn owner_ringing_to_dismissed() {
        assert!(RingState::OwnerRinging.can_transition(RingState::Dismissed));
    }

    #[test]
    fn observer_silent_to_dismissed() {
        assert!(RingState::ObserverSilent.can_transition(RingState::Dismissed));
    }

    #[test]
    fn dismissed_is_terminal() {
        assert!(RingState::Dismissed.is_terminal());
        assert!(RingState::Dismissed.valid_transitions().is_empty());
    }

    #[test]
    fn idle_to_dismissed_invalid() {
        assert!(!RingState::Idle.can_transition(RingState::Dismissed));
    }

    #[test]
    fn owner_to_observer_invalid() {
        assert!(!RingState::OwnerRinging.can_transition(RingState::ObserverSilent));
    }

    #[test]
    fn dismissed_to_owner_invalid() {
        assert!(!RingState::Dismissed.can_transition(RingState::OwnerRinging));
    }

    // -----------------------------------------------------------------------
    // Trigger status round trip
    // -----------------------------------------------------------------------

    #[test]
    fn status_column_values() {
        assert_eq!(TriggerStatus::Ringing.as_str(), "ringing");
        assert_eq!(TriggerStatus::Dismissed.as_str(), "dismissed");
    }

    #[test]
    fn status_parse_known_and_unknown() {
        assert_eq!(TriggerStatus::parse("ringing"), Some(TriggerStatus::Ringing));
        assert_eq!(
            TriggerStatus::parse("dismissed"),
            Some(TriggerStatus::Dismissed)
        );
        assert_eq!(TriggerStatus::parse("snoozed"), None);
    }

    // -----------------------------------------------------------------------
    // Display ring count
    // -----------------------------------------------------------------------

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn first_ring_at_trigger_time() {
        assert_eq!(display_ring_count(at(0), at(0), DEFAULT_RING_INTERVAL), 1);
    }

    #[test]
    fn second_ring_after_one_interval() {
        assert_eq!(display_ring_count(at(0), at(5), DEFAULT_RING_INTERVAL), 2);
    }

    #[test]
    fn mid_interval_does_not_advance() {
        assert_eq!(display_ring_count(at(0), at(4), DEFAULT_RING_INTERVAL), 1);
        assert_eq!(display_ring_count(at(0), at(9), DEFAULT_RING_INTERVAL), 2);
    }

    #[test]
    fn clock_behind_server_reports_first_ring() {
        assert_eq!(display_ring_count(at(10), at(3), DEFAULT_RING_INTERVAL), 1);
    }

    #[test]
    fn count_agrees_for_divergent_observers() {
        // Two devices with clocks 800ms apart still agree within a ring.
        let a = at(15);
        let b = a + chrono::Duration::milliseconds(800);
        assert_eq!(
            display_ring_count(at(0), a, DEFAULT_RING_INTERVAL),
            display_ring_count(at(0), b, DEFAULT_RING_INTERVAL),
        );
    }
}
