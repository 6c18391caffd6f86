//! Client-side runtime for the shared alarm protocol.
//!
//! A device that observes a ringing trigger creates one [`RingSession`]
//! for it. The session drives everything that happens on that device
//! until the trigger is dismissed: audible alerting on the owning device
//! (with layered fallback), the local auto-dismiss counter, optimistic
//! local stop on manual dismissal, and idempotent teardown. A
//! [`DismissalSynchronizer`] task watches the trigger change feed and
//! tears the session down when any other party dismisses first.
//!
//! The shared store is consumed through the [`TriggerStore`] trait so the
//! state machine is testable without a database; the server realizes the
//! same conditional semantics in `hearth-db`'s `TriggerRepo`.

pub mod alert;
pub mod controller;
pub mod store;
pub mod synchronizer;

pub use alert::{AlertOutcome, AlertStrategy, LayeredAlerter, LocalNotification, Notifier};
pub use controller::{RingSession, SessionParams};
pub use store::{DismissOutcome, InsertOutcome, MemoryTriggerStore, TriggerSnapshot, TriggerStore};
pub use synchronizer::DismissalSynchronizer;
