//! Hearth domain logic.
//!
//! This crate has zero internal dependencies so it can be used by the
//! database layer, the scheduler probe, the client session runtime, and
//! the API without cycles. It holds:
//!
//! - [`types`] — shared id and timestamp aliases.
//! - [`error`] — the domain error enum.
//! - [`ring`] — ring cadence configuration, the ring session state
//!   machine, and the wall-clock display ring counter.
//! - [`device`] — owning-device role resolution.
//! - [`recurrence`] — alarm day-set and due-minute evaluation.
//! - [`invite`] — room invite code generation.
//! - [`kinds`] — well-known event and notification kind names.

pub mod device;
pub mod error;
pub mod invite;
pub mod kinds;
pub mod recurrence;
pub mod ring;
pub mod types;

pub use error::CoreError;
