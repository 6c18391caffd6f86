//! Hearth event bus and change-feed infrastructure.
//!
//! This crate provides the building blocks the alarm protocol rides on:
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`RoomEvent`] — the canonical domain event envelope.
//! - [`TriggerFeed`] / [`TriggerChange`] — the typed trigger change feed
//!   consumed by client ring sessions.
//! - [`EventPersistence`] — background service that durably writes every
//!   event to the `events` table.

pub mod bus;
pub mod feed;
pub mod persistence;

pub use bus::{EventBus, RoomEvent};
pub use feed::{TriggerChange, TriggerFeed};
pub use persistence::EventPersistence;
