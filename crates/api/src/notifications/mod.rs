//! Event-to-WebSocket push routing.

pub mod router;

pub use router::PushRouter;
