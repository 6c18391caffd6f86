//! The scheduler probe.
//!
//! A periodic task that evaluates which alarms and reminders are due,
//! inserts trigger rows idempotently, and fans out notifications to room
//! members. Runs either inside the API process (the default deployment)
//! or as the standalone `hearth-scheduler` binary.

pub mod config;
pub mod probe;

pub use config::SchedulerConfig;
pub use probe::SchedulerProbe;
