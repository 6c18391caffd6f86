//! Scheduler probe configuration.

use std::time::Duration;

/// Probe cadence and idempotency parameters, loaded from environment
/// variables with the observed product defaults.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// How often the probe evaluates due alarms and reminders.
    pub probe_interval: Duration,
    /// Trailing window within which a second trigger insert for the same
    /// alarm is treated as a duplicate.
    pub dedup_window: Duration,
}

impl SchedulerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default |
    /// |------------------------|---------|
    /// | `PROBE_INTERVAL_SECS`  | `60`    |
    /// | `DEDUP_WINDOW_SECS`    | `120`   |
    pub fn from_env() -> Self {
        let probe_interval_secs: u64 = std::env::var("PROBE_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("PROBE_INTERVAL_SECS must be a valid u64");

        let dedup_window_secs: u64 = std::env::var("DEDUP_WINDOW_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("DEDUP_WINDOW_SECS must be a valid u64");

        Self {
            probe_interval: Duration::from_secs(probe_interval_secs),
            dedup_window: Duration::from_secs(dedup_window_secs),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(60),
            dedup_window: hearth_core::ring::DEFAULT_DEDUP_WINDOW,
        }
    }
}
