//! Layered device alerting.
//!
//! The owning device must never ring completely silently just because one
//! output path failed (autoplay restriction, missing codec, unreachable
//! sound asset). [`LayeredAlerter`] holds an ordered list of
//! [`AlertStrategy`]s — typically the configured audio source first, then
//! a locally synthesized tone — and starts the first one that succeeds.
//! When every strategy fails the session keeps running in a
//! visually-ringing-but-silent state; alert failure never reaches the
//! state machine as an error.
//!
//! A strategy owns the whole audible side effect for its source,
//! vibration included, so starting one strategy is one user-perceived
//! "ring".

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

/// A single alert strategy failed to start.
#[derive(Debug, thiserror::Error)]
#[error("alert strategy failed: {0}")]
pub struct AlertFailure(pub String);

/// One way of audibly alerting on this device.
#[async_trait]
pub trait AlertStrategy: Send + Sync {
    /// Short name for logs, e.g. `"audio"`, `"tone"`.
    fn name(&self) -> &'static str;

    /// Begin looping playback. Resolves once playback has actually
    /// started, so a failure here can fall through to the next strategy.
    async fn start(&self) -> Result<(), AlertFailure>;

    /// Stop playback and release the output. Must be safe to call even if
    /// `start` never succeeded.
    async fn stop(&self);
}

/// What the alerter ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    /// A strategy is audibly ringing.
    Audible,
    /// Every strategy failed; the session rings visually only.
    SilentVisual,
}

/// Ordered strategy list with first-success short-circuit.
pub struct LayeredAlerter {
    strategies: Vec<Arc<dyn AlertStrategy>>,
    /// Index of the strategy currently playing, if any.
    active: Mutex<Option<usize>>,
}

impl LayeredAlerter {
    pub fn new(strategies: Vec<Arc<dyn AlertStrategy>>) -> Self {
        Self {
            strategies,
            active: Mutex::new(None),
        }
    }

    /// An alerter with no strategies: always [`AlertOutcome::SilentVisual`].
    /// Observer sessions use this.
    pub fn silent() -> Self {
        Self::new(Vec::new())
    }

    /// Try each strategy in order until one starts.
    ///
    /// Failures are logged and swallowed; the return value only tells the
    /// caller whether anything is audible. Calling `start` while a
    /// strategy is already active is a no-op.
    pub async fn start(&self) -> AlertOutcome {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return AlertOutcome::Audible;
        }
        for (i, strategy) in self.strategies.iter().enumerate() {
            match strategy.start().await {
                Ok(()) => {
                    tracing::debug!(strategy = strategy.name(), "Alert playback started");
                    *active = Some(i);
                    return AlertOutcome::Audible;
                }
                Err(e) => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        error = %e,
                        "Alert strategy failed, trying next"
                    );
                }
            }
        }
        tracing::warn!("All alert strategies failed, ringing visually only");
        AlertOutcome::SilentVisual
    }

    /// Stop the active strategy, if any. Idempotent.
    pub async fn stop(&self) {
        let taken = self.active.lock().await.take();
        if let Some(i) = taken {
            self.strategies[i].stop().await;
        }
    }

    /// Whether a strategy is currently playing.
    pub async fn is_active(&self) -> bool {
        self.active.lock().await.is_some()
    }
}

// ---------------------------------------------------------------------------
// Local notifications
// ---------------------------------------------------------------------------

/// An interaction-required notice shown on this device.
#[derive(Debug, Clone)]
pub struct LocalNotification {
    pub title: String,
    pub body: String,
    /// Silent notifications inform without sound; the owning device posts
    /// a non-silent, high-priority one.
    pub silent: bool,
}

/// Device notification surface. Best-effort: implementations must absorb
/// permission denials and other failures rather than return them.
pub trait Notifier: Send + Sync {
    fn notify(&self, note: LocalNotification);
}

/// [`Notifier`] for headless runs and tests: logs the notice.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, note: LocalNotification) {
        tracing::info!(title = %note.title, silent = note.silent, "Local notification");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
