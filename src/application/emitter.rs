//! Summary emission for open suppression runs.
//!
//! An accepted event can report how many events were suppressed before it
//! through its context. Identifiers that go quiet after a burst never get
//! that accepted event, so their suppressed runs are only visible through
//! periodic summaries.

use crate::application::ports::{Neutral, Storage};
use crate::application::registry::{ConditionalRegistry, SharedConditional};
use crate::domain::summary::SuppressionSummary;
use std::time::Duration;

#[cfg(feature = "async")]
use tokio::sync::oneshot;
#[cfg(feature = "async")]
use tokio::task::JoinHandle;
#[cfg(feature = "async")]
use tokio::time::{interval_at, Instant};

/// Error returned when emitter configuration validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitterConfigError {
    /// Summary interval duration must be greater than zero
    ZeroSummaryInterval,
}

impl std::fmt::Display for EmitterConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmitterConfigError::ZeroSummaryInterval => {
                write!(f, "summary interval must be greater than 0")
            }
        }
    }
}

impl std::error::Error for EmitterConfigError {}

/// Error returned when the background emitter did not stop cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownError {
    /// The emitter task panicked, usually inside the emit callback
    TaskPanicked,
    /// The emitter task was cancelled before it could stop
    TaskCancelled,
}

impl std::fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownError::TaskPanicked => write!(f, "summary emitter task panicked"),
            ShutdownError::TaskCancelled => write!(f, "summary emitter task was cancelled"),
        }
    }
}

impl std::error::Error for ShutdownError {}

/// Configuration for summary emission.
#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// How often to emit summaries
    pub interval: Duration,
    /// Minimum number of pending suppressions to include an identifier
    pub min_count: u64,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            min_count: 1,
        }
    }
}

impl EmitterConfig {
    /// Create a new emitter config with the specified interval.
    ///
    /// # Errors
    /// Returns `EmitterConfigError::ZeroSummaryInterval` if `interval` is zero.
    pub fn new(interval: Duration) -> Result<Self, EmitterConfigError> {
        if interval.is_zero() {
            return Err(EmitterConfigError::ZeroSummaryInterval);
        }
        Ok(Self {
            interval,
            min_count: 1,
        })
    }

    /// Set the minimum pending count threshold.
    pub fn with_min_count(mut self, min_count: u64) -> Self {
        self.min_count = min_count;
        self
    }
}

/// Log each summary as a WARN event.
pub fn log_summaries(summaries: Vec<SuppressionSummary>) {
    for summary in summaries {
        tracing::warn!(
            id = %summary.id,
            pending = summary.pending(),
            "{}",
            summary.format_message()
        );
    }
}

/// Collects summaries from a registry, on demand or periodically.
pub struct SummaryEmitter<X, S>
where
    X: Neutral + 'static,
    S: Storage<String, SharedConditional<X>> + Clone,
{
    registry: ConditionalRegistry<X, S>,
    config: EmitterConfig,
}

impl<X, S> SummaryEmitter<X, S>
where
    X: Neutral + 'static,
    S: Storage<String, SharedConditional<X>> + Clone,
{
    /// Create a new summary emitter.
    pub fn new(registry: ConditionalRegistry<X, S>, config: EmitterConfig) -> Self {
        Self { registry, config }
    }

    /// Summaries for every identifier with at least `min_count` pending
    /// suppressions.
    pub fn collect_summaries(&self) -> Vec<SuppressionSummary> {
        self.registry.summaries(self.config.min_count)
    }

    /// Start emitting summaries periodically.
    ///
    /// The first emission happens one interval after the call. Empty
    /// collections are skipped.
    #[cfg(feature = "async")]
    pub fn start<F>(self, mut emit_fn: F) -> EmitterHandle
    where
        F: FnMut(Vec<SuppressionSummary>) + Send + 'static,
        S: 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let period = self.config.interval;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let summaries = self.collect_summaries();
                        if !summaries.is_empty() {
                            emit_fn(summaries);
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::debug!("summary emitter stopping");
                        break;
                    }
                }
            }
        });

        EmitterHandle {
            shutdown_tx: Some(shutdown_tx),
            task,
        }
    }

    /// Get the emitter configuration.
    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Get a reference to the registry.
    pub fn registry(&self) -> &ConditionalRegistry<X, S> {
        &self.registry
    }
}

/// Handle to a running emitter task.
///
/// Dropping the handle stops the task at its next poll.
#[cfg(feature = "async")]
#[derive(Debug)]
pub struct EmitterHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

#[cfg(feature = "async")]
impl EmitterHandle {
    /// Signal the task to stop and wait for it.
    ///
    /// # Errors
    /// Returns `ShutdownError` if the task panicked or was cancelled.
    pub async fn shutdown(mut self) -> Result<(), ShutdownError> {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            // Receiver is gone only if the task already ended
            let _ = shutdown_tx.send(());
        }

        match (&mut self.task).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_panic() => {
                tracing::warn!("summary emitter task panicked");
                Err(ShutdownError::TaskPanicked)
            }
            Err(_) => {
                tracing::warn!("summary emitter task was cancelled");
                Err(ShutdownError::TaskCancelled)
            }
        }
    }

    /// Check if the task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(feature = "async")]
impl Drop for EmitterHandle {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}
