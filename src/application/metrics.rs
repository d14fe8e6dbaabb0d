//! Registry-wide evaluation counters.
//!
//! Per-identifier statistics live in each `Context`. These counters
//! aggregate across every conditional a registry has built.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Atomic counters shared by a registry and its preset callbacks.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Evaluations that passed the predicate
    accepted: AtomicU64,
    /// Evaluations replaced by the neutral value
    rejected: AtomicU64,
    /// Conditionals inserted into the registry
    conditionals_created: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                accepted: AtomicU64::new(0),
                rejected: AtomicU64::new(0),
                conditionals_created: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn record_accepted(&self) {
        self.inner.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.inner.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_conditional_created(&self) {
        self.inner
            .conditionals_created
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Get the total number of accepted evaluations.
    pub fn accepted(&self) -> u64 {
        self.inner.accepted.load(Ordering::Relaxed)
    }

    /// Get the total number of rejected evaluations.
    pub fn rejected(&self) -> u64 {
        self.inner.rejected.load(Ordering::Relaxed)
    }

    /// Get the number of conditionals the registry holds or has held.
    pub fn conditionals_created(&self) -> u64 {
        self.inner.conditionals_created.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            accepted: self.accepted(),
            rejected: self.rejected(),
            conditionals_created: self.conditionals_created(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.inner.accepted.store(0, Ordering::Relaxed);
        self.inner.rejected.store(0, Ordering::Relaxed);
        self.inner.conditionals_created.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub accepted: u64,
    pub rejected: u64,
    pub conditionals_created: u64,
}

impl MetricsSnapshot {
    /// Ratio of rejected to total evaluations, 0.0 when nothing ran.
    pub fn suppression_rate(&self) -> f64 {
        let total = self.total_evaluations();
        if total == 0 {
            0.0
        } else {
            self.rejected as f64 / total as f64
        }
    }

    /// Accepted plus rejected.
    pub fn total_evaluations(&self) -> u64 {
        self.accepted.saturating_add(self.rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initial_state() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot {
            accepted: 0,
            rejected: 0,
            conditionals_created: 0,
        });
    }

    #[test]
    fn test_snapshot() {
        let metrics = Metrics::new();
        metrics.record_accepted();
        metrics.record_accepted();
        metrics.record_rejected();
        metrics.record_conditional_created();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.accepted, 2);
        assert_eq!(snapshot.rejected, 1);
        assert_eq!(snapshot.conditionals_created, 1);
        assert_eq!(snapshot.total_evaluations(), 3);
    }

    #[test]
    fn test_snapshot_suppression_rate() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot().suppression_rate(), 0.0);

        metrics.record_accepted();
        assert_eq!(metrics.snapshot().suppression_rate(), 0.0);

        metrics.record_rejected();
        metrics.record_rejected();
        metrics.record_rejected();
        assert!((metrics.snapshot().suppression_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset() {
        let metrics = Metrics::new();
        metrics.record_accepted();
        metrics.record_rejected();
        metrics.record_conditional_created();

        metrics.reset();
        assert_eq!(metrics.snapshot().total_evaluations(), 0);
        assert_eq!(metrics.conditionals_created(), 0);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics1 = Metrics::new();
        let metrics2 = metrics1.clone();
        metrics1.record_rejected();
        metrics2.record_rejected();

        assert_eq!(metrics1.rejected(), 2);
    }

    #[test]
    fn test_concurrent_updates() {
        use std::thread;

        let metrics = Metrics::new();
        let mut handles = vec![];

        for _ in 0..10 {
            let m = metrics.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    m.record_accepted();
                    m.record_rejected();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.accepted(), 1000);
        assert_eq!(metrics.rejected(), 1000);
    }
}
