//! Engine counters
//!
//! - Counters only (no gauges, no histograms)
//! - Monotonic increase
//! - Reset only when a new engine is built

use std::sync::atomic::{AtomicU64, Ordering};

/// Operational counters of one form session
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Guarded runs that completed
    propagation_runs: AtomicU64,
    /// Entry calls dropped by the reentrancy guard
    reentrant_drops: AtomicU64,
    /// Function evaluations that failed
    evaluation_failures: AtomicU64,
    /// Value notifications sent to the change sink
    value_notifications: AtomicU64,
    /// Validity notifications sent to the change sink
    validity_notifications: AtomicU64,
    /// Visibility notifications (field and group) sent to the change sink
    visibility_notifications: AtomicU64,
}

impl EngineMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_propagation_runs(&self) {
        self.propagation_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reentrant_drops(&self) {
        self.reentrant_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_evaluation_failures(&self) {
        self.evaluation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_value_notifications(&self) {
        self.value_notifications.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_validity_notifications(&self) {
        self.validity_notifications.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_visibility_notifications(&self) {
        self.visibility_notifications.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            propagation_runs: self.propagation_runs.load(Ordering::Relaxed),
            reentrant_drops: self.reentrant_drops.load(Ordering::Relaxed),
            evaluation_failures: self.evaluation_failures.load(Ordering::Relaxed),
            value_notifications: self.value_notifications.load(Ordering::Relaxed),
            validity_notifications: self.validity_notifications.load(Ordering::Relaxed),
            visibility_notifications: self.visibility_notifications.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    pub propagation_runs: u64,
    pub reentrant_drops: u64,
    pub evaluation_failures: u64,
    pub value_notifications: u64,
    pub validity_notifications: u64,
    pub visibility_notifications: u64,
}
