//! Engine counters.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    /// Increment by 1.
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Lifecycle and collaborator counters.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    pub decisions_registered: Counter,
    pub proposals_registered: Counter,
    pub votes_recorded: Counter,
    pub quorums_reached: Counter,
    pub decisions_finalized: Counter,
    pub decisions_rejected: Counter,
    pub seals: Counter,
    pub trust_updates: Counter,
    /// History entries or snapshots the store failed to persist
    pub store_failures: Counter,
    /// Events the notifier failed to publish
    pub notifier_failures: Counter,
}

impl EngineMetrics {
    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            decisions_registered: self.decisions_registered.get(),
            proposals_registered: self.proposals_registered.get(),
            votes_recorded: self.votes_recorded.get(),
            quorums_reached: self.quorums_reached.get(),
            decisions_finalized: self.decisions_finalized.get(),
            decisions_rejected: self.decisions_rejected.get(),
            seals: self.seals.get(),
            trust_updates: self.trust_updates.get(),
            store_failures: self.store_failures.get(),
            notifier_failures: self.notifier_failures.get(),
        }
    }
}

/// Serializable copy of [`EngineMetrics`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub decisions_registered: u64,
    pub proposals_registered: u64,
    pub votes_recorded: u64,
    pub quorums_reached: u64,
    pub decisions_finalized: u64,
    pub decisions_rejected: u64,
    pub seals: u64,
    pub trust_updates: u64,
    pub store_failures: u64,
    pub notifier_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let counter = Counter::default();
        counter.inc();
        counter.inc();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_snapshot() {
        let metrics = EngineMetrics::default();
        metrics.seals.inc();
        metrics.store_failures.inc();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.seals, 1);
        assert_eq!(snapshot.store_failures, 1);
        assert_eq!(snapshot.votes_recorded, 0);
    }
}
