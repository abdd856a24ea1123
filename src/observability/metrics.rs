//! Operation-count instrumentation for rankdb
//!
//! - Counters only, exact values
//! - Monotonic except for explicit reset
//! - `Cell`-based: the engine is contractually single-threaded, so no
//!   atomics are needed
//!
//! Probe counters record the exact number of tree nodes an index visits.
//! Complexity properties (a ranked count staying logarithmic while an
//! ordered count grows with the match multiplicity) are asserted against
//! these counts, never against wall clock.

use std::cell::Cell;

/// Counts tree-node visits performed by one index.
#[derive(Debug, Default)]
pub struct ProbeCounter {
    visited: Cell<u64>,
}

impl ProbeCounter {
    /// New counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one node visit
    pub fn bump(&self) {
        self.visited.set(self.visited.get() + 1);
    }

    /// Nodes visited since the last reset
    pub fn get(&self) -> u64 {
        self.visited.get()
    }

    /// Reset to zero
    pub fn reset(&self) {
        self.visited.set(0);
    }
}

/// Container-level operation counters
#[derive(Debug, Default)]
pub struct ContainerMetrics {
    inserts: Cell<u64>,
    rejected_inserts: Cell<u64>,
    erases: Cell<u64>,
}

impl ContainerMetrics {
    /// New registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed insert
    pub fn record_insert(&self) {
        self.inserts.set(self.inserts.get() + 1);
    }

    /// Record an insert rejected by a uniqueness conflict
    pub fn record_rejected_insert(&self) {
        self.rejected_inserts.set(self.rejected_inserts.get() + 1);
    }

    /// Record an erase
    pub fn record_erase(&self) {
        self.erases.set(self.erases.get() + 1);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            inserts: self.inserts.get(),
            rejected_inserts: self.rejected_inserts.get(),
            erases: self.erases.get(),
        }
    }
}

/// Plain-value copy of the container counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Committed inserts
    pub inserts: u64,
    /// Inserts rejected by a unique view
    pub rejected_inserts: u64,
    /// Completed erases
    pub erases: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_counter_bump_and_reset() {
        let probes = ProbeCounter::new();
        assert_eq!(probes.get(), 0);

        probes.bump();
        probes.bump();
        assert_eq!(probes.get(), 2);

        probes.reset();
        assert_eq!(probes.get(), 0);
    }

    #[test]
    fn test_container_metrics_snapshot() {
        let metrics = ContainerMetrics::new();
        metrics.record_insert();
        metrics.record_insert();
        metrics.record_rejected_insert();
        metrics.record_erase();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.inserts, 2);
        assert_eq!(snapshot.rejected_inserts, 1);
        assert_eq!(snapshot.erases, 1);
    }
}
