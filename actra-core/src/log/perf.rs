//! Per-resource performance accumulation for one action.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Accumulated performance numbers for one resource (e.g. `db`, `http`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceStat {
    /// Number of operations tracked.
    pub count: u64,
    /// Total elapsed time across operations, in nanoseconds.
    pub total_elapsed: u64,
    /// Total entries read (rows fetched, messages consumed).
    pub read_entries: u64,
    /// Total entries written (rows updated, messages produced).
    pub write_entries: u64,
}

/// Per-action map of resource name to [`PerformanceStat`].
///
/// Owned by exactly one action and mutated only by its owning thread, so no
/// synchronization is needed.
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    stats: HashMap<String, PerformanceStat>,
}

impl PerformanceTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self {
            // common resources: db, http, cache, kafka, elasticsearch
            stats: HashMap::with_capacity(8),
        }
    }

    /// Track one operation against a resource and return the running count.
    ///
    /// The count lets the caller emit a detailed log line only on the first
    /// use of a resource within an action.
    pub fn track(
        &mut self,
        resource: &str,
        elapsed_nanos: u64,
        read_entries: u64,
        write_entries: u64,
    ) -> u64 {
        let stat = self.stats.entry(resource.to_string()).or_default();
        stat.count += 1;
        stat.total_elapsed += elapsed_nanos;
        stat.read_entries += read_entries;
        stat.write_entries += write_entries;
        stat.count
    }

    /// Get the stat for a resource, if any was tracked.
    pub fn get(&self, resource: &str) -> Option<&PerformanceStat> {
        self.stats.get(resource)
    }

    /// Check if nothing was tracked.
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Consume the tracker and return the accumulated map.
    pub fn into_stats(self) -> HashMap<String, PerformanceStat> {
        self.stats
    }
}
