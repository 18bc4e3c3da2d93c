//! Cache Statistics Module
//!
//! Tracks cache effectiveness: hits, misses, fetches and invalidations.

use serde::Serialize;

// == Cache Stats ==
/// Counters maintained by the cache store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Requests answered from a valid local entry
    pub hits: u64,
    /// Requests that needed a remote fetch (entry missing, stale or corrupt)
    pub misses: u64,
    /// Remote fetches that failed
    pub fetch_failures: u64,
    /// Local payloads that could not be parsed
    pub corrupt_reads: u64,
    /// Single-key invalidations
    pub invalidations: u64,
    /// Full invalidations (`invalidate_all`)
    pub flushes: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_fetch_failure(&mut self) {
        self.fetch_failures += 1;
    }

    pub fn record_corrupt_read(&mut self) {
        self.corrupt_reads += 1;
    }

    pub fn record_invalidation(&mut self) {
        self.invalidations += 1;
    }

    pub fn record_flush(&mut self) {
        self.flushes += 1;
    }
}
