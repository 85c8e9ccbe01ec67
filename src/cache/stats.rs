//! Cache Statistics Module
//!
//! Tracks where reads were served from and how often the persistent tier misbehaved.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Reads served from the fast tier
    pub fast_hits: u64,
    /// Reads served from the persistent tier and promoted
    pub persistent_hits: u64,
    /// Reads that found nothing usable
    pub misses: u64,
    /// Entries found stale and evicted during a read or purge
    pub expirations: u64,
    /// Persistent tier failures swallowed by the cache
    pub storage_errors: u64,
    /// Current number of entries in the fast tier
    pub fast_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate across both tiers.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.fast_hits + self.persistent_hits;
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    // == Record Fast Hit ==
    /// Increments the fast-tier hit counter.
    pub fn record_fast_hit(&mut self) {
        self.fast_hits += 1;
    }

    // == Record Persistent Hit ==
    /// Increments the persistent-tier hit counter.
    pub fn record_persistent_hit(&mut self) {
        self.persistent_hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Expiration ==
    /// Increments the expiration counter.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    // == Record Storage Error ==
    /// Increments the storage error counter.
    pub fn record_storage_error(&mut self) {
        self.storage_errors += 1;
    }

    // == Update Entry Count ==
    /// Updates the fast-tier entry count.
    pub fn set_fast_entries(&mut self, count: usize) {
        self.fast_entries = count;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats, CacheStats::default());
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_counts_both_tiers() {
        let mut stats = CacheStats::new();
        stats.record_fast_hit();
        stats.record_persistent_hit();
        stats.record_miss();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_hit_rate_all_misses() {
        let mut stats = CacheStats::new();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_error_and_expiration_counters() {
        let mut stats = CacheStats::new();
        stats.record_storage_error();
        stats.record_expiration();
        stats.record_expiration();
        stats.set_fast_entries(3);

        assert_eq!(stats.storage_errors, 1);
        assert_eq!(stats.expirations, 2);
        assert_eq!(stats.fast_entries, 3);
    }
}
