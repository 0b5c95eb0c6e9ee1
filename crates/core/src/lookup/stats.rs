//! Lookup statistics
//!
//! Counters are per cache instance, even when several regions share a store.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a cache's lookup counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupStats {
    /// Lookups answered from a positive slot (`Found`, `NullValue`, `Key`)
    pub hits: u64,

    /// Lookups answered from a memoized `NotFound`
    pub negative_hits: u64,

    /// Lookups that found no slot in the store
    pub misses: u64,

    /// Calls made to the entity callback
    pub callback_calls: u64,

    /// Slots written to the store
    pub writes: u64,

    /// Slots removed from the store
    pub evictions: u64,
}

impl LookupStats {
    /// Share of store lookups answered without the callback
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_lookups();
        if total == 0 {
            0.0
        } else {
            (self.hits + self.negative_hits) as f64 / total as f64
        }
    }

    pub fn miss_rate(&self) -> f64 {
        if self.total_lookups() == 0 {
            0.0
        } else {
            1.0 - self.hit_rate()
        }
    }

    /// Store lookups (hits + negative hits + misses)
    pub fn total_lookups(&self) -> u64 {
        self.hits + self.negative_hits + self.misses
    }
}

/// Lock-free counters behind [`LookupStats`]
#[derive(Debug, Default)]
pub(crate) struct MetricsCollector {
    hits: AtomicU64,
    negative_hits: AtomicU64,
    misses: AtomicU64,
    callback_calls: AtomicU64,
    writes: AtomicU64,
    evictions: AtomicU64,
}

impl MetricsCollector {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_negative_hit(&self) {
        self.negative_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_callback(&self) {
        self.callback_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> LookupStats {
        LookupStats {
            hits: self.hits.load(Ordering::Relaxed),
            negative_hits: self.negative_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            callback_calls: self.callback_calls.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.negative_hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.callback_calls.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }
}
