//! Statistics and metrics for the cache.
//!
//! This module provides atomic counters for tracking cache operations and
//! lifecycle transitions, enabling observability without impacting performance.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for cache operations.
///
/// All counters are atomic and can be safely accessed from multiple threads.
/// Use `Cache::stats()` to get a snapshot of the current statistics.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Reads that found the key (active or inactive).
    hits: AtomicU64,

    /// Reads that found nothing.
    misses: AtomicU64,

    /// Total number of set operations performed.
    sets: AtomicU64,

    /// Sets that created a key.
    inserts: AtomicU64,

    /// Active -> inactive transitions, timer-driven or manual.
    inactivations: AtomicU64,

    /// Sets that brought an inactive entry back to active.
    resurrections: AtomicU64,

    /// Entries removed because their inactive grace period ran out.
    evictions: AtomicU64,

    /// Entries removed by an explicit delete.
    deletes: AtomicU64,

    /// Calls to `clear`, whether or not anything was stored.
    clears: AtomicU64,

    /// Times the mutation hook was invoked.
    notifications: AtomicU64,

    /// Current number of entries in the cache.
    size: AtomicU64,
}

impl CacheStats {
    /// Create a new stats instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a set; `inserted` marks a key seen for the first time.
    pub fn record_set(&self, inserted: bool) {
        self.sets.fetch_add(1, Ordering::Relaxed);
        if inserted {
            self.inserts.fetch_add(1, Ordering::Relaxed);
            self.size.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_inactivation(&self) {
        self.inactivations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resurrection(&self) {
        self.resurrections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
        self.decrement_size();
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.decrement_size();
    }

    pub fn record_clear(&self) {
        self.clears.fetch_add(1, Ordering::Relaxed);
        self.size.store(0, Ordering::Relaxed);
    }

    pub fn record_notification(&self) {
        self.notifications.fetch_add(1, Ordering::Relaxed);
    }

    fn decrement_size(&self) {
        let _ = self
            .size
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    // Getters for reading statistics

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn sets(&self) -> u64 {
        self.sets.load(Ordering::Relaxed)
    }

    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    pub fn inactivations(&self) -> u64 {
        self.inactivations.load(Ordering::Relaxed)
    }

    pub fn resurrections(&self) -> u64 {
        self.resurrections.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    pub fn clears(&self) -> u64 {
        self.clears.load(Ordering::Relaxed)
    }

    pub fn notifications(&self) -> u64 {
        self.notifications.load(Ordering::Relaxed)
    }

    pub fn size(&self) -> u64 {
        self.size.load(Ordering::Relaxed)
    }

    /// Calculate the hit rate as a percentage (0.0 to 100.0).
    /// Returns 0.0 if no reads have been performed.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let misses = self.misses();
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }

    /// Create a snapshot of the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            sets: self.sets(),
            inserts: self.inserts(),
            inactivations: self.inactivations(),
            resurrections: self.resurrections(),
            evictions: self.evictions(),
            deletes: self.deletes(),
            clears: self.clears(),
            notifications: self.notifications(),
            size: self.size(),
            hit_rate: self.hit_rate(),
        }
    }
}

/// A point-in-time snapshot of cache statistics.
///
/// Unlike `CacheStats`, this struct contains plain values (not atomics)
/// and can be easily logged.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub inserts: u64,
    pub inactivations: u64,
    pub resurrections: u64,
    pub evictions: u64,
    pub deletes: u64,
    pub clears: u64,
    pub notifications: u64,
    pub size: u64,
    pub hit_rate: f64,
}
