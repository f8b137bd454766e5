//! Cache usage statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served by the memory tier.
    pub memory_hits: u64,
    /// Reads served by the disk tier (and promoted).
    pub disk_hits: u64,
    /// Reads that found nothing in either tier.
    pub misses: u64,
    /// Memory entries dropped to respect the capacity bound.
    pub evictions: u64,
    /// Memory entries dropped for age.
    pub expirations: u64,
    /// Successful write-throughs to disk.
    pub disk_writes: u64,
    /// Write-throughs that failed and left the entry memory-only.
    pub disk_write_failures: u64,
    /// Disk reads that failed on I/O or decoding and counted as misses.
    pub read_failures: u64,
    /// Live entries currently in the memory tier.
    pub entry_count: u64,
}

impl CacheStats {
    /// Reads served by either tier.
    pub fn hits(&self) -> u64 {
        self.memory_hits + self.disk_hits
    }

    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }
}

/// Lock-free counters owned by the engine.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    memory_hits: AtomicU64,
    disk_hits: AtomicU64,
    misses: AtomicU64,
    disk_writes: AtomicU64,
    disk_write_failures: AtomicU64,
    read_failures: AtomicU64,
}

impl StatsRecorder {
    pub(crate) fn record_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_disk_hit(&self) {
        self.disk_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_disk_write(&self) {
        self.disk_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_disk_write_failure(&self) {
        self.disk_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_read_failure(&self) {
        self.read_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters, filling in the memory tier's own figures.
    pub(crate) fn snapshot(&self, evictions: u64, expirations: u64, entry_count: u64) -> CacheStats {
        CacheStats {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            disk_hits: self.disk_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions,
            expirations,
            disk_writes: self.disk_writes.load(Ordering::Relaxed),
            disk_write_failures: self.disk_write_failures.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            entry_count,
        }
    }
}
