//! Two-tier cache engine.
//!
//! Reads check the memory tier, then the disk tier; a disk hit is promoted
//! into memory before it is returned (read-through). Inserts are written to
//! disk first, when enabled, and then to memory (write-through).
//!
//! # Locking
//!
//! One engine-wide mutex serializes `get`, `put`, `remove`, `contains_key`,
//! `contains_value`, `len`, `is_empty`, `clear` and `wipe`. The snapshot
//! accessors `keys`, `values` and `entries` only take the memory tier's
//! internal lock, so they may interleave with an in-flight engine operation
//! and reflect the memory tier at some point during it. They never reflect
//! mutations made after they return.
//!
//! Disk I/O runs on the calling thread under the engine lock and has no
//! timeout. Callers needing bounded latency must impose their own.

use std::fmt;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use cachefu_core::{
    CacheConfig, CacheError, CacheResult, Codec, DirectoryResolver, DiskError, JsonCodec,
    KeyNamer, Sha256KeyNamer, StorageLocation,
};

use crate::disk::DiskTier;
use crate::memory::MemoryTier;
use crate::read::CacheRead;
use crate::stats::{CacheStats, StatsRecorder};

/// A bounded, expiring memory cache with optional write-through to disk.
///
/// # Type Parameters
///
/// - `K`: key type
/// - `V`: value type; values are cloned out on reads
/// - `C`: the [`Codec`] used to store values on disk
/// - `N`: the [`KeyNamer`] mapping keys to file names
///
/// # Example
///
/// ```no_run
/// use cachefu_storage::{CacheConfig, FixedRoot, StorageLocation, TwoTierCache};
///
/// let mut cache: TwoTierCache<String, String> =
///     TwoTierCache::with_json(CacheConfig::new("ImageUrls")).unwrap();
/// cache.enable_disk_cache(&FixedRoot::new("/var/cache/app"), StorageLocation::Internal);
///
/// cache.put("logo".to_string(), "https://example.com/logo.png".to_string());
/// assert!(cache.get(&"logo".to_string()).is_some());
/// ```
pub struct TwoTierCache<K, V, C = JsonCodec<V>, N = Sha256KeyNamer> {
    config: CacheConfig,
    memory: MemoryTier<K, V>,
    disk: DiskTier<K, V, C, N>,
    op_lock: Mutex<()>,
    stats: StatsRecorder,
}

impl<K, V, C, N> fmt::Debug for TwoTierCache<K, V, C, N>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoTierCache")
            .field("config", &self.config)
            .field("memory", &self.memory)
            .field("disk", &self.disk)
            .finish_non_exhaustive()
    }
}

/// A key the namer cannot turn into a safe file name never reaches disk.
fn is_unnameable(err: &CacheError) -> bool {
    matches!(err, CacheError::Disk(DiskError::InvalidFileName { .. }))
}

impl<K, V> TwoTierCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
    JsonCodec<V>: Codec<V>,
    Sha256KeyNamer: KeyNamer<K>,
{
    /// Create a cache storing values as JSON under SHA-256 file names.
    pub fn with_json(config: CacheConfig) -> CacheResult<Self> {
        Self::new(config, JsonCodec::new(), Sha256KeyNamer)
    }
}

impl<K, V, C, N> TwoTierCache<K, V, C, N>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Codec<V>,
    N: KeyNamer<K>,
{
    /// Create a memory-only cache. Call [`Self::enable_disk_cache`] to add the
    /// disk tier.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Config` if the config does not validate.
    pub fn new(config: CacheConfig, codec: C, namer: N) -> CacheResult<Self> {
        config.validate()?;
        Ok(Self {
            memory: MemoryTier::from_config(&config),
            disk: DiskTier::new(config.name.clone(), codec, namer),
            config,
            op_lock: Mutex::new(()),
            stats: StatsRecorder::default(),
        })
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.op_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // === Disk enablement ===

    /// Enable write-through to disk under the root chosen by `resolver`.
    ///
    /// Returns whether disk caching is active. Failure is logged once here
    /// and the cache becomes memory-only, even if disk was enabled before.
    pub fn enable_disk_cache<R>(&mut self, resolver: &R, location: StorageLocation) -> bool
    where
        R: DirectoryResolver + ?Sized,
    {
        match resolver.resolve(location) {
            Some(root) => self.enable_disk_cache_at(root),
            None => {
                self.disk.disable();
                tracing::warn!(
                    cache = %self.config.name,
                    ?location,
                    "no storage root available; disk cache disabled"
                );
                false
            }
        }
    }

    /// Enable write-through to disk under `root`.
    ///
    /// Returns whether disk caching is active. A failed call disables any
    /// previously enabled directory.
    pub fn enable_disk_cache_at(&mut self, root: impl AsRef<Path>) -> bool {
        let name = &self.config.name;
        match self.disk.enable(root.as_ref()) {
            Ok(dir) => {
                tracing::debug!(cache = %name, directory = %dir.display(), "enabled write-through to disk");
                true
            }
            Err(e) => {
                tracing::warn!(cache = %name, error = %e, "failed creating disk cache directory");
                false
            }
        }
    }

    pub fn is_disk_cache_enabled(&self) -> bool {
        self.disk.is_enabled()
    }

    pub fn disk_cache_directory(&self) -> Option<&Path> {
        self.disk.directory()
    }

    /// Path of the file that holds `key` on disk, when disk caching is on.
    pub fn file_path_for(&self, key: &K) -> Option<PathBuf> {
        self.disk.file_path(key).ok()
    }

    // === Reads ===

    /// Get a value, consulting memory then disk.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_entry(key).map(CacheRead::into_value)
    }

    /// Get a value along with the tier that served it and when it was cached.
    pub fn get_entry(&self, key: &K) -> Option<CacheRead<V>> {
        let _guard = self.guard();

        if let Some((value, cached_at)) = self.memory.get_entry(key) {
            self.stats.record_memory_hit();
            tracing::debug!(cache = %self.config.name, "memory cache hit");
            return Some(CacheRead::from_memory(value, cached_at));
        }

        if !self.disk.is_enabled() {
            self.stats.record_miss();
            return None;
        }

        match self.disk.read(key) {
            Ok(Some((value, modified_at))) => {
                tracing::debug!(cache = %self.config.name, "disk cache hit, promoting to memory");
                self.memory.put(key.clone(), value.clone());
                self.stats.record_disk_hit();
                Some(CacheRead::from_disk(value, modified_at))
            }
            Ok(None) => {
                self.stats.record_miss();
                None
            }
            Err(e) if is_unnameable(&e) => {
                tracing::trace!(cache = %self.config.name, "key has no disk name, memory miss only");
                self.stats.record_miss();
                None
            }
            Err(e) => {
                tracing::warn!(cache = %self.config.name, error = %e, "disk cache read failed, treating as miss");
                self.stats.record_read_failure();
                self.stats.record_miss();
                None
            }
        }
    }

    /// Whether either tier holds `key`. Disk is only checked on a memory miss.
    pub fn contains_key(&self, key: &K) -> bool {
        let _guard = self.guard();
        self.memory.contains_key(key) || self.disk.exists(key)
    }

    /// Whether the memory tier holds `value`. Disk is not scanned.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        let _guard = self.guard();
        self.memory.contains_value(value)
    }

    /// Number of live memory entries.
    pub fn len(&self) -> usize {
        let _guard = self.guard();
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        let _guard = self.guard();
        self.memory.is_empty()
    }

    // === Writes ===

    /// Insert a value, writing through to disk first when enabled.
    ///
    /// Returns the previous memory value. A failed disk write is logged and
    /// the entry becomes memory-only; any older file for the key is deleted
    /// so the disk tier never serves a superseded value.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let _guard = self.guard();

        if self.disk.is_enabled() {
            match self.disk.write(&key, &value) {
                Ok(()) => self.stats.record_disk_write(),
                Err(e) => {
                    tracing::warn!(cache = %self.config.name, error = %e, "disk write failed, entry kept in memory only");
                    self.stats.record_disk_write_failure();
                    // An unnameable key has no file to drop.
                    let stale = if is_unnameable(&e) {
                        Ok(false)
                    } else {
                        self.disk.remove(&key)
                    };
                    if let Err(e) = stale {
                        tracing::warn!(cache = %self.config.name, error = %e, "failed to drop stale disk entry");
                    }
                }
            }
        }

        self.memory.put(key, value)
    }

    /// Bulk insert is not supported; every insert goes through [`Self::put`].
    ///
    /// # Errors
    ///
    /// Always returns `CacheError::UnsupportedOperation`, whatever the input.
    pub fn put_all<I>(&self, _entries: I) -> CacheResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Err(CacheError::UnsupportedOperation {
            operation: "put_all",
        })
    }

    /// Remove `key` from both tiers. Returns the removed memory value.
    pub fn remove(&self, key: &K) -> Option<V> {
        let _guard = self.guard();
        let previous = self.memory.remove(key);
        match self.disk.remove(key) {
            Err(e) if !is_unnameable(&e) => {
                tracing::warn!(cache = %self.config.name, error = %e, "failed to remove disk entry");
            }
            _ => {}
        }
        previous
    }

    /// Clear the memory tier. Disk files are untouched; see [`Self::wipe`].
    pub fn clear(&self) {
        let _guard = self.guard();
        self.memory.clear();
    }

    /// Delete every file of the disk tier. Returns the number deleted.
    ///
    /// The memory tier is untouched; call [`Self::clear`] as well to drop
    /// everything.
    pub fn wipe(&self) -> u64 {
        let _guard = self.guard();
        match self.disk.clear() {
            Ok(removed) => {
                tracing::debug!(cache = %self.config.name, removed, "wiped disk cache");
                removed
            }
            Err(e) => {
                tracing::warn!(cache = %self.config.name, error = %e, "failed to wipe disk cache");
                0
            }
        }
    }

    // === Snapshots (weakly consistent, not under the engine lock) ===

    /// Live memory keys, least recently used first.
    pub fn keys(&self) -> Vec<K> {
        self.memory.keys()
    }

    /// Live memory values, least recently used first.
    pub fn values(&self) -> Vec<V> {
        self.memory.values()
    }

    /// Live memory entries, least recently used first.
    pub fn entries(&self) -> Vec<(K, V)> {
        self.memory.entries()
    }

    /// Current usage statistics.
    pub fn stats(&self) -> CacheStats {
        let entry_count = self.memory.len() as u64;
        self.stats.snapshot(
            self.memory.evictions(),
            self.memory.expirations(),
            entry_count,
        )
    }
}
