//! Bounded, time-expiring memory tier.
//!
//! A single mutex guards both the map and the recency order, so eviction
//! always removes the globally least-recently-used entry. Recency is tracked
//! with a monotonically increasing tick per access, indexed in a `BTreeMap`
//! so the LRU victim is the first key of the order index.
//!
//! Entries expire a fixed duration after insertion. Expired entries are
//! treated as absent and removed lazily by whichever operation finds them.
//! Reads refresh recency but never the expiration clock.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use cachefu_core::CacheConfig;
use chrono::{DateTime, Utc};

/// A live memory entry.
#[derive(Debug)]
struct Slot<V> {
    value: V,
    /// Monotonic insertion time, drives expiration.
    inserted_at: Instant,
    /// Wall-clock insertion time, reported to callers.
    cached_at: DateTime<Utc>,
    /// Position in the recency order.
    tick: u64,
}

impl<V> Slot<V> {
    fn is_expired(&self, expiration: Duration) -> bool {
        self.inserted_at.elapsed() >= expiration
    }
}

#[derive(Debug)]
struct LruState<K, V> {
    map: HashMap<K, Slot<V>>,
    /// tick -> key, oldest first.
    order: BTreeMap<u64, K>,
    next_tick: u64,
    evictions: u64,
    expirations: u64,
}

impl<K, V> LruState<K, V>
where
    K: Eq + Hash + Clone,
{
    fn bump(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }

    fn touch(&mut self, key: &K) {
        let tick = self.bump();
        if let Some(slot) = self.map.get_mut(key) {
            self.order.remove(&slot.tick);
            slot.tick = tick;
            self.order.insert(tick, key.clone());
        }
    }

    fn detach(&mut self, key: &K) -> Option<Slot<V>> {
        let slot = self.map.remove(key)?;
        self.order.remove(&slot.tick);
        Some(slot)
    }

    /// Drop `key` if its entry has expired. Returns true if it was dropped.
    fn expire_if_stale(&mut self, key: &K, expiration: Duration) -> bool {
        let stale = self
            .map
            .get(key)
            .is_some_and(|slot| slot.is_expired(expiration));
        if stale {
            self.detach(key);
            self.expirations += 1;
        }
        stale
    }

    fn purge_expired(&mut self, expiration: Duration) -> usize {
        let stale: Vec<K> = self
            .map
            .iter()
            .filter(|(_, slot)| slot.is_expired(expiration))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            self.detach(key);
        }
        self.expirations += stale.len() as u64;
        stale.len()
    }

    /// Live entries, least recently used first.
    fn live(&self, expiration: Duration) -> impl Iterator<Item = (&K, &Slot<V>)> + '_ {
        self.order.values().filter_map(move |key| {
            self.map
                .get(key)
                .filter(|slot| !slot.is_expired(expiration))
                .map(|slot| (key, slot))
        })
    }
}

/// Concurrent, bounded, time-expiring key-value store.
///
/// Never fails: there is no I/O, and a poisoned lock is recovered because
/// every mutation leaves the map and order index consistent before it can
/// panic.
#[derive(Debug)]
pub struct MemoryTier<K, V> {
    state: Mutex<LruState<K, V>>,
    max_entries: usize,
    expiration: Duration,
}

impl<K, V> MemoryTier<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a memory tier.
    ///
    /// `max_entries` is clamped to at least 1.
    pub fn new(initial_capacity: usize, max_entries: usize, expiration: Duration) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            state: Mutex::new(LruState {
                map: HashMap::with_capacity(initial_capacity.min(max_entries)),
                order: BTreeMap::new(),
                next_tick: 0,
                evictions: 0,
                expirations: 0,
            }),
            max_entries,
            expiration,
        }
    }

    /// Create a memory tier sized from a cache config.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.initial_capacity, config.max_entries, config.expiration)
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    fn state(&self) -> MutexGuard<'_, LruState<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a live value and mark it most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_entry(key).map(|(value, _)| value)
    }

    /// Get a live value together with its insertion time.
    pub fn get_entry(&self, key: &K) -> Option<(V, DateTime<Utc>)> {
        let mut state = self.state();
        if state.expire_if_stale(key, self.expiration) {
            tracing::trace!("memory entry expired on lookup");
            return None;
        }
        let found = state
            .map
            .get(key)
            .map(|slot| (slot.value.clone(), slot.cached_at))?;
        state.touch(key);
        Some(found)
    }

    /// Insert or overwrite an entry with a fresh timestamp.
    ///
    /// Returns the previous live value. When the insert pushes the tier over
    /// `max_entries`, expired entries are dropped first and then the least
    /// recently used live entry is evicted.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let mut state = self.state();
        let previous = if state.expire_if_stale(&key, self.expiration) {
            None
        } else {
            state.detach(&key).map(|slot| slot.value)
        };

        let tick = state.bump();
        state.order.insert(tick, key.clone());
        state.map.insert(
            key,
            Slot {
                value,
                inserted_at: Instant::now(),
                cached_at: Utc::now(),
                tick,
            },
        );

        // Expired entries may sit at the MRU end; drop them before any live
        // entry is evicted.
        if state.map.len() > self.max_entries {
            let purged = state.purge_expired(self.expiration);
            if purged > 0 {
                tracing::trace!(purged, "dropped expired entries before eviction");
            }
        }

        while state.map.len() > self.max_entries {
            let Some((_, victim)) = state.order.pop_first() else {
                break;
            };
            if let Some(slot) = state.map.remove(&victim) {
                if slot.is_expired(self.expiration) {
                    state.expirations += 1;
                } else {
                    state.evictions += 1;
                    tracing::trace!(max_entries = self.max_entries, "evicted least recently used entry");
                }
            }
        }

        previous
    }

    /// Remove an entry, returning its value if it was live.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut state = self.state();
        if state.expire_if_stale(key, self.expiration) {
            return None;
        }
        state.detach(key).map(|slot| slot.value)
    }

    /// Whether a live entry exists. Does not affect recency.
    pub fn contains_key(&self, key: &K) -> bool {
        let mut state = self.state();
        if state.expire_if_stale(key, self.expiration) {
            return false;
        }
        state.map.contains_key(key)
    }

    /// Whether any live entry holds `value`. Linear in the number of entries.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        let state = self.state();
        let found = state.live(self.expiration).any(|(_, slot)| slot.value == *value);
        found
    }

    /// Number of live entries. Purges expired entries first.
    pub fn len(&self) -> usize {
        let mut state = self.state();
        state.purge_expired(self.expiration);
        state.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut state = self.state();
        state.map.clear();
        state.order.clear();
    }

    /// Remove all expired entries now, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.state().purge_expired(self.expiration)
    }

    /// Snapshot of live keys, least recently used first.
    pub fn keys(&self) -> Vec<K> {
        let state = self.state();
        state.live(self.expiration).map(|(key, _)| key.clone()).collect()
    }

    /// Snapshot of live values, least recently used first.
    pub fn values(&self) -> Vec<V> {
        let state = self.state();
        state
            .live(self.expiration)
            .map(|(_, slot)| slot.value.clone())
            .collect()
    }

    /// Snapshot of live entries, least recently used first.
    pub fn entries(&self) -> Vec<(K, V)> {
        let state = self.state();
        state
            .live(self.expiration)
            .map(|(key, slot)| (key.clone(), slot.value.clone()))
            .collect()
    }

    /// Total capacity evictions since creation.
    pub fn evictions(&self) -> u64 {
        self.state().evictions
    }

    /// Total entries dropped for age since creation.
    pub fn expirations(&self) -> u64 {
        self.state().expirations
    }
}
