//! Read results carrying tier and age metadata.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// The tier that served a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Served from the in-memory tier.
    Memory,
    /// Served from the disk tier and promoted into memory.
    Disk,
}

/// Result of a cache read, carrying where it came from and when it was cached.
///
/// For memory hits `cached_at` is the time the value entered the memory tier.
/// For disk hits it is the modification time of the value's file, i.e. when
/// it was last written through.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    cached_at: DateTime<Utc>,
    tier: Tier,
}

impl<T> CacheRead<T> {
    /// Create a read served by the memory tier.
    pub fn from_memory(value: T, cached_at: DateTime<Utc>) -> Self {
        Self {
            value,
            cached_at,
            tier: Tier::Memory,
        }
    }

    /// Create a read served by the disk tier.
    pub fn from_disk(value: T, cached_at: DateTime<Utc>) -> Self {
        Self {
            value,
            cached_at,
            tier: Tier::Disk,
        }
    }

    /// Consume the wrapper and return the underlying value.
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn was_memory_hit(&self) -> bool {
        self.tier == Tier::Memory
    }

    pub fn was_disk_hit(&self) -> bool {
        self.tier == Tier::Disk
    }

    pub fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    /// Time elapsed since the value was cached. Zero if the clock went back.
    pub fn age(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.cached_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Returns true if the value was cached at or after `timestamp`.
    pub fn is_fresh_as_of(&self, timestamp: DateTime<Utc>) -> bool {
        self.cached_at >= timestamp
    }

    /// Map the inner value to a new type.
    pub fn map<U, F>(self, f: F) -> CacheRead<U>
    where
        F: FnOnce(T) -> U,
    {
        CacheRead {
            value: f(self.value),
            cached_at: self.cached_at,
            tier: self.tier,
        }
    }
}

impl<T> AsRef<T> for CacheRead<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

impl<T> AsMut<T> for CacheRead<T> {
    fn as_mut(&mut self) -> &mut T {
        &mut self.value
    }
}
