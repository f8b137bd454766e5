//! Configuration types

use crate::{CacheError, CacheResult, ConfigError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Construction parameters for a two-tier cache.
///
/// `concurrency_level` is a sizing hint carried for callers that tune several
/// caches together. The memory tier keeps a single lock so that LRU order is
/// global and exact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache identity. Namespaces the disk directory; fixed after construction.
    pub name: String,
    /// Number of entries the memory tier pre-allocates room for.
    pub initial_capacity: usize,
    /// Upper bound on memory tier entries before LRU eviction kicks in.
    pub max_entries: usize,
    /// Age after which a memory tier entry is treated as absent.
    pub expiration: Duration,
    /// Expected number of concurrently mutating threads.
    pub concurrency_level: usize,
}

impl CacheConfig {
    pub const DEFAULT_INITIAL_CAPACITY: usize = 16;
    pub const DEFAULT_MAX_ENTRIES: usize = 1_000;
    pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(10 * 60);
    pub const DEFAULT_CONCURRENCY_LEVEL: usize = 4;

    /// Create a config with default sizing for the named cache.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
            max_entries: Self::DEFAULT_MAX_ENTRIES,
            expiration: Self::DEFAULT_EXPIRATION,
            concurrency_level: Self::DEFAULT_CONCURRENCY_LEVEL,
        }
    }

    /// Set the initial capacity.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the maximum number of memory tier entries.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Set the expiration duration.
    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    /// Set the expiration duration in whole minutes.
    pub fn with_expiration_minutes(self, minutes: u64) -> Self {
        self.with_expiration(Duration::from_secs(minutes.saturating_mul(60)))
    }

    /// Set the concurrency level hint.
    pub fn with_concurrency_level(mut self, level: usize) -> Self {
        self.concurrency_level = level;
        self
    }

    /// Validate the configuration.
    /// Returns Ok(()) if valid, Err(CacheError::Config) if invalid.
    ///
    /// Validates:
    /// - name is not blank
    /// - max_entries > 0 and initial_capacity <= max_entries
    /// - expiration is positive
    /// - concurrency_level > 0
    pub fn validate(&self) -> CacheResult<()> {
        if self.name.trim().is_empty() {
            return Err(CacheError::Config(ConfigError::MissingRequired {
                field: "name".to_string(),
            }));
        }

        if self.max_entries == 0 {
            return Err(CacheError::Config(ConfigError::InvalidValue {
                field: "max_entries".to_string(),
                value: self.max_entries.to_string(),
                reason: "max_entries must be greater than 0".to_string(),
            }));
        }

        if self.initial_capacity > self.max_entries {
            return Err(CacheError::Config(ConfigError::InvalidValue {
                field: "initial_capacity".to_string(),
                value: self.initial_capacity.to_string(),
                reason: format!("initial_capacity must not exceed max_entries ({})", self.max_entries),
            }));
        }

        if self.expiration.is_zero() {
            return Err(CacheError::Config(ConfigError::InvalidValue {
                field: "expiration".to_string(),
                value: format!("{:?}", self.expiration),
                reason: "expiration must be positive".to_string(),
            }));
        }

        if self.concurrency_level == 0 {
            return Err(CacheError::Config(ConfigError::InvalidValue {
                field: "concurrency_level".to_string(),
                value: self.concurrency_level.to_string(),
                reason: "concurrency_level must be greater than 0".to_string(),
            }));
        }

        Ok(())
    }

    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `CACHEFU_INITIAL_CAPACITY` (default: 16)
    /// - `CACHEFU_MAX_ENTRIES` (default: 1000)
    /// - `CACHEFU_EXPIRATION_SECS` (default: 600)
    /// - `CACHEFU_CONCURRENCY_LEVEL` (default: 4)
    pub fn from_env(name: impl Into<String>) -> Self {
        let defaults = Self::new(name);

        Self {
            initial_capacity: env_parse("CACHEFU_INITIAL_CAPACITY")
                .unwrap_or(defaults.initial_capacity),
            max_entries: env_parse("CACHEFU_MAX_ENTRIES").unwrap_or(defaults.max_entries),
            expiration: env_parse("CACHEFU_EXPIRATION_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.expiration),
            concurrency_level: env_parse("CACHEFU_CONCURRENCY_LEVEL")
                .unwrap_or(defaults.concurrency_level),
            name: defaults.name,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CacheConfig::new("images");
        assert!(config.validate().is_ok());
        assert_eq!(config.expiration, Duration::from_secs(600));
    }

    #[test]
    fn test_builder_setters() {
        let config = CacheConfig::new("thumbs")
            .with_initial_capacity(8)
            .with_max_entries(64)
            .with_expiration_minutes(2)
            .with_concurrency_level(2);

        assert_eq!(config.initial_capacity, 8);
        assert_eq!(config.max_entries, 64);
        assert_eq!(config.expiration, Duration::from_secs(120));
        assert_eq!(config.concurrency_level, 2);
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = CacheConfig::new("   ").validate().unwrap_err();
        assert!(matches!(
            err,
            CacheError::Config(ConfigError::MissingRequired { ref field }) if field == "name"
        ));
    }

    #[test]
    fn test_zero_max_entries_rejected() {
        let err = CacheConfig::new("x")
            .with_initial_capacity(0)
            .with_max_entries(0)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            CacheError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "max_entries"
        ));
    }

    #[test]
    fn test_initial_capacity_above_max_rejected() {
        let err = CacheConfig::new("x")
            .with_initial_capacity(10)
            .with_max_entries(5)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            CacheError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "initial_capacity"
        ));
    }

    #[test]
    fn test_zero_expiration_rejected() {
        let err = CacheConfig::new("x")
            .with_expiration(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            CacheError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "expiration"
        ));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = CacheConfig::new("x")
            .with_concurrency_level(0)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            CacheError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "concurrency_level"
        ));
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = CacheConfig::new("remote images").with_max_entries(250);
        let json = serde_json::to_string(&config).unwrap();
        let back: CacheConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
