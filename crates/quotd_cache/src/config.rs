//! Cache configuration.

use derive_getters::Getters;
use quotd_error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the quote cache.
///
/// # Example
///
/// ```
/// use quotd_cache::CacheConfig;
///
/// let config = CacheConfig::default().with_max_size(10);
/// assert_eq!(*config.max_size(), 10);
/// assert_eq!(*config.default_ttl_secs(), 86_400);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
pub struct CacheConfig {
    /// Default TTL for cached entries (seconds)
    #[serde(default = "default_ttl_secs")]
    default_ttl_secs: u64,

    /// Maximum cache size (number of entries)
    #[serde(default = "default_max_size")]
    max_size: usize,

    /// Key the entry set is persisted under
    #[serde(default = "default_storage_key")]
    storage_key: String,

    /// Weight decay per position for fallback selection, in (0, 1]
    #[serde(default = "default_decay_factor")]
    decay_factor: f64,

    /// Whether caching is enabled
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_max_size() -> usize {
    100
}

fn default_storage_key() -> String {
    "quotd.cache".to_string()
}

fn default_decay_factor() -> f64 {
    0.9
}

fn default_enabled() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl_secs(),
            max_size: default_max_size(),
            storage_key: default_storage_key(),
            decay_factor: default_decay_factor(),
            enabled: default_enabled(),
        }
    }
}

impl CacheConfig {
    /// Creates a new cache config builder.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Default TTL as a [`Duration`].
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// Rejects values the cache cannot operate with.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty storage key or a decay factor outside (0, 1].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::invalid("cache.storage_key", "must not be empty"));
        }
        if !(self.decay_factor > 0.0 && self.decay_factor <= 1.0) {
            return Err(ConfigError::invalid(
                "cache.decay_factor",
                format!("must be in (0.0, 1.0], got {}", self.decay_factor),
            ));
        }
        Ok(())
    }
}
