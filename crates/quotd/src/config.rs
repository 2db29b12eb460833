//! Layered configuration for quotd.
//!
//! Sources, later overriding earlier:
//! 1. Bundled defaults (`quotd.toml` compiled into the binary)
//! 2. `~/.config/quotd/quotd.toml`
//! 3. `./quotd.toml`

use crate::ProviderKind;
use config::{Config, File, FileFormat};
use derive_getters::Getters;
use quotd_cache::CacheConfig;
use quotd_error::{ConfigError, ConfigErrorKind};
use quotd_rate_limit::{RateLimitConfig, RetryConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG: &str = include_str!("../../../quotd.toml");

/// One upstream quote provider.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct ProviderConfig {
    /// Display name, used in logs and as the quote origin
    name: String,
    /// Response shape
    kind: ProviderKind,
    /// Endpoint to GET
    url: String,
    /// Per-request timeout (milliseconds)
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl ProviderConfig {
    /// Provider with the default timeout.
    pub fn new(name: impl Into<String>, kind: ProviderKind, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            url: url.into(),
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Top-level quotd configuration.
///
/// # Example
///
/// ```no_run
/// use quotd::QuotdConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = QuotdConfig::load()?;
/// println!("{} providers", config.providers().len());
/// # Ok(())
/// # }
/// ```
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct QuotdConfig {
    /// Offline cache
    #[serde(default)]
    cache: CacheConfig,
    /// Token buckets
    #[serde(default)]
    rate_limit: RateLimitConfig,
    /// Backoff
    #[serde(default)]
    retry: RetryConfig,
    /// Providers in failover order
    #[serde(default)]
    providers: Vec<ProviderConfig>,
    /// Where the cache is persisted; platform data dir when unset
    #[serde(default)]
    storage_dir: Option<PathBuf>,
}

impl QuotdConfig {
    /// Load with precedence: `./quotd.toml` > user config > bundled defaults.
    ///
    /// Missing user files are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a file exists but cannot be parsed, or the merged
    /// values fail validation.
    #[tracing::instrument]
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/quotd/quotd.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("quotd").required(false));

        Self::build(builder)
    }

    /// Load the bundled defaults overlaid with a single file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or invalid.
    #[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()));
        Self::build(builder)
    }

    /// Parse a TOML document on its own, without the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or invalid.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Self::build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let config: Self = builder
            .build()
            .map_err(|e| ConfigError::new(ConfigErrorKind::Load(e.to_string())))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(ConfigErrorKind::Parse(e.to_string())))?;
        config.validate()?;
        tracing::debug!(
            providers = config.providers.len(),
            cache_max_size = config.cache.max_size(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate()?;
        self.rate_limit.validate()?;
        self.retry.validate()?;
        for provider in &self.providers {
            if provider.name.trim().is_empty() {
                return Err(ConfigError::invalid("providers.name", "must not be empty"));
            }
            if reqwest::Url::parse(&provider.url).is_err() {
                return Err(ConfigError::invalid(
                    format!("providers.{}.url", provider.name),
                    format!("'{}' is not a valid URL", provider.url),
                ));
            }
        }
        Ok(())
    }
}
