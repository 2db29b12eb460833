//! Configuration structures for rate limiting and retry.
//!
//! Both structs deserialize from the `[rate_limit]` and `[retry]` tables of
//! `quotd.toml`; every field has a default, so partial tables are fine.
//!
//! ```toml
//! [rate_limit]
//! capacity = 10
//! window_ms = 60_000
//! mode = "per_endpoint"
//!
//! [retry]
//! max_retries = 3
//! retryable_statuses = [0, 500, 502, 503, 504]
//! ```

use derive_getters::Getters;
use quotd_error::{ConfigError, NETWORK_ERROR_STATUS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How requests are grouped into token buckets.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BucketMode {
    /// One bucket per distinct host and path
    #[default]
    PerEndpoint,
    /// A single bucket shared by every request
    Global,
}

/// Token bucket settings.
///
/// Tokens refill continuously at `capacity / window_ms`. Requests that find
/// the bucket empty wait in a FIFO queue of at most `max_queue_size`
/// entries for up to `queue_timeout_ms`.
///
/// # Example
///
/// ```
/// use quotd_rate_limit::RateLimitConfig;
///
/// let config = RateLimitConfig::default().with_capacity(5);
/// assert_eq!(*config.capacity(), 5);
/// assert_eq!(config.token_interval().as_millis(), 12_000);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
pub struct RateLimitConfig {
    /// Maximum tokens per bucket
    #[serde(default = "default_capacity")]
    capacity: u32,

    /// Time for an empty bucket to refill completely (milliseconds)
    #[serde(default = "default_window_ms")]
    window_ms: u64,

    /// Maximum queued requests per bucket
    #[serde(default = "default_max_queue_size")]
    max_queue_size: usize,

    /// How long a queued request may wait (milliseconds)
    #[serde(default = "default_queue_timeout_ms")]
    queue_timeout_ms: u64,

    /// Bucket grouping
    #[serde(default)]
    mode: BucketMode,

    /// Whether rate limiting is enabled
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_capacity() -> u32 {
    10
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_max_queue_size() -> usize {
    20
}

fn default_queue_timeout_ms() -> u64 {
    5_000
}

fn default_enabled() -> bool {
    true
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            window_ms: default_window_ms(),
            max_queue_size: default_max_queue_size(),
            queue_timeout_ms: default_queue_timeout_ms(),
            mode: BucketMode::default(),
            enabled: default_enabled(),
        }
    }
}

impl RateLimitConfig {
    /// Creates a new rate limit config builder.
    pub fn builder() -> RateLimitConfigBuilder {
        RateLimitConfigBuilder::default()
    }

    /// Refill window as a [`Duration`].
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Queue timeout as a [`Duration`].
    pub fn queue_timeout(&self) -> Duration {
        Duration::from_millis(self.queue_timeout_ms)
    }

    /// Time for one token to regenerate, `ceil(window_ms / capacity)`.
    pub fn token_interval(&self) -> Duration {
        let capacity = u64::from(self.capacity.max(1));
        Duration::from_millis(self.window_ms.div_ceil(capacity))
    }

    /// Rejects settings the limiter cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error if `capacity` or `window_ms` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::invalid(
                "rate_limit.capacity",
                "must be greater than zero",
            ));
        }
        if self.window_ms == 0 {
            return Err(ConfigError::invalid(
                "rate_limit.window_ms",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Retry settings.
///
/// Delays grow as `min(base_delay_ms * 2^attempt, max_delay_ms)` and are
/// then stretched by up to `max_jitter` (0.3 = 30%).
///
/// # Example
///
/// ```
/// use quotd_rate_limit::RetryConfig;
///
/// let config = RetryConfig::default();
/// assert_eq!(*config.max_retries(), 3);
/// assert!(config.retryable_statuses().contains(&503));
/// assert!(config.is_exempt_method("post"));
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
pub struct RetryConfig {
    /// Additional attempts after the first
    #[serde(default = "default_max_retries")]
    max_retries: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(default = "default_base_delay_ms")]
    base_delay_ms: u64,

    /// Cap on the un-jittered delay (milliseconds)
    #[serde(default = "default_max_delay_ms")]
    max_delay_ms: u64,

    /// Upper bound of the positive jitter fraction
    #[serde(default = "default_max_jitter")]
    max_jitter: f64,

    /// Statuses treated as transient; 0 stands for network failures
    #[serde(default = "default_retryable_statuses")]
    retryable_statuses: Vec<u16>,

    /// Methods that are never retried
    #[serde(default = "default_exempt_methods")]
    exempt_methods: Vec<String>,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_max_jitter() -> f64 {
    0.3
}

fn default_retryable_statuses() -> Vec<u16> {
    vec![500, 502, 503, 504, NETWORK_ERROR_STATUS]
}

fn default_exempt_methods() -> Vec<String> {
    ["POST", "PUT", "DELETE"].map(String::from).to_vec()
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_jitter: default_max_jitter(),
            retryable_statuses: default_retryable_statuses(),
            exempt_methods: default_exempt_methods(),
        }
    }
}

impl RetryConfig {
    /// Creates a new retry config builder.
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::default()
    }

    /// Whether `method` is exempt from retry (case-insensitive).
    pub fn is_exempt_method(&self, method: &str) -> bool {
        self.exempt_methods
            .iter()
            .any(|exempt| exempt.eq_ignore_ascii_case(method))
    }

    /// Rejects settings the policy cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error for a jitter outside `0.0..=1.0`, or a base delay
    /// above the cap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.max_jitter) {
            return Err(ConfigError::invalid(
                "retry.max_jitter",
                format!("must be between 0.0 and 1.0, got {}", self.max_jitter),
            ));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(ConfigError::invalid(
                "retry.base_delay_ms",
                format!(
                    "{} exceeds max_delay_ms {}",
                    self.base_delay_ms, self.max_delay_ms
                ),
            ));
        }
        Ok(())
    }
}
