//! Per-request switches for the limiter and retry layers.

use derive_getters::Getters;
use reqwest::Method;

/// Options attached to a single outgoing request.
///
/// # Example
///
/// ```
/// use quotd_rate_limit::RequestOptions;
/// use reqwest::Method;
///
/// let options = RequestOptions::default()
///     .with_method(Method::POST)
///     .with_skip_rate_limit(true);
/// assert_eq!(options.method(), &Method::POST);
/// assert!(!options.skip_retry());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct RequestOptions {
    /// HTTP method; exempt methods are never retried
    method: Method,
    /// Bypass the token bucket entirely
    skip_rate_limit: bool,
    /// Make exactly one attempt
    skip_retry: bool,
}

impl RequestOptions {
    /// Options for a plain GET request.
    pub fn get() -> Self {
        Self::default()
    }
}
