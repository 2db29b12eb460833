//! Rate limiting and retry for outgoing quote requests.
//!
//! Two independent layers, composed by the caller:
//! - [`RateLimiter`] - per-endpoint token buckets with a bounded, time-limited
//!   wait queue
//! - [`RetryPolicy`] - exponential backoff with positive jitter for transient
//!   failures
//!
//! Retry wraps rate limiting, so every retry attempt passes through
//! [`RateLimiter::acquire`] again:
//!
//! ```rust,ignore
//! let quote = retry
//!     .with_retry(&options, || async {
//!         limiter.acquire_with(&key, &options).await?;
//!         provider.fetch().await
//!     })
//!     .await?;
//! ```

mod config;
mod limiter;
mod request;
mod retry;

pub use config::{
    BucketMode, RateLimitConfig, RateLimitConfigBuilder, RetryConfig, RetryConfigBuilder,
};
pub use limiter::{BucketStatus, RateLimiter};
pub use quotd_error::{RateLimitError, RateLimitErrorKind, RetryableError};
pub use request::RequestOptions;
pub use retry::{RetryExhausted, RetryPolicy};
