//! quotd - quote of the day with an offline safety net
//!
//! quotd fetches a quote from a list of HTTP providers and never comes back
//! empty-handed: provider calls are rate limited and retried, successful
//! quotes are cached on disk, and when every provider fails the cache (or a
//! built-in quote) answers instead.
//!
//! # Quick Start
//!
//! ```no_run
//! use quotd::{QuotdConfig, QuoteService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = QuotdConfig::load()?;
//!     let service = QuoteService::from_config(&config)?;
//!
//!     let fetched = service.fetch_quote().await?;
//!     println!("\"{}\" - {}", fetched.quote.text(), fetched.quote.author());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `quotd_error` - Error types
//! - `quotd_core` - The `Quote` record and its validation
//! - `quotd_cache` - Bounded, expiring, persisted quote cache
//! - `quotd_rate_limit` - Token-bucket limiter and retry policy
//!
//! This crate adds the provider adapters, the failover service and
//! configuration loading, and re-exports the rest for convenience.

#![forbid(unsafe_code)]

mod config;
mod provider;
mod service;
pub mod telemetry;

pub use self::config::{ProviderConfig, QuotdConfig};
pub use provider::{
    ForismaticQuote, HttpProvider, ProviderKind, ProviderResponse, QuotableQuote, QuoteProvider,
    ZenQuote,
};
pub use service::{FetchedQuote, QuoteOrigin, QuoteService};

pub use quotd_cache::*;
pub use quotd_core::*;
pub use quotd_error::*;
pub use quotd_rate_limit::{
    BucketMode, BucketStatus, RateLimitConfig, RateLimitConfigBuilder, RateLimiter,
    RequestOptions, RetryConfig, RetryConfigBuilder, RetryExhausted, RetryPolicy,
};
