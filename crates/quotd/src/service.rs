//! Quote retrieval with provider failover.
//!
//! Providers are tried in order. Each attempt passes through the retry policy
//! and, inside it, the rate limiter, so every retry waits for its own token.
//! When every provider fails the cache supplies a weighted-random quote, and
//! when the cache is empty the built-in quote is returned.

use crate::{HttpProvider, QuotdConfig, QuoteProvider};
use quotd_cache::{CacheStore, FileStore, KeyValueStore, MemoryStore, PutOptions};
use quotd_core::{Provenance, Quote};
use quotd_error::{FetchError, QuotdResult};
use quotd_rate_limit::{BucketStatus, RateLimiter, RequestOptions, RetryExhausted, RetryPolicy};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Where a returned quote came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteOrigin {
    /// Fetched just now from the named provider
    Provider(String),
    /// Drawn from the offline cache
    Cache,
    /// The built-in quote
    BuiltIn,
}

impl fmt::Display for QuoteOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteOrigin::Provider(name) => write!(f, "{}", name),
            QuoteOrigin::Cache => write!(f, "cache"),
            QuoteOrigin::BuiltIn => write!(f, "built-in"),
        }
    }
}

/// A quote together with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedQuote {
    /// The quote
    pub quote: Quote,
    /// Where it came from
    pub origin: QuoteOrigin,
}

/// Composition root: providers, limiter, retry policy and cache.
///
/// # Example
///
/// ```no_run
/// use quotd::{QuotdConfig, QuoteService};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let service = QuoteService::from_config(&QuotdConfig::load()?)?;
/// let fetched = service.fetch_quote().await?;
/// println!("{} ({})", fetched.quote.text(), fetched.origin);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct QuoteService {
    providers: Vec<Arc<dyn QuoteProvider>>,
    limiter: RateLimiter,
    retry: RetryPolicy,
    cache: Arc<Mutex<CacheStore>>,
}

impl QuoteService {
    /// Assemble a service from parts.
    pub fn new(
        providers: Vec<Arc<dyn QuoteProvider>>,
        limiter: RateLimiter,
        retry: RetryPolicy,
        cache: CacheStore,
    ) -> Self {
        Self {
            providers,
            limiter,
            retry,
            cache: Arc::new(Mutex::new(cache)),
        }
    }

    /// Wire everything from configuration.
    ///
    /// The cache persists under `storage_dir`, or the platform data
    /// directory. If neither is usable the cache lives in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or a provider URL
    /// is invalid.
    #[instrument(skip(config), fields(providers = config.providers().len()))]
    pub fn from_config(config: &QuotdConfig) -> QuotdResult<Self> {
        let client = HttpProvider::client()?;
        let providers = config
            .providers()
            .iter()
            .map(|provider| {
                HttpProvider::new(provider, client.clone())
                    .map(|p| Arc::new(p) as Arc<dyn QuoteProvider>)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let backend = Self::open_backend(config);
        let cache = CacheStore::new(config.cache().clone(), backend);
        info!(
            providers = providers.len(),
            cached = cache.len(),
            "Quote service ready"
        );

        Ok(Self::new(
            providers,
            RateLimiter::new(config.rate_limit().clone()),
            RetryPolicy::new(config.retry().clone()),
            cache,
        ))
    }

    fn open_backend(config: &QuotdConfig) -> Arc<dyn KeyValueStore> {
        let dir = config
            .storage_dir()
            .clone()
            .or_else(FileStore::default_location);
        match dir.map(FileStore::new) {
            Some(Ok(store)) => Arc::new(store),
            Some(Err(e)) => {
                warn!(error = %e, "Cache directory unavailable, using memory store");
                Arc::new(MemoryStore::new())
            }
            None => {
                warn!("No data directory, using memory store");
                Arc::new(MemoryStore::new())
            }
        }
    }

    /// Providers in failover order.
    pub fn providers(&self) -> &[Arc<dyn QuoteProvider>] {
        &self.providers
    }

    /// Shared cache, for queries and maintenance.
    pub fn cache(&self) -> &Arc<Mutex<CacheStore>> {
        &self.cache
    }

    /// Rate limiter shared by all providers.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Bucket status for every provider endpoint.
    pub fn status(&self) -> HashMap<String, BucketStatus> {
        self.providers
            .iter()
            .flat_map(|provider| {
                let key = self.limiter.bucket_key(provider.endpoint());
                self.limiter.status(Some(key.as_str()))
            })
            .collect()
    }

    /// Get a quote from the first provider that succeeds, else the cache,
    /// else the built-in quote.
    ///
    /// Successful fetches are cached before being returned.
    ///
    /// # Errors
    ///
    /// Currently infallible; the built-in quote is always available.
    #[instrument(skip(self), fields(providers = self.providers.len()))]
    pub async fn fetch_quote(&self) -> QuotdResult<FetchedQuote> {
        for provider in &self.providers {
            match self.fetch_from(provider.as_ref()).await {
                Ok(quote) => {
                    self.cache.lock().await.put_with(
                        quote.clone(),
                        PutOptions {
                            provenance: Provenance::Api,
                            ..PutOptions::default()
                        },
                    );
                    info!(provider = provider.name(), id = %quote.id(), "Fetched quote");
                    return Ok(FetchedQuote {
                        quote,
                        origin: QuoteOrigin::Provider(provider.name().to_string()),
                    });
                }
                Err(e) => warn!(
                    provider = provider.name(),
                    attempts = e.attempts,
                    error = %e.error,
                    "Provider failed, trying next"
                ),
            }
        }

        let cached = self.cache.lock().await.random_weighted();
        if let Some(quote) = cached {
            info!(id = %quote.id(), "Serving cached quote");
            return Ok(FetchedQuote {
                quote,
                origin: QuoteOrigin::Cache,
            });
        }

        info!("Cache empty, serving built-in quote");
        Ok(FetchedQuote {
            quote: Quote::fallback(),
            origin: QuoteOrigin::BuiltIn,
        })
    }

    /// One provider: retry around rate limit around fetch.
    async fn fetch_from(
        &self,
        provider: &dyn QuoteProvider,
    ) -> Result<Quote, RetryExhausted<FetchError>> {
        let key = self.limiter.bucket_key(provider.endpoint());
        let options = RequestOptions::get();
        debug!(provider = provider.name(), key = %key, "Trying provider");

        self.retry
            .with_retry(&options, || async {
                self.limiter.acquire_with(&key, &options).await?;
                provider.fetch().await
            })
            .await
    }
}
