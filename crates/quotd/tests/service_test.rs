//! Tests for the failover chain.

use async_trait::async_trait;
use quotd::{
    CacheConfig, CacheStore, FetchError, FetchErrorKind, Provenance, Quote, QuoteOrigin,
    QuoteProvider, QuoteService, QuoteSource, RateLimitConfig, RateLimiter, RetryConfig,
    RetryPolicy,
};
use reqwest::Url;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Provider that fails `failures` times with `error`, then returns `quote`.
#[derive(Debug)]
struct MockProvider {
    name: String,
    url: Url,
    failures: u32,
    error: FetchErrorKind,
    quote: Option<Quote>,
    calls: AtomicU32,
}

impl MockProvider {
    fn ok(name: &str) -> Arc<Self> {
        Self::new(name, 0, FetchErrorKind::Unknown(String::new()), Some(quote(name)))
    }

    fn failing(name: &str, error: FetchErrorKind) -> Arc<Self> {
        Self::new(name, u32::MAX, error, None)
    }

    fn new(name: &str, failures: u32, error: FetchErrorKind, quote: Option<Quote>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            url: Url::parse(&format!("https://{}.example/random", name)).unwrap(),
            failures,
            error,
            quote,
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> QuoteSource {
        QuoteSource::Quotable
    }

    fn endpoint(&self) -> &Url {
        &self.url
    }

    async fn fetch(&self) -> Result<Quote, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.quote {
            Some(quote) if call >= self.failures => Ok(quote.clone()),
            _ => Err(FetchError::new(self.error.clone())),
        }
    }
}

fn quote(name: &str) -> Quote {
    Quote::new(
        format!("{}-1", name),
        format!("A quote served by the {} provider.", name),
        "Tester",
        QuoteSource::Quotable,
    )
    .unwrap()
}

fn unavailable() -> FetchErrorKind {
    FetchErrorKind::Api {
        status_code: 503,
        message: "Service unavailable".to_string(),
    }
}

fn service(providers: Vec<Arc<MockProvider>>, limits: RateLimitConfig) -> QuoteService {
    QuoteService::new(
        providers
            .into_iter()
            .map(|p| p as Arc<dyn QuoteProvider>)
            .collect(),
        RateLimiter::new(limits),
        RetryPolicy::new(RetryConfig::default().with_max_retries(2)),
        CacheStore::in_memory(CacheConfig::default()),
    )
}

#[tokio::test(start_paused = true)]
async fn test_first_success_wins_and_is_cached() {
    let first = MockProvider::ok("first");
    let second = MockProvider::ok("second");
    let service = service(vec![first.clone(), second.clone()], RateLimitConfig::default());

    let fetched = service.fetch_quote().await.unwrap();

    assert_eq!(fetched.origin, QuoteOrigin::Provider("first".to_string()));
    assert_eq!(fetched.quote.id(), "first-1");
    assert_eq!(second.calls(), 0);

    let mut cache = service.cache().lock().await;
    let entry = cache.get("first-1").unwrap();
    assert_eq!(*entry.provenance(), Provenance::Api);
}

#[tokio::test(start_paused = true)]
async fn test_permanent_failure_moves_to_next_provider() {
    let first = MockProvider::failing(
        "first",
        FetchErrorKind::Client {
            status_code: 404,
            message: "Not found".to_string(),
        },
    );
    let second = MockProvider::ok("second");
    let service = service(vec![first.clone(), second.clone()], RateLimitConfig::default());

    let fetched = service.fetch_quote().await.unwrap();

    assert_eq!(fetched.origin, QuoteOrigin::Provider("second".to_string()));
    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_is_retried_before_failover() {
    let first = MockProvider::failing("first", unavailable());
    let second = MockProvider::ok("second");
    let service = service(vec![first.clone(), second.clone()], RateLimitConfig::default());

    let fetched = service.fetch_quote().await.unwrap();

    assert_eq!(fetched.origin, QuoteOrigin::Provider("second".to_string()));
    assert_eq!(first.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_provider_recovers_within_retries() {
    let flaky = MockProvider::new(
        "flaky",
        2,
        FetchErrorKind::Network("connection reset".to_string()),
        Some(quote("flaky")),
    );
    let service = service(vec![flaky.clone()], RateLimitConfig::default());

    let fetched = service.fetch_quote().await.unwrap();

    assert_eq!(fetched.origin, QuoteOrigin::Provider("flaky".to_string()));
    assert_eq!(flaky.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_falls_back_to_cache() {
    let down = MockProvider::failing("down", unavailable());
    let service = service(vec![down], RateLimitConfig::default());
    service.cache().lock().await.put(quote("earlier"), None);

    let fetched = service.fetch_quote().await.unwrap();

    assert_eq!(fetched.origin, QuoteOrigin::Cache);
    assert_eq!(fetched.quote.id(), "earlier-1");
}

#[tokio::test(start_paused = true)]
async fn test_falls_back_to_built_in_quote() {
    let down = MockProvider::failing("down", unavailable());
    let service = service(vec![down], RateLimitConfig::default());

    let fetched = service.fetch_quote().await.unwrap();

    assert_eq!(fetched.origin, QuoteOrigin::BuiltIn);
    assert_eq!(fetched.quote, Quote::fallback());
    assert!(service.cache().lock().await.is_empty());
}

#[tokio::test]
async fn test_no_providers_serves_built_in_quote() {
    let service = service(Vec::new(), RateLimitConfig::default());
    let fetched = service.fetch_quote().await.unwrap();
    assert_eq!(fetched.origin, QuoteOrigin::BuiltIn);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_provider_falls_back_without_retry() {
    let only = MockProvider::ok("only");
    let limits = RateLimitConfig::default()
        .with_capacity(1)
        .with_max_queue_size(0);
    let service = service(vec![only.clone()], limits);

    let first = service.fetch_quote().await.unwrap();
    assert_eq!(first.origin, QuoteOrigin::Provider("only".to_string()));

    // Bucket empty and no queue: rejected locally, never reaches the provider
    let second = service.fetch_quote().await.unwrap();
    assert_eq!(second.origin, QuoteOrigin::Cache);
    assert_eq!(second.quote.id(), "only-1");
    assert_eq!(only.calls(), 1);
}

#[tokio::test]
async fn test_status_reports_each_provider_bucket() {
    let service = service(
        vec![MockProvider::ok("first"), MockProvider::ok("second")],
        RateLimitConfig::default().with_capacity(4),
    );
    service.fetch_quote().await.unwrap();

    let status = service.status();
    assert_eq!(status.len(), 2);
    assert_eq!(status["first.example/random"].tokens, 3);
    assert_eq!(status["second.example/random"].tokens, 4);
}
