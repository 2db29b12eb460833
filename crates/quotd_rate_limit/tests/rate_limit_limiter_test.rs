//! Tests for the token-bucket limiter.
//!
//! All timing tests run on tokio's paused clock, which auto-advances to the
//! next pending timer whenever the runtime is idle.

use quotd_rate_limit::{
    BucketMode, RateLimitConfig, RateLimitErrorKind, RateLimiter, RequestOptions,
};
use reqwest::Url;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

const KEY: &str = "api.quotable.io/random";

fn limiter(capacity: u32, window_ms: u64, max_queue_size: usize, timeout_ms: u64) -> RateLimiter {
    RateLimiter::new(
        RateLimitConfig::default()
            .with_capacity(capacity)
            .with_window_ms(window_ms)
            .with_max_queue_size(max_queue_size)
            .with_queue_timeout_ms(timeout_ms),
    )
}

async fn wait_until_queued(limiter: &RateLimiter, key: &str, expected: usize) {
    while limiter.status(Some(key))[key].queue_length < expected {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_full_bucket_admits_capacity_immediately() {
    let limiter = limiter(5, 60_000, 20, 5_000);
    let start = Instant::now();

    for _ in 0..5 {
        limiter.acquire(KEY).await.unwrap();
    }

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(!limiter.try_acquire(KEY));
    assert_eq!(limiter.status(Some(KEY))[KEY].tokens, 0);
}

#[tokio::test(start_paused = true)]
async fn test_queue_full_rejects_immediately() {
    let limiter = limiter(1, 10_000, 1, 20_000);
    limiter.acquire(KEY).await.unwrap();

    let queued = tokio::spawn({
        let limiter = limiter.clone();
        async move { limiter.acquire(KEY).await }
    });
    wait_until_queued(&limiter, KEY, 1).await;

    let start = Instant::now();
    let err = limiter.acquire(KEY).await.unwrap_err();
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(err.is_overload());
    assert_eq!(
        err.kind(),
        &RateLimitErrorKind::QueueFull {
            key: KEY.to_string(),
            queued: 1,
        }
    );

    // The earlier waiter is unaffected
    queued.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_queued_request_times_out() {
    let limiter = limiter(1, 10_000, 20, 50);
    limiter.acquire(KEY).await.unwrap();

    let start = Instant::now();
    let err = limiter.acquire(KEY).await.unwrap_err();
    let waited = start.elapsed();

    assert!(waited >= Duration::from_millis(50), "waited {:?}", waited);
    assert!(waited < Duration::from_millis(100), "waited {:?}", waited);
    assert!(matches!(
        err.kind(),
        RateLimitErrorKind::QueueTimeout { waited_ms, .. } if *waited_ms >= 50
    ));
    assert_eq!(limiter.status(Some(KEY))[KEY].queue_length, 0);
}

#[tokio::test(start_paused = true)]
async fn test_waiter_admitted_when_token_returns_within_timeout() {
    let limiter = limiter(1, 10_000, 20, 5_000);
    limiter.acquire(KEY).await.unwrap();
    tokio::time::sleep(Duration::from_secs(9)).await;

    // The token comes back at 10s, well before the 14s deadline
    let start = Instant::now();
    limiter.acquire(KEY).await.unwrap();
    let waited = start.elapsed();

    assert!(waited >= Duration::from_secs(1), "waited {:?}", waited);
    assert!(waited < Duration::from_millis(1_100), "waited {:?}", waited);
    let status = limiter.status(Some(KEY))[KEY];
    assert_eq!(status.tokens, 0);
    assert_eq!(status.queue_length, 0);
}

#[tokio::test(start_paused = true)]
async fn test_default_limits_admit_queued_request() {
    // Token interval (6s) is longer than the queue timeout (5s)
    let limiter = RateLimiter::default();
    for _ in 0..10 {
        limiter.acquire(KEY).await.unwrap();
    }
    tokio::time::sleep(Duration::from_secs(3)).await;

    let start = Instant::now();
    limiter.acquire(KEY).await.unwrap();
    assert!(start.elapsed() <= Duration::from_secs(3), "waited {:?}", start.elapsed());
}

#[tokio::test(start_paused = true)]
async fn test_waiters_are_admitted_in_arrival_order() {
    let limiter = limiter(1, 100, 20, 5_000);
    limiter.acquire(KEY).await.unwrap();

    let order = Arc::new(Mutex::new(Vec::new()));
    let start = Instant::now();
    let spawn_waiter = |name: &'static str| {
        let limiter = limiter.clone();
        let order = Arc::clone(&order);
        tokio::spawn(async move {
            limiter.acquire(KEY).await.unwrap();
            order.lock().unwrap().push((name, start.elapsed()));
        })
    };

    let first = spawn_waiter("first");
    wait_until_queued(&limiter, KEY, 1).await;
    let second = spawn_waiter("second");
    wait_until_queued(&limiter, KEY, 2).await;

    first.await.unwrap();
    second.await.unwrap();

    let order = order.lock().unwrap();
    assert_eq!(
        order.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
        vec!["first", "second"]
    );
    assert!(order[0].1 >= Duration::from_millis(100));
    assert!(order[1].1 >= Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_new_arrivals_do_not_jump_the_queue() {
    let limiter = limiter(1, 100, 20, 5_000);
    limiter.acquire(KEY).await.unwrap();

    let waiter = tokio::spawn({
        let limiter = limiter.clone();
        async move { limiter.acquire(KEY).await }
    });
    wait_until_queued(&limiter, KEY, 1).await;

    // A token is due, but the queued request has priority
    tokio::time::advance(Duration::from_millis(100)).await;
    assert!(!limiter.try_acquire(KEY));
    waiter.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_tokens_refill_over_window() {
    let limiter = limiter(2, 1_000, 20, 5_000);
    assert!(limiter.try_acquire(KEY));
    assert!(limiter.try_acquire(KEY));
    assert!(!limiter.try_acquire(KEY));

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(limiter.try_acquire(KEY));
    assert!(!limiter.try_acquire(KEY));

    // Never more than capacity
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(limiter.status(Some(KEY))[KEY].tokens, 2);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_waiter_does_not_consume_token() {
    let limiter = limiter(1, 100, 20, 5_000);
    limiter.acquire(KEY).await.unwrap();

    let waiter = tokio::spawn({
        let limiter = limiter.clone();
        async move { limiter.acquire(KEY).await }
    });
    wait_until_queued(&limiter, KEY, 1).await;
    waiter.abort();
    assert!(waiter.await.unwrap_err().is_cancelled());

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(limiter.try_acquire(KEY));
}

#[tokio::test(start_paused = true)]
async fn test_buckets_are_independent() {
    let limiter = limiter(1, 60_000, 0, 5_000);
    limiter.acquire("zenquotes.io/api/random").await.unwrap();
    limiter.acquire(KEY).await.unwrap();

    let status = limiter.status(None);
    assert_eq!(status.len(), 2);
    assert!(status.values().all(|bucket| bucket.tokens == 0));
}

#[tokio::test]
async fn test_status_of_unseen_key_is_full() {
    let limiter = limiter(3, 60_000, 20, 5_000);
    let status = limiter.status(Some("never.used/path"));
    let bucket = status["never.used/path"];

    assert_eq!(bucket.tokens, 3);
    assert_eq!(bucket.capacity, 3);
    assert_eq!(bucket.queue_length, 0);
    assert!(limiter.status(None).is_empty());
}

#[tokio::test]
async fn test_bypass_options() {
    let limiter = limiter(1, 60_000, 0, 5_000);
    limiter.acquire(KEY).await.unwrap();
    assert!(limiter.acquire(KEY).await.is_err());

    let skip = RequestOptions::get().with_skip_rate_limit(true);
    limiter.acquire_with(KEY, &skip).await.unwrap();

    let disabled = RateLimiter::new(RateLimitConfig::default().with_capacity(1).with_enabled(false));
    for _ in 0..5 {
        disabled.acquire(KEY).await.unwrap();
        assert!(disabled.try_acquire(KEY));
    }
}

#[test]
fn test_bucket_keys() {
    let url = Url::parse("https://api.quotable.io/random?maxLength=150").unwrap();

    let per_endpoint = RateLimiter::default();
    assert_eq!(per_endpoint.bucket_key(&url), "api.quotable.io/random");

    let global = RateLimiter::new(RateLimitConfig::default().with_mode(BucketMode::Global));
    assert_eq!(global.bucket_key(&url), "global");
}
