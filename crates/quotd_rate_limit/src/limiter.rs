//! Token-bucket rate limiter with a bounded FIFO wait queue.
//!
//! Each bucket holds up to `capacity` tokens and regains them continuously
//! over `window_ms`. A request that finds its bucket empty joins the
//! bucket's queue and is admitted in arrival order as tokens come back.
//! Queued requests give up after `queue_timeout_ms`; a request arriving at a
//! full queue is rejected immediately.
//!
//! Buckets live behind a synchronous mutex that is never held across an
//! await point. A background task per bucket wakes whenever the bucket's
//! next token is due, admits waiters, and exits when the queue empties.

use crate::{BucketMode, RateLimitConfig, RequestOptions};
use quotd_error::{RateLimitError, RateLimitErrorKind};
use reqwest::Url;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, instrument, trace, warn};

/// Key shared by every request in [`BucketMode::Global`].
const GLOBAL_BUCKET: &str = "global";

/// Snapshot of one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketStatus {
    /// Tokens available right now
    pub tokens: u32,
    /// Requests waiting for a token
    pub queue_length: usize,
    /// Maximum tokens the bucket holds
    pub capacity: u32,
}

#[derive(Debug)]
struct Waiter {
    id: u64,
    enqueued_at: Instant,
    admit: oneshot::Sender<()>,
}

#[derive(Debug)]
struct TokenBucket {
    tokens: u32,
    last_refill: Instant,
    queue: VecDeque<Waiter>,
    draining: bool,
}

impl TokenBucket {
    fn new(capacity: u32, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
            queue: VecDeque::new(),
            draining: false,
        }
    }

    /// Adds `floor(elapsed * capacity / window)` tokens, capped at capacity.
    fn refill(&mut self, config: &RateLimitConfig, now: Instant) {
        let capacity = *config.capacity();
        let window_ms = u128::from(*config.window_ms()).max(1);
        let elapsed_ms = now.saturating_duration_since(self.last_refill).as_millis();
        let earned = elapsed_ms * u128::from(capacity) / window_ms;
        if earned == 0 {
            return;
        }

        let tokens = (u128::from(self.tokens) + earned).min(u128::from(capacity));
        self.tokens = u32::try_from(tokens).unwrap_or(capacity);
        if self.tokens == capacity {
            self.last_refill = now;
        } else {
            // Carry the fractional token forward
            let spent_ms = earned * window_ms / u128::from(capacity);
            let spent_ms = u64::try_from(spent_ms).unwrap_or(u64::MAX);
            self.last_refill += Duration::from_millis(spent_ms);
        }
    }

    /// Hands available tokens to queued waiters in arrival order.
    ///
    /// Waiters past their deadline are dropped. A waiter whose caller has
    /// gone away does not consume a token.
    fn admit_waiters(&mut self, key: &str, queue_timeout: Duration, now: Instant) {
        while self.tokens > 0 {
            let Some(waiter) = self.queue.pop_front() else {
                break;
            };
            if now.saturating_duration_since(waiter.enqueued_at) >= queue_timeout {
                trace!(key, waiter = waiter.id, "Dropping stale waiter");
                continue;
            }
            if waiter.admit.send(()).is_ok() {
                self.tokens -= 1;
                trace!(key, waiter = waiter.id, tokens = self.tokens, "Admitted waiter");
            }
        }
    }

    /// When the next token comes back, given tokens are refilled up to `now`.
    ///
    /// Never earlier than a millisecond after `now`.
    fn next_token_at(&self, config: &RateLimitConfig, now: Instant) -> Instant {
        let due = self.last_refill + config.token_interval();
        due.max(now + Duration::from_millis(1))
    }

    /// Removes a waiter from the queue. Returns false if it was already taken.
    fn withdraw(&mut self, id: u64) -> bool {
        match self.queue.iter().position(|waiter| waiter.id == id) {
            Some(index) => {
                self.queue.remove(index);
                true
            }
            None => false,
        }
    }

    fn status(&self, capacity: u32) -> BucketStatus {
        BucketStatus {
            tokens: self.tokens,
            queue_length: self.queue.len(),
            capacity,
        }
    }
}

/// Rate limiter keyed by endpoint.
///
/// Cloning is cheap; clones share buckets.
///
/// # Example
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use quotd_rate_limit::{RateLimitConfig, RateLimiter};
///
/// let limiter = RateLimiter::new(RateLimitConfig::default().with_capacity(2));
/// limiter.acquire("api.quotable.io/random").await?;
/// assert!(limiter.try_acquire("api.quotable.io/random"));
/// assert!(!limiter.try_acquire("api.quotable.io/random"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: Arc<RateLimitConfig>,
    buckets: Arc<Mutex<HashMap<String, TokenBucket>>>,
    next_waiter: Arc<AtomicU64>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl RateLimiter {
    /// Create a limiter with no buckets; buckets appear on first use.
    pub fn new(config: RateLimitConfig) -> Self {
        debug!(
            capacity = config.capacity(),
            window_ms = config.window_ms(),
            max_queue_size = config.max_queue_size(),
            mode = %config.mode(),
            "Created rate limiter"
        );
        Self {
            config: Arc::new(config),
            buckets: Arc::new(Mutex::new(HashMap::new())),
            next_waiter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Limiter settings.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Bucket key for a request URL.
    ///
    /// Host plus path in per-endpoint mode, so query strings share a bucket.
    pub fn bucket_key(&self, url: &Url) -> String {
        match self.config.mode() {
            BucketMode::Global => GLOBAL_BUCKET.to_string(),
            BucketMode::PerEndpoint => {
                format!("{}{}", url.host_str().unwrap_or_default(), url.path())
            }
        }
    }

    /// Wait for a token in `key`'s bucket.
    ///
    /// # Errors
    ///
    /// [`RateLimitErrorKind::QueueFull`] if the bucket is empty and its queue
    /// is at capacity, [`RateLimitErrorKind::QueueTimeout`] if no token
    /// arrived within the queue timeout.
    pub async fn acquire(&self, key: &str) -> Result<(), RateLimitError> {
        self.acquire_with(key, &RequestOptions::default()).await
    }

    /// Like [`acquire`](Self::acquire), honouring `skip_rate_limit`.
    #[instrument(skip(self, options))]
    pub async fn acquire_with(
        &self,
        key: &str,
        options: &RequestOptions,
    ) -> Result<(), RateLimitError> {
        if !self.config.enabled() || *options.skip_rate_limit() {
            trace!("Rate limiting bypassed");
            return Ok(());
        }

        let enqueued_at = Instant::now();
        let (id, admitted) = {
            let mut buckets = self.lock();
            let bucket = self.bucket(&mut buckets, key, enqueued_at);

            if bucket.queue.is_empty() && bucket.tokens > 0 {
                bucket.tokens -= 1;
                debug!(tokens = bucket.tokens, "Token acquired");
                return Ok(());
            }

            let queued = bucket.queue.len();
            if queued >= *self.config.max_queue_size() {
                warn!(queued, "Rate limit queue full");
                return Err(RateLimitError::new(RateLimitErrorKind::QueueFull {
                    key: key.to_string(),
                    queued,
                }));
            }

            let id = self.next_waiter.fetch_add(1, Ordering::Relaxed);
            let (admit, admitted) = oneshot::channel();
            bucket.queue.push_back(Waiter {
                id,
                enqueued_at,
                admit,
            });
            debug!(position = queued + 1, "Queued for token");

            if !bucket.draining {
                bucket.draining = true;
                let wake_at = bucket.next_token_at(&self.config, enqueued_at);
                self.spawn_drain(key.to_string(), wake_at);
            }
            (id, admitted)
        };

        self.wait_for_token(key, id, enqueued_at, admitted).await
    }

    /// Take a token if one is free right now, without queueing.
    pub fn try_acquire(&self, key: &str) -> bool {
        if !self.config.enabled() {
            return true;
        }
        let mut buckets = self.lock();
        let bucket = self.bucket(&mut buckets, key, Instant::now());
        if bucket.queue.is_empty() && bucket.tokens > 0 {
            bucket.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Snapshot of one bucket, or of every bucket seen so far.
    ///
    /// A key that has never been used reports a full bucket.
    pub fn status(&self, key: Option<&str>) -> HashMap<String, BucketStatus> {
        let capacity = *self.config.capacity();
        let now = Instant::now();
        let mut buckets = self.lock();
        match key {
            Some(key) => {
                let status = match buckets.get_mut(key) {
                    Some(bucket) => {
                        bucket.refill(&self.config, now);
                        bucket.status(capacity)
                    }
                    None => TokenBucket::new(capacity, now).status(capacity),
                };
                HashMap::from([(key.to_string(), status)])
            }
            None => buckets
                .iter_mut()
                .map(|(key, bucket)| {
                    bucket.refill(&self.config, now);
                    (key.clone(), bucket.status(capacity))
                })
                .collect(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TokenBucket>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches (or creates) `key`'s bucket, brought up to date.
    fn bucket<'a>(
        &self,
        buckets: &'a mut HashMap<String, TokenBucket>,
        key: &str,
        now: Instant,
    ) -> &'a mut TokenBucket {
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(*self.config.capacity(), now));
        bucket.refill(&self.config, now);
        bucket.admit_waiters(key, self.config.queue_timeout(), now);
        bucket
    }

    async fn wait_for_token(
        &self,
        key: &str,
        id: u64,
        enqueued_at: Instant,
        mut admitted: oneshot::Receiver<()>,
    ) -> Result<(), RateLimitError> {
        let timed_out = |enqueued_at: Instant| {
            let waited_ms = u64::try_from(enqueued_at.elapsed().as_millis()).unwrap_or(u64::MAX);
            warn!(waited_ms, "Rate limit queue timeout");
            RateLimitError::new(RateLimitErrorKind::QueueTimeout {
                key: key.to_string(),
                waited_ms,
            })
        };

        match tokio::time::timeout(self.config.queue_timeout(), &mut admitted).await {
            Ok(Ok(())) => {
                debug!("Token acquired after queueing");
                Ok(())
            }
            // Sender dropped: the drain task discarded us as stale
            Ok(Err(_)) => Err(timed_out(enqueued_at)),
            Err(_) => {
                let withdrawn = self
                    .lock()
                    .get_mut(key)
                    .is_some_and(|bucket| bucket.withdraw(id));
                // Admitted between the deadline and taking the lock
                if !withdrawn && admitted.try_recv().is_ok() {
                    return Ok(());
                }
                Err(timed_out(enqueued_at))
            }
        }
    }

    /// Background task admitting `key`'s waiters as tokens come back,
    /// starting at `wake_at`.
    fn spawn_drain(&self, key: String, mut wake_at: Instant) {
        let buckets = Arc::clone(&self.buckets);
        let config = Arc::clone(&self.config);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep_until(wake_at).await;
                let mut guard = buckets.lock().unwrap_or_else(PoisonError::into_inner);
                let Some(bucket) = guard.get_mut(&key) else {
                    break;
                };
                let now = Instant::now();
                bucket.refill(&config, now);
                bucket.admit_waiters(&key, config.queue_timeout(), now);
                if bucket.queue.is_empty() {
                    bucket.draining = false;
                    trace!(key = %key, "Queue drained");
                    break;
                }
                wake_at = bucket.next_token_at(&config, now);
            }
        });
    }
}
