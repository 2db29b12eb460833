//! Exponential backoff with positive jitter.

use crate::{RequestOptions, RetryConfig};
use quotd_error::RetryableError;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, instrument, warn};

/// The error an operation ended with once the policy stopped retrying.
#[derive(Debug, Clone)]
pub struct RetryExhausted<E> {
    /// Error from the final attempt
    pub error: E,
    /// Attempts made, including the first
    pub attempts: u32,
}

impl<E> RetryExhausted<E> {
    /// Discard the attempt count.
    pub fn into_inner(self) -> E {
        self.error
    }
}

impl<E: fmt::Display> fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (after {} attempt(s))", self.error, self.attempts)
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryExhausted<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Decides whether and when failed requests are attempted again.
///
/// Delay before retry `n` (0-based) is
/// `min(base_delay_ms * 2^n, max_delay_ms) * (1 + U[0, max_jitter))`.
/// Jitter only lengthens the delay, so the jittered value may exceed
/// `max_delay_ms`.
///
/// # Example
///
/// ```
/// use quotd_rate_limit::{RetryConfig, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(RetryConfig::default().with_base_delay_ms(100));
/// assert_eq!(policy.base_delay(0), Duration::from_millis(100));
/// assert_eq!(policy.base_delay(2), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a policy from settings.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Policy settings.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Un-jittered delay before retry `attempt` (0-based).
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let delay_ms = self.config.base_delay_ms().saturating_mul(factor);
        Duration::from_millis(delay_ms.min(*self.config.max_delay_ms()))
    }

    /// Jittered delay before retry `attempt`, drawn from `rng`.
    pub fn delay_with(&self, attempt: u32, rng: &mut fastrand::Rng) -> Duration {
        let jitter = rng.f64() * self.config.max_jitter();
        let secs = self.base_delay(attempt).as_secs_f64() * (1.0 + jitter);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Jittered delay before retry `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.delay_with(attempt, &mut fastrand::Rng::new())
    }

    /// Whether a request with these options may be retried at all.
    pub fn should_retry(&self, options: &RequestOptions) -> bool {
        !options.skip_retry() && !self.config.is_exempt_method(options.method().as_str())
    }

    /// Run `operation` until it succeeds, fails permanently, or runs out of
    /// retries.
    ///
    /// Failures whose status is in `retryable_statuses` are retried up to
    /// `max_retries` times; anything else is returned after one attempt.
    /// Exempt methods and `skip_retry` get exactly one attempt.
    ///
    /// # Errors
    ///
    /// Returns the last error together with the number of attempts made.
    #[instrument(skip_all, fields(method = %options.method()))]
    pub async fn with_retry<T, E, F, Fut>(
        &self,
        options: &RequestOptions,
        mut operation: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError + fmt::Display,
    {
        let max_retries = if self.should_retry(options) {
            *self.config.max_retries()
        } else {
            0
        };
        let mut rng = fastrand::Rng::new();
        // Pulled lazily, once per transient failure
        let schedule = (0..max_retries).map(move |attempt| {
            let delay = self.delay_with(attempt, &mut rng);
            debug!(
                retry = attempt + 1,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Retry scheduled"
            );
            delay
        });

        let attempts = AtomicU32::new(0);
        let retryable_statuses = self.config.retryable_statuses().as_slice();

        let result = Retry::spawn(schedule, || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let pending = operation();
            async move {
                match pending.await {
                    Ok(value) => {
                        if attempt > 1 {
                            debug!(attempt, "Succeeded after retry");
                        }
                        Ok(value)
                    }
                    Err(e) if e.is_retryable(retryable_statuses) => {
                        if attempt > max_retries {
                            warn!(attempt, error = %e, "Transient failure, giving up");
                        } else {
                            warn!(
                                attempt,
                                status = e.status_code(),
                                error = %e,
                                "Transient failure, backing off"
                            );
                        }
                        Err(RetryError::Transient {
                            err: e,
                            retry_after: None,
                        })
                    }
                    Err(e) => {
                        debug!(attempt, status = e.status_code(), error = %e, "Permanent failure");
                        Err(RetryError::Permanent(e))
                    }
                }
            }
        })
        .await;

        result.map_err(|error| RetryExhausted {
            error,
            attempts: attempts.load(Ordering::SeqCst),
        })
    }
}
