//! Error types for rate limiting operations.

/// Error kinds for rate limiting operations.
///
/// `QueueFull` and `QueueTimeout` both mean "currently unavailable"; the
/// bucket refills on its own and a later call may succeed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum RateLimitErrorKind {
    /// The bucket's wait queue is already at capacity.
    #[display("Rate limit exceeded for '{}': queue full ({} waiting)", key, queued)]
    QueueFull {
        /// Bucket key
        key: String,
        /// Requests already waiting
        queued: usize,
    },
    /// A queued request waited longer than the queue timeout.
    #[display("Rate limit queue timeout for '{}' after {}ms", key, waited_ms)]
    QueueTimeout {
        /// Bucket key
        key: String,
        /// How long the request was queued
        waited_ms: u64,
    },
}

/// Rate limiting error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Rate Limit Error: {} at line {} in {}", kind, line, file)]
pub struct RateLimitError {
    kind: RateLimitErrorKind,
    line: u32,
    file: &'static str,
}

impl RateLimitError {
    /// Create a new rate limiting error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RateLimitErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RateLimitErrorKind {
        &self.kind
    }

    /// True for queue-full and queue-timeout rejections.
    pub fn is_overload(&self) -> bool {
        matches!(
            self.kind,
            RateLimitErrorKind::QueueFull { .. } | RateLimitErrorKind::QueueTimeout { .. }
        )
    }
}

impl From<RateLimitError> for crate::FetchError {
    #[track_caller]
    fn from(err: RateLimitError) -> Self {
        crate::FetchError::new(crate::FetchErrorKind::RateLimited(err.kind))
    }
}
