//! Quote provider errors and retry classification.

use crate::{RateLimitErrorKind, ValidationError};

/// Status code used to classify failures that never produced an HTTP response.
pub const NETWORK_ERROR_STATUS: u16 = 0;

/// Provider request failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum FetchErrorKind {
    /// Connectivity, DNS or timeout failure
    #[display("Network error: {}", _0)]
    Network(String),
    /// Upstream answered with a 5xx status
    #[display("HTTP {} error: {}", status_code, message)]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
    /// Upstream answered with a 4xx status
    #[display("HTTP {} error: {}", status_code, message)]
    Client {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
    /// Response body did not match the provider's shape
    #[display("Malformed response: {}", _0)]
    Decode(String),
    /// Response decoded but the quote failed validation
    #[display("Invalid quote: {}", _0)]
    Validation(String),
    /// The local rate limiter refused the request
    #[display("{}", _0)]
    RateLimited(RateLimitErrorKind),
    /// Anything else
    #[display("Unknown error: {}", _0)]
    Unknown(String),
}

impl FetchErrorKind {
    /// Classify a non-success HTTP status.
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            400..=499 => FetchErrorKind::Client {
                status_code,
                message,
            },
            500..=599 => FetchErrorKind::Api {
                status_code,
                message,
            },
            _ => FetchErrorKind::Unknown(format!("HTTP {}: {}", status_code, message)),
        }
    }

    /// Status code used for retry classification.
    ///
    /// Network failures report [`NETWORK_ERROR_STATUS`], limiter rejections
    /// report 429, and failures that can never succeed on retry report `None`.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchErrorKind::Network(_) => Some(NETWORK_ERROR_STATUS),
            FetchErrorKind::Api { status_code, .. } => Some(*status_code),
            FetchErrorKind::Client { status_code, .. } => Some(*status_code),
            FetchErrorKind::RateLimited(_) => Some(429),
            FetchErrorKind::Decode(_)
            | FetchErrorKind::Validation(_)
            | FetchErrorKind::Unknown(_) => None,
        }
    }
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use quotd_error::{FetchError, FetchErrorKind, RetryableError};
///
/// let err = FetchError::new(FetchErrorKind::Api {
///     status_code: 503,
///     message: "Service unavailable".to_string(),
/// });
/// assert_eq!(err.status_code(), Some(503));
/// assert!(err.is_retryable(&[500, 502, 503, 504, 0]));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Fetch Error: {} at line {} in {}", kind, line, file)]
pub struct FetchError {
    /// The kind of error that occurred
    pub kind: FetchErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl FetchError {
    /// Create a new FetchError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: FetchErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether the limiter, rather than the provider, refused the request.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self.kind, FetchErrorKind::RateLimited(_))
    }
}

impl From<ValidationError> for FetchError {
    #[track_caller]
    fn from(err: ValidationError) -> Self {
        Self::new(FetchErrorKind::Validation(err.kind().to_string()))
    }
}

/// Trait for errors that can be classified for retry.
///
/// The retry policy owns the set of retryable statuses; errors only report
/// the status they map to.
///
/// # Examples
///
/// ```
/// use quotd_error::{FetchError, FetchErrorKind, RetryableError};
///
/// let err = FetchError::new(FetchErrorKind::Client {
///     status_code: 404,
///     message: "Not found".to_string(),
/// });
///
/// assert!(!err.is_retryable(&[500, 502, 503, 504, 0]));
/// ```
pub trait RetryableError {
    /// Status code this failure maps to, or `None` for failures that
    /// must never be retried.
    fn status_code(&self) -> Option<u16>;

    /// Returns true if this error's status is in `retryable_statuses`.
    fn is_retryable(&self, retryable_statuses: &[u16]) -> bool {
        self.status_code()
            .is_some_and(|status| retryable_statuses.contains(&status))
    }
}

impl RetryableError for FetchError {
    fn status_code(&self) -> Option<u16> {
        self.kind.status_code()
    }
}
