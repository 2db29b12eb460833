//! Top-level error wrapper types.

use crate::{
    ConfigError, FetchError, HttpError, RateLimitError, StorageError, ValidationError,
};

/// Every error the quotd crates can surface to a caller.
///
/// # Examples
///
/// ```
/// use quotd_error::{QuotdError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: QuotdError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum QuotdErrorKind {
    /// HTTP client error
    #[from(HttpError)]
    Http(HttpError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Malformed input, e.g. a quote outside the length bounds
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Backing store error
    #[from(StorageError)]
    Storage(StorageError),
    /// Quote provider error
    #[from(FetchError)]
    Fetch(FetchError),
    /// Rate limiter rejection
    #[from(RateLimitError)]
    RateLimit(RateLimitError),
}

/// quotd error with kind discrimination.
///
/// # Examples
///
/// ```
/// use quotd_error::{QuotdError, QuotdResult, ConfigError};
///
/// fn might_fail() -> QuotdResult<()> {
///     Err(ConfigError::invalid("cache.max_size", "must be positive"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("quotd Error: {}", _0)]
pub struct QuotdError(Box<QuotdErrorKind>);

impl QuotdError {
    /// Create a new error from a kind.
    pub fn new(kind: QuotdErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &QuotdErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to QuotdErrorKind
impl<T> From<T> for QuotdError
where
    T: Into<QuotdErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for quotd operations.
///
/// # Examples
///
/// ```
/// use quotd_error::{QuotdResult, HttpError};
///
/// fn fetch_data() -> QuotdResult<String> {
///     Err(HttpError::new("404 Not Found"))?
/// }
/// ```
pub type QuotdResult<T> = std::result::Result<T, QuotdError>;
