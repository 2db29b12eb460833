//! Backing store error types.

/// Kinds of backing store errors.
///
/// The cache absorbs all of these: a failed write leaves the in-memory
/// entries intact and is only logged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// The store refused a write because it would exceed its quota
    #[display("Storage quota exceeded: {}", _0)]
    QuotaExceeded(String),
    /// Failed to write a value
    #[display("Failed to write value: {}", _0)]
    Write(String),
    /// Failed to read a value
    #[display("Failed to read value: {}", _0)]
    Read(String),
    /// Failed to remove a value
    #[display("Failed to remove value: {}", _0)]
    Remove(String),
    /// Entry set could not be encoded or decoded
    #[display("Serialization failed: {}", _0)]
    Serialization(String),
    /// Invalid storage location
    #[display("Invalid storage path: {}", _0)]
    InvalidPath(String),
    /// Storage backend is unavailable
    #[display("Storage unavailable: {}", _0)]
    Unavailable(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use quotd_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::QuotaExceeded("5 MiB".to_string()));
/// assert!(format!("{}", err).contains("quota exceeded"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether the failure was a quota rejection.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self.kind, StorageErrorKind::QuotaExceeded(_))
    }
}
