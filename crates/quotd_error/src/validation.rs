//! Input validation errors.

/// Specific validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ValidationErrorKind {
    /// Normalized quote text is too short or too long
    #[display("Quote text has {} characters, expected {}..={}", length, min, max)]
    TextLength {
        /// Character count after normalization
        length: usize,
        /// Inclusive lower bound
        min: usize,
        /// Inclusive upper bound
        max: usize,
    },

    /// Required field was empty after trimming
    #[display("Missing required field: {}", _0)]
    EmptyField(String),

    /// Numeric field outside its allowed range
    #[display("Value {} for '{}' exceeds maximum {}", value, field, max)]
    OutOfRange {
        /// The field name
        field: String,
        /// Supplied value
        value: u64,
        /// Inclusive upper bound
        max: u64,
    },
}

/// Validation error with location tracking.
///
/// Validation failures are never retried.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {} at line {} in {}", kind, line, file)]
pub struct ValidationError {
    kind: ValidationErrorKind,
    line: u32,
    file: &'static str,
}

impl ValidationError {
    /// Create a new validation error with caller location tracking.
    #[track_caller]
    pub fn new(kind: ValidationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ValidationErrorKind {
        &self.kind
    }
}
