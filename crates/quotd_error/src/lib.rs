//! Error types for the quotd library.
//!
//! This crate provides the foundation error types used throughout the quotd workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use quotd_error::{QuotdResult, HttpError};
//!
//! fn fetch_data() -> QuotdResult<String> {
//!     Err(HttpError::new("Connection refused"))?
//! }
//!
//! match fetch_data() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod fetch;
mod http;
mod rate_limit;
mod storage;
mod validation;

pub use config::{ConfigError, ConfigErrorKind};
pub use error::{QuotdError, QuotdErrorKind, QuotdResult};
pub use fetch::{FetchError, FetchErrorKind, NETWORK_ERROR_STATUS, RetryableError};
pub use http::HttpError;
pub use rate_limit::{RateLimitError, RateLimitErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use validation::{ValidationError, ValidationErrorKind};
