//! Core data types for the quotd library.
//!
//! This crate provides the normalized [`Quote`] record shared by the cache,
//! the provider adapters and the orchestration layer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod quote;
mod source;

pub use quote::{MAX_QUOTE_LENGTH, MIN_QUOTE_LENGTH, Quote, normalize_text};
pub use source::{Provenance, QuoteSource};
