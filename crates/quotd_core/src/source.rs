//! Where a quote came from and how it entered the cache.

use serde::{Deserialize, Serialize};

/// Upstream origin of a quote.
///
/// # Examples
///
/// ```
/// use quotd_core::QuoteSource;
/// use std::str::FromStr;
///
/// assert_eq!(QuoteSource::ZenQuotes.to_string(), "zenquotes");
/// assert_eq!(QuoteSource::from_str("local").unwrap(), QuoteSource::Local);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QuoteSource {
    /// api.quotable.io
    Quotable,
    /// zenquotes.io
    ZenQuotes,
    /// api.forismatic.com
    Forismatic,
    /// Built into the binary
    Local,
}

/// How a quote entered the cache.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Provenance {
    /// Fetched from a provider
    #[default]
    Api,
    /// Written by the fallback path
    Fallback,
    /// Saved explicitly by the user
    User,
}
