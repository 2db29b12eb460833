//! The normalized quote record.

use crate::QuoteSource;
use chrono::{DateTime, Utc};
use quotd_error::{ValidationError, ValidationErrorKind};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Shortest accepted quote text, in characters after normalization.
pub const MIN_QUOTE_LENGTH: usize = 10;

/// Longest accepted quote text, in characters after normalization.
pub const MAX_QUOTE_LENGTH: usize = 150;

const FALLBACK_ID: &str = "local-fallback";
const FALLBACK_TEXT: &str = "The only way to do great work is to love what you do.";
const FALLBACK_AUTHOR: &str = "Steve Jobs";

/// Normalize quote text for storage and comparison.
///
/// Trims, collapses whitespace runs to a single space and strips one layer
/// of wrapping quotation marks.
///
/// # Examples
///
/// ```
/// use quotd_core::normalize_text;
///
/// assert_eq!(normalize_text("  \u{201c}Stay   hungry,\nstay foolish.\u{201d} "), "Stay hungry, stay foolish.");
/// ```
pub fn normalize_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let unwrapped = collapsed
        .strip_prefix(['"', '\u{201c}'])
        .and_then(|rest| rest.strip_suffix(['"', '\u{201d}']))
        .unwrap_or(collapsed.as_str());
    unwrapped.trim().to_string()
}

/// An immutable, validated quote.
///
/// Construct with [`Quote::new`]; `length` always equals the character count
/// of `text` and has no setter. Deserialization re-runs validation and
/// recomputes `length`, so a persisted record can never smuggle in a stale
/// value.
///
/// # Examples
///
/// ```
/// use quotd_core::{Quote, QuoteSource};
///
/// let quote = Quote::new("q1", "Simplicity is the soul of efficiency.", "Austin Freeman", QuoteSource::Local)
///     .unwrap()
///     .with_category("wisdom")
///     .with_tags(["simplicity", "work"]);
///
/// assert_eq!(*quote.length(), quote.text().chars().count());
/// assert_eq!(quote.category().as_deref(), Some("wisdom"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(try_from = "QuoteRecord", into = "QuoteRecord")]
pub struct Quote {
    /// Unique identifier
    id: String,
    /// Normalized display text
    text: String,
    /// Author name
    author: String,
    /// Upstream origin
    source: QuoteSource,
    /// Optional category
    category: Option<String>,
    /// Free-form tags
    tags: BTreeSet<String>,
    /// Character count of `text`
    length: usize,
    /// When the quote was created or added
    added_at: DateTime<Utc>,
    /// Popularity score, 0-100
    popularity: Option<u8>,
    /// Whether the quote was verified upstream
    verified: Option<bool>,
}

impl Quote {
    /// Create a validated quote.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if `id` is empty or the normalized text
    /// falls outside `MIN_QUOTE_LENGTH..=MAX_QUOTE_LENGTH` characters.
    #[track_caller]
    pub fn new(
        id: impl Into<String>,
        text: impl AsRef<str>,
        author: impl AsRef<str>,
        source: QuoteSource,
    ) -> Result<Self, ValidationError> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(ValidationError::new(ValidationErrorKind::EmptyField(
                "id".to_string(),
            )));
        }

        let text = normalize_text(text.as_ref());
        let length = checked_length(&text)?;

        let author = author.as_ref().split_whitespace().collect::<Vec<_>>().join(" ");
        let author = if author.is_empty() {
            "Unknown".to_string()
        } else {
            author
        };

        Ok(Self {
            id,
            text,
            author,
            source,
            category: None,
            tags: BTreeSet::new(),
            length,
            added_at: Utc::now(),
            popularity: None,
            verified: None,
        })
    }

    /// Create a quote whose id is derived from its author and text.
    ///
    /// Used for providers that do not supply stable identifiers. The same
    /// author and text always produce the same id.
    #[track_caller]
    pub fn with_derived_id(
        text: impl AsRef<str>,
        author: impl AsRef<str>,
        source: QuoteSource,
    ) -> Result<Self, ValidationError> {
        let id = Self::derive_id(&normalize_text(text.as_ref()), author.as_ref(), source);
        Self::new(id, text, author, source)
    }

    /// Stable identifier for `(source, author, text)`.
    pub fn derive_id(text: &str, author: &str, source: QuoteSource) -> String {
        let mut hasher = Sha256::new();
        hasher.update(author.trim().to_lowercase().as_bytes());
        hasher.update(b"\x1f");
        hasher.update(text.to_lowercase().as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        format!("{}-{}", source, &digest[..16])
    }

    /// The built-in quote returned when nothing else is available.
    pub fn fallback() -> Self {
        Self {
            id: FALLBACK_ID.to_string(),
            text: FALLBACK_TEXT.to_string(),
            author: FALLBACK_AUTHOR.to_string(),
            source: QuoteSource::Local,
            category: Some("inspiration".to_string()),
            tags: BTreeSet::from(["inspiration".to_string(), "work".to_string()]),
            length: FALLBACK_TEXT.chars().count(),
            added_at: DateTime::<Utc>::default(),
            popularity: None,
            verified: Some(true),
        }
    }

    /// Replace the text, re-running normalization and length validation.
    #[track_caller]
    pub fn with_text(mut self, text: impl AsRef<str>) -> Result<Self, ValidationError> {
        let text = normalize_text(text.as_ref());
        self.length = checked_length(&text)?;
        self.text = text;
        Ok(self)
    }

    /// Set the category. Blank categories clear it.
    pub fn with_category(mut self, category: impl AsRef<str>) -> Self {
        let category = category.as_ref().trim();
        self.category = (!category.is_empty()).then(|| category.to_string());
        self
    }

    /// Replace the tag set. Blank tags are dropped and duplicates collapse.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = tags
            .into_iter()
            .map(|tag| tag.as_ref().trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        self
    }

    /// Set the popularity score.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for scores above 100.
    #[track_caller]
    pub fn with_popularity(mut self, popularity: u8) -> Result<Self, ValidationError> {
        if popularity > 100 {
            return Err(ValidationError::new(ValidationErrorKind::OutOfRange {
                field: "popularity".to_string(),
                value: popularity as u64,
                max: 100,
            }));
        }
        self.popularity = Some(popularity);
        Ok(self)
    }

    /// Set the verified flag.
    pub fn with_verified(mut self, verified: bool) -> Self {
        self.verified = Some(verified);
        self
    }

    /// Override the added timestamp.
    pub fn with_added_at(mut self, added_at: DateTime<Utc>) -> Self {
        self.added_at = added_at;
        self
    }

    /// Case-insensitive substring match against the text.
    pub fn text_contains(&self, needle: &str) -> bool {
        self.text.to_lowercase().contains(&needle.to_lowercase())
    }
}

#[track_caller]
fn checked_length(text: &str) -> Result<usize, ValidationError> {
    let length = text.chars().count();
    if !(MIN_QUOTE_LENGTH..=MAX_QUOTE_LENGTH).contains(&length) {
        return Err(ValidationError::new(ValidationErrorKind::TextLength {
            length,
            min: MIN_QUOTE_LENGTH,
            max: MAX_QUOTE_LENGTH,
        }));
    }
    Ok(length)
}

/// Unvalidated wire form of [`Quote`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuoteRecord {
    id: String,
    text: String,
    author: String,
    source: QuoteSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    tags: BTreeSet<String>,
    #[serde(default)]
    length: usize,
    added_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    popularity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    verified: Option<bool>,
}

impl TryFrom<QuoteRecord> for Quote {
    type Error = ValidationError;

    fn try_from(record: QuoteRecord) -> Result<Self, Self::Error> {
        let mut quote = Quote::new(record.id, record.text, record.author, record.source)?
            .with_tags(record.tags)
            .with_added_at(record.added_at);
        if let Some(category) = record.category {
            quote = quote.with_category(category);
        }
        if let Some(popularity) = record.popularity {
            quote = quote.with_popularity(popularity)?;
        }
        if let Some(verified) = record.verified {
            quote = quote.with_verified(verified);
        }
        Ok(quote)
    }
}

impl From<Quote> for QuoteRecord {
    fn from(quote: Quote) -> Self {
        Self {
            id: quote.id,
            text: quote.text,
            author: quote.author,
            source: quote.source,
            category: quote.category,
            tags: quote.tags,
            length: quote.length,
            added_at: quote.added_at,
            popularity: quote.popularity,
            verified: quote.verified,
        }
    }
}
