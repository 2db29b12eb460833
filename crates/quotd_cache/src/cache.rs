//! Quote cache implementation.

use crate::{CacheConfig, CacheEntry, KeyValueStore, MemoryStore};
use chrono::{DateTime, Utc};
use quotd_core::{Provenance, Quote};
use quotd_error::{StorageError, StorageErrorKind};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const UNCATEGORIZED: &str = "uncategorized";

/// Optional metadata for [`CacheStore::put_with`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PutOptions {
    /// TTL override; the configured default applies when `None`
    pub ttl: Option<Duration>,
    /// How the quote entered the cache
    pub provenance: Provenance,
    /// Priority weight carried on the entry
    pub priority: u32,
}

/// Filter for [`CacheStore::query`].
///
/// Every criterion that is set must match. Category and author compare
/// case-insensitively; text matches a case-insensitive substring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheQuery {
    /// Exact category
    pub category: Option<String>,
    /// Exact author
    pub author: Option<String>,
    /// Substring of the quote text
    pub text: Option<String>,
}

impl CacheQuery {
    /// Match quotes in `category`.
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    /// Match quotes by `author`.
    pub fn author(author: impl Into<String>) -> Self {
        Self {
            author: Some(author.into()),
            ..Self::default()
        }
    }

    /// Match quotes whose text contains `text`.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    fn matches(&self, quote: &Quote) -> bool {
        let category_ok = self.category.as_ref().is_none_or(|wanted| {
            quote
                .category()
                .as_ref()
                .is_some_and(|c| same_ignoring_case(c, wanted))
        });
        let author_ok = self
            .author
            .as_ref()
            .is_none_or(|wanted| same_ignoring_case(quote.author(), wanted));
        let text_ok = self
            .text
            .as_ref()
            .is_none_or(|needle| quote.text_contains(needle));
        category_ok && author_ok && text_ok
    }
}

/// Summary of the cache contents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Number of live entries
    pub count: usize,
    /// Size of the live entries once serialized
    pub total_bytes: usize,
    /// Creation time of the oldest live entry
    pub oldest: Option<DateTime<Utc>>,
    /// Creation time of the newest live entry
    pub newest: Option<DateTime<Utc>>,
    /// Live entries per category
    pub categories: BTreeMap<String, usize>,
}

/// Bounded, expiring store of quotes for offline fallback.
///
/// Entries are kept newest-first by insertion. When the count exceeds
/// `max_size` the oldest insertions are evicted, regardless of how often
/// they were read. Every mutation rewrites the whole entry set into the
/// backing [`KeyValueStore`]; write failures are logged and otherwise
/// ignored, since the cache is advisory.
///
/// # Example
///
/// ```
/// use quotd_cache::{CacheConfig, CacheStore};
/// use quotd_core::{Quote, QuoteSource};
///
/// let mut cache = CacheStore::in_memory(CacheConfig::default());
/// let quote = Quote::new("q1", "Well begun is half done.", "Aristotle", QuoteSource::Local).unwrap();
///
/// cache.put(quote, None);
///
/// let entry = cache.get("q1").unwrap();
/// assert_eq!(*entry.access_count(), 1);
/// assert!(cache.random_weighted().is_some());
/// ```
#[derive(Debug)]
pub struct CacheStore {
    config: CacheConfig,
    backend: Arc<dyn KeyValueStore>,
    entries: Vec<CacheEntry>,
}

impl CacheStore {
    /// Open a cache over `backend`, loading whatever it already holds.
    ///
    /// Unreadable blobs and individual entries that no longer deserialize
    /// are dropped with a warning. Expired entries are purged.
    #[tracing::instrument(skip(config, backend), fields(storage_key = %config.storage_key()))]
    pub fn new(config: CacheConfig, backend: Arc<dyn KeyValueStore>) -> Self {
        tracing::debug!(
            default_ttl_secs = config.default_ttl_secs(),
            max_size = config.max_size(),
            enabled = config.enabled(),
            "Creating new CacheStore"
        );
        let entries = load_entries(backend.as_ref(), config.storage_key());
        let mut store = Self {
            config,
            backend,
            entries,
        };
        store.enforce_limit();
        store.cleanup_expired();
        store
    }

    /// Cache over a fresh unbounded [`MemoryStore`].
    pub fn in_memory(config: CacheConfig) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()))
    }

    /// Active configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Insert or replace a quote fetched from a provider.
    ///
    /// Uses the default TTL when `ttl` is `None`.
    pub fn put(&mut self, quote: Quote, ttl: Option<Duration>) {
        self.put_with(
            quote,
            PutOptions {
                ttl,
                ..PutOptions::default()
            },
        );
    }

    /// Insert or replace a quote with explicit entry metadata.
    ///
    /// An existing entry with the same id is removed first, so the new
    /// entry ranks newest and the id counts once toward `max_size`.
    #[tracing::instrument(
        skip(self, quote, options),
        fields(id = %quote.id(), provenance = %options.provenance, cache_size = self.entries.len())
    )]
    pub fn put_with(&mut self, quote: Quote, options: PutOptions) {
        if !self.config.enabled() {
            tracing::debug!("Cache disabled, skipping insert");
            return;
        }

        let ttl = options.ttl.unwrap_or_else(|| self.config.default_ttl());
        let replaced = self.take(quote.id()).is_some();
        let entry = CacheEntry::new(quote, ttl, options.provenance, options.priority, Utc::now());
        self.entries.insert(0, entry);
        self.enforce_limit();

        tracing::debug!(replaced, ttl = ?ttl, "Inserted entry into cache");
        self.persist();
    }

    /// Get a live entry, recording the access.
    ///
    /// Returns None if:
    /// - Entry doesn't exist
    /// - Entry is expired (it is removed)
    /// - Cache is disabled
    #[tracing::instrument(skip(self), fields(cache_size = self.entries.len()))]
    pub fn get(&mut self, id: &str) -> Option<&CacheEntry> {
        if !self.config.enabled() {
            tracing::debug!("Cache disabled, returning None");
            return None;
        }

        let now = Utc::now();
        let index = self.entries.iter().position(|e| e.id() == id)?;
        if self.entries[index].is_expired_at(now) {
            tracing::debug!("Cache entry expired, removing");
            self.entries.remove(index);
            self.persist();
            return None;
        }

        self.entries[index].touch(now);
        self.persist();

        let entry = &self.entries[index];
        tracing::debug!(
            access_count = entry.access_count(),
            time_remaining = ?entry.time_remaining(),
            "Cache hit"
        );
        Some(entry)
    }

    /// All live entries, newest first.
    pub fn get_all(&self) -> Vec<&CacheEntry> {
        let now = Utc::now();
        self.entries
            .iter()
            .filter(|e| !e.is_expired_at(now))
            .collect()
    }

    /// Live entries matching `query`, newest first.
    pub fn query(&self, query: &CacheQuery) -> Vec<&CacheEntry> {
        self.get_all()
            .into_iter()
            .filter(|e| query.matches(e.quote()))
            .collect()
    }

    /// Remove an entry. Returns whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.take(id).is_some();
        if removed {
            tracing::debug!(id, "Removed cache entry");
            self.persist();
        }
        removed
    }

    /// Clear all cache entries.
    pub fn clear(&mut self) {
        let count = self.entries.len();
        self.entries.clear();
        if let Err(e) = self.backend.remove_item(self.config.storage_key()) {
            tracing::warn!(error = %e, "Failed to remove persisted cache");
        }
        tracing::info!(cleared = count, "Cleared cache");
    }

    /// Summary of the live entries.
    pub fn stats(&self) -> CacheStats {
        let live = self.get_all();
        let mut categories = BTreeMap::new();
        for entry in &live {
            let category = entry
                .quote()
                .category()
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            *categories.entry(category).or_insert(0) += 1;
        }

        CacheStats {
            count: live.len(),
            total_bytes: serde_json::to_string(&live).map(|s| s.len()).unwrap_or(0),
            oldest: live.iter().map(|e| *e.created_at()).min(),
            newest: live.iter().map(|e| *e.created_at()).max(),
            categories,
        }
    }

    /// Pick a live quote, favouring recent insertions.
    ///
    /// The entry at newest-first position `i` has weight `decay_factor^i`.
    /// Returns None when no live entry exists.
    pub fn random_weighted(&self) -> Option<Quote> {
        self.random_weighted_with(&mut fastrand::Rng::new())
    }

    /// [`random_weighted`](Self::random_weighted) with a caller-supplied generator.
    pub fn random_weighted_with(&self, rng: &mut fastrand::Rng) -> Option<Quote> {
        let live = self.get_all();
        let decay = *self.config.decay_factor();
        let weights: Vec<f64> = (0..live.len()).map(|i| decay.powi(i as i32)).collect();
        let total: f64 = weights.iter().sum();
        if live.is_empty() || !(total > 0.0) {
            return None;
        }

        let mut remaining = rng.f64() * total;
        for (entry, weight) in live.iter().zip(&weights) {
            if remaining < *weight {
                return Some(entry.quote().clone());
            }
            remaining -= weight;
        }
        live.last().map(|e| e.quote().clone())
    }

    /// Remove expired entries from cache.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|e| !e.is_expired_at(now));

        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::info!(removed, remaining = self.entries.len(), "Cleaned up expired cache entries");
            self.persist();
        }
        removed
    }

    /// Number of stored entries, including any not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode a persisted entry set, newest first.
    ///
    /// Individual entries that fail to decode are skipped.
    ///
    /// # Errors
    ///
    /// [`StorageErrorKind::Serialization`] if `blob` is not a JSON array.
    pub fn decode_entries(blob: &str) -> Result<Vec<CacheEntry>, StorageError> {
        let raw: Vec<JsonValue> = serde_json::from_str(blob)
            .map_err(|e| StorageError::new(StorageErrorKind::Serialization(e.to_string())))?;

        let total = raw.len();
        let mut entries: Vec<CacheEntry> = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<CacheEntry>(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping unreadable cache entry");
                    None
                }
            })
            .collect();
        entries.sort_by(|a, b| b.created_at().cmp(a.created_at()));

        tracing::debug!(loaded = entries.len(), total, "Decoded persisted cache");
        Ok(entries)
    }

    fn take(&mut self, id: &str) -> Option<CacheEntry> {
        let index = self.entries.iter().position(|e| e.id() == id)?;
        Some(self.entries.remove(index))
    }

    /// Drop the oldest insertions beyond `max_size`.
    fn enforce_limit(&mut self) {
        let max = *self.config.max_size();
        if self.entries.len() <= max {
            return;
        }
        for evicted in self.entries.drain(max..) {
            tracing::debug!(id = evicted.id(), "Evicting oldest entry");
        }
    }

    fn persist(&self) {
        let blob = match serde_json::to_string(&self.entries) {
            Ok(blob) => blob,
            Err(e) => {
                let err = StorageError::new(StorageErrorKind::Serialization(e.to_string()));
                tracing::warn!(error = %err, "Failed to encode cache entries");
                return;
            }
        };
        if let Err(e) = self.backend.set_item(self.config.storage_key(), &blob) {
            tracing::warn!(
                error = %e,
                entries = self.entries.len(),
                bytes = blob.len(),
                "Failed to persist cache, keeping in-memory entries"
            );
        }
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::in_memory(CacheConfig::default())
    }
}

/// Read and decode the persisted entry set, newest first.
fn load_entries(backend: &dyn KeyValueStore, key: &str) -> Vec<CacheEntry> {
    let blob = match backend.get_item(key) {
        Ok(Some(blob)) => blob,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read persisted cache, starting empty");
            return Vec::new();
        }
    };

    match CacheStore::decode_entries(&blob) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "Persisted cache is unreadable, starting empty");
            Vec::new()
        }
    }
}

fn same_ignoring_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
