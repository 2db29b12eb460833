//! Cache entry with access bookkeeping and expiration.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use quotd_core::{Provenance, Quote};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached quote plus the metadata used for expiration and eviction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct CacheEntry {
    quote: Quote,
    created_at: DateTime<Utc>,
    last_accessed_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    access_count: u64,
    provenance: Provenance,
    priority: u32,
}

impl CacheEntry {
    pub(crate) fn new(
        quote: Quote,
        ttl: Duration,
        provenance: Provenance,
        priority: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500));
        Self {
            quote,
            created_at: now,
            last_accessed_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            access_count: 0,
            provenance,
            priority,
        }
    }

    /// Check if this entry is expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Check if this entry is expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Get remaining time until expiration.
    pub fn time_remaining(&self) -> Option<Duration> {
        (self.expires_at - Utc::now()).to_std().ok()
    }

    /// Id of the cached quote.
    pub fn id(&self) -> &str {
        self.quote.id()
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last_accessed_at = now;
        self.access_count = self.access_count.saturating_add(1);
    }
}
