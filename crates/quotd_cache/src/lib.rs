//! Quote caching with TTL expiration and size-bounded eviction.
//!
//! This crate keeps recently fetched quotes available when every provider is
//! unreachable. Entries are persisted as a single JSON blob in a
//! [`KeyValueStore`], so the cache survives restarts.

#![warn(missing_docs)]

mod backend;
mod cache;
mod config;
mod entry;

pub use backend::{FileStore, KeyValueStore, MemoryStore};
pub use cache::{CacheQuery, CacheStats, CacheStore, PutOptions};
pub use config::{CacheConfig, CacheConfigBuilder};
pub use entry::CacheEntry;
