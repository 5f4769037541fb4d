//! Store Module
//!
//! The durable side of the cache. The cache service and the sweeper only talk to
//! storage through [`EntryStore`], which maps onto single-document operations of
//! the backing database.

mod memory;
mod mongo;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::cache::CacheEntry;
use crate::error::Result;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Default collection holding cache documents.
pub const DEFAULT_COLLECTION_NAME: &str = "cache";

// == Entry Store ==
/// Keyed storage for cache entries with atomic single-entry operations.
#[async_trait]
pub trait EntryStore: Send + Sync + fmt::Debug + 'static {
    /// Loads the entry stored under `key`.
    async fn find(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Replaces the entry with the same key, or inserts it if absent.
    async fn upsert(&self, entry: &CacheEntry) -> Result<()>;

    /// Writes a new end of the sliding window for `key`.
    ///
    /// Only touches entries that still carry a sliding window and never inserts.
    async fn update_refresh_before(&self, key: &str, refresh_before: DateTime<Utc>)
        -> Result<()>;

    /// Deletes the entry stored under `key`. Absent keys are not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Deletes the entry stored under `key` only if it is expired at `now`.
    async fn delete_if_expired(&self, key: &str, now: DateTime<Utc>) -> Result<()>;

    /// Deletes every entry whose absolute bound or sliding window ended at or before
    /// `now`, returning how many were removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}
