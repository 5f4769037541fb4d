//! Cache Service Module
//!
//! Coordinates reads, sliding refreshes and writes between callers and an
//! [`EntryStore`]. The service keeps no state of its own beyond counters; each
//! operation is a short sequence of store calls.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats, EntryOptions, StatsSnapshot};
use crate::clock::Clock;
use crate::error::{CacheError, Result};
use crate::store::EntryStore;
use crate::tasks::ExpiredEntriesSweeper;

// == Cache Settings ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Whether `get` awaits the sliding refresh write before returning
    pub wait_for_refresh_on_get: bool,
    /// Sliding window applied to writes that request no expiration at all
    pub default_sliding_expiration: Option<Duration>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            wait_for_refresh_on_get: true,
            default_sliding_expiration: None,
        }
    }
}

/// How a successful read persists a moved sliding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshWrite {
    Await,
    Detached,
}

// == Distributed Cache ==
/// Get/set/refresh/remove over a shared store with absolute and sliding expiration.
///
/// Cloning is cheap; clones share the store, clock and counters.
#[derive(Debug, Clone)]
pub struct DistributedCache {
    store: Arc<dyn EntryStore>,
    clock: Arc<dyn Clock>,
    settings: CacheSettings,
    stats: Arc<CacheStats>,
}

impl DistributedCache {
    // == Constructor ==
    pub fn new(store: Arc<dyn EntryStore>, clock: Arc<dyn Clock>, settings: CacheSettings) -> Self {
        Self {
            store,
            clock,
            settings,
            stats: Arc::new(CacheStats::new()),
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// A sweeper over the same store and clock.
    pub fn sweeper(&self) -> ExpiredEntriesSweeper {
        ExpiredEntriesSweeper::new(self.store.clone(), self.clock.clone())
    }

    // == Get ==
    /// Returns the value stored under `key`, or None on a miss.
    ///
    /// A live sliding entry gets a new window, written back either before returning
    /// or in the background depending on `wait_for_refresh_on_get`.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mode = if self.settings.wait_for_refresh_on_get {
            RefreshWrite::Await
        } else {
            RefreshWrite::Detached
        };
        self.load(key, mode).await
    }

    /// [`get`](Self::get) that always waits for the refresh write, whatever the
    /// settings say. Used by callers that block anyway and may not have a runtime
    /// driving background tasks.
    pub(crate) async fn get_awaiting_refresh(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.load(key, RefreshWrite::Await).await
    }

    // == Refresh ==
    /// Extends the sliding window of `key` like [`get`](Self::get), always waiting
    /// for the write.
    pub async fn refresh(&self, key: &str) -> Result<()> {
        self.load(key, RefreshWrite::Await).await.map(|_| ())
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any existing entry.
    ///
    /// An entry that would already be expired is silently dropped.
    pub async fn set(
        &self,
        key: &str,
        value: impl Into<Vec<u8>>,
        options: &EntryOptions,
    ) -> Result<()> {
        validate_key(key)?;

        let options = match self.settings.default_sliding_expiration {
            Some(window) if options.is_empty() => options.with_sliding_expiration(window),
            _ => *options,
        };

        let entry = CacheEntry::create(self.clock.as_ref(), key, value, &options);
        if entry.is_expired(self.clock.as_ref()) {
            debug!("Discarding write for '{}': already expired", key);
            self.stats.record_discarded_write();
            return Ok(());
        }

        self.store.upsert(&entry).await
    }

    // == Remove ==
    /// Deletes `key`. Removing an absent key succeeds.
    pub async fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.store.delete(key).await
    }

    // == String Helpers ==
    /// [`get`](Self::get) decoding the payload as UTF-8.
    pub async fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self.get(key).await? {
            Some(bytes) => Ok(Some(String::from_utf8(bytes)?)),
            None => Ok(None),
        }
    }

    /// [`set`](Self::set) storing the UTF-8 bytes of `value`.
    pub async fn set_string(&self, key: &str, value: &str, options: &EntryOptions) -> Result<()> {
        self.set(key, value.as_bytes(), options).await
    }

    // == Load ==
    async fn load(&self, key: &str, mode: RefreshWrite) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;

        let Some(mut entry) = self.store.find(key).await? else {
            self.stats.record_miss();
            return Ok(None);
        };

        let now = self.clock.now();
        if entry.is_expired_at(now) {
            debug!("Entry '{}' expired, removing", key);
            self.stats.record_miss();
            self.store.delete_if_expired(key, now).await?;
            return Ok(None);
        }

        if let Some(refresh_before) = entry.refresh_at(now) {
            self.stats.record_refresh();
            match mode {
                RefreshWrite::Await => {
                    self.store.update_refresh_before(key, refresh_before).await?;
                }
                RefreshWrite::Detached => {
                    let store = self.store.clone();
                    let key = key.to_string();
                    tokio::spawn(async move {
                        if let Err(e) = store.update_refresh_before(&key, refresh_before).await {
                            warn!("Background refresh of '{}' failed: {}", key, e);
                        }
                    });
                }
            }
        }

        self.stats.record_hit();
        Ok(Some(entry.value))
    }
}

/// Rejects keys no store can address. An empty key stands in for a missing one.
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument(
            "Key cannot be empty".to_string(),
        ));
    }
    Ok(())
}
