//! In-Memory Store
//!
//! HashMap-backed [`EntryStore`] for tests and single-process deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::cache::CacheEntry;
use crate::error::Result;
use crate::store::EntryStore;

// == Memory Store ==
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Returns the stored keys in sorted order.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn find(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn upsert(&self, entry: &CacheEntry) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(entry.key.clone(), entry.clone());
        Ok(())
    }

    async fn update_refresh_before(
        &self,
        key: &str,
        refresh_before: DateTime<Utc>,
    ) -> Result<()> {
        let mut entries = self.entries.write().await;
        if let Some(window) = entries.get_mut(key).and_then(|e| e.sliding.as_mut()) {
            window.refresh_before = refresh_before;
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn delete_if_expired(&self, key: &str, now: DateTime<Utc>) -> Result<()> {
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.is_expired_at(now)) {
            entries.remove(key);
        }
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        Ok((before - entries.len()) as u64)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EntryOptions;
    use crate::clock::{Clock, ManualClock};
    use chrono::Duration;

    fn entry(clock: &ManualClock, key: &str, options: EntryOptions) -> CacheEntry {
        CacheEntry::create(clock, key, key.as_bytes().to_vec(), &options)
    }

    #[tokio::test]
    async fn test_upsert_and_find() {
        let clock = ManualClock::default();
        let store = MemoryStore::new();

        store.upsert(&entry(&clock, "a", EntryOptions::new())).await.unwrap();
        let found = store.find("a").await.unwrap().unwrap();

        assert_eq!(found.value, b"a");
        assert!(store.find("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_whole_entry() {
        let clock = ManualClock::default();
        let store = MemoryStore::new();
        let sliding = EntryOptions::new().with_sliding_expiration(Duration::seconds(10));

        store.upsert(&entry(&clock, "a", sliding)).await.unwrap();
        store.upsert(&entry(&clock, "a", EntryOptions::new())).await.unwrap();

        let found = store.find("a").await.unwrap().unwrap();
        assert!(found.sliding.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_refresh_before_skips_non_sliding() {
        let clock = ManualClock::default();
        let store = MemoryStore::new();
        let later = clock.now() + Duration::seconds(60);

        store.upsert(&entry(&clock, "plain", EntryOptions::new())).await.unwrap();
        store.update_refresh_before("plain", later).await.unwrap();
        store.update_refresh_before("missing", later).await.unwrap();

        assert!(store.find("plain").await.unwrap().unwrap().sliding.is_none());
        assert!(store.find("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_if_expired_keeps_live_entry() {
        let clock = ManualClock::default();
        let store = MemoryStore::new();
        let ttl = EntryOptions::new().with_absolute_expiration_relative_to_now(Duration::seconds(5));

        store.upsert(&entry(&clock, "a", ttl)).await.unwrap();
        store.delete_if_expired("a", clock.now()).await.unwrap();
        assert_eq!(store.len().await, 1);

        clock.advance(Duration::seconds(5));
        store.delete_if_expired("a", clock.now()).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_expired_counts_removed() {
        let clock = ManualClock::default();
        let store = MemoryStore::new();

        store
            .upsert(&entry(
                &clock,
                "short",
                EntryOptions::new().with_absolute_expiration_relative_to_now(Duration::seconds(1)),
            ))
            .await
            .unwrap();
        store
            .upsert(&entry(
                &clock,
                "sliding",
                EntryOptions::new().with_sliding_expiration(Duration::seconds(2)),
            ))
            .await
            .unwrap();
        store.upsert(&entry(&clock, "forever", EntryOptions::new())).await.unwrap();

        clock.advance(Duration::seconds(3));
        let removed = store.delete_expired(clock.now()).await.unwrap();

        assert_eq!(removed, 2);
        assert_eq!(store.keys().await, vec!["forever".to_string()]);
    }
}
