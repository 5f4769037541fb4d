//! Blocking Cache Module
//!
//! Synchronous entry points for callers outside async code. Every call drives the
//! async [`DistributedCache`] operation to completion on a Tokio runtime handle
//! owned by the caller.

use tokio::runtime::Handle;

use crate::cache::{DistributedCache, EntryOptions};
use crate::error::Result;

// == Blocking Cache ==
/// Blocking facade over [`DistributedCache`].
///
/// Must not be used from within an async context; [`Handle::block_on`] panics there.
///
/// Reads always wait for the sliding refresh write, even when the cache is set up
/// to write it in the background. A current-thread runtime only runs spawned tasks
/// while something blocks on it, so a detached write could otherwise never land.
#[derive(Debug, Clone)]
pub struct BlockingCache {
    inner: DistributedCache,
    handle: Handle,
}

impl BlockingCache {
    pub fn new(inner: DistributedCache, handle: Handle) -> Self {
        Self { inner, handle }
    }

    /// The async cache behind this facade.
    pub fn inner(&self) -> &DistributedCache {
        &self.inner
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.handle.block_on(self.inner.get_awaiting_refresh(key))
    }

    pub fn set(&self, key: &str, value: impl Into<Vec<u8>>, options: &EntryOptions) -> Result<()> {
        self.handle.block_on(self.inner.set(key, value, options))
    }

    pub fn refresh(&self, key: &str) -> Result<()> {
        self.handle.block_on(self.inner.refresh(key))
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.handle.block_on(self.inner.remove(key))
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(String::from_utf8(bytes)?)),
            None => Ok(None),
        }
    }

    pub fn set_string(&self, key: &str, value: &str, options: &EntryOptions) -> Result<()> {
        self.handle.block_on(self.inner.set_string(key, value, options))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheSettings;
    use crate::clock::{Clock, ManualClock};
    use crate::store::{EntryStore, MemoryStore};
    use chrono::Duration;
    use std::sync::Arc;

    fn blocking_cache(runtime: &tokio::runtime::Runtime) -> (BlockingCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = DistributedCache::new(
            Arc::new(MemoryStore::new()),
            clock.clone(),
            CacheSettings::default(),
        );
        (BlockingCache::new(cache, runtime.handle().clone()), clock)
    }

    #[test]
    fn test_blocking_round_trip() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (cache, _) = blocking_cache(&runtime);

        assert_eq!(cache.get_string("key").unwrap(), None);
        cache.set_string("key", "value", &EntryOptions::new()).unwrap();
        assert_eq!(cache.get_string("key").unwrap().as_deref(), Some("value"));

        cache.remove("key").unwrap();
        assert_eq!(cache.get("key").unwrap(), None);
    }

    #[test]
    fn test_blocking_sliding_expiration() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (cache, clock) = blocking_cache(&runtime);
        let sliding = EntryOptions::new().with_sliding_expiration(Duration::seconds(10));

        cache.set("key", b"value".to_vec(), &sliding).unwrap();
        clock.advance(Duration::seconds(8));
        cache.refresh("key").unwrap();
        clock.advance(Duration::seconds(8));

        assert_eq!(cache.get("key").unwrap(), Some(b"value".to_vec()));
        assert_eq!(cache.inner().stats().refreshes, 2);

        clock.set(clock.now() + Duration::seconds(10));
        assert_eq!(cache.get("key").unwrap(), None);
    }

    #[test]
    fn test_detached_setting_still_persists_refresh_on_current_thread_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        let start = clock.now();
        let settings = CacheSettings {
            wait_for_refresh_on_get: false,
            ..CacheSettings::default()
        };
        let cache = BlockingCache::new(
            DistributedCache::new(store.clone(), clock.clone(), settings),
            runtime.handle().clone(),
        );

        let sliding = EntryOptions::new().with_sliding_expiration(Duration::seconds(10));
        cache.set("key", b"value".to_vec(), &sliding).unwrap();

        clock.set(start + Duration::seconds(8));
        assert_eq!(cache.get("key").unwrap(), Some(b"value".to_vec()));

        let stored = runtime.block_on(store.find("key")).unwrap().unwrap();
        assert_eq!(stored.refresh_before(), Some(start + Duration::seconds(18)));

        clock.set(start + Duration::seconds(11));
        assert_eq!(cache.get("key").unwrap(), Some(b"value".to_vec()));
    }

    #[test]
    fn test_blocking_matches_async_results() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (cache, _) = blocking_cache(&runtime);

        cache.set_string("key", "value", &EntryOptions::new()).unwrap();
        let from_async = tokio_test::block_on(cache.inner().get_string("key")).unwrap();

        assert_eq!(from_async, cache.get_string("key").unwrap());
    }
}
