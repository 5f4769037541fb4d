//! Cache Module
//!
//! Cache entries with absolute and sliding expiration, and the service that reads,
//! refreshes and writes them through an [`EntryStore`](crate::store::EntryStore).

mod blocking;
mod entry;
mod service;
mod stats;


// Re-export public types
pub use blocking::BlockingCache;
pub use entry::{CacheEntry, EntryOptions, Expiration, SlidingWindow};
pub use service::{CacheSettings, DistributedCache};
pub use stats::{CacheStats, StatsSnapshot};
