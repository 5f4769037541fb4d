//! Mongo Cache - A distributed cache tier backed by MongoDB
//!
//! Stores opaque byte payloads with absolute, sliding and slide-until expiration,
//! refreshing sliding windows on access and sweeping expired documents in bulk.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{BlockingCache, CacheEntry, CacheSettings, DistributedCache, EntryOptions};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, Result};
pub use store::{EntryStore, MemoryStore, MongoStore};
pub use tasks::{spawn_sweep_task, ExpiredEntriesSweeper};
