//! Expired-Entry Sweeper
//!
//! Reclaims space held by expired entries. Reads never depend on a sweep having run;
//! the cache filters expired entries on its own.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::Result;
use crate::store::EntryStore;

// == Sweeper ==
/// Deletes every entry whose absolute bound or sliding window has passed.
#[derive(Debug, Clone)]
pub struct ExpiredEntriesSweeper {
    store: Arc<dyn EntryStore>,
    clock: Arc<dyn Clock>,
}

impl ExpiredEntriesSweeper {
    pub fn new(store: Arc<dyn EntryStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Runs one sweep and returns the number of removed entries.
    pub async fn run(&self) -> Result<u64> {
        let now = self.clock.now();
        let removed = self.store.delete_expired(now).await?;

        if removed > 0 {
            info!("Expired-entry sweep: removed {} entries", removed);
        } else {
            debug!("Expired-entry sweep: no expired entries found");
        }
        Ok(removed)
    }
}

/// Spawns a background task that runs `sweeper` every `interval`.
///
/// A failed run is logged and the loop carries on with the next tick.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_sweep_task(cache.sweeper(), Duration::from_secs(300));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task(sweeper: ExpiredEntriesSweeper, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting expired-entry sweep task with interval of {:?}",
            interval
        );

        loop {
            tokio::time::sleep(interval).await;

            if let Err(e) = sweeper.run().await {
                warn!("Expired-entry sweep failed: {}", e);
            }
        }
    })
}
