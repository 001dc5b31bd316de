//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cached responses.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a background task that sweeps expired entries every `check_period_secs`.
///
/// Expired keys are collected under a read lock, then removed one at a time,
/// each under its own short write lock, so request handlers are never stalled
/// for a whole pass.
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = shared(CacheStore::new(1000, 60));
/// let sweep_handle = spawn_sweep_task(cache.clone(), 120);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(cache: SharedCache, check_period_secs: u64) -> JoinHandle<()> {
    let period = Duration::from_secs(check_period_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep with a period of {} seconds",
            period.as_secs()
        );

        loop {
            tokio::time::sleep(period).await;

            let removed = sweep_expired(&cache).await;
            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}

/// Runs a single sweep pass and returns the number of entries removed.
pub async fn sweep_expired(cache: &SharedCache) -> usize {
    let expired = cache.read().await.expired_keys();

    let mut removed = 0;
    for key in expired {
        if cache.write().await.remove_if_expired(&key) {
            removed += 1;
        }
    }
    removed
}
