//! Stale Entry Cleanup Task
//!
//! Background task that periodically removes cache entries that are no
//! longer fresh. Fetch results are unaffected since stale entries are never
//! served. The sweep only reclaims memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheStore, Clock};

/// Spawns a background task that periodically removes stale cache entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between
/// sweeps. Staleness is judged by `clock`, which should be the same clock
/// the readers of `cache` use. Abort the returned handle to stop it.
///
/// # Example
/// ```ignore
/// let handle = spawn_cleanup_task(store, Duration::from_secs(30), system_clock());
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task<V>(
    cache: Arc<RwLock<CacheStore<V>>>,
    interval: Duration,
    clock: Clock,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            interval_ms = interval.as_millis() as u64,
            "Starting stale entry cleanup task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.cleanup_stale(clock())
            };

            if removed > 0 {
                info!(removed, "Cleanup: removed stale entries");
            } else {
                debug!("Cleanup: no stale entries found");
            }
        }
    })
}
