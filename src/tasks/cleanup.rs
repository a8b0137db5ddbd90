//! TTL Cleanup Task
//!
//! Background task that periodically purges expired cache entries. Reads
//! already treat expired entries as absent; this only bounds memory.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::coordinator::RequestCoordinator;

/// Spawns a background task that periodically purges expired entries.
///
/// # Arguments
/// * `coordinator` - Coordinator whose cache is swept
/// * `cleanup_interval_secs` - Interval in seconds between purges
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_cleanup_task<V>(
    coordinator: RequestCoordinator<V>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = coordinator.purge_expired();

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
