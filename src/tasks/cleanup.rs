//! Cache Sweep Task
//!
//! Background task that periodically removes expired cache entries, so
//! responses nobody asks for again do not linger until their key is read.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::client::{Transport, WeatherClient};

/// Spawns a task that sweeps the client's cache every `interval_secs`.
///
/// An interval of zero is treated as one second. The returned handle is
/// aborted during graceful shutdown.
pub fn spawn_sweep_task<T: Transport>(client: WeatherClient<T>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!("Starting cache sweep task with interval of {:?}", interval);

        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = client.sweep_expired().await;
            if removed > 0 {
                info!("Cache sweep: removed {} expired entries", removed);
            } else {
                debug!("Cache sweep: no expired entries found");
            }
        }
    })
}
