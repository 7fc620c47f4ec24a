use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::sources::{CacheKey, Sources};

/// Fetches one key and overwrites its cache slot. A failure leaves the old value in place.
pub async fn refresh_key(sources: &Sources, key: CacheKey) -> bool {
    info!("Refreshing {key}...");
    match sources.fetch(key).await {
        Ok(data) => {
            sources.cache.put(key.name(), data).await;
            info!("Done refreshing {key}");
            true
        }
        Err(err) => {
            error!(%key, error = %err, "Caught error while fetching");
            false
        }
    }
}

/// Key `idx` of `count` starts `idx * spread / count` after launch.
pub fn first_refresh_delay(idx: usize, count: usize, spread: Duration) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    spread.mul_f64(idx as f64 / count as f64)
}

/// One detached task per cache key, staggered across `spread`, each repeating every `interval`.
pub fn spawn_refreshers(sources: Sources, interval: Duration, spread: Duration) -> Vec<JoinHandle<()>> {
    let count = CacheKey::ALL.len();
    CacheKey::ALL
        .iter()
        .enumerate()
        .map(|(idx, key)| {
            let delay = first_refresh_delay(idx, count, spread);
            tokio::spawn(refresh_loop(sources.clone(), *key, delay, interval))
        })
        .collect()
}

async fn refresh_loop(sources: Sources, key: CacheKey, delay: Duration, interval: Duration) {
    tokio::time::sleep(delay).await;

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        refresh_key(&sources, key).await;
    }
}
