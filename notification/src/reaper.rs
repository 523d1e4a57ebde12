use crate::registry::RegistrantRegistry;
use log::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Removes stale registrants every `interval` until cancelled.
pub async fn run(
    registry: Arc<RegistrantRegistry>,
    interval: Duration,
    stale_threshold: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let reaped = registry.reap(Instant::now(), stale_threshold);
                if !reaped.is_empty() {
                    info!(
                        "Cleanup: removed {} stale clients (total: {})",
                        reaped.len(),
                        registry.len()
                    );
                }
            }
        }
    }

    debug!("Notification reaper stopped");
}
