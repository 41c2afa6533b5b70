// src/tasks/daily_reset.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::services::{EarnService, OfferRegistry};
use crate::Error;

/// Spawns a background task that zeroes every user's daily ad counter once
/// per `interval`. The first run happens immediately. The task ends when
/// `shutdown_rx` flips to `true`.
pub fn spawn_daily_reset_task(
    earn: Arc<EarnService>,
    offers: Arc<OfferRegistry>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = run_daily_reset(&earn, &offers).await {
                        error!("Daily ads reset failed: {:?}", e);
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Daily reset task shutting down.");
                        break;
                    }
                }
            }
        }
    })
}

/// One reset pass: daily counters back to zero, expired button tokens dropped.
pub async fn run_daily_reset(earn: &EarnService, offers: &OfferRegistry) -> Result<u64, Error> {
    let touched = earn.reset_daily().await?;
    let pruned = offers.prune_expired(Utc::now());
    info!(
        "Daily ads reset completed ({} users reset, {} stale offers pruned)",
        touched, pruned
    );
    Ok(touched)
}
