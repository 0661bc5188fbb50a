//! Per-domain polling task.

use std::sync::Arc;

use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::fetcher::InstrumentedFetcher;

/// Task that runs one instrumented fetcher on a fixed interval.
///
/// The first tick fires one full `period` after start; the immediate startup
/// fetch is spawned separately. Each tick awaits `run()` before the timer is
/// polled again, so ticks of the same domain never overlap. A failed fetch is
/// logged and the loop continues. Cancellation is observed between ticks and
/// does not interrupt a fetch in flight.
pub async fn domain_fetch_task(
    fetcher: Arc<InstrumentedFetcher>,
    period: Duration,
    shutdown: CancellationToken,
) {
    log::info!("{} polling task started (every {:?})", fetcher.name(), period);

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                log::info!("{} polling task shutting down", fetcher.name());
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = fetcher.run().await {
                    log::error!("Error fetching {} data: {}", fetcher.name(), e);
                }
            }
        }
    }
}

/// One out-of-band fetch at startup so the store fills before the first tick.
///
/// May race with the first scheduled tick of the same domain. Both writes are
/// whole-record replacements, so the outcome is last-write-wins. Unlike the
/// timer loop, a cancelled token abandons this fetch mid-flight; no call
/// record is written for it.
pub async fn initial_fetch_task(fetcher: Arc<InstrumentedFetcher>, shutdown: CancellationToken) {
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => {
            log::info!("Initial {} fetch abandoned on shutdown", fetcher.name());
        }
        result = fetcher.run() => {
            if let Err(e) = result {
                log::error!("Initial {} fetch failed: {}", fetcher.name(), e);
            }
        }
    }
}
