//! Run the poller until interrupted.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::core::{Config, Scheduler, SnapshotStore};

pub fn execute(config: Config, store: Arc<SnapshotStore>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("rasp-worker")
        .build()
        .context("Failed to build tokio runtime")?;

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    ctrlc::set_handler(move || on_signal.cancel()).context("Failed to install Ctrl-C handler")?;

    log::info!(
        "Polling {} stops, weather for {}",
        config.bus_stops.len(),
        config.weather_location
    );

    runtime.block_on(async move {
        let scheduler = Scheduler::from_config(&config, store, shutdown.clone())
            .context("Failed to set up fetchers")?;
        let handle = scheduler.start();

        shutdown.cancelled().await;
        log::info!("Shutting down");
        handle.join().await;
        Ok::<(), anyhow::Error>(())
    })
}
