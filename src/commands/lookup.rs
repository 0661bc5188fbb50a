//! One-shot resolution of a human stop code to a GTFS id.

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use std::sync::Arc;

use crate::core::fetcher::{build_http_client, TransportFetcher};
use crate::core::{Config, SnapshotStore};

pub fn execute(matches: &ArgMatches, config: &Config, store: Arc<SnapshotStore>) -> Result<()> {
    let code = matches
        .get_one::<String>("code")
        .context("Stop code argument is required")?;

    if !config.has_hsl_key() {
        bail!("HSL API key is missing. Please configure it in config.json or secrets.txt");
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let fetcher = TransportFetcher::new(build_http_client()?, config, store);
    let id = runtime
        .block_on(fetcher.lookup_stop(code))
        .context("Error looking up stop")?;

    println!("Resolved code {} to GTFS stop id: {}", code, id);
    Ok(())
}
