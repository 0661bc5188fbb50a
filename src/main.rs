use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::sync::Arc;

use rasp_info::commands;
use rasp_info::core::config::DEFAULT_CONFIG_FILE;
use rasp_info::{init_logging, Config, SnapshotStore};

fn main() -> Result<()> {
    let matches = Command::new("rasp-info")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Polls transit, weather and electricity price data into an in-memory snapshot")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Path to the JSON configuration file")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value(DEFAULT_CONFIG_FILE)
                .global(true),
        )
        .subcommand(Command::new("run").about("Start polling (default)"))
        .subcommand(
            Command::new("lookup")
                .about("Resolve an HSL stop code (e.g. E2185) to its GTFS stop id")
                .arg(
                    Arg::new("code")
                        .help("Short stop code")
                        .required(true)
                        .index(1),
                ),
        )
        .get_matches();

    let store = Arc::new(SnapshotStore::new());
    init_logging(store.clone())?;

    let config_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = Config::load(&config_path);

    match matches.subcommand() {
        Some(("lookup", sub_matches)) => commands::lookup::execute(sub_matches, &config, store),
        _ => commands::run::execute(config, store),
    }
}
