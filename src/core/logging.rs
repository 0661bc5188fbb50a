//! Log capture: every record goes to the console and into the store's app log.

use std::sync::Arc;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::core::store::SnapshotStore;

/// `log::Log` implementation that writes through `env_logger` and forwards
/// each accepted message verbatim to the store.
pub struct StoreLogger {
    inner: env_logger::Logger,
    store: Arc<SnapshotStore>,
}

impl StoreLogger {
    pub fn new(inner: env_logger::Logger, store: Arc<SnapshotStore>) -> Self {
        Self { inner, store }
    }

    pub fn filter(&self) -> LevelFilter {
        self.inner.filter()
    }
}

impl Log for StoreLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.inner.matches(record) {
            return;
        }
        // The two writes are independent; neither reports failure to the other
        self.inner.log(record);
        self.store.append_log_line(record.args().to_string());
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Install the capturing logger as the global logger.
///
/// Defaults to `info`, overridable through `RUST_LOG`.
pub fn init_logging(store: Arc<SnapshotStore>) -> Result<(), SetLoggerError> {
    let inner = env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .build();
    let logger = StoreLogger::new(inner, store);
    let max_level = logger.filter();

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(max_level);
    Ok(())
}
