// Core business logic module

pub mod config;
pub mod fetcher;
pub mod logging;
pub mod scheduler;
pub mod status;
pub mod store;

// Re-export commonly used items
pub use config::{BusStop, Config};
pub use fetcher::{Fetcher, InstrumentedFetcher};
pub use scheduler::{Scheduler, SchedulerHandle};
pub use store::SnapshotStore;
