// rasp-info library - public API

// Re-export error types
pub mod error;
pub use error::{RaspError, Result};

// Module declarations
pub mod commands;
pub mod core;

// Re-export commonly used types
pub use core::config::Config;
pub use core::logging::init_logging;
pub use core::store::SnapshotStore;
