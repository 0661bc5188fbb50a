//! JSON projections of the store for external readers.
//!
//! Readers only ever see the last known-good snapshot; upstream failures show
//! up solely in the call history. A serialization failure is logged and yields
//! `Value::Null` without touching the store.

use serde::Serialize;
use serde_json::{json, Value};

use crate::core::config::Config;
use crate::core::store::{AggregateSnapshot, SnapshotStore};

fn to_value<T: Serialize>(what: &str, value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        log::error!("Error encoding {}: {}", what, e);
        Value::Null
    })
}

/// The three domain records
pub fn public_status(snapshot: &AggregateSnapshot) -> Value {
    to_value("status", snapshot)
}

/// Masked configuration together with the public status
pub fn debug_status(config: &Config, snapshot: &AggregateSnapshot) -> Value {
    json!({
        "config": to_value("debug config", &config.masked()),
        "store": public_status(snapshot),
    })
}

/// API call history, oldest first
pub fn timeline(store: &SnapshotStore) -> Value {
    to_value("timeline", &store.get_debug_view().api_calls)
}

/// Captured application log lines, oldest first
pub fn logs(store: &SnapshotStore) -> Value {
    to_value("logs", &store.get_debug_view().app_logs)
}

pub fn device(store: &SnapshotStore) -> Value {
    to_value("device info", &store.get_debug_view().device)
}
