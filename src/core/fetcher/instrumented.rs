use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use super::Fetcher;
use crate::core::store::{CallOutcome, CallRecord, SnapshotStore};
use crate::error::Result;

/// Wraps a fetcher and records every invocation in the store's call history.
///
/// The result of the wrapped fetch is passed through unchanged; the wrapper
/// only observes it. Exactly one `CallRecord` is appended per `run`.
pub struct InstrumentedFetcher {
    inner: Box<dyn Fetcher>,
    store: Arc<SnapshotStore>,
}

impl InstrumentedFetcher {
    pub fn new(inner: Box<dyn Fetcher>, store: Arc<SnapshotStore>) -> Self {
        Self { inner, store }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn run(&self) -> Result<()> {
        let timestamp = Utc::now();
        let start = Instant::now();
        let result = self.inner.fetch().await;
        let duration = start.elapsed();

        let (outcome, error) = match &result {
            Ok(()) => (CallOutcome::Success, None),
            Err(e) => (CallOutcome::Error, Some(e.to_string())),
        };

        self.store.append_call_record(CallRecord {
            timestamp,
            duration,
            source: self.inner.name().to_string(),
            outcome,
            error,
        });

        result
    }
}
