//! Thread-safe container for the aggregate snapshot.
//!
//! A single reader/writer lock guards the whole snapshot so that `get` can copy
//! all three domains at one consistent point in time. Guards never escape a
//! method, so no caller can hold the lock across an `.await`.

use chrono::Utc;
use parking_lot::RwLock;

use super::records::{
    AggregateSnapshot, CallRecord, DebugView, DeviceMetrics, DomainRecord, LogLine,
};

#[derive(Debug, Default)]
pub struct SnapshotStore {
    data: RwLock<AggregateSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep copy of the current state.
    pub fn get(&self) -> AggregateSnapshot {
        self.data.read().clone()
    }

    /// Replace one domain's record as a whole.
    pub fn update_domain(&self, record: DomainRecord) {
        let mut data = self.data.write();
        match record {
            DomainRecord::Transport(transport) => data.transport = transport,
            DomainRecord::Weather(weather) => data.weather = weather,
            DomainRecord::Electricity(electricity) => data.electricity = electricity,
        }
    }

    pub fn append_call_record(&self, record: CallRecord) {
        self.data.write().call_history.push(record);
    }

    /// Append a log line stamped with the current time.
    pub fn append_log_line(&self, message: impl Into<String>) {
        let line = LogLine {
            timestamp: Utc::now(),
            message: message.into(),
        };
        self.data.write().app_log.push(line);
    }

    pub fn update_device_metrics(&self, sample: DeviceMetrics) {
        self.data.write().device = sample;
    }

    pub fn get_debug_view(&self) -> DebugView {
        let data = self.data.read();
        DebugView {
            api_calls: data.call_history.to_vec(),
            app_logs: data.app_log.to_vec(),
            device: data.device.clone(),
        }
    }
}
