//! In-memory snapshot store shared by fetchers, the scheduler and readers.

mod history;
mod records;
mod snapshot_store;

pub use history::{BoundedLog, APP_LOG_CAPACITY, CALL_HISTORY_CAPACITY};
pub use records::{
    AggregateSnapshot, CallOutcome, CallRecord, DebugView, Departure, DeviceMetrics, Domain,
    DomainRecord, ElectricityData, LogLine, PriceSlot, StopData, TransportData, WeatherData,
    WeatherPoint,
};
pub use snapshot_store::SnapshotStore;
