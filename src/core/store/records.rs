use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use super::history::{BoundedLog, APP_LOG_CAPACITY, CALL_HISTORY_CAPACITY};

/// The three independently polled data domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Transport,
    Weather,
    Electricity,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Transport => "transport",
            Domain::Weather => "weather",
            Domain::Electricity => "electricity",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Transport ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Departure {
    pub route_number: String,
    pub destination: String,
    pub time: DateTime<Utc>,
    pub realtime: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopData {
    pub stop_name: String,
    pub departures: Vec<Departure>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportData {
    pub stops: Vec<StopData>,
    pub timestamp: Option<DateTime<Utc>>,
}

// --- Weather ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherPoint {
    pub temperature: f64,
    pub precipitation: f64,
    /// Probability of precipitation, percent
    pub pop: f64,
    pub symbol: String,
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub current: WeatherPoint,
    pub forecast: Vec<WeatherPoint>,
}

// --- Electricity ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSlot {
    /// c/kWh including tax
    pub price: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElectricityData {
    pub current_price: f64,
    pub prices: Vec<PriceSlot>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// A complete record for exactly one domain.
///
/// Updates always replace the whole record, so readers never observe a mix of
/// old and new fields.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainRecord {
    Transport(TransportData),
    Weather(WeatherData),
    Electricity(ElectricityData),
}

impl DomainRecord {
    pub fn domain(&self) -> Domain {
        match self {
            DomainRecord::Transport(_) => Domain::Transport,
            DomainRecord::Weather(_) => Domain::Weather,
            DomainRecord::Electricity(_) => Domain::Electricity,
        }
    }
}

// --- Debug / Monitoring ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallOutcome {
    Success,
    Error,
}

/// One instrumented fetch invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
    pub source: String,
    pub outcome: CallOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallRecord {
    pub fn is_success(&self) -> bool {
        self.outcome == CallOutcome::Success
    }
}

fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("{:?}", duration))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Process and runtime sample
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetrics {
    pub uptime_secs: u64,
    /// Alive tokio tasks at sample time
    pub task_count: usize,
    /// Resident set size in bytes
    pub mem_allocated_bytes: u64,
    /// Virtual memory size in bytes
    pub mem_reserved_bytes: u64,
    pub cpu_count: usize,
}

/// Whole in-memory state: latest record per domain plus operational logs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSnapshot {
    pub transport: TransportData,
    pub weather: WeatherData,
    pub electricity: ElectricityData,
    #[serde(skip)]
    pub call_history: BoundedLog<CallRecord>,
    #[serde(skip)]
    pub app_log: BoundedLog<LogLine>,
    #[serde(skip)]
    pub device: DeviceMetrics,
}

impl Default for AggregateSnapshot {
    fn default() -> Self {
        Self {
            transport: TransportData::default(),
            weather: WeatherData::default(),
            electricity: ElectricityData::default(),
            call_history: BoundedLog::with_capacity(CALL_HISTORY_CAPACITY),
            app_log: BoundedLog::with_capacity(APP_LOG_CAPACITY),
            device: DeviceMetrics::default(),
        }
    }
}

/// Copies of the operational logs, independent of the live store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DebugView {
    pub api_calls: Vec<CallRecord>,
    pub app_logs: Vec<LogLine>,
    pub device: DeviceMetrics,
}
