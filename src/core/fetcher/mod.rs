//! Domain fetchers and the instrumentation wrapper around them.
//!
//! Each fetcher calls one upstream API, normalizes the payload and writes its
//! own domain record into the store. On failure it returns an error and leaves
//! the previous record in place.

mod electricity;
mod instrumented;
mod transport;
mod weather;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use electricity::{select_price_slots, ElectricityFetcher, SpotPrice};
pub use instrumented::InstrumentedFetcher;
pub use transport::{
    join_stop_responses, parse_stop_gid, StopRequest, StopResponse, TransportFetcher,
};
pub use weather::{merge_forecast, parse_timeseries, TimeSeries, WeatherFetcher};

/// Timeout for every outbound upstream call
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// A zero-argument fetch of one domain.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Name recorded in the call history
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<()>;
}

/// HTTP client shared by all fetchers.
pub fn build_http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!("rasp-info/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}
