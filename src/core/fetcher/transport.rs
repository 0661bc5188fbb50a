//! Public transit departures from the HSL Digitransit GraphQL API.
//!
//! Configured stops are resolved to GTFS ids, turned into typed request
//! descriptors and fetched with a single `stops(ids: ...)` query. Responses are
//! joined back to the descriptors by GTFS id.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::Fetcher;
use crate::core::config::{BusStop, Config};
use crate::core::store::{Departure, DomainRecord, SnapshotStore, StopData, TransportData};
use crate::error::{RaspError, Result};

const SOURCE: &str = "HSL";
const GTFS_PREFIX: &str = "HSL:";
const KEY_HEADER: &str = "digitransit-subscription-key";

const DEPARTURES_QUERY: &str = r#"
query Departures($ids: [String]) {
  stops(ids: $ids) {
    gtfsId
    name
    stoptimesWithoutPatterns(numberOfDepartures: 4) {
      realtimeDeparture
      realtime
      serviceDay
      headsign
      trip {
        route {
          shortName
        }
      }
    }
  }
}
"#;

/// One stop to query, keyed by its GTFS id.
#[derive(Debug, Clone, PartialEq)]
pub struct StopRequest {
    /// GTFS id, used to join the response back
    pub key: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopResponse {
    pub gtfs_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "stoptimesWithoutPatterns")]
    pub stoptimes: Vec<StopTime>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopTime {
    pub realtime_departure: i64,
    #[serde(default)]
    pub realtime: bool,
    pub service_day: i64,
    #[serde(default)]
    pub headsign: Option<String>,
    pub trip: Option<Trip>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Trip {
    pub route: Route,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<StopsData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct StopsData {
    #[serde(default)]
    stops: Vec<Option<StopResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    features: Vec<GeocodingFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodingFeature {
    properties: GeocodingProperties,
}

#[derive(Debug, Deserialize)]
struct GeocodingProperties {
    gid: String,
}

pub struct TransportFetcher {
    client: reqwest::Client,
    api_url: String,
    geocoding_url: String,
    api_key: String,
    stops: Vec<BusStop>,
    store: Arc<SnapshotStore>,
}

impl TransportFetcher {
    pub fn new(client: reqwest::Client, config: &Config, store: Arc<SnapshotStore>) -> Self {
        Self {
            client,
            api_url: config.hsl_api_url.clone(),
            geocoding_url: config.hsl_geocoding_url.clone(),
            api_key: config.hsl_api_key.clone(),
            stops: config.bus_stops.clone(),
            store,
        }
    }

    /// Resolve a human stop code (e.g. `E2185`) to a GTFS id (`HSL:2132207`)
    /// through the Digitransit geocoding API.
    pub async fn lookup_stop(&self, short_code: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.geocoding_url)
            .query(&[
                ("text", short_code),
                ("size", "1"),
                ("layers", "stop"),
                ("sources", "gtfshsl"),
            ])
            .header(KEY_HEADER, &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RaspError::status("geocoding", response.status().as_u16()));
        }

        let result: GeocodingResponse = response
            .json()
            .await
            .map_err(|e| RaspError::decode("geocoding", e))?;

        let feature = result.features.first().ok_or_else(|| {
            RaspError::stop_lookup(format!("no features found for code: {}", short_code))
        })?;

        parse_stop_gid(&feature.properties.gid)
    }

    /// Resolve every configured stop. Stops that cannot be resolved are logged
    /// and skipped.
    async fn build_stop_requests(&self) -> Vec<StopRequest> {
        let mut requests = Vec::with_capacity(self.stops.len());

        for stop in &self.stops {
            let key = if stop.id.starts_with(GTFS_PREFIX) {
                stop.id.clone()
            } else {
                log::info!("Resolving stop code via geocoding API: {}", stop.id);
                match self.lookup_stop(&stop.id).await {
                    Ok(id) => {
                        log::info!("Resolved {} to GTFS id {}", stop.id, id);
                        id
                    }
                    Err(e) => {
                        log::error!("Failed to resolve stop {}: {}", stop.id, e);
                        continue;
                    }
                }
            };

            requests.push(StopRequest {
                key,
                display_name: stop.name.clone(),
            });
        }

        requests
    }
}

#[async_trait]
impl Fetcher for TransportFetcher {
    fn name(&self) -> &str {
        SOURCE
    }

    async fn fetch(&self) -> Result<()> {
        log::info!("Starting HSL fetch...");

        if self.stops.is_empty() {
            log::warn!("HSL: no stops configured");
            self.store.update_domain(DomainRecord::Transport(TransportData {
                stops: Vec::new(),
                timestamp: Some(Utc::now()),
            }));
            return Ok(());
        }

        let requests = self.build_stop_requests().await;
        if requests.is_empty() {
            // keep the last good record
            return Err(RaspError::stop_lookup(format!(
                "none of the {} configured stops could be resolved",
                self.stops.len()
            )));
        }

        let ids: Vec<&str> = requests.iter().map(|r| r.key.as_str()).collect();
        let body = json!({
            "query": DEPARTURES_QUERY,
            "variables": { "ids": ids },
        });

        log::info!("HSL: Sending request to {}", self.api_url);
        let response = self
            .client
            .post(&self.api_url)
            .header(KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RaspError::status(SOURCE, response.status().as_u16()));
        }

        let text = response.text().await?;
        let result: GraphQlResponse =
            serde_json::from_str(&text).map_err(|e| RaspError::decode(SOURCE, e))?;

        let data = match result.data {
            Some(data) => data,
            None => {
                let messages: Vec<String> = result.errors.into_iter().map(|e| e.message).collect();
                return Err(RaspError::decode(SOURCE, messages.join("; ")));
            }
        };

        let responses: Vec<StopResponse> = data.stops.into_iter().flatten().collect();
        log::info!("HSL: Received data for {} stops", responses.len());

        let stops = join_stop_responses(&requests, responses);
        self.store.update_domain(DomainRecord::Transport(TransportData {
            stops,
            timestamp: Some(Utc::now()),
        }));

        log::info!("HSL: Fetch completed successfully");
        Ok(())
    }
}

/// Join stop responses to their requests by GTFS id, in request order.
///
/// Requests without a matching response are logged and left out.
pub fn join_stop_responses(
    requests: &[StopRequest],
    responses: Vec<StopResponse>,
) -> Vec<StopData> {
    let by_key: HashMap<String, StopResponse> = responses
        .into_iter()
        .map(|r| (r.gtfs_id.clone(), r))
        .collect();

    let mut stops = Vec::with_capacity(requests.len());
    for request in requests {
        let Some(response) = by_key.get(&request.key) else {
            log::warn!("HSL: No data found for stop {} ({})", request.key, request.display_name);
            continue;
        };

        let departures: Vec<Departure> = response
            .stoptimes
            .iter()
            .filter_map(|st| {
                let time =
                    DateTime::<Utc>::from_timestamp(st.service_day + st.realtime_departure, 0)?;
                Some(Departure {
                    route_number: st
                        .trip
                        .as_ref()
                        .and_then(|t| t.route.short_name.clone())
                        .unwrap_or_default(),
                    destination: st.headsign.clone().unwrap_or_default(),
                    time,
                    realtime: st.realtime,
                })
            })
            .collect();

        log::debug!(
            "HSL: Processed stop {} ({}): {} departures",
            request.display_name,
            request.key,
            departures.len()
        );
        stops.push(StopData {
            stop_name: request.display_name.clone(),
            departures,
        });
    }

    stops
}

/// Extract the GTFS stop id from a geocoding gid.
///
/// `gtfshsl:stop:GTFS:HSL:1234567#E1234` becomes `HSL:1234567`.
pub fn parse_stop_gid(gid: &str) -> Result<String> {
    let parts: Vec<&str> = gid.split(':').collect();
    if parts.len() < 5 {
        return Err(RaspError::stop_lookup(format!("unexpected gid format: {}", gid)));
    }

    let stop_id = parts[4].split('#').next().unwrap_or_default();
    if stop_id.is_empty() {
        return Err(RaspError::stop_lookup(format!("unexpected gid format: {}", gid)));
    }

    Ok(format!("{}{}", GTFS_PREFIX, stop_id))
}
