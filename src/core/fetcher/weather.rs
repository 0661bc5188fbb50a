//! Weather forecast from the FMI open data WFS service.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use super::Fetcher;
use crate::core::config::Config;
use crate::core::store::{DomainRecord, SnapshotStore, WeatherData, WeatherPoint};
use crate::error::{RaspError, Result};

const SOURCE: &str = "FMI";
const STORED_QUERY: &str = "fmi::forecast::harmonie::surface::point::timevaluepair";
const PARAMETERS: &str = "temperature,Precipitation1h,Pop";

/// One `MeasurementTimeseries` element: its `gml:id` and the time/value pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub id: String,
    pub points: Vec<(DateTime<Utc>, f64)>,
}

pub struct WeatherFetcher {
    client: reqwest::Client,
    url: String,
    location: String,
    store: Arc<SnapshotStore>,
}

impl WeatherFetcher {
    pub fn new(client: reqwest::Client, config: &Config, store: Arc<SnapshotStore>) -> Self {
        Self {
            client,
            url: config.fmi_api_url.clone(),
            location: config.weather_location.clone(),
            store,
        }
    }
}

#[async_trait]
impl Fetcher for WeatherFetcher {
    fn name(&self) -> &str {
        SOURCE
    }

    async fn fetch(&self) -> Result<()> {
        let now = Utc::now();
        let start_time = now.to_rfc3339_opts(SecondsFormat::Secs, true);
        let end_time = (now + Duration::hours(24)).to_rfc3339_opts(SecondsFormat::Secs, true);

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("service", "WFS"),
                ("version", "2.0.0"),
                ("request", "getFeature"),
                ("storedquery_id", STORED_QUERY),
                ("place", self.location.as_str()),
                ("timestep", "60"),
                ("parameters", PARAMETERS),
                ("starttime", start_time.as_str()),
                ("endtime", end_time.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RaspError::status(SOURCE, response.status().as_u16()));
        }

        let body = response.text().await?;
        let series = parse_timeseries(&body)?;
        if series.is_empty() {
            return Err(RaspError::decode(SOURCE, "no time series in response"));
        }
        let weather = merge_forecast(&series, now);
        log::info!("FMI: {} forecast points for {}", weather.forecast.len(), self.location);

        self.store.update_domain(DomainRecord::Weather(weather));
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum TvpField {
    Time,
    Value,
}

/// Extract every `MeasurementTimeseries` from a WFS timevaluepair document.
///
/// Element names are matched on their local part so namespace prefixes do not
/// matter. Points with an unparseable time are dropped; unparseable values
/// become NaN.
pub fn parse_timeseries(xml: &str) -> Result<Vec<TimeSeries>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut series: Vec<TimeSeries> = Vec::new();
    let mut current: Option<TimeSeries> = None;
    let mut in_tvp = false;
    let mut field: Option<TvpField> = None;
    let mut time: Option<String> = None;
    let mut value: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"MeasurementTimeseries" => {
                    let mut id = String::new();
                    for attr in e.attributes() {
                        let attr = attr.map_err(quick_xml::Error::from)?;
                        if attr.key.local_name().as_ref() == b"id" {
                            id = attr.unescape_value()?.into_owned();
                        }
                    }
                    current = Some(TimeSeries {
                        id,
                        points: Vec::new(),
                    });
                }
                b"MeasurementTVP" => {
                    in_tvp = true;
                    time = None;
                    value = None;
                }
                b"time" if in_tvp => field = Some(TvpField::Time),
                b"value" if in_tvp => field = Some(TvpField::Value),
                _ => {}
            },
            Event::Text(t) => {
                if let Some(f) = field {
                    let text = t.unescape()?.into_owned();
                    match f {
                        TvpField::Time => time = Some(text),
                        TvpField::Value => value = Some(text),
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"time" | b"value" => field = None,
                b"MeasurementTVP" => {
                    in_tvp = false;
                    if let (Some(ts), Some(t)) = (current.as_mut(), time.take()) {
                        if let Ok(parsed) = DateTime::parse_from_rfc3339(t.trim()) {
                            let v = value
                                .take()
                                .and_then(|v| v.trim().parse::<f64>().ok())
                                .unwrap_or(f64::NAN);
                            ts.points.push((parsed.with_timezone(&Utc), v));
                        }
                    }
                }
                b"MeasurementTimeseries" => {
                    if let Some(ts) = current.take() {
                        series.push(ts);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(series)
}

#[derive(Default)]
struct Slot {
    temperature: Option<f64>,
    precipitation: Option<f64>,
    pop: Option<f64>,
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    match value {
        Some(v) if !v.is_nan() => v,
        _ => 0.0,
    }
}

/// Combine the parameter series into forecast points sorted by time.
///
/// The current point is the one closest to `now`; on equal distance the
/// earliest candidate wins. That tie-break is arbitrary.
pub fn merge_forecast(series: &[TimeSeries], now: DateTime<Utc>) -> WeatherData {
    let mut slots: BTreeMap<DateTime<Utc>, Slot> = BTreeMap::new();

    for ts in series {
        for &(time, value) in &ts.points {
            let slot = slots.entry(time).or_default();
            if ts.id.contains("temperature") {
                slot.temperature = Some(value);
            } else if ts.id.contains("Precipitation1h") {
                slot.precipitation = Some(value);
            } else if ts.id.contains("Pop") {
                slot.pop = Some(value);
            }
        }
    }

    let mut forecast = Vec::with_capacity(slots.len());
    let mut current: Option<(Duration, WeatherPoint)> = None;

    for (time, slot) in slots {
        let precipitation = finite_or_zero(slot.precipitation);
        let pop = finite_or_zero(slot.pop);
        let symbol = if precipitation > 0.1 || pop > 50.0 {
            "rain"
        } else {
            "cloudy"
        };

        let point = WeatherPoint {
            temperature: finite_or_zero(slot.temperature),
            precipitation,
            pop,
            symbol: symbol.to_string(),
            time: Some(time),
        };

        let distance = (time - now).abs();
        let closer = match &current {
            Some((best, _)) => distance < *best,
            None => true,
        };
        if closer {
            current = Some((distance, point.clone()));
        }

        forecast.push(point);
    }

    WeatherData {
        current: current.map(|(_, point)| point).unwrap_or_default(),
        forecast,
    }
}
