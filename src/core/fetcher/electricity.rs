//! Electricity spot prices from spot-hinta.fi.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use super::Fetcher;
use crate::core::config::Config;
use crate::core::store::{DomainRecord, ElectricityData, PriceSlot, SnapshotStore};
use crate::error::{RaspError, Result};

const SOURCE: &str = "Electricity";
const SLOT_MINUTES: i64 = 15;
/// One day of quarter-hour slots
const MAX_SLOTS: usize = 96;

#[derive(Debug, Clone, Deserialize)]
pub struct SpotPrice {
    #[serde(rename = "PriceWithTax")]
    pub price_with_tax: f64,
    #[serde(rename = "DateTime")]
    pub date_time: String,
}

pub struct ElectricityFetcher {
    client: reqwest::Client,
    url: String,
    store: Arc<SnapshotStore>,
}

impl ElectricityFetcher {
    pub fn new(client: reqwest::Client, config: &Config, store: Arc<SnapshotStore>) -> Self {
        Self {
            client,
            url: config.spot_api_url.clone(),
            store,
        }
    }
}

#[async_trait]
impl Fetcher for ElectricityFetcher {
    fn name(&self) -> &str {
        SOURCE
    }

    async fn fetch(&self) -> Result<()> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(RaspError::status(SOURCE, response.status().as_u16()));
        }

        let body = response.text().await?;
        let prices: Vec<SpotPrice> =
            serde_json::from_str(&body).map_err(|e| RaspError::decode(SOURCE, e))?;

        let now = Utc::now();
        let (current_price, slots) = select_price_slots(&prices, now);
        log::info!(
            "Electricity: {} price slots, current {:.2} c/kWh",
            slots.len(),
            current_price
        );

        self.store.update_domain(DomainRecord::Electricity(ElectricityData {
            current_price,
            prices: slots,
            timestamp: Some(now),
        }));
        Ok(())
    }
}

/// Keep the slots from the current one up to 24 hours ahead and pick the
/// current price.
///
/// Prices are converted from EUR/kWh to c/kWh. The current price is the first
/// slot containing `now`, falling back to the first kept slot, or 0 when
/// nothing is left. Entries with unparseable timestamps are skipped.
pub fn select_price_slots(prices: &[SpotPrice], now: DateTime<Utc>) -> (f64, Vec<PriceSlot>) {
    let window_end = now + Duration::hours(24);
    let mut current: Option<f64> = None;
    let mut slots = Vec::new();

    for entry in prices {
        let start = match DateTime::parse_from_rfc3339(&entry.date_time) {
            Ok(t) => t.with_timezone(&Utc),
            Err(_) => continue,
        };
        let end = start + Duration::minutes(SLOT_MINUTES);

        if end < now {
            continue;
        }
        if start > window_end {
            break;
        }

        let price = entry.price_with_tax * 100.0;
        if current.is_none() && now > start && now < end {
            current = Some(price);
        }

        slots.push(PriceSlot {
            price,
            start_time: start,
            end_time: end,
        });

        if slots.len() >= MAX_SLOTS {
            break;
        }
    }

    let current_price = current
        .or_else(|| slots.first().map(|slot| slot.price))
        .unwrap_or(0.0);
    (current_price, slots)
}
