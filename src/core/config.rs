use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const SECRETS_FILE: &str = "secrets.txt";

const MASKED: &str = "***MASKED***";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusStop {
    /// GTFS id (`HSL:1234567`) or a short stop code (`E2185`)
    pub id: String,
    pub name: String,
}

/// Runtime configuration. Changes require a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub hsl_api_url: String,
    pub hsl_api_key: String,
    pub hsl_geocoding_url: String,
    pub fmi_api_url: String,
    pub spot_api_url: String,

    pub weather_location: String,
    pub bus_stops: Vec<BusStop>,

    pub transport_interval_secs: u64,
    pub weather_interval_secs: u64,
    pub electricity_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hsl_api_url: "https://api.digitransit.fi/routing/v2/hsl/gtfs/v1".to_string(),
            hsl_api_key: String::new(),
            hsl_geocoding_url: "https://api.digitransit.fi/geocoding/v1/search".to_string(),
            fmi_api_url: "https://opendata.fmi.fi/wfs".to_string(),
            spot_api_url:
                "https://api.spot-hinta.fi/TodayAndDayForward?region=FI&priceResolution=15"
                    .to_string(),
            weather_location: "Espoo".to_string(),
            // No default stops, the user must configure them
            bus_stops: Vec::new(),
            transport_interval_secs: 5 * 60,
            weather_interval_secs: 15 * 60,
            electricity_interval_secs: 15 * 60,
        }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults.
    ///
    /// Never fails: a missing file falls back to `secrets.txt` for the HSL key
    /// (looked up next to `path`), a malformed file keeps the defaults.
    pub fn load(path: &Path) -> Self {
        let mut config = Config::default();

        match fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str::<Config>(&data) {
                Ok(parsed) => config = parsed,
                Err(e) => log::error!("Error parsing {}: {}", path.display(), e),
            },
            Err(_) => {
                let secrets = path
                    .parent()
                    .unwrap_or_else(|| Path::new(""))
                    .join(SECRETS_FILE);
                match fs::read_to_string(&secrets) {
                    Ok(key) => config.hsl_api_key = key.trim().to_string(),
                    Err(_) => log::warn!(
                        "Could not read {} or {}",
                        path.display(),
                        secrets.display()
                    ),
                }
            }
        }

        config.clamp_intervals();
        config
    }

    /// Copy of the configuration with credentials hidden
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        if !masked.hsl_api_key.is_empty() {
            masked.hsl_api_key = MASKED.to_string();
        }
        masked
    }

    pub fn has_hsl_key(&self) -> bool {
        !self.hsl_api_key.is_empty()
    }

    pub fn transport_interval(&self) -> Duration {
        Duration::from_secs(self.transport_interval_secs)
    }

    pub fn weather_interval(&self) -> Duration {
        Duration::from_secs(self.weather_interval_secs)
    }

    pub fn electricity_interval(&self) -> Duration {
        Duration::from_secs(self.electricity_interval_secs)
    }

    // tokio intervals panic on a zero period
    fn clamp_intervals(&mut self) {
        let defaults = Config::default();
        if self.transport_interval_secs == 0 {
            self.transport_interval_secs = defaults.transport_interval_secs;
        }
        if self.weather_interval_secs == 0 {
            self.weather_interval_secs = defaults.weather_interval_secs;
        }
        if self.electricity_interval_secs == 0 {
            self.electricity_interval_secs = defaults.electricity_interval_secs;
        }
    }
}
