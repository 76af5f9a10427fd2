// City-name to coordinate resolution via the OpenWeatherMap geocoding API
//
// Every failure mode (non-2xx, network error, empty result list) collapses to
// `None`; callers only ever see "found" or "not found". The log line is the
// one place the causes stay distinguishable. No retries: one failed attempt
// is terminal for the request.

use crate::config::WeatherConfig;
use crate::{AmbientError, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Display name, "City, Country" when the country is known
    pub label: String,
}

#[derive(Debug, Deserialize)]
struct GeoEntry {
    name: String,
    lat: f64,
    lon: f64,
    country: Option<String>,
}

pub struct Geocoder {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl Geocoder {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AmbientError::Config("geocoder requires an API key".to_string()))?;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.geocode_timeout_ms))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| AmbientError::Geocode(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            endpoint: config.geocoding_endpoint.clone(),
            api_key,
        })
    }

    /// Resolve a city name to coordinates, or `None` if it cannot be done
    pub async fn resolve(&self, city: &str) -> Option<GeoPoint> {
        if city.trim().is_empty() {
            warn!(target: "geocode", "Refusing to geocode an empty city name");
            return None;
        }
        debug!(target: "geocode", city = %city, "Resolving city");

        let response = match self
            .http_client
            .get(&self.endpoint)
            .query(&[("q", city), ("limit", "1"), ("appid", self.api_key.as_str())])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(target: "geocode", city = %city, error = %e, "Geocoding request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(target: "geocode", city = %city, status = %response.status(), "Geocoding API returned error");
            return None;
        }

        let entries: Vec<GeoEntry> = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                warn!(target: "geocode", city = %city, error = %e, "Failed to parse geocoding response");
                return None;
            }
        };

        let entry = match entries.into_iter().next() {
            Some(e) => e,
            None => {
                warn!(target: "geocode", city = %city, "No coordinates found");
                return None;
            }
        };

        let label = match &entry.country {
            Some(country) => format!("{}, {}", entry.name, country),
            None => entry.name.clone(),
        };
        debug!(target: "geocode", city = %city, lat = entry.lat, lon = entry.lon, "Resolved");
        Some(GeoPoint {
            latitude: entry.lat,
            longitude: entry.lon,
            label,
        })
    }
}
