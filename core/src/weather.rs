// Weather data fetcher
//
// Live mode resolves the city once, then pulls current conditions and a
// forecast from OpenWeatherMap with a 10s timeout of its own. The fallback
// policy is fixed: a geocoder miss is a definite no-data error, while a
// weather-API failure after successful geocoding substitutes a synthetic
// bundle. Every bundle carries a `source` tag so live and simulated data can
// never be confused. Fetched bundles are cached by (city, days) for the
// configured TTL; a second identical request inside the window returns the
// cached bundle byte for byte.

use crate::cache::TtlCache;
use crate::config::WeatherConfig;
use crate::geocode::{GeoPoint, Geocoder};
use crate::rng::XorShift;
use crate::{AmbientError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Where a bundle came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: i64,
    pub pressure: i64,
    pub description: String,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub high: f64,
    pub low: f64,
    pub description: String,
    /// Chance of rain in percent
    pub rain_chance: i64,
}

/// A timestamped, immutable weather snapshot for one city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherBundle {
    pub source: DataSource,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub current: CurrentConditions,
    pub forecast: Vec<DailyForecast>,
    pub captured_at: String,
}

/// One historical data point from the timemachine API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalReading {
    pub city: String,
    pub requested_dt: i64,
    pub actual_dt: i64,
    pub temperature: f64,
    pub humidity: i64,
    pub pressure: i64,
    pub description: String,
    pub wind_speed: f64,
}

// ---- OpenWeatherMap response shapes ----

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    weather: Vec<WeatherDescription>,
    main: MainBlock,
    wind: Option<WindBlock>,
}

#[derive(Debug, Deserialize)]
struct WeatherDescription {
    description: String,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    feels_like: Option<f64>,
    humidity: i64,
    pressure: i64,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastSlot>,
}

#[derive(Debug, Deserialize)]
struct ForecastSlot {
    main: ForecastMain,
    weather: Vec<WeatherDescription>,
    /// Probability of precipitation, 0.0..=1.0
    #[serde(default)]
    pop: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastMain {
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct TimemachineResponse {
    data: Vec<TimemachinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimemachinePoint {
    dt: i64,
    temp: f64,
    humidity: i64,
    pressure: i64,
    wind_speed: Option<f64>,
    #[serde(default)]
    weather: Vec<WeatherDescription>,
}

// Forecast slots come in 3-hour steps
const SLOTS_PER_DAY: usize = 8;

struct LiveClient {
    http_client: reqwest::Client,
    geocoder: Geocoder,
    api_key: String,
    current_endpoint: String,
    forecast_endpoint: String,
    timemachine_endpoint: String,
}

pub struct WeatherFetcher {
    live: Option<LiveClient>,
    cache: TtlCache<WeatherBundle>,
    cache_ttl: Duration,
}

impl WeatherFetcher {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let live = if config.simulated {
            None
        } else {
            let api_key = config.api_key.clone().ok_or_else(|| {
                AmbientError::Config("weather fetcher requires an API key in live mode".to_string())
            })?;
            let http_client = reqwest::Client::builder()
                .timeout(Duration::from_millis(config.timeout_ms))
                .user_agent(&config.user_agent)
                .build()
                .map_err(|e| AmbientError::Weather(format!("failed to build HTTP client: {e}")))?;
            Some(LiveClient {
                http_client,
                geocoder: Geocoder::new(config)?,
                api_key,
                current_endpoint: config.current_endpoint.clone(),
                forecast_endpoint: config.forecast_endpoint.clone(),
                timemachine_endpoint: config.timemachine_endpoint.clone(),
            })
        };
        Ok(Self {
            live,
            cache: TtlCache::new(config.cache_capacity),
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
        })
    }

    pub fn is_simulated(&self) -> bool {
        self.live.is_none()
    }

    /// Fetch current conditions plus a `days`-day forecast for a city
    pub async fn fetch(&self, city: &str, days: u32) -> Result<WeatherBundle> {
        let city = city.trim();
        if city.is_empty() {
            return Err(AmbientError::InvalidInput(
                "city name must not be empty".to_string(),
            ));
        }
        let days = days.clamp(1, 5);
        let key = cache_key(city, days);

        if let Some(hit) = self.cache.get(&key) {
            debug!(target: "weather", city = %city, "Returning cached bundle");
            return Ok(hit);
        }

        let bundle = match &self.live {
            None => simulate_bundle(city, None),
            Some(live) => {
                let point = live.geocoder.resolve(city).await.ok_or_else(|| {
                    AmbientError::CityNotFound(city.to_string())
                })?;
                match live.fetch_bundle(city, &point, days).await {
                    Ok(bundle) => bundle,
                    Err(e) => {
                        warn!(target: "weather", city = %city, error = %e, "Live fetch failed, substituting simulated data");
                        simulate_bundle(city, Some(&point))
                    }
                }
            }
        };

        self.cache.put(key, bundle.clone(), self.cache_ttl);
        Ok(bundle)
    }

    /// Fetch the historical conditions closest to a Unix timestamp.
    /// Not cached, and never simulated: failures propagate as typed errors.
    pub async fn historical(&self, city: &str, dt: i64) -> Result<HistoricalReading> {
        let city = city.trim();
        if city.is_empty() {
            return Err(AmbientError::InvalidInput(
                "city name must not be empty".to_string(),
            ));
        }
        let live = self.live.as_ref().ok_or_else(|| {
            AmbientError::NoData("historical weather is unavailable in simulated mode".to_string())
        })?;
        let point = live
            .geocoder
            .resolve(city)
            .await
            .ok_or_else(|| AmbientError::CityNotFound(city.to_string()))?;
        live.fetch_historical(city, &point, dt).await
    }
}

impl LiveClient {
    async fn fetch_bundle(&self, city: &str, point: &GeoPoint, days: u32) -> Result<WeatherBundle> {
        let current = self.fetch_current(point).await?;
        // A missing forecast degrades to current conditions only
        let forecast = match self.fetch_forecast(point, days).await {
            Ok(f) => f,
            Err(e) => {
                warn!(target: "weather", city = %city, error = %e, "Forecast fetch failed, continuing without it");
                Vec::new()
            }
        };
        Ok(WeatherBundle {
            source: DataSource::Live,
            city: point.label.clone(),
            latitude: Some(point.latitude),
            longitude: Some(point.longitude),
            current,
            forecast,
            captured_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    async fn fetch_current(&self, point: &GeoPoint) -> Result<CurrentConditions> {
        debug!(target: "weather", lat = point.latitude, lon = point.longitude, "Fetching current conditions");
        let response = self
            .http_client
            .get(&self.current_endpoint)
            .query(&[
                ("lat", point.latitude.to_string()),
                ("lon", point.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AmbientError::Weather(format!("current weather request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AmbientError::Weather(format!(
                "current weather API returned status {}",
                response.status()
            )));
        }

        let body: CurrentResponse = response
            .json()
            .await
            .map_err(|e| AmbientError::Weather(format!("failed to parse current weather: {e}")))?;

        Ok(CurrentConditions {
            temperature: body.main.temp,
            feels_like: body.main.feels_like.unwrap_or(body.main.temp),
            humidity: body.main.humidity,
            pressure: body.main.pressure,
            description: body
                .weather
                .first()
                .map(|w| w.description.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            wind_speed: body.wind.map(|w| w.speed).unwrap_or(0.0),
        })
    }

    async fn fetch_forecast(&self, point: &GeoPoint, days: u32) -> Result<Vec<DailyForecast>> {
        let count = days as usize * SLOTS_PER_DAY;
        let response = self
            .http_client
            .get(&self.forecast_endpoint)
            .query(&[
                ("lat", point.latitude.to_string()),
                ("lon", point.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
                ("cnt", count.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AmbientError::Weather(format!("forecast request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AmbientError::Weather(format!(
                "forecast API returned status {}",
                response.status()
            )));
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| AmbientError::Weather(format!("failed to parse forecast: {e}")))?;

        Ok(aggregate_forecast(&body.list))
    }

    async fn fetch_historical(
        &self,
        city: &str,
        point: &GeoPoint,
        dt: i64,
    ) -> Result<HistoricalReading> {
        debug!(target: "weather", city = %city, dt = dt, "Fetching historical conditions");
        let response = self
            .http_client
            .get(&self.timemachine_endpoint)
            .query(&[
                ("lat", point.latitude.to_string()),
                ("lon", point.longitude.to_string()),
                ("dt", dt.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AmbientError::Weather(format!("historical request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AmbientError::Weather(format!(
                "timemachine API returned status {}",
                response.status()
            )));
        }

        let body: TimemachineResponse = response
            .json()
            .await
            .map_err(|e| AmbientError::Weather(format!("failed to parse historical data: {e}")))?;

        let dp = body.data.into_iter().next().ok_or_else(|| {
            AmbientError::NoData(format!("no historical data for {city} at {dt}"))
        })?;

        Ok(HistoricalReading {
            city: point.label.clone(),
            requested_dt: dt,
            actual_dt: dp.dt,
            temperature: dp.temp,
            humidity: dp.humidity,
            pressure: dp.pressure,
            description: dp
                .weather
                .first()
                .map(|w| w.description.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            wind_speed: dp.wind_speed.unwrap_or(0.0),
        })
    }
}

fn cache_key(city: &str, days: u32) -> String {
    format!("weather:{}:{}", city.to_lowercase(), days)
}

/// Collapse 3-hour forecast slots into per-day highs and lows
fn aggregate_forecast(slots: &[ForecastSlot]) -> Vec<DailyForecast> {
    slots
        .chunks(SLOTS_PER_DAY)
        .map(|day| {
            let high = day.iter().map(|s| s.main.temp_max).fold(f64::MIN, f64::max);
            let low = day.iter().map(|s| s.main.temp_min).fold(f64::MAX, f64::min);
            let rain_chance = day
                .iter()
                .map(|s| (s.pop * 100.0).round() as i64)
                .max()
                .unwrap_or(0);
            DailyForecast {
                high,
                low,
                description: day
                    .first()
                    .and_then(|s| s.weather.first())
                    .map(|w| w.description.clone())
                    .unwrap_or_else(|| "unknown".to_string()),
                rain_chance,
            }
        })
        .collect()
}

/// Build a clearly-tagged synthetic bundle for demo mode and live fallback
fn simulate_bundle(city: &str, point: Option<&GeoPoint>) -> WeatherBundle {
    const CONDITIONS: [&str; 5] = [
        "clear sky",
        "partly cloudy",
        "overcast",
        "light rain",
        "thunderstorm",
    ];
    let mut rng = XorShift::from_time();
    let temperature = rng.range(20.0, 35.0);
    WeatherBundle {
        source: DataSource::Simulated,
        city: point.map(|p| p.label.clone()).unwrap_or_else(|| city.to_string()),
        latitude: point.map(|p| p.latitude),
        longitude: point.map(|p| p.longitude),
        current: CurrentConditions {
            temperature: round1(temperature),
            feels_like: round1(temperature + rng.range(-1.0, 3.0)),
            humidity: rng.range(40.0, 80.0) as i64,
            pressure: rng.range(995.0, 1025.0) as i64,
            description: rng.pick(&CONDITIONS).to_string(),
            wind_speed: round1(rng.range(0.0, 20.0)),
        },
        forecast: (0..2)
            .map(|_| DailyForecast {
                high: round1(rng.range(28.0, 38.0)),
                low: round1(rng.range(18.0, 25.0)),
                description: rng.pick(&CONDITIONS).to_string(),
                rain_chance: rng.range(0.0, 80.0) as i64,
            })
            .collect(),
        captured_at: chrono::Utc::now().to_rfc3339(),
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
