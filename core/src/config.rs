// Environment-driven configuration
//
// Every upstream carries its own timeout so a slow collaborator cannot stall
// unrelated requests. Validation happens once, in the binary, before anything
// binds a socket: a missing weather key without the explicit simulated opt-in
// refuses to start.

use crate::{AmbientError, Result};

/// Bind address for the HTTP gateway
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("AMBIENT_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("AMBIENT_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8000),
        }
    }
}

/// Weather upstream configuration (OpenWeatherMap endpoints)
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// API key; `None` is only valid together with `simulated`
    pub api_key: Option<String>,
    /// Serve synthetic readings instead of calling the live API
    pub simulated: bool,
    pub geocoding_endpoint: String,
    pub current_endpoint: String,
    pub forecast_endpoint: String,
    pub timemachine_endpoint: String,
    /// Timeout for weather data requests in milliseconds
    pub timeout_ms: u64,
    /// Timeout for geocoding requests in milliseconds
    pub geocode_timeout_ms: u64,
    /// TTL for cached weather bundles in seconds
    pub cache_ttl_secs: u64,
    /// Bound on retained cache entries
    pub cache_capacity: usize,
    pub user_agent: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("OPENWEATHER_API_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            simulated: env_flag("WEATHER_SIMULATED"),
            geocoding_endpoint: "http://api.openweathermap.org/geo/1.0/direct".to_string(),
            current_endpoint: "http://api.openweathermap.org/data/2.5/weather".to_string(),
            forecast_endpoint: "http://api.openweathermap.org/data/2.5/forecast".to_string(),
            timemachine_endpoint: "https://api.openweathermap.org/data/3.0/onecall/timemachine"
                .to_string(),
            timeout_ms: 10_000,
            geocode_timeout_ms: 5_000,
            cache_ttl_secs: std::env::var("WEATHER_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(300),
            cache_capacity: 256,
            user_agent: "ambient-agent/0.1".to_string(),
        }
    }
}

/// Generative text backend configuration (Ollama-style generate endpoint)
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Timeout for generate requests in milliseconds
    pub request_timeout_ms: u64,
    /// Timeout for the reachability probe in milliseconds
    pub probe_timeout_ms: u64,
    /// TTL for cached analyses in seconds
    pub cache_ttl_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("OLLAMA_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            model: std::env::var("OLLAMA_MODEL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "gemma2:2b".to_string()),
            request_timeout_ms: std::env::var("LLM_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30_000),
            probe_timeout_ms: 5_000,
            cache_ttl_secs: 300,
        }
    }
}

/// Simulated DHT11 sensor producer configuration
#[derive(Debug, Clone)]
pub struct SensorConfig {
    pub sensor_id: String,
    /// Seconds between simulated readings
    pub interval_secs: u64,
    /// Bound on retained history
    pub history_cap: usize,
    pub temperature_topic: String,
    pub humidity_topic: String,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sensor_id: std::env::var("SENSOR_ID").unwrap_or_else(|_| "DHT11_001".to_string()),
            interval_secs: std::env::var("SENSOR_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
            history_cap: std::env::var("SENSOR_HISTORY_CAP")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(100),
            temperature_topic: "sensor/temperature".to_string(),
            humidity_topic: "sensor/humidity".to_string(),
        }
    }
}

/// Top-level configuration assembled from the environment
#[derive(Debug, Clone, Default)]
pub struct AmbientConfig {
    pub server: ServerConfig,
    pub weather: WeatherConfig,
    pub llm: LlmConfig,
    pub sensor: SensorConfig,
}

impl AmbientConfig {
    /// Load from the environment and validate. A weather key is required
    /// unless `WEATHER_SIMULATED=1` explicitly opts into synthetic data; the
    /// LLM backend is an optional integration and never blocks startup.
    pub fn from_env() -> Result<Self> {
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.weather.api_key.is_none() && !self.weather.simulated {
            return Err(AmbientError::Config(
                "OPENWEATHER_API_KEY is not set; set it or opt into synthetic data with WEATHER_SIMULATED=1"
                    .to_string(),
            ));
        }
        if self.sensor.history_cap == 0 {
            return Err(AmbientError::Config(
                "SENSOR_HISTORY_CAP must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_flag(name: &str) -> bool {
    matches!(
        std::env::var(name).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}
