// Ambient Core Library
// Environment-data agent services: fetch, cache, analyze, serve

pub mod agents;
pub mod analyzer;
pub mod api;
pub mod bus;
pub mod cache;
pub mod config;
pub mod geocode;
pub mod intent;
pub mod llm;
pub mod message;
pub mod sensor;
pub mod weather;

mod rng;

// Export core types
pub use analyzer::{AnalysisKind, Analyzer, ANALYSIS_UNAVAILABLE};
pub use bus::{BusStats, SensorBus, SensorEvent};
pub use cache::TtlCache;
pub use config::AmbientConfig;
pub use geocode::{GeoPoint, Geocoder};
pub use intent::{IntentKind, IntentRouter, IntentRule};
pub use llm::{OllamaClient, TextGenerator};
pub use message::{AgentMessage, Role};
pub use sensor::{Dht11Simulator, SensorReading, SensorStore};
pub use weather::{DataSource, WeatherBundle, WeatherFetcher};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AmbientError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("geocoding error: {0}")]
    Geocode(String),

    #[error("weather upstream error: {0}")]
    Weather(String),

    #[error("llm upstream error: {0}")]
    Llm(String),

    #[error("location not found: {0}")]
    CityNotFound(String),

    #[error("no data available: {0}")]
    NoData(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AmbientError>;

impl AmbientError {
    /// True for failures a request handler renders as an explanatory
    /// 200-class payload instead of an HTTP error: bad or missing input and
    /// definite no-data outcomes. Upstream transport failures are degraded
    /// separately by the component that owns the upstream.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            AmbientError::InvalidInput(_)
                | AmbientError::CityNotFound(_)
                | AmbientError::NoData(_)
        )
    }
}
