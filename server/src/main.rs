use ambient_core::api::{self, AppState};
use ambient_core::sensor::spawn_producer;
use ambient_core::AmbientConfig;
use tracing_subscriber::fmt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    fmt().compact().init();

    // Fail fast on hard misconfiguration before anything binds a socket
    let config = AmbientConfig::from_env()?;
    if config.weather.simulated {
        tracing::warn!("Weather is in simulated mode; all bundles will be synthetic");
    }

    let state = AppState::from_config(&config)?;

    // Background sensor producer: read, record, publish on a fixed interval
    let producer = spawn_producer(
        state.simulator.clone(),
        state.store.clone(),
        state.bus.clone(),
        config.sensor.clone(),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = api::router(state);
    let result = api::serve(&addr, app).await;

    producer.abort();
    result.map_err(|e| e.into())
}
