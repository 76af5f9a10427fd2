// HTTP API server
//
// REST endpoints plus SSE streaming over the sensor bus. Upstream outages
// never surface as 5xx: handlers degrade to a 200-class payload with an
// embedded error field. Only a malformed request body is rejected outright,
// by the extractor.

use crate::agents::{Gateway, HomeAgent, HomeState, IotAgent, WeatherAgent};
use crate::analyzer::Analyzer;
use crate::bus::SensorBus;
use crate::config::{AmbientConfig, SensorConfig};
use crate::llm::OllamaClient;
use crate::message::AgentMessage;
use crate::sensor::{record_one, Dht11Simulator, SensorStore};
use crate::weather::WeatherFetcher;
use crate::{Result, TextGenerator};
use axum::{
    extract::{Path, Query, State},
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

const SERVICE_NAME: &str = "Ambient Gateway";

/// Shared server state: explicitly constructed service objects, no globals
#[derive(Clone)]
pub struct AppState {
    pub weather_agent: Arc<WeatherAgent>,
    pub iot_agent: Arc<IotAgent>,
    pub home_agent: Arc<HomeAgent>,
    pub gateway: Arc<Gateway>,
    pub fetcher: Arc<WeatherFetcher>,
    pub store: Arc<SensorStore>,
    pub bus: Arc<SensorBus>,
    pub simulator: Arc<Mutex<Dht11Simulator>>,
    pub llm: Arc<OllamaClient>,
    pub sensor_config: SensorConfig,
}

impl AppState {
    pub fn from_config(config: &AmbientConfig) -> Result<Self> {
        let llm = Arc::new(OllamaClient::new(config.llm.clone())?);
        let generator: Arc<dyn TextGenerator> = llm.clone();
        let analyzer = Arc::new(Analyzer::new(
            generator,
            Duration::from_secs(config.llm.cache_ttl_secs),
        ));
        let fetcher = Arc::new(WeatherFetcher::new(&config.weather)?);
        let store = Arc::new(SensorStore::new(config.sensor.history_cap));
        let bus = Arc::new(SensorBus::new(64));
        let simulator = Arc::new(Mutex::new(Dht11Simulator::new(
            config.sensor.sensor_id.clone(),
        )));

        let weather_agent = Arc::new(WeatherAgent::new(fetcher.clone(), analyzer.clone()));
        let iot_agent = Arc::new(IotAgent::new(store.clone(), analyzer.clone()));
        let home_agent = Arc::new(HomeAgent::new("home", HomeState::default()));
        let gateway = Arc::new(Gateway::new(
            weather_agent.clone(),
            iot_agent.clone(),
            analyzer,
        ));

        Ok(Self {
            weather_agent,
            iot_agent,
            home_agent,
            gateway,
            fetcher,
            store,
            bus,
            simulator,
            llm,
            sensor_config: config.sensor.clone(),
        })
    }
}

/// Build the router with all endpoints and the CORS layer
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/analyze", post(analyze_handler))
        .route("/weather/:city", get(weather_handler))
        .route("/weather/:city/historical", get(historical_handler))
        .route("/query", post(query_handler))
        .route("/iot/data", get(iot_data_handler))
        .route("/iot/history", get(iot_history_handler))
        .route("/iot/analyze", post(iot_analyze_handler))
        .route("/iot/reading", post(iot_reading_handler))
        .route("/chat", get(chat_handler))
        .route("/home/message", post(home_message_handler))
        .route("/sse", get(sse_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind the address and serve the router until the process exits
pub async fn serve(addr: &str, router: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(target: "api", addr = %addr, "HTTP server ready");
    axum::serve(listener, router).await?;
    Ok(())
}

/// 200-class explanatory payload for degraded outcomes
fn degraded(message: impl Into<String>) -> Json<serde_json::Value> {
    Json(json!({
        "success": false,
        "error": message.into(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "sensor_status": state.store.status().await,
    }))
}

async fn status_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let llm_connected = state.llm.is_reachable().await;
    let temperature_topic = &state.sensor_config.temperature_topic;
    let humidity_topic = &state.sensor_config.humidity_topic;
    Json(json!({
        "service": SERVICE_NAME,
        "status": "running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "llm": {
            "connected": llm_connected,
            "model": state.llm.model(),
        },
        "weather": {
            "mode": if state.fetcher.is_simulated() { "simulated" } else { "live" },
        },
        "sensor": {
            "status": state.store.status().await,
            "total_readings": state.store.len().await,
            "last_update": state.store.last_update().await,
            "topics": {
                "temperature": temperature_topic,
                "humidity": humidity_topic,
            },
        },
        "bus": {
            "temperature": state.bus.stats(temperature_topic),
            "humidity": state.bus.stats(humidity_topic),
        },
        "capabilities": [
            "Weather data collection",
            "Sensor data collection",
            "Forecast analysis",
            "Combined environment analysis",
            "Smart home queries",
            "Event streaming",
        ],
    }))
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    days: Option<u32>,
}

async fn analyze_handler(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Response {
    let city = match request
        .city
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        Some(c) => c.to_string(),
        None => return degraded("city is required for weather analysis").into_response(),
    };
    match state
        .weather_agent
        .analyze(&city, request.query.as_deref(), request.days.unwrap_or(1))
        .await
    {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            if !e.is_degradable() {
                warn!(target: "api", error = %e, "Weather analysis degraded");
            }
            degraded(e.to_string()).into_response()
        }
    }
}

async fn weather_handler(State(state): State<AppState>, Path(city): Path<String>) -> Response {
    match state.weather_agent.raw(&city).await {
        Ok(bundle) => Json(json!({
            "success": true,
            "city": bundle.city,
            "data": bundle,
        }))
        .into_response(),
        Err(e) => {
            if !e.is_degradable() {
                warn!(target: "api", error = %e, "Weather fetch degraded");
            }
            degraded(e.to_string()).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct HistoricalQuery {
    #[serde(default)]
    dt: Option<i64>,
}

async fn historical_handler(
    State(state): State<AppState>,
    Path(city): Path<String>,
    Query(query): Query<HistoricalQuery>,
) -> Response {
    let dt = match query.dt {
        Some(dt) => dt,
        None => return degraded("dt query parameter is required").into_response(),
    };
    match state.fetcher.historical(&city, dt).await {
        Ok(reading) => Json(json!({
            "success": true,
            "city": reading.city,
            "data": reading,
        }))
        .into_response(),
        Err(e) => {
            if !e.is_degradable() {
                warn!(target: "api", error = %e, "Historical fetch degraded");
            }
            degraded(e.to_string()).into_response()
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct MultiAgentRequest {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default = "default_true")]
    include_iot: bool,
    #[serde(default = "default_true")]
    include_weather: bool,
}

async fn query_handler(
    State(state): State<AppState>,
    Json(request): Json<MultiAgentRequest>,
) -> Response {
    let query = match request
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
    {
        Some(q) => q.to_string(),
        None => return degraded("query text is required").into_response(),
    };
    let city = request.city.unwrap_or_default();
    if request.include_weather && city.trim().is_empty() {
        return degraded("city is required when the weather branch is enabled").into_response();
    }
    let result = state
        .gateway
        .query(&query, &city, request.include_iot, request.include_weather)
        .await;
    Json(result).into_response()
}

async fn iot_data_handler(State(state): State<AppState>) -> Response {
    match state.store.current().await {
        Some(reading) => Json(json!({
            "success": true,
            "data": reading,
            "sensor_status": state.store.status().await,
        }))
        .into_response(),
        None => degraded("no sensor data available yet").into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    limit: Option<usize>,
}

async fn iot_history_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<serde_json::Value> {
    let limit = query.limit.unwrap_or(50);
    let readings = state.store.recent(limit).await;
    Json(json!({
        "success": true,
        "total_readings": state.store.len().await,
        "returned_readings": readings.len(),
        "data": readings,
    }))
}

#[derive(Debug, Deserialize)]
struct IotAnalyzeRequest {
    #[serde(default)]
    query: Option<String>,
}

async fn iot_analyze_handler(
    State(state): State<AppState>,
    Json(request): Json<IotAnalyzeRequest>,
) -> Response {
    let query = request
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or("Assess indoor comfort from the recent sensor readings")
        .to_string();
    match state.iot_agent.analyze(&query).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            if !e.is_degradable() {
                warn!(target: "api", error = %e, "Sensor analysis degraded");
            }
            degraded(e.to_string()).into_response()
        }
    }
}

async fn iot_reading_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let reading = record_one(
        &state.simulator,
        &state.store,
        &state.bus,
        &state.sensor_config,
    )
    .await;
    Json(json!({
        "success": true,
        "reading": reading,
    }))
}

#[derive(Debug, Deserialize)]
struct ChatQuery {
    #[serde(default)]
    prompt: Option<String>,
}

async fn chat_handler(State(state): State<AppState>, Query(query): Query<ChatQuery>) -> Response {
    let prompt = query
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or("tell me a short story")
        .to_string();
    match state.llm.generate(&prompt).await {
        Ok(response) => Json(json!({
            "model": state.llm.model(),
            "prompt": prompt,
            "response": response,
        }))
        .into_response(),
        Err(e) => {
            warn!(target: "api", error = %e, "Chat generation degraded");
            degraded(e.to_string()).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct HomeMessageRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    sender: Option<String>,
}

async fn home_message_handler(
    State(state): State<AppState>,
    Json(request): Json<HomeMessageRequest>,
) -> Response {
    let text = match request
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        Some(t) => t.to_string(),
        None => return degraded("message text is required").into_response(),
    };
    let sender = request.sender.unwrap_or_else(|| "http-client".to_string());
    let message = AgentMessage::user(text, sender, state.home_agent.name());
    let reply = state.home_agent.handle(&message).await;
    Json(reply).into_response()
}

/// SSE stream of sensor bus events. Dropping the connection drops the
/// subscription's receiver; the bus prunes it on the next publish, so a
/// disconnected client sees at most one in-flight frame.
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = std::result::Result<Event, Infallible>>> {
    info!(target: "api", "New SSE client connected");
    let topics = [
        state.sensor_config.temperature_topic.clone(),
        state.sensor_config.humidity_topic.clone(),
    ];
    let topic_refs: Vec<&str> = topics.iter().map(String::as_str).collect();
    let (_id, rx) = state.bus.subscribe(&topic_refs);

    let stream = ReceiverStream::new(rx).filter_map(|event| match serde_json::to_string(&event) {
        Ok(json) => Some(Ok(Event::default().data(json))),
        Err(e) => {
            warn!(target: "api", error = %e, "Failed to serialize sensor event");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
