// Gateway: combined IoT + weather query
//
// Both branches run concurrently; a failed branch contributes nothing and
// never blocks the other. The combined analysis only ever sees the data that
// actually arrived.

use crate::agents::{IotAgent, IotAnalysis, WeatherAgent, WeatherAnalysis};
use crate::analyzer::{AnalysisKind, Analyzer};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedResponse {
    pub success: bool,
    pub query: String,
    pub city: String,
    pub iot_data: Option<IotAnalysis>,
    pub weather_data: Option<WeatherAnalysis>,
    pub combined_analysis: String,
    pub timestamp: String,
}

pub struct Gateway {
    weather: Arc<WeatherAgent>,
    iot: Arc<IotAgent>,
    analyzer: Arc<Analyzer>,
}

impl Gateway {
    pub fn new(weather: Arc<WeatherAgent>, iot: Arc<IotAgent>, analyzer: Arc<Analyzer>) -> Self {
        Self {
            weather,
            iot,
            analyzer,
        }
    }

    pub async fn query(
        &self,
        query: &str,
        city: &str,
        include_iot: bool,
        include_weather: bool,
    ) -> CombinedResponse {
        let iot_branch = async {
            if !include_iot {
                return None;
            }
            match self.iot.analyze(query).await {
                Ok(result) => Some(result),
                Err(e) => {
                    warn!(target: "gateway", error = %e, "IoT branch failed");
                    None
                }
            }
        };
        let weather_branch = async {
            if !include_weather {
                return None;
            }
            match self.weather.analyze(city, Some(query), 1).await {
                Ok(result) => Some(result),
                Err(e) => {
                    warn!(target: "gateway", error = %e, "Weather branch failed");
                    None
                }
            }
        };

        let (iot_data, weather_data) = tokio::join!(iot_branch, weather_branch);

        let combined_analysis = if iot_data.is_none() && weather_data.is_none() {
            "No analysis available".to_string()
        } else {
            let mut payload = json!({ "city": city });
            if let Some(iot) = &iot_data {
                payload["iot_summary"] = json!(iot.summary);
                payload["iot_analysis"] = json!(iot.analysis);
            }
            if let Some(weather) = &weather_data {
                payload["weather_data"] = json!(weather.weather_data);
                payload["weather_analysis"] = json!(weather.analysis);
            }
            self.analyzer
                .analyze(AnalysisKind::Combined, query, &payload)
                .await
        };

        CombinedResponse {
            success: true,
            query: query.to_string(),
            city: city.to_string(),
            iot_data,
            weather_data,
            combined_analysis,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
