// Weather agent: fetch -> cache -> analyze

use crate::analyzer::{AnalysisKind, Analyzer};
use crate::weather::{WeatherBundle, WeatherFetcher};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherAnalysis {
    pub success: bool,
    pub city: String,
    pub weather_data: WeatherBundle,
    pub analysis: String,
    pub timestamp: String,
}

pub struct WeatherAgent {
    fetcher: Arc<WeatherFetcher>,
    analyzer: Arc<Analyzer>,
}

impl WeatherAgent {
    pub fn new(fetcher: Arc<WeatherFetcher>, analyzer: Arc<Analyzer>) -> Self {
        Self { fetcher, analyzer }
    }

    /// Fetch weather for `city` and analyze it against `query`. Input and
    /// no-data failures propagate; an unavailable analysis backend degrades
    /// inside the analyzer and never fails the request.
    pub async fn analyze(
        &self,
        city: &str,
        query: Option<&str>,
        days: u32,
    ) -> Result<WeatherAnalysis> {
        let bundle = self.fetcher.fetch(city, days).await?;
        let default_query = format!("Provide a comprehensive weather analysis for {city}");
        let query = match query {
            Some(q) if !q.trim().is_empty() => q,
            _ => &default_query,
        };
        let payload = serde_json::to_value(&bundle)?;
        let analysis = self
            .analyzer
            .analyze(AnalysisKind::Weather, query, &payload)
            .await;
        Ok(WeatherAnalysis {
            success: true,
            city: bundle.city.clone(),
            weather_data: bundle,
            analysis,
            timestamp: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Raw bundle without the analysis step
    pub async fn raw(&self, city: &str) -> Result<WeatherBundle> {
        self.fetcher.fetch(city, 1).await
    }
}
