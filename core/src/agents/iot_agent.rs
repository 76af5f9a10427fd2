// IoT agent: sensor history -> summary -> analyze

use crate::analyzer::{AnalysisKind, Analyzer};
use crate::sensor::{summarize, SensorReading, SensorStore, SensorSummary};
use crate::{AmbientError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How many readings feed one analysis
const ANALYSIS_WINDOW: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IotAnalysis {
    pub success: bool,
    pub summary: SensorSummary,
    pub readings: Vec<SensorReading>,
    pub analysis: String,
    pub timestamp: String,
}

pub struct IotAgent {
    store: Arc<SensorStore>,
    analyzer: Arc<Analyzer>,
}

impl IotAgent {
    pub fn new(store: Arc<SensorStore>, analyzer: Arc<Analyzer>) -> Self {
        Self { store, analyzer }
    }

    /// Analyze the most recent sensor window against `query`.
    /// An empty store is a typed no-data outcome for the caller to render.
    pub async fn analyze(&self, query: &str) -> Result<IotAnalysis> {
        let readings = self.store.recent(ANALYSIS_WINDOW).await;
        let summary = summarize(&readings).ok_or_else(|| {
            AmbientError::NoData("no sensor readings available for analysis".to_string())
        })?;
        let payload = serde_json::to_value(&summary)?;
        let analysis = self
            .analyzer
            .analyze(AnalysisKind::Sensor, query, &payload)
            .await;
        Ok(IotAnalysis {
            success: true,
            summary,
            readings,
            analysis,
            timestamp: chrono::Utc::now().to_rfc3339(),
        })
    }
}
