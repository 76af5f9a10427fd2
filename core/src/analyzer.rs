// LLM-backed analysis of fetched data
//
// Prompt construction is deterministic for a given (kind, query, payload), so
// identical requests hash to the same cache key and reuse a previous answer.
// A backend failure degrades to a fixed string; the analyzer never errors.

use crate::cache::TtlCache;
use crate::llm::TextGenerator;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Fixed degradation text returned when the backend is unavailable
pub const ANALYSIS_UNAVAILABLE: &str = "analysis unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    Weather,
    Sensor,
    Combined,
}

impl AnalysisKind {
    fn tag(self) -> &'static str {
        match self {
            AnalysisKind::Weather => "weather",
            AnalysisKind::Sensor => "sensor",
            AnalysisKind::Combined => "combined",
        }
    }
}

pub struct Analyzer {
    generator: Arc<dyn TextGenerator>,
    cache: TtlCache<String>,
    cache_ttl: Duration,
}

impl Analyzer {
    pub fn new(generator: Arc<dyn TextGenerator>, cache_ttl: Duration) -> Self {
        Self {
            generator,
            cache: TtlCache::new(256),
            cache_ttl,
        }
    }

    /// Produce a natural-language analysis of `payload` for `query`.
    /// Always returns a string; upstream failures yield the fixed fallback.
    pub async fn analyze(
        &self,
        kind: AnalysisKind,
        query: &str,
        payload: &serde_json::Value,
    ) -> String {
        let payload_json = payload.to_string();
        let key = cache_key(kind, query, &payload_json);

        if let Some(hit) = self.cache.get(&key) {
            debug!(target: "analyzer", kind = kind.tag(), "Returning cached analysis");
            return hit;
        }

        let prompt = build_prompt(kind, query, &payload_json);
        match self.generator.generate(&prompt).await {
            Ok(text) => {
                self.cache.put(key, text.clone(), self.cache_ttl);
                text
            }
            Err(e) => {
                warn!(target: "analyzer", kind = kind.tag(), error = %e, "Analysis backend failed, degrading");
                // Failures are not cached: the next request retries the backend
                ANALYSIS_UNAVAILABLE.to_string()
            }
        }
    }
}

fn cache_key(kind: AnalysisKind, query: &str, payload_json: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    hasher.update(b":");
    hasher.update(payload_json.as_bytes());
    format!("analysis:{}:{:x}", kind.tag(), hasher.finalize())
}

fn build_prompt(kind: AnalysisKind, query: &str, payload_json: &str) -> String {
    match kind {
        AnalysisKind::Weather => format!(
            "You are a meteorologist and weather analysis expert. Analyze the \
             following weather data and answer the user's query.\n\n\
             Weather Data:\n{payload_json}\n\n\
             User Query: {query}\n\n\
             Cover the current conditions, notable trends, activity \
             recommendations and any health or safety considerations. Keep \
             the response informative and practical."
        ),
        AnalysisKind::Sensor => format!(
            "You are an IoT data analysis expert. Analyze the following \
             indoor sensor data and answer the user's query.\n\n\
             Sensor Data:\n{payload_json}\n\n\
             User Query: {query}\n\n\
             Assess the comfort level, point out anomalies or patterns, and \
             recommend climate control adjustments. Keep the response \
             informative but concise."
        ),
        AnalysisKind::Combined => format!(
            "You are an expert analyst correlating indoor sensor data with \
             outdoor weather conditions. Analyze the following combined data \
             and answer the user's query using only the data sources that are \
             present.\n\n\
             Combined Data:\n{payload_json}\n\n\
             User Query: {query}\n\n\
             Describe the correlation between the available data sources and \
             give actionable recommendations. Keep the response comprehensive \
             but concise."
        ),
    }
}
