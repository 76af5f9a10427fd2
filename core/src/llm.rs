// Generative text backend client
//
// Speaks the Ollama generate protocol: POST {base}/api/generate with
// {model, prompt, stream: false}, answer in the `response` field. The trait
// seam lets the analyzer run against any backend, including test stubs.

use crate::config::LlmConfig;
use crate::{AmbientError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// Seam for anything that turns a prompt into text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

pub struct OllamaClient {
    http_client: reqwest::Client,
    config: LlmConfig,
}

impl OllamaClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| AmbientError::Llm(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Probe the backend's tag listing with a short timeout; used by /status
    pub async fn is_reachable(&self) -> bool {
        let url = format!("{}/api/tags", self.config.base_url.trim_end_matches('/'));
        match self
            .http_client
            .get(&url)
            .timeout(Duration::from_millis(self.config.probe_timeout_ms))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(target: "llm", error = %e, "Reachability probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.config.base_url.trim_end_matches('/'));
        debug!(target: "llm", model = %self.config.model, "POST {}", url);

        let body = json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
        });

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AmbientError::Llm(format!("generate request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(target: "llm", %status, body = %text, "Generate endpoint returned error");
            return Err(AmbientError::Llm(format!(
                "generate endpoint returned status {status}"
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AmbientError::Llm(format!("failed to parse generate response: {e}")))?;

        body.response
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AmbientError::Llm("generate response contained no text".to_string()))
    }
}
