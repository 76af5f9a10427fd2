/// Analyzer degradation and memoization against generator stubs
use ambient_core::analyzer::{AnalysisKind, Analyzer, ANALYSIS_UNAVAILABLE};
use ambient_core::llm::TextGenerator;
use ambient_core::{AmbientError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Fails on every call
struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(AmbientError::Llm("backend is down".to_string()))
    }
}

/// Counts calls and echoes a fixed answer
struct CountingGenerator {
    calls: AtomicUsize,
}

impl CountingGenerator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for CountingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("the conditions look comfortable".to_string())
    }
}

#[tokio::test]
async fn backend_failure_degrades_to_fixed_string() {
    let analyzer = Analyzer::new(Arc::new(FailingGenerator), Duration::from_secs(60));
    let result = analyzer
        .analyze(AnalysisKind::Weather, "how warm?", &json!({"temperature": 30}))
        .await;
    assert_eq!(result, ANALYSIS_UNAVAILABLE);
}

#[tokio::test]
async fn identical_inputs_reuse_the_cached_analysis() {
    let generator = CountingGenerator::new();
    let analyzer = Analyzer::new(generator.clone(), Duration::from_secs(60));
    let payload = json!({"temperature": 30, "humidity": 60});

    let first = analyzer
        .analyze(AnalysisKind::Sensor, "comfortable?", &payload)
        .await;
    let second = analyzer
        .analyze(AnalysisKind::Sensor, "comfortable?", &payload)
        .await;

    assert_eq!(first, second);
    assert_eq!(generator.calls(), 1, "second call must be a cache hit");
}

#[tokio::test]
async fn different_inputs_trigger_new_generations() {
    let generator = CountingGenerator::new();
    let analyzer = Analyzer::new(generator.clone(), Duration::from_secs(60));
    let payload = json!({"temperature": 30});

    analyzer
        .analyze(AnalysisKind::Sensor, "comfortable?", &payload)
        .await;
    analyzer
        .analyze(AnalysisKind::Sensor, "too hot?", &payload)
        .await;
    analyzer
        .analyze(AnalysisKind::Weather, "comfortable?", &payload)
        .await;

    assert_eq!(generator.calls(), 3);
}

#[tokio::test]
async fn failures_are_not_cached() {
    struct FlakyGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for FlakyGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AmbientError::Llm("first call fails".to_string()))
            } else {
                Ok("recovered".to_string())
            }
        }
    }

    let generator = Arc::new(FlakyGenerator {
        calls: AtomicUsize::new(0),
    });
    let analyzer = Analyzer::new(generator, Duration::from_secs(60));
    let payload = json!({"humidity": 70});

    let first = analyzer
        .analyze(AnalysisKind::Sensor, "humid?", &payload)
        .await;
    let second = analyzer
        .analyze(AnalysisKind::Sensor, "humid?", &payload)
        .await;

    assert_eq!(first, ANALYSIS_UNAVAILABLE);
    assert_eq!(second, "recovered");
}
