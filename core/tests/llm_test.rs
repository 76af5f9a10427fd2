/// Ollama client wire-protocol tests against a stubbed backend
use ambient_core::config::LlmConfig;
use ambient_core::llm::{OllamaClient, TextGenerator};
use ambient_core::AmbientError;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> LlmConfig {
    LlmConfig {
        base_url: server.uri(),
        model: "test-model".to_string(),
        request_timeout_ms: 2_000,
        probe_timeout_ms: 500,
        cache_ttl_secs: 300,
    }
}

#[tokio::test]
async fn generate_sends_model_and_prompt_without_streaming() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "prompt": "hello there",
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "general kenobi"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::new(test_config(&server)).unwrap();
    let text = client.generate("hello there").await.unwrap();
    assert_eq!(text, "general kenobi");
}

#[tokio::test]
async fn non_success_status_is_a_typed_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = OllamaClient::new(test_config(&server)).unwrap();
    let err = client.generate("hello").await.unwrap_err();
    assert!(matches!(err, AmbientError::Llm(_)));
}

#[tokio::test]
async fn empty_response_body_is_a_typed_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "" })))
        .mount(&server)
        .await;

    let client = OllamaClient::new(test_config(&server)).unwrap();
    let err = client.generate("hello").await.unwrap_err();
    assert!(matches!(err, AmbientError::Llm(_)));
}

#[tokio::test]
async fn reachability_probe_checks_the_tag_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
        .mount(&server)
        .await;

    let client = OllamaClient::new(test_config(&server)).unwrap();
    assert!(client.is_reachable().await);
}

#[tokio::test]
async fn unreachable_backend_probes_false() {
    // Nothing is listening on this address
    let config = LlmConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        model: "test-model".to_string(),
        request_timeout_ms: 500,
        probe_timeout_ms: 300,
        cache_ttl_secs: 300,
    };
    let client = OllamaClient::new(config).unwrap();
    assert!(!client.is_reachable().await);
}
