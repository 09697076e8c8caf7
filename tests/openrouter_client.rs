//! OpenRouterClient against a mock chat-completions endpoint

use std::time::Duration;

use project_autoselect::config::LlmConfig;
use project_autoselect::error::{AutoselectError, ErrorKind, UpstreamError};
use project_autoselect::llm::{ChatRequest, CompletionBackend, OpenRouterClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/api/v1/chat/completions";

fn client_for(server: &MockServer, timeout_secs: u64) -> OpenRouterClient {
    OpenRouterClient::new(&LlmConfig {
        api_url: format!("{}{}", server.uri(), ENDPOINT),
        model: "test/model".to_string(),
        api_key: Some("sk-test".to_string()),
        timeout_secs,
        ..LlmConfig::default()
    })
    .unwrap()
}

fn request() -> ChatRequest {
    ChatRequest::selection("test/model", 800, "pick files".to_string())
}

fn completion(content: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "gen-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    }))
}

#[tokio::test]
async fn test_successful_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "test/model",
            "temperature": 0.0,
            "max_tokens": 800,
            "structured_outputs": true,
            "response_format": { "type": "json_schema" }
        })))
        .respond_with(completion(json!("{\"selected\":[\"a.py\"],\"confidence\":0.9}")))
        .expect(1)
        .mount(&server)
        .await;

    let content = client_for(&server, 5).complete(&request()).await.unwrap();
    assert_eq!(content, json!("{\"selected\":[\"a.py\"],\"confidence\":0.9}"));
}

#[tokio::test]
async fn test_object_content_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion(json!({ "selected": ["b.py"] })))
        .mount(&server)
        .await;

    let content = client_for(&server, 5).complete(&request()).await.unwrap();
    assert_eq!(content["selected"][0], "b.py");
}

#[tokio::test]
async fn test_rejected_key_is_configuration_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;

    let err = client_for(&server, 5).complete(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_unprocessable_request_is_invalid_input() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_string("schema not supported"))
        .mount(&server)
        .await;

    let err = client_for(&server, 5).complete(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(err.to_string().contains("schema not supported"));
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = client_for(&server, 5).complete(&request()).await.unwrap_err();
    assert!(matches!(
        err,
        AutoselectError::Upstream(UpstreamError::Server { status: 503, .. })
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_missing_content_is_unexpected_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = client_for(&server, 5).complete(&request()).await.unwrap_err();
    assert!(matches!(
        err,
        AutoselectError::Upstream(UpstreamError::UnexpectedPayload(_))
    ));
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion(json!("{}")).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let err = client_for(&server, 1).complete(&request()).await.unwrap_err();
    assert!(matches!(
        err,
        AutoselectError::Upstream(UpstreamError::Timeout(1))
    ));
}
