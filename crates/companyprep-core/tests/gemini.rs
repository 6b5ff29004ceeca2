//! HTTP-level tests for the Gemini client against a mock server.

use companyprep_core::llm::{ChatModel, ChatRequest, Content, GeminiChat};
use companyprep_core::{CompanyPrepError, require_env};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_key() -> companyprep_core::SecretValue {
    unsafe { std::env::set_var("COMPANYPREP_GEMINI_TEST_KEY", "test-key-123") };
    require_env("COMPANYPREP_GEMINI_TEST_KEY").unwrap()
}

fn request() -> ChatRequest {
    ChatRequest {
        system: "You are a test agent.".to_string(),
        contents: vec![Content::user_text("Company: Acme Corp")],
        tools: Vec::new(),
    }
}

#[tokio::test]
async fn generate_parses_text_and_function_calls() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/test-model:generateContent"))
        .and(header("x-goog-api-key", "test-key-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Checking sources." },
                        { "functionCall": { "name": "web_search", "args": { "query": "Acme" } } }
                    ]
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let model = GeminiChat::new("test-model", test_key(), 5_000)
        .unwrap()
        .with_base_url(server.uri());

    let reply = model.generate(request()).await.unwrap();
    assert_eq!(reply.text, "Checking sources.");
    assert_eq!(reply.calls.len(), 1);
    assert_eq!(reply.calls[0].name, "web_search");
}

#[tokio::test]
async fn generate_surfaces_api_errors_with_their_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/test-model:generateContent"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid" }
        })))
        .mount(&server)
        .await;

    let model = GeminiChat::new("test-model", test_key(), 5_000)
        .unwrap()
        .with_base_url(server.uri());

    let err = model.generate(request()).await.unwrap_err();
    match err {
        CompanyPrepError::Model(message) => assert!(message.contains("API key not valid")),
        other => panic!("expected Model error, got {other:?}"),
    }
}

#[tokio::test]
async fn generate_rejects_bodies_without_candidates() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/test-model:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let model = GeminiChat::new("test-model", test_key(), 5_000)
        .unwrap()
        .with_base_url(server.uri());

    assert!(matches!(
        model.generate(request()).await,
        Err(CompanyPrepError::Model(_))
    ));
}
