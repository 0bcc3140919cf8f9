//! Endpoint clients against a mock HTTP server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use blueprint_core::endpoint::{
    AnthropicEndpoint, EndpointCall, EndpointError, GenerationEndpoint, HttpEndpoint, PromptKind,
};
use blueprint_core::prompt::GenerateOptions;
use blueprint_core::request::PlanRequest;

fn request() -> PlanRequest {
    PlanRequest {
        business_name: "Acme".to_string(),
        app_purpose: "table booking".to_string(),
        industry: "Restaurant".to_string(),
        target_audience: "diners".to_string(),
        budget: None,
        timeline: Some("3 months".to_string()),
        communication_preference: None,
    }
}

fn call<'a>(
    kind: PromptKind,
    request: &'a PlanRequest,
    options: &'a GenerateOptions,
) -> EndpointCall<'a> {
    EndpointCall {
        kind,
        prompt: "make a plan",
        system: "be helpful",
        request,
        options,
    }
}

fn edge(server: &MockServer, key: Option<&str>) -> HttpEndpoint {
    HttpEndpoint::new(
        format!("{}/functions/v1/generate-app-plan", server.uri()),
        key.map(str::to_string),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn edge_sends_business_data_and_prefers_generated_plan() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/functions/v1/generate-app-plan"))
        .and(header("authorization", "Bearer secret"))
        .and(header("apikey", "secret"))
        .and(body_partial_json(json!({
            "businessData": {"businessName": "Acme", "timeline": "3 months"},
            "options": {"section": "features", "detailLevel": "standard", "prompt": "make a plan"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "rawResponse": "ignored prose",
            "generatedPlan": {"features": [{"name": "Menu", "description": "Browse dishes"}]},
            "model": "edge-model",
            "usage": {"input_tokens": 100, "output_tokens": 40}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let req = request();
    let options = GenerateOptions::default();
    let reply = edge(&server, Some("secret"))
        .generate(&call(PromptKind::Features, &req, &options))
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&reply.text).unwrap();
    assert_eq!(parsed["features"][0]["name"], "Menu");
    assert_eq!(reply.model.as_deref(), Some("edge-model"));
    assert_eq!(reply.usage.unwrap().total(), 140);
}

#[tokio::test]
async fn edge_research_uses_raw_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "generatedPlan": {"features": []},
            "content": "Market Trends\nDelivery keeps growing"
        })))
        .mount(&server)
        .await;

    let req = request();
    let options = GenerateOptions::default();
    let reply = edge(&server, None)
        .generate(&call(PromptKind::Research, &req, &options))
        .await
        .unwrap();
    assert_eq!(reply.text, "Market Trends\nDelivery keeps growing");
    assert!(reply.usage.is_none());
}

#[tokio::test]
async fn edge_failures_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"options": {"section": "features"}})))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"options": {"section": "research"}})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "error": "quota exceeded"})),
        )
        .mount(&server)
        .await;

    let req = request();
    let options = GenerateOptions::default();
    let endpoint = edge(&server, None);

    let err = endpoint
        .generate(&call(PromptKind::Features, &req, &options))
        .await
        .unwrap_err();
    assert!(matches!(err, EndpointError::Status { status: 500, ref body } if body == "boom"));

    let err = endpoint
        .generate(&call(PromptKind::Research, &req, &options))
        .await
        .unwrap_err();
    assert!(matches!(err, EndpointError::Unsuccessful(ref msg) if msg == "quota exceeded"));
}

#[tokio::test]
async fn edge_empty_and_malformed_replies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"options": {"section": "features"}})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "rawResponse": "  "})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"options": {"section": "research"}})))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let req = request();
    let options = GenerateOptions::default();
    let endpoint = edge(&server, None);

    let err = endpoint
        .generate(&call(PromptKind::Features, &req, &options))
        .await
        .unwrap_err();
    assert!(matches!(err, EndpointError::EmptyResponse));

    let err = endpoint
        .generate(&call(PromptKind::Research, &req, &options))
        .await
        .unwrap_err();
    assert!(matches!(err, EndpointError::Parse(_)));
}

#[tokio::test]
async fn edge_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "rawResponse": "late"}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let endpoint = HttpEndpoint::new(server.uri(), None, Duration::from_millis(50)).unwrap();
    let req = request();
    let options = GenerateOptions::default();
    let err = endpoint
        .generate(&call(PromptKind::Features, &req, &options))
        .await
        .unwrap_err();
    assert!(matches!(err, EndpointError::Timeout));
}

#[tokio::test]
async fn anthropic_messages_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "system": "be helpful",
            "messages": [{"role": "user", "content": "make a plan"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "model": "test-model",
            "content": [{"type": "text", "text": "Online Menu\nBrowse dishes and prices"}],
            "usage": {"input_tokens": 12, "output_tokens": 8}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = AnthropicEndpoint::new("test-key", Duration::from_secs(5))
        .unwrap()
        .with_base_url(server.uri())
        .with_model("test-model");
    let req = request();
    let options = GenerateOptions::default();
    let reply = endpoint
        .generate(&call(PromptKind::Features, &req, &options))
        .await
        .unwrap();

    assert_eq!(reply.text, "Online Menu\nBrowse dishes and prices");
    assert_eq!(reply.usage.unwrap().total(), 20);
}

#[tokio::test]
async fn anthropic_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let endpoint = AnthropicEndpoint::new("k", Duration::from_secs(5))
        .unwrap()
        .with_base_url(server.uri());
    let req = request();
    let options = GenerateOptions::default();
    let err = endpoint
        .generate(&call(PromptKind::Research, &req, &options))
        .await
        .unwrap_err();
    assert!(matches!(err, EndpointError::Status { status: 429, .. }));
}
