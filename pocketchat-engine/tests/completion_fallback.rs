use pocketchat_core::completion::APOLOGY_TEXT;
use pocketchat_engine::completion::CompletionClient;
use pocketchat_engine::traits::CompletionTransport;
use pocketchat_engine::worker::{CompletionEvent, CompletionWorker};
use pocketchat_providers::chat::{ChatEndpointConfig, CompletionRequest, build_chat_request};
use pocketchat_providers::runtime::{HttpClient, HttpResponse};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct WireTransport {
    cfg: ChatEndpointConfig,
    http: HttpClient,
}

#[async_trait::async_trait]
impl CompletionTransport for WireTransport {
    async fn post(&self, request: &CompletionRequest) -> anyhow::Result<HttpResponse> {
        self.http.execute(&build_chat_request(&self.cfg, request)).await
    }
}

fn client(server: &MockServer, models: &[&str]) -> CompletionClient {
    let transport = WireTransport {
        cfg: ChatEndpointConfig {
            url: format!("{}/v1/chat", server.uri()),
            api_key: "test-token".into(),
        },
        http: HttpClient::new().unwrap(),
    };
    CompletionClient::new(
        models.iter().map(|m| m.to_string()).collect(),
        Arc::new(transport),
    )
}

fn model_body(model: &str) -> serde_json::Value {
    serde_json::json!({ "model": model })
}

#[tokio::test]
async fn retired_model_falls_through_to_next_candidate() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .and(body_partial_json(model_body("command-r")))
        .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "model": "command",
            "message": "hello",
            "max_tokens": 1000,
            "temperature": 0.7
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"text": "hi"})))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server, &["command-r", "command", "command-light"]);
    let mut served = None;
    let reply = c
        .complete_with_hook("hello", |m| served = Some(m.to_string()))
        .await;

    assert_eq!(reply, "hi");
    assert_eq!(served.as_deref(), Some("command"));
}

#[tokio::test]
async fn every_candidate_failing_yields_apology_after_one_attempt_each() {
    let server = MockServer::start().await;
    let models = ["command-r", "command-r-08-2024", "command", "command-light", "command-nightly"];

    for m in models {
        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .and(body_partial_json(model_body(m)))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;
    }

    let reply = client(&server, &models).complete("hello").await;
    assert_eq!(reply, APOLOGY_TEXT);
}

#[tokio::test]
async fn auth_failure_ends_the_loop_with_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api token"))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client(&server, &["command-r", "command"]).complete("hello").await;
    assert_eq!(reply, "API Error 401: invalid api token");
}

#[tokio::test]
async fn worker_replies_in_submission_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .and(body_partial_json(serde_json::json!({"message": "first"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"text": "one"}))
                .set_delay(std::time::Duration::from_millis(150)),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .and(body_partial_json(serde_json::json!({"message": "second"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "two"})),
        )
        .mount(&server)
        .await;

    let (worker, mut events) = CompletionWorker::spawn(Arc::new(client(&server, &["command-r"])));
    let first = worker.submit("first").unwrap();
    let second = worker.submit("second").unwrap();

    let mut replies = Vec::new();
    while replies.len() < 2 {
        match events.recv().await.unwrap() {
            CompletionEvent::Reply { turn, text } => replies.push((turn, text)),
            CompletionEvent::ModelServed { model, .. } => assert_eq!(model, "command-r"),
        }
    }

    assert_eq!(replies, vec![(first, "one".to_string()), (second, "two".to_string())]);
}
