use crate::request::{Body, HttpRequest};
use pocketchat_core::completion::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use serde::Serialize;

#[derive(Clone, PartialEq, Eq)]
pub struct ChatEndpointConfig {
    pub url: String,
    pub api_key: String,
}

impl std::fmt::Debug for ChatEndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatEndpointConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// One outbound call for one candidate model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub message: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            message: message.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

pub fn build_chat_request(cfg: &ChatEndpointConfig, req: &CompletionRequest) -> HttpRequest {
    // f32 0.7 would serialize as 0.699999988...; send the value as the user wrote it.
    let payload = serde_json::json!({
        "model": req.model,
        "message": req.message,
        "max_tokens": req.max_tokens,
        "temperature": round_temperature(req.temperature),
    });

    HttpRequest {
        method: "POST".into(),
        url: cfg.url.clone(),
        headers: vec![
            ("Content-Type".into(), "application/json".into()),
            ("Authorization".into(), format!("Bearer {}", cfg.api_key)),
        ],
        body: Body::Json(payload.to_string()),
    }
}

fn round_temperature(t: f32) -> f64 {
    (f64::from(t) * 1000.0).round() / 1000.0
}
