use crate::traits::CompletionTransport;
use pocketchat_core::completion::{APOLOGY_TEXT, UNPARSED_REPLY_TEXT, api_error_text};
use pocketchat_providers::chat::CompletionRequest;
use pocketchat_providers::parse::parse_chat_reply;
use pocketchat_providers::runtime::HttpResponse;
use std::sync::Arc;
use thiserror::Error;

/// Why a single model attempt did not produce a reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    #[error("model not found (404): {body}")]
    ModelUnavailable { body: String },

    #[error("server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("request rejected {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

impl AttemptFailure {
    /// Whether the loop should move on to the next candidate model.
    pub fn should_try_next_model(&self) -> bool {
        !matches!(self, AttemptFailure::Rejected { .. })
    }

    /// Text shown to the user when this failure ends the loop.
    pub fn user_facing(&self) -> String {
        match self {
            AttemptFailure::ModelUnavailable { body } => api_error_text(404, body),
            AttemptFailure::ServerError { status, body }
            | AttemptFailure::Rejected { status, body } => api_error_text(*status, body),
            AttemptFailure::Malformed(_) | AttemptFailure::Transport(_) => APOLOGY_TEXT.into(),
        }
    }
}

/// Classify one HTTP exchange. The classification comes from the status code alone.
pub fn classify_response(resp: &HttpResponse) -> Result<String, AttemptFailure> {
    match resp.status {
        200 => match parse_chat_reply(&resp.body) {
            Ok(Some(text)) => Ok(text),
            // Parsed but empty still ends the loop.
            Ok(None) => Ok(UNPARSED_REPLY_TEXT.into()),
            Err(e) => Err(AttemptFailure::Malformed(format!("{e:#}"))),
        },
        404 => Err(AttemptFailure::ModelUnavailable {
            body: resp.body_text(),
        }),
        status @ 500..=599 => Err(AttemptFailure::ServerError {
            status,
            body: resp.body_text(),
        }),
        status => Err(AttemptFailure::Rejected {
            status,
            body: resp.body_text(),
        }),
    }
}

/// Sends a prompt to the first candidate model that will answer it.
pub struct CompletionClient {
    models: Vec<String>,
    transport: Arc<dyn CompletionTransport>,
}

impl CompletionClient {
    pub fn new(models: Vec<String>, transport: Arc<dyn CompletionTransport>) -> Self {
        Self { models, transport }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn preferred_model(&self) -> Option<&str> {
        self.models.first().map(String::as_str)
    }

    pub async fn attempt(&self, model: &str, prompt: &str) -> Result<String, AttemptFailure> {
        let request = CompletionRequest::new(model, prompt);
        match self.transport.post(&request).await {
            Ok(resp) => classify_response(&resp),
            Err(e) => Err(AttemptFailure::Transport(format!("{e:#}"))),
        }
    }

    /// Never fails: every outcome is turned into text for the transcript.
    pub async fn complete(&self, prompt: &str) -> String {
        self.complete_with_hook(prompt, |_model| {}).await
    }

    /// Same as `complete`, but reports which model produced the reply.
    ///
    /// The hook only fires when a model actually answered.
    pub async fn complete_with_hook<F>(&self, prompt: &str, on_served: F) -> String
    where
        F: FnOnce(&str),
    {
        for model in &self.models {
            match self.attempt(model, prompt).await {
                Ok(text) => {
                    log::info!("completion served by model {model}");
                    on_served(model);
                    return text;
                }
                Err(failure) if failure.should_try_next_model() => {
                    log::warn!("model {model} unavailable, trying next: {failure}");
                }
                Err(failure) => {
                    log::warn!("model {model} rejected the request: {failure}");
                    return failure.user_facing();
                }
            }
        }

        log::error!(
            "all {} candidate models failed; returning apology",
            self.models.len()
        );
        APOLOGY_TEXT.to_string()
    }
}
