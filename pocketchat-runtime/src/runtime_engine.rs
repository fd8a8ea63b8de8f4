use std::sync::Arc;

use pocketchat_core::config::AppConfig;
use pocketchat_engine::completion::CompletionClient;

use crate::llm::HttpCompletionTransport;
use crate::secrets::{SecretKey, SecretStore};

/// Keyring override wins; otherwise the caller-supplied fallback (e.g. an env var).
pub fn resolve_api_token(stored: Option<String>, fallback: Option<String>) -> Option<String> {
    stored
        .or(fallback)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Build a completion client for an explicit token.
pub fn build_client(cfg: &AppConfig, api_token: &str) -> anyhow::Result<CompletionClient> {
    let transport = HttpCompletionTransport::new(cfg.completion.endpoint.clone(), api_token)?;
    Ok(CompletionClient::new(
        cfg.completion.models.clone(),
        Arc::new(transport),
    ))
}

/// Build the completion client from settings plus the stored token override.
pub fn build_client_from_config(
    cfg: &AppConfig,
    secrets: &dyn SecretStore,
    fallback_token: Option<String>,
) -> anyhow::Result<CompletionClient> {
    let stored = match secrets.get(SecretKey::ApiToken) {
        Ok(v) => v,
        Err(e) => {
            // No keyring backend (headless CI, containers) is not fatal.
            log::warn!("keyring unavailable: {e:#}");
            None
        }
    };

    let token = resolve_api_token(stored, fallback_token).unwrap_or_else(|| {
        log::warn!("no API token configured; requests will be rejected by the endpoint");
        String::new()
    });

    build_client(cfg, &token)
}
