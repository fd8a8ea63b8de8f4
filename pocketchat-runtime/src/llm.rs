use pocketchat_engine::traits::CompletionTransport;
use pocketchat_providers::chat::{ChatEndpointConfig, CompletionRequest, build_chat_request};
use pocketchat_providers::runtime::{HttpClient, HttpResponse};

/// Sends completion requests to the hosted chat endpoint.
#[derive(Clone)]
pub struct HttpCompletionTransport {
    endpoint: ChatEndpointConfig,
    http: HttpClient,
}

impl std::fmt::Debug for HttpCompletionTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCompletionTransport")
            .field("url", &self.endpoint.url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl HttpCompletionTransport {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            endpoint: ChatEndpointConfig {
                url: url.into(),
                api_key: api_key.into(),
            },
            http: HttpClient::new()?,
        })
    }
}

#[async_trait::async_trait]
impl CompletionTransport for HttpCompletionTransport {
    async fn post(&self, request: &CompletionRequest) -> anyhow::Result<HttpResponse> {
        let req = build_chat_request(&self.endpoint, request);
        log::debug!("POST {} model={}", req.url, request.model);
        self.http.execute(&req).await
    }
}
