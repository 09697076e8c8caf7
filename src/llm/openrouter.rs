use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use super::{ChatRequest, CompletionBackend};
use crate::config::LlmConfig;
use crate::error::{
    AutoselectError, ConfigError, Result, UpstreamError, ValidationError, truncate_snippet,
};

/// Upstream bodies are cut to this many characters before they reach an error
const BODY_SNIPPET_CHARS: usize = 200;

/// OpenRouter (or any OpenAI-compatible) chat-completions client
pub struct OpenRouterClient {
    http: Client,
    api_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl std::fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl OpenRouterClient {
    /// Build a client; fails when the key or model is missing
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::MissingRequired("LLM_API_KEY".to_string()))?;

        if config.model.trim().is_empty() {
            return Err(ConfigError::MissingRequired("LLM_MODEL".to_string()).into());
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "llm".to_string(),
                reason: format!("cannot build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: api_key.to_string(),
            model: config.model.trim().to_string(),
            timeout_secs: config.timeout_secs,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> AutoselectError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout_secs).into()
        } else {
            // without_url keeps query strings out of the message
            UpstreamError::Network(err.without_url().to_string()).into()
        }
    }
}

/// Map a non-success status onto the error taxonomy
pub(crate) fn status_error(status: StatusCode, body: &str) -> AutoselectError {
    let code = status.as_u16();
    let body = truncate_snippet(body.trim(), BODY_SNIPPET_CHARS);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ConfigError::Rejected { status: code }.into()
        }
        s if s.is_client_error() => ValidationError::UpstreamRejected { status: code, body }.into(),
        _ => UpstreamError::Server { status: code, body }.into(),
    }
}

#[async_trait]
impl CompletionBackend for OpenRouterClient {
    async fn complete(&self, request: &ChatRequest) -> Result<Value> {
        tracing::debug!(
            "POST {} (model {}, {} messages)",
            self.api_url,
            request.model,
            request.messages.len()
        );

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::UnexpectedPayload(format!("response is not JSON: {}", e)))?;

        payload
            .pointer("/choices/0/message/content")
            .filter(|content| !content.is_null())
            .cloned()
            .ok_or_else(|| {
                UpstreamError::UnexpectedPayload(format!(
                    "missing choices[0].message.content in {}",
                    truncate_snippet(&payload.to_string(), BODY_SNIPPET_CHARS)
                ))
                .into()
            })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
