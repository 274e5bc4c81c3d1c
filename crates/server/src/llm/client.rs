//! Completion API client.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::AiConfig;

use super::error::{ApiErrorResponse, LlmError};
use super::types::{ChatRequest, ChatResponse, Message};

const DEFAULT_MAX_TOKENS: u32 = 512;

/// Client for an OpenAI-compatible chat-completion API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<LlmClientInner>,
}

struct LlmClientInner {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("endpoint", &self.inner.endpoint)
            .field("model", &self.inner.model)
            .finish_non_exhaustive()
    }
}

impl LlmClient {
    /// Create a new completion client.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Unauthorized` if the API key cannot be sent as a
    /// header, or `LlmError::Http` if the HTTP client cannot be built.
    pub fn new(config: &AiConfig) -> Result<Self, LlmError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))
            .map_err(|_| {
                LlmError::Unauthorized("API key contains invalid header characters".to_string())
            })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(LlmClientInner {
                client,
                endpoint: format!(
                    "{}/chat/completions",
                    config.base_url.as_str().trim_end_matches('/')
                ),
                model: config.model.clone(),
            }),
        })
    }

    /// The model identifier sent with every request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    /// Send one completion request and return the reply text.
    ///
    /// No retries; the caller decides what a failure means.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API answers with an error
    /// status, or the reply has no text.
    #[instrument(skip(self, messages), fields(model = %self.inner.model))]
    pub async fn complete(&self, messages: Vec<Message>) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.inner.model.clone(),
            messages,
            max_tokens: Some(DEFAULT_MAX_TOKENS),
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(&request)
            .send()
            .await?;

        let chat = Self::handle_response(response).await?;
        chat.text()
            .map(str::to_owned)
            .ok_or(LlmError::EmptyCompletion)
    }

    /// Handle a completed HTTP exchange.
    async fn handle_response(response: reqwest::Response) -> Result<ChatResponse, LlmError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body)
                .map_err(|e| LlmError::Parse(format!("Failed to parse response: {e}")))
        } else {
            Err(Self::handle_error_status(status, response).await)
        }
    }

    /// Handle an error status code.
    async fn handle_error_status(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> LlmError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return LlmError::RateLimited(retry_after);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return LlmError::Unauthorized("Invalid API key".to_string());
        }

        match response.text().await {
            Ok(body) => match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_error) => LlmError::Api {
                    error_type: api_error
                        .error
                        .error_type
                        .unwrap_or_else(|| status.as_u16().to_string()),
                    message: api_error.error.message,
                },
                Err(_) => LlmError::Api {
                    error_type: status.as_u16().to_string(),
                    message: body,
                },
            },
            Err(e) => LlmError::Http(e),
        }
    }
}
