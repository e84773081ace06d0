//! Rate-limited pass-through to a hosted language model.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use acf_gate::{RateDecision, RateLimiter};

use crate::auth::iso_millis;
use crate::client::ClientKey;
use crate::config::ChatConfig;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat backend has no API key")]
    NotConfigured,

    #[error("upstream request failed: {0}")]
    Upstream(String),
}

impl From<ChatError> for ServerError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::NotConfigured => Self::NotConfigured("API key".into()),
            ChatError::Upstream(msg) => Self::Upstream(msg),
        }
    }
}

/// A text-generation service.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError>;
}

/// Google Gemini `generateContent` over REST.
pub struct GeminiBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiBackend {
    pub fn new(config: &ChatConfig, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        }
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        let Some(key) = &self.api_key else {
            return Err(ChatError::NotConfigured);
        };
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ChatError::Upstream(format!("{status}: {detail}")));
        }

        response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| ChatError::Upstream(format!("malformed response: {e}")))?
            .text()
            .ok_or_else(|| ChatError::Upstream("response contained no text".into()))
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Throttle, validate, prompt, forward.
pub struct ChatProxy {
    limiter: Arc<RateLimiter>,
    backend: Arc<dyn ChatBackend>,
    preamble: String,
    max_message_chars: usize,
}

impl ChatProxy {
    pub fn new(limiter: Arc<RateLimiter>, backend: Arc<dyn ChatBackend>, config: &ChatConfig) -> Self {
        Self {
            limiter,
            backend,
            preamble: config.preamble(),
            max_message_chars: config.max_message_chars,
        }
    }

    pub fn admit(&self, client_key: &str) -> RateDecision {
        self.limiter.check(client_key)
    }

    pub fn now_ms(&self) -> u64 {
        self.limiter.now_ms()
    }

    /// Length is checked on the raw message, before trimming.
    pub fn validate(&self, message: Option<&str>) -> ServerResult<String> {
        let message = message.ok_or_else(|| ServerError::BadRequest("Message is required".into()))?;
        if message.chars().count() > self.max_message_chars {
            return Err(ServerError::BadRequest(format!(
                "Message must be {} characters or less",
                self.max_message_chars
            )));
        }
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(ServerError::BadRequest("Message is required".into()));
        }
        Ok(trimmed.to_string())
    }

    pub fn prompt(&self, message: &str) -> String {
        format!("{}\n\nUser: {}", self.preamble, message)
    }

    pub async fn respond(&self, message: Option<&str>) -> ServerResult<ChatResponse> {
        let message = self.validate(message)?;
        let response = self.backend.generate(&self.prompt(&message)).await?;
        Ok(ChatResponse { response })
    }
}

impl std::fmt::Debug for ChatProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatProxy")
            .field("limiter", &self.limiter)
            .field("max_message_chars", &self.max_message_chars)
            .finish()
    }
}

const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

fn rate_limit_headers(decision: &RateDecision) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    if let Ok(reset) = HeaderValue::from_str(&iso_millis(decision.reset_at_ms)) {
        headers.insert(X_RATELIMIT_RESET, reset);
    }
    headers
}

/// `POST /api/chat`
///
/// The rate-limit headers are set on every response, rejections included.
pub async fn chat_handler(
    State(state): State<AppState>,
    client: ClientKey,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let decision = state.chat.admit(client.as_str());
    let headers = rate_limit_headers(&decision);

    let outcome = if decision.allowed {
        let message = payload.ok().and_then(|Json(body)| body.message);
        state.chat.respond(message.as_deref()).await.map(Json)
    } else {
        let secs = decision.retry_after_secs(state.chat.now_ms());
        tracing::warn!(client = client.as_str(), secs, "chat throttled");
        Err(ServerError::RateLimited {
            error: "Too many requests",
            message: format!("Rate limit exceeded. Please try again in {secs} seconds."),
            retry_after: secs,
            retry_after_secs: secs,
        })
    };
    (headers, outcome).into_response()
}
