//! Thin relay to an OpenAI-compatible chat completion endpoint.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::error::{AppError, AppResult};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("API key is not configured")]
    MissingApiKey,

    #[error("{0}")]
    Upstream(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

// ── Wire types ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [CompletionMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

// ── Client ─────────────────────────────────────────────────────────────────

/// Text-in, text-out completion client. The API key is optional at
/// construction; its absence is reported per call.
#[derive(Clone)]
pub struct ChatClient {
    http: ReqwestClient,
    api_key: Option<Arc<str>>,
    endpoint: Arc<str>,
    model: Arc<str>,
    temperature: f32,
}

impl ChatClient {
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        model: &str,
        temperature: f32,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to build chat HTTP client");
                AppError::Internal
            })?;

        Ok(Self {
            http,
            api_key: api_key.map(Arc::from),
            endpoint: Arc::from(format!("{}/chat/completions", base_url.trim_end_matches('/'))),
            model: Arc::from(model),
            temperature,
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            config.openai_api_key.clone(),
            &config.openai_base_url,
            &config.openai_model,
            config.openai_temperature,
            config.openai_timeout,
        )
    }

    /// Send `message` as a single user turn and return the assistant's reply.
    pub async fn complete(&self, message: &str) -> Result<String, ChatError> {
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let api_key = self.api_key.as_deref().ok_or_else(|| {
            tracing::error!("OPENAI_API_KEY is not configured");
            ChatError::MissingApiKey
        })?;

        let request = CompletionRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: [CompletionMessage {
                role: "user",
                content: message,
            }],
        };

        let resp = self
            .http
            .post(&*self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to contact completion API");
                ChatError::Transport(e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            let message = match resp.json::<ErrorEnvelope>().await {
                Ok(envelope) => envelope.error.message,
                Err(_) => format!("Completion API returned status {}", status.as_u16()),
            };
            tracing::error!(status = status.as_u16(), "Completion API error: {}", message);
            return Err(ChatError::Upstream(message));
        }

        let body: CompletionResponse = resp.json().await.map_err(|e| {
            tracing::error!(error = ?e, "Failed to parse completion API response");
            ChatError::Transport(e)
        })?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| ChatError::Upstream("Completion API returned no choices".into()))
    }
}
