//! Chat-completion service abstraction and implementations.
//!
//! Defines the [`CompletionService`] trait the pipeline talks to, plus two
//! concrete services:
//! - **[`DisabledCompletion`]**: always fails; every tier then degrades
//!   (the overview falls back to the static welcome, chunks fail).
//! - **[`OpenAiCompletion`]**: calls an OpenAI-compatible
//!   `/chat/completions` endpoint with retry and backoff.
//!
//! Use [`create_service`] to pick one from the configuration.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CompletionConfig;
use crate::error::CompletionError;

const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One role-tagged message of a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Text returned by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
}

/// A text-completion backend.
///
/// An `Err` means the call itself failed. A reply that is not what was
/// asked for is still `Ok`; the caller decodes and judges it.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Returns the model identifier, for logs.
    fn model_name(&self) -> &str;

    async fn complete(&self, messages: &[Message]) -> Result<Completion, CompletionError>;
}

/// Build the service named by `config.provider`.
pub fn create_service(
    config: &CompletionConfig,
) -> anyhow::Result<Arc<dyn CompletionService>> {
    if !config.is_enabled() {
        tracing::info!("completion provider disabled, overview falls back to the static page");
        return Ok(Arc::new(DisabledCompletion));
    }
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiCompletion::new(config)?)),
        other => anyhow::bail!("Unknown completion provider: {}", other),
    }
}

// ============ Disabled Service ============

pub struct DisabledCompletion;

#[async_trait]
impl CompletionService for DisabledCompletion {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _messages: &[Message]) -> Result<Completion, CompletionError> {
        Err(CompletionError::Disabled)
    }
}

// ============ OpenAI Service ============

/// Completion service for OpenAI-compatible chat APIs.
///
/// Requires `OPENAI_API_KEY` in the environment. The endpoint is
/// `{base_url}/chat/completions`, so any compatible gateway works.
pub struct OpenAiCompletion {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiCompletion {
    pub fn new(config: &CompletionConfig) -> anyhow::Result<Self> {
        let api_key =
            std::env::var(API_KEY_VAR).map_err(|_| CompletionError::MissingApiKey(API_KEY_VAR))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[Message]) -> Result<Completion, CompletionError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::debug!(attempt, ?delay, "retrying completion request");
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| CompletionError::Transport(e.to_string()))?;
                        return parse_chat_response(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let err = CompletionError::Status {
                        status: status.as_u16(),
                        body: body_text,
                    };

                    // Rate limited or server error, retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(err);
                        continue;
                    }

                    return Err(err);
                }
                Err(e) => {
                    last_err = Some(CompletionError::Transport(e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            CompletionError::Transport("completion failed after retries".to_string())
        }))
    }
}

/// Extract `choices[0].message.content`.
fn parse_chat_response(json: &serde_json::Value) -> Result<Completion, CompletionError> {
    json.pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .map(|content| Completion {
            content: content.to_string(),
        })
        .ok_or(CompletionError::EmptyResponse)
}
