//! Chat-completion API client.
//!
//! This module talks to an OpenAI-compatible `/chat/completions` endpoint.
//!
//! # Architecture
//!
//! - [`CompletionClient`]: trait the summarizer is written against
//! - [`OpenAiClient`]: the HTTP implementation
//! - [`CompletionRequest`]: the request body, built once per article
//!
//! There is no retry here. A failed call is reported to the caller, which
//! substitutes a sentinel summary and moves on.

use crate::error::CompletionError;
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, instrument, warn};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Body of a `/chat/completions` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Option<Vec<Choice>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Trait for sending a completion request and getting text back.
///
/// Implementors return the first generated choice as-is; deciding what
/// counts as a usable summary is left to the caller.
pub trait CompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// HTTP client for an OpenAI-compatible API.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(client: Client, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl CompletionClient for OpenAiClient {
    #[instrument(level = "debug", skip_all, fields(model = %request.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let t0 = Instant::now();
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        let dt = t0.elapsed();
        debug!(%status, elapsed_ms = dt.as_millis() as u64, "Completion response received");

        match parse_completion(&body) {
            Ok(text) if status.is_success() => Ok(text),
            Ok(_) => Err(CompletionError::Provider(format!("HTTP {status}"))),
            Err(e) => {
                warn!(%status, error = %e, preview = %truncate_for_log(&body, 300), "Completion call failed");
                Err(e)
            }
        }
    }
}

/// Extract the first choice's text from a response body.
fn parse_completion(body: &str) -> Result<String, CompletionError> {
    let response: CompletionResponse = serde_json::from_str(body)?;
    if let Some(error) = response.error {
        return Err(CompletionError::Provider(error.message));
    }
    response
        .choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or(CompletionError::Empty)
}
