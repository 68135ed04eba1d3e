//! # voxhome-adapter-llm-http
//!
//! [`InterpretationService`] backed by an OpenAI-compatible text completion
//! endpoint (`POST {base_url}/completions`).
//!
//! The adapter only moves text: it sends the prompt built by the command
//! interpreter and hands back the first completion, trimmed. Parsing the
//! answer is the interpreter's job.
//!
//! ## Dependency rule
//!
//! Depends on `voxhome-app` (port traits) only.

mod config;
mod error;

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use voxhome_app::ports::{InterpretationService, InterpretationServiceError};

pub use config::LlmConfig;
pub use error::LlmError;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    text: String,
}

impl CompletionResponse {
    fn into_text(self) -> Result<String, LlmError> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.text.trim().to_string())
            .ok_or(LlmError::NoChoices)
    }
}

/// HTTP client for the completion endpoint.
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Build a client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Client`] if the TLS backend cannot be initialised.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(LlmError::Client)?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Request one completion for `prompt`.
    ///
    /// # Errors
    ///
    /// Any [`LlmError`] except [`LlmError::Client`].
    pub async fn completion(&self, prompt: &str) -> Result<String, LlmError> {
        let body = CompletionRequest {
            model: &self.config.model,
            prompt,
            max_tokens: self.config.max_tokens,
        };

        let mut request = self.client.post(self.config.completions_url()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(LlmError::Request)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = response.json().await.map_err(LlmError::Request)?;
        parsed.into_text()
    }
}

impl InterpretationService for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, InterpretationServiceError> {
        match self.completion(prompt).await {
            Ok(text) => Ok(text),
            Err(err) => {
                if let LlmError::Status { status, body } = &err {
                    tracing::warn!(status, %body, "completion endpoint rejected the request");
                }
                Err(err.into())
            }
        }
    }
}
