//! Completion endpoint configuration.

use std::fmt;

use serde::Deserialize;

/// Configuration for the HTTP interpretation service.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API, without trailing `/completions`.
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Whole-request timeout enforced by the HTTP client, in seconds.
    pub timeout_secs: u64,
    /// Bearer token. Requests are sent unauthenticated when `None`.
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo-instruct".to_string(),
            max_tokens: 150,
            timeout_secs: 30,
            api_key: None,
        }
    }
}

impl LlmConfig {
    pub(crate) fn completions_url(&self) -> String {
        format!("{}/completions", self.base_url.trim_end_matches('/'))
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.max_tokens, 150);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let config: LlmConfig = toml::from_str(r#"model = "local-model""#).unwrap();
        assert_eq!(config.model, "local-model");
        assert_eq!(config.max_tokens, 150);
    }

    #[test]
    fn should_build_completions_url_without_double_slash() {
        let config = LlmConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(config.completions_url(), "http://localhost:8080/v1/completions");
    }

    #[test]
    fn should_redact_api_key_when_debug_printed() {
        let config = LlmConfig {
            api_key: Some("sk-very-secret".to_string()),
            ..LlmConfig::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-very-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
