use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::ollama::OllamaClient;
use super::openai::OpenAIClient;
use crate::config::{ClientConfig, ConfigError, LogLevel, Provider, ResolvedConfig};
use crate::prompt::Prompt;

/// Text generated by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// The generated text
    pub text: String,
    /// The model that produced the text, as reported by the backend
    pub model: String,
    /// When the backend finished generating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Token usage statistics, when the backend reports them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl Response {
    /// Creates a response holding only text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: String::new(),
            created_at: None,
            usage: None,
        }
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Number of input tokens
    pub input_tokens: u32,
    /// Number of output tokens
    pub output_tokens: u32,
}

/// Errors that can occur when communicating with an LLM.
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    /// The backend answered with an error status
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },
    /// A network error occurred
    #[error("Network error: {0}")]
    NetworkError(#[source] reqwest::Error),
    /// The response from the LLM was invalid
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// The call did not finish in time
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// The caller cancelled the call
    #[error("Request cancelled")]
    Cancelled,
    /// The prompt body is empty
    #[error("Prompt body is empty")]
    EmptyPrompt,
}

impl LLMError {
    /// Maps a reqwest failure, keeping timeouts distinguishable.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            LLMError::Timeout(timeout)
        } else {
            LLMError::NetworkError(err)
        }
    }

    /// Whether this error is attributed to a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, LLMError::Timeout(_))
    }
}

/// Trait for LLM clients.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Provider backing this client.
    fn provider(&self) -> Provider;
    /// Model requests are sent to.
    fn model(&self) -> &str;
    /// Sends a single request and returns the complete response.
    async fn generate(&self, prompt: &Prompt) -> Result<Response, LLMError>;
}

/// A builder for creating LLM clients.
#[derive(Debug, Clone, Default)]
pub struct LLMClientBuilder {
    config: ClientConfig,
}

impl LLMClientBuilder {
    /// Creates a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Sets the provider.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.config.provider = provider.into();
        self
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Sets the log level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.config.log_level = Some(level);
        self
    }

    /// Sets the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    /// Sets the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Returns the configuration assembled so far.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Consumes the builder, returning its configuration.
    pub fn into_config(self) -> ClientConfig {
        self.config
    }

    /// Validates the options and creates the client for the chosen provider.
    pub fn build(self) -> Result<Arc<dyn LLMClient>, ConfigError> {
        let mut config = self.config;
        if config.api_key.is_none() && config.provider.eq_ignore_ascii_case("openai") {
            config.api_key = std::env::var("OPENAI_API_KEY").ok();
        }

        let resolved: ResolvedConfig = config.validate()?;
        let client: Arc<dyn LLMClient> = match resolved.provider {
            Provider::Ollama => Arc::new(OllamaClient::new(resolved)?),
            Provider::OpenAI => Arc::new(OpenAIClient::new(resolved)?),
        };
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_options() {
        let config = LLMClientBuilder::new()
            .with_provider("ollama")
            .with_model("gemma3")
            .with_timeout(Duration::from_secs(100))
            .with_log_level(LogLevel::Info)
            .with_endpoint("http://127.0.0.1:11434")
            .into_config();

        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "gemma3");
        assert_eq!(config.timeout, Some(Duration::from_secs(100)));
        assert_eq!(config.log_level, Some(LogLevel::Info));
        assert_eq!(config.endpoint.as_deref(), Some("http://127.0.0.1:11434"));
    }

    #[test]
    fn test_build_ollama() {
        let client = LLMClientBuilder::new()
            .with_provider("ollama")
            .with_model("gemma3")
            .build()
            .unwrap();

        assert_eq!(client.provider(), Provider::Ollama);
        assert_eq!(client.model(), "gemma3");
    }

    #[test]
    fn test_build_unknown_provider() {
        let result = LLMClientBuilder::new().with_provider("skynet").build();
        assert!(matches!(result, Err(ConfigError::UnknownProvider(_))));
    }

    #[test]
    fn test_timeout_attribution() {
        assert!(LLMError::Timeout(Duration::from_secs(1)).is_timeout());
        assert!(!LLMError::Cancelled.is_timeout());
    }
}
