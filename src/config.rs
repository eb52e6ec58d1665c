//! Client configuration.
//!
//! A [`ClientConfig`] is built once from literal values, validated, and then
//! handed to [`LLMClientBuilder`](crate::llm::LLMClientBuilder) to construct a
//! provider client. Every optional field falls back to a provider default.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

/// Timeout applied to the HTTP client when none is configured.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while validating a configuration or constructing a client.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The provider name is not recognised
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    /// The model name is empty
    #[error("model name must not be empty")]
    EmptyModel,
    /// The endpoint is not a valid URL
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    /// The provider requires an API key and none was given
    #[error("provider {0} requires an API key")]
    MissingApiKey(Provider),
    /// The API key cannot be sent in a request header
    #[error("invalid API key for provider {provider}: {reason}")]
    InvalidApiKey { provider: Provider, reason: String },
    /// Temperature outside the accepted range
    #[error("temperature {0} is outside 0.0..=2.0")]
    InvalidTemperature(f32),
    /// An operation needed a client before one was configured
    #[error("client has not been configured")]
    NotConfigured,
    /// The underlying HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Backend inference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// A local Ollama server
    Ollama,
    /// Any OpenAI-compatible chat completions API
    OpenAI,
}

impl Provider {
    /// Endpoint used when none is configured.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Provider::Ollama => DEFAULT_OLLAMA_ENDPOINT,
            Provider::OpenAI => DEFAULT_OPENAI_ENDPOINT,
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Ollama => "llama3.2",
            Provider::OpenAI => "gpt-4o-mini",
        }
    }

    /// Whether requests must carry an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Provider::OpenAI)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::OpenAI => "openai",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAI),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// Diagnostic verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options used to construct an LLM client.
///
/// The provider is kept as the raw string it was given; unknown names are
/// rejected by [`ClientConfig::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Provider identifier (e.g., "ollama")
    pub provider: String,
    /// Model identifier (e.g., "gemma3")
    pub model: String,
    /// Upper bound on a single generate call
    #[serde(default, skip_serializing_if = "Option::is_none", with = "duration_secs")]
    pub timeout: Option<Duration>,
    /// Diagnostic verbosity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
    /// Overrides the provider's default address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// API key for providers that need one
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 to 2.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama.as_str().to_string(),
            model: Provider::Ollama.default_model().to_string(),
            timeout: None,
            log_level: None,
            endpoint: None,
            api_key: None,
            max_tokens: None,
            temperature: None,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for the given provider and model with every
    /// optional field unset.
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    /// Log level in effect, falling back to the default.
    pub fn effective_log_level(&self) -> LogLevel {
        self.log_level.unwrap_or_default()
    }

    /// Checks every option and resolves defaults.
    pub fn validate(&self) -> Result<ResolvedConfig, ConfigError> {
        let provider: Provider = self.provider.parse()?;

        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }

        let endpoint = self
            .endpoint
            .as_deref()
            .unwrap_or(provider.default_endpoint());
        let url = reqwest::Url::parse(endpoint).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::InvalidTemperature(temperature));
            }
        }

        let api_key = self
            .api_key
            .clone()
            .filter(|key| !key.is_empty());
        if provider.requires_api_key() && api_key.is_none() {
            return Err(ConfigError::MissingApiKey(provider));
        }

        Ok(ResolvedConfig {
            provider,
            model: self.model.clone(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout: self.timeout,
            api_key,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        })
    }
}

/// A validated configuration with defaults filled in.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub provider: Provider,
    pub model: String,
    /// Endpoint without a trailing slash
    pub endpoint: String,
    pub timeout: Option<Duration>,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl ResolvedConfig {
    /// Timeout for the HTTP client.
    pub fn http_timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs = Option::<f64>::deserialize(d)?;
        secs.map(|s| Duration::try_from_secs_f64(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse() {
        assert_eq!("ollama".parse::<Provider>().unwrap(), Provider::Ollama);
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAI);
        assert!(matches!(
            "mystery".parse::<Provider>(),
            Err(ConfigError::UnknownProvider(name)) if name == "mystery"
        ));
    }

    #[test]
    fn test_optional_fields_use_defaults() {
        let resolved = ClientConfig::new("ollama", "gemma3").validate().unwrap();

        assert_eq!(resolved.provider, Provider::Ollama);
        assert_eq!(resolved.endpoint, DEFAULT_OLLAMA_ENDPOINT);
        assert_eq!(resolved.timeout, None);
        assert_eq!(resolved.http_timeout(), DEFAULT_HTTP_TIMEOUT);
        assert_eq!(ClientConfig::new("ollama", "gemma3").effective_log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_endpoint_override() {
        let mut config = ClientConfig::new("ollama", "gemma3");
        config.endpoint = Some("http://127.0.0.1:11434/".to_string());

        let resolved = config.validate().unwrap();
        assert_eq!(resolved.endpoint, "http://127.0.0.1:11434");
    }

    #[test]
    fn test_invalid_options() {
        let mut config = ClientConfig::new("ollama", " ");
        assert!(matches!(config.validate(), Err(ConfigError::EmptyModel)));

        config.model = "gemma3".to_string();
        config.endpoint = Some("not a url".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidEndpoint { .. })));

        config.endpoint = Some("ftp://127.0.0.1".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidEndpoint { .. })));

        config.endpoint = None;
        config.temperature = Some(3.5);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTemperature(_))));
    }

    #[test]
    fn test_openai_requires_api_key() {
        let mut config = ClientConfig::new("openai", "gpt-4o-mini");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingApiKey(Provider::OpenAI))
        ));

        config.api_key = Some("sk-test".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserialize() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"provider":"ollama","model":"gemma3","timeout":100,"log_level":"info"}"#,
        )
        .unwrap();

        assert_eq!(config.timeout, Some(Duration::from_secs(100)));
        assert_eq!(config.log_level, Some(LogLevel::Info));
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn test_config_deserialize_rejects_bad_timeout() {
        for timeout in ["1e20", "-1"] {
            let json = format!(
                r#"{{"provider":"ollama","model":"gemma3","timeout":{}}}"#,
                timeout
            );
            assert!(serde_json::from_str::<ClientConfig>(&json).is_err(), "accepted {}", timeout);
        }
    }
}
