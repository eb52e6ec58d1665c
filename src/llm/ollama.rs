use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{LLMClient, LLMError, Response, Usage};
use crate::config::{ConfigError, Provider, ResolvedConfig};
use crate::prompt::Prompt;

/// Ollama API request for `/api/generate`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Ollama API response for `/api/generate` with streaming disabled.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// An LLM client for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl OllamaClient {
    /// Creates a new Ollama client.
    pub fn new(config: ResolvedConfig) -> Result<Self, ConfigError> {
        let timeout = config.http_timeout();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            client,
            base_url: config.endpoint,
            model: config.model,
            timeout,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Creates a request builder for text generation.
    fn generate_request(&self, prompt: &Prompt) -> RequestBuilder {
        let options = if self.max_tokens.is_some() || self.temperature.is_some() {
            Some(GenerateOptions {
                num_predict: self.max_tokens,
                temperature: self.temperature,
            })
        } else {
            None
        };

        let body = GenerateRequest {
            model: &self.model,
            prompt: prompt.render(),
            stream: false,
            options,
        };

        debug!(model = %self.model, url = %self.base_url, "Sending request to Ollama");

        self.client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    fn provider(&self) -> Provider {
        Provider::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &Prompt) -> Result<Response, LLMError> {
        if !prompt.has_body() {
            return Err(LLMError::EmptyPrompt);
        }

        let response = self
            .generate_request(prompt)
            .send()
            .await
            .map_err(|e| LLMError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| LLMError::from_reqwest(e, self.timeout))?;

        debug!(status = status.as_u16(), "Ollama response: {}", response_text);

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&response_text)
                .map(|e| e.error)
                .unwrap_or(response_text);
            return Err(LLMError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let response: GenerateResponse = serde_json::from_str(&response_text)
            .map_err(|e| LLMError::InvalidResponse(format!("{}: {}", e, response_text)))?;

        if !response.done {
            debug!("Ollama reported an unfinished response");
        }
        if let Some(reason) = response.done_reason.as_deref() {
            debug!(reason, "Ollama finished generating");
        }

        let usage = match (response.prompt_eval_count, response.eval_count) {
            (None, None) => None,
            (input, output) => Some(Usage {
                input_tokens: input.unwrap_or(0),
                output_tokens: output.unwrap_or(0),
            }),
        };

        Ok(Response {
            text: response.response,
            model: response.model,
            created_at: response.created_at,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    fn client(max_tokens: Option<u32>, temperature: Option<f32>) -> OllamaClient {
        let mut config = ClientConfig::new("ollama", "gemma3");
        config.max_tokens = max_tokens;
        config.temperature = temperature;
        OllamaClient::new(config.validate().unwrap()).unwrap()
    }

    #[test]
    fn test_request_body_without_options() {
        let request = client(None, None)
            .generate_request(&Prompt::new("hello"))
            .build()
            .unwrap();

        assert_eq!(request.url().as_str(), "http://localhost:11434/api/generate");
        let body: serde_json::Value =
            serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"model": "gemma3", "prompt": "hello", "stream": false})
        );
    }

    #[test]
    fn test_request_body_with_options() {
        let request = client(Some(256), Some(0.5))
            .generate_request(&Prompt::new("hello").with_directives(["Be brief"]))
            .build()
            .unwrap();

        let body: serde_json::Value =
            serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body["prompt"], "Directives:\n- Be brief\n\nhello");
        assert_eq!(body["options"]["num_predict"], 256);
        assert_eq!(body["options"]["temperature"], 0.5);
    }

    #[test]
    fn test_parse_generate_response() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"model":"gemma3","created_at":"2025-05-01T10:00:00Z","response":"Hi there","done":true,"done_reason":"stop","eval_count":3}"#,
        )
        .unwrap();

        assert_eq!(response.response, "Hi there");
        assert!(response.done);
        assert_eq!(response.eval_count, Some(3));
        assert!(response.created_at.is_some());
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected() {
        let result = client(None, None).generate(&Prompt::new("")).await;
        assert!(matches!(result, Err(LLMError::EmptyPrompt)));
    }
}
