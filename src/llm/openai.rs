use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{LLMClient, LLMError, Response, Usage};
use crate::config::{ConfigError, Provider, ResolvedConfig};
use crate::prompt::Prompt;

/// OpenAI API response for chat completions.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    created: i64,
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageResponse,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UsageInfo {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

/// An LLM client for OpenAI-compatible APIs.
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl OpenAIClient {
    /// Creates a new OpenAI client.
    pub fn new(config: ResolvedConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or(ConfigError::MissingApiKey(Provider::OpenAI))?;

        let mut headers = reqwest::header::HeaderMap::new();
        let auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| ConfigError::InvalidApiKey {
                provider: Provider::OpenAI,
                reason: e.to_string(),
            })?;
        headers.insert(reqwest::header::AUTHORIZATION, auth);
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let timeout = config.http_timeout();
        let client = reqwest::Client::builder()
            .default_headers(headers)
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

    /// Creates a request builder for chat completions.
    fn chat_completions_request(&self, prompt: &Prompt) -> RequestBuilder {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![serde_json::json!({
                "role": "user",
                "content": prompt.render()
            })],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        };

        debug!(model = %self.model, "Sending request to OpenAI");

        self.client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body)
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &Prompt) -> Result<Response, LLMError> {
        if !prompt.has_body() {
            return Err(LLMError::EmptyPrompt);
        }

        let response = self
            .chat_completions_request(prompt)
            .send()
            .await
            .map_err(|e| LLMError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| LLMError::from_reqwest(e, self.timeout))?;

        tracing::debug!("LLM response: {}", response_text);

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&response_text)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(String::from))
                .unwrap_or(response_text);
            return Err(LLMError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let response: ChatCompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| LLMError::InvalidResponse(format!("{}: {}", e, response_text)))?;

        let Some(choice) = response.choices.into_iter().next() else {
            return Err(LLMError::InvalidResponse(format!(
                "No choices in response. Response: {}",
                response_text
            )));
        };

        if let Some(reason) = choice.finish_reason.as_deref() {
            debug!(reason, "OpenAI finished generating");
        }

        Ok(Response {
            text: choice.message.content.unwrap_or_default(),
            model: response.model,
            created_at: (response.created > 0)
                .then(|| DateTime::<Utc>::from_timestamp(response.created, 0))
                .flatten(),
            usage: response.usage.map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    #[test]
    fn test_chat_request_body() {
        let mut config = ClientConfig::new("openai", "gpt-4o-mini");
        config.api_key = Some("sk-test".to_string());
        config.endpoint = Some("http://127.0.0.1:8080/v1".to_string());
        let client = OpenAIClient::new(config.validate().unwrap()).unwrap();

        let request = client
            .chat_completions_request(&Prompt::new("hello"))
            .build()
            .unwrap();

        assert_eq!(request.url().as_str(), "http://127.0.0.1:8080/v1/chat/completions");
        assert_eq!(
            request.headers()[reqwest::header::AUTHORIZATION],
            "Bearer sk-test"
        );
        let body: Value =
            serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["stream"], false);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_unusable_api_key() {
        let mut config = ClientConfig::new("openai", "gpt-4o-mini");
        config.api_key = Some("sk-test\nInjected: header".to_string());

        let result = OpenAIClient::new(config.validate().unwrap());
        assert!(matches!(
            result,
            Err(ConfigError::InvalidApiKey { provider: Provider::OpenAI, .. })
        ));
    }

    #[test]
    fn test_parse_chat_response() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"created":1714557600,"model":"gpt-4o-mini","choices":[{"index":0,"message":{"role":"assistant","content":"Hi"},"finish_reason":"stop"}],"usage":{"prompt_tokens":5,"completion_tokens":1,"total_tokens":6}}"#,
        )
        .unwrap();

        assert_eq!(response.choices.len(), 1);
        assert_eq!(response.choices[0].message.content.as_deref(), Some("Hi"));
        assert_eq!(response.usage.unwrap().completion_tokens, 1);
    }
}
