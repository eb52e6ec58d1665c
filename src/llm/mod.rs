pub mod client;
pub mod ollama;
pub mod openai;

pub use client::{LLMClient, LLMClientBuilder, LLMError, Response, Usage};
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;
