//! # Prompt Runner
//!
//! Sends one prompt to a large language model and prints the answer.
//!
//! ## Features
//!
//! - **Client configuration**: provider, model, timeout, log level and endpoint
//! - **Providers**: a local Ollama server or any OpenAI-compatible API
//! - **Prompts**: body text plus ordered directives, context and length limits
//! - **Runner**: a single bounded generate call with deadline and cancellation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prompt_runner::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LLMClientBuilder::new()
//!         .with_provider("ollama")
//!         .with_model("gemma3")
//!         .with_timeout(Duration::from_secs(100))
//!         .into_config();
//!
//!     let prompt = Prompt::new("Why is the sky blue?")
//!         .with_directives(["Answer in one paragraph"]);
//!
//!     let mut runner = Runner::new();
//!     runner
//!         .run(config, &prompt, &GenerateContext::background(), &mut std::io::stdout())
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!

pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod prompt;
pub mod runner;

// Re-exports for convenient usage
pub use config::{ClientConfig, ConfigError, LogLevel, Provider};
pub use error::RunnerError;
pub use llm::{LLMClient, LLMClientBuilder, LLMError, OllamaClient, OpenAIClient, Response, Usage};
pub use prompt::Prompt;
pub use runner::{GenerateContext, RunState, Runner};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::config::{ClientConfig, LogLevel};
    pub use crate::llm::{LLMClient, LLMClientBuilder, Response};
    pub use crate::prompt::Prompt;
    pub use crate::runner::{GenerateContext, Runner};
    pub use crate::RunnerError;
}
