//! # Minimal Example
//!
//! Runs a prompt against a local Ollama server with only the provider and
//! model set. Timeout, endpoint and log level keep their defaults.
//!
//! ## Usage
//!
//! ```bash
//! ollama pull gemma3
//! cargo run --example minimal
//! ```

use anyhow::Context;
use prompt_runner::logging;
use prompt_runner::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClientConfig::new("ollama", "gemma3");
    logging::init(config.effective_log_level());

    let mut runner = Runner::new();
    runner
        .configure(config)
        .context("Failed to create LLM client")?;

    let prompt = runner.build_prompt(
        "Explain the difference between a process and a thread.",
        Vec::<String>::new(),
    );

    let response = runner
        .generate(&GenerateContext::background(), &prompt)
        .await
        .context("Failed to generate response")?;

    runner.report(&response, &mut std::io::stdout())?;

    if let Some(usage) = response.usage {
        eprintln!(
            "\nToken usage: {} input + {} output",
            usage.input_tokens, usage.output_tokens
        );
    }

    Ok(())
}
