use std::process::ExitCode;
use std::time::Duration;

use prompt_runner::prelude::*;
use prompt_runner::logging;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    // Create the client configuration for a local Ollama server
    let config = LLMClientBuilder::new()
        .with_provider("ollama")
        .with_model("gemma3")
        .with_timeout(Duration::from_secs(100))
        .with_log_level(LogLevel::Info)
        .with_endpoint("http://127.0.0.1:11434")
        .into_config();

    logging::init(config.effective_log_level());

    let mut runner = Runner::new();

    let prompt = runner.build_prompt(
        "summarize this blog https://opentelemetry.io/blog/2025/otel-cicd-sig/",
        [
            "Keep the summary under 800 words",
            "Capture the main points",
            "Focus on the solution provided",
        ],
    );

    let ctx = GenerateContext::background();
    let mut stdout = std::io::stdout().lock();

    match runner.run(config, &prompt, &ctx, &mut stdout).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Failed to run prompt: {}", e);
            ExitCode::FAILURE
        }
    }
}
