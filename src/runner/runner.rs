use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use super::GenerateContext;
use crate::config::{ClientConfig, ConfigError};
use crate::error::RunnerError;
use crate::llm::{LLMClient, LLMClientBuilder, LLMError, Response};
use crate::prompt::Prompt;

/// Label written before the generated text.
pub const RESPONSE_PREFIX: &str = "Response: ";

/// Where a run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No client yet
    Unconfigured,
    /// Client built, nothing sent
    Configured,
    /// A response came back
    Requested,
    /// The response was written out
    Reported,
    /// A step failed
    Failed,
}

/// Drives one configure, prompt, generate, report sequence.
pub struct Runner {
    id: String,
    state: RunState,
    client: Option<Arc<dyn LLMClient>>,
    timeout: Option<Duration>,
}

impl Runner {
    /// Creates an unconfigured runner.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: RunState::Unconfigured,
            client: None,
            timeout: None,
        }
    }

    /// Unique identifier attached to this runner's log events.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Validates `config` and builds the client it describes.
    pub fn configure(&mut self, config: ClientConfig) -> Result<(), RunnerError> {
        if self.state != RunState::Unconfigured {
            return self.fail(RunnerError::OutOfOrder {
                operation: "configure",
                state: self.state,
            });
        }

        let timeout = config.timeout;
        match LLMClientBuilder::from_config(config).build() {
            Ok(client) => {
                self.install(client, timeout);
                Ok(())
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// Uses an already constructed client.
    pub fn configure_with(
        &mut self,
        client: Arc<dyn LLMClient>,
        timeout: Option<Duration>,
    ) -> Result<(), RunnerError> {
        if self.state != RunState::Unconfigured {
            return self.fail(RunnerError::OutOfOrder {
                operation: "configure",
                state: self.state,
            });
        }

        self.install(client, timeout);
        Ok(())
    }

    fn install(&mut self, client: Arc<dyn LLMClient>, timeout: Option<Duration>) {
        info!(
            run_id = %self.id,
            provider = %client.provider(),
            model = client.model(),
            timeout = ?timeout,
            "Client configured"
        );
        self.client = Some(client);
        self.timeout = timeout;
        self.state = RunState::Configured;
    }

    /// Builds the prompt for this run.
    pub fn build_prompt<I, S>(&self, text: impl Into<String>, directives: I) -> Prompt
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Prompt::new(text).with_directives(directives)
    }

    /// Sends `prompt` once, bounded by `ctx` and the configured timeout.
    pub async fn generate(
        &mut self,
        ctx: &GenerateContext,
        prompt: &Prompt,
    ) -> Result<Response, RunnerError> {
        let client = match self.client.clone() {
            Some(client) if self.state == RunState::Configured => client,
            Some(_) => {
                return self.fail(RunnerError::OutOfOrder {
                    operation: "generate",
                    state: self.state,
                });
            }
            None => return self.fail(ConfigError::NotConfigured.into()),
        };

        let ctx = match self.timeout {
            Some(timeout) => ctx.deadline_in(timeout),
            None => ctx.clone(),
        };

        let span = info_span!("generate", run_id = %self.id, model = client.model());
        let result = call_bounded(client.as_ref(), &ctx, prompt)
            .instrument(span)
            .await;

        match result {
            Ok(response) => {
                debug!(run_id = %self.id, chars = response.text.len(), "Response received");
                self.state = RunState::Requested;
                Ok(response)
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// Writes the response text to `out`.
    pub fn report<W: Write>(&mut self, response: &Response, out: &mut W) -> Result<(), RunnerError> {
        if self.state != RunState::Requested {
            return self.fail(RunnerError::OutOfOrder {
                operation: "report",
                state: self.state,
            });
        }

        let written = writeln!(out, "{}{}", RESPONSE_PREFIX, response.text).and_then(|_| out.flush());
        match written {
            Ok(()) => {
                self.state = RunState::Reported;
                Ok(())
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// Runs the whole pipeline: configure, generate, report.
    pub async fn run<W: Write>(
        &mut self,
        config: ClientConfig,
        prompt: &Prompt,
        ctx: &GenerateContext,
        out: &mut W,
    ) -> Result<Response, RunnerError> {
        self.configure(config)?;
        let response = self.generate(ctx, prompt).await?;
        self.report(&response, out)?;
        info!(run_id = %self.id, "Run completed");
        Ok(response)
    }

    fn fail<T>(&mut self, err: RunnerError) -> Result<T, RunnerError> {
        debug!(run_id = %self.id, state = ?self.state, error = %err, "Run failed");
        self.state = RunState::Failed;
        Err(err)
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

/// Races one generate call against the context's deadline and cancellation.
async fn call_bounded(
    client: &dyn LLMClient,
    ctx: &GenerateContext,
    prompt: &Prompt,
) -> Result<Response, LLMError> {
    if ctx.is_cancelled() {
        return Err(LLMError::Cancelled);
    }

    debug!("Calling LLM");

    let call = client.generate(prompt);
    match ctx.deadline() {
        Some(deadline) => {
            let budget = ctx.remaining().unwrap_or_default();
            tokio::select! {
                result = call => result,
                _ = tokio::time::sleep_until(deadline) => Err(LLMError::Timeout(budget)),
                _ = ctx.token().cancelled() => Err(LLMError::Cancelled),
            }
        }
        None => {
            tokio::select! {
                result = call => result,
                _ = ctx.token().cancelled() => Err(LLMError::Cancelled),
            }
        }
    }
}
