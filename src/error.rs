//! Error types for the prompt runner.

use thiserror::Error;

/// Fatal errors that end a run.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The client rejected the configured options
    #[error("Configuration error: {0}")]
    Configuration(#[from] crate::config::ConfigError),

    /// The generate call failed
    #[error("Generation error: {0}")]
    Generation(#[from] crate::llm::LLMError),

    /// A step was invoked from the wrong state
    #[error("cannot {operation} while {state:?}")]
    OutOfOrder {
        operation: &'static str,
        state: crate::runner::RunState,
    },

    /// Writing the response failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    /// Whether the failure is attributed to a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RunnerError::Generation(e) if e.is_timeout())
    }
}
