//! Diagnostic output.

use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

/// Builds the filter for `level`, applied to this crate and its HTTP stack.
pub fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::new(level.as_str())
}

/// Installs a global fmt subscriber writing to stderr.
///
/// Returns `false` if a subscriber was already installed.
pub fn init(level: LogLevel) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
