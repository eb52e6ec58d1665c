pub mod context;
pub mod runner;

pub use context::GenerateContext;
pub use runner::{RunState, Runner, RESPONSE_PREFIX};
