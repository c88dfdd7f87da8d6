//! # Cadence Core
//!
//! Core library for Cadence, a conversational cycling assistant.
//!
//! Provides the LLM provider clients, the cycling lookup tools, climb
//! extraction from web pages, and the tool-calling agent that ties them
//! together. Configuration arrives fully resolved from the caller.

pub mod agent;
pub mod config;
pub mod error;
pub mod extraction;
pub mod llm;
pub mod output;
pub mod tools;

#[cfg(test)]
pub(crate) mod test_support;

pub use agent::{Agent, AgentBuilder, AgentConfig, AgentCore, AgentExecution};
pub use config::{ExtractionConfig, ModelParams, ModelProvider, ResolvedLlmConfig, ToolCredentials};
pub use error::{Error, Result};
pub use extraction::{Climb, ClimbExtractor, ExtractionOutcome};
pub use tools::{ToolContext, ToolRegistry};

/// Current version of the cadence-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
