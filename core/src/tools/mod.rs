//! Tool system and the built-in cycling tools

pub mod base;
pub mod builtin;
pub mod context;
mod http;
pub mod outcome;
pub mod registry;

pub use base::{Tool, ToolCall, ToolExample, ToolExecutor, ToolResult};
pub use context::{ToolContext, ToolEndpoints};
pub use outcome::SearchOutcome;
pub use registry::{ToolFactory, ToolRegistry};
