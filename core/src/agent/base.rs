//! Base agent trait

use super::config::AgentConfig;
use super::execution::AgentExecution;
use crate::error::Result;
use crate::llm::LlmMessage;
use async_trait::async_trait;

/// Result type for agent operations
pub type AgentResult<T> = Result<T>;

/// Anything that can answer a conversation
#[async_trait]
pub trait Agent: Send + Sync {
    /// Answer the last user message, given the preceding turns
    async fn respond(&mut self, messages: Vec<LlmMessage>) -> AgentResult<AgentExecution>;

    /// Get the agent's configuration
    fn config(&self) -> &AgentConfig;

    /// Get the agent's name/type
    fn agent_type(&self) -> &str;
}
