//! Agent execution result structures

use crate::output::TokenUsage;
use serde::{Deserialize, Serialize};

/// Result of answering one turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentExecution {
    /// Final answer text
    pub final_result: String,

    /// Number of model calls made
    pub steps_executed: usize,

    /// Total execution time in milliseconds
    pub duration_ms: u64,

    /// Names of the tools called, in call order
    pub tools_used: Vec<String>,

    /// Tokens consumed across all model calls
    pub token_usage: TokenUsage,
}

impl AgentExecution {
    /// Create an execution result
    pub fn success(final_result: String, steps_executed: usize, duration_ms: u64) -> Self {
        Self {
            final_result,
            steps_executed,
            duration_ms,
            tools_used: Vec::new(),
            token_usage: TokenUsage::default(),
        }
    }

    pub fn with_tools_used(mut self, tools_used: Vec<String>) -> Self {
        self.tools_used = tools_used;
        self
    }

    pub fn with_token_usage(mut self, token_usage: TokenUsage) -> Self {
        self.token_usage = token_usage;
        self
    }
}
