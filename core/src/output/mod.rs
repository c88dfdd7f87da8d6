//! Output abstraction layer for agent turns
//!
//! Core only emits events; the CLI decides how they are shown.

use crate::tools::{ToolCall, ToolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error type returned by output handlers
pub type OutputResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Null output handler that discards all events
pub struct NullOutput;

#[async_trait]
impl AgentOutput for NullOutput {
    async fn emit_event(&self, _event: AgentEvent) -> OutputResult {
        Ok(())
    }
}

/// Status of tool execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolExecutionStatus {
    Executing,
    Success,
    Error,
}

/// Tool execution information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecutionInfo {
    /// Tool call id as issued by the model
    pub execution_id: String,
    pub tool_name: String,
    pub parameters: BTreeMap<String, serde_json::Value>,
    pub status: ToolExecutionStatus,
    /// Tool result (if completed)
    pub result: Option<ToolResult>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ToolExecutionInfo {
    pub fn from_call(
        tool_call: &ToolCall,
        status: ToolExecutionStatus,
        result: Option<&ToolResult>,
    ) -> Self {
        let parameters = match &tool_call.parameters {
            serde_json::Value::Object(map) => {
                map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
            }
            serde_json::Value::Null => BTreeMap::new(),
            other => BTreeMap::from([("raw_parameters".to_string(), other.clone())]),
        };

        Self {
            execution_id: tool_call.id.clone(),
            tool_name: tool_call.name.clone(),
            parameters,
            status,
            result: result.cloned(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Parameters rendered as `key=value` pairs for a status line
    pub fn parameter_summary(&self) -> String {
        self.parameters
            .iter()
            .map(|(key, value)| match value {
                serde_json::Value::String(s) => format!("{}={}", key, s),
                other => format!("{}={}", key, other),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

/// Information about the turn being answered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentExecutionContext {
    /// Agent identifier
    pub agent_id: String,
    /// The latest user input
    pub input: String,
    pub max_steps: usize,
    pub current_step: usize,
    pub execution_time: std::time::Duration,
    pub token_usage: TokenUsage,
}

/// Events that can be emitted while the agent answers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AgentEvent {
    ExecutionStarted {
        context: AgentExecutionContext,
    },
    ExecutionCompleted {
        context: AgentExecutionContext,
        success: bool,
        summary: String,
    },
    /// A model call is about to be made
    StepStarted {
        step_number: usize,
    },
    ToolExecutionStarted {
        tool_info: ToolExecutionInfo,
    },
    ToolExecutionCompleted {
        tool_info: ToolExecutionInfo,
    },
    /// Token usage updated (emitted after each LLM call)
    TokenUsageUpdated {
        token_usage: TokenUsage,
    },
    Message {
        level: MessageLevel,
        content: String,
    },
}

/// Message severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageLevel {
    Debug,
    Info,
    Normal,
    Warning,
    Error,
}

/// Abstract output interface for agent execution
#[async_trait]
pub trait AgentOutput: Send + Sync {
    /// Emit an agent event
    async fn emit_event(&self, event: AgentEvent) -> OutputResult;

    /// Emit a message with specified level
    async fn emit_message(&self, level: MessageLevel, content: &str) -> OutputResult {
        self.emit_event(AgentEvent::Message {
            level,
            content: content.to_string(),
        })
        .await
    }

    async fn debug(&self, content: &str) -> OutputResult {
        self.emit_message(MessageLevel::Debug, content).await
    }

    async fn emit_token_update(&self, token_usage: TokenUsage) -> OutputResult {
        self.emit_event(AgentEvent::TokenUsageUpdated { token_usage })
            .await
    }

    async fn info(&self, content: &str) -> OutputResult {
        self.emit_message(MessageLevel::Info, content).await
    }

    async fn warning(&self, content: &str) -> OutputResult {
        self.emit_message(MessageLevel::Warning, content).await
    }

    async fn error(&self, content: &str) -> OutputResult {
        self.emit_message(MessageLevel::Error, content).await
    }

    async fn normal(&self, content: &str) -> OutputResult {
        self.emit_message(MessageLevel::Normal, content).await
    }
}
