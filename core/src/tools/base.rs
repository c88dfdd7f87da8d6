//! Base tool traits and structures

use crate::error::{Result, ToolError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Trait for all tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the name of the tool
    fn name(&self) -> &str;

    /// Get the description of the tool
    fn description(&self) -> &str;

    /// Get the JSON schema for the tool's parameters
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given parameters
    async fn execute(&self, call: ToolCall) -> Result<ToolResult>;

    /// Get examples of how to use this tool
    fn examples(&self) -> Vec<ToolExample> {
        Vec::new()
    }
}

/// A call to a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,

    /// Name of the tool to call
    pub name: String,

    /// Parameters to pass to the tool
    pub parameters: serde_json::Value,
}

/// Result of a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this is a result for
    pub tool_call_id: String,

    /// Whether the execution was successful
    pub success: bool,

    /// Result content, as handed back to the model
    pub content: String,

    /// Optional structured data
    pub data: Option<serde_json::Value>,

    /// Execution duration in milliseconds
    pub duration_ms: Option<u64>,
}

/// Example usage of a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExample {
    /// Description of what this example does
    pub description: String,

    /// Example parameters
    pub parameters: serde_json::Value,

    /// Expected result description
    pub expected_result: String,
}

/// Tool executor that manages tool execution
pub struct ToolExecutor {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new<S: Into<String>>(name: S, parameters: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            parameters,
        }
    }

    /// Create a tool call with a known id, as issued by the model
    pub fn with_id<S: Into<String>>(id: S, name: S, parameters: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parameters,
        }
    }

    /// Get a parameter value by key
    pub fn get_parameter<T>(&self, key: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = self
            .parameters
            .get(key)
            .filter(|v| !v.is_null())
            .ok_or_else(|| ToolError::InvalidParameters {
                message: format!("Missing parameter: {}", key),
            })?;

        serde_json::from_value(value.clone()).map_err(|_| {
            ToolError::InvalidParameters {
                message: format!("Invalid parameter type for: {}", key),
            }
            .into()
        })
    }

    /// Get a parameter value by key with a default
    pub fn get_parameter_or<T>(&self, key: &str, default: T) -> T
    where
        T: for<'de> Deserialize<'de>,
    {
        self.get_parameter(key).unwrap_or(default)
    }

    /// Get a required, non-blank string parameter
    pub fn get_text(&self, key: &str) -> Result<String> {
        let value: String = self.get_parameter(key)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ToolError::InvalidParameters {
                message: format!("Parameter '{}' must not be empty", key),
            }
            .into());
        }
        Ok(trimmed.to_string())
    }
}

impl ToolResult {
    /// Create a successful result
    pub fn success<S: Into<String>>(tool_call_id: S, content: S) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            success: true,
            content: content.into(),
            data: None,
            duration_ms: None,
        }
    }

    /// Create a successful result whose content is the JSON form of `value`
    pub fn json<T: Serialize>(tool_call_id: &str, value: &T) -> Result<Self> {
        let data = serde_json::to_value(value)?;
        let content = serde_json::to_string_pretty(&data)?;
        Ok(Self::success(tool_call_id.to_string(), content).with_data(data))
    }

    /// Create an error result
    pub fn error<S: Into<String>>(tool_call_id: S, error: S) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            success: false,
            content: format!("Error: {}", error.into()),
            data: None,
            duration_ms: None,
        }
    }

    /// Set structured data
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Set execution duration
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

impl ToolExecutor {
    /// Create a new tool executor
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool
    pub fn register_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name
    pub fn get_tool(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// List all available tools, sorted by name
    pub fn list_tools(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Execute a tool call.
    ///
    /// Failures inside the tool are folded into an error result so the model
    /// can see them; only an unknown tool name is returned as `Err`.
    pub async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let tool = self
            .get_tool(&call.name)
            .ok_or_else(|| ToolError::NotFound {
                name: call.name.clone(),
            })?;

        let start_time = std::time::Instant::now();
        let call_id = call.id.clone();
        let name = call.name.clone();
        let result = tool.execute(call).await;
        let duration = start_time.elapsed().as_millis() as u64;

        match result {
            Ok(mut result) => {
                result.duration_ms = Some(duration);
                Ok(result)
            }
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", name, e);
                Ok(ToolResult::error(call_id, e.to_string()).with_duration(duration))
            }
        }
    }

    /// Get tool definitions for LLM function calling
    pub fn get_tool_definitions(&self) -> Vec<crate::llm::ToolDefinition> {
        self.tools
            .values()
            .map(|tool| crate::llm::ToolDefinition {
                tool_type: "function".to_string(),
                function: crate::llm::FunctionDefinition {
                    name: tool.name().to_string(),
                    description: tool.description().to_string(),
                    parameters: tool.parameters_schema(),
                },
            })
            .collect()
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the city back"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"city": {"type": "string"}}})
        }

        async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
            if call.get_parameter_or("fail", false) {
                return Err(ConfigError::missing_credential("SERPAPI_KEY").into());
            }
            let city = call.get_text("city")?;
            Ok(ToolResult::success(call.id, city))
        }
    }

    fn executor() -> ToolExecutor {
        let mut executor = ToolExecutor::new();
        executor.register_tool(Box::new(EchoTool));
        executor
    }

    #[tokio::test]
    async fn test_execute_success_sets_duration() {
        let result = executor()
            .execute(ToolCall::new("echo", json!({"city": "  Lyon "})))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.content, "Lyon");
        assert!(result.duration_ms.is_some());
    }

    #[tokio::test]
    async fn test_tool_failure_becomes_error_result() {
        let call = ToolCall::with_id("call_7", "echo", json!({"fail": true}));
        let result = executor().execute(call).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.tool_call_id, "call_7");
        assert!(result.content.contains("Missing SERPAPI_KEY environment variable"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error() {
        let err = executor()
            .execute(ToolCall::new("teleport", json!({})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("teleport"));
    }

    #[test]
    fn test_blank_and_null_parameters_are_rejected() {
        let call = ToolCall::new("echo", json!({"city": "   ", "locality": null}));
        assert!(call.get_text("city").is_err());
        assert!(call.get_parameter::<String>("locality").is_err());
        assert_eq!(call.get_parameter_or("days", 3u32), 3);
    }

    #[test]
    fn test_json_result_carries_data() {
        let result = ToolResult::json("id", &vec![json!({"message": "none"})]).unwrap();
        assert_eq!(result.data.unwrap()[0]["message"], "none");
        assert!(result.content.contains("\"message\""));
    }
}
