//! Agent configuration structures

use super::prompt::PromptStyle;
use crate::config::ResolvedLlmConfig;
use crate::error::Result;
use crate::llm::LlmClient;
use crate::output::{AgentOutput, NullOutput};
use crate::tools::{ToolContext, ToolRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default limit on model calls per user turn
pub const DEFAULT_MAX_STEPS: usize = 8;

/// Configuration for an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum number of model calls per turn
    pub max_steps: usize,

    /// List of tools available to this agent
    pub tools: Vec<String>,

    /// Built-in prompt used when no custom prompt is set
    #[serde(default)]
    pub prompt_style: PromptStyle,

    /// Custom system prompt for the agent (optional)
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            tools: ToolRegistry::default()
                .list_tools()
                .into_iter()
                .map(str::to_string)
                .collect(),
            prompt_style: PromptStyle::default(),
            system_prompt: None,
        }
    }
}

/// Builder for creating agents with resolved LLM configuration
pub struct AgentBuilder {
    llm_config: ResolvedLlmConfig,
    llm_client: Option<Arc<dyn LlmClient>>,
    tool_context: ToolContext,
    agent_config: AgentConfig,
}

impl AgentBuilder {
    /// Create a new agent builder
    pub fn new(llm_config: ResolvedLlmConfig, tool_context: ToolContext) -> Self {
        Self {
            llm_config,
            llm_client: None,
            tool_context,
            agent_config: AgentConfig::default(),
        }
    }

    /// Set agent configuration
    pub fn with_agent_config(mut self, agent_config: AgentConfig) -> Self {
        self.agent_config = agent_config;
        self
    }

    /// Set maximum steps
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.agent_config.max_steps = max_steps;
        self
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.agent_config.tools = tools;
        self
    }

    /// Use an existing client instead of building one from the LLM config
    pub fn with_llm_client(mut self, llm_client: Arc<dyn LlmClient>) -> Self {
        self.llm_client = Some(llm_client);
        self
    }

    /// Build the agent with the given output handler
    pub fn build_with_output(self, output: Box<dyn AgentOutput>) -> Result<super::AgentCore> {
        let llm_client = match self.llm_client {
            Some(client) => client,
            None => crate::llm::create_client(&self.llm_config)?,
        };
        let tool_executor = ToolRegistry::default()
            .create_executor(&self.agent_config.tools, &self.tool_context);

        Ok(super::AgentCore::new(
            self.agent_config,
            llm_client,
            tool_executor,
            output,
        ))
    }

    /// Build the agent with null output
    pub fn build(self) -> Result<super::AgentCore> {
        self.build_with_output(Box::new(NullOutput))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_enables_all_tools() {
        let config = AgentConfig::default();
        assert_eq!(config.max_steps, 8);
        assert_eq!(config.tools.len(), 6);
        assert!(config.tools.contains(&"user_strava_routes".to_string()));
        assert_eq!(config.prompt_style, PromptStyle::Advanced);
        assert_eq!(config.system_prompt, None);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: AgentConfig =
            serde_json::from_str(r#"{"max_steps": 4, "tools": ["get_weather_now"]}"#).unwrap();
        assert_eq!(config.max_steps, 4);
        assert_eq!(config.prompt_style, PromptStyle::Advanced);

        let config: AgentConfig = serde_json::from_str(
            r#"{"max_steps": 4, "tools": [], "prompt_style": "basic", "system_prompt": "Hi"}"#,
        )
        .unwrap();
        assert_eq!(config.prompt_style, PromptStyle::Basic);
        assert_eq!(config.system_prompt.as_deref(), Some("Hi"));
    }
}
