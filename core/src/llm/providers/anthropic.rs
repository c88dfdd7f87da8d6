//! Anthropic Claude client implementation

use crate::config::ResolvedLlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::{
    ChatOptions, ContentBlock, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageContent,
    MessageRole, ToolDefinition, Usage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude client
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    headers: HashMap<String, String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    top_p: Option<f32>,
}

impl AnthropicClient {
    /// Create a new Anthropic client
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: "No API key found for Anthropic".to_string(),
            }
            .into());
        }

        Ok(Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            headers: config.headers.clone(),
            max_tokens: config.params.max_tokens,
            temperature: config.params.temperature,
            top_p: config.params.top_p,
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let request = self.build_request(messages, tools, options);

        let mut builder = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json");
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Anthropic API call failed with HTTP {}", status);
            return Err(LlmError::ApiError {
                status,
                message: error_text,
            }
            .into());
        }

        let anthropic_response: AnthropicResponse =
            response.json().await.map_err(|e| LlmError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(convert_response(anthropic_response))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

impl AnthropicClient {
    fn build_request(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> AnthropicRequest {
        let options = options.unwrap_or_default();

        // System text goes in its own field; consecutive messages of the same
        // role are merged since the API expects alternating turns.
        let mut system_parts = Vec::new();
        let mut conversation: Vec<AnthropicMessage> = Vec::new();

        for message in messages {
            let role = match message.role {
                MessageRole::System => {
                    if let Some(text) = message.get_text() {
                        system_parts.push(text);
                    }
                    continue;
                }
                MessageRole::Assistant => "assistant",
                MessageRole::User | MessageRole::Tool => "user",
            };

            let blocks: Vec<AnthropicBlock> = message
                .blocks()
                .into_iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } if text.is_empty() => None,
                    ContentBlock::Text { text } => Some(AnthropicBlock::Text { text }),
                    ContentBlock::ToolUse { id, name, input } => {
                        Some(AnthropicBlock::ToolUse { id, name, input })
                    }
                    ContentBlock::ToolResult {
                        tool_use_id,
                        is_error,
                        content,
                    } => Some(AnthropicBlock::ToolResult {
                        tool_use_id,
                        content,
                        is_error,
                    }),
                })
                .collect();

            if blocks.is_empty() {
                continue;
            }

            match conversation.last_mut() {
                Some(last) if last.role == role => last.content.extend(blocks),
                _ => conversation.push(AnthropicMessage {
                    role,
                    content: blocks,
                }),
            }
        }

        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: options.max_tokens.or(self.max_tokens).unwrap_or(4096),
            temperature: options.temperature.or(self.temperature),
            top_p: options.top_p.or(self.top_p),
            system: if system_parts.is_empty() {
                None
            } else {
                Some(system_parts.join("\n\n"))
            },
            messages: conversation,
            tools: tools.filter(|t| !t.is_empty()).map(|t| {
                t.into_iter()
                    .map(|tool| AnthropicTool {
                        name: tool.function.name,
                        description: tool.function.description,
                        input_schema: tool.function.parameters,
                    })
                    .collect()
            }),
        }
    }
}

fn convert_response(response: AnthropicResponse) -> LlmResponse {
    let blocks: Vec<ContentBlock> = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            AnthropicBlock::Text { text } => Some(ContentBlock::Text { text }),
            AnthropicBlock::ToolUse { id, name, input } => {
                Some(ContentBlock::ToolUse { id, name, input })
            }
            AnthropicBlock::ToolResult { .. } | AnthropicBlock::Other => None,
        })
        .collect();

    let content = match blocks.as_slice() {
        [] => MessageContent::Text(String::new()),
        [ContentBlock::Text { text }] => MessageContent::Text(text.clone()),
        _ => MessageContent::MultiModal(blocks),
    };

    let usage = response.usage.map(|u| Usage {
        prompt_tokens: u.input_tokens,
        completion_tokens: u.output_tokens,
        total_tokens: u.input_tokens + u.output_tokens,
    });

    let finish_reason = response.stop_reason.map(|reason| match reason.as_str() {
        "end_turn" | "stop_sequence" => FinishReason::Stop,
        "max_tokens" => FinishReason::Length,
        "tool_use" => FinishReason::ToolCalls,
        _ => FinishReason::Other(reason),
    });

    LlmResponse {
        message: LlmMessage {
            role: MessageRole::Assistant,
            content,
            metadata: None,
        },
        usage,
        model: response.model,
        finish_reason,
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    model: String,
    content: Vec<AnthropicBlock>,
    stop_reason: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}
