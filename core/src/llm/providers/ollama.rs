//! Ollama client implementation for locally served models

use crate::config::ResolvedLlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::{
    ChatOptions, ContentBlock, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageContent,
    MessageRole, ToolDefinition, Usage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Ollama client talking to `/api/chat` without streaming
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    top_p: Option<f32>,
}

impl OllamaClient {
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.params.temperature,
            max_tokens: config.params.max_tokens,
            top_p: config.params.top_p,
        })
    }

    fn build_request(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: ChatOptions,
    ) -> OllamaRequest {
        let mut converted = Vec::new();

        for message in messages {
            match message.role {
                MessageRole::Tool => {
                    for block in message.blocks() {
                        if let ContentBlock::ToolResult { content, .. } = block {
                            converted.push(OllamaMessage {
                                role: "tool".to_string(),
                                content,
                                tool_calls: None,
                            });
                        }
                    }
                }
                role => {
                    let tool_calls: Vec<OllamaToolCall> = message
                        .get_tool_uses()
                        .into_iter()
                        .filter_map(|block| match block {
                            ContentBlock::ToolUse { name, input, .. } => Some(OllamaToolCall {
                                function: OllamaFunctionCall {
                                    name: name.clone(),
                                    arguments: input.clone(),
                                },
                            }),
                            _ => None,
                        })
                        .collect();
                    converted.push(OllamaMessage {
                        role: role.as_str().to_string(),
                        content: message.get_text().unwrap_or_default(),
                        tool_calls: if tool_calls.is_empty() {
                            None
                        } else {
                            Some(tool_calls)
                        },
                    });
                }
            }
        }

        let mut model_options = serde_json::Map::new();
        if let Some(temperature) = options.temperature.or(self.temperature) {
            model_options.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(max_tokens) = options.max_tokens.or(self.max_tokens) {
            model_options.insert("num_predict".to_string(), json!(max_tokens));
        }
        if let Some(top_p) = options.top_p.or(self.top_p) {
            model_options.insert("top_p".to_string(), json!(top_p));
        }

        OllamaRequest {
            model: self.model.clone(),
            messages: converted,
            stream: false,
            tools: tools.filter(|t| !t.is_empty()),
            format: options.json_output.then(|| "json".to_string()),
            options: if model_options.is_empty() {
                None
            } else {
                Some(Value::Object(model_options))
            },
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let request = self.build_request(messages, tools, options.unwrap_or_default());
        tracing::debug!("Ollama chat request to {} ({})", self.base_url, self.model);

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network {
                message: format!("Could not reach Ollama at {}: {}", self.base_url, e),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status,
                message: error_text,
            }
            .into());
        }

        let ollama_response: OllamaResponse =
            response.json().await.map_err(|e| LlmError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(convert_response(ollama_response))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }
}

fn convert_response(response: OllamaResponse) -> LlmResponse {
    let mut blocks = Vec::new();
    if !response.message.content.is_empty() {
        blocks.push(ContentBlock::Text {
            text: response.message.content,
        });
    }
    // Ollama tool calls carry no id
    for call in response.message.tool_calls.unwrap_or_default() {
        blocks.push(ContentBlock::ToolUse {
            id: format!("call_{}", uuid::Uuid::new_v4().simple()),
            name: call.function.name,
            input: call.function.arguments,
        });
    }

    let has_tool_use = blocks
        .iter()
        .any(|b| matches!(b, ContentBlock::ToolUse { .. }));

    let content = match blocks.as_slice() {
        [] => MessageContent::Text(String::new()),
        [ContentBlock::Text { text }] => MessageContent::Text(text.clone()),
        _ => MessageContent::MultiModal(blocks),
    };

    let finish_reason = if has_tool_use {
        Some(FinishReason::ToolCalls)
    } else {
        response.done_reason.map(|reason| match reason.as_str() {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            _ => FinishReason::Other(reason),
        })
    };

    let usage = match (response.prompt_eval_count, response.eval_count) {
        (None, None) => None,
        (prompt, completion) => {
            let prompt = prompt.unwrap_or(0);
            let completion = completion.unwrap_or(0);
            Some(Usage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            })
        }
    };

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
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    message: OllamaMessage,
    done_reason: Option<String>,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}
