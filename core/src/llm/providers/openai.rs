//! OpenAI and Azure OpenAI client implementation using async-openai library

use crate::config::{ModelProvider, ResolvedLlmConfig};
use crate::error::{ConfigError, LlmError, Result};
use crate::llm::{
    ChatOptions, ContentBlock, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageContent,
    MessageRole, ToolDefinition, Usage,
};
use async_openai::{
    config::{AzureConfig, OpenAIConfig},
    error::OpenAIError,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessage,
        ChatCompletionRequestAssistantMessageContent, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestToolMessage,
        ChatCompletionRequestToolMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse, FunctionObject,
        ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::Value;

/// The two flavours of endpoint async-openai can talk to
enum Backend {
    OpenAi(Client<OpenAIConfig>),
    Azure(Client<AzureConfig>),
}

impl Backend {
    async fn create(
        &self,
        request: CreateChatCompletionRequest,
    ) -> std::result::Result<CreateChatCompletionResponse, OpenAIError> {
        match self {
            Backend::OpenAi(client) => client.chat().create(request).await,
            Backend::Azure(client) => client.chat().create(request).await,
        }
    }
}

/// OpenAI client using async-openai library
pub struct OpenAiClient {
    backend: Backend,
    model: String,
    provider: ModelProvider,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    top_p: Option<f32>,
}

impl OpenAiClient {
    /// Create a new OpenAI or Azure OpenAI client from resolved LLM config
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: format!("No API key found for {}", config.provider),
            }
            .into());
        }

        let backend = match config.provider {
            ModelProvider::AzureOpenAI => {
                let azure = config.azure.as_ref().ok_or_else(|| ConfigError::MissingField {
                    field: "azure.deployment_id".to_string(),
                })?;
                let azure_config = AzureConfig::new()
                    .with_api_base(&config.base_url)
                    .with_api_key(&config.api_key)
                    .with_api_version(&azure.api_version)
                    .with_deployment_id(&azure.deployment_id);
                Backend::Azure(Client::with_config(azure_config))
            }
            _ => {
                let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);
                if config.base_url != "https://api.openai.com/v1" {
                    openai_config = openai_config.with_api_base(&config.base_url);
                }
                Backend::OpenAi(Client::with_config(openai_config))
            }
        };

        Ok(Self {
            backend,
            model: config.model.clone(),
            provider: config.provider,
            temperature: config.params.temperature,
            max_tokens: config.params.max_tokens,
            top_p: config.params.top_p,
        })
    }

    /// Convert our internal message format to async-openai format
    fn convert_messages(
        &self,
        messages: Vec<LlmMessage>,
    ) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut converted = Vec::new();

        for message in messages {
            match message.role {
                MessageRole::System => {
                    let content = message.get_text().unwrap_or_default();
                    converted.push(ChatCompletionRequestMessage::System(
                        ChatCompletionRequestSystemMessage {
                            content: content.into(),
                            name: None,
                        },
                    ));
                }
                MessageRole::User => {
                    let content = message.get_text().unwrap_or_default();
                    converted.push(ChatCompletionRequestMessage::User(
                        ChatCompletionRequestUserMessage {
                            content: content.into(),
                            name: None,
                        },
                    ));
                }
                MessageRole::Assistant => {
                    let mut content = String::new();
                    let mut tool_calls = Vec::new();

                    for block in message.blocks() {
                        match block {
                            ContentBlock::Text { text } => {
                                if !content.is_empty() {
                                    content.push('\n');
                                }
                                content.push_str(&text);
                            }
                            ContentBlock::ToolUse { id, name, input } => {
                                tool_calls.push(ChatCompletionMessageToolCall {
                                    id,
                                    r#type: ChatCompletionToolType::Function,
                                    function: async_openai::types::FunctionCall {
                                        name,
                                        arguments: input.to_string(),
                                    },
                                });
                            }
                            ContentBlock::ToolResult { .. } => {}
                        }
                    }

                    converted.push(ChatCompletionRequestMessage::Assistant(
                        ChatCompletionRequestAssistantMessage {
                            content: if content.is_empty() {
                                None
                            } else {
                                Some(ChatCompletionRequestAssistantMessageContent::Text(content))
                            },
                            tool_calls: if tool_calls.is_empty() {
                                None
                            } else {
                                Some(tool_calls)
                            },
                            ..Default::default()
                        },
                    ));
                }
                MessageRole::Tool => {
                    let mut pushed_any = false;
                    for block in message.blocks() {
                        if let ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                            ..
                        } = block
                        {
                            converted.push(ChatCompletionRequestMessage::Tool(
                                ChatCompletionRequestToolMessage {
                                    content: ChatCompletionRequestToolMessageContent::Text(content),
                                    tool_call_id: tool_use_id,
                                },
                            ));
                            pushed_any = true;
                        }
                    }
                    if !pushed_any {
                        return Err(LlmError::InvalidRequest {
                            message: "Tool message must contain ToolResult".to_string(),
                        }
                        .into());
                    }
                }
            }
        }

        Ok(converted)
    }

    /// Convert our tool definitions to async-openai format
    fn convert_tools(&self, tools: Vec<ToolDefinition>) -> Vec<ChatCompletionTool> {
        tools
            .into_iter()
            .map(|tool| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: tool.function.name,
                    description: Some(tool.function.description),
                    parameters: Some(tool.function.parameters),
                    strict: None,
                },
            })
            .collect()
    }

    /// Convert async-openai response to our internal format
    fn convert_response(&self, response: CreateChatCompletionResponse) -> Result<LlmResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse {
                message: "No choices in response".to_string(),
            })?;

        let mut blocks = Vec::new();
        if let Some(content) = choice.message.content {
            if !content.is_empty() {
                blocks.push(ContentBlock::Text { text: content });
            }
        }
        for tool_call in choice.message.tool_calls.unwrap_or_default() {
            let function = tool_call.function;
            let args: Value = serde_json::from_str(&function.arguments)
                .unwrap_or_else(|_| Value::String(function.arguments.clone()));
            blocks.push(ContentBlock::ToolUse {
                id: tool_call.id,
                name: function.name,
                input: args,
            });
        }

        let content = match blocks.as_slice() {
            [] => MessageContent::Text(String::new()),
            [ContentBlock::Text { text }] => MessageContent::Text(text.clone()),
            _ => MessageContent::MultiModal(blocks),
        };

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let finish_reason = choice.finish_reason.map(|reason| match reason {
            async_openai::types::FinishReason::Stop => FinishReason::Stop,
            async_openai::types::FinishReason::Length => FinishReason::Length,
            async_openai::types::FinishReason::ToolCalls => FinishReason::ToolCalls,
            async_openai::types::FinishReason::ContentFilter => FinishReason::ContentFilter,
            async_openai::types::FinishReason::FunctionCall => FinishReason::ToolCalls,
        });

        Ok(LlmResponse {
            message: LlmMessage {
                role: MessageRole::Assistant,
                content,
                metadata: None,
            },
            usage,
            model: response.model,
            finish_reason,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let converted_messages = self.convert_messages(messages)?;
        let converted_tools = tools
            .filter(|t| !t.is_empty())
            .map(|t| self.convert_tools(t));

        if let Some(ref tools) = converted_tools {
            tracing::debug!("{} request with {} tools enabled", self.provider, tools.len());
        }

        let options = options.unwrap_or_default();
        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(&self.model);
        request_builder.messages(converted_messages);

        if let Some(tools) = converted_tools {
            request_builder.tools(tools);
        }
        if let Some(max_tokens) = options.max_tokens.or(self.max_tokens) {
            request_builder.max_tokens(max_tokens);
        }
        if let Some(temperature) = options.temperature.or(self.temperature) {
            request_builder.temperature(temperature);
        }
        if let Some(top_p) = options.top_p.or(self.top_p) {
            request_builder.top_p(top_p);
        }
        if options.json_output {
            request_builder.response_format(ResponseFormat::JsonObject);
        }

        let request = request_builder.build().map_err(|e| {
            tracing::error!("Failed to build {} request: {}", self.provider, e);
            LlmError::InvalidRequest {
                message: format!("Failed to build request: {}", e),
            }
        })?;

        let response = self.backend.create(request).await.map_err(|e| {
            tracing::error!("{} API call failed: {}", self.provider, e);
            LlmError::ApiError {
                status: 500, // async-openai doesn't expose status codes directly
                message: e.to_string(),
            }
        })?;

        let result = self.convert_response(response)?;
        let tool_use_count = result.message.get_tool_uses().len();
        if tool_use_count > 0 {
            tracing::debug!("{} response contains {} tool calls", self.provider, tool_use_count);
        }

        Ok(result)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        self.provider.as_str()
    }
}
