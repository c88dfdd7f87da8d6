//! Google Gemini client implementation

use crate::config::ResolvedLlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::message::tool_name_for_id;
use crate::llm::{
    ChatOptions, ContentBlock, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageContent,
    MessageRole, ToolDefinition, Usage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Schema keywords the Gemini function declaration format rejects
const UNSUPPORTED_SCHEMA_KEYS: &[&str] = &["additionalProperties", "default", "$schema"];

/// Google Gemini client using the `generateContent` endpoint
pub struct GoogleClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    top_p: Option<f32>,
}

impl GoogleClient {
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: "No API key found for Google".to_string(),
            }
            .into());
        }

        Ok(Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.params.max_tokens,
            temperature: config.params.temperature,
            top_p: config.params.top_p,
        })
    }

    fn build_request(
        &self,
        messages: &[LlmMessage],
        tools: Option<Vec<ToolDefinition>>,
        options: ChatOptions,
    ) -> GeminiRequest {
        let mut system_parts = Vec::new();
        let mut contents: Vec<GeminiContent> = Vec::new();

        for message in messages {
            let role = match message.role {
                MessageRole::System => {
                    if let Some(text) = message.get_text() {
                        system_parts.push(json!({ "text": text }));
                    }
                    continue;
                }
                MessageRole::Assistant => "model",
                MessageRole::User | MessageRole::Tool => "user",
            };

            let parts: Vec<Value> = message
                .blocks()
                .into_iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } if text.is_empty() => None,
                    ContentBlock::Text { text } => Some(json!({ "text": text })),
                    ContentBlock::ToolUse { name, input, .. } => {
                        Some(json!({ "functionCall": { "name": name, "args": input } }))
                    }
                    ContentBlock::ToolResult {
                        tool_use_id,
                        content,
                        ..
                    } => {
                        let name = tool_name_for_id(messages, &tool_use_id).unwrap_or("tool");
                        Some(json!({
                            "functionResponse": {
                                "name": name,
                                "response": { "content": content }
                            }
                        }))
                    }
                })
                .collect();

            if parts.is_empty() {
                continue;
            }

            match contents.last_mut() {
                Some(last) if last.role == role => last.parts.extend(parts),
                _ => contents.push(GeminiContent { role, parts }),
            }
        }

        let tools = tools.filter(|t| !t.is_empty()).map(|t| {
            let declarations: Vec<Value> = t
                .into_iter()
                .map(|tool| {
                    let mut parameters = tool.function.parameters;
                    strip_unsupported_keys(&mut parameters);
                    json!({
                        "name": tool.function.name,
                        "description": tool.function.description,
                        "parameters": parameters,
                    })
                })
                .collect();
            vec![json!({ "functionDeclarations": declarations })]
        });

        GeminiRequest {
            contents,
            system_instruction: if system_parts.is_empty() {
                None
            } else {
                Some(json!({ "parts": system_parts }))
            },
            tools,
            generation_config: GenerationConfig {
                temperature: options.temperature.or(self.temperature),
                max_output_tokens: options.max_tokens.or(self.max_tokens),
                top_p: options.top_p.or(self.top_p),
                response_mime_type: options
                    .json_output
                    .then(|| "application/json".to_string()),
            },
        }
    }
}

fn strip_unsupported_keys(schema: &mut Value) {
    match schema {
        Value::Object(map) => {
            for key in UNSUPPORTED_SCHEMA_KEYS {
                map.remove(*key);
            }
            for value in map.values_mut() {
                strip_unsupported_keys(value);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(strip_unsupported_keys),
        _ => {}
    }
}

#[async_trait]
impl LlmClient for GoogleClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let request = self.build_request(&messages, tools, options.unwrap_or_default());

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini API call failed with HTTP {}", status);
            return Err(LlmError::ApiError {
                status,
                message: error_text,
            }
            .into());
        }

        let gemini_response: GeminiResponse =
            response.json().await.map_err(|e| LlmError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })?;

        convert_response(gemini_response, &self.model)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "google"
    }
}

fn convert_response(response: GeminiResponse, model: &str) -> Result<LlmResponse> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse {
            message: "No candidates in response".to_string(),
        })?;

    // Gemini does not assign ids to function calls
    let blocks: Vec<ContentBlock> = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| {
            if let Some(call) = part.function_call {
                Some(ContentBlock::ToolUse {
                    id: format!("call_{}", uuid::Uuid::new_v4().simple()),
                    name: call.name,
                    input: call.args.unwrap_or_else(|| json!({})),
                })
            } else {
                part.text.map(|text| ContentBlock::Text { text })
            }
        })
        .collect();

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
        candidate.finish_reason.map(|reason| match reason.as_str() {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::Length,
            "SAFETY" | "RECITATION" => FinishReason::ContentFilter,
            _ => FinishReason::Other(reason),
        })
    };

    let usage = response.usage_metadata.map(|u| Usage {
        prompt_tokens: u.prompt_token_count,
        completion_tokens: u.candidates_token_count,
        total_tokens: u.total_token_count,
    });

    Ok(LlmResponse {
        message: LlmMessage {
            role: MessageRole::Assistant,
            content,
            metadata: None,
        },
        usage,
        model: model.to_string(),
        finish_reason,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    args: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelProvider;
    use crate::llm::FunctionDefinition;

    fn client() -> GoogleClient {
        let config = ResolvedLlmConfig::new(
            ModelProvider::Google,
            "https://generativelanguage.googleapis.com/v1beta".to_string(),
            "test-key".to_string(),
            "gemini-pro".to_string(),
        );
        GoogleClient::new(&config).unwrap()
    }

    #[test]
    fn test_function_response_uses_tool_name() {
        let messages = vec![
            LlmMessage::system("Cycling assistant"),
            LlmMessage::user("Routes?"),
            LlmMessage {
                role: MessageRole::Assistant,
                content: MessageContent::MultiModal(vec![ContentBlock::ToolUse {
                    id: "call_a".to_string(),
                    name: "user_strava_routes".to_string(),
                    input: json!({}),
                }]),
                metadata: None,
            },
            LlmMessage::tool_result("call_a", "[]", false),
        ];
        let tools = vec![ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: "user_strava_routes".to_string(),
                description: "List routes".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {"max_routes": {"type": "integer", "default": 5}},
                    "additionalProperties": false
                }),
            },
        }];

        let request = client().build_request(&messages, Some(tools), ChatOptions::default());
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Cycling assistant");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(
            body["contents"][2]["parts"][0]["functionResponse"]["name"],
            "user_strava_routes"
        );
        let params = &body["tools"][0]["functionDeclarations"][0]["parameters"];
        assert!(params.get("additionalProperties").is_none());
        assert!(params["properties"]["max_routes"].get("default").is_none());
    }

    #[test]
    fn test_convert_function_call_response() {
        let raw = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"functionCall": {"name": "get_weather_now", "args": {"city": "Annecy"}}}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 5, "candidatesTokenCount": 3, "totalTokenCount": 8}
        });
        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        let converted = convert_response(response, "gemini-pro").unwrap();

        assert_eq!(converted.finish_reason, Some(FinishReason::ToolCalls));
        let uses = converted.message.get_tool_uses();
        assert_eq!(uses.len(), 1);
        match uses[0] {
            ContentBlock::ToolUse { id, name, .. } => {
                assert!(id.starts_with("call_"));
                assert_eq!(name, "get_weather_now");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_empty_candidates_is_an_error() {
        let response: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        assert!(convert_response(response, "gemini-pro").is_err());
    }
}
