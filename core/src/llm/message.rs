//! LLM message structures

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Represents a message in an LLM conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmMessage {
    /// Role of the message sender
    pub role: MessageRole,

    /// Content of the message
    pub content: MessageContent,

    /// Optional metadata
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

/// Role of the message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message (instructions)
    System,

    /// User message (human input)
    User,

    /// Assistant message (AI response)
    Assistant,

    /// Tool message (tool execution result)
    Tool,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        }
    }
}

/// Content of a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),

    /// Structured content with text, tool calls and tool results
    MultiModal(Vec<ContentBlock>),
}

/// A block of content within a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content
    Text { text: String },

    /// Tool use request
    ToolUse {
        /// Unique identifier for this tool use
        id: String,
        /// Name of the tool to use
        name: String,
        /// Input parameters for the tool
        input: serde_json::Value,
    },

    /// Tool result
    ToolResult {
        /// ID of the tool use this is a result for
        tool_use_id: String,
        /// Whether the tool execution was successful
        is_error: Option<bool>,
        /// Result content
        content: String,
    },
}

impl LlmMessage {
    fn text(role: MessageRole, content: String) -> Self {
        Self {
            role,
            content: MessageContent::Text(content),
            metadata: None,
        }
    }

    /// Create a new system message
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::text(MessageRole::System, content.into())
    }

    /// Create a new user message
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::text(MessageRole::User, content.into())
    }

    /// Create a new assistant message
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::text(MessageRole::Assistant, content.into())
    }

    /// Create a tool message carrying the result of one tool call
    pub fn tool_result<S: Into<String>>(tool_use_id: S, content: S, is_error: bool) -> Self {
        Self {
            role: MessageRole::Tool,
            content: MessageContent::MultiModal(vec![ContentBlock::ToolResult {
                tool_use_id: tool_use_id.into(),
                is_error: Some(is_error),
                content: content.into(),
            }]),
            metadata: None,
        }
    }

    /// Get the text content of the message
    pub fn get_text(&self) -> Option<String> {
        match &self.content {
            MessageContent::Text(text) => Some(text.clone()),
            MessageContent::MultiModal(blocks) => {
                let text_parts: Vec<&str> = blocks
                    .iter()
                    .filter_map(|block| match block {
                        ContentBlock::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();
                if text_parts.is_empty() {
                    None
                } else {
                    Some(text_parts.join("\n"))
                }
            }
        }
    }

    /// Check if the message contains tool use
    pub fn has_tool_use(&self) -> bool {
        match &self.content {
            MessageContent::Text(_) => false,
            MessageContent::MultiModal(blocks) => blocks
                .iter()
                .any(|block| matches!(block, ContentBlock::ToolUse { .. })),
        }
    }

    /// Extract tool use blocks from the message
    pub fn get_tool_uses(&self) -> Vec<&ContentBlock> {
        match &self.content {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::MultiModal(blocks) => blocks
                .iter()
                .filter(|block| matches!(block, ContentBlock::ToolUse { .. }))
                .collect(),
        }
    }

    /// Blocks of the message, treating plain text as a single text block
    pub fn blocks(&self) -> Vec<ContentBlock> {
        match &self.content {
            MessageContent::Text(text) => vec![ContentBlock::Text { text: text.clone() }],
            MessageContent::MultiModal(blocks) => blocks.clone(),
        }
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

/// Find the tool name for a tool use id among earlier assistant messages
pub(crate) fn tool_name_for_id<'a>(messages: &'a [LlmMessage], id: &str) -> Option<&'a str> {
    messages.iter().rev().find_map(|message| match &message.content {
        MessageContent::MultiModal(blocks) => blocks.iter().find_map(|block| match block {
            ContentBlock::ToolUse {
                id: use_id, name, ..
            } if use_id == id => Some(name.as_str()),
            _ => None,
        }),
        MessageContent::Text(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_multimodal_text_and_tool_uses() {
        let message = LlmMessage {
            role: MessageRole::Assistant,
            content: MessageContent::MultiModal(vec![
                ContentBlock::Text {
                    text: "Let me check the weather in Girona...".to_string(),
                },
                ContentBlock::ToolUse {
                    id: "call_1".to_string(),
                    name: "get_weather_now".to_string(),
                    input: json!({"city": "Girona"}),
                },
            ]),
            metadata: None,
        };

        assert!(message.has_tool_use());
        assert_eq!(message.get_tool_uses().len(), 1);
        assert_eq!(
            message.get_text().as_deref(),
            Some("Let me check the weather in Girona...")
        );
        assert_eq!(
            tool_name_for_id(std::slice::from_ref(&message), "call_1"),
            Some("get_weather_now")
        );
    }

    #[test]
    fn test_tool_result_message_has_no_text() {
        let message = LlmMessage::tool_result("call_1", "Sunny", false);
        assert_eq!(message.role, MessageRole::Tool);
        assert!(message.get_text().is_none());
        assert!(!message.has_tool_use());
    }
}
