//! Conversation history kept by the chat shell

use cadence_core::llm::{LlmMessage, MessageRole};

/// Number of most recent turns sent along with each new input
pub const HISTORY_WINDOW: usize = 10;

/// One past message, as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: MessageRole,
    pub content: String,
}

/// Ordered list of past user and assistant turns
#[derive(Debug)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
    window: usize,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::with_window(HISTORY_WINDOW)
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            turns: Vec::new(),
            window,
        }
    }

    /// Record a completed exchange
    pub fn record_exchange(&mut self, user_input: &str, response: &str) {
        self.turns.push(Turn {
            role: MessageRole::User,
            content: user_input.to_string(),
        });
        self.turns.push(Turn {
            role: MessageRole::Assistant,
            content: response.to_string(),
        });
    }

    /// Recent turns followed by the new input, ready for the agent
    pub fn messages_with(&self, input: &str) -> Vec<LlmMessage> {
        let start = self.turns.len().saturating_sub(self.window);
        self.turns[start..]
            .iter()
            .map(|turn| match turn.role {
                MessageRole::Assistant => LlmMessage::assistant(turn.content.as_str()),
                _ => LlmMessage::user(turn.content.as_str()),
            })
            .chain(std::iter::once(LlmMessage::user(input)))
            .collect()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}
