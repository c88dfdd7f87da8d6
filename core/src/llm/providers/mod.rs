//! LLM provider implementations

pub mod anthropic;
pub mod google;
pub mod ollama;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use google::GoogleClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use crate::config::{ModelProvider, ResolvedLlmConfig};
use crate::error::{ConfigError, Result};
use crate::llm::LlmClient;
use std::sync::Arc;

/// Build the chat client for a resolved configuration
pub fn create_client(config: &ResolvedLlmConfig) -> Result<Arc<dyn LlmClient>> {
    config.validate().map_err(|message| ConfigError::InvalidValue {
        field: config.provider.as_str().to_string(),
        value: message,
    })?;

    tracing::debug!(
        "Creating {} client for model {}",
        config.provider,
        config.model
    );

    let client: Arc<dyn LlmClient> = match config.provider {
        ModelProvider::AzureOpenAI | ModelProvider::OpenAI => Arc::new(OpenAiClient::new(config)?),
        ModelProvider::Anthropic => Arc::new(AnthropicClient::new(config)?),
        ModelProvider::Google => Arc::new(GoogleClient::new(config)?),
        ModelProvider::Ollama => Arc::new(OllamaClient::new(config)?),
    };
    Ok(client)
}
