//! Configuration types for Cadence core
//!
//! Core only accepts fully resolved, validated configuration.
//! All discovery, loading, and environment lookups happen in the CLI layer.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Supported chat model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelProvider {
    /// Azure-hosted OpenAI deployments
    #[serde(rename = "azure_openai")]
    AzureOpenAI,
    /// OpenAI-compatible API (OpenAI itself and most proxies)
    #[serde(rename = "openai")]
    OpenAI,
    /// Anthropic Claude API
    #[serde(rename = "anthropic")]
    Anthropic,
    /// Google AI API (Gemini)
    #[serde(rename = "google")]
    Google,
    /// Local Ollama server
    #[serde(rename = "ollama")]
    Ollama,
}

impl ModelProvider {
    /// Get the provider name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelProvider::AzureOpenAI => "azure_openai",
            ModelProvider::OpenAI => "openai",
            ModelProvider::Anthropic => "anthropic",
            ModelProvider::Google => "google",
            ModelProvider::Ollama => "ollama",
        }
    }

    /// Get the default base URL for this provider
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            ModelProvider::AzureOpenAI => None, // Requires the resource endpoint
            ModelProvider::OpenAI => Some("https://api.openai.com/v1"),
            ModelProvider::Anthropic => Some("https://api.anthropic.com"),
            ModelProvider::Google => Some("https://generativelanguage.googleapis.com/v1beta"),
            ModelProvider::Ollama => Some(DEFAULT_OLLAMA_BASE_URL),
        }
    }

    /// Get the model used when none is configured
    pub fn default_model(&self) -> &'static str {
        match self {
            ModelProvider::AzureOpenAI | ModelProvider::OpenAI => "gpt-4o-mini",
            ModelProvider::Anthropic => "claude-3-5-sonnet-20241022",
            ModelProvider::Google => "gemini-pro",
            ModelProvider::Ollama => DEFAULT_OLLAMA_MODEL,
        }
    }

    /// Environment variable holding the API key, if the provider needs one
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ModelProvider::AzureOpenAI => Some("AZURE_OPENAI_API_KEY"),
            ModelProvider::OpenAI => Some("OPENAI_API_KEY"),
            ModelProvider::Anthropic => Some("ANTHROPIC_API_KEY"),
            ModelProvider::Google => Some("GOOGLE_API_KEY"),
            ModelProvider::Ollama => None,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        self.api_key_env().is_some()
    }
}

impl Default for ModelProvider {
    fn default() -> Self {
        ModelProvider::AzureOpenAI
    }
}

impl std::fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "azure_openai" | "azure" => Ok(ModelProvider::AzureOpenAI),
            "openai" | "openai_compat" => Ok(ModelProvider::OpenAI),
            "anthropic" => Ok(ModelProvider::Anthropic),
            "google" | "google_ai" | "gemini" => Ok(ModelProvider::Google),
            "ollama" => Ok(ModelProvider::Ollama),
            _ => Err(ConfigError::UnsupportedProvider {
                name: s.to_string(),
            }),
        }
    }
}

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:8b";
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Map a model name onto its Azure deployment id
pub fn deployment_id_for(model: &str) -> Result<String, ConfigError> {
    let deployment = match model {
        "gpt-35-turbo" => "gpt-35-turbo-16k",
        "gpt-4-alt" => "gpt4-turbo",
        "gpt-4.1" | "gpt-4.1-mini" | "gpt-4o" | "gpt-4o-mini" | "gpt-4" | "o1-preview"
        | "o1-mini" => model,
        _ => {
            return Err(ConfigError::UnknownDeployment {
                model: model.to_string(),
            })
        }
    };
    Ok(deployment.to_string())
}

/// Model parameters for LLM requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelParams {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for sampling (0.0 to 2.0)
    pub temperature: Option<f32>,
    /// Top-p sampling parameter
    pub top_p: Option<f32>,
}

/// Azure-specific request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureSettings {
    pub api_version: String,
    pub deployment_id: String,
}

/// A fully resolved LLM configuration ready for use by core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLlmConfig {
    /// The provider to talk to
    pub provider: ModelProvider,
    /// Base URL for the API
    pub base_url: String,
    /// API key for authentication (empty for Ollama)
    pub api_key: String,
    /// Model name/identifier
    pub model: String,
    /// Model parameters
    #[serde(default)]
    pub params: ModelParams,
    /// Azure deployment settings, only for `ModelProvider::AzureOpenAI`
    #[serde(default)]
    pub azure: Option<AzureSettings>,
    /// Additional headers for requests
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl ResolvedLlmConfig {
    /// Create a new resolved LLM config
    pub fn new(provider: ModelProvider, base_url: String, api_key: String, model: String) -> Self {
        Self {
            provider,
            base_url,
            api_key,
            model,
            params: ModelParams::default(),
            azure: None,
            headers: HashMap::new(),
        }
    }

    /// Set model parameters
    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }

    /// Set Azure deployment settings
    pub fn with_azure(mut self, azure: AzureSettings) -> Self {
        self.azure = Some(azure);
        self
    }

    /// Add multiple headers
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.provider.requires_api_key() && self.api_key.is_empty() {
            return Err(format!(
                "API key cannot be empty for provider '{}'",
                self.provider
            ));
        }

        if self.model.is_empty() {
            return Err("Model name cannot be empty".to_string());
        }

        if self.base_url.is_empty() {
            return Err("Base URL cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("Base URL must start with http:// or https://".to_string());
        }

        if self.provider == ModelProvider::AzureOpenAI && self.azure.is_none() {
            return Err("Azure OpenAI requires an API version and deployment".to_string());
        }

        if let Some(temp) = self.params.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if let Some(top_p) = self.params.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err("Top-p must be between 0.0 and 1.0".to_string());
            }
        }

        Ok(())
    }
}

/// Credentials for the external lookup tools.
///
/// Missing entries are not an error here: each tool reports its own missing
/// credential when it is called, before any request is made.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCredentials {
    pub serpapi_key: Option<String>,
    pub weatherapi_key: Option<String>,
    pub strava_access_token: Option<String>,
}

/// Settings for the local LLM used by climb extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Ollama server base URL
    pub base_url: String,
    /// Model used for the extraction prompt
    pub model: String,
    /// Sampling temperature for extraction
    pub temperature: f32,
    /// Maximum characters of page text sent to the model
    pub max_chars: usize,
    /// Pause between successive page scrapes, in milliseconds
    pub scrape_pause_ms: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            temperature: 0.0,
            max_chars: 8000,
            scrape_pause_ms: 1000,
        }
    }
}

impl ExtractionConfig {
    /// The Ollama chat configuration backing the extractor
    pub fn llm_config(&self) -> ResolvedLlmConfig {
        ResolvedLlmConfig::new(
            ModelProvider::Ollama,
            self.base_url.clone(),
            String::new(),
            self.model.clone(),
        )
        .with_params(ModelParams {
            temperature: Some(self.temperature),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!(
            "azure_openai".parse::<ModelProvider>().unwrap(),
            ModelProvider::AzureOpenAI
        );
        assert_eq!("Ollama".parse::<ModelProvider>().unwrap(), ModelProvider::Ollama);
        assert_eq!("gemini".parse::<ModelProvider>().unwrap(), ModelProvider::Google);

        let err = "mistral_cloud".parse::<ModelProvider>().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedProvider { .. }));
        assert!(err.to_string().contains("mistral_cloud"));
    }

    #[test]
    fn test_deployment_mapping() {
        assert_eq!(deployment_id_for("gpt-35-turbo").unwrap(), "gpt-35-turbo-16k");
        assert_eq!(deployment_id_for("gpt-4-alt").unwrap(), "gpt4-turbo");
        assert_eq!(deployment_id_for("gpt-4o-mini").unwrap(), "gpt-4o-mini");
        assert!(deployment_id_for("llama-70b").is_err());
    }

    #[test]
    fn test_validate_ollama_without_key() {
        let config = ExtractionConfig::default().llm_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_key_and_bad_temperature() {
        let config = ResolvedLlmConfig::new(
            ModelProvider::Anthropic,
            "https://api.anthropic.com".to_string(),
            String::new(),
            "claude-3-5-sonnet-20241022".to_string(),
        );
        assert!(config.validate().unwrap_err().contains("API key"));

        let config = ResolvedLlmConfig::new(
            ModelProvider::OpenAI,
            "https://api.openai.com/v1".to_string(),
            "key".to_string(),
            "gpt-4o".to_string(),
        )
        .with_params(ModelParams {
            temperature: Some(3.5),
            ..Default::default()
        });
        assert!(config.validate().unwrap_err().contains("Temperature"));
    }

    #[test]
    fn test_validate_azure_requires_deployment() {
        let config = ResolvedLlmConfig::new(
            ModelProvider::AzureOpenAI,
            "https://example.openai.azure.com".to_string(),
            "key".to_string(),
            "gpt-4o-mini".to_string(),
        );
        assert!(config.validate().is_err());

        let config = config.with_azure(AzureSettings {
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            deployment_id: "gpt-4o-mini".to_string(),
        });
        assert!(config.validate().is_ok());
    }
}
