//! Configuration module for Cadence core
//!
//! Only exports pure data types. All loading logic is in CLI layer.

pub mod types;

pub use types::{
    deployment_id_for, AzureSettings, ExtractionConfig, ModelParams, ModelProvider,
    ResolvedLlmConfig, ToolCredentials, DEFAULT_AZURE_API_VERSION, DEFAULT_OLLAMA_BASE_URL,
    DEFAULT_OLLAMA_MODEL, DEFAULT_TEMPERATURE,
};
