//! Error types and handling for Cadence Core

use thiserror::Error;

/// Result type alias for Cadence operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Cadence Core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// LLM client errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool execution errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// External lookup provider errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Web page fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Agent execution errors
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A credential the caller needs was never configured
    #[error("Missing {var} environment variable")]
    MissingCredential { var: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },

    #[error("Unsupported model provider: {name}")]
    UnsupportedProvider { name: String },

    #[error("Model name not recognized for deployment ID: {model}")]
    UnknownDeployment { model: String },
}

/// LLM client errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Unexpected response: {message}")]
    InvalidResponse { message: String },
}

/// Errors reported by the external lookup providers (SerpAPI, WeatherAPI, Strava)
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} returned an unexpected response: {message}")]
    UnexpectedShape { provider: String, message: String },
}

/// Errors while fetching a page for extraction
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Failed to fetch {url}: {message}")]
    Request { url: String, message: String },

    #[error("Failed to fetch {url}: HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    #[error("Tool execution failed: {name} - {message}")]
    ExecutionFailed { name: String, message: String },

    #[error("Invalid tool parameters: {message}")]
    InvalidParameters { message: String },
}

/// Agent execution errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Maximum steps exceeded: {max_steps}")]
    MaxStepsExceeded { max_steps: usize },

    #[error("Agent returned an empty response")]
    EmptyResponse,
}

impl ConfigError {
    /// Shorthand for a missing credential error
    pub fn missing_credential<S: Into<String>>(var: S) -> Self {
        ConfigError::MissingCredential { var: var.into() }
    }
}

impl ProviderError {
    pub fn request<P: Into<String>>(provider: P, err: impl std::fmt::Display) -> Self {
        ProviderError::Request {
            provider: provider.into(),
            message: err.to_string(),
        }
    }

    pub fn unexpected_shape<P: Into<String>>(provider: P, err: impl std::fmt::Display) -> Self {
        ProviderError::UnexpectedShape {
            provider: provider.into(),
            message: err.to_string(),
        }
    }
}

impl Error {
    /// Whether this error stems from missing or invalid configuration
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Generic(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Generic(msg.to_string())
    }
}
