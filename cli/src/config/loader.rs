//! CLI configuration loader for Cadence
//!
//! Loads a single JSON file, then overlays environment variables:
//! 1. --config file/dir (highest priority)
//! 2. Current working directory: ./cadence.json or ./.cadence/config.json
//! 3. XDG config: $XDG_CONFIG_HOME/cadence/config.json or ~/.config/cadence/config.json
//! 4. Environment variables only (no file)
//!
//! Environment variables always win over file values. A `.env` file in the
//! working directory fills in variables the process environment lacks.

use anyhow::{anyhow, Context, Result};
use cadence_core::agent::{AgentConfig, PromptStyle};
use cadence_core::config::{
    deployment_id_for, AzureSettings, ExtractionConfig, ModelParams, ModelProvider,
    ResolvedLlmConfig, ToolCredentials, DEFAULT_AZURE_API_VERSION, DEFAULT_TEMPERATURE,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "cadence.json";
const CONFIG_DIR_NAME: &str = ".cadence";
const DOTENV_FILE_NAME: &str = ".env";

/// Raw configuration file format; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// Chat model provider name (azure_openai, openai, anthropic, google, ollama)
    pub provider: Option<String>,
    /// API key (can be "env:VAR_NAME" for environment variable)
    pub api_key: Option<String>,
    /// Base URL (optional, uses provider default if not specified)
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub params: ModelParams,
    pub headers: HashMap<String, String>,
    pub azure: RawAzure,
    pub tools: RawTools,
    pub extraction: RawExtraction,
    pub agent: RawAgent,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAzure {
    pub api_version: Option<String>,
    pub deployment_id: Option<String>,
}

/// Lookup tool credentials; "env:VAR_NAME" is accepted for each
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTools {
    pub serpapi_key: Option<String>,
    pub weatherapi_key: Option<String>,
    pub strava_access_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawExtraction {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_chars: Option<usize>,
    pub scrape_pause_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAgent {
    pub max_steps: Option<usize>,
    pub prompt_style: Option<PromptStyle>,
    pub system_prompt: Option<String>,
    pub tools: Option<Vec<String>>,
}

/// Everything the chat command needs, fully resolved
#[derive(Debug, Clone)]
pub struct CadenceConfig {
    pub llm: ResolvedLlmConfig,
    pub credentials: ToolCredentials,
    pub extraction: ExtractionConfig,
    pub agent: AgentConfig,
}

/// CLI configuration loader
#[derive(Debug, Clone)]
pub struct CliConfigLoader {
    /// Override config file/directory path
    config_override: Option<PathBuf>,
    /// Directory searched for a project config file
    working_dir: Option<PathBuf>,
    /// Snapshot of the environment, read once
    env: HashMap<String, String>,
}

impl CliConfigLoader {
    /// Create a loader over the current process environment
    pub fn new() -> Self {
        Self {
            config_override: None,
            working_dir: None,
            env: std::env::vars().collect(),
        }
    }

    /// Set config file/directory override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    /// Search this directory instead of the current one
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    /// Replace the environment snapshot
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Load and resolve configuration
    pub async fn load(&self) -> Result<CadenceConfig> {
        self.with_dotenv()?.load_resolved().await
    }

    async fn load_resolved(&self) -> Result<CadenceConfig> {
        let raw = if let Some(override_path) = &self.config_override {
            self.load_from_path(override_path).await.with_context(|| {
                format!(
                    "Failed to load config from override path: {}",
                    override_path.display()
                )
            })?
        } else {
            self.search_and_load().await?
        };

        self.resolve(raw)
    }

    fn working_dir(&self) -> Result<PathBuf> {
        match &self.working_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Copy of this loader with `.env` entries added under existing variables
    fn with_dotenv(&self) -> Result<Self> {
        let mut loader = self.clone();
        let path = self.working_dir()?.join(DOTENV_FILE_NAME);
        if !path.is_file() {
            return Ok(loader);
        }

        tracing::debug!("Loading environment from {}", path.display());
        let entries = dotenvy::from_path_iter(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        for entry in entries {
            let (key, value) =
                entry.with_context(|| format!("Failed to parse {}", path.display()))?;
            loader.env.entry(key).or_insert(value);
        }
        Ok(loader)
    }

    /// Search for config in priority order
    async fn search_and_load(&self) -> Result<RawConfig> {
        if let Some(config) = self.try_load_cwd().await? {
            return Ok(config);
        }

        if let Some(config) = self.try_load_xdg().await? {
            return Ok(config);
        }

        tracing::debug!("No config file found, using environment only");
        Ok(RawConfig::default())
    }

    /// Try loading from the working directory
    async fn try_load_cwd(&self) -> Result<Option<RawConfig>> {
        let cwd = self.working_dir()?;

        let candidates = [
            cwd.join(CONFIG_FILE_NAME),
            cwd.join(CONFIG_DIR_NAME).join("config.json"),
        ];
        for path in candidates {
            if path.exists() {
                return Ok(Some(self.load_file(&path).await?));
            }
        }

        Ok(None)
    }

    /// Try loading from the XDG config directory
    async fn try_load_xdg(&self) -> Result<Option<RawConfig>> {
        if let Some(config_dir) = self.xdg_config_dir() {
            let config_path = config_dir.join("cadence").join("config.json");
            if config_path.exists() {
                return Ok(Some(self.load_file(&config_path).await?));
            }
        }
        Ok(None)
    }

    fn xdg_config_dir(&self) -> Option<PathBuf> {
        match self.env.get("XDG_CONFIG_HOME") {
            Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
            _ => dirs::config_dir(),
        }
    }

    /// Load configuration from a specific path (file or directory)
    async fn load_from_path(&self, path: &Path) -> Result<RawConfig> {
        if path.is_file() {
            self.load_file(path).await
        } else if path.is_dir() {
            let config_file = path.join("config.json");
            if config_file.exists() {
                self.load_file(&config_file).await
            } else {
                Err(anyhow!(
                    "No config.json found in directory: {}",
                    path.display()
                ))
            }
        } else {
            Err(anyhow!("Config path does not exist: {}", path.display()))
        }
    }

    /// Load a single config file
    async fn load_file(&self, path: &Path) -> Result<RawConfig> {
        tracing::debug!("Loading config from {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Non-empty environment value
    fn var(&self, name: &str) -> Option<String> {
        self.env
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Resolve a file value, following an "env:VAR_NAME" indirection
    fn resolve_value(&self, value: Option<String>) -> Result<Option<String>> {
        match value {
            Some(value) => match value.strip_prefix("env:") {
                Some(var_name) => self
                    .var(var_name)
                    .map(Some)
                    .ok_or_else(|| anyhow!("Environment variable not found: {}", var_name)),
                None => Ok(Some(value)),
            },
            None => Ok(None),
        }
    }

    fn env_or_file(&self, name: &str, file_value: Option<String>) -> Result<Option<String>> {
        match self.var(name) {
            Some(value) => Ok(Some(value)),
            None => self.resolve_value(file_value),
        }
    }

    /// Resolve the raw file config plus environment into final settings
    fn resolve(&self, raw: RawConfig) -> Result<CadenceConfig> {
        let provider: ModelProvider = match self.var("MODEL_PROVIDER").or(raw.provider) {
            Some(name) => name.parse()?,
            None => ModelProvider::default(),
        };

        let provider_model = match provider {
            ModelProvider::Ollama => self.var("OLLAMA_MODEL"),
            _ => None,
        };
        let model = self
            .var("MODEL")
            .or(raw.model)
            .or(provider_model)
            .unwrap_or_else(|| provider.default_model().to_string());

        let temperature = match self.var("TEMPERATURE") {
            Some(value) => Some(value.parse::<f32>().map_err(|_| {
                anyhow!("Invalid value for field 'TEMPERATURE': {}", value)
            })?),
            None => raw.params.temperature,
        }
        .unwrap_or(DEFAULT_TEMPERATURE);
        let params = ModelParams {
            temperature: Some(temperature),
            ..raw.params
        };

        let api_key = match provider.api_key_env() {
            Some(var) => self
                .env_or_file(var, raw.api_key)?
                .ok_or_else(|| anyhow!("Missing {} environment variable", var))?,
            None => String::new(),
        };

        let base_url_env = match provider {
            ModelProvider::AzureOpenAI => Some("AZURE_OPENAI_ENDPOINT"),
            ModelProvider::OpenAI => Some("OPENAI_BASE_URL"),
            ModelProvider::Ollama => Some("OLLAMA_BASE_URL"),
            ModelProvider::Anthropic | ModelProvider::Google => None,
        };
        let base_url = match base_url_env {
            Some(var) => self.var(var).or(raw.base_url.clone()),
            None => raw.base_url.clone(),
        }
        .or_else(|| provider.default_base_url().map(str::to_string))
        .ok_or_else(|| anyhow!("Missing AZURE_OPENAI_ENDPOINT environment variable"))?;

        let mut llm = ResolvedLlmConfig::new(provider, base_url, api_key, model)
            .with_params(params)
            .with_headers(raw.headers);

        if provider == ModelProvider::AzureOpenAI {
            let api_version = self
                .var("AZURE_OPENAI_API_VERSION")
                .or(raw.azure.api_version)
                .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string());
            let deployment_id = match self
                .var("AZURE_OPENAI_DEPLOYMENT")
                .or(raw.azure.deployment_id)
            {
                Some(deployment) => deployment,
                None => deployment_id_for(&llm.model)?,
            };
            llm = llm.with_azure(AzureSettings {
                api_version,
                deployment_id,
            });
        }

        llm.validate()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

        let credentials = ToolCredentials {
            serpapi_key: self.env_or_file("SERPAPI_KEY", raw.tools.serpapi_key)?,
            weatherapi_key: self.env_or_file("WEATHERAPI_KEY", raw.tools.weatherapi_key)?,
            strava_access_token: self
                .env_or_file("STRAVA_ACCESS_TOKEN", raw.tools.strava_access_token)?,
        };

        let defaults = ExtractionConfig::default();
        let extraction = ExtractionConfig {
            base_url: self
                .var("OLLAMA_BASE_URL")
                .or(raw.extraction.base_url)
                .unwrap_or(defaults.base_url),
            model: self
                .var("OLLAMA_EXTRACTION_MODEL")
                .or(raw.extraction.model)
                .unwrap_or(defaults.model),
            temperature: raw.extraction.temperature.unwrap_or(defaults.temperature),
            max_chars: raw.extraction.max_chars.unwrap_or(defaults.max_chars),
            scrape_pause_ms: raw
                .extraction
                .scrape_pause_ms
                .unwrap_or(defaults.scrape_pause_ms),
        };

        let mut agent = AgentConfig::default();
        if let Some(max_steps) = raw.agent.max_steps {
            agent.max_steps = max_steps;
        }
        if let Some(style) = raw.agent.prompt_style {
            agent.prompt_style = style;
        }
        if let Some(tools) = raw.agent.tools {
            agent.tools = tools;
        }
        agent.system_prompt = raw.agent.system_prompt;

        tracing::debug!(
            "Resolved chat model {} via {}",
            llm.model,
            llm.provider.as_str()
        );

        Ok(CadenceConfig {
            llm,
            credentials,
            extraction,
            agent,
        })
    }
}

impl Default for CliConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
