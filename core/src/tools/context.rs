//! Everything a tool factory needs to build a tool

use crate::config::{ExtractionConfig, ToolCredentials};
use crate::error::{Error, Result};
use crate::llm::{LlmClient, OllamaClient};
use std::sync::Arc;
use std::time::Duration;

pub const SERPAPI_URL: &str = "https://serpapi.com/search.json";
pub const WEATHERAPI_URL: &str = "http://api.weatherapi.com/v1";
pub const STRAVA_API_URL: &str = "https://www.strava.com/api/v3";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_FORECAST_PAUSE: Duration = Duration::from_secs(1);
const DEFAULT_STRAVA_MAX_ROUTES: u32 = 5;

/// Base URLs of the external lookup services
#[derive(Debug, Clone)]
pub struct ToolEndpoints {
    pub serpapi: String,
    pub weatherapi: String,
    pub strava: String,
}

impl Default for ToolEndpoints {
    fn default() -> Self {
        Self {
            serpapi: SERPAPI_URL.to_string(),
            weatherapi: WEATHERAPI_URL.to_string(),
            strava: STRAVA_API_URL.to_string(),
        }
    }
}

/// Shared, constructor-injected dependencies of the cycling tools
#[derive(Clone)]
pub struct ToolContext {
    pub http: reqwest::Client,
    pub credentials: ToolCredentials,
    pub endpoints: ToolEndpoints,
    pub extraction: ExtractionConfig,
    pub extraction_llm: Arc<dyn LlmClient>,
    pub forecast_pause: Duration,
    pub strava_max_routes: u32,
}

impl ToolContext {
    /// Build a context with a shared HTTP client and an Ollama extraction model
    pub fn new(credentials: ToolCredentials, extraction: ExtractionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("cadence/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Generic(format!("Failed to create HTTP client: {}", e)))?;
        let extraction_llm: Arc<dyn LlmClient> =
            Arc::new(OllamaClient::new(&extraction.llm_config())?);

        Ok(Self {
            http,
            credentials,
            endpoints: ToolEndpoints::default(),
            extraction,
            extraction_llm,
            forecast_pause: DEFAULT_FORECAST_PAUSE,
            strava_max_routes: DEFAULT_STRAVA_MAX_ROUTES,
        })
    }

    pub fn with_endpoints(mut self, endpoints: ToolEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_extraction_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.extraction_llm = llm;
        self
    }

    pub fn with_forecast_pause(mut self, pause: Duration) -> Self {
        self.forecast_pause = pause;
        self
    }

    pub fn with_strava_max_routes(mut self, max_routes: u32) -> Self {
        self.strava_max_routes = max_routes;
        self
    }
}

#[cfg(test)]
impl ToolContext {
    /// Context whose lookups all go to `base_url`, with no pauses
    pub(crate) fn for_stub(base_url: &str, credentials: ToolCredentials) -> Self {
        let endpoints = ToolEndpoints {
            serpapi: format!("{}/search.json", base_url),
            weatherapi: base_url.to_string(),
            strava: base_url.to_string(),
        };
        Self::new(credentials, ExtractionConfig::default())
            .unwrap()
            .with_endpoints(endpoints)
            .with_forecast_pause(Duration::ZERO)
    }
}
