//! Minimal SerpAPI search client shared by the search tools

use crate::error::{ConfigError, Result};
use crate::tools::http::fetch_json;
use crate::tools::ToolContext;
use serde::de::DeserializeOwned;

const PROVIDER: &str = "SerpAPI";

#[derive(Clone)]
pub(crate) struct SerpApi {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl SerpApi {
    pub(crate) fn from_context(context: &ToolContext) -> Self {
        Self {
            http: context.http.clone(),
            url: context.endpoints.serpapi.clone(),
            api_key: context.credentials.serpapi_key.clone(),
        }
    }

    /// Run one search; fails before any request when no key is configured
    pub(crate) async fn search<T: DeserializeOwned>(&self, params: &[(&str, String)]) -> Result<T> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::missing_credential("SERPAPI_KEY"))?;

        tracing::debug!("SerpAPI search: {:?}", params);
        let request = self
            .http
            .get(&self.url)
            .query(params)
            .query(&[("api_key", api_key)]);
        fetch_json(request, PROVIDER).await
    }
}
