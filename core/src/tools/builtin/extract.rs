//! Climb statistics extraction exposed as a tool

use crate::error::{Result, ToolError};
use crate::extraction::ClimbExtractor;
use crate::impl_tool_factory;
use crate::llm::LlmClient;
use crate::tools::{Tool, ToolCall, ToolContext, ToolExample, ToolResult};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const MAX_URLS: usize = 3;

pub struct ExtractClimbsTool {
    http: reqwest::Client,
    llm: Arc<dyn LlmClient>,
    max_chars: usize,
    scrape_pause: Duration,
}

impl ExtractClimbsTool {
    pub fn from_context(context: &ToolContext) -> Self {
        Self {
            http: context.http.clone(),
            llm: context.extraction_llm.clone(),
            max_chars: context.extraction.max_chars,
            scrape_pause: Duration::from_millis(context.extraction.scrape_pause_ms),
        }
    }

    fn requested_urls(call: &ToolCall) -> Result<Vec<String>> {
        if let Ok(url) = call.get_text("url") {
            return Ok(vec![url]);
        }

        let urls: Vec<String> = call.get_parameter("urls").map_err(|_| {
            ToolError::InvalidParameters {
                message: "Provide either 'url' or 'urls'".to_string(),
            }
        })?;
        let urls: Vec<String> = urls
            .into_iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .take(MAX_URLS)
            .collect();

        if urls.is_empty() {
            return Err(ToolError::InvalidParameters {
                message: "'urls' must contain at least one URL".to_string(),
            }
            .into());
        }
        Ok(urls)
    }
}

#[async_trait]
impl Tool for ExtractClimbsTool {
    fn name(&self) -> &str {
        "extract_climbs"
    }

    fn description(&self) -> &str {
        "Read a web page about cycling climbs and extract structured statistics for each \
         climb: name, location, distance in km, elevation gain in m, average and max gradient. \
         Accepts one 'url' or up to three 'urls'."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Page to read."
                },
                "urls": {
                    "type": "array",
                    "items": {"type": "string"},
                    "maxItems": MAX_URLS,
                    "description": "Several pages to read in turn."
                }
            }
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let urls = Self::requested_urls(&call)?;
        let extractor = ClimbExtractor::new(self.http.clone(), self.llm.clone(), self.max_chars)?;

        if let [url] = urls.as_slice() {
            let outcome = extractor.extract_from_url(url).await?;
            return ToolResult::json(&call.id, &outcome.to_json());
        }

        let mut pages = Vec::new();
        for (index, url) in urls.iter().enumerate() {
            if index > 0 && !self.scrape_pause.is_zero() {
                tokio::time::sleep(self.scrape_pause).await;
            }
            let page = match extractor.extract_from_url(url).await {
                Ok(outcome) => json!({ "url": url, "result": outcome.to_json() }),
                Err(e) => {
                    tracing::warn!("Extraction from {} failed: {}", url, e);
                    json!({ "url": url, "error": e.to_string() })
                }
            };
            pages.push(page);
        }
        ToolResult::json(&call.id, &pages)
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Extract climbs from an article".to_string(),
            parameters: json!({"url": "https://example.com/best-climbs-in-the-alps"}),
            expected_result: "{\"climbs\": [{\"name\": \"Alpe d'Huez\", \"distance_km\": 13.8, ...}]}"
                .to_string(),
        }]
    }
}

impl_tool_factory!(
    ExtractClimbsToolFactory,
    ExtractClimbsTool,
    "extract_climbs",
    "Extract climb statistics from a web page"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolCredentials;
    use crate::extraction::PARSE_ERROR_MESSAGE;
    use crate::test_support::{ScriptedLlm, StubServer};

    fn tool(base_url: &str, llm: Arc<ScriptedLlm>) -> ExtractClimbsTool {
        let mut context = ToolContext::for_stub(base_url, ToolCredentials::default())
            .with_extraction_llm(llm);
        context.extraction.scrape_pause_ms = 0;
        ExtractClimbsTool::from_context(&context)
    }

    #[tokio::test]
    async fn test_single_url_returns_climbs() {
        let server = StubServer::serve(200, "<p>Alpe d'Huez 13.8 km</p>").await;
        let llm = ScriptedLlm::text(r#"{"climbs":[{"name":"Alpe d'Huez","distance_km":13.8}]}"#);
        let tool = tool(&server.base_url(), llm);

        let result = tool
            .execute(ToolCall::new("extract_climbs", json!({"url": server.base_url()})))
            .await
            .unwrap();
        let data = result.data.unwrap();
        assert_eq!(data["climbs"][0]["name"], "Alpe d'Huez");
    }

    #[tokio::test]
    async fn test_diagnostic_is_not_an_error() {
        let server = StubServer::serve(200, "<p>text</p>").await;
        let tool = tool(&server.base_url(), ScriptedLlm::text("not json at all"));

        let result = tool
            .execute(ToolCall::new("extract_climbs", json!({"url": server.base_url()})))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.data.unwrap()[0], PARSE_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_multiple_urls_are_capped_and_isolated() {
        let server = StubServer::serve(200, "<p>Stelvio</p>").await;
        let llm = ScriptedLlm::text(r#"{"climbs":[{"name":"Stelvio"}]}"#);
        let tool = tool(&server.base_url(), llm.clone());
        let base = server.base_url();

        let result = tool
            .execute(ToolCall::new(
                "extract_climbs",
                json!({"urls": [format!("{}/a", base), "not a url", format!("{}/c", base), format!("{}/d", base)]}),
            ))
            .await
            .unwrap();

        let pages = result.data.unwrap();
        let pages = pages.as_array().unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0]["result"]["climbs"][0]["name"], "Stelvio");
        assert!(pages[1]["error"].as_str().unwrap().contains("Invalid URL"));
        assert_eq!(llm.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_url_parameter() {
        let tool = tool("http://127.0.0.1:9", ScriptedLlm::text("{}"));
        let err = tool
            .execute(ToolCall::new("extract_climbs", json!({})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'url' or 'urls'"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_an_error() {
        let server = StubServer::serve(404, "missing").await;
        let tool = tool(&server.base_url(), ScriptedLlm::text("{}"));
        let err = tool
            .execute(ToolCall::new("extract_climbs", json!({"url": server.base_url()})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTTP 404"));
    }
}
