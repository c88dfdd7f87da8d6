//! Web search for articles about cycling climbs

use super::serpapi::SerpApi;
use crate::error::Result;
use crate::impl_tool_factory;
use crate::tools::{SearchOutcome, Tool, ToolCall, ToolContext, ToolExample, ToolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const MAX_ARTICLES: usize = 5;

/// One organic search result pointing at a climb article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimbArticle {
    pub title: Option<Value>,
    pub link: Option<Value>,
    pub snippet: Option<Value>,
    pub source: Option<Value>,
}

impl ClimbArticle {
    fn from_record(record: &Value) -> Self {
        let field = |key: &str| record.get(key).filter(|v| !v.is_null()).cloned();
        Self {
            title: field("title"),
            link: field("link"),
            snippet: field("snippet"),
            source: field("source"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<Value>,
}

pub struct ClimbArticlesTool {
    serpapi: SerpApi,
}

impl ClimbArticlesTool {
    pub fn from_context(context: &ToolContext) -> Self {
        Self {
            serpapi: SerpApi::from_context(context),
        }
    }

    pub async fn find(&self, location: &str) -> Result<SearchOutcome<ClimbArticle>> {
        let response: SearchResponse = self
            .serpapi
            .search(&[
                ("engine", "google".to_string()),
                ("q", format!("best cycling climbs {}", location)),
                ("num", MAX_ARTICLES.to_string()),
            ])
            .await?;

        let articles: Vec<ClimbArticle> = response
            .organic_results
            .iter()
            .take(MAX_ARTICLES)
            .map(ClimbArticle::from_record)
            .collect();
        tracing::info!("Found {} climb articles for {}", articles.len(), location);

        Ok(SearchOutcome::from_records(articles, || {
            format!("No climb articles found for {}.", location)
        }))
    }
}

#[async_trait]
impl Tool for ClimbArticlesTool {
    fn name(&self) -> &str {
        "find_climb_articles"
    }

    fn description(&self) -> &str {
        "Search the web for articles about the best cycling climbs in a region. \
         Returns up to five results with title, link, snippet and source. \
         Pass a link to extract_climbs to get the climb statistics."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "Region, city or mountain range, e.g. 'Dolomites'."
                }
            },
            "required": ["location"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let location = call.get_text("location")?;
        let outcome = self.find(&location).await?;
        ToolResult::json(&call.id, &outcome)
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Climb articles for the Pyrenees".to_string(),
            parameters: json!({"location": "Pyrenees"}),
            expected_result: "Up to five articles listing Pyrenean climbs".to_string(),
        }]
    }
}

impl_tool_factory!(
    ClimbArticlesToolFactory,
    ClimbArticlesTool,
    "find_climb_articles",
    "Search the web for cycling climb articles"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolCredentials;
    use crate::test_support::StubServer;

    fn context(base_url: &str) -> ToolContext {
        ToolContext::for_stub(
            base_url,
            ToolCredentials {
                serpapi_key: Some("serp-test".to_string()),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_maps_organic_results() {
        let body = json!({
            "organic_results": [
                {"position": 1, "title": "Top 10 climbs in the Dolomites",
                 "link": "https://example.com/dolomites", "snippet": "Passo Giau...",
                 "source": "Cycling Weekly"},
                {"position": 2, "title": "Sella Ronda guide", "link": "https://example.org/sella"}
            ]
        });
        let server = StubServer::serve(200, body.to_string()).await;
        let tool = ClimbArticlesTool::from_context(&context(&server.base_url()));

        let outcome = tool.find("Dolomites").await.unwrap();
        let records = outcome.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source, Some(json!("Cycling Weekly")));
        assert_eq!(records[1].snippet, None);

        let request_line = &server.requests()[0].request_line;
        assert!(request_line.contains("engine=google&"));
        assert!(request_line.contains("q=best+cycling+climbs+Dolomites"));
    }

    #[tokio::test]
    async fn test_non_string_fields_kept_as_is() {
        let body = json!({"organic_results": [
            {"title": "Climbs", "link": "https://example.com/a", "source": 42},
            {"title": ["Odd"], "snippet": null}
        ]});
        let server = StubServer::serve(200, body.to_string()).await;
        let tool = ClimbArticlesTool::from_context(&context(&server.base_url()));

        let outcome = tool.find("Alps").await.unwrap();
        let records = outcome.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source, Some(json!(42)));
        assert_eq!(records[1].title, Some(json!(["Odd"])));
        assert_eq!(records[1].snippet, None);
    }

    #[tokio::test]
    async fn test_empty_results_message() {
        let server = StubServer::serve(200, r#"{"organic_results":[]}"#).await;
        let tool = ClimbArticlesTool::from_context(&context(&server.base_url()));

        let outcome = tool.find("Atlantis").await.unwrap();
        assert_eq!(
            outcome.message(),
            Some("No climb articles found for Atlantis.")
        );
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_provider_error() {
        let server = StubServer::serve(200, r#"{"organic_results":"oops"}"#).await;
        let tool = ClimbArticlesTool::from_context(&context(&server.base_url()));

        let err = tool.find("Dolomites").await.unwrap_err();
        assert!(err.to_string().contains("unexpected response"));
    }
}
