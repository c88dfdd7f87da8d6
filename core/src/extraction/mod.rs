//! Climb statistics extraction from web pages.
//!
//! A page is downloaded and reduced to plain text, embedded in a prompt
//! together with the climb schema, and sent to a local model. The model's
//! JSON answer is validated record by record into [`Climb`]s.

pub mod climb;
pub mod page;
pub mod prompt;

pub use climb::{Climb, SkippedRecord};
pub use page::{fetch_page_text, strip_markup, truncate_chars};
pub use prompt::{climb_list_schema, PromptBuilder};

use crate::error::Result;
use crate::llm::{ChatOptions, LlmClient, LlmMessage};
use serde_json::{json, Value};
use std::sync::Arc;

/// First element of the diagnostic pair returned for unparseable model output
pub const PARSE_ERROR_MESSAGE: &str = "Error parsing JSON from LLM output";

/// Result of extracting climbs from one page
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Climbs {
        climbs: Vec<Climb>,
        skipped: Vec<SkippedRecord>,
    },
    /// The model's answer was not JSON
    Diagnostic { message: String, raw_output: String },
}

impl ExtractionOutcome {
    /// Parse and validate a model answer
    pub fn from_llm_output(raw: &str) -> Self {
        let payload: Value = match serde_json::from_str(climb::strip_code_fences(raw)) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Extraction output is not valid JSON: {}", e);
                return ExtractionOutcome::Diagnostic {
                    message: PARSE_ERROR_MESSAGE.to_string(),
                    raw_output: raw.to_string(),
                };
            }
        };

        let mut climbs = Vec::new();
        let mut skipped = Vec::new();
        for (index, record) in climb::climb_records(&payload).iter().enumerate() {
            match Climb::from_value(record) {
                Ok(climb) => climbs.push(climb),
                Err(reason) => {
                    tracing::debug!("Skipping climb record {}: {}", index, reason);
                    skipped.push(SkippedRecord { index, reason });
                }
            }
        }

        ExtractionOutcome::Climbs { climbs, skipped }
    }

    pub fn climbs(&self) -> &[Climb] {
        match self {
            ExtractionOutcome::Climbs { climbs, .. } => climbs,
            ExtractionOutcome::Diagnostic { .. } => &[],
        }
    }

    pub fn is_diagnostic(&self) -> bool {
        matches!(self, ExtractionOutcome::Diagnostic { .. })
    }

    /// JSON form handed back to the agent.
    ///
    /// A diagnostic becomes the pair `[message, raw_output]`.
    pub fn to_json(&self) -> Value {
        match self {
            ExtractionOutcome::Climbs { climbs, skipped } if skipped.is_empty() => {
                json!({ "climbs": climbs })
            }
            ExtractionOutcome::Climbs { climbs, skipped } => {
                json!({ "climbs": climbs, "skipped": skipped })
            }
            ExtractionOutcome::Diagnostic {
                message,
                raw_output,
            } => json!([message, raw_output]),
        }
    }
}

/// Runs the fetch, prompt, model call and parse pipeline
pub struct ClimbExtractor {
    http: reqwest::Client,
    llm: Arc<dyn LlmClient>,
    prompt: PromptBuilder,
    max_chars: usize,
}

impl ClimbExtractor {
    pub fn new(http: reqwest::Client, llm: Arc<dyn LlmClient>, max_chars: usize) -> Result<Self> {
        Ok(Self {
            http,
            llm,
            prompt: PromptBuilder::new()?,
            max_chars,
        })
    }

    /// Extract climbs from a web page
    pub async fn extract_from_url(&self, url: &str) -> Result<ExtractionOutcome> {
        let text = fetch_page_text(&self.http, url, self.max_chars).await?;
        self.extract_from_text(&text).await
    }

    /// Extract climbs from already stripped page text
    pub async fn extract_from_text(&self, text: &str) -> Result<ExtractionOutcome> {
        let prompt = self.prompt.render(&truncate_chars(text, self.max_chars))?;

        let response = self
            .llm
            .chat_completion(vec![LlmMessage::user(prompt)], None, Some(ChatOptions::json()))
            .await?;
        let raw = response.message.get_text().unwrap_or_default();

        let outcome = ExtractionOutcome::from_llm_output(&raw);
        tracing::info!(
            "Extracted {} climbs with {}",
            outcome.climbs().len(),
            self.llm.model_name()
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingLlm, ScriptedLlm, StubServer};

    #[test]
    fn test_wrapped_climb_list_is_parsed() {
        let outcome = ExtractionOutcome::from_llm_output(
            r#"{"climbs":[{"name":"Alpe d'Huez","location":"France","distance_km":13.8,"elevation_gain_m":1071,"average_gradient":8.1}]}"#,
        );
        assert_eq!(outcome.climbs().len(), 1);
        assert_eq!(outcome.climbs()[0].name, "Alpe d'Huez");
        assert_eq!(outcome.climbs()[0].elevation_gain_m, Some(1071));
    }

    #[test]
    fn test_invalid_json_gives_diagnostic_pair() {
        let outcome = ExtractionOutcome::from_llm_output("Sure! Here are the climbs: ...");
        assert!(outcome.is_diagnostic());

        let json = outcome.to_json();
        let pair = json.as_array().unwrap();
        assert_eq!(pair.len(), 2);
        assert_eq!(pair[0], PARSE_ERROR_MESSAGE);
        assert_eq!(pair[1], "Sure! Here are the climbs: ...");
    }

    #[test]
    fn test_invalid_records_are_skipped_and_reported() {
        let outcome = ExtractionOutcome::from_llm_output(
            "```json\n{\"climbs\":[{\"name\":\"Stelvio\"},{\"distance_km\":24}]}\n```",
        );
        match &outcome {
            ExtractionOutcome::Climbs { climbs, skipped } => {
                assert_eq!(climbs.len(), 1);
                assert_eq!(skipped.len(), 1);
                assert_eq!(skipped[0].index, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(outcome.to_json()["skipped"][0]["index"], 1);
    }

    #[test]
    fn test_single_line_fence_is_parsed() {
        let outcome = ExtractionOutcome::from_llm_output(
            "```json {\"climbs\":[{\"name\":\"Stelvio\"}]}```",
        );
        assert!(!outcome.is_diagnostic());
        assert_eq!(outcome.climbs()[0].name, "Stelvio");
    }

    #[test]
    fn test_payload_without_climbs_is_empty() {
        let outcome = ExtractionOutcome::from_llm_output(r#"[{"name":"Zoncolan"}]"#);
        assert!(!outcome.is_diagnostic());
        assert!(outcome.climbs().is_empty());
        assert_eq!(outcome.to_json(), json!({"climbs": []}));
    }

    #[tokio::test]
    async fn test_extract_from_url_sends_single_prompt() {
        let server = StubServer::serve(
            200,
            "<html><script>ignored()</script><p>Mortirolo: 12.4 km at 10.5%</p></html>",
        )
        .await;
        let llm = ScriptedLlm::text(r#"{"climbs":[{"name":"Mortirolo","distance_km":12.4}]}"#);
        let extractor = ClimbExtractor::new(reqwest::Client::new(), llm.clone(), 8000).unwrap();

        let outcome = extractor.extract_from_url(&server.base_url()).await.unwrap();
        assert_eq!(outcome.climbs()[0].distance_km, Some(12.4));

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 1);
        let prompt = calls[0][0].get_text().unwrap();
        assert!(prompt.contains("Mortirolo: 12.4 km at 10.5%"));
        assert!(!prompt.contains("ignored()"));
        assert_eq!(llm.tool_counts(), vec![0]);
    }

    #[tokio::test]
    async fn test_llm_failure_is_an_error() {
        let extractor =
            ClimbExtractor::new(reqwest::Client::new(), Arc::new(FailingLlm), 8000).unwrap();
        assert!(extractor.extract_from_text("some climbs").await.is_err());
    }
}
