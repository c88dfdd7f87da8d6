//! Extraction prompt rendering

use crate::error::{Error, Result};
use handlebars::Handlebars;
use serde_json::json;

const TEMPLATE_NAME: &str = "climb_extraction";

const CLIMB_EXTRACTION_TEMPLATE: &str = "\
You are a data extraction expert. Extract structured information about cycling climbs from the text below.

Follow this schema:
{{schema}}

Text:
{{text}}

Return only valid JSON.
";

/// JSON schema describing the expected model answer
pub fn climb_list_schema() -> serde_json::Value {
    json!({
        "title": "ClimbList",
        "type": "object",
        "properties": {
            "climbs": {
                "type": "array",
                "items": {
                    "title": "Climb",
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "location": {"type": ["string", "null"]},
                        "distance_km": {"type": ["number", "null"]},
                        "elevation_gain_m": {"type": ["integer", "null"]},
                        "average_gradient": {"type": ["number", "null"]},
                        "max_gradient": {"type": ["number", "null"]}
                    },
                    "required": ["name"]
                }
            }
        },
        "required": ["climbs"]
    })
}

/// Renders the extraction prompt for one page
pub struct PromptBuilder {
    registry: Handlebars<'static>,
    schema: String,
}

impl PromptBuilder {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(TEMPLATE_NAME, CLIMB_EXTRACTION_TEMPLATE)
            .map_err(|e| Error::Generic(format!("Invalid extraction template: {}", e)))?;

        let schema = serde_json::to_string_pretty(&climb_list_schema())?;
        Ok(Self { registry, schema })
    }

    pub fn render(&self, page_text: &str) -> Result<String> {
        self.registry
            .render(
                TEMPLATE_NAME,
                &json!({ "schema": self.schema, "text": page_text }),
            )
            .map_err(|e| Error::Generic(format!("Failed to render extraction prompt: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_schema_and_raw_text() {
        let builder = PromptBuilder::new().unwrap();
        let prompt = builder
            .render("Alpe d'Huez: 13.8 km <21 hairpins> & 8.1% average")
            .unwrap();

        assert!(prompt.starts_with("You are a data extraction expert."));
        assert!(prompt.contains("\"elevation_gain_m\""));
        assert!(prompt.contains("Alpe d'Huez: 13.8 km <21 hairpins> & 8.1% average"));
        assert!(prompt.trim_end().ends_with("Return only valid JSON."));
    }
}
