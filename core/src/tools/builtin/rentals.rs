//! Bike rental search through SerpAPI's Google Maps engine

use super::serpapi::SerpApi;
use crate::error::Result;
use crate::impl_tool_factory;
use crate::tools::{SearchOutcome, Tool, ToolCall, ToolContext, ToolExample, ToolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const MAX_SHOPS: usize = 5;

/// A rental shop as reported by the search provider. Values are carried
/// through untouched, whatever JSON type the provider used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalShop {
    pub title: Option<Value>,
    pub gps_coordinates: Option<Value>,
    pub rating: Option<Value>,
    #[serde(rename = "type")]
    pub shop_type: Option<Value>,
    pub address: Option<Value>,
    pub open_state: Option<Value>,
    pub phone: Option<Value>,
    pub website: Option<Value>,
}

impl RentalShop {
    fn from_record(record: &Value) -> Self {
        let field = |key: &str| record.get(key).filter(|v| !v.is_null()).cloned();
        Self {
            title: field("title"),
            gps_coordinates: field("gps_coordinates"),
            rating: field("rating"),
            shop_type: field("type"),
            address: field("address"),
            open_state: field("open_state"),
            phone: field("phone"),
            website: field("website"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MapsResponse {
    #[serde(default)]
    local_results: Vec<Value>,
}

/// Tool finding bike rental shops near a city
pub struct BikeRentalsTool {
    serpapi: SerpApi,
}

impl BikeRentalsTool {
    pub fn from_context(context: &ToolContext) -> Self {
        Self {
            serpapi: SerpApi::from_context(context),
        }
    }

    /// Search for rentals in `city`, optionally narrowed to a locality
    pub async fn find(&self, city: &str, locality: Option<&str>) -> Result<SearchOutcome<RentalShop>> {
        let location = match locality.map(str::trim).filter(|l| !l.is_empty()) {
            Some(locality) => format!("{}, {}", city, locality),
            None => city.to_string(),
        };

        let response: MapsResponse = self
            .serpapi
            .search(&[
                ("engine", "google_maps".to_string()),
                ("q", format!("{} bike rental", location)),
                ("location", location.clone()),
                ("num", "3".to_string()),
            ])
            .await?;

        let shops: Vec<RentalShop> = response
            .local_results
            .iter()
            .take(MAX_SHOPS)
            .map(RentalShop::from_record)
            .collect();
        tracing::info!("Found {} bike rentals near {}", shops.len(), location);

        Ok(SearchOutcome::from_records(shops, || {
            format!("No bike rentals found near {}.", location)
        }))
    }
}

#[async_trait]
impl Tool for BikeRentalsTool {
    fn name(&self) -> &str {
        "find_bike_rentals"
    }

    fn description(&self) -> &str {
        "Find bike rental shops in a given location. Returns up to five shops with \
         title, GPS coordinates, rating, type, address, opening state, phone and website."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "The city to search in."
                },
                "locality": {
                    "type": "string",
                    "description": "Optional neighbourhood or area within the city."
                }
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let city = call.get_text("city")?;
        let locality: Option<String> = call.get_parameter("locality").ok();

        let outcome = self.find(&city, locality.as_deref()).await?;
        ToolResult::json(&call.id, &outcome)
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Rentals in a neighbourhood of Barcelona".to_string(),
            parameters: json!({"city": "Barcelona", "locality": "Gràcia"}),
            expected_result: "Up to five rental shops near Barcelona, Gràcia".to_string(),
        }]
    }
}

impl_tool_factory!(
    BikeRentalsToolFactory,
    BikeRentalsTool,
    "find_bike_rentals",
    "Find bike rental shops near a city"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolCredentials;
    use crate::test_support::StubServer;

    fn credentials() -> ToolCredentials {
        ToolCredentials {
            serpapi_key: Some("serp-test".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_caps_results_and_keeps_fields_verbatim() {
        let shops: Vec<serde_json::Value> = (0..7)
            .map(|i| {
                json!({
                    "position": i,
                    "title": format!("Shop {}", i),
                    "gps_coordinates": {"latitude": 41.4, "longitude": 2.15},
                    "rating": 4.5,
                    "type": "Bicycle rental service",
                    "address": "Carrer de Verdi 1",
                    "open_state": "Open ⋅ Closes 8 PM",
                    "phone": "+34 600 000 000",
                    "website": "https://example.com"
                })
            })
            .collect();
        let server = StubServer::serve(200, json!({"local_results": shops}).to_string()).await;
        let tool = BikeRentalsTool::from_context(&ToolContext::for_stub(
            &server.base_url(),
            credentials(),
        ));

        let outcome = tool.find("Barcelona", Some("Gràcia")).await.unwrap();
        let records = outcome.records();
        assert_eq!(records.len(), 5);
        assert_eq!(records[0].title, Some(json!("Shop 0")));
        assert_eq!(records[0].shop_type, Some(json!("Bicycle rental service")));
        assert_eq!(records[0].gps_coordinates.as_ref().unwrap()["latitude"], 41.4);

        let request = &server.requests()[0];
        assert!(request.request_line.starts_with("GET /search.json?"));
        assert!(request.request_line.contains("engine=google_maps"));
        assert!(request.request_line.contains("num=3"));
        assert!(request.request_line.contains("api_key=serp-test"));
    }

    #[tokio::test]
    async fn test_odd_field_types_pass_through() {
        let body = json!({"local_results": [
            {"title": "Good Shop", "rating": 4.5},
            {"title": "Odd Shop", "rating": "4.7", "phone": 34600000000u64}
        ]});
        let server = StubServer::serve(200, body.to_string()).await;
        let tool = BikeRentalsTool::from_context(&ToolContext::for_stub(
            &server.base_url(),
            credentials(),
        ));

        let outcome = tool.find("Valencia", None).await.unwrap();
        let records = outcome.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rating, Some(json!(4.5)));
        assert_eq!(records[0].phone, None);
        assert_eq!(records[1].rating, Some(json!("4.7")));
        assert_eq!(records[1].phone, Some(json!(34600000000u64)));
    }

    #[tokio::test]
    async fn test_empty_results_name_the_location() {
        let server = StubServer::serve(200, r#"{"search_metadata":{}}"#).await;
        let tool = BikeRentalsTool::from_context(&ToolContext::for_stub(
            &server.base_url(),
            credentials(),
        ));

        let result = tool
            .execute(ToolCall::new("find_bike_rentals", json!({"city": "Girona"})))
            .await
            .unwrap();
        assert_eq!(
            result.data.unwrap(),
            json!([{"message": "No bike rentals found near Girona."}])
        );
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let server = StubServer::serve(200, "{}").await;
        let tool = BikeRentalsTool::from_context(&ToolContext::for_stub(
            &server.base_url(),
            ToolCredentials::default(),
        ));

        let err = tool.find("Girona", None).await.unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("SERPAPI_KEY"));
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_provider_error_status() {
        let server = StubServer::serve(401, r#"{"error":"Invalid API key"}"#).await;
        let tool = BikeRentalsTool::from_context(&ToolContext::for_stub(
            &server.base_url(),
            credentials(),
        ));

        let err = tool.find("Girona", None).await.unwrap_err();
        assert!(err.to_string().contains("SerpAPI returned HTTP 401"));
    }
}
