//! The athlete's saved routes from the Strava API

use crate::error::{ConfigError, Result};
use crate::impl_tool_factory;
use crate::tools::http::fetch_json;
use crate::tools::{SearchOutcome, Tool, ToolCall, ToolContext, ToolExample, ToolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

const PROVIDER: &str = "Strava";

/// A route as presented to the agent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StravaRoute {
    pub name: String,
    pub id: u64,
    pub distance_km: String,
    pub elevation_m: String,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    name: String,
    id: u64,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    elevation_gain: f64,
}

impl From<RawRoute> for StravaRoute {
    fn from(route: RawRoute) -> Self {
        Self {
            name: route.name,
            id: route.id,
            distance_km: format_distance(route.distance),
            elevation_m: format_elevation(route.elevation_gain),
        }
    }
}

/// Meters to kilometers with one decimal, e.g. "20.0 km"
pub fn format_distance(meters: f64) -> String {
    format!("{:.1} km", meters / 1000.0)
}

/// Whole meters, e.g. "500 m"
pub fn format_elevation(meters: f64) -> String {
    format!("{:.0} m", meters)
}

pub struct StravaRoutesTool {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
    max_routes: u32,
}

impl StravaRoutesTool {
    pub fn from_context(context: &ToolContext) -> Self {
        Self {
            http: context.http.clone(),
            base_url: context.endpoints.strava.trim_end_matches('/').to_string(),
            access_token: context.credentials.strava_access_token.clone(),
            max_routes: context.strava_max_routes,
        }
    }

    pub fn url(&self) -> String {
        format!("{}/athlete/routes", self.base_url)
    }

    pub async fn list_routes(&self) -> Result<SearchOutcome<StravaRoute>> {
        let token = self
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::missing_credential("STRAVA_ACCESS_TOKEN"))?;

        let request = self
            .http
            .get(self.url())
            .bearer_auth(token)
            .query(&[("per_page", self.max_routes)]);
        let routes: Vec<RawRoute> = fetch_json(request, PROVIDER).await?;

        tracing::info!("Fetched {} Strava routes", routes.len());
        let routes: Vec<StravaRoute> = routes.into_iter().map(StravaRoute::from).collect();
        Ok(SearchOutcome::from_records(routes, || {
            "No routes found for the user.".to_string()
        }))
    }
}

#[async_trait]
impl Tool for StravaRoutesTool {
    fn name(&self) -> &str {
        "user_strava_routes"
    }

    fn description(&self) -> &str {
        "List the user's saved Strava routes with name, id, distance in km and \
         elevation gain in meters. Requires a Strava access token."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let outcome = self.list_routes().await?;
        ToolResult::json(&call.id, &outcome)
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "List saved routes".to_string(),
            parameters: json!({}),
            expected_result: "Routes such as {\"name\": \"Morning Ride\", \"distance_km\": \"25.0 km\"}"
                .to_string(),
        }]
    }
}

impl_tool_factory!(
    StravaRoutesToolFactory,
    StravaRoutesTool,
    "user_strava_routes",
    "List the user's Strava routes"
);
