//! Current conditions and daily forecasts from WeatherAPI

use crate::error::{ConfigError, Result};
use crate::impl_tool_factory;
use crate::tools::http::fetch_json;
use crate::tools::{Tool, ToolCall, ToolContext, ToolExample, ToolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const PROVIDER: &str = "WeatherAPI";
const MAX_FORECAST_DAYS: u32 = 7;
const DEFAULT_FORECAST_DAYS: u32 = 3;

/// Current conditions at a location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub location: String,
    pub country: String,
    pub condition: String,
    pub temp_c: f64,
    pub humidity: f64,
    pub wind_kph: f64,
}

impl WeatherReport {
    pub fn summary(&self) -> String {
        format!(
            "Current weather in {}, {}: {}, {:.1}°C, humidity {:.0}%, wind {:.1} kph.",
            self.location, self.country, self.condition, self.temp_c, self.humidity, self.wind_kph
        )
    }
}

/// One forecast day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDay {
    pub date: String,
    pub condition: String,
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    pub chance_of_rain: f64,
}

impl ForecastDay {
    pub fn summary(&self) -> String {
        format!(
            "{}: {}, max {:.1}°C, min {:.1}°C, {:.0}% chance of rain",
            self.date, self.condition, self.max_temp_c, self.min_temp_c, self.chance_of_rain
        )
    }
}

/// Raw WeatherAPI response bodies
mod api {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct Condition {
        pub text: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct Location {
        pub name: String,
        pub country: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct Current {
        pub condition: Condition,
        pub temp_c: f64,
        pub humidity: f64,
        pub wind_kph: f64,
    }

    #[derive(Debug, Deserialize)]
    pub struct CurrentResponse {
        pub location: Location,
        pub current: Current,
    }

    #[derive(Debug, Deserialize)]
    pub struct Day {
        pub condition: Condition,
        pub maxtemp_c: f64,
        pub mintemp_c: f64,
        #[serde(default)]
        pub daily_chance_of_rain: f64,
    }

    #[derive(Debug, Deserialize)]
    pub struct ForecastDay {
        pub date: String,
        pub day: Day,
    }

    #[derive(Debug, Deserialize)]
    pub struct Forecast {
        pub forecastday: Vec<ForecastDay>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub forecast: Forecast,
    }
}

/// WeatherAPI client shared by both weather tools
#[derive(Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    day_pause: Duration,
}

impl WeatherClient {
    pub fn from_context(context: &ToolContext) -> Self {
        Self {
            http: context.http.clone(),
            base_url: context.endpoints.weatherapi.trim_end_matches('/').to_string(),
            api_key: context.credentials.weatherapi_key.clone(),
            day_pause: context.forecast_pause,
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::missing_credential("WEATHERAPI_KEY").into())
    }

    pub async fn current(&self, city: &str) -> Result<WeatherReport> {
        let api_key = self.api_key()?;
        let request = self
            .http
            .get(format!("{}/current.json", self.base_url))
            .query(&[("key", api_key), ("q", city), ("aqi", "no")]);

        let response: api::CurrentResponse = fetch_json(request, PROVIDER).await?;
        Ok(WeatherReport {
            location: response.location.name,
            country: response.location.country,
            condition: response.current.condition.text,
            temp_c: response.current.temp_c,
            humidity: response.current.humidity,
            wind_kph: response.current.wind_kph,
        })
    }

    /// Daily forecast; `days` is clamped to 1..=7
    pub async fn forecast(&self, city: &str, days: u32) -> Result<Vec<ForecastDay>> {
        let api_key = self.api_key()?;
        let days = days.clamp(1, MAX_FORECAST_DAYS);
        let request = self.http.get(format!("{}/forecast.json", self.base_url)).query(&[
            ("key", api_key.to_string()),
            ("q", city.to_string()),
            ("days", days.to_string()),
            ("aqi", "no".to_string()),
            ("alerts", "no".to_string()),
        ]);

        let response: api::ForecastResponse = fetch_json(request, PROVIDER).await?;

        let mut forecast = Vec::new();
        for (index, entry) in response
            .forecast
            .forecastday
            .into_iter()
            .take(days as usize)
            .enumerate()
        {
            if index > 0 && !self.day_pause.is_zero() {
                tokio::time::sleep(self.day_pause).await;
            }
            forecast.push(ForecastDay {
                date: entry.date,
                condition: entry.day.condition.text,
                max_temp_c: entry.day.maxtemp_c,
                min_temp_c: entry.day.mintemp_c,
                chance_of_rain: entry.day.daily_chance_of_rain,
            });
        }
        Ok(forecast)
    }
}

/// Tool reporting current conditions
pub struct WeatherNowTool {
    client: WeatherClient,
}

impl WeatherNowTool {
    pub fn from_context(context: &ToolContext) -> Self {
        Self {
            client: WeatherClient::from_context(context),
        }
    }
}

#[async_trait]
impl Tool for WeatherNowTool {
    fn name(&self) -> &str {
        "get_weather_now"
    }

    fn description(&self) -> &str {
        "Get the current weather for a city: condition, temperature, humidity and wind."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "city": {"type": "string", "description": "City name, e.g. 'London'."}
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let city = call.get_text("city")?;
        let report = self.client.current(&city).await?;
        let data = serde_json::to_value(&report)?;
        Ok(ToolResult::success(call.id, report.summary()).with_data(data))
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Current weather in London".to_string(),
            parameters: json!({"city": "London"}),
            expected_result: "Current weather in London, United Kingdom: Sunny, 20.0°C, ..."
                .to_string(),
        }]
    }
}

/// Tool returning one summary line per forecast day
pub struct WeatherForecastTool {
    client: WeatherClient,
}

impl WeatherForecastTool {
    pub fn from_context(context: &ToolContext) -> Self {
        Self {
            client: WeatherClient::from_context(context),
        }
    }
}

#[async_trait]
impl Tool for WeatherForecastTool {
    fn name(&self) -> &str {
        "get_weather_forecast"
    }

    fn description(&self) -> &str {
        "Get the daily weather forecast for a city for up to 7 days: condition, \
         max/min temperature and chance of rain per day."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "city": {"type": "string", "description": "City name."},
                "days": {
                    "type": "integer",
                    "description": "Number of days to forecast (1-7).",
                    "minimum": 1,
                    "maximum": 7,
                    "default": DEFAULT_FORECAST_DAYS
                }
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let city = call.get_text("city")?;
        let days: u32 = call.get_parameter_or("days", DEFAULT_FORECAST_DAYS);

        let forecast = self.client.forecast(&city, days).await?;
        let lines: Vec<String> = forecast.iter().map(ForecastDay::summary).collect();
        ToolResult::json(&call.id, &lines)
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Three-day forecast for Girona".to_string(),
            parameters: json!({"city": "Girona", "days": 3}),
            expected_result: "Three lines such as '2024-05-01: Sunny, max 24.0°C, ...'"
                .to_string(),
        }]
    }
}

impl_tool_factory!(
    WeatherNowToolFactory,
    WeatherNowTool,
    "get_weather_now",
    "Current weather for a city"
);

impl_tool_factory!(
    WeatherForecastToolFactory,
    WeatherForecastTool,
    "get_weather_forecast",
    "Daily weather forecast for a city"
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
                weatherapi_key: Some("weather-test".to_string()),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_current_weather_summary() {
        let body = json!({
            "location": {"name": "London", "country": "UK", "region": "City of London"},
            "current": {
                "condition": {"text": "Sunny", "code": 1000},
                "temp_c": 20.0,
                "humidity": 50,
                "wind_kph": 15.0
            }
        });
        let server = StubServer::serve(200, body.to_string()).await;
        let tool = WeatherNowTool::from_context(&context(&server.base_url()));

        let result = tool
            .execute(ToolCall::new("get_weather_now", json!({"city": "London"})))
            .await
            .unwrap();

        assert!(result.content.contains("London, UK"));
        assert!(result.content.contains("Sunny"));
        assert!(result.content.contains("20.0°C"));
        assert!(result.content.contains("humidity 50%"));

        let request_line = &server.requests()[0].request_line;
        assert!(request_line.starts_with("GET /current.json?key=weather-test&q=London&aqi=no"));
    }

    #[tokio::test]
    async fn test_forecast_is_clamped_to_seven_days() {
        let days: Vec<serde_json::Value> = (1..=10)
            .map(|d| {
                json!({
                    "date": format!("2023-10-{:02}", d),
                    "day": {
                        "condition": {"text": "Rainy"},
                        "maxtemp_c": 15.0,
                        "mintemp_c": 10.0,
                        "daily_chance_of_rain": 80
                    }
                })
            })
            .collect();
        let server =
            StubServer::serve(200, json!({"forecast": {"forecastday": days}}).to_string()).await;
        let tool = WeatherForecastTool::from_context(&context(&server.base_url()));

        let result = tool
            .execute(ToolCall::new(
                "get_weather_forecast",
                json!({"city": "London", "days": 10}),
            ))
            .await
            .unwrap();

        let lines = result.data.unwrap();
        let lines = lines.as_array().unwrap();
        assert_eq!(lines.len(), 7);
        assert_eq!(
            lines[0],
            "2023-10-01: Rainy, max 15.0°C, min 10.0°C, 80% chance of rain"
        );
        assert!(server.requests()[0].request_line.contains("days=7"));
    }

    #[tokio::test]
    async fn test_missing_key_for_both_tools() {
        let server = StubServer::serve(200, "{}").await;
        let client = WeatherClient::from_context(&ToolContext::for_stub(
            &server.base_url(),
            ToolCredentials::default(),
        ));

        let err = client.current("London").await.unwrap_err();
        assert!(err.to_string().contains("Missing WEATHERAPI_KEY"));
        let err = client.forecast("London", 3).await.unwrap_err();
        assert!(err.to_string().contains("Missing WEATHERAPI_KEY"));
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_reported() {
        let server = StubServer::serve(200, r#"{"error":{"message":"No matching location"}}"#).await;
        let client = WeatherClient::from_context(&context(&server.base_url()));

        let err = client.current("Nowhere").await.unwrap_err();
        assert!(err.to_string().contains("WeatherAPI returned an unexpected response"));
    }
}
