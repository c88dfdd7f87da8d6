//! Climb records and the validation applied to raw model output

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Statistics for one cycling climb.
///
/// Numeric fields accept numbers or numeric strings; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Climb {
    #[serde(deserialize_with = "climb_name")]
    pub name: String,
    #[serde(default, deserialize_with = "trimmed_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub distance_km: Option<f64>,
    #[serde(default, deserialize_with = "whole_number_or_string")]
    pub elevation_gain_m: Option<i64>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub average_gradient: Option<f64>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub max_gradient: Option<f64>,
}

/// A raw record that failed validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    /// Position of the record in the model's climb list
    pub index: usize,
    pub reason: String,
}

impl Climb {
    /// Validate one raw record
    pub fn from_value(value: &Value) -> Result<Self, String> {
        Climb::deserialize(value).map_err(|e| e.to_string())
    }
}

fn climb_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    match name.trim() {
        "" => Err(de::Error::custom("climb name is empty")),
        trimmed => Ok(trimmed.to_string()),
    }
}

fn trimmed_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = Option::<String>::deserialize(deserializer)?;
    Ok(text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}

fn number_or_string<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected a number, got {:?}", s))),
        Some(other) => Err(de::Error::custom(format!(
            "expected a number, got {}",
            other
        ))),
    }
}

fn whole_number_or_string<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = number_or_string(deserializer)? else {
        return Ok(None);
    };
    if value.fract() != 0.0 || !value.is_finite() {
        return Err(de::Error::custom(format!(
            "expected a whole number, got {}",
            value
        )));
    }
    Ok(Some(value as i64))
}

/// Remove a surrounding markdown code fence, if any
pub(crate) fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Locate the raw climb list inside a parsed payload.
///
/// Accepts `{"climbs": [...]}` and `{"properties": {"climbs": [...]}}`;
/// anything else yields no records.
pub(crate) fn climb_records(payload: &Value) -> &[Value] {
    let climbs = payload.get("climbs").or_else(|| {
        payload
            .get("properties")
            .and_then(|properties| properties.get("climbs"))
    });

    match climbs {
        Some(Value::Array(items)) => items,
        Some(_) => {
            tracing::debug!("climbs field is not a list, treating as empty");
            &[]
        }
        None => &[],
    }
}
