//! Weather tool - city weather lookup
//!
//! Returns a deterministic report derived from the request. A live
//! provider needs an API key; the canned report keeps the tool usable in
//! tests and demos while preserving the real parameter surface.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{Tool, ToolDef};
use toolgate_foundation::ToolResult;

/// Weather lookup tool
pub struct WeatherTool;

#[derive(Debug, Deserialize)]
struct WeatherParams {
    city: String,
    #[serde(default = "default_country")]
    country: String,
    #[serde(default = "default_units")]
    units: String,
}

fn default_country() -> String {
    "CN".to_string()
}

fn default_units() -> String {
    "metric".to_string()
}

impl WeatherTool {
    pub fn new() -> Self {
        Self
    }

    fn unit_label(units: &str) -> Option<&'static str> {
        match units {
            "metric" => Some("celsius"),
            "imperial" => Some("fahrenheit"),
            "standard" => Some("kelvin"),
            _ => None,
        }
    }
}

impl Default for WeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn definition(&self) -> ToolDef {
        ToolDef::builder("weather", "Look up current weather for a city.")
            .string_param("city", "City name, e.g. Beijing, Oslo", true)
            .string_param("country", "Country code, e.g. CN, US, NO (default: CN)", false)
            .enum_param(
                "units",
                "Unit system (default: metric)",
                vec!["metric", "imperial", "standard"],
                false,
            )
            .build()
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let params: WeatherParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::fail(format!("Invalid parameters: {}", e)),
        };

        let unit_label = match Self::unit_label(&params.units) {
            Some(label) => label,
            None => {
                return ToolResult::fail(format!(
                    "Unknown units '{}', expected metric, imperial or standard",
                    params.units
                ))
            }
        };

        ToolResult::ok(json!({
            "city": params.city,
            "country": params.country,
            "temperature": 23.5,
            "humidity": 65,
            "conditions": "clear",
            "wind_speed": 3.2,
            "units": unit_label,
        }))
    }
}
