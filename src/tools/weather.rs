//! Builtin weather tool
//!
//! A locally-answered utility tool that is always exposed. The report is
//! deterministic for a given location so conversations replay stably.

use serde_json::{Value, json};

pub const WEATHER_TOOL_NAME: &str = "weather";

const CONDITIONS: &[&str] = &["sunny", "partly cloudy", "overcast", "light rain", "windy"];

pub fn description() -> &'static str {
    "Get the current weather for a location. Use this for any weather-related question."
}

pub fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "location": {
                "type": "string",
                "description": "City or place name to report the weather for"
            }
        },
        "required": ["location"]
    })
}

/// Produce the canned report for the requested location
pub fn report(args: &Value) -> String {
    let location = args
        .get("location")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("your location");

    let seed: u32 = location
        .to_lowercase()
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    let temperature = 5 + (seed % 26) as i32;
    let condition = CONDITIONS[(seed / 26) as usize % CONDITIONS.len()];

    format!(
        "The weather in {} is {} with a temperature of {}\u{b0}C.",
        location, condition, temperature
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_is_deterministic() {
        let args = json!({ "location": "Berlin" });
        assert_eq!(report(&args), report(&args));
    }

    #[test]
    fn test_report_mentions_location() {
        let out = report(&json!({ "location": "Tokyo" }));
        assert!(out.contains("Tokyo"));
        assert!(out.contains("\u{b0}C"));
    }

    #[test]
    fn test_report_handles_missing_location() {
        let out = report(&json!({}));
        assert!(out.contains("your location"));
    }

    #[test]
    fn test_temperature_in_plausible_range() {
        for city in ["Oslo", "Cairo", "Lima", "Perth"] {
            let out = report(&json!({ "location": city }));
            let degrees: i32 = out
                .split("temperature of ")
                .nth(1)
                .and_then(|s| s.split('\u{b0}').next())
                .and_then(|s| s.parse().ok())
                .unwrap();
            assert!((5..=30).contains(&degrees));
        }
    }
}
