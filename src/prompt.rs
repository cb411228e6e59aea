//! Prompt construction for the snow day narrative request.

use std::collections::HashMap;

use crate::types::DayRecord;

/// Sentinel that should never appear in real templates.
const ESCAPE_SENTINEL: &str = "\x00LBRACE\x00";
/// Sentinel for escaped closing brace.
const ESCAPE_SENTINEL_CLOSE: &str = "\x00RBRACE\x00";

/// System instruction establishing the forecaster role and the required
/// day-by-day structure.
pub const SYSTEM_PROMPT: &str = "You are a meteorologist who estimates the likelihood of \
school snow days in the United States. You answer with one section per forecast day. \
Every section must begin with a heading line of the form \"Day N (YYYY-MM-DD)\" and \
nothing else on that line before the heading.";

const USER_TEMPLATE: &str = "Here is the daily forecast for {city}, {state}:\n\n\
{forecast_json}\n\n\
For each day, write a section that starts with the heading line \"Day N (date)\". \
In each section, estimate the probability of a full school closure, a delayed start, \
and an early dismissal, and explain your reasoning from the temperatures, \
precipitation, snowfall, and wind in the data. Cover every day in order and do not \
skip any.";

/// Build a prompt string with `{key}` variable substitution.
///
/// Use `{{` to insert a literal `{` and `}}` to insert a literal `}`.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use snowday_pipeline::prompt::render;
///
/// let vars = HashMap::from([("city".to_string(), "Duluth".to_string())]);
/// assert_eq!(render("Forecast for {city}", &vars), "Forecast for Duluth");
/// ```
pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
    // Pass 1: protect escaped braces
    let mut rendered = template.replace("{{", ESCAPE_SENTINEL);
    rendered = rendered.replace("}}", ESCAPE_SENTINEL_CLOSE);

    // Pass 2: substitute placeholders
    for (key, value) in vars {
        let placeholder = format!("{{{}}}", key);
        rendered = rendered.replace(&placeholder, value);
    }

    // Pass 3: restore escaped braces
    rendered = rendered.replace(ESCAPE_SENTINEL, "{");
    rendered = rendered.replace(ESCAPE_SENTINEL_CLOSE, "}");
    rendered
}

/// JSON rendering of the forecast embedded in the user prompt.
pub fn forecast_json(days: &[DayRecord]) -> String {
    serde_json::to_string_pretty(days).unwrap_or_else(|_| "[]".to_string())
}

/// The user prompt: location, forecast data, and the fixed instructions.
pub fn build_user_prompt(city: &str, state: &str, days: &[DayRecord]) -> String {
    let vars = HashMap::from([
        ("city".to_string(), city.to_string()),
        ("state".to_string(), state.to_string()),
        ("forecast_json".to_string(), forecast_json(days)),
    ]);
    render(USER_TEMPLATE, &vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_day() -> DayRecord {
        DayRecord {
            date: "2026-01-17".into(),
            max_temp_f: 18.0,
            min_temp_f: 3.0,
            precipitation_in: 0.4,
            snowfall_in: 5.1,
            max_wind_mph: 22.0,
        }
    }

    #[test]
    fn test_render_basic() {
        let vars = HashMap::from([("name".to_string(), "Alice".to_string())]);
        assert_eq!(render("Hello {name}", &vars), "Hello Alice");
    }

    #[test]
    fn test_render_escaped_braces() {
        let vars = HashMap::new();
        assert_eq!(
            render("Format: {{\"key\": \"val\"}}", &vars),
            r#"Format: {"key": "val"}"#
        );
    }

    #[test]
    fn test_user_prompt_embeds_location_and_data() {
        let prompt = build_user_prompt("Duluth", "Minnesota", &[sample_day()]);
        assert!(prompt.contains("Duluth, Minnesota"));
        assert!(prompt.contains("\"date\": \"2026-01-17\""));
        assert!(prompt.contains("\"snowfall_in\": 5.1"));
    }

    #[test]
    fn test_user_prompt_requests_day_headings_and_probabilities() {
        let prompt = build_user_prompt("Duluth", "Minnesota", &[sample_day()]);
        assert!(prompt.contains("Day N (date)"));
        assert!(prompt.contains("full school closure"));
        assert!(prompt.contains("delayed start"));
        assert!(prompt.contains("early dismissal"));
    }

    #[test]
    fn test_system_prompt_pins_the_heading_convention() {
        assert!(SYSTEM_PROMPT.contains("Day N (YYYY-MM-DD)"));
    }

    #[test]
    fn test_forecast_json_is_an_array() {
        let json = forecast_json(&[sample_day()]);
        let parsed: Vec<DayRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0], sample_day());
    }
}
