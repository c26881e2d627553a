use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::warn;

/// Best-effort JSON payload from free model text: everything from the first
/// `{` to the last `}` after it. Falls back to [`fallback_plan`] serialized
/// when the text has no such span.
pub fn extract_json(text: &str) -> String {
    lazy_static! {
        static ref JSON_SPAN_RE: Regex = Regex::new(r"\{[\s\S]*\}").unwrap();
    }
    match JSON_SPAN_RE.find(text) {
        Some(m) => m.as_str().to_string(),
        None => {
            warn!("no JSON object found in model response; using fallback plan");
            fallback_plan(text).to_string()
        }
    }
}

/// Single-day, single-breakfast document used whenever the model output
/// cannot be read. The raw text is kept as the instructions.
pub fn fallback_plan(raw: &str) -> Value {
    json!({
        "days": [
            {
                "day": "Day 1",
                "meals": [
                    {
                        "type": "Breakfast",
                        "name": "Default breakfast",
                        "ingredients": ["Ingredients not parsed"],
                        "instructions": raw,
                        "prepTime": 30,
                        "calories": 300,
                        "protein": 15,
                        "carbs": 30,
                        "fat": 10
                    }
                ]
            }
        ]
    })
}

/// Extracts and parses the plan document. Output that still fails to parse
/// becomes the fallback plan.
pub fn parse_meal_plan(text: &str) -> Value {
    let candidate = extract_json(text);
    match serde_json::from_str::<Value>(&candidate) {
        Ok(v) if v.is_object() => v,
        Ok(_) | Err(_) => {
            warn!("model response JSON did not parse; using fallback plan");
            fallback_plan(text)
        }
    }
}
