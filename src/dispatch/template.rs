use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::evaluator::path;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").expect("valid pattern"))
}

/// Replace every `{{field.path}}` token in `text` with the value found at
/// that path in `data`. Unresolved tokens are left verbatim; interpolation
/// never fails.
pub fn interpolate(text: &str, data: &Value) -> String {
    token_pattern()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            match path::lookup(data, &caps[1]) {
                Some(value) => render(value),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Walk a config bag and interpolate every string leaf.
pub fn interpolate_config(config: &Value, data: &Value) -> Value {
    match config {
        Value::String(text) => Value::String(interpolate(text, data)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| interpolate_config(item, data))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), interpolate_config(value, data)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
