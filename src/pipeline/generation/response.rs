// Helpers for decoding free-form backend output into JSON values.
// Decoding is best-effort: a field that fails to decode is dropped,
// never the whole response.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Locate the JSON object in a backend response.
///
/// Prefers the first ```json fenced block, then any fenced block, then the
/// outermost `{...}` span.
pub fn extract_json_object(response: &str) -> Option<&str> {
    if let Some(block) = fenced_block(response, "```json") {
        return Some(block);
    }
    if let Some(block) = fenced_block(response, "```") {
        if block.starts_with('{') {
            return Some(block);
        }
    }

    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}

fn fenced_block<'a>(response: &'a str, fence: &str) -> Option<&'a str> {
    let start = response.find(fence)? + fence.len();
    let len = response[start..].find("```")?;
    Some(response[start..start + len].trim())
}

/// Parse the response's JSON object into a raw value.
pub fn parse_json_object(response: &str) -> Option<serde_json::Value> {
    let json = extract_json_object(response)?;
    match serde_json::from_str::<serde_json::Value>(json) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Backend JSON did not parse");
            None
        }
    }
}

/// Parse an array leniently: skip items that fail to deserialize.
pub fn parse_array_lenient<T: DeserializeOwned>(items: &[serde_json::Value]) -> Vec<T> {
    items
        .iter()
        .filter_map(|v| serde_json::from_value(v.clone()).ok())
        .collect()
}

/// `deserialize_with` hook: a value of the wrong shape becomes `T::default()`.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// `deserialize_with` hook for free-text fields: strings pass through,
/// numbers and booleans are stringified, anything else is absent.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_string(&value))
}

/// `deserialize_with` hook for string lists: a lone string becomes a
/// one-item list; non-string items are skipped.
pub fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => items.iter().filter_map(value_to_string).collect(),
        other => value_to_string(&other).into_iter().collect(),
    })
}

/// `deserialize_with` hook for scores: numbers or numeric strings.
pub fn lenient_f32<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().map(|f| f as f32),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
    .filter(|f: &f32| f.is_finite()))
}

fn value_to_string(value: &serde_json::Value) -> Option<String> {
    let s = match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty() && !s.eq_ignore_ascii_case("null")).then_some(s)
}

/// Clamp a self-reported confidence into [0, 1].
pub fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
