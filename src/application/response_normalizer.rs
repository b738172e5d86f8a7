// Turns loosely formatted model output into an AnalysisResult
use crate::domain::insight::AnalysisResult;
use anyhow::Context;
use serde_json::Value;

/// Parse a model reply. Only a body that is not a JSON object fails;
/// malformed list fields are repaired, never rejected.
pub fn normalize_analysis(reply: &str) -> anyhow::Result<AnalysisResult> {
    let body = strip_code_fence(reply);
    let value: Value = serde_json::from_str(body).context("model reply is not valid JSON")?;
    let Value::Object(fields) = value else {
        anyhow::bail!("model reply is not a JSON object");
    };

    let summary = match fields.get("summary") {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    };
    let list = |key: &str| fields.get(key).map(ensure_list).unwrap_or_default();

    Ok(AnalysisResult::new(
        summary,
        list("key_insights"),
        list("recommendations"),
    ))
}

/// Inner content of a ```lang ... ``` block, trimmed. Text without an
/// enclosing fence (or with an empty one) comes back trimmed but otherwise as is.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };

    // optional language tag
    let inner = inner.trim_start_matches(|c: char| c.is_alphanumeric() || c == '_');
    let inner = inner.trim();
    if inner.is_empty() { trimmed } else { inner }
}

/// Coerce a list field into strings: an array as is, a string holding a
/// JSON array, or a comma separated string. Anything else is empty.
pub fn ensure_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(item_text).collect(),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => items.iter().map(item_text).collect(),
            _ => split_outside_quotes(s),
        },
        _ => Vec::new(),
    }
}

fn item_text(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn split_outside_quotes(s: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in s.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => pieces.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    pieces.push(current);

    pieces
        .iter()
        .map(|piece| unquote(piece.trim()).to_string())
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn unquote(s: &str) -> &str {
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_comma_inside_quotes_is_preserved() {
        let value = json!("\"A\", \"B, C\", \"D\"");
        assert_eq!(ensure_list(&value), vec!["A", "B, C", "D"]);
    }

    #[test]
    fn test_array_is_used_as_is() {
        let value = json!(["first", "second"]);
        assert_eq!(ensure_list(&value), vec!["first", "second"]);
    }

    #[test]
    fn test_json_encoded_array_string() {
        let value = json!("[\"Sales up 12%\", \"Churn flat\"]");
        assert_eq!(ensure_list(&value), vec!["Sales up 12%", "Churn flat"]);
    }

    #[test]
    fn test_plain_comma_string() {
        let value = json!("North grows, South declines ,  , West stable");
        assert_eq!(
            ensure_list(&value),
            vec!["North grows", "South declines", "West stable"]
        );
    }

    #[test]
    fn test_other_values_become_empty() {
        assert!(ensure_list(&json!(42)).is_empty());
        assert!(ensure_list(&json!(null)).is_empty());
        assert!(ensure_list(&json!({"a": 1})).is_empty());
    }

    #[test]
    fn test_fenced_reply_matches_unfenced() {
        let plain = r#"{"summary":"s","key_insights":[],"recommendations":[]}"#;
        let fenced = format!("```json\n{}\n```", plain);

        let a = normalize_analysis(plain).unwrap();
        let b = normalize_analysis(&fenced).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.summary, "s");
    }

    #[test]
    fn test_fence_without_language_tag() {
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_list_fields_are_repaired() {
        let reply = r#"{
            "summary": "Quarterly revenue",
            "key_insights": "[\"Peak in March\", \"Dip in May\"]",
            "recommendations": "\"Review pricing\", \"Expand, carefully\""
        }"#;

        let result = normalize_analysis(reply).unwrap();
        assert_eq!(result.key_insights, vec!["Peak in March", "Dip in May"]);
        assert_eq!(result.recommendations, vec!["Review pricing", "Expand, carefully"]);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let result = normalize_analysis(r#"{"summary":"only"}"#).unwrap();
        assert_eq!(result.summary, "only");
        assert!(result.key_insights.is_empty());
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_non_json_reply_fails() {
        assert!(normalize_analysis("I cannot see the dashboard").is_err());
        assert!(normalize_analysis("[1, 2]").is_err());
    }
}
