//! Layered parsing of gateway responses.
//!
//! Each stage returns `Result<_, ClassifyError>` and the next stage only runs
//! on success:
//!
//! 1. [`completion_text`]: pull the first choice's message content out of the
//!    chat-completion envelope (string or list of typed parts)
//! 2. [`extract_object`]: parse the text as JSON, or failing that the span
//!    from the first `{` to the last `}`
//! 3. [`require_keys`]: `summary` and `engagement` must be present
//! 4. [`normalize_verdict`]: closed-enum engagement, boolean-like relevance

use crate::error::ClassifyError;
use crate::models::{ClassificationResult, Engagement};
use crate::utils::{flag_from_json, looks_truncated, truncate_for_log};
use serde_json::{Map, Value};

/// Keys a verdict must carry to be usable.
pub const REQUIRED_KEYS: [&str; 2] = ["summary", "engagement"];

/// Keys read for the relevance flag, first present wins.
const RELEVANCE_KEYS: [&str; 3] = ["is_relevant", "isRelevant", "is_ai_cs_relevant"];

/// Extract the assistant text from a chat-completion response body.
pub fn completion_text(body: &str) -> Result<String, ClassifyError> {
    let envelope: Value = serde_json::from_str(body)
        .map_err(|e| ClassifyError::Envelope(format!("body is not JSON: {e}")))?;

    let content = envelope
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .ok_or_else(|| ClassifyError::Envelope("no choices[0].message.content".to_string()))?;

    match content {
        Value::String(text) => Ok(text.clone()),
        Value::Array(parts) => Ok(parts
            .iter()
            .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<String>()),
        other => Err(ClassifyError::Envelope(format!(
            "unsupported content type: {}",
            truncate_for_log(&other.to_string(), 80)
        ))),
    }
}

/// Recover a JSON object from model text.
pub fn extract_object(text: &str) -> Result<Map<String, Value>, ClassifyError> {
    let text = text.trim();

    let direct_err = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => return Ok(map),
        Ok(_) => None,
        Err(e) => Some(e),
    };

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&text[start..=end]) {
                return Ok(map);
            }
        }
    }

    let reason = match direct_err {
        Some(e) if looks_truncated(&e) => format!("output looks truncated (raise max_tokens?): {e}"),
        Some(e) => e.to_string(),
        None => "top-level JSON value is not an object".to_string(),
    };
    Err(ClassifyError::NotJson(reason))
}

/// Fail unless every [`REQUIRED_KEYS`] entry is present.
pub fn require_keys(object: &Map<String, Value>) -> Result<(), ClassifyError> {
    let missing: Vec<&'static str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !object.contains_key(*key))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ClassifyError::Incomplete { missing })
    }
}

fn text_field(object: &Map<String, Value>, key: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Map a validated object onto a [`ClassificationResult`].
pub fn normalize_verdict(object: &Map<String, Value>) -> ClassificationResult {
    let relevance = RELEVANCE_KEYS.iter().find_map(|k| object.get(*k));

    ClassificationResult {
        summary: text_field(object, "summary"),
        engagement: Engagement::normalize(object.get("engagement").and_then(Value::as_str)),
        hook: text_field(object, "hook"),
        is_relevant: flag_from_json(relevance),
    }
}

/// Run stages 2–4 on model text.
pub fn parse_verdict(text: &str) -> Result<ClassificationResult, ClassifyError> {
    let object = extract_object(text)?;
    require_keys(&object)?;
    Ok(normalize_verdict(&object))
}

/// Run all stages on a raw response body.
pub fn parse_response(body: &str) -> Result<ClassificationResult, ClassifyError> {
    let text = completion_text(body)?;
    parse_verdict(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(content: Value) -> String {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]}).to_string()
    }

    #[test]
    fn test_completion_text_string_content() {
        let body = envelope(json!("{\"summary\": \"s\"}"));
        assert_eq!(completion_text(&body).unwrap(), "{\"summary\": \"s\"}");
    }

    #[test]
    fn test_completion_text_concatenates_text_parts() {
        let body = envelope(json!([
            {"type": "text", "text": "{\"summary\": "},
            {"type": "image_url", "image_url": {"url": "x"}},
            {"type": "text", "text": "\"s\"}"},
            "stray"
        ]));
        assert_eq!(completion_text(&body).unwrap(), "{\"summary\": \"s\"}");
    }

    #[test]
    fn test_completion_text_rejects_bad_envelopes() {
        assert!(matches!(completion_text("<html>502</html>"), Err(ClassifyError::Envelope(_))));
        assert!(matches!(completion_text(r#"{"choices": []}"#), Err(ClassifyError::Envelope(_))));
        assert!(matches!(completion_text(r#"{"error": "x"}"#), Err(ClassifyError::Envelope(_))));
        assert!(matches!(completion_text(&envelope(json!(42))), Err(ClassifyError::Envelope(_))));
        assert!(matches!(completion_text(&envelope(Value::Null)), Err(ClassifyError::Envelope(_))));
    }

    #[test]
    fn test_direct_json() {
        let v = parse_verdict(
            r#"{"summary": " S ", "engagement": "HIGH", "hook": " H ", "is_relevant": true}"#,
        )
        .unwrap();
        assert_eq!(v.summary, "S");
        assert_eq!(v.engagement, Engagement::High);
        assert_eq!(v.hook, "H");
        assert!(v.is_relevant);
    }

    #[test]
    fn test_json_wrapped_in_prose_and_fences() {
        let text = "Sure! Here is the analysis:\n```json\n{\"summary\": \"S\", \"engagement\": \"MEDIUM\", \"hook\": \"H\", \"is_relevant\": \"yes\"}\n```\nLet me know.";
        let v = parse_verdict(text).unwrap();
        assert_eq!(v.engagement, Engagement::Medium);
        assert!(v.is_relevant);
    }

    #[test]
    fn test_not_json() {
        assert!(matches!(parse_verdict("I cannot help with that."), Err(ClassifyError::NotJson(_))));
        assert!(matches!(parse_verdict("} backwards {"), Err(ClassifyError::NotJson(_))));
        assert!(matches!(parse_verdict("[1, 2]"), Err(ClassifyError::NotJson(_))));
    }

    #[test]
    fn test_truncated_json_is_flagged() {
        let err = parse_verdict(r#"{"summary": "The vendor announced"#).unwrap_err();
        match err {
            ClassifyError::NotJson(reason) => assert!(reason.contains("truncated")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_keys() {
        let err = parse_verdict(r#"{"hook": "H", "is_relevant": true}"#).unwrap_err();
        match err {
            ClassifyError::Incomplete { missing } => assert_eq!(missing, vec!["summary", "engagement"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_optional_keys_default() {
        let v = parse_verdict(r#"{"summary": "S", "engagement": "LOW"}"#).unwrap();
        assert_eq!(v.hook, "");
        assert!(!v.is_relevant);
    }

    #[test]
    fn test_engagement_normalization() {
        for (raw, expected) in [
            (json!("HIGH"), Engagement::High),
            (json!("high"), Engagement::Low),
            (json!("HIGH|MEDIUM|LOW"), Engagement::Low),
            (json!(null), Engagement::Low),
            (json!(3), Engagement::Low),
        ] {
            let text = json!({"summary": "S", "engagement": raw}).to_string();
            assert_eq!(parse_verdict(&text).unwrap().engagement, expected);
        }
    }

    #[test]
    fn test_relevance_flag_variants_and_aliases() {
        for (raw, expected) in [
            (json!(true), true),
            (json!("TRUE"), true),
            (json!("1"), true),
            (json!("Yes"), true),
            (json!("false"), false),
            (json!(1), false),
            (json!(null), false),
        ] {
            let text = json!({"summary": "S", "engagement": "LOW", "is_relevant": raw}).to_string();
            assert_eq!(parse_verdict(&text).unwrap().is_relevant, expected);
        }

        let legacy = r#"{"summary": "S", "engagement": "LOW", "is_ai_cs_relevant": "true"}"#;
        assert!(parse_verdict(legacy).unwrap().is_relevant);

        let both = r#"{"summary": "S", "engagement": "LOW", "is_relevant": false, "isRelevant": true}"#;
        assert!(!parse_verdict(both).unwrap().is_relevant);
    }

    #[test]
    fn test_parse_response_end_to_end() {
        let body = envelope(json!(
            "{\"summary\": \"S\", \"engagement\": \"HIGH\", \"hook\": \"H\", \"is_relevant\": false}"
        ));
        let v = parse_response(&body).unwrap();
        assert_eq!(v.engagement, Engagement::High);
        assert!(!v.is_relevant);
    }
}
