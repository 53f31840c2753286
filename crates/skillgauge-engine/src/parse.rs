//! Shared handling of service replies
//!
//! The external service is asked for strict JSON but routinely wraps its
//! output in markdown code fences anyway. Every parser in the engine strips
//! those before deserializing, and every parser gets exactly one repair
//! attempt with a stricter schema reminder before the reply is rejected.

use serde::de::DeserializeOwned;

use crate::error::EngineError;

/// Appended to the original prompt when the first reply failed to parse.
pub(crate) const REPAIR_REMINDER: &str = "\n\nREMINDER: your previous reply could not be parsed. \
     Output ONLY the JSON object described above. No code fences, no prose, \
     no explanation before or after the JSON.";

/// Strip an accidental outer markdown code fence from a service reply.
pub(crate) fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "markdown", ...) on the opening fence.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim().trim_end_matches("```").trim()
}

/// Deserialize a fence-stripped service reply into `T`.
pub(crate) fn parse_reply<T: DeserializeOwned>(
    task: &str,
    raw: &str,
) -> Result<T, EngineError> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(cleaned).map_err(|e| {
        let sample: String = cleaned.chars().take(80).collect();
        EngineError::MalformedResponse {
            task: task.to_string(),
            details: format!("{e}; reply started with: {}", sample.escape_debug()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_json_passes_through() {
        assert_eq!(strip_code_fences(r#"{"a": 1}"#), r#"{"a": 1}"#);
    }

    #[test]
    fn strips_fence_with_language_tag() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(raw), r#"{"a": 1}"#);
    }

    #[test]
    fn strips_fence_without_language_tag() {
        let raw = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(raw), r#"{"a": 1}"#);
    }

    #[test]
    fn parse_reply_reports_task_and_sample() {
        let err = parse_reply::<serde_json::Value>("quality-scoring", "not json at all")
            .unwrap_err();
        match err {
            EngineError::MalformedResponse { task, details } => {
                assert_eq!(task, "quality-scoring");
                assert!(details.contains("not json"));
            }
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }
}
