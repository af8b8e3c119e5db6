//! Model reply normalization.
//!
//! Models sometimes wrap the JSON in a markdown fence despite being told not
//! to. Strip one leading and one trailing fence, then parse.

use crate::LessonPlan;

use super::error::GenerateError;

/// Remove a surrounding markdown code fence, if any.
///
/// Trims, drops a leading "```json" (or bare "```"), drops a trailing "```"
/// and trims again. Clean JSON passes through unchanged apart from
/// surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parse the model's reply text into a [`LessonPlan`].
pub fn normalize_response(raw: &str) -> Result<LessonPlan, GenerateError> {
    let payload = strip_code_fences(raw);
    if payload.is_empty() {
        return Err(GenerateError::MalformedResponse(
            "model reply was empty".to_string(),
        ));
    }
    serde_json::from_str(payload).map_err(|e| GenerateError::MalformedResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN_JSON: &str = r#"{"subject":"Matemática","objective":"Frações","totalDuration":50,"sections":[{"title":"Abertura","content":"Boas-vindas","duration":50}]}"#;

    #[test]
    fn clean_json_parses() {
        let plan = normalize_response(PLAN_JSON).unwrap();
        assert_eq!(plan.subject, "Matemática");
        assert_eq!(plan.sections.len(), 1);
    }

    #[test]
    fn json_fence_is_stripped() {
        let fenced = format!("```json\n{PLAN_JSON}\n```");
        assert_eq!(
            normalize_response(&fenced).unwrap(),
            normalize_response(PLAN_JSON).unwrap()
        );
    }

    #[test]
    fn bare_fence_and_whitespace_are_stripped() {
        let fenced = format!("  \n```\n{PLAN_JSON}\n```  \n");
        assert_eq!(strip_code_fences(&fenced), PLAN_JSON);
    }

    #[test]
    fn stripping_is_idempotent_on_clean_json() {
        let once = strip_code_fences(PLAN_JSON);
        assert_eq!(strip_code_fences(once), once);
    }

    #[test]
    fn empty_reply_is_malformed() {
        for raw in ["", "   ", "```json\n```"] {
            assert!(
                matches!(normalize_response(raw), Err(GenerateError::MalformedResponse(_))),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn prose_reply_is_malformed() {
        let err = normalize_response("Aqui está o seu plano de aula!").unwrap_err();
        assert!(matches!(err, GenerateError::MalformedResponse(_)));
    }

    #[test]
    fn missing_required_field_is_malformed() {
        let err = normalize_response(r#"{"subject":"x","objective":"y"}"#).unwrap_err();
        assert!(matches!(err, GenerateError::MalformedResponse(_)));
    }
}
