use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[A-Za-z0-9_+-]*[ \t]*\r?\n?").expect("code fence pattern"));

static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("trailing comma pattern"));

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object or array found in model output")]
    NoJson,
    #[error("model output is not valid JSON after cleanup: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Recovers a JSON value from model output.
///
/// Well-formed output is parsed as-is. Otherwise code fences are stripped,
/// the outermost object (or, failing that, array) is sliced out and trailing
/// commas are dropped before a second strict parse.
pub fn parse_json_response(text: &str) -> Result<Value, ParseError> {
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }
    let cleaned = extract_json(text)?;
    Ok(serde_json::from_str(&cleaned)?)
}

/// Slices the JSON-looking region out of noisy text.
///
/// Boundaries are the first opening and last closing delimiter; prose with
/// stray braces between them is not corrected.
pub fn extract_json(text: &str) -> Result<String, ParseError> {
    let unfenced = CODE_FENCE.replace_all(text, "");
    let unfenced = unfenced.trim();

    let sliced = slice_between(unfenced, '{', '}')
        .or_else(|| slice_between(unfenced, '[', ']'))
        .ok_or(ParseError::NoJson)?;

    let cleaned = TRAILING_COMMA.replace_all(sliced, "$1");
    Ok(cleaned.trim().to_string())
}

fn slice_between(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn strict_json_passes_through() {
        assert_eq!(parse_json_response(r#"{"a": [1, 2]}"#).unwrap(), json!({"a": [1, 2]}));
        assert_eq!(parse_json_response("  [1]\n").unwrap(), json!([1]));
    }

    #[test]
    fn strips_fence_and_trailing_comma() {
        assert_eq!(parse_json_response("```json\n{\"a\":1,}\n```").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn strips_untagged_fence() {
        assert_eq!(parse_json_response("```\n{\"a\": true}\n```").unwrap(), json!({"a": true}));
    }

    #[test]
    fn slices_object_out_of_prose() {
        let raw = "Sure! Here is the plan:\n{\"blocks\": [{\"type\": \"Hero\",},]}\nHope that helps.";
        assert_eq!(
            parse_json_response(raw).unwrap(),
            json!({"blocks": [{"type": "Hero"}]})
        );
    }

    #[test]
    fn falls_back_to_array_boundaries() {
        let raw = "Result: [ {\"type\": \"hero\"} ] done";
        // object boundaries exist inside the array, so the object wins
        assert_eq!(parse_json_response(raw).unwrap(), json!({"type": "hero"}));

        assert_eq!(parse_json_response("values: [1, 2, 3,] ok").unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn reports_missing_json() {
        assert!(matches!(parse_json_response("no structure here"), Err(ParseError::NoJson)));
        assert!(matches!(parse_json_response("} backwards {"), Err(ParseError::NoJson)));
    }

    #[test]
    fn reports_unrecoverable_json() {
        assert!(matches!(
            parse_json_response("here {\"a\": nope} there"),
            Err(ParseError::Invalid(_))
        ));
    }

    #[test]
    fn stray_braces_in_prose_are_not_corrected() {
        let raw = "{\"a\": 1} and later a closing } in prose";
        assert!(parse_json_response(raw).is_err());
    }
}
