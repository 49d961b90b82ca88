//! Pull structured payloads out of free-form model output.
//!
//! Models routinely wrap their answer in commentary or code fences, so both
//! helpers scan for boundary markers rather than parsing the whole text.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::prompts::HTML_DOCUMENT_MARKER;

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Parse the text between the first `{` and the last `}` (inclusive) as a
/// JSON object.
pub fn extract_json(text: &str) -> Result<Map<String, Value>, ExtractError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let (start, end) = match (start, end) {
        (Some(s), Some(e)) if s < e => (s, e),
        _ => {
            return Err(ExtractError::Malformed(
                "no JSON object found in response".into(),
            ))
        }
    };

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ExtractError::Malformed(format!(
            "expected a JSON object, found {}",
            other
        ))),
        Err(e) => Err(ExtractError::Malformed(format!("invalid JSON: {}", e))),
    }
}

/// Slice an HTML document out of `text`.
///
/// The start is the first `<!DOCTYPE html>`; the end is the start index of the
/// last `closer` (exclusive). `_opener` is not used to bound the match.
///
/// Boundaries follow substring semantics with clamping: a missing marker or
/// closer counts as index 0, and reversed bounds are swapped. Extraction never
/// fails, so callers must check for the marker themselves.
pub fn extract_html_document(text: &str, _opener: &str, closer: &str) -> String {
    let start = text.find(HTML_DOCUMENT_MARKER).unwrap_or(0);
    let end = text.rfind(closer).unwrap_or(0);
    let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
    text[lo..hi].to_string()
}

/// True when `text` carries the marker [`extract_html_document`] anchors on.
pub fn has_html_document(text: &str) -> bool {
    text.contains(HTML_DOCUMENT_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn json_tolerates_surrounding_commentary() {
        let text = "Sure! Here is the spec:\n```json\n{\"spec\": \"Build a {fun} app\"}\n```\nEnjoy.";
        let map = extract_json(text).unwrap();
        assert_eq!(map.get("spec"), Some(&json!("Build a {fun} app")));
    }

    #[test]
    fn json_without_braces_is_malformed() {
        assert!(matches!(extract_json("no payload here"), Err(ExtractError::Malformed(_))));
        assert!(matches!(extract_json("only open {"), Err(ExtractError::Malformed(_))));
        assert!(matches!(extract_json("only close }"), Err(ExtractError::Malformed(_))));
        assert!(matches!(extract_json("} backwards {"), Err(ExtractError::Malformed(_))));
    }

    #[test]
    fn json_with_invalid_body_is_malformed() {
        let err = extract_json("{spec: unquoted}").unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn json_uses_last_closing_brace() {
        // Trailing prose with a stray brace breaks parsing; the boundary rule is kept.
        assert!(extract_json("{\"a\": 1} and then }").is_err());
        let map = extract_json("{\"a\": {\"b\": 2}}").unwrap();
        assert_eq!(map.get("a"), Some(&json!({"b": 2})));
    }

    #[test]
    fn html_end_is_exclusive_of_closer() {
        let out = extract_html_document("prefix <!DOCTYPE html><html></html> END", "X", "END");
        assert_eq!(out, "<!DOCTYPE html><html></html> ");
    }

    #[test]
    fn html_uses_last_closer_occurrence() {
        let text = "```html\n<!DOCTYPE html><p>```inline```</p>\n```\ntrailing";
        let out = extract_html_document(text, "```", "```");
        assert_eq!(out, "<!DOCTYPE html><p>```inline```</p>\n");
    }

    #[test]
    fn html_without_marker_starts_at_beginning() {
        let out = extract_html_document("<html>body</html>```", "```", "```");
        assert_eq!(out, "<html>body</html>");
        assert!(!has_html_document("<html>body</html>```"));
    }

    #[test]
    fn html_without_closer_swaps_bounds() {
        let out = extract_html_document("lead <!DOCTYPE html><html></html>", "```", "```");
        assert_eq!(out, "lead ");
    }
}
