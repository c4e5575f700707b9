//! Helpers shared by the tool entry points.

use serde::Serialize;
use serde_json::{Value, json};
use strava_activity_client::RawActivity;

use crate::{ToolError, ToolResult};

/// Turn a tool result into the value handed to the caller: the payload on
/// success, `{"error": message}` on failure.
pub fn into_tool_response<T: Serialize>(tool: &str, result: ToolResult<T>) -> Value {
    match result.and_then(|v| serde_json::to_value(v).map_err(ToolError::from)) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(tool, error = %e, "tool call failed");
            json!({ "error": e.to_string() })
        }
    }
}

/// True when `value` is an `{"error": ...}` response.
pub fn is_error_response(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|o| o.len() == 1 && o.contains_key("error"))
}

/// Convert loosely typed JSON items into activity views, rejecting non-objects.
pub fn to_raw_activities(items: Vec<Value>) -> ToolResult<Vec<RawActivity>> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            RawActivity::try_from(item).map_err(|other| {
                ToolError::Validation(format!("activity #{i} is not an object: {other}"))
            })
        })
        .collect()
}

/// First non-blank value of `param` or `fallback`.
pub fn pick(param: Option<String>, fallback: Option<&str>) -> Option<String> {
    param
        .filter(|s| !s.trim().is_empty())
        .or_else(|| fallback.map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_responses_are_tagged() {
        let v = into_tool_response::<()>("t", Err(ToolError::Validation("nope".into())));
        assert_eq!(v, json!({"error": "Validation error: nope"}));
        assert!(is_error_response(&v));
        assert!(!is_error_response(&json!({"error": 1, "overall": {}})));
    }

    #[test]
    fn success_passes_payload_through() {
        let v = into_tool_response("t", Ok(vec![1, 2]));
        assert_eq!(v, json!([1, 2]));
    }

    #[test]
    fn non_object_activity_is_rejected_with_position() {
        let err = to_raw_activities(vec![json!({"id": 1}), json!(3)]).unwrap_err();
        assert!(err.to_string().contains("#1"));
    }

    #[test]
    fn pick_prefers_non_blank_param() {
        assert_eq!(pick(Some("a".into()), Some("b")), Some("a".into()));
        assert_eq!(pick(Some(" ".into()), Some("b")), Some("b".into()));
        assert_eq!(pick(None, None), None);
    }
}
