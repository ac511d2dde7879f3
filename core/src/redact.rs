//! Payload redaction.
//!
//! Replaces the values of sensitive keys with [`REDACTED_MARKER`] at any
//! nesting depth before an event is stored or handed to observers.

use crate::models::Payload;
use serde_json::Value;
use thiserror::Error;

/// Value written in place of a sensitive field.
pub const REDACTED_MARKER: &str = "[REDACTED]";

/// Key substrings (lowercase) that mark a field as sensitive.
pub const SENSITIVE_KEYS: [&str; 5] = ["password", "token", "key", "secret", "auth"];

/// Maximum nesting depth walked before redaction gives up.
pub const MAX_DEPTH: usize = 32;

/// Errors that can occur during redaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedactionError {
    /// The payload nests deeper than [`MAX_DEPTH`].
    #[error("Payload exceeds maximum nesting depth of {max}")]
    DepthExceeded {
        /// The configured limit.
        max: usize,
    },
}

/// Returns true if `key` names a sensitive field.
#[must_use]
pub fn is_sensitive_key(key: &str) -> bool {
    let lowered = key.to_lowercase();
    SENSITIVE_KEYS.iter().any(|needle| lowered.contains(needle))
}

/// Returns a redacted copy of `payload`.
///
/// # Errors
///
/// Returns [`RedactionError::DepthExceeded`] if the payload nests deeper than
/// [`MAX_DEPTH`] levels.
///
/// # Example
///
/// ```
/// use logbook_core::redact::{redact, REDACTED_MARKER};
/// use serde_json::json;
///
/// let payload = json!({"user": "ada", "api_key": "k-123"});
/// let redacted = redact(payload.as_object().unwrap()).unwrap();
///
/// assert_eq!(redacted["user"], "ada");
/// assert_eq!(redacted["api_key"], REDACTED_MARKER);
/// ```
pub fn redact(payload: &Payload) -> Result<Payload, RedactionError> {
    redact_map(payload, 1)
}

fn redact_map(map: &Payload, depth: usize) -> Result<Payload, RedactionError> {
    if depth > MAX_DEPTH {
        return Err(RedactionError::DepthExceeded { max: MAX_DEPTH });
    }

    map.iter()
        .map(|(key, value)| {
            let value = if is_sensitive_key(key) {
                Value::String(REDACTED_MARKER.to_string())
            } else {
                redact_value(value, depth)?
            };
            Ok::<_, RedactionError>((key.clone(), value))
        })
        .collect()
}

fn redact_value(value: &Value, depth: usize) -> Result<Value, RedactionError> {
    match value {
        Value::Object(map) => Ok(Value::Object(redact_map(map, depth + 1)?)),
        Value::Array(items) => {
            if depth + 1 > MAX_DEPTH {
                return Err(RedactionError::DepthExceeded { max: MAX_DEPTH });
            }
            items
                .iter()
                .map(|item| redact_value(item, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => panic!("test payload must be an object"),
        }
    }

    #[test]
    fn test_redacts_top_level_and_nested() {
        let input = payload(json!({
            "password": "x",
            "nested": {"secret": "y"},
            "safe": "z"
        }));

        let output = redact(&input).unwrap();

        assert_eq!(output["password"], REDACTED_MARKER);
        assert_eq!(output["nested"]["secret"], REDACTED_MARKER);
        assert_eq!(output["safe"], "z");
    }

    #[test]
    fn test_key_match_is_case_insensitive_substring() {
        let input = payload(json!({
            "X-Auth-Header": "bearer abc",
            "refreshTOKEN": "t",
            "PrimaryKey": 7,
            "monkey": "banana",
            "author": "ada",
            "user": "grace"
        }));

        let output = redact(&input).unwrap();

        assert_eq!(output["X-Auth-Header"], REDACTED_MARKER);
        assert_eq!(output["refreshTOKEN"], REDACTED_MARKER);
        assert_eq!(output["PrimaryKey"], REDACTED_MARKER);
        assert_eq!(output["monkey"], REDACTED_MARKER);
        assert_eq!(output["author"], REDACTED_MARKER);
        assert_eq!(output["user"], "grace");
    }

    #[test]
    fn test_sensitive_object_value_is_replaced_whole() {
        let input = payload(json!({"credentials_secret": {"user": "a", "pw": "b"}}));
        let output = redact(&input).unwrap();
        assert_eq!(output["credentials_secret"], REDACTED_MARKER);
    }

    #[test]
    fn test_redacts_inside_arrays() {
        let input = payload(json!({
            "users": [
                {"name": "a", "password": "1"},
                {"name": "b", "password": "2"}
            ]
        }));

        let output = redact(&input).unwrap();

        assert_eq!(output["users"][0]["password"], REDACTED_MARKER);
        assert_eq!(output["users"][1]["password"], REDACTED_MARKER);
        assert_eq!(output["users"][1]["name"], "b");
    }

    #[test]
    fn test_input_is_not_modified() {
        let input = payload(json!({"token": "abc"}));
        let _ = redact(&input).unwrap();
        assert_eq!(input["token"], "abc");
    }

    #[test]
    fn test_depth_limit() {
        let mut value = json!({"leaf": true});
        for _ in 0..MAX_DEPTH {
            value = json!({ "child": value });
        }
        let input = payload(value);

        assert_eq!(
            redact(&input),
            Err(RedactionError::DepthExceeded { max: MAX_DEPTH })
        );
    }

    #[test]
    fn test_depth_at_limit_is_accepted() {
        let mut value = json!({"password": "deep"});
        for _ in 0..(MAX_DEPTH - 1) {
            value = json!({ "child": value });
        }
        let input = payload(value);

        let mut current = Value::Object(redact(&input).unwrap());
        for _ in 0..(MAX_DEPTH - 1) {
            current = current["child"].take();
        }
        assert_eq!(current["password"], REDACTED_MARKER);
    }
}
