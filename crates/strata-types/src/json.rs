//! The JSON object model used for settings files.

/// A JSON value of any shape.
pub type JsonValue = serde_json::Value;

/// A mapping from string keys to arbitrary JSON values.
///
/// This is the in-memory form of a settings file and the unit the dotted-path
/// accessor operates on.
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Parse `bytes` as a JSON object.
///
/// Returns `None` if the bytes are not valid JSON or the top-level value is
/// not an object.
pub fn parse_object(bytes: &[u8]) -> Option<JsonObject> {
    match serde_json::from_slice::<JsonValue>(bytes) {
        Ok(JsonValue::Object(map)) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_objects() {
        let obj = parse_object(br#"{"a": 1}"#).unwrap();
        assert_eq!(obj["a"], 1);
    }

    #[test]
    fn rejects_non_objects() {
        assert!(parse_object(b"[1, 2]").is_none());
        assert!(parse_object(b"42").is_none());
        assert!(parse_object(b"{not json").is_none());
        assert!(parse_object(b"").is_none());
    }
}
