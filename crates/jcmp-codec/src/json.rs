use jcmp_types::Value;

use crate::error::CodecResult;

/// Decode a JSON document.
pub fn decode_json(text: &str) -> CodecResult<Value> {
    let raw: serde_json::Value = serde_json::from_str(text)?;
    Ok(Value::from(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;

    #[test]
    fn decodes_nested_document() {
        let value = decode_json(r#"{"a": [1, {"b": null}], "c": "x"}"#).unwrap();
        assert_eq!(value.get("c"), Some(&Value::from("x")));
        assert_eq!(value.get("a").and_then(Value::as_array).map(<[Value]>::len), Some(2));
    }

    #[test]
    fn rejects_malformed_json() {
        match decode_json("{\"a\": ") {
            Err(CodecError::Json(_)) => {}
            other => panic!("expected Json error, got {:?}", other),
        }
    }
}
