//! Free-form JSON column values.

/// Any JSON value: string, number, boolean, null, an object mapping strings to JSON, or an
/// array of JSON. Used for columns without a fixed shape.
pub type Json = serde_json::Value;

/// Short JSON type label used in diagnostics; "integer" only for values that fit `i64`.
pub fn type_name(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(n) if n.is_i64() => "integer",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::type_name;
    use serde_json::json;

    #[test]
    fn type_name_distinguishes_integers_from_floats() {
        assert_eq!(type_name(&json!(3)), "integer");
        assert_eq!(type_name(&json!(3.5)), "number");
        assert_eq!(type_name(&json!(u64::MAX)), "number");
        assert_eq!(type_name(&json!(null)), "null");
        assert_eq!(type_name(&json!({"a": [1, "b"]})), "object");
    }
}
