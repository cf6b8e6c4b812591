//! Keywords that apply to every value type.

use serde_json::Value;

use schemata_core::{json_equal, JsonType};

use super::KeywordCx;
use crate::error::{ErrorCode, ValidationError};

pub(super) fn type_(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let Some(types) = &cx.node.types else {
        return Vec::new();
    };
    if types.iter().any(|ty| ty.matches(cx.data)) {
        return Vec::new();
    }
    let expected: Vec<&str> = types.iter().map(JsonType::as_str).collect();
    vec![cx
        .error(ErrorCode::TypeError)
        .with("expected", expected)
        .with("received", JsonType::of_refined(cx.data).as_str())]
}

pub(super) fn enum_(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let Some(Value::Array(values)) = cx.keyword("enum") else {
        return Vec::new();
    };
    if values.iter().any(|candidate| json_equal(candidate, cx.data)) {
        return Vec::new();
    }
    vec![cx.error(ErrorCode::EnumError).with("values", values.clone())]
}

pub(super) fn const_(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let Some(expected) = cx.keyword("const") else {
        return Vec::new();
    };
    if json_equal(expected, cx.data) {
        return Vec::new();
    }
    vec![cx.error(ErrorCode::ConstError).with("expected", expected.clone())]
}

pub(super) fn format(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let Some(name) = cx.keyword("format").and_then(Value::as_str) else {
        return Vec::new();
    };
    let Some(validator) = cx.ctx.formats.get(name) else {
        tracing::debug!(format = name, "unknown format skipped");
        return Vec::new();
    };
    if validator(&cx.node.schema, cx.data) {
        return Vec::new();
    }
    vec![cx.error(ErrorCode::FormatError).with("format", name)]
}

#[cfg(test)]
mod tests {
    use crate::{compile, ErrorCode, SchemaCompiler};
    use serde_json::json;

    #[test]
    fn test_type_reports_expected_and_received() {
        let errors = compile(&json!({"type": ["string", "null"]})).unwrap().validate(&json!(4));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::TypeError);
        assert_eq!(errors[0].data["expected"], json!(["string", "null"]));
        assert_eq!(errors[0].data["received"], "integer");
    }

    #[test]
    fn test_integer_type_accepts_integral_floats() {
        let root = compile(&json!({"type": "integer"})).unwrap();
        assert!(root.is_valid(&json!(2.0)));
        assert!(!root.is_valid(&json!(2.5)));
        assert!(compile(&json!({"type": "number"})).unwrap().is_valid(&json!(2)));
    }

    #[test]
    fn test_enum_uses_deep_equality() {
        let root = compile(&json!({"enum": [{"b": 2, "a": 1}, 3]})).unwrap();
        assert!(root.is_valid(&json!({"a": 1, "b": 2})));
        assert!(root.is_valid(&json!(3.0)));
        let errors = root.validate(&json!("3"));
        assert_eq!(errors[0].code, ErrorCode::EnumError);
    }

    #[test]
    fn test_const() {
        let root = compile(&json!({"const": [1, {"x": null}]})).unwrap();
        assert!(root.is_valid(&json!([1, {"x": null}])));
        assert!(!root.is_valid(&json!([1, {"x": 0}])));
        assert!(!compile(&json!({"const": false})).unwrap().is_valid(&json!(0)));
    }

    #[test]
    fn test_format_known_and_unknown() {
        let root = compile(&json!({"format": "ipv4"})).unwrap();
        assert!(root.is_valid(&json!("10.0.0.1")));
        assert_eq!(root.validate(&json!("10.0.0"))[0].code, ErrorCode::FormatError);
        assert!(compile(&json!({"format": "postal-code"})).unwrap().is_valid(&json!("anything")));
    }

    #[test]
    fn test_custom_format_receives_schema() {
        let root = SchemaCompiler::new()
            .format("even-length", |schema, value| {
                assert_eq!(schema["format"], "even-length");
                value.as_str().map_or(true, |s| s.len() % 2 == 0)
            })
            .compile(&json!({"format": "even-length"}))
            .unwrap();
        assert!(root.is_valid(&json!("ab")));
        assert!(!root.is_valid(&json!("abc")));
    }
}
