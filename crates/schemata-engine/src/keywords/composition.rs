//! Composition keywords. Member failures are wrapped in one composition
//! error carrying the sub-errors; `if/then/else` reports the selected
//! branch's errors directly.

use super::KeywordCx;
use crate::error::{ErrorCode, ValidationError};
use crate::reduce::select_one_of;

pub(super) fn not(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let Some(schema) = &cx.node.not else {
        return Vec::new();
    };
    if !cx.is_valid_here(schema) {
        return Vec::new();
    }
    vec![cx.error(ErrorCode::NotError)]
}

pub(super) fn all_of(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let failures: Vec<ValidationError> = cx.node.all_of.iter().flat_map(|member| cx.validate_here(member)).collect();
    if failures.is_empty() {
        return Vec::new();
    }
    vec![cx.error(ErrorCode::AllOfError).with_errors(failures)]
}

pub(super) fn any_of(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let mut failures = Vec::new();
    for member in &cx.node.any_of {
        let errors = cx.validate_here(member);
        if errors.is_empty() {
            return Vec::new();
        }
        failures.extend(errors);
    }
    vec![cx.error(ErrorCode::AnyOfError).with_errors(failures)]
}

pub(super) fn one_of(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    match select_one_of(cx.ctx, cx.node, cx.data, cx.pointer, cx.scope) {
        Ok(choice) => choice.errors,
        Err(error) => vec![error],
    }
}

pub(super) fn if_then_else(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let Some(condition) = &cx.node.if_ else {
        return Vec::new();
    };
    let branch = if cx.is_valid_here(condition) {
        &cx.node.then_
    } else {
        &cx.node.else_
    };
    branch.as_ref().map_or_else(Vec::new, |branch| cx.validate_here(branch))
}

#[cfg(test)]
mod tests {
    use crate::{compile, ErrorCode, SchemaCompiler};
    use schemata_core::Draft;
    use serde_json::{json, Value};

    fn codes(schema: Value, data: Value) -> Vec<ErrorCode> {
        compile(&schema).unwrap().validate(&data).iter().map(|e| e.code).collect()
    }

    #[test]
    fn test_not() {
        let schema = json!({"not": {"type": "string"}});
        assert!(codes(schema.clone(), json!(1)).is_empty());
        assert_eq!(codes(schema, json!("x")), vec![ErrorCode::NotError]);
    }

    #[test]
    fn test_all_of_wraps_member_errors() {
        let root = compile(&json!({"allOf": [{"type": "integer"}, {"minimum": 10}, {"maximum": 0}]})).unwrap();
        let errors = root.validate(&json!(5.5));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::AllOfError);
        let inner: Vec<ErrorCode> = errors[0].errors.iter().map(|e| e.code).collect();
        assert_eq!(inner, vec![ErrorCode::TypeError, ErrorCode::MinimumError, ErrorCode::MaximumError]);
    }

    #[test]
    fn test_any_of() {
        let schema = json!({"anyOf": [{"type": "string"}, {"minimum": 3}]});
        assert!(codes(schema.clone(), json!("x")).is_empty());
        assert!(codes(schema.clone(), json!(4)).is_empty());
        let errors = compile(&schema).unwrap().validate(&json!(1));
        assert_eq!(errors[0].code, ErrorCode::AnyOfError);
        assert_eq!(errors[0].errors.len(), 2);
    }

    #[test]
    fn test_one_of_exactness() {
        let errors = compile(&json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]})).unwrap().validate(&json!(3));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::MultipleOneOfError);
        assert!(codes(json!({"oneOf": [{"type": "integer"}, {"type": "string"}]}), json!(3)).is_empty());
        assert_eq!(
            codes(json!({"oneOf": [{"type": "integer"}, {"type": "string"}]}), json!(null)),
            vec![ErrorCode::OneOfError]
        );
    }

    #[test]
    fn test_discriminated_branch_errors_surface() {
        let schema = json!({
            "type": "object",
            "discriminator": {"propertyName": "kind"},
            "oneOf": [
                {"properties": {"kind": {"const": "cat"}, "lives": {"type": "integer"}}},
                {"properties": {"kind": {"const": "dog"}, "bark": {"type": "string"}}}
            ]
        });
        assert!(codes(schema.clone(), json!({"kind": "cat", "lives": 9})).is_empty());
        assert_eq!(codes(schema.clone(), json!({"kind": "cat", "lives": "nine"})), vec![ErrorCode::TypeError]);
        assert_eq!(codes(schema, json!({"lives": 9})), vec![ErrorCode::MissingOneOfDiscriminatorError]);
    }

    #[test]
    fn test_if_then_else_reports_branch_errors() {
        let schema = json!({
            "if": {"type": "integer"},
            "then": {"minimum": 10},
            "else": {"type": "string"}
        });
        assert!(codes(schema.clone(), json!(12)).is_empty());
        assert_eq!(codes(schema.clone(), json!(3)), vec![ErrorCode::MinimumError]);
        assert_eq!(codes(schema, json!(2.5)), vec![ErrorCode::TypeError]);
    }

    #[test]
    fn test_if_without_branches_is_ignored() {
        assert!(codes(json!({"if": {"type": "string"}}), json!(3)).is_empty());
        let root = SchemaCompiler::new()
            .draft(Draft::Draft6)
            .compile(&json!({"if": {"type": "string"}, "then": false}))
            .unwrap();
        assert!(root.is_valid(&json!("x")));
    }
}
