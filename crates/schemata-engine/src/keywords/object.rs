//! Object keywords.
//!
//! Keys matched by several `patternProperties` are validated against every
//! matching schema. `additionalProperties` applies to keys matched by
//! neither `properties` nor any pattern.

use serde_json::Value;

use super::{limit, KeywordCx};
use crate::draft::Keyword;
use crate::error::{ErrorCode, ValidationError};
use crate::node::Dependency;
use crate::reduce::evaluated_shape;

pub(super) fn properties(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let Some(object) = cx.data.as_object() else {
        return Vec::new();
    };
    cx.node
        .properties
        .iter()
        .filter_map(|(key, schema)| object.get(key).map(|value| (key, schema, value)))
        .flat_map(|(key, schema, value)| cx.validate(schema, value, &cx.pointer.join(key)))
        .collect()
}

pub(super) fn pattern_properties(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let Some(object) = cx.data.as_object() else {
        return Vec::new();
    };
    let mut errors = Vec::new();
    for (key, value) in object {
        for (regex, schema) in &cx.node.pattern_properties {
            if regex.is_match(key) {
                errors.extend(cx.validate(schema, value, &cx.pointer.join(key)));
            }
        }
    }
    errors
}

pub(super) fn additional_properties(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let (Some(object), Some(schema)) = (cx.data.as_object(), &cx.node.additional_properties) else {
        return Vec::new();
    };
    let mut errors = Vec::new();
    for (key, value) in object {
        if cx.node.declares_property(key) {
            continue;
        }
        let pointer = cx.pointer.join(key);
        if schema.is_bool(false) {
            errors.push(
                cx.error_at(ErrorCode::NoAdditionalPropertiesError, pointer, value)
                    .with("property", key.as_str()),
            );
        } else {
            errors.extend(cx.validate(schema, value, &pointer));
        }
    }
    errors
}

pub(super) fn property_names(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let (Some(object), Some(schema)) = (cx.data.as_object(), &cx.node.property_names) else {
        return Vec::new();
    };
    let mut errors = Vec::new();
    for key in object.keys() {
        let name = Value::String(key.clone());
        let pointer = cx.pointer.join(key);
        let failures = cx.validate(schema, &name, &pointer);
        if !failures.is_empty() {
            errors.push(
                cx.error_at(ErrorCode::InvalidPropertyNameError, pointer, &name)
                    .with("property", key.as_str())
                    .with_errors(failures),
            );
        }
    }
    errors
}

/// One error per missing name, reported at the object.
pub(super) fn required(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let (Some(object), Some(Value::Array(names))) = (cx.data.as_object(), cx.keyword("required")) else {
        return Vec::new();
    };
    names
        .iter()
        .filter_map(Value::as_str)
        .filter(|name| !object.contains_key(*name))
        .map(|name| cx.error(ErrorCode::RequiredPropertyError).with("key", name))
        .collect()
}

pub(super) fn min_properties(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let (Some(object), Some(min)) = (cx.data.as_object(), limit(cx.keyword("minProperties"))) else {
        return Vec::new();
    };
    if object.len() as u64 >= min {
        return Vec::new();
    }
    vec![cx.error(ErrorCode::MinPropertiesError).with("minProperties", min).with("length", object.len())]
}

pub(super) fn max_properties(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let (Some(object), Some(max)) = (cx.data.as_object(), limit(cx.keyword("maxProperties"))) else {
        return Vec::new();
    };
    if object.len() as u64 <= max {
        return Vec::new();
    }
    vec![cx.error(ErrorCode::MaxPropertiesError).with("maxProperties", max).with("length", object.len())]
}

/// `dependencies`, `dependentRequired` and `dependentSchemas`: entries whose
/// trigger property is present in the object.
pub(super) fn dependencies(cx: &KeywordCx<'_>, keyword: Keyword) -> Vec<ValidationError> {
    let Some(object) = cx.data.as_object() else {
        return Vec::new();
    };
    let mut errors = Vec::new();
    for entry in cx.node.dependencies.iter().filter(|entry| entry.source == keyword) {
        if !object.contains_key(&entry.property) {
            continue;
        }
        match &entry.dependency {
            Dependency::Required(names) => {
                for missing in names.iter().filter(|name| !object.contains_key(name.as_str())) {
                    errors.push(
                        cx.error(ErrorCode::MissingDependencyError)
                            .with("missingProperty", missing.as_str())
                            .with("property", entry.property.as_str()),
                    );
                }
            }
            Dependency::Schema(schema) => errors.extend(cx.validate_here(schema)),
        }
    }
    errors
}

/// Keys evaluated by no keyword of the reduced fragment must satisfy
/// `unevaluatedProperties`.
pub(super) fn unevaluated_properties(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let (Some(object), Some(schema)) = (cx.data.as_object(), &cx.node.unevaluated_properties) else {
        return Vec::new();
    };
    let shape = evaluated_shape(cx.ctx, cx.node, cx.data, cx.pointer, cx.scope);
    if shape.additional_properties.is_some() {
        return Vec::new();
    }
    let mut errors = Vec::new();
    for (key, value) in object {
        if shape.declares_property(key) {
            continue;
        }
        let pointer = cx.pointer.join(key);
        if schema.is_bool(false) {
            errors.push(
                cx.error_at(ErrorCode::UnevaluatedPropertyError, pointer, value)
                    .with("property", key.as_str()),
            );
        } else {
            errors.extend(cx.validate(schema, value, &pointer));
        }
    }
    errors
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
    fn test_properties_point_at_values() {
        let root = compile(&json!({"properties": {"a": {"type": "string"}, "b~c": {"type": "string"}}})).unwrap();
        let errors = root.validate(&json!({"a": 1, "b~c": 2, "other": 3}));
        let pointers: Vec<&str> = errors.iter().map(|e| e.pointer.as_str()).collect();
        assert_eq!(pointers, vec!["#/a", "#/b~0c"]);
    }

    #[test]
    fn test_every_matching_pattern_applies() {
        let schema = json!({"patternProperties": {"^a": {"type": "string"}, "b$": {"minLength": 3}}});
        assert!(codes(schema.clone(), json!({"axb": "xyz"})).is_empty());
        assert_eq!(codes(schema, json!({"ab": "x"})), vec![ErrorCode::MinLengthError]);
    }

    #[test]
    fn test_pattern_and_additional_yield_one_error() {
        let schema = json!({
            "properties": {"id": {}},
            "patternProperties": {"^x-": {}},
            "additionalProperties": false
        });
        let errors = compile(&schema).unwrap().validate(&json!({"id": 1, "x-a": 2, "y": 3}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::NoAdditionalPropertiesError);
        assert_eq!(errors[0].pointer.as_str(), "#/y");
        assert_eq!(errors[0].data["property"], "y");
    }

    #[test]
    fn test_additional_properties_schema() {
        let schema = json!({"properties": {"a": {}}, "additionalProperties": {"type": "integer"}});
        assert!(codes(schema.clone(), json!({"a": "x", "b": 1})).is_empty());
        assert_eq!(codes(schema, json!({"b": "x"})), vec![ErrorCode::TypeError]);
    }

    #[test]
    fn test_property_names() {
        let schema = json!({"propertyNames": {"pattern": "^[a-z]+$"}});
        assert!(codes(schema.clone(), json!({"abc": 1})).is_empty());
        let errors = compile(&schema).unwrap().validate(&json!({"Abc": 1}));
        assert_eq!(errors[0].code, ErrorCode::InvalidPropertyNameError);
        assert_eq!(errors[0].errors[0].code, ErrorCode::PatternError);
    }

    #[test]
    fn test_required_reports_each_missing_key() {
        let errors = compile(&json!({"required": ["a", "b", "c"]})).unwrap().validate(&json!({"b": 1}));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].pointer.as_str(), "#");
        assert_eq!(errors[0].data["key"], "a");
        assert_eq!(errors[1].data["key"], "c");
    }

    #[test]
    fn test_property_counts() {
        let schema = json!({"minProperties": 1, "maxProperties": 2});
        assert_eq!(codes(schema.clone(), json!({})), vec![ErrorCode::MinPropertiesError]);
        assert_eq!(codes(schema, json!({"a": 1, "b": 2, "c": 3})), vec![ErrorCode::MaxPropertiesError]);
    }

    #[test]
    fn test_draft7_dependencies() {
        let schema = json!({"dependencies": {"card": ["billing"], "gift": {"required": ["note"]}}});
        let root = SchemaCompiler::new().draft(Draft::Draft7).compile(&schema).unwrap();
        assert!(root.is_valid(&json!({"other": 1})));
        let errors = root.validate(&json!({"card": 1}));
        assert_eq!(errors[0].code, ErrorCode::MissingDependencyError);
        assert_eq!(errors[0].data["missingProperty"], "billing");
        assert_eq!(errors[0].data["property"], "card");
        let errors = root.validate(&json!({"gift": 1}));
        assert_eq!(errors[0].code, ErrorCode::RequiredPropertyError);
    }

    #[test]
    fn test_dependent_required_and_schemas() {
        let schema = json!({
            "dependentRequired": {"a": ["b"]},
            "dependentSchemas": {"c": {"properties": {"d": {"type": "string"}}}}
        });
        assert_eq!(codes(schema.clone(), json!({"a": 1})), vec![ErrorCode::MissingDependencyError]);
        assert_eq!(codes(schema.clone(), json!({"c": 1, "d": 2})), vec![ErrorCode::TypeError]);
        assert!(codes(schema, json!({"d": 2})).is_empty());
    }

    #[test]
    fn test_unevaluated_properties_local() {
        let schema = json!({"properties": {"a": {}}, "patternProperties": {"^x": {}}, "unevaluatedProperties": false});
        assert!(codes(schema.clone(), json!({"a": 1, "xy": 2})).is_empty());
        let errors = compile(&schema).unwrap().validate(&json!({"a": 1, "b": 2}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::UnevaluatedPropertyError);
        assert_eq!(errors[0].pointer.as_str(), "#/b");
    }

    #[test]
    fn test_unevaluated_properties_sees_selected_branches() {
        let schema = json!({
            "type": "object",
            "properties": {"kind": {"enum": ["a", "b"]}},
            "if": {"properties": {"kind": {"const": "a"}}},
            "then": {"properties": {"alpha": {"type": "number"}}},
            "else": {"properties": {"beta": {"type": "number"}}},
            "unevaluatedProperties": false
        });
        assert!(codes(schema.clone(), json!({"kind": "a", "alpha": 1})).is_empty());
        assert!(codes(schema.clone(), json!({"kind": "b", "beta": 1})).is_empty());
        assert_eq!(
            codes(schema, json!({"kind": "a", "beta": 1})),
            vec![ErrorCode::UnevaluatedPropertyError]
        );
    }

    #[test]
    fn test_unevaluated_properties_through_ref_merge() {
        let schema = json!({
            "$defs": {"base": {"properties": {"name": {"type": "string"}}}},
            "$ref": "#/$defs/base",
            "unevaluatedProperties": false
        });
        assert!(codes(schema.clone(), json!({"name": "x"})).is_empty());
        assert_eq!(codes(schema, json!({"name": "x", "age": 3})), vec![ErrorCode::UnevaluatedPropertyError]);
    }

    /// Known limitation: a member only sees what its own reduced fragment
    /// evaluates, not properties declared by a sibling `allOf` member.
    #[test]
    fn test_unevaluated_properties_ignores_sibling_member_limitation() {
        let schema = json!({"allOf": [{"properties": {"a": {}}}, {"unevaluatedProperties": false}]});
        let errors = compile(&schema).unwrap().validate(&json!({"a": 1}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::AllOfError);
        let nested: Vec<ErrorCode> = errors[0].errors.iter().map(|e| e.code).collect();
        assert_eq!(nested, vec![ErrorCode::UnevaluatedPropertyError]);
        assert_eq!(errors[0].errors[0].pointer.as_str(), "#/a");
    }

    #[test]
    fn test_unevaluated_properties_schema() {
        let schema = json!({"properties": {"a": {}}, "unevaluatedProperties": {"type": "boolean"}});
        assert!(codes(schema.clone(), json!({"a": 1, "b": true})).is_empty());
        assert_eq!(codes(schema, json!({"b": 1})), vec![ErrorCode::TypeError]);
    }
}
