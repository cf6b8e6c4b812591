//! Array keywords.

use std::collections::HashMap;

use schemata_core::{json_equal, CanonicalBytes, Draft};

use super::{limit, KeywordCx};
use crate::error::{ErrorCode, ValidationError};
use crate::reduce::evaluated_shape;

/// `items`, `prefixItems` and `additionalItems`: positional schemas first,
/// the rest schema for everything past the tuple.
pub(super) fn items(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let Some(items) = cx.data.as_array() else {
        return Vec::new();
    };
    let tuple = &cx.node.tuple_items;
    let mut errors = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let pointer = cx.pointer.join_index(index);
        let schema = match (tuple.get(index), &cx.node.rest_items) {
            (Some(schema), _) | (None, Some(schema)) => schema,
            (None, None) => break,
        };
        if index >= tuple.len() && schema.is_bool(false) {
            errors.push(cx.error_at(ErrorCode::AdditionalItemsError, pointer, item).with("index", index));
            continue;
        }
        errors.extend(cx.validate(schema, item, &pointer));
    }
    errors
}

pub(super) fn contains(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let (Some(items), Some(schema)) = (cx.data.as_array(), &cx.node.contains) else {
        return Vec::new();
    };
    let bounded = cx.ctx.caps.draft() >= Draft::Draft2019_09;
    let min = if bounded { limit(cx.keyword("minContains")) } else { None };
    let max = if bounded { limit(cx.keyword("maxContains")) } else { None };

    let count = items
        .iter()
        .enumerate()
        .filter(|(index, item)| cx.validate(schema, item, &cx.pointer.join_index(*index)).is_empty())
        .count() as u64;

    let mut errors = Vec::new();
    match min {
        None if count == 0 => errors.push(cx.error(ErrorCode::ContainsError)),
        Some(min) if count < min => {
            errors.push(cx.error(ErrorCode::ContainsMinError).with("minContains", min).with("count", count));
        }
        _ => {}
    }
    if let Some(max) = max.filter(|max| count > *max) {
        errors.push(cx.error(ErrorCode::ContainsMaxError).with("maxContains", max).with("count", count));
    }
    errors
}

pub(super) fn min_items(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let (Some(items), Some(min)) = (cx.data.as_array(), limit(cx.keyword("minItems"))) else {
        return Vec::new();
    };
    if items.len() as u64 >= min {
        return Vec::new();
    }
    vec![cx.error(ErrorCode::MinItemsError).with("minItems", min).with("length", items.len())]
}

pub(super) fn max_items(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let (Some(items), Some(max)) = (cx.data.as_array(), limit(cx.keyword("maxItems"))) else {
        return Vec::new();
    };
    if items.len() as u64 <= max {
        return Vec::new();
    }
    vec![cx.error(ErrorCode::MaxItemsError).with("maxItems", max).with("length", items.len())]
}

/// One error per item equal to an earlier item, reported at the duplicate.
pub(super) fn unique_items(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let Some(items) = cx.data.as_array() else {
        return Vec::new();
    };
    if cx.keyword("uniqueItems").and_then(|v| v.as_bool()) != Some(true) {
        return Vec::new();
    }
    let mut first_seen: HashMap<CanonicalBytes, usize> = HashMap::new();
    let mut errors = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let first = match CanonicalBytes::new(item) {
            Ok(bytes) => *first_seen.entry(bytes).or_insert(index),
            Err(_) => items[..index].iter().position(|earlier| json_equal(earlier, item)).unwrap_or(index),
        };
        if first != index {
            errors.push(
                cx.error_at(ErrorCode::UniqueItemsError, cx.pointer.join_index(index), item)
                    .with("duplicate", index)
                    .with("first", first),
            );
        }
    }
    errors
}

/// Items covered by neither the tuple, the rest schema nor (2020-12)
/// `contains` must satisfy `unevaluatedItems`.
pub(super) fn unevaluated_items(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let (Some(items), Some(schema)) = (cx.data.as_array(), &cx.node.unevaluated_items) else {
        return Vec::new();
    };
    let shape = evaluated_shape(cx.ctx, cx.node, cx.data, cx.pointer, cx.scope);
    if shape.rest_items.is_some() {
        return Vec::new();
    }
    let contains = shape.contains.as_ref().filter(|_| cx.ctx.caps.contains_evaluates_items());
    let mut errors = Vec::new();
    for (index, item) in items.iter().enumerate().skip(shape.tuple_items.len()) {
        let pointer = cx.pointer.join_index(index);
        if contains.is_some_and(|contains| cx.validate(contains, item, &pointer).is_empty()) {
            continue;
        }
        if schema.is_bool(false) {
            errors.push(cx.error_at(ErrorCode::UnevaluatedItemsError, pointer, item).with("index", index));
        } else {
            errors.extend(cx.validate(schema, item, &pointer));
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use crate::{compile, ErrorCode, SchemaCompiler};
    use schemata_core::Draft;
    use serde_json::json;

    fn codes(root: &crate::SchemaNode, data: serde_json::Value) -> Vec<ErrorCode> {
        root.validate(&data).iter().map(|e| e.code).collect()
    }

    #[test]
    fn test_items_uniform() {
        let root = compile(&json!({"items": {"type": "integer"}})).unwrap();
        assert!(root.is_valid(&json!([1, 2, 3])));
        let errors = root.validate(&json!([1, "x", 3, "y"]));
        let pointers: Vec<&str> = errors.iter().map(|e| e.pointer.as_str()).collect();
        assert_eq!(pointers, vec!["#/1", "#/3"]);
    }

    #[test]
    fn test_prefix_items_with_false_rest() {
        let root = compile(&json!({"prefixItems": [{"type": "string"}, {"type": "number"}], "items": false})).unwrap();
        assert!(root.is_valid(&json!(["a", 1])));
        assert!(root.is_valid(&json!(["a"])));
        let errors = root.validate(&json!(["a", 1, true, null]));
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.code == ErrorCode::AdditionalItemsError));
        assert_eq!(errors[0].pointer.as_str(), "#/2");
        assert_eq!(errors[1].data["index"], 3);
    }

    #[test]
    fn test_legacy_tuple_and_additional_items() {
        let schema = json!({"items": [{"type": "string"}], "additionalItems": {"type": "boolean"}});
        let root = SchemaCompiler::new().draft(Draft::Draft7).compile(&schema).unwrap();
        assert!(root.is_valid(&json!(["a", true, false])));
        assert_eq!(codes(&root, json!(["a", 1])), vec![ErrorCode::TypeError]);
        let loose = SchemaCompiler::new()
            .draft(Draft::Draft7)
            .compile(&json!({"additionalItems": false}))
            .unwrap();
        assert!(loose.is_valid(&json!([1, 2])));
    }

    #[test]
    fn test_contains_default_minimum() {
        let root = compile(&json!({"contains": {"const": 5}})).unwrap();
        assert!(root.is_valid(&json!([1, 5])));
        assert_eq!(codes(&root, json!([1, 2])), vec![ErrorCode::ContainsError]);
        assert_eq!(codes(&root, json!([])), vec![ErrorCode::ContainsError]);
    }

    #[test]
    fn test_min_and_max_contains() {
        let root = compile(&json!({"contains": {"type": "string"}, "minContains": 2, "maxContains": 3})).unwrap();
        assert!(root.is_valid(&json!(["a", "b", 1])));
        assert_eq!(codes(&root, json!(["a", 1])), vec![ErrorCode::ContainsMinError]);
        assert_eq!(codes(&root, json!(["a", "b", "c", "d"])), vec![ErrorCode::ContainsMaxError]);
        let zero = compile(&json!({"contains": {"type": "string"}, "minContains": 0})).unwrap();
        assert!(zero.is_valid(&json!([])));
    }

    #[test]
    fn test_draft7_ignores_min_contains() {
        let schema = json!({"contains": {"type": "string"}, "minContains": 2});
        let root = SchemaCompiler::new().draft(Draft::Draft7).compile(&schema).unwrap();
        assert!(root.is_valid(&json!(["a"])));
    }

    #[test]
    fn test_min_and_max_items() {
        let root = compile(&json!({"minItems": 1, "maxItems": 2})).unwrap();
        assert_eq!(codes(&root, json!([])), vec![ErrorCode::MinItemsError]);
        assert_eq!(codes(&root, json!([1, 2, 3])), vec![ErrorCode::MaxItemsError]);
        assert!(root.is_valid(&json!([1, 2])));
    }

    #[test]
    fn test_unique_items_deep_equality() {
        let root = compile(&json!({"uniqueItems": true})).unwrap();
        assert!(root.is_valid(&json!([1, "1", [1], {"a": 1}])));
        let errors = root.validate(&json!([{"a": 1, "b": 2}, 1, {"b": 2, "a": 1}, 1.0, 1]));
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].pointer.as_str(), "#/2");
        assert_eq!(errors[0].data["first"], 0);
        assert_eq!(errors[1].data["first"], 1);
        assert_eq!(errors[2].data["duplicate"], 4);
        assert!(compile(&json!({"uniqueItems": false})).unwrap().is_valid(&json!([1, 1])));
    }

    #[test]
    fn test_unevaluated_items_after_prefix() {
        let root = compile(&json!({"prefixItems": [{"type": "string"}], "unevaluatedItems": false})).unwrap();
        assert!(root.is_valid(&json!(["a"])));
        let errors = root.validate(&json!(["a", 1]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::UnevaluatedItemsError);
        assert_eq!(errors[0].pointer.as_str(), "#/1");
    }

    #[test]
    fn test_unevaluated_items_sees_composition() {
        let schema = json!({
            "allOf": [{"prefixItems": [true, true]}],
            "anyOf": [{"items": {"type": "integer"}}, {"contains": true}],
            "unevaluatedItems": false
        });
        let root = compile(&schema).unwrap();
        assert!(root.is_valid(&json!(["a", "b", 3])));
    }

    #[test]
    fn test_unevaluated_items_with_contains() {
        let root = compile(&json!({"contains": {"type": "string"}, "unevaluatedItems": {"type": "number"}})).unwrap();
        assert!(root.is_valid(&json!(["a", 1, "b"])));
        assert_eq!(codes(&root, json!(["a", null])), vec![ErrorCode::TypeError]);
    }
}
