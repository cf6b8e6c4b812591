//! # Reference Resolver
//!
//! Resolves `$ref`, `$recursiveRef` (2019-09) and `$dynamicRef` (2020-12)
//! against the context index and the dynamic scope.
//!
//! ## Replace vs merge
//!
//! Drafts 4-7 **replace** a schema carrying `$ref` by the target; every
//! sibling keyword is ignored. Drafts 2019-09 and 2020-12 **merge** the
//! target with the referencing schema's non-trivial siblings
//! (`merge(target, siblings)`), so `{"$ref": "#/$defs/a", "required": ["x"]}`
//! behaves as the target plus the extra requirement. Relative references
//! inside the target are rebased to absolute URIs first, so they keep
//! pointing where they pointed in the target's own resource.
//!
//! ## Dynamic references
//!
//! Both dynamic forms resolve statically first. If the static target opts
//! in (`$recursiveAnchor: true`, or a `$dynamicAnchor` equal to the
//! reference's fragment), the outermost resource in the dynamic scope that
//! declares the same anchor wins.
//!
//! ## Termination
//!
//! Chains (`a → b → c`) are followed until a target without reference is
//! reached. A target seen twice in one chain is a pure reference cycle and
//! resolves to `Unresolved`. Nothing is cached per node.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use url::Url;

use crate::compile::compile_transient;
use crate::context::{split_reference, Context};
use crate::merge::merge;
use crate::node::{CompiledNode, RefKind, Scope};
use crate::SchemaNode;

/// Outcome of resolving a node's reference.
#[derive(Debug, Clone)]
pub enum RefResolution {
    /// The node carries no reference keyword.
    NoRef,
    /// The effective node after following (and, from 2019-09, merging)
    /// every reference.
    Resolved(SchemaNode),
    /// The reference (as written) could not be resolved.
    Unresolved(String),
}

impl RefResolution {
    /// The resolved node, if any.
    pub fn resolved(self) -> Option<SchemaNode> {
        match self {
            Self::Resolved(node) => Some(node),
            Self::NoRef | Self::Unresolved(_) => None,
        }
    }

    /// Whether resolution failed.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved(_))
    }
}

/// Internal outcome: the effective node and the scope extended by every
/// target visited on the way.
#[derive(Debug)]
pub(crate) enum Resolution {
    NoRef,
    Resolved { node: Arc<CompiledNode>, scope: Scope },
    Unresolved(String),
}

/// Keywords that never make a `$ref` sibling worth merging.
const TRIVIAL_SIBLINGS: &[&str] = &[
    "$ref",
    "$recursiveRef",
    "$dynamicRef",
    "$schema",
    "$id",
    "id",
    "$anchor",
    "$dynamicAnchor",
    "$recursiveAnchor",
    "$comment",
    "$defs",
    "definitions",
    "$vocabulary",
    "title",
    "description",
    "examples",
    "default",
];

/// Keywords dropped from the referencing schema before merging.
const STRIPPED_SIBLINGS: &[&str] = &[
    "$ref",
    "$recursiveRef",
    "$dynamicRef",
    "$schema",
    "$id",
    "id",
    "$anchor",
    "$dynamicAnchor",
    "$recursiveAnchor",
    "$defs",
    "definitions",
];

/// Keywords whose values are data, not schemas; rebasing skips them.
const DATA_KEYWORDS: &[&str] = &["enum", "const", "default", "examples"];

pub(crate) fn resolve(ctx: &Context, node: &Arc<CompiledNode>, scope: &Scope) -> Resolution {
    if node.reference.is_none() {
        return Resolution::NoRef;
    }
    let mut current = Arc::clone(node);
    let mut scope = scope.clone();
    let mut seen: HashSet<String> = HashSet::new();
    while let Some((kind, reference)) = current.reference.clone() {
        let Some(target) = lookup_target(ctx, &current, kind, &reference, &scope) else {
            tracing::trace!(%reference, from = %current.location, "unresolved reference");
            return Resolution::Unresolved(reference);
        };
        if !seen.insert(target.location.clone()) {
            tracing::trace!(%reference, target = %target.location, "reference cycle");
            return Resolution::Unresolved(reference);
        }
        tracing::trace!(%reference, target = %target.location, "resolved reference");
        scope = scope.push(&target);
        current = if ctx.caps.ref_merges_siblings() && has_siblings(&current.schema) {
            let merged = merge(&as_merge_target(&target.schema, &target.base), &siblings(&current.schema));
            match compile_transient(
                ctx.caps,
                &merged,
                Arc::clone(&current.base),
                current.resource_pointer.clone(),
                current.pointer.clone(),
            ) {
                Ok(node) => node,
                Err(e) => {
                    tracing::warn!(%reference, error = %e, "merged reference target does not compile");
                    return Resolution::Unresolved(reference);
                }
            }
        } else {
            target
        };
    }
    Resolution::Resolved { node: current, scope }
}

fn lookup_target(
    ctx: &Context,
    from: &CompiledNode,
    kind: RefKind,
    reference: &str,
    scope: &Scope,
) -> Option<Arc<CompiledNode>> {
    let (resource, fragment) = split_reference(&from.base, reference)?;
    let target = ctx.lookup(&resource, &fragment)?;
    match kind {
        RefKind::Ref => Some(target),
        RefKind::RecursiveRef => {
            if target.keyword("$recursiveAnchor") != Some(&Value::Bool(true)) {
                return Some(target);
            }
            let outermost = scope
                .outermost_first()
                .into_iter()
                .find_map(|frame| ctx.recursive_anchor(&frame.base));
            Some(outermost.map_or(target, Arc::clone))
        }
        RefKind::DynamicRef => {
            let declares = target.keyword("$dynamicAnchor").and_then(Value::as_str) == Some(fragment.as_str());
            if fragment.is_empty() || !declares {
                return Some(target);
            }
            let outermost = scope
                .outermost_first()
                .into_iter()
                .find_map(|frame| ctx.dynamic_anchor(&frame.base, &fragment));
            Some(outermost.map_or(target, Arc::clone))
        }
    }
}

fn has_siblings(schema: &Value) -> bool {
    schema
        .as_object()
        .is_some_and(|map| map.keys().any(|key| !TRIVIAL_SIBLINGS.contains(&key.as_str())))
}

/// The target side of a sibling merge. `true` constrains nothing, so it
/// becomes `{}` and the siblings survive; `false` still wins.
fn as_merge_target(schema: &Value, base: &Url) -> Value {
    match schema {
        Value::Bool(true) => Value::Object(Map::new()),
        _ => rebase(schema, base),
    }
}

fn siblings(schema: &Value) -> Value {
    let Some(map) = schema.as_object() else {
        return Value::Object(Map::new());
    };
    Value::Object(
        map.iter()
            .filter(|(key, _)| !STRIPPED_SIBLINGS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    )
}

/// Rewrite relative references (and `$id`s) inside `schema` as absolute
/// URIs against `base`, following nested `$id`s.
pub(crate) fn rebase(schema: &Value, base: &Url) -> Value {
    match schema {
        Value::Object(map) => {
            let own_base = map
                .get("$id")
                .or_else(|| map.get("id"))
                .and_then(Value::as_str)
                .and_then(|id| base.join(id).ok())
                .unwrap_or_else(|| base.clone());
            let rebased = map
                .iter()
                .map(|(key, value)| {
                    let value = match (key.as_str(), value) {
                        ("$id" | "id", Value::String(id)) => absolute(base, id),
                        ("$ref" | "$recursiveRef" | "$dynamicRef", Value::String(reference)) => {
                            absolute(&own_base, reference)
                        }
                        (keyword, value) if DATA_KEYWORDS.contains(&keyword) => value.clone(),
                        (_, value) => rebase(value, &own_base),
                    };
                    (key.clone(), value)
                })
                .collect();
            Value::Object(rebased)
        }
        Value::Array(items) => Value::Array(items.iter().map(|item| rebase(item, base)).collect()),
        other => other.clone(),
    }
}

fn absolute(base: &Url, reference: &str) -> Value {
    Value::String(base.join(reference).map_or_else(|_| reference.to_string(), String::from))
}

impl SchemaNode {
    /// Resolve this node's reference against its scope.
    pub fn resolve_ref(&self) -> RefResolution {
        let scope = self.scope.push(&self.node);
        match resolve(&self.ctx, &self.node, &scope) {
            Resolution::NoRef => RefResolution::NoRef,
            Resolution::Resolved { node, scope } => RefResolution::Resolved(self.with_node(node, scope)),
            Resolution::Unresolved(reference) => RefResolution::Unresolved(reference),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compile, ErrorCode, SchemaCompiler};
    use schemata_core::Draft;
    use serde_json::json;

    fn resolved_schema(resolution: RefResolution) -> Value {
        resolution.resolved().expect("resolved").schema().clone()
    }

    #[test]
    fn test_no_ref() {
        let root = compile(&json!({"type": "string"})).unwrap();
        assert!(matches!(root.resolve_ref(), RefResolution::NoRef));
    }

    #[test]
    fn test_pointer_ref() {
        let root = compile(&json!({"$defs": {"a": {"type": "string"}}, "$ref": "#/$defs/a"})).unwrap();
        assert_eq!(resolved_schema(root.resolve_ref()), json!({"type": "string"}));
    }

    #[test]
    fn test_draft7_replaces_siblings() {
        let schema = json!({
            "definitions": {"a": {"type": "string"}},
            "$ref": "#/definitions/a",
            "minLength": 3
        });
        let root = SchemaCompiler::new().draft(Draft::Draft7).compile(&schema).unwrap();
        assert_eq!(resolved_schema(root.resolve_ref()), json!({"type": "string"}));
    }

    #[test]
    fn test_2019_merges_siblings() {
        let schema = json!({
            "$defs": {"a": {"type": "string"}},
            "$ref": "#/$defs/a",
            "minLength": 3
        });
        let root = SchemaCompiler::new().draft(Draft::Draft2019_09).compile(&schema).unwrap();
        assert_eq!(resolved_schema(root.resolve_ref()), json!({"type": "string", "minLength": 3}));
    }

    #[test]
    fn test_2019_siblings_survive_true_target() {
        let schema = json!({"$defs": {"a": true}, "$ref": "#/$defs/a", "minLength": 5});
        let root = SchemaCompiler::new().draft(Draft::Draft2019_09).compile(&schema).unwrap();
        assert_eq!(resolved_schema(root.resolve_ref()), json!({"minLength": 5}));
        let errors = root.validate(&json!("ab"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::MinLengthError);
    }

    #[test]
    fn test_2019_false_target_rejects_despite_siblings() {
        let schema = json!({"$defs": {"a": false}, "$ref": "#/$defs/a", "minLength": 1});
        let root = SchemaCompiler::new().draft(Draft::Draft2019_09).compile(&schema).unwrap();
        assert!(!root.is_valid(&json!("long enough")));
    }

    #[test]
    fn test_annotation_siblings_do_not_merge() {
        let schema = json!({"$defs": {"a": {"type": "string"}}, "$ref": "#/$defs/a", "title": "A"});
        let root = compile(&schema).unwrap();
        let resolved = root.resolve_ref().resolved().unwrap();
        assert_eq!(resolved.location(), "json-schema:///#/$defs/a");
    }

    #[test]
    fn test_chain_is_followed() {
        let schema = json!({
            "$defs": {"a": {"$ref": "#/$defs/b"}, "b": {"$ref": "#/$defs/c"}, "c": {"type": "null"}},
            "$ref": "#/$defs/a"
        });
        let root = compile(&schema).unwrap();
        assert_eq!(resolved_schema(root.resolve_ref()), json!({"type": "null"}));
    }

    #[test]
    fn test_pure_cycle_is_unresolved() {
        let schema = json!({"$defs": {"a": {"$ref": "#/$defs/b"}, "b": {"$ref": "#/$defs/a"}}, "$ref": "#/$defs/a"});
        let root = compile(&schema).unwrap();
        assert!(root.resolve_ref().is_unresolved());
    }

    #[test]
    fn test_missing_target_is_unresolved() {
        let root = compile(&json!({"$ref": "#/$defs/missing"})).unwrap();
        match root.resolve_ref() {
            RefResolution::Unresolved(reference) => assert_eq!(reference, "#/$defs/missing"),
            other => panic!("expected unresolved, got {other:?}"),
        }
    }

    #[test]
    fn test_anchor_and_remote_refs() {
        let root = SchemaCompiler::new()
            .remote("https://example.com/defs.json", json!({"$defs": {"n": {"$anchor": "num", "type": "number"}}}))
            .compile(&json!({"$ref": "https://example.com/defs.json#num"}))
            .unwrap();
        assert_eq!(resolved_schema(root.resolve_ref()), json!({"$anchor": "num", "type": "number"}));
    }

    #[test]
    fn test_relative_remote_names() {
        let root = SchemaCompiler::new()
            .remote("item.json", json!({"type": "boolean"}))
            .compile(&json!({"$ref": "item.json"}))
            .unwrap();
        assert_eq!(resolved_schema(root.resolve_ref()), json!({"type": "boolean"}));
    }

    #[test]
    fn test_uncompiled_pointer_target() {
        let schema = json!({"x-library": {"id-type": {"type": "integer"}}, "$ref": "#/x-library/id-type"});
        let root = SchemaCompiler::new().draft(Draft::Draft7).compile(&schema).unwrap();
        assert_eq!(resolved_schema(root.resolve_ref()), json!({"type": "integer"}));
    }

    #[test]
    fn test_rebase_makes_refs_absolute() {
        let base = Url::parse("https://example.com/schemas/root.json").unwrap();
        let schema = json!({
            "properties": {"a": {"$ref": "#/$defs/x"}, "b": {"$id": "nested/", "$ref": "leaf.json"}},
            "enum": [{"$ref": "data"}]
        });
        let rebased = rebase(&schema, &base);
        assert_eq!(rebased["properties"]["a"]["$ref"], "https://example.com/schemas/root.json#/$defs/x");
        assert_eq!(rebased["properties"]["b"]["$id"], "https://example.com/schemas/nested/");
        assert_eq!(rebased["properties"]["b"]["$ref"], "https://example.com/schemas/nested/leaf.json");
        assert_eq!(rebased["enum"][0]["$ref"], "data");
    }

    #[test]
    fn test_merged_target_keeps_its_own_refs() {
        let root = SchemaCompiler::new()
            .remote(
                "https://example.com/a.json",
                json!({"properties": {"p": {"$ref": "#/$defs/s"}}, "$defs": {"s": {"type": "string"}}}),
            )
            .compile(&json!({"$ref": "https://example.com/a.json", "required": ["p"]}))
            .unwrap();
        assert!(root.is_valid(&json!({"p": "x"})));
        assert!(!root.is_valid(&json!({"p": 1})));
        assert!(!root.is_valid(&json!({})));
    }

    #[test]
    fn test_recursive_ref_prefers_outermost_anchor() {
        let tree = json!({
            "$id": "https://example.com/tree",
            "$recursiveAnchor": true,
            "type": "object",
            "properties": {"children": {"type": "array", "items": {"$recursiveRef": "#"}}}
        });
        let strict = json!({
            "$id": "https://example.com/strict-tree",
            "$recursiveAnchor": true,
            "$ref": "tree",
            "unevaluatedProperties": false
        });
        let root = SchemaCompiler::new()
            .draft(Draft::Draft2019_09)
            .remote("https://example.com/tree", tree)
            .compile(&strict)
            .unwrap();
        assert!(root.is_valid(&json!({"children": [{"children": []}]})));
        assert!(!root.is_valid(&json!({"children": [{"daat": 1}]})));
    }

    #[test]
    fn test_dynamic_ref_prefers_outermost_anchor() {
        let list = json!({
            "$id": "https://example.com/list",
            "$defs": {"item": {"$dynamicAnchor": "item"}},
            "type": "array",
            "items": {"$dynamicRef": "#item"}
        });
        let strings = json!({
            "$id": "https://example.com/strings",
            "$ref": "list",
            "$defs": {"item": {"$dynamicAnchor": "item", "type": "string"}}
        });
        let root = SchemaCompiler::new()
            .remote("https://example.com/list", list.clone())
            .compile(&strings)
            .unwrap();
        assert!(root.is_valid(&json!(["a", "b"])));
        assert!(!root.is_valid(&json!(["a", 1])));
        let plain = SchemaCompiler::new().compile(&list).unwrap();
        assert!(plain.is_valid(&json!(["a", 1])));
    }
}
