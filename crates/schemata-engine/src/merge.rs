//! # Schema Merge Engine
//!
//! Structural merge of two schema fragments, used by `$ref` sibling merging
//! (drafts 2019-09 and later) and by the dynamic reducer when it folds
//! composition members into one static fragment.
//!
//! ## Rules
//!
//! | `a` | `b` | Result |
//! |-----|-----|--------|
//! | object | boolean (or the reverse) | `a` |
//! | object | object | merge by key, one-sided keys pass through |
//! | `required` array | `required` array | concatenation, de-duplicated, first-seen order |
//! | `items` tuple | `items` tuple | element-wise merge when both `type`s agree, else `b`'s element |
//! | array | array | pairwise merge of object slots, otherwise `a`'s entry then `b`'s; de-duplicated |
//! | array | non-array (or the reverse) | the array |
//! | scalar | scalar | `b` |
//!
//! The merge is deterministic and never mutates its inputs. De-duplication
//! uses structural equality ([`json_equal`]).

use serde_json::{Map, Value};

use schemata_core::json_equal;

/// Merge two schema fragments; `b` wins scalar conflicts.
pub fn merge(a: &Value, b: &Value) -> Value {
    merge_under(None, a, b)
}

/// Merge two fallible fragments, propagating the first error.
///
/// An operand that is already an error means validation failed upstream;
/// the error short-circuits the merge.
pub fn merge_results<E>(a: Result<Value, E>, b: Result<Value, E>) -> Result<Value, E> {
    let a = a?;
    let b = b?;
    Ok(merge(&a, &b))
}

fn merge_under(keyword: Option<&str>, a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Object(left), Value::Object(right)) => Value::Object(merge_objects(left, right)),
        (Value::Array(left), Value::Array(right)) => match keyword {
            Some("required") => Value::Array(union(left.iter().chain(right))),
            Some("items") => Value::Array(merge_tuples(left, right)),
            _ => Value::Array(merge_arrays(left, right)),
        },
        (Value::Array(_), _) => a.clone(),
        (_, Value::Array(_)) => b.clone(),
        (Value::Object(_), Value::Bool(_)) | (Value::Bool(_), Value::Object(_)) => a.clone(),
        _ => b.clone(),
    }
}

fn merge_objects(left: &Map<String, Value>, right: &Map<String, Value>) -> Map<String, Value> {
    let mut out = left.clone();
    for (key, value) in right {
        let merged = match left.get(key) {
            Some(existing) => merge_under(Some(key), existing, value),
            None => value.clone(),
        };
        out.insert(key.clone(), merged);
    }
    out
}

fn merge_tuples(left: &[Value], right: &[Value]) -> Vec<Value> {
    (0..left.len().max(right.len()))
        .filter_map(|i| match (left.get(i), right.get(i)) {
            (Some(a @ Value::Object(l)), Some(b @ Value::Object(r))) if same_type(l, r) => {
                Some(merge(a, b))
            }
            (_, Some(b)) => Some(b.clone()),
            (Some(a), None) => Some(a.clone()),
            (None, None) => None,
        })
        .collect()
}

fn same_type(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    match (left.get("type"), right.get("type")) {
        (Some(l), Some(r)) => json_equal(l, r),
        (None, None) => true,
        _ => false,
    }
}

fn merge_arrays(left: &[Value], right: &[Value]) -> Vec<Value> {
    let mut out = Vec::with_capacity(left.len() + right.len());
    for i in 0..left.len().max(right.len()) {
        match (left.get(i), right.get(i)) {
            (Some(a @ Value::Object(_)), Some(b @ Value::Object(_))) => out.push(merge(a, b)),
            (Some(a), Some(b)) => {
                out.push(a.clone());
                out.push(b.clone());
            }
            (Some(a), None) => out.push(a.clone()),
            (None, Some(b)) => out.push(b.clone()),
            (None, None) => {}
        }
    }
    union(out.iter())
}

fn union<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::new();
    for value in values {
        if !out.iter().any(|seen| json_equal(seen, value)) {
            out.push(value.clone());
        }
    }
    out
}
