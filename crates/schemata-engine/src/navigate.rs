//! # Schema Navigation
//!
//! "Which schema applies at this data path?" [`SchemaNode::get`] takes one
//! step: it resolves the node's reference, reduces its composition
//! keywords (for the given value, or statically without one) and then asks
//! the bound resolvers in order:
//!
//! 1. exact `properties` key,
//! 2. first matching `patternProperties` pattern (declaration order),
//! 3. `additionalProperties` for keys matched by neither,
//! 4. positional item or the rest schema for array indices.
//!
//! A key rejected by `additionalProperties: false`, or an index past a
//! tuple closed by a `false` rest schema, is an error rather than "no
//! schema". [`SchemaNode::get_schema`] walks a whole JSON pointer and
//! settles the final node the same way.

use std::sync::Arc;

use serde_json::Value;

use schemata_core::JsonPointer;

use crate::error::{ErrorCode, ValidationError};
use crate::node::{CompiledNode, Resolver};
use crate::reduce::reduce_node;
use crate::SchemaNode;

impl SchemaNode {
    /// The schema that applies to `key` (an object key or array index) of
    /// `data`, or of any value when `data` is `None`.
    ///
    /// Returns `Ok(None)` when nothing constrains the key.
    ///
    /// # Errors
    ///
    /// `no-additional-properties-error` for a key forbidden by
    /// `additionalProperties: false`, `additional-items-error` for an index
    /// past a closed tuple, and any error raised while reducing the node.
    pub fn get(&self, key: &str, data: Option<&Value>) -> Result<Option<SchemaNode>, ValidationError> {
        self.get_at(key, data, &JsonPointer::root())
    }

    /// The settled schema for the value at `pointer` inside `data`.
    ///
    /// ```
    /// use schemata_engine::{compile, JsonPointer};
    /// use serde_json::json;
    ///
    /// let root = compile(&json!({
    ///     "properties": {"tags": {"items": {"type": "string"}}}
    /// }))
    /// .unwrap();
    /// let pointer = JsonPointer::parse("#/tags/0").unwrap();
    /// let node = root.get_schema(&pointer, None).unwrap().unwrap();
    /// assert_eq!(node.schema(), &json!({"type": "string"}));
    /// ```
    ///
    /// # Errors
    ///
    /// Any error [`get`](Self::get) raises along the way.
    pub fn get_schema(&self, pointer: &JsonPointer, data: Option<&Value>) -> Result<Option<SchemaNode>, ValidationError> {
        let mut current = self.clone();
        let mut value = data;
        let mut at = JsonPointer::root();
        for segment in pointer.segments() {
            let Some(next) = current.get_at(&segment, value, &at)? else {
                return Ok(None);
            };
            value = value.and_then(|v| child_value(v, &segment));
            at = at.join(&segment);
            current = next;
        }
        let settled = reduce_node(&current.ctx, &current.node, value, &at, &current.scope)?;
        Ok(Some(current.from_reduced(settled)))
    }

    pub(crate) fn get_at(
        &self,
        key: &str,
        data: Option<&Value>,
        pointer: &JsonPointer,
    ) -> Result<Option<SchemaNode>, ValidationError> {
        let reduced = reduce_node(&self.ctx, &self.node, data, pointer, &self.scope)?;
        let node = &reduced.node;
        for resolver in &node.resolvers {
            let child = match resolver {
                Resolver::Property => node.property(key).cloned(),
                Resolver::PatternProperty => node
                    .pattern_properties
                    .iter()
                    .find(|(regex, _)| regex.is_match(key))
                    .map(|(_, schema)| Arc::clone(schema)),
                Resolver::AdditionalProperty if !node.declares_property(key) => node.additional_properties.clone(),
                Resolver::AdditionalProperty => None,
                Resolver::Item => match key.parse::<usize>() {
                    Ok(index) => item_schema(node, index).map_err(|rest| {
                        rejection(ErrorCode::AdditionalItemsError, &rest, pointer, key, data).with("index", index)
                    })?,
                    Err(_) => None,
                },
            };
            if let Some(child) = child {
                return Ok(Some(self.with_node(child, reduced.scope.clone())));
            }
        }
        let closed = node.additional_properties.as_ref().is_some_and(|schema| schema.is_bool(false));
        if closed && !node.declares_property(key) {
            return Err(rejection(ErrorCode::NoAdditionalPropertiesError, node, pointer, key, data).with("property", key));
        }
        Ok(None)
    }
}

/// The schema of array position `index`. `Err` carries a `false` rest
/// schema that forbids the position.
fn item_schema(node: &CompiledNode, index: usize) -> Result<Option<Arc<CompiledNode>>, Arc<CompiledNode>> {
    if let Some(schema) = node.tuple_items.get(index) {
        return Ok(Some(Arc::clone(schema)));
    }
    match &node.rest_items {
        Some(rest) if rest.is_bool(false) => Err(Arc::clone(rest)),
        rest => Ok(rest.clone()),
    }
}

fn rejection(
    code: ErrorCode,
    schema: &CompiledNode,
    pointer: &JsonPointer,
    key: &str,
    data: Option<&Value>,
) -> ValidationError {
    let value = data.and_then(|v| child_value(v, key)).cloned().unwrap_or(Value::Null);
    ValidationError::new(code, pointer.join(key), schema.schema.clone(), value)
}

fn child_value<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    }
}
