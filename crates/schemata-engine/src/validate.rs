//! # Keyword Validation Dispatch
//!
//! `validate(node, data)`:
//!
//! 1. boolean schemas: `true` passes, `false` yields `invalid-data-error`;
//! 2. references are resolved (unresolved → `unresolved-ref-error`);
//! 3. the value is classified (`integer` counts as `number`);
//! 4. every validator bound on the node whose keyword the draft allows for
//!    that type runs, and all errors are collected.
//!
//! Validation never short-circuits across keywords and never deduplicates:
//! two keywords may both fail on the same value.
//!
//! A node re-entered at the same data location through its own scope (a
//! schema such as `{"allOf": [{"$ref": "#"}]}`) contributes nothing the
//! outer visit does not already check, so the inner visit passes.

use std::sync::Arc;

use serde_json::Value;

use schemata_core::{JsonPointer, JsonType};

use crate::context::Context;
use crate::error::{ErrorCode, ValidationError};
use crate::keywords::{self, KeywordCx};
use crate::node::{CompiledNode, Scope};
use crate::resolve::{resolve, Resolution};
use crate::SchemaNode;

/// Validate `data` (located at `pointer`) against a compiled node.
pub(crate) fn validate_node(
    ctx: &Context,
    node: &Arc<CompiledNode>,
    data: &Value,
    pointer: &JsonPointer,
    scope: &Scope,
) -> Vec<ValidationError> {
    if scope.is_validating(&node.location, pointer) {
        tracing::trace!(location = %node.location, %pointer, "re-entered without progress");
        return Vec::new();
    }
    let scope = scope.push_at(node, pointer);
    let (node, scope) = match resolve(ctx, node, &scope) {
        Resolution::NoRef => (Arc::clone(node), scope),
        Resolution::Resolved { node, scope } => (node, scope),
        Resolution::Unresolved(reference) => {
            let error = ValidationError::new(ErrorCode::UnresolvedRefError, pointer.clone(), node.schema.clone(), data.clone())
                .with("ref", reference);
            return vec![error];
        }
    };
    match node.schema {
        Value::Bool(true) => return Vec::new(),
        Value::Bool(false) => {
            return vec![ValidationError::new(ErrorCode::InvalidDataError, pointer.clone(), node.schema.clone(), data.clone())]
        }
        _ => {}
    }

    let ty = JsonType::of(data);
    let cx = KeywordCx {
        ctx,
        node: &node,
        data,
        pointer,
        scope: &scope,
    };
    node.validators
        .iter()
        .filter(|keyword| ctx.caps.applies(**keyword, ty))
        .flat_map(|keyword| keywords::run(*keyword, &cx))
        .collect()
}

/// Whether `data` satisfies `node`.
pub(crate) fn is_valid_node(
    ctx: &Context,
    node: &Arc<CompiledNode>,
    data: &Value,
    pointer: &JsonPointer,
    scope: &Scope,
) -> bool {
    validate_node(ctx, node, data, pointer, scope).is_empty()
}

impl SchemaNode {
    /// Validate `data` against this node, returning every error found.
    pub fn validate(&self, data: &Value) -> Vec<ValidationError> {
        self.validate_at(data, &JsonPointer::root())
    }

    /// Validate `data` that sits at `pointer` inside a larger document;
    /// error pointers are reported relative to that document.
    pub fn validate_at(&self, data: &Value, pointer: &JsonPointer) -> Vec<ValidationError> {
        validate_node(&self.ctx, &self.node, data, pointer, &self.scope)
    }

    /// Whether `data` satisfies this node.
    pub fn is_valid(&self, data: &Value) -> bool {
        self.validate(data).is_empty()
    }
}
