//! # Dynamic Schema Reducer
//!
//! Folds the data-dependent composition keywords of a fragment into one
//! static fragment for a concrete value. Reducers run in the fixed order
//! bound at compile time:
//!
//! | Reducer | Contribution |
//! |---------|--------------|
//! | `allOf` | every member, reduced, merged left to right |
//! | `anyOf` | every member the value satisfies |
//! | `oneOf` | the single selected member; its index is recorded |
//! | `dependencies` | `required` names or the reduced schema of each trigger present in the value (or already required) |
//! | `if/then/else` | the reduced `then` or `else` branch |
//!
//! Each contribution is merged into the fragment's static part (the
//! fragment without its dynamic keywords). Contributions are reduced
//! before they are merged, so the accumulator never regains a dynamic
//! keyword and one pass reaches the fixed point.
//!
//! Without a value ([`SchemaNode::reduce_static`]) only `allOf` is folded;
//! the other composition keywords stay on the fragment.
//!
//! ## Termination
//!
//! Every reduction call tracks the locations it is currently reducing. A
//! location re-entered while still active (`{"allOf": [{"$ref": "#"}]}`)
//! contributes its static part only.
//!
//! ## oneOf Selection
//!
//! [`select_one_of`] is shared with the `oneOf` validator. A
//! `discriminator.propertyName` (or `oneOfProperty`) on the parent fragment
//! replaces the full scan: the discriminator value is validated against
//! each member's property schema instead of the whole member.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use schemata_core::JsonPointer;

use crate::compile::compile_transient;
use crate::context::Context;
use crate::draft::DYNAMIC_KEYWORDS;
use crate::error::{ErrorCode, ValidationError};
use crate::merge::merge;
use crate::node::{CompiledNode, Dependency, Reducer, Scope};
use crate::resolve::{rebase, resolve, Resolution};
use crate::validate::{is_valid_node, validate_node};
use crate::SchemaNode;

/// A reduced fragment and the scope it was reached through.
#[derive(Debug)]
pub(crate) struct Reduced {
    pub(crate) node: Arc<CompiledNode>,
    pub(crate) scope: Scope,
    pub(crate) one_of_index: Option<usize>,
}

/// The `oneOf` member a value selects.
#[derive(Debug)]
pub(crate) struct OneOfChoice {
    pub(crate) index: usize,
    /// Errors of the selected member. Only a discriminator can select a
    /// member the value does not satisfy.
    pub(crate) errors: Vec<ValidationError>,
}

/// Select the `oneOf` member of `node` that `data` satisfies.
///
/// # Errors
///
/// `one-of-error` when no member passes, `multiple-one-of-error` when
/// several do, and the discriminator errors when a discriminator property
/// is declared.
pub(crate) fn select_one_of(
    ctx: &Context,
    node: &Arc<CompiledNode>,
    data: &Value,
    pointer: &JsonPointer,
    scope: &Scope,
) -> Result<OneOfChoice, ValidationError> {
    let fail = |code| ValidationError::new(code, pointer.clone(), node.schema.clone(), data.clone());

    if let Some(property) = discriminator(node) {
        let Some(value) = data.get(property) else {
            return Err(fail(ErrorCode::MissingOneOfDiscriminatorError).with("property", property));
        };
        let at = pointer.join(property);
        let matches: Vec<usize> = node
            .one_of
            .iter()
            .enumerate()
            .filter(|(_, member)| {
                let member = settle(ctx, member, scope);
                member
                    .property(property)
                    .is_some_and(|schema| is_valid_node(ctx, schema, value, &at, scope))
            })
            .map(|(index, _)| index)
            .collect();
        return match matches.as_slice() {
            [] => Err(fail(ErrorCode::OneOfDiscriminatorError)
                .with("property", property)
                .with("value", value.clone())),
            [index] => Ok(OneOfChoice {
                index: *index,
                errors: validate_node(ctx, &node.one_of[*index], data, pointer, scope),
            }),
            _ => Err(fail(ErrorCode::MultipleOneOfError).with("matches", matches.clone())),
        };
    }

    let mut failures = Vec::new();
    let mut matches = Vec::new();
    for (index, member) in node.one_of.iter().enumerate() {
        let errors = validate_node(ctx, member, data, pointer, scope);
        if errors.is_empty() {
            matches.push(index);
        } else {
            failures.extend(errors);
        }
    }
    match matches.as_slice() {
        [] => Err(fail(ErrorCode::OneOfError).with_errors(failures)),
        [index] => Ok(OneOfChoice {
            index: *index,
            errors: Vec::new(),
        }),
        _ => Err(fail(ErrorCode::MultipleOneOfError).with("matches", matches.clone())),
    }
}

/// The property that discriminates `oneOf` members, if declared.
fn discriminator(node: &CompiledNode) -> Option<&str> {
    node.keyword("discriminator")
        .and_then(|d| d.get("propertyName"))
        .or_else(|| node.keyword("oneOfProperty"))
        .and_then(Value::as_str)
}

/// A node with its reference followed, or the node itself.
fn settle(ctx: &Context, node: &Arc<CompiledNode>, scope: &Scope) -> Arc<CompiledNode> {
    match resolve(ctx, node, scope) {
        Resolution::Resolved { node, .. } => node,
        Resolution::NoRef | Resolution::Unresolved(_) => Arc::clone(node),
    }
}

/// Reduce `node` for `data` (or statically when `data` is `None`).
pub(crate) fn reduce_node(
    ctx: &Context,
    node: &Arc<CompiledNode>,
    data: Option<&Value>,
    pointer: &JsonPointer,
    scope: &Scope,
) -> Result<Reduced, ValidationError> {
    let mut reduction = Reduction {
        ctx,
        data,
        pointer,
        active: HashSet::new(),
    };
    reduction.reduce(node, scope)
}

/// The fragment whose static shape decides which parts of `data` count as
/// evaluated. Falls back to `node` itself when reduction fails; the
/// failure is reported by the composition validators.
pub(crate) fn evaluated_shape(
    ctx: &Context,
    node: &Arc<CompiledNode>,
    data: &Value,
    pointer: &JsonPointer,
    scope: &Scope,
) -> Arc<CompiledNode> {
    match reduce_node(ctx, node, Some(data), pointer, scope) {
        Ok(reduced) => reduced.node,
        Err(error) => {
            tracing::trace!(code = %error.code, location = %node.location, "coverage from the unreduced fragment");
            Arc::clone(node)
        }
    }
}

struct Reduction<'a> {
    ctx: &'a Context,
    data: Option<&'a Value>,
    pointer: &'a JsonPointer,
    /// Locations being reduced right now.
    active: HashSet<String>,
}

impl Reduction<'_> {
    fn reduce(&mut self, node: &Arc<CompiledNode>, scope: &Scope) -> Result<Reduced, ValidationError> {
        let scope = scope.push(node);
        let (node, scope) = match resolve(self.ctx, node, &scope) {
            Resolution::NoRef => (Arc::clone(node), scope),
            Resolution::Resolved { node, scope } => (node, scope),
            Resolution::Unresolved(reference) => {
                return Err(self.error(ErrorCode::UnresolvedRefError, node).with("ref", reference));
            }
        };
        if !self.has_work(&node) {
            return Ok(Reduced {
                node,
                scope,
                one_of_index: None,
            });
        }
        if !self.active.insert(node.location.clone()) {
            tracing::trace!(location = %node.location, "reduction re-entered, static part only");
            let node = self.compile(&node, self.static_part(&node.schema))?;
            return Ok(Reduced {
                node,
                scope,
                one_of_index: None,
            });
        }
        let reduced = self.fold(&node, scope);
        self.active.remove(&node.location);
        reduced
    }

    fn has_work(&self, node: &CompiledNode) -> bool {
        match self.data {
            Some(_) => !node.reducers.is_empty(),
            None => node.reducers.contains(&Reducer::AllOf),
        }
    }

    fn fold(&mut self, node: &Arc<CompiledNode>, scope: Scope) -> Result<Reduced, ValidationError> {
        let mut accumulator = self.static_part(&node.schema);
        let mut one_of_index = None;
        for reducer in &node.reducers {
            match (reducer, self.data) {
                (Reducer::AllOf, _) => {
                    for member in &node.all_of {
                        accumulator = merge(&accumulator, &self.contribution(member, &scope)?);
                    }
                }
                (_, None) => {}
                (Reducer::AnyOf, Some(data)) => {
                    for member in &node.any_of {
                        if is_valid_node(self.ctx, member, data, self.pointer, &scope) {
                            accumulator = merge(&accumulator, &self.contribution(member, &scope)?);
                        }
                    }
                }
                (Reducer::OneOf, Some(data)) => {
                    let choice = select_one_of(self.ctx, node, data, self.pointer, &scope)?;
                    accumulator = merge(&accumulator, &self.contribution(&node.one_of[choice.index], &scope)?);
                    one_of_index = Some(choice.index);
                }
                (Reducer::Dependencies, Some(data)) => {
                    // A contributed `required` can fire further entries.
                    let mut done = vec![false; node.dependencies.len()];
                    loop {
                        let mut progressed = false;
                        for (entry, done) in node.dependencies.iter().zip(done.iter_mut()) {
                            if *done || !triggered(data, &accumulator, &entry.property) {
                                continue;
                            }
                            *done = true;
                            progressed = true;
                            let contribution = match &entry.dependency {
                                Dependency::Required(names) => json!({ "required": names }),
                                Dependency::Schema(schema) => self.contribution(schema, &scope)?,
                            };
                            accumulator = merge(&accumulator, &contribution);
                        }
                        if !progressed {
                            break;
                        }
                    }
                }
                (Reducer::IfThenElse, Some(data)) => {
                    let Some(condition) = &node.if_ else {
                        continue;
                    };
                    let branch = if is_valid_node(self.ctx, condition, data, self.pointer, &scope) {
                        &node.then_
                    } else {
                        &node.else_
                    };
                    if let Some(branch) = branch {
                        accumulator = merge(&accumulator, &self.contribution(branch, &scope)?);
                    }
                }
            }
        }
        Ok(Reduced {
            node: self.compile(node, accumulator)?,
            scope,
            one_of_index,
        })
    }

    /// A member reduced and rebased onto absolute references, ready to be
    /// merged into a fragment of another resource.
    fn contribution(&mut self, member: &Arc<CompiledNode>, scope: &Scope) -> Result<Value, ValidationError> {
        let reduced = self.reduce(member, scope)?;
        Ok(rebase(&reduced.node.schema, &reduced.node.base))
    }

    fn static_part(&self, schema: &Value) -> Value {
        let Value::Object(map) = schema else {
            return schema.clone();
        };
        let dynamic = |key: &str| match self.data {
            Some(_) => DYNAMIC_KEYWORDS.contains(&key),
            None => key == "allOf",
        };
        Value::Object(
            map.iter()
                .filter(|(key, _)| !dynamic(key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<Map<String, Value>>(),
        )
    }

    fn compile(&self, node: &CompiledNode, schema: Value) -> Result<Arc<CompiledNode>, ValidationError> {
        compile_transient(
            self.ctx.caps,
            &schema,
            Arc::clone(&node.base),
            node.resource_pointer.clone(),
            node.pointer.clone(),
        )
        .map_err(|e| {
            ValidationError::new(
                ErrorCode::InvalidSchemaError,
                self.pointer.clone(),
                schema.clone(),
                self.data.cloned().unwrap_or(Value::Null),
            )
            .with("reason", e.to_string())
        })
    }

    fn error(&self, code: ErrorCode, node: &CompiledNode) -> ValidationError {
        ValidationError::new(
            code,
            self.pointer.clone(),
            node.schema.clone(),
            self.data.cloned().unwrap_or(Value::Null),
        )
    }
}

/// Whether a dependency on `property` fires: present in the value or
/// already required by the reduced fragment.
fn triggered(data: &Value, accumulator: &Value, property: &str) -> bool {
    data.get(property).is_some()
        || accumulator
            .get("required")
            .and_then(Value::as_array)
            .is_some_and(|names| names.iter().any(|name| name.as_str() == Some(property)))
}

impl SchemaNode {
    /// Fold every data-dependent composition keyword for `data` into one
    /// static node. The returned node records the selected `oneOf` member.
    ///
    /// # Errors
    ///
    /// Returns the composition error (`one-of-error`,
    /// `multiple-one-of-error`, discriminator errors) when no single
    /// `oneOf` member can be selected, `unresolved-ref-error` for a
    /// dangling reference and `invalid-schema-error` when a merged
    /// fragment does not compile.
    pub fn reduce(&self, data: &Value) -> Result<SchemaNode, ValidationError> {
        self.reduce_at(data, &JsonPointer::root())
    }

    /// [`reduce`](Self::reduce) for `data` located at `pointer` inside a
    /// larger document.
    pub fn reduce_at(&self, data: &Value, pointer: &JsonPointer) -> Result<SchemaNode, ValidationError> {
        let reduced = reduce_node(&self.ctx, &self.node, Some(data), pointer, &self.scope)?;
        Ok(self.from_reduced(reduced))
    }

    /// Fold `allOf` without data; other composition keywords are kept.
    pub fn reduce_static(&self) -> Result<SchemaNode, ValidationError> {
        let reduced = reduce_node(&self.ctx, &self.node, None, &JsonPointer::root(), &self.scope)?;
        Ok(self.from_reduced(reduced))
    }

    pub(crate) fn from_reduced(&self, reduced: Reduced) -> SchemaNode {
        let mut node = self.with_node(reduced.node, reduced.scope);
        node.one_of_index = reduced.one_of_index;
        node
    }
}
