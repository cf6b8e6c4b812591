//! # Keyword Validators
//!
//! One function per [`Keyword`], grouped by the value type it constrains.
//! Each validator receives a [`KeywordCx`] and returns zero, one or many
//! errors. Validators never see a `$ref` node: the dispatcher resolves
//! references before running them.

use std::sync::Arc;

use serde_json::Value;

use schemata_core::JsonPointer;

use crate::context::Context;
use crate::draft::Keyword;
use crate::error::{ErrorCode, ValidationError};
use crate::node::{CompiledNode, Scope};
use crate::validate::validate_node;

mod any;
mod array;
mod composition;
mod number;
mod object;
mod string;

pub(crate) use number::is_multiple_of;

/// Everything a keyword validator needs.
pub(crate) struct KeywordCx<'a> {
    pub(crate) ctx: &'a Context,
    pub(crate) node: &'a Arc<CompiledNode>,
    pub(crate) data: &'a Value,
    pub(crate) pointer: &'a JsonPointer,
    pub(crate) scope: &'a Scope,
}

impl KeywordCx<'_> {
    /// The value of a keyword on the current fragment.
    pub(crate) fn keyword(&self, name: &str) -> Option<&Value> {
        self.node.keyword(name)
    }

    /// An error about the current value.
    pub(crate) fn error(&self, code: ErrorCode) -> ValidationError {
        ValidationError::new(code, self.pointer.clone(), self.node.schema.clone(), self.data.clone())
    }

    /// An error about a nested value.
    pub(crate) fn error_at(&self, code: ErrorCode, pointer: JsonPointer, value: &Value) -> ValidationError {
        ValidationError::new(code, pointer, self.node.schema.clone(), value.clone())
    }

    /// Validate a nested value against a child schema.
    pub(crate) fn validate(&self, child: &Arc<CompiledNode>, value: &Value, pointer: &JsonPointer) -> Vec<ValidationError> {
        validate_node(self.ctx, child, value, pointer, self.scope)
    }

    /// Validate the current value against a child schema.
    pub(crate) fn validate_here(&self, child: &Arc<CompiledNode>) -> Vec<ValidationError> {
        self.validate(child, self.data, self.pointer)
    }

    /// Whether the current value satisfies a child schema.
    pub(crate) fn is_valid_here(&self, child: &Arc<CompiledNode>) -> bool {
        self.validate_here(child).is_empty()
    }
}

/// Run one keyword's validator.
pub(crate) fn run(keyword: Keyword, cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    match keyword {
        Keyword::Type => any::type_(cx),
        Keyword::Enum => any::enum_(cx),
        Keyword::Const => any::const_(cx),
        Keyword::Format => any::format(cx),
        Keyword::Maximum => number::maximum(cx),
        Keyword::Minimum => number::minimum(cx),
        Keyword::ExclusiveMaximum => number::exclusive_maximum(cx),
        Keyword::ExclusiveMinimum => number::exclusive_minimum(cx),
        Keyword::MultipleOf => number::multiple_of(cx),
        Keyword::MaxLength => string::max_length(cx),
        Keyword::MinLength => string::min_length(cx),
        Keyword::Pattern => string::pattern(cx),
        Keyword::Items => array::items(cx),
        Keyword::Contains => array::contains(cx),
        Keyword::MinItems => array::min_items(cx),
        Keyword::MaxItems => array::max_items(cx),
        Keyword::UniqueItems => array::unique_items(cx),
        Keyword::UnevaluatedItems => array::unevaluated_items(cx),
        Keyword::Properties => object::properties(cx),
        Keyword::PatternProperties => object::pattern_properties(cx),
        Keyword::AdditionalProperties => object::additional_properties(cx),
        Keyword::PropertyNames => object::property_names(cx),
        Keyword::Required => object::required(cx),
        Keyword::MinProperties => object::min_properties(cx),
        Keyword::MaxProperties => object::max_properties(cx),
        Keyword::Dependencies | Keyword::DependentRequired | Keyword::DependentSchemas => {
            object::dependencies(cx, keyword)
        }
        Keyword::UnevaluatedProperties => object::unevaluated_properties(cx),
        Keyword::Not => composition::not(cx),
        Keyword::AllOf => composition::all_of(cx),
        Keyword::AnyOf => composition::any_of(cx),
        Keyword::OneOf => composition::one_of(cx),
        Keyword::If => composition::if_then_else(cx),
    }
}

/// A non-negative integer keyword value (`minLength`, `maxItems`, ...).
pub(crate) fn limit(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        _ => None,
    }
}
