//! # JSON Value Classification
//!
//! `JsonType` names the JSON Schema primitive types. A value has exactly
//! one *primary* type (`null`, `boolean`, `object`, `array`, `number`,
//! `string`); `integer` is a refinement of `number` used only when a schema
//! asks for it. `1.0` is an integer.
//!
//! [`compare_numbers`] orders two JSON numbers exactly when both are
//! integers and through `f64` otherwise.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// JSON Schema primitive type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    /// `null`
    Null,
    /// `true` / `false`
    Boolean,
    /// JSON object
    Object,
    /// JSON array
    Array,
    /// Any JSON number.
    Number,
    /// A number without fractional part.
    Integer,
    /// JSON string
    String,
}

impl JsonType {
    /// The primary types, in the order keyword tables are indexed.
    pub fn primary_types() -> &'static [JsonType] {
        &[
            Self::Null,
            Self::Boolean,
            Self::Object,
            Self::Array,
            Self::Number,
            Self::String,
        ]
    }

    /// The primary type of a value. Never returns `Integer`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
        }
    }

    /// The most specific type of a value: `Integer` for integral numbers.
    pub fn of_refined(value: &Value) -> Self {
        match value {
            Value::Number(n) if is_integer(n) => Self::Integer,
            other => Self::of(other),
        }
    }

    /// Whether `value` is an instance of this type.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Integer, Value::Number(n)) => is_integer(n),
            (Self::Number, Value::Number(_)) => true,
            (expected, other) => *expected == Self::of(other),
        }
    }

    /// Parse a JSON Schema `type` name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "string" => Some(Self::String),
            _ => None,
        }
    }

    /// The JSON Schema `type` name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::String => "string",
        }
    }

    /// Dense index of a primary type, used by per-type keyword tables.
    /// `Integer` shares the `Number` slot.
    pub fn table_index(&self) -> usize {
        match self {
            Self::Null => 0,
            Self::Boolean => 1,
            Self::Object => 2,
            Self::Array => 3,
            Self::Number | Self::Integer => 4,
            Self::String => 5,
        }
    }
}

impl std::fmt::Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a JSON number has no fractional part.
pub fn is_integer(n: &Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

/// Order two JSON numbers.
///
/// Integer pairs compare exactly (no `f64` rounding above 2^53). Mixed or
/// fractional pairs compare as `f64`; `None` only for incomparable values.
pub fn compare_numbers(left: &Number, right: &Number) -> Option<Ordering> {
    if let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) {
        return Some(l.cmp(&r));
    }
    if let (Some(l), Some(r)) = (left.as_u64(), right.as_u64()) {
        return Some(l.cmp(&r));
    }
    // One side is negative i64, the other a u64 beyond i64::MAX.
    if left.is_i64() && right.is_u64() {
        return Some(Ordering::Less);
    }
    if left.is_u64() && right.is_i64() {
        return Some(Ordering::Greater);
    }
    left.as_f64()?.partial_cmp(&right.as_f64()?)
}
