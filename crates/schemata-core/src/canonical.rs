//! # Canonical Serialization — Deep Equality for JSON Values
//!
//! JSON Schema equality (`enum`, `const`, `uniqueItems`) is structural:
//! object key order is irrelevant and `1 == 1.0`. `serde_json::Value`'s own
//! `PartialEq` gets both wrong, so every equality decision in the engine
//! flows through this module.
//!
//! [`CanonicalBytes`] produces RFC 8785 (JSON Canonicalization Scheme) bytes
//! via `serde_jcs`: sorted keys, compact separators, ECMAScript number
//! formatting. Two values are deeply equal exactly when their canonical
//! bytes are equal, which makes the bytes usable as a hash key for
//! duplicate detection.
//!
//! [`json_equal`] is the allocation-free recursive equivalent used for
//! pairwise comparisons.

use serde::Serialize;
use serde_json::Value;

use crate::error::SchemataError;
use crate::value::compare_numbers;

/// Bytes produced by JCS canonicalization of a JSON value.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - Object keys are sorted, separators compact, numbers in shortest
///   ECMAScript form (`1.0` serializes as `1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `SchemataError::Canonicalization` if serialization fails
    /// (non-string map keys or non-finite floats).
    pub fn new(obj: &impl Serialize) -> Result<Self, SchemataError> {
        let s = serde_jcs::to_string(obj)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Structural JSON equality: numbers by value, objects ignoring key order.
pub fn json_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => {
            compare_numbers(l, r).is_some_and(|ordering| ordering.is_eq())
        }
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| json_equal(a, b))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l
                    .iter()
                    .all(|(key, a)| r.get(key).is_some_and(|b| json_equal(a, b)))
        }
        (l, r) => l == r,
    }
}
