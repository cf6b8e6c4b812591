//! # Error Types — Structured Error Hierarchy
//!
//! Defines the foundational error types shared across the workspace. All
//! errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Data-validation failures are never errors of this type; they are
//!   values produced by the engine.
//! - These errors describe inputs the engine cannot interpret at all:
//!   unknown drafts, malformed pointers, values that cannot be
//!   canonicalized.

use thiserror::Error;

/// Top-level error type for schemata primitives.
#[derive(Error, Debug)]
pub enum SchemataError {
    /// A `$schema` URI or draft name did not match a supported draft.
    #[error("unknown JSON Schema draft: {0}")]
    UnknownDraft(String),

    /// A JSON Pointer string was malformed.
    #[error("invalid JSON pointer {pointer:?}: {reason}")]
    InvalidPointer {
        /// The offending pointer text.
        pointer: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Canonical serialization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] serde_json::Error),
}
