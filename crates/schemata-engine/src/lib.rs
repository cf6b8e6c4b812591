//! # schemata-engine — Schema Compilation, Resolution & Validation
//!
//! Compiles a JSON Schema document (drafts 4, 6, 7, 2019-09, 2020-12) into a
//! reusable tree of [`SchemaNode`]s, resolves references and data-dependent
//! composition, and validates JSON values against it with located,
//! machine-readable error records.
//!
//! ## Components (leaves first)
//!
//! - [`merge`] — structural merge of two schema fragments.
//! - `resolve` — `$ref` / `$recursiveRef` / `$dynamicRef` resolution with
//!   draft-dependent replace-vs-merge semantics.
//! - `compile` — turns a raw document into compiled nodes and builds the
//!   context's location and anchor index.
//! - `reduce` — folds `allOf`, `anyOf`, `oneOf`, `dependencies` and
//!   `if/then/else` into one static fragment for a concrete value.
//! - `validate` + `keywords` — per-type keyword dispatch driven by the
//!   [`DraftCapabilities`] table.
//!
//! ## Usage
//!
//! ```
//! use serde_json::json;
//!
//! let schema = json!({"type": "object", "required": ["id"]});
//! let root = schemata_engine::compile(&schema).unwrap();
//! assert!(root.is_valid(&json!({"id": 1})));
//! assert_eq!(root.validate(&json!({})).len(), 1);
//! ```
//!
//! ## Concurrency
//!
//! A compiled tree is immutable. Remote documents are registered on the
//! [`SchemaCompiler`] builder before compilation, so a compiled
//! [`SchemaNode`] is `Send + Sync` and can validate from many threads.
//!
//! ## Crate Policy
//!
//! - Depends only on `schemata-core` internally.
//! - Data-validation failures are values ([`ValidationError`]); only
//!   schema-authoring problems surface as `Err` ([`SchemaError`]).
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod compile;
pub mod context;
pub mod draft;
pub mod error;
pub mod format;
pub mod fuzzy;
pub mod keywords;
pub mod merge;
pub mod navigate;
pub mod node;
pub mod reduce;
pub mod resolve;
pub mod store;
pub mod validate;

// Re-export primary types for ergonomic imports.
pub use compile::{compile, SchemaCompiler};
pub use draft::{DraftCapabilities, Keyword};
pub use error::{ErrorCode, SchemaError, ValidationError};
pub use format::FormatRegistry;
pub use merge::{merge, merge_results};
pub use node::SchemaNode;
pub use resolve::RefResolution;
pub use store::{SchemaStore, StoreError, ValidationReport};

pub use schemata_core::{Draft, JsonPointer, JsonType};
