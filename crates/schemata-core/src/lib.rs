//! # schemata-core — Foundational Types for the Schema Engine
//!
//! This crate is the leaf of the schemata workspace. It defines the small
//! set of value-level primitives every other crate agrees on, so the engine
//! never re-derives them ad hoc.
//!
//! ## Key Design Principles
//!
//! 1. **One `Draft` enum.** Drafts 4, 6, 7, 2019-09 and 2020-12 are the only
//!    dialects. Every draft-dependent decision matches on it exhaustively.
//!
//! 2. **`JsonPointer` newtype.** Data and schema locations are never bare
//!    strings. Segment escaping (`~0`, `~1`) happens in one place.
//!
//! 3. **Deep equality through canonical bytes.** `enum`, `const`,
//!    `uniqueItems` and merge de-duplication all compare values through
//!    [`CanonicalBytes`], so `1` and `1.0` are equal and key order is
//!    irrelevant.
//!
//! 4. **`JsonType` classification.** `integer` is a refinement of `number`,
//!    decided in exactly one function.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `schemata-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod draft;
pub mod error;
pub mod pointer;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use canonical::{json_equal, CanonicalBytes};
pub use draft::{Draft, DRAFT_COUNT};
pub use error::SchemataError;
pub use pointer::JsonPointer;
pub use value::{compare_numbers, JsonType};
