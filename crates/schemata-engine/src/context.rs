//! # Compilation Context — Shared, Immutable Lookup State
//!
//! One [`Context`] exists per compiled root. It carries the active draft
//! capability descriptor, the format registry, and the [`Index`] built
//! during compilation:
//!
//! - `documents`: raw resource roots by base URI (root and remotes),
//! - `locations`: `base#/pointer` and `base#anchor` → compiled node,
//! - `dynamic_anchors`: `base#name` → node declaring `$dynamicAnchor`,
//! - `recursive_anchors`: base → resource root declaring
//!   `$recursiveAnchor: true`.
//!
//! Every handle shares the context read-only; nothing is added after
//! compilation.
//!
//! ## URI Handling
//!
//! Schemas without an `$id` live under the base `json-schema:///`. Remote
//! names that are not absolute URIs (`item.json`) are resolved against the
//! same base, so `{"$ref": "item.json"}` finds a remote registered as
//! `item.json`.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use url::Url;

use schemata_core::JsonPointer;

use crate::compile::compile_transient;
use crate::draft::DraftCapabilities;
use crate::error::SchemaError;
use crate::format::FormatRegistry;
use crate::node::CompiledNode;

/// Base URI of schemas that do not declare one.
pub const DEFAULT_BASE_URI: &str = "json-schema:///";

/// Parse the default base URI.
pub(crate) fn default_base() -> Result<Url, SchemaError> {
    Url::parse(DEFAULT_BASE_URI).map_err(|e| SchemaError::InvalidUri {
        uri: DEFAULT_BASE_URI.to_string(),
        reason: e.to_string(),
    })
}

/// Resolve `reference` against `base`, splitting off the fragment.
pub(crate) fn split_reference(base: &Url, reference: &str) -> Option<(Url, String)> {
    let mut url = base.join(reference).ok()?;
    let fragment = url.fragment().unwrap_or_default().to_string();
    url.set_fragment(None);
    Some((url, fragment))
}

/// Lookup tables filled during compilation.
#[derive(Debug, Default)]
pub(crate) struct Index {
    pub(crate) documents: HashMap<String, Value>,
    pub(crate) locations: HashMap<String, Arc<CompiledNode>>,
    pub(crate) dynamic_anchors: HashMap<String, Arc<CompiledNode>>,
    pub(crate) recursive_anchors: HashMap<String, Arc<CompiledNode>>,
}

/// Per-root shared state.
#[derive(Debug)]
pub struct Context {
    pub(crate) caps: &'static DraftCapabilities,
    pub(crate) formats: FormatRegistry,
    pub(crate) index: Index,
}

impl Context {
    /// Find the node a resolved reference URI points at.
    ///
    /// Plain resource URIs, JSON-pointer fragments and anchor fragments are
    /// looked up in the location index. A pointer into a stored document
    /// that was never compiled as a schema (a fragment under an unknown
    /// keyword) is compiled on demand as a transient node.
    pub(crate) fn lookup(&self, resource: &Url, fragment: &str) -> Option<Arc<CompiledNode>> {
        let base = resource.as_str();
        if fragment.is_empty() {
            return self.index.locations.get(&format!("{base}#")).cloned();
        }
        if !fragment.starts_with('/') && !fragment.starts_with("%2F") {
            return self.index.locations.get(&format!("{base}#{fragment}")).cloned();
        }
        let pointer = JsonPointer::from_fragment(fragment).ok()?;
        if let Some(node) = self.index.locations.get(&format!("{base}#{}", pointer.as_rfc6901())) {
            return Some(Arc::clone(node));
        }
        let document = self.index.documents.get(base)?;
        let value = pointer.resolve(document)?;
        tracing::trace!(%base, pointer = %pointer, "compiling uncompiled reference target");
        compile_transient(self.caps, value, Arc::new(resource.clone()), pointer.clone(), pointer).ok()
    }

    /// The node declaring `$dynamicAnchor: name` in resource `base`.
    pub(crate) fn dynamic_anchor(&self, base: &Url, name: &str) -> Option<&Arc<CompiledNode>> {
        self.index.dynamic_anchors.get(&format!("{}#{name}", base.as_str()))
    }

    /// The root of resource `base` if it declares `$recursiveAnchor: true`.
    pub(crate) fn recursive_anchor(&self, base: &Url) -> Option<&Arc<CompiledNode>> {
        self.index.recursive_anchors.get(base.as_str())
    }

    /// The format registry used by the `format` keyword.
    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Number of indexed locations (nodes plus anchors).
    pub fn location_count(&self) -> usize {
        self.index.locations.len()
    }

    /// Base URIs of every stored document, sorted.
    pub fn documents(&self) -> Vec<&str> {
        let mut bases: Vec<&str> = self.index.documents.keys().map(String::as_str).collect();
        bases.sort_unstable();
        bases
    }
}
