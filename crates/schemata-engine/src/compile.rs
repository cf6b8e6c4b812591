//! # Schema Compiler
//!
//! Turns a raw schema document into a tree of compiled nodes and fills the
//! context's location index. Compilation inspects only the static shape of
//! the schema; it never sees data.
//!
//! ## Per-fragment wiring
//!
//! | Keyword | Children | Bound |
//! |---------|----------|-------|
//! | `properties` | one per key | property resolver |
//! | `patternProperties` | regex + schema per key | pattern resolver |
//! | `additionalProperties` | schema | additional resolver unless `false` |
//! | `items` / `prefixItems` / `additionalItems` | tuple + rest | item resolver |
//! | `allOf` / `anyOf` / `oneOf` | members | reducer when non-empty |
//! | `dependencies` / `dependentRequired` / `dependentSchemas` | schemas | dependencies reducer |
//! | `if` + `then`/`else` | three schemas | if-then-else reducer |
//!
//! Validators are every [`Keyword`](crate::Keyword) the draft defines that
//! is present on the fragment, in dispatch order.
//!
//! ## Errors
//!
//! Structurally invalid schemas fail with [`SchemaError`]: a non-schema
//! where a schema is required, an invalid regex, an unknown `type` name, a
//! malformed dependency or an unparsable `$id`.

use std::sync::{Arc, Weak};

use regex::Regex;
use serde_json::{Map, Value};
use url::Url;

use schemata_core::{Draft, JsonPointer, JsonType};

use crate::context::{default_base, Context, Index};
use crate::draft::{DraftCapabilities, Keyword};
use crate::error::SchemaError;
use crate::format::FormatRegistry;
use crate::node::{location_key, CompiledNode, Dependency, DependencyEntry, Reducer, RefKind, Resolver, Scope};
use crate::SchemaNode;

/// Builder for compiled schemas.
///
/// ```
/// use schemata_engine::{Draft, SchemaCompiler};
/// use serde_json::json;
///
/// let root = SchemaCompiler::new()
///     .draft(Draft::Draft7)
///     .remote("https://example.com/item.json", json!({"type": "string"}))
///     .compile(&json!({"items": {"$ref": "https://example.com/item.json"}}))
///     .unwrap();
/// assert!(!root.is_valid(&json!(["a", 1])));
/// ```
#[derive(Debug, Clone)]
pub struct SchemaCompiler {
    draft: Option<Draft>,
    remotes: Vec<(String, Value)>,
    formats: FormatRegistry,
}

impl SchemaCompiler {
    /// A compiler that detects the draft from `$schema` and carries the
    /// default format validators.
    pub fn new() -> Self {
        Self {
            draft: None,
            remotes: Vec::new(),
            formats: FormatRegistry::with_defaults(),
        }
    }

    /// Force a draft instead of detecting it from `$schema`.
    pub fn draft(mut self, draft: Draft) -> Self {
        self.draft = Some(draft);
        self
    }

    /// Register a remote document under `uri`.
    ///
    /// Relative names resolve against `json-schema:///`. A remote that
    /// declares its own `$id` is also reachable under that identifier.
    pub fn remote(mut self, uri: impl Into<String>, schema: Value) -> Self {
        self.remotes.push((uri.into(), schema));
        self
    }

    /// Register or replace a format validator.
    pub fn format<F>(mut self, name: impl Into<String>, validator: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.formats.register(name, validator);
        self
    }

    /// Replace the whole format registry.
    pub fn formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    /// Compile `schema` together with every registered remote.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if the root or any remote is structurally
    /// invalid.
    pub fn compile(&self, schema: &Value) -> Result<SchemaNode, SchemaError> {
        let draft = self.draft.or_else(|| detect_draft(schema)).unwrap_or_default();
        let caps = DraftCapabilities::for_draft(draft);
        let root_base = default_base()?;

        let mut index = Index::default();
        let mut compiler = Compiler {
            caps,
            index: Some(&mut index),
            nodes: 0,
        };
        for (uri, remote) in &self.remotes {
            let mut base = root_base.join(uri).map_err(|e| SchemaError::InvalidUri {
                uri: uri.clone(),
                reason: e.to_string(),
            })?;
            base.set_fragment(None);
            compiler.compile_resource(remote, base)?;
        }
        let root = compiler.compile_resource(schema, root_base)?;
        let nodes = compiler.nodes;

        tracing::debug!(
            draft = %draft,
            nodes,
            remotes = self.remotes.len(),
            locations = index.locations.len(),
            "compiled schema"
        );
        let ctx = Arc::new(Context {
            caps,
            formats: self.formats.clone(),
            index,
        });
        Ok(SchemaNode::new(ctx, root, Scope::default()))
    }
}

impl Default for SchemaCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile a schema with draft detection and default formats.
///
/// # Errors
///
/// Returns [`SchemaError`] if the schema is structurally invalid.
pub fn compile(schema: &Value) -> Result<SchemaNode, SchemaError> {
    SchemaCompiler::new().compile(schema)
}

/// The draft named by a schema's `$schema` keyword.
pub fn detect_draft(schema: &Value) -> Option<Draft> {
    schema.get("$schema").and_then(Value::as_str).and_then(Draft::from_schema_uri)
}

/// Compile a fragment outside the index (reduced or merged fragments, and
/// reference targets that were never compiled).
pub(crate) fn compile_transient(
    caps: &'static DraftCapabilities,
    schema: &Value,
    base: Arc<Url>,
    resource_pointer: JsonPointer,
    pointer: JsonPointer,
) -> Result<Arc<CompiledNode>, SchemaError> {
    let mut compiler = Compiler {
        caps,
        index: None,
        nodes: 0,
    };
    let site = Site {
        base,
        resource_pointer,
        pointer,
    };
    compiler.compile_node(schema, site, Weak::new())
}

/// Where a fragment sits: its resource and its document location.
#[derive(Debug, Clone)]
struct Site {
    base: Arc<Url>,
    resource_pointer: JsonPointer,
    pointer: JsonPointer,
}

impl Site {
    fn child(&self, segments: &[&str]) -> Site {
        Site {
            base: Arc::clone(&self.base),
            resource_pointer: self.resource_pointer.join_all(segments.iter().copied()),
            pointer: self.pointer.join_all(segments.iter().copied()),
        }
    }

    fn item(&self, keyword: &str, index: usize) -> Site {
        Site {
            base: Arc::clone(&self.base),
            resource_pointer: self.resource_pointer.join(keyword).join_index(index),
            pointer: self.pointer.join(keyword).join_index(index),
        }
    }
}

struct Compiler<'a> {
    caps: &'static DraftCapabilities,
    /// `None` for transient compilation.
    index: Option<&'a mut Index>,
    nodes: usize,
}

impl Compiler<'_> {
    fn compile_resource(&mut self, schema: &Value, base: Url) -> Result<Arc<CompiledNode>, SchemaError> {
        if let Some(index) = self.index.as_deref_mut() {
            index.documents.insert(base.as_str().to_string(), schema.clone());
        }
        let site = Site {
            base: Arc::new(base),
            resource_pointer: JsonPointer::root(),
            pointer: JsonPointer::root(),
        };
        self.compile_node(schema, site, Weak::new())
    }

    fn compile_node(
        &mut self,
        schema: &Value,
        outer: Site,
        parent: Weak<CompiledNode>,
    ) -> Result<Arc<CompiledNode>, SchemaError> {
        let map = match schema {
            Value::Bool(_) => None,
            Value::Object(map) => Some(map),
            other => {
                return Err(SchemaError::NotASchema {
                    pointer: outer.pointer.clone(),
                    found: JsonType::of(other).to_string(),
                })
            }
        };

        let mut site = outer.clone();
        let mut anchors = Vec::new();
        let mut dynamic_anchor = None;
        let mut recursive_anchor = false;
        if let Some(map) = map {
            if let Some(resource) = self.resource_id(map, &outer, &mut anchors)? {
                if let Some(index) = self.index.as_deref_mut() {
                    index.documents.insert(resource.as_str().to_string(), schema.clone());
                }
                site = Site {
                    base: Arc::new(resource),
                    resource_pointer: JsonPointer::root(),
                    pointer: outer.pointer.clone(),
                };
            }
            if self.caps.has_anchor_keyword() {
                if let Some(anchor) = map.get("$anchor").and_then(Value::as_str) {
                    anchors.push(anchor.to_string());
                }
            }
            if self.caps.has_dynamic_ref() {
                if let Some(anchor) = map.get("$dynamicAnchor").and_then(Value::as_str) {
                    anchors.push(anchor.to_string());
                    dynamic_anchor = Some(anchor.to_string());
                }
            }
            if self.caps.has_recursive_ref() {
                recursive_anchor = map.get("$recursiveAnchor") == Some(&Value::Bool(true));
            }
        }

        let mut failure = None;
        let node = Arc::new_cyclic(|me| {
            let leaf = CompiledNode::leaf(
                schema.clone(),
                site.pointer.clone(),
                Arc::clone(&site.base),
                site.resource_pointer.clone(),
                parent,
            );
            match map {
                None => leaf,
                Some(map) => match self.wire(leaf, map, &site, me) {
                    Ok(node) => node,
                    Err(e) => {
                        failure = Some(e);
                        CompiledNode::leaf(
                            Value::Bool(false),
                            site.pointer.clone(),
                            Arc::clone(&site.base),
                            site.resource_pointer.clone(),
                            Weak::new(),
                        )
                    }
                },
            }
        });
        if let Some(e) = failure {
            return Err(e);
        }
        self.nodes += 1;

        if let Some(index) = self.index.as_deref_mut() {
            index.locations.insert(location_key(&outer.base, &outer.resource_pointer), Arc::clone(&node));
            if !Arc::ptr_eq(&outer.base, &site.base) {
                index.locations.insert(location_key(&site.base, &site.resource_pointer), Arc::clone(&node));
            }
            for anchor in anchors {
                index.locations.insert(format!("{}#{anchor}", site.base.as_str()), Arc::clone(&node));
            }
            if let Some(name) = dynamic_anchor {
                index.dynamic_anchors.insert(format!("{}#{name}", site.base.as_str()), Arc::clone(&node));
            }
            if recursive_anchor && site.resource_pointer.is_root() {
                index.recursive_anchors.insert(site.base.as_str().to_string(), Arc::clone(&node));
            }
        }
        Ok(node)
    }

    /// The new resource URI an `$id` (or draft-4 `id`) opens, if any.
    /// Plain-name fragments (`#foo`) become anchors.
    fn resource_id(
        &self,
        map: &Map<String, Value>,
        outer: &Site,
        anchors: &mut Vec<String>,
    ) -> Result<Option<Url>, SchemaError> {
        let Some(id) = map.get(self.caps.id_keyword()).and_then(Value::as_str) else {
            return Ok(None);
        };
        // Drafts 4-7 ignore every sibling of `$ref`, `$id` included.
        if map.contains_key("$ref") && !self.caps.ref_merges_siblings() {
            return Ok(None);
        }
        let mut resource = outer.base.join(id).map_err(|e| SchemaError::InvalidUri {
            uri: id.to_string(),
            reason: e.to_string(),
        })?;
        let fragment = resource.fragment().unwrap_or_default().to_string();
        resource.set_fragment(None);
        if !fragment.is_empty() && !fragment.starts_with('/') {
            anchors.push(fragment);
        }
        if id.starts_with('#') || resource == *outer.base {
            return Ok(None);
        }
        Ok(Some(resource))
    }

    fn wire(
        &mut self,
        mut node: CompiledNode,
        map: &Map<String, Value>,
        site: &Site,
        me: &Weak<CompiledNode>,
    ) -> Result<CompiledNode, SchemaError> {
        let caps = self.caps;
        let draft = caps.draft();

        node.reference = reference(map, caps);
        node.types = compile_types(map, site)?;
        if let Some(pattern) = map.get("pattern").and_then(Value::as_str) {
            node.pattern = Some(compile_regex(pattern, site)?);
        }

        // -- Objects --
        if let Some(properties) = map.get("properties") {
            for (key, child) in expect_object(properties, "properties", site)? {
                let compiled = self.compile_node(child, site.child(&["properties", key.as_str()]), me.clone())?;
                node.properties.push((key.clone(), compiled));
            }
            node.resolvers.push(Resolver::Property);
        }
        if let Some(patterns) = map.get("patternProperties") {
            for (pattern, child) in expect_object(patterns, "patternProperties", site)? {
                let regex = compile_regex(pattern, site)?;
                let compiled = self.compile_node(child, site.child(&["patternProperties", pattern.as_str()]), me.clone())?;
                node.pattern_properties.push((regex, compiled));
            }
            node.resolvers.push(Resolver::PatternProperty);
        }
        if let Some(additional) = map.get("additionalProperties") {
            let compiled = self.compile_node(additional, site.child(&["additionalProperties"]), me.clone())?;
            if !compiled.is_bool(false) {
                node.resolvers.push(Resolver::AdditionalProperty);
            }
            node.additional_properties = Some(compiled);
        }
        node.property_names = self.optional(map, Keyword::PropertyNames, "propertyNames", site, me)?;
        node.unevaluated_properties =
            self.optional(map, Keyword::UnevaluatedProperties, "unevaluatedProperties", site, me)?;
        self.wire_dependencies(&mut node, map, site, me)?;

        // -- Arrays --
        self.wire_items(&mut node, map, site, me)?;
        node.contains = self.optional(map, Keyword::Contains, "contains", site, me)?;
        node.unevaluated_items = self.optional(map, Keyword::UnevaluatedItems, "unevaluatedItems", site, me)?;

        // -- Composition --
        node.not = self.optional(map, Keyword::Not, "not", site, me)?;
        node.all_of = self.members(map, "allOf", site, me)?;
        node.any_of = self.members(map, "anyOf", site, me)?;
        node.one_of = self.members(map, "oneOf", site, me)?;
        if caps.knows(Keyword::If) {
            node.if_ = self.optional(map, Keyword::If, "if", site, me)?;
            node.then_ = self.optional(map, Keyword::If, "then", site, me)?;
            node.else_ = self.optional(map, Keyword::If, "else", site, me)?;
        }

        // -- Definitions (compiled for the location index only) --
        for keyword in ["definitions", "$defs"] {
            if let Some(defs) = map.get(keyword) {
                for (name, child) in expect_object(defs, keyword, site)? {
                    let compiled = self.compile_node(child, site.child(&[keyword, name.as_str()]), me.clone())?;
                    node.definitions.push((name.clone(), compiled));
                }
            }
        }

        if !node.all_of.is_empty() {
            node.reducers.push(Reducer::AllOf);
        }
        if !node.any_of.is_empty() {
            node.reducers.push(Reducer::AnyOf);
        }
        if !node.one_of.is_empty() {
            node.reducers.push(Reducer::OneOf);
        }
        if !node.dependencies.is_empty() {
            node.reducers.push(Reducer::Dependencies);
        }
        if node.if_.is_some() || node.then_.is_some() || node.else_.is_some() {
            node.reducers.push(Reducer::IfThenElse);
        }

        node.validators = caps
            .keywords()
            .iter()
            .copied()
            .filter(|keyword| keyword.is_present(map, draft))
            .collect();
        Ok(node)
    }

    fn wire_items(
        &mut self,
        node: &mut CompiledNode,
        map: &Map<String, Value>,
        site: &Site,
        me: &Weak<CompiledNode>,
    ) -> Result<(), SchemaError> {
        let tuple_keyword = if self.caps.has_prefix_items() && map.contains_key("prefixItems") {
            "prefixItems"
        } else {
            "items"
        };
        match map.get(tuple_keyword) {
            Some(Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    node.tuple_items.push(self.compile_node(item, site.item(tuple_keyword, i), me.clone())?);
                }
                let rest_keyword = if tuple_keyword == "prefixItems" { "items" } else { "additionalItems" };
                if let Some(rest) = map.get(rest_keyword) {
                    node.rest_items = Some(self.compile_node(rest, site.child(&[rest_keyword]), me.clone())?);
                }
            }
            Some(rest) => {
                node.rest_items = Some(self.compile_node(rest, site.child(&["items"]), me.clone())?);
            }
            None => {}
        }
        if !node.tuple_items.is_empty() || node.rest_items.is_some() {
            node.resolvers.push(Resolver::Item);
        }
        Ok(())
    }

    fn wire_dependencies(
        &mut self,
        node: &mut CompiledNode,
        map: &Map<String, Value>,
        site: &Site,
        me: &Weak<CompiledNode>,
    ) -> Result<(), SchemaError> {
        for keyword in [Keyword::Dependencies, Keyword::DependentRequired, Keyword::DependentSchemas] {
            if !self.caps.knows(keyword) {
                continue;
            }
            let Some(entries) = map.get(keyword.as_str()) else {
                continue;
            };
            for (property, value) in expect_object(entries, keyword.as_str(), site)? {
                let malformed = || SchemaError::MalformedDependency {
                    property: property.clone(),
                    pointer: site.pointer.clone(),
                };
                let dependency = match (keyword, value) {
                    (Keyword::Dependencies | Keyword::DependentRequired, Value::Array(names)) => {
                        let names = names
                            .iter()
                            .map(|name| name.as_str().map(str::to_string))
                            .collect::<Option<Vec<_>>>()
                            .ok_or_else(malformed)?;
                        Dependency::Required(names)
                    }
                    (Keyword::Dependencies | Keyword::DependentSchemas, Value::Object(_) | Value::Bool(_)) => {
                        let child = site.child(&[keyword.as_str(), property.as_str()]);
                        Dependency::Schema(self.compile_node(value, child, me.clone())?)
                    }
                    _ => return Err(malformed()),
                };
                node.dependencies.push(DependencyEntry {
                    property: property.clone(),
                    source: keyword,
                    dependency,
                });
            }
        }
        Ok(())
    }

    fn optional(
        &mut self,
        map: &Map<String, Value>,
        keyword: Keyword,
        name: &str,
        site: &Site,
        me: &Weak<CompiledNode>,
    ) -> Result<Option<Arc<CompiledNode>>, SchemaError> {
        if !self.caps.knows(keyword) {
            return Ok(None);
        }
        map.get(name)
            .map(|value| self.compile_node(value, site.child(&[name]), me.clone()))
            .transpose()
    }

    fn members(
        &mut self,
        map: &Map<String, Value>,
        keyword: &str,
        site: &Site,
        me: &Weak<CompiledNode>,
    ) -> Result<Vec<Arc<CompiledNode>>, SchemaError> {
        let Some(value) = map.get(keyword) else {
            return Ok(Vec::new());
        };
        let Value::Array(members) = value else {
            return Err(SchemaError::InvalidKeyword {
                keyword: keyword.to_string(),
                pointer: site.pointer.clone(),
                reason: "expected an array of schemas".to_string(),
            });
        };
        members
            .iter()
            .enumerate()
            .map(|(i, member)| self.compile_node(member, site.item(keyword, i), me.clone()))
            .collect()
    }
}

fn reference(map: &Map<String, Value>, caps: &DraftCapabilities) -> Option<(RefKind, String)> {
    let candidates = [
        (RefKind::Ref, true),
        (RefKind::RecursiveRef, caps.has_recursive_ref()),
        (RefKind::DynamicRef, caps.has_dynamic_ref()),
    ];
    candidates.into_iter().filter(|(_, known)| *known).find_map(|(kind, _)| {
        map.get(kind.as_str())
            .and_then(Value::as_str)
            .map(|reference| (kind, reference.to_string()))
    })
}

fn compile_types(map: &Map<String, Value>, site: &Site) -> Result<Option<Vec<JsonType>>, SchemaError> {
    let names: Vec<&Value> = match map.get("type") {
        None => return Ok(None),
        Some(Value::Array(names)) => names.iter().collect(),
        Some(single) => vec![single],
    };
    names
        .into_iter()
        .map(|name| {
            name.as_str()
                .and_then(JsonType::from_name)
                .ok_or_else(|| SchemaError::UnsupportedType {
                    name: name.as_str().map_or_else(|| name.to_string(), str::to_string),
                    pointer: site.pointer.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn compile_regex(pattern: &str, site: &Site) -> Result<Regex, SchemaError> {
    Regex::new(pattern).map_err(|e| SchemaError::InvalidPattern {
        pattern: pattern.to_string(),
        pointer: site.pointer.clone(),
        reason: e.to_string(),
    })
}

fn expect_object<'v>(value: &'v Value, keyword: &str, site: &Site) -> Result<&'v Map<String, Value>, SchemaError> {
    value.as_object().ok_or_else(|| SchemaError::InvalidKeyword {
        keyword: keyword.to_string(),
        pointer: site.pointer.clone(),
        reason: "expected an object".to_string(),
    })
}
