//! # Schema Nodes and Scope
//!
//! A compiled schema is a tree of [`CompiledNode`]s held in `Arc`s. Each
//! node keeps an immutable copy of its fragment, its location, a weak
//! back-reference to its parent and its precompiled children, plus three
//! ordered lists bound at compile time: reducers, resolvers and validators.
//!
//! [`SchemaNode`] is the public handle: a compiled node, the shared
//! [`Context`] and the [`Scope`] the node was reached through. Handles are
//! cheap to clone and never mutate the tree.
//!
//! ## Ownership
//!
//! The context indexes `Arc<CompiledNode>` but never holds a handle, and
//! children point to parents through `Weak`, so no reference cycle keeps a
//! compiled schema alive. Recursive schemas are cycles in the *index*, not
//! in ownership: `$ref` is resolved by lookup on every use.
//!
//! ## Scope
//!
//! The scope is a persistent linked list, innermost frame first. Stepping
//! into a child pushes a frame; existing scopes are shared, never changed.
//! `$recursiveRef` and `$dynamicRef` search it outermost first. Frames pushed
//! during validation also record the data location, which lets validation
//! detect a node re-entered at the same location without progress.

use std::sync::{Arc, Weak};

use regex::Regex;
use serde_json::Value;
use url::Url;

use schemata_core::{Draft, JsonPointer, JsonType};

use crate::context::Context;
use crate::draft::Keyword;

/// The reference keyword a node carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefKind {
    /// `$ref`
    Ref,
    /// `$recursiveRef` (2019-09)
    RecursiveRef,
    /// `$dynamicRef` (2020-12)
    DynamicRef,
}

impl RefKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Ref => "$ref",
            Self::RecursiveRef => "$recursiveRef",
            Self::DynamicRef => "$dynamicRef",
        }
    }
}

/// What a present property requires.
#[derive(Debug)]
pub(crate) enum Dependency {
    /// Other property names that must also be present.
    Required(Vec<String>),
    /// A schema the whole object must satisfy.
    Schema(Arc<CompiledNode>),
}

/// One `dependencies` / `dependentRequired` / `dependentSchemas` entry.
#[derive(Debug)]
pub(crate) struct DependencyEntry {
    pub(crate) property: String,
    pub(crate) source: Keyword,
    pub(crate) dependency: Dependency,
}

/// Data-dependent composition, folded by the reducer in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reducer {
    AllOf,
    AnyOf,
    OneOf,
    Dependencies,
    IfThenElse,
}

/// Single-step navigation strategies, tried in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolver {
    Property,
    PatternProperty,
    AdditionalProperty,
    Item,
}

/// An immutable compiled schema fragment.
#[derive(Debug)]
pub(crate) struct CompiledNode {
    pub(crate) schema: Value,
    /// Location in the document the fragment was compiled from.
    pub(crate) pointer: JsonPointer,
    /// Base URI of the enclosing schema resource, without fragment.
    pub(crate) base: Arc<Url>,
    /// Location relative to the enclosing resource root.
    pub(crate) resource_pointer: JsonPointer,
    /// `base#resource_pointer`, the key of this node in the location index.
    pub(crate) location: String,
    pub(crate) parent: Weak<CompiledNode>,

    pub(crate) reference: Option<(RefKind, String)>,
    pub(crate) types: Option<Vec<JsonType>>,
    pub(crate) pattern: Option<Regex>,

    pub(crate) properties: Vec<(String, Arc<CompiledNode>)>,
    pub(crate) pattern_properties: Vec<(Regex, Arc<CompiledNode>)>,
    pub(crate) additional_properties: Option<Arc<CompiledNode>>,
    pub(crate) property_names: Option<Arc<CompiledNode>>,
    pub(crate) dependencies: Vec<DependencyEntry>,
    pub(crate) unevaluated_properties: Option<Arc<CompiledNode>>,

    /// Positional item schemas (`prefixItems`, or array-form `items`).
    pub(crate) tuple_items: Vec<Arc<CompiledNode>>,
    /// Schema for items past the tuple (`items` or `additionalItems`).
    pub(crate) rest_items: Option<Arc<CompiledNode>>,
    pub(crate) contains: Option<Arc<CompiledNode>>,
    pub(crate) unevaluated_items: Option<Arc<CompiledNode>>,

    pub(crate) not: Option<Arc<CompiledNode>>,
    pub(crate) all_of: Vec<Arc<CompiledNode>>,
    pub(crate) any_of: Vec<Arc<CompiledNode>>,
    pub(crate) one_of: Vec<Arc<CompiledNode>>,
    pub(crate) if_: Option<Arc<CompiledNode>>,
    pub(crate) then_: Option<Arc<CompiledNode>>,
    pub(crate) else_: Option<Arc<CompiledNode>>,
    pub(crate) definitions: Vec<(String, Arc<CompiledNode>)>,

    pub(crate) reducers: Vec<Reducer>,
    pub(crate) resolvers: Vec<Resolver>,
    pub(crate) validators: Vec<Keyword>,
}

impl CompiledNode {
    /// A node with no children; the compiler fills in the rest.
    pub(crate) fn leaf(
        schema: Value,
        pointer: JsonPointer,
        base: Arc<Url>,
        resource_pointer: JsonPointer,
        parent: Weak<CompiledNode>,
    ) -> Self {
        let location = location_key(&base, &resource_pointer);
        Self {
            schema,
            pointer,
            base,
            resource_pointer,
            location,
            parent,
            reference: None,
            types: None,
            pattern: None,
            properties: Vec::new(),
            pattern_properties: Vec::new(),
            additional_properties: None,
            property_names: None,
            dependencies: Vec::new(),
            unevaluated_properties: None,
            tuple_items: Vec::new(),
            rest_items: None,
            contains: None,
            unevaluated_items: None,
            not: None,
            all_of: Vec::new(),
            any_of: Vec::new(),
            one_of: Vec::new(),
            if_: None,
            then_: None,
            else_: None,
            definitions: Vec::new(),
            reducers: Vec::new(),
            resolvers: Vec::new(),
            validators: Vec::new(),
        }
    }

    /// The value of a keyword on this fragment.
    pub(crate) fn keyword(&self, name: &str) -> Option<&Value> {
        self.schema.get(name)
    }

    /// The schema of an exact-key property.
    pub(crate) fn property(&self, key: &str) -> Option<&Arc<CompiledNode>> {
        self.properties.iter().find(|(name, _)| name == key).map(|(_, node)| node)
    }

    /// Whether `key` is matched by `properties` or any `patternProperties`.
    pub(crate) fn declares_property(&self, key: &str) -> bool {
        self.property(key).is_some() || self.pattern_properties.iter().any(|(re, _)| re.is_match(key))
    }

    /// Whether this fragment is the boolean schema `value`.
    pub(crate) fn is_bool(&self, value: bool) -> bool {
        self.schema == Value::Bool(value)
    }
}

/// The index key of a location: `base#pointer`.
pub(crate) fn location_key(base: &Url, resource_pointer: &JsonPointer) -> String {
    format!("{}#{}", base.as_str(), resource_pointer.as_rfc6901())
}

/// The chain of nodes a node was reached through.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scope {
    head: Option<Arc<ScopeFrame>>,
}

#[derive(Debug)]
struct ScopeFrame {
    node: Arc<CompiledNode>,
    instance: Option<JsonPointer>,
    next: Option<Arc<ScopeFrame>>,
    depth: usize,
}

impl Scope {
    /// A new scope with `node` as innermost frame.
    pub(crate) fn push(&self, node: &Arc<CompiledNode>) -> Scope {
        self.push_frame(node, None)
    }

    /// Push a frame recording the data location being validated.
    pub(crate) fn push_at(&self, node: &Arc<CompiledNode>, instance: &JsonPointer) -> Scope {
        self.push_frame(node, Some(instance.clone()))
    }

    fn push_frame(&self, node: &Arc<CompiledNode>, instance: Option<JsonPointer>) -> Scope {
        Scope {
            head: Some(Arc::new(ScopeFrame {
                node: Arc::clone(node),
                instance,
                next: self.head.clone(),
                depth: self.depth() + 1,
            })),
        }
    }

    /// Number of frames.
    pub(crate) fn depth(&self) -> usize {
        self.head.as_ref().map_or(0, |frame| frame.depth)
    }

    /// Frames, innermost first.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<CompiledNode>> {
        std::iter::successors(self.head.as_deref(), |frame| frame.next.as_deref()).map(|frame| &frame.node)
    }

    /// Frames, outermost first.
    pub(crate) fn outermost_first(&self) -> Vec<&Arc<CompiledNode>> {
        let mut frames: Vec<&Arc<CompiledNode>> = self.iter().collect();
        frames.reverse();
        frames
    }

    /// Whether `location` is already being validated at `instance`.
    pub(crate) fn is_validating(&self, location: &str, instance: &JsonPointer) -> bool {
        std::iter::successors(self.head.as_deref(), |frame| frame.next.as_deref())
            .any(|frame| frame.instance.as_ref() == Some(instance) && frame.node.location == location)
    }
}

/// A compiled schema node together with the scope it was reached through.
///
/// Obtained from [`compile`](crate::compile), [`SchemaNode::get`],
/// [`SchemaNode::get_schema`], [`SchemaNode::reduce`] or
/// [`SchemaNode::resolve_ref`].
#[derive(Clone)]
pub struct SchemaNode {
    pub(crate) ctx: Arc<Context>,
    pub(crate) node: Arc<CompiledNode>,
    pub(crate) scope: Scope,
    pub(crate) one_of_index: Option<usize>,
}

impl SchemaNode {
    pub(crate) fn new(ctx: Arc<Context>, node: Arc<CompiledNode>, scope: Scope) -> Self {
        Self {
            ctx,
            node,
            scope,
            one_of_index: None,
        }
    }

    /// A handle to another node of the same compiled schema.
    pub(crate) fn with_node(&self, node: Arc<CompiledNode>, scope: Scope) -> Self {
        Self::new(Arc::clone(&self.ctx), node, scope)
    }

    /// The schema fragment.
    pub fn schema(&self) -> &Value {
        &self.node.schema
    }

    /// Location of the fragment inside its document.
    pub fn pointer(&self) -> &JsonPointer {
        &self.node.pointer
    }

    /// Base URI of the enclosing schema resource.
    pub fn base_uri(&self) -> &str {
        self.node.base.as_str()
    }

    /// `base#pointer` of the fragment within its resource.
    pub fn location(&self) -> &str {
        &self.node.location
    }

    /// The draft the schema was compiled for.
    pub fn draft(&self) -> Draft {
        self.ctx.caps.draft()
    }

    /// Index of the `oneOf` member selected when this node was reduced.
    pub fn one_of_index(&self) -> Option<usize> {
        self.one_of_index
    }

    /// The validating keywords bound to this fragment, in dispatch order.
    pub fn keywords(&self) -> &[Keyword] {
        &self.node.validators
    }

    /// The compiled parent fragment, if it is still alive.
    pub fn parent(&self) -> Option<SchemaNode> {
        let parent = self.node.parent.upgrade()?;
        Some(self.with_node(parent, self.scope.clone()))
    }

    /// Locations of the scope this node was reached through, outermost first.
    pub fn scope_locations(&self) -> Vec<String> {
        self.scope
            .outermost_first()
            .into_iter()
            .map(|node| node.location.clone())
            .collect()
    }
}

impl std::fmt::Debug for SchemaNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaNode")
            .field("location", &self.node.location)
            .field("draft", &self.ctx.caps.draft())
            .field("scope_depth", &self.scope.depth())
            .field("one_of_index", &self.one_of_index)
            .field("schema", &self.node.schema)
            .finish()
    }
}
