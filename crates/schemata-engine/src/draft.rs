//! # Draft Capabilities — Data-Driven Dialect Table
//!
//! One engine serves every draft. What differs between drafts is data:
//! which keywords exist, which JSON types each keyword applies to, and how
//! `$ref` treats its siblings. [`DraftCapabilities`] bundles that data per
//! draft; the compiler and the dispatcher consult it instead of branching
//! on the draft ad hoc.
//!
//! ## Keyword Table
//!
//! [`Keyword`] lists every validating keyword in dispatch order. Each
//! keyword knows the draft that introduced it and the value types it
//! applies to; the per-draft, per-type lists are derived from those two
//! facts once and cached in a `OnceLock`.
//!
//! Some keywords are validated as a group: `items` covers `prefixItems`
//! and `additionalItems`, `contains` covers `minContains`/`maxContains`,
//! and draft-4 boolean `exclusiveMaximum`/`exclusiveMinimum` are read by
//! `maximum`/`minimum`.

use std::sync::OnceLock;

use serde_json::{Map, Value};

use schemata_core::{Draft, JsonType, DRAFT_COUNT};

/// A validating keyword (or keyword group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // -- Any type --
    /// `type`
    Type,
    /// `enum`
    Enum,
    /// `const`
    Const,
    /// `format`
    Format,
    // -- Numbers --
    /// `maximum` (with draft-4 boolean `exclusiveMaximum`)
    Maximum,
    /// `minimum` (with draft-4 boolean `exclusiveMinimum`)
    Minimum,
    /// numeric `exclusiveMaximum`
    ExclusiveMaximum,
    /// numeric `exclusiveMinimum`
    ExclusiveMinimum,
    /// `multipleOf`
    MultipleOf,
    // -- Strings --
    /// `maxLength`
    MaxLength,
    /// `minLength`
    MinLength,
    /// `pattern`
    Pattern,
    // -- Arrays --
    /// `items`, `prefixItems`, `additionalItems`
    Items,
    /// `contains` with `minContains`/`maxContains`
    Contains,
    /// `minItems`
    MinItems,
    /// `maxItems`
    MaxItems,
    /// `uniqueItems`
    UniqueItems,
    // -- Objects --
    /// `properties`
    Properties,
    /// `patternProperties`
    PatternProperties,
    /// `additionalProperties`
    AdditionalProperties,
    /// `propertyNames`
    PropertyNames,
    /// `required`
    Required,
    /// `minProperties`
    MinProperties,
    /// `maxProperties`
    MaxProperties,
    /// `dependencies`
    Dependencies,
    /// `dependentRequired`
    DependentRequired,
    /// `dependentSchemas`
    DependentSchemas,
    // -- Composition --
    /// `not`
    Not,
    /// `allOf`
    AllOf,
    /// `anyOf`
    AnyOf,
    /// `oneOf`
    OneOf,
    /// `if` with `then` and/or `else`
    If,
    // -- Annotation-dependent, always last --
    /// `unevaluatedItems`
    UnevaluatedItems,
    /// `unevaluatedProperties`
    UnevaluatedProperties,
}

impl Keyword {
    /// Every keyword in dispatch order.
    pub fn all_keywords() -> &'static [Keyword] {
        &[
            Self::Type,
            Self::Enum,
            Self::Const,
            Self::Format,
            Self::Maximum,
            Self::Minimum,
            Self::ExclusiveMaximum,
            Self::ExclusiveMinimum,
            Self::MultipleOf,
            Self::MaxLength,
            Self::MinLength,
            Self::Pattern,
            Self::Items,
            Self::Contains,
            Self::MinItems,
            Self::MaxItems,
            Self::UniqueItems,
            Self::Properties,
            Self::PatternProperties,
            Self::AdditionalProperties,
            Self::PropertyNames,
            Self::Required,
            Self::MinProperties,
            Self::MaxProperties,
            Self::Dependencies,
            Self::DependentRequired,
            Self::DependentSchemas,
            Self::Not,
            Self::AllOf,
            Self::AnyOf,
            Self::OneOf,
            Self::If,
            Self::UnevaluatedItems,
            Self::UnevaluatedProperties,
        ]
    }

    /// The schema keyword name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Enum => "enum",
            Self::Const => "const",
            Self::Format => "format",
            Self::Maximum => "maximum",
            Self::Minimum => "minimum",
            Self::ExclusiveMaximum => "exclusiveMaximum",
            Self::ExclusiveMinimum => "exclusiveMinimum",
            Self::MultipleOf => "multipleOf",
            Self::MaxLength => "maxLength",
            Self::MinLength => "minLength",
            Self::Pattern => "pattern",
            Self::Items => "items",
            Self::Contains => "contains",
            Self::MinItems => "minItems",
            Self::MaxItems => "maxItems",
            Self::UniqueItems => "uniqueItems",
            Self::Properties => "properties",
            Self::PatternProperties => "patternProperties",
            Self::AdditionalProperties => "additionalProperties",
            Self::PropertyNames => "propertyNames",
            Self::Required => "required",
            Self::MinProperties => "minProperties",
            Self::MaxProperties => "maxProperties",
            Self::Dependencies => "dependencies",
            Self::DependentRequired => "dependentRequired",
            Self::DependentSchemas => "dependentSchemas",
            Self::Not => "not",
            Self::AllOf => "allOf",
            Self::AnyOf => "anyOf",
            Self::OneOf => "oneOf",
            Self::If => "if",
            Self::UnevaluatedItems => "unevaluatedItems",
            Self::UnevaluatedProperties => "unevaluatedProperties",
        }
    }

    /// The oldest draft that defines this keyword.
    pub fn introduced_in(&self) -> Draft {
        match self {
            Self::Const | Self::Contains | Self::PropertyNames => Draft::Draft6,
            Self::ExclusiveMaximum | Self::ExclusiveMinimum => Draft::Draft6,
            Self::If => Draft::Draft7,
            Self::DependentRequired
            | Self::DependentSchemas
            | Self::UnevaluatedItems
            | Self::UnevaluatedProperties => Draft::Draft2019_09,
            Self::Type
            | Self::Enum
            | Self::Format
            | Self::Maximum
            | Self::Minimum
            | Self::MultipleOf
            | Self::MaxLength
            | Self::MinLength
            | Self::Pattern
            | Self::Items
            | Self::MinItems
            | Self::MaxItems
            | Self::UniqueItems
            | Self::Properties
            | Self::PatternProperties
            | Self::AdditionalProperties
            | Self::Required
            | Self::MinProperties
            | Self::MaxProperties
            | Self::Dependencies
            | Self::Not
            | Self::AllOf
            | Self::AnyOf
            | Self::OneOf => Draft::Draft4,
        }
    }

    /// The single value type this keyword constrains, or `None` when it
    /// applies to every type.
    pub fn value_type(&self) -> Option<JsonType> {
        match self {
            Self::Maximum
            | Self::Minimum
            | Self::ExclusiveMaximum
            | Self::ExclusiveMinimum
            | Self::MultipleOf => Some(JsonType::Number),
            Self::MaxLength | Self::MinLength | Self::Pattern => Some(JsonType::String),
            Self::Items
            | Self::Contains
            | Self::MinItems
            | Self::MaxItems
            | Self::UniqueItems
            | Self::UnevaluatedItems => Some(JsonType::Array),
            Self::Properties
            | Self::PatternProperties
            | Self::AdditionalProperties
            | Self::PropertyNames
            | Self::Required
            | Self::MinProperties
            | Self::MaxProperties
            | Self::Dependencies
            | Self::DependentRequired
            | Self::DependentSchemas
            | Self::UnevaluatedProperties => Some(JsonType::Object),
            Self::Type
            | Self::Enum
            | Self::Const
            | Self::Format
            | Self::Not
            | Self::AllOf
            | Self::AnyOf
            | Self::OneOf
            | Self::If => None,
        }
    }

    /// Whether this keyword (group) is present on a schema object.
    pub fn is_present(&self, schema: &Map<String, Value>, draft: Draft) -> bool {
        match self {
            Self::Items => {
                schema.contains_key("items")
                    || schema.contains_key("additionalItems")
                    || (draft >= Draft::Draft2020_12 && schema.contains_key("prefixItems"))
            }
            Self::If => {
                schema.contains_key("if") && (schema.contains_key("then") || schema.contains_key("else"))
            }
            // Draft 4 spells exclusivity as a boolean beside maximum/minimum.
            Self::ExclusiveMaximum | Self::ExclusiveMinimum => {
                schema.get(self.as_str()).is_some_and(Value::is_number)
            }
            other => schema.contains_key(other.as_str()),
        }
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composition keywords removed from a fragment once it is reduced.
pub const DYNAMIC_KEYWORDS: &[&str] = &[
    "allOf",
    "anyOf",
    "oneOf",
    "dependencies",
    "dependentSchemas",
    "dependentRequired",
    "if",
    "then",
    "else",
];

/// Everything the engine needs to know about one draft.
#[derive(Debug)]
pub struct DraftCapabilities {
    draft: Draft,
    keywords: Vec<Keyword>,
    by_type: [Vec<Keyword>; 6],
}

impl DraftCapabilities {
    /// The capability descriptor for `draft`.
    pub fn for_draft(draft: Draft) -> &'static DraftCapabilities {
        static TABLES: OnceLock<Vec<DraftCapabilities>> = OnceLock::new();
        let tables = TABLES.get_or_init(|| Draft::all_drafts().iter().map(|d| Self::build(*d)).collect());
        // all_drafts() is ordered and dense, so the index is the position.
        let index = Draft::all_drafts().iter().position(|d| *d == draft).unwrap_or(DRAFT_COUNT - 1);
        &tables[index]
    }

    fn build(draft: Draft) -> Self {
        let keywords: Vec<Keyword> = Keyword::all_keywords()
            .iter()
            .copied()
            .filter(|keyword| keyword.introduced_in() <= draft)
            .collect();
        let by_type = [
            JsonType::Null,
            JsonType::Boolean,
            JsonType::Object,
            JsonType::Array,
            JsonType::Number,
            JsonType::String,
        ]
        .map(|ty| {
            keywords
                .iter()
                .copied()
                .filter(|keyword| keyword.value_type().map_or(true, |t| t == ty))
                .collect::<Vec<_>>()
        });
        Self {
            draft,
            keywords,
            by_type,
        }
    }

    /// The draft described.
    pub fn draft(&self) -> Draft {
        self.draft
    }

    /// Keywords this draft defines, in dispatch order.
    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    /// Whether this draft defines `keyword`.
    pub fn knows(&self, keyword: Keyword) -> bool {
        self.keywords.contains(&keyword)
    }

    /// Keywords legal for a value of type `ty`, in dispatch order.
    pub fn keywords_for(&self, ty: JsonType) -> &[Keyword] {
        &self.by_type[ty.table_index()]
    }

    /// Whether `keyword` applies to a value of type `ty` in this draft.
    pub fn applies(&self, keyword: Keyword, ty: JsonType) -> bool {
        self.keywords_for(ty).contains(&keyword)
    }

    /// Whether `$ref` merges with sibling keywords.
    pub fn ref_merges_siblings(&self) -> bool {
        self.draft.ref_merges_siblings()
    }

    /// The resource identifier keyword (`id` or `$id`).
    pub fn id_keyword(&self) -> &'static str {
        self.draft.id_keyword()
    }

    /// Whether `$anchor` declares plain-name fragments.
    pub fn has_anchor_keyword(&self) -> bool {
        self.draft >= Draft::Draft2019_09
    }

    /// Whether `$recursiveRef` / `$recursiveAnchor` are defined.
    pub fn has_recursive_ref(&self) -> bool {
        self.draft == Draft::Draft2019_09
    }

    /// Whether `$dynamicRef` / `$dynamicAnchor` are defined.
    pub fn has_dynamic_ref(&self) -> bool {
        self.draft >= Draft::Draft2020_12
    }

    /// Whether `prefixItems` replaces the array form of `items`.
    pub fn has_prefix_items(&self) -> bool {
        self.draft >= Draft::Draft2020_12
    }

    /// Whether `maximum`/`minimum` read a boolean exclusivity flag.
    pub fn boolean_exclusive_bounds(&self) -> bool {
        self.draft == Draft::Draft4
    }

    /// Whether items matched by `contains` count as evaluated.
    pub fn contains_evaluates_items(&self) -> bool {
        self.draft >= Draft::Draft2020_12
    }
}
