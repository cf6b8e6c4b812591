//! # Engine Errors — Validation Records and Schema-Authoring Failures
//!
//! Two disjoint error families live here:
//!
//! - [`ValidationError`] is a *value*. Keyword validators return zero, one
//!   or many of them; the dispatcher concatenates without deduplication.
//!   Composition errors (`oneOf`, `anyOf`, `allOf`, discriminators) carry
//!   the sub-errors that led to the verdict in [`ValidationError::errors`]
//!   instead of surfacing them as independent top-level records.
//!
//! - [`SchemaError`] is a `Result` error for schemas that cannot be
//!   interpreted at all: invalid regexes, unknown `type` names, malformed
//!   `dependencies`, non-schema values where a schema is required.
//!
//! ## Wire Shape
//!
//! A `ValidationError` serializes to
//! `{ "code", "name", "pointer", "schema", "value", "data" }` where `code`
//! is stable kebab-case (`multiple-one-of-error`), `name` is PascalCase
//! (`MultipleOneOfError`) and nested sub-errors appear as `data.errors`.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use schemata_core::JsonPointer;

/// Stable identifier of a validation failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    // -- Structural --
    /// The value's JSON type is not allowed by `type`.
    TypeError,
    /// A property listed in `required` is missing.
    RequiredPropertyError,
    /// A key is matched by neither `properties` nor `patternProperties`
    /// while `additionalProperties` is `false`.
    NoAdditionalPropertiesError,
    /// An array item beyond the tuple is disallowed.
    AdditionalItemsError,
    /// A reference could not be resolved.
    UnresolvedRefError,
    /// The schema at this location is `false`.
    InvalidDataError,
    /// A reduced or merged fragment could not be compiled.
    InvalidSchemaError,

    // -- Keyword violations --
    /// The value is not one of `enum`.
    EnumError,
    /// The value differs from `const`.
    ConstError,
    /// The value matches the `not` schema.
    NotError,
    /// A registered format validator rejected the value.
    FormatError,
    /// The value exceeds `maximum` / `exclusiveMaximum`.
    MaximumError,
    /// The value is below `minimum` / `exclusiveMinimum`.
    MinimumError,
    /// The value is not a multiple of `multipleOf`.
    MultipleOfError,
    /// The string is longer than `maxLength`.
    MaxLengthError,
    /// The string is shorter than `minLength`.
    MinLengthError,
    /// The string does not match `pattern`.
    PatternError,
    /// No item matches `contains`.
    ContainsError,
    /// Fewer items than `minContains` match `contains`.
    ContainsMinError,
    /// More items than `maxContains` match `contains`.
    ContainsMaxError,
    /// The array has fewer than `minItems` items.
    MinItemsError,
    /// The array has more than `maxItems` items.
    MaxItemsError,
    /// An item repeats an earlier item.
    UniqueItemsError,
    /// An item is not evaluated and `unevaluatedItems` is `false`.
    UnevaluatedItemsError,
    /// A property name is rejected by `propertyNames`.
    InvalidPropertyNameError,
    /// The object has fewer than `minProperties` properties.
    MinPropertiesError,
    /// The object has more than `maxProperties` properties.
    MaxPropertiesError,
    /// A dependency of a present property is missing.
    MissingDependencyError,
    /// A property is not evaluated and `unevaluatedProperties` is `false`.
    UnevaluatedPropertyError,

    // -- Composition --
    /// At least one `allOf` member failed.
    AllOfError,
    /// No `anyOf` member passed.
    AnyOfError,
    /// No `oneOf` member passed.
    OneOfError,
    /// More than one `oneOf` member passed.
    MultipleOneOfError,
    /// The discriminator property is absent from the value.
    MissingOneOfDiscriminatorError,
    /// No `oneOf` branch accepts the discriminator value.
    OneOfDiscriminatorError,
}

impl ErrorCode {
    /// Returns all error codes.
    pub fn all_codes() -> &'static [ErrorCode] {
        &[
            Self::TypeError,
            Self::RequiredPropertyError,
            Self::NoAdditionalPropertiesError,
            Self::AdditionalItemsError,
            Self::UnresolvedRefError,
            Self::InvalidDataError,
            Self::InvalidSchemaError,
            Self::EnumError,
            Self::ConstError,
            Self::NotError,
            Self::FormatError,
            Self::MaximumError,
            Self::MinimumError,
            Self::MultipleOfError,
            Self::MaxLengthError,
            Self::MinLengthError,
            Self::PatternError,
            Self::ContainsError,
            Self::ContainsMinError,
            Self::ContainsMaxError,
            Self::MinItemsError,
            Self::MaxItemsError,
            Self::UniqueItemsError,
            Self::UnevaluatedItemsError,
            Self::InvalidPropertyNameError,
            Self::MinPropertiesError,
            Self::MaxPropertiesError,
            Self::MissingDependencyError,
            Self::UnevaluatedPropertyError,
            Self::AllOfError,
            Self::AnyOfError,
            Self::OneOfError,
            Self::MultipleOneOfError,
            Self::MissingOneOfDiscriminatorError,
            Self::OneOfDiscriminatorError,
        ]
    }

    /// The stable kebab-case code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeError => "type-error",
            Self::RequiredPropertyError => "required-property-error",
            Self::NoAdditionalPropertiesError => "no-additional-properties-error",
            Self::AdditionalItemsError => "additional-items-error",
            Self::UnresolvedRefError => "unresolved-ref-error",
            Self::InvalidDataError => "invalid-data-error",
            Self::InvalidSchemaError => "invalid-schema-error",
            Self::EnumError => "enum-error",
            Self::ConstError => "const-error",
            Self::NotError => "not-error",
            Self::FormatError => "format-error",
            Self::MaximumError => "maximum-error",
            Self::MinimumError => "minimum-error",
            Self::MultipleOfError => "multiple-of-error",
            Self::MaxLengthError => "max-length-error",
            Self::MinLengthError => "min-length-error",
            Self::PatternError => "pattern-error",
            Self::ContainsError => "contains-error",
            Self::ContainsMinError => "contains-min-error",
            Self::ContainsMaxError => "contains-max-error",
            Self::MinItemsError => "min-items-error",
            Self::MaxItemsError => "max-items-error",
            Self::UniqueItemsError => "unique-items-error",
            Self::UnevaluatedItemsError => "unevaluated-items-error",
            Self::InvalidPropertyNameError => "invalid-property-name-error",
            Self::MinPropertiesError => "min-properties-error",
            Self::MaxPropertiesError => "max-properties-error",
            Self::MissingDependencyError => "missing-dependency-error",
            Self::UnevaluatedPropertyError => "unevaluated-property-error",
            Self::AllOfError => "all-of-error",
            Self::AnyOfError => "any-of-error",
            Self::OneOfError => "one-of-error",
            Self::MultipleOneOfError => "multiple-one-of-error",
            Self::MissingOneOfDiscriminatorError => "missing-one-of-discriminator-error",
            Self::OneOfDiscriminatorError => "one-of-discriminator-error",
        }
    }

    /// The PascalCase error name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TypeError => "TypeError",
            Self::RequiredPropertyError => "RequiredPropertyError",
            Self::NoAdditionalPropertiesError => "NoAdditionalPropertiesError",
            Self::AdditionalItemsError => "AdditionalItemsError",
            Self::UnresolvedRefError => "UnresolvedRefError",
            Self::InvalidDataError => "InvalidDataError",
            Self::InvalidSchemaError => "InvalidSchemaError",
            Self::EnumError => "EnumError",
            Self::ConstError => "ConstError",
            Self::NotError => "NotError",
            Self::FormatError => "FormatError",
            Self::MaximumError => "MaximumError",
            Self::MinimumError => "MinimumError",
            Self::MultipleOfError => "MultipleOfError",
            Self::MaxLengthError => "MaxLengthError",
            Self::MinLengthError => "MinLengthError",
            Self::PatternError => "PatternError",
            Self::ContainsError => "ContainsError",
            Self::ContainsMinError => "ContainsMinError",
            Self::ContainsMaxError => "ContainsMaxError",
            Self::MinItemsError => "MinItemsError",
            Self::MaxItemsError => "MaxItemsError",
            Self::UniqueItemsError => "UniqueItemsError",
            Self::UnevaluatedItemsError => "UnevaluatedItemsError",
            Self::InvalidPropertyNameError => "InvalidPropertyNameError",
            Self::MinPropertiesError => "MinPropertiesError",
            Self::MaxPropertiesError => "MaxPropertiesError",
            Self::MissingDependencyError => "MissingDependencyError",
            Self::UnevaluatedPropertyError => "UnevaluatedPropertyError",
            Self::AllOfError => "AllOfError",
            Self::AnyOfError => "AnyOfError",
            Self::OneOfError => "OneOfError",
            Self::MultipleOneOfError => "MultipleOneOfError",
            Self::MissingOneOfDiscriminatorError => "MissingOneOfDiscriminatorError",
            Self::OneOfDiscriminatorError => "OneOfDiscriminatorError",
        }
    }

    /// Whether this code reports a composition verdict with sub-errors.
    pub fn is_composition(&self) -> bool {
        matches!(
            self,
            Self::AllOfError
                | Self::AnyOfError
                | Self::OneOfError
                | Self::MultipleOneOfError
                | Self::MissingOneOfDiscriminatorError
                | Self::OneOfDiscriminatorError
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all_codes()
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| format!("unknown error code: {s}"))
    }
}

/// A located, machine-readable validation failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Failure kind.
    pub code: ErrorCode,
    /// Location of the offending value inside the validated data.
    pub pointer: JsonPointer,
    /// The schema fragment responsible for the failure.
    pub schema: Value,
    /// The offending value.
    pub value: Value,
    /// Kind-specific auxiliary data (limits, offending keys, matches).
    pub data: Map<String, Value>,
    /// Sub-errors of a composition verdict, reported under `data.errors`.
    pub errors: Vec<ValidationError>,
}

impl ValidationError {
    /// Create an error without auxiliary data.
    pub fn new(code: ErrorCode, pointer: JsonPointer, schema: Value, value: Value) -> Self {
        Self {
            code,
            pointer,
            schema,
            value,
            data: Map::new(),
            errors: Vec::new(),
        }
    }

    /// Attach one auxiliary datum.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Attach composition sub-errors.
    pub fn with_errors(mut self, errors: Vec<ValidationError>) -> Self {
        self.errors = errors;
        self
    }

    /// The PascalCase name of this error's kind.
    pub fn name(&self) -> &'static str {
        self.code.name()
    }

    /// The JSON form, `{code, name, pointer, schema, value, data}`.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Every error in this tree, depth first, this error included.
    pub fn flatten(&self) -> Vec<&ValidationError> {
        let mut out = vec![self];
        for child in &self.errors {
            out.extend(child.flatten());
        }
        out
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.code, self.pointer)?;
        if !self.data.is_empty() {
            write!(f, " {}", Value::Object(self.data.clone()))?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut data = self.data.clone();
        if !self.errors.is_empty() {
            let nested: Vec<Value> = self.errors.iter().map(ValidationError::to_json).collect();
            data.insert("errors".to_string(), Value::Array(nested));
        }
        let mut state = serializer.serialize_struct("ValidationError", 6)?;
        state.serialize_field("code", &self.code)?;
        state.serialize_field("name", self.code.name())?;
        state.serialize_field("pointer", &self.pointer)?;
        state.serialize_field("schema", &self.schema)?;
        state.serialize_field("value", &self.value)?;
        state.serialize_field("data", &data)?;
        state.end()
    }
}

/// A schema that cannot be compiled.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A value that must be a schema is neither an object nor a boolean.
    #[error("expected a schema (object or boolean) at {pointer}, found {found}")]
    NotASchema {
        /// Location of the offending value inside the schema document.
        pointer: JsonPointer,
        /// JSON type of the offending value.
        found: String,
    },

    /// A keyword value has the wrong shape.
    #[error("invalid `{keyword}` at {pointer}: {reason}")]
    InvalidKeyword {
        /// The keyword name.
        keyword: String,
        /// Location of the schema object carrying the keyword.
        pointer: JsonPointer,
        /// What was wrong.
        reason: String,
    },

    /// A `pattern` or `patternProperties` key is not a valid regex.
    #[error("invalid regular expression {pattern:?} at {pointer}: {reason}")]
    InvalidPattern {
        /// The pattern text.
        pattern: String,
        /// Location of the schema object carrying the pattern.
        pointer: JsonPointer,
        /// Regex compiler message.
        reason: String,
    },

    /// A `type` entry is not a JSON Schema type name.
    #[error("unsupported schema type {name:?} at {pointer}")]
    UnsupportedType {
        /// The unknown type name.
        name: String,
        /// Location of the schema object.
        pointer: JsonPointer,
    },

    /// A `dependencies` entry is neither a list of names nor a schema.
    #[error("malformed dependency {property:?} at {pointer}: expected an array of strings or a schema")]
    MalformedDependency {
        /// The dependent property.
        property: String,
        /// Location of the schema object.
        pointer: JsonPointer,
    },

    /// An `$id` or remote URI could not be parsed or joined.
    #[error("invalid schema URI {uri:?}: {reason}")]
    InvalidUri {
        /// The URI text.
        uri: String,
        /// Parser message.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_code_and_name_cover_every_kind() {
        for code in ErrorCode::all_codes() {
            assert!(code.as_str().ends_with("-error"), "{code:?}");
            assert!(code.name().ends_with("Error"), "{code:?}");
            assert_eq!(code.as_str().parse::<ErrorCode>().unwrap(), *code);
        }
    }

    #[test]
    fn test_serde_code_matches_as_str() {
        for code in ErrorCode::all_codes() {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, json!(code.as_str()));
        }
    }

    #[test]
    fn test_error_wire_shape() {
        let err = ValidationError::new(
            ErrorCode::MinimumError,
            JsonPointer::root().join("age"),
            json!({"minimum": 18}),
            json!(3),
        )
        .with("minimum", 18);
        let json = err.to_json();
        assert_eq!(json["code"], "minimum-error");
        assert_eq!(json["name"], "MinimumError");
        assert_eq!(json["pointer"], "#/age");
        assert_eq!(json["schema"], json!({"minimum": 18}));
        assert_eq!(json["value"], 3);
        assert_eq!(json["data"], json!({"minimum": 18}));
    }

    #[test]
    fn test_nested_errors_serialize_under_data() {
        let inner = ValidationError::new(ErrorCode::TypeError, JsonPointer::root(), json!({}), json!(1));
        let outer = ValidationError::new(ErrorCode::AnyOfError, JsonPointer::root(), json!({}), json!(1))
            .with_errors(vec![inner]);
        let json = outer.to_json();
        assert_eq!(json["data"]["errors"][0]["code"], "type-error");
        assert_eq!(outer.flatten().len(), 2);
    }

    #[test]
    fn test_composition_codes() {
        assert!(ErrorCode::MultipleOneOfError.is_composition());
        assert!(!ErrorCode::TypeError.is_composition());
    }

    #[test]
    fn test_display() {
        let err = ValidationError::new(ErrorCode::RequiredPropertyError, JsonPointer::root(), json!({}), json!({}))
            .with("key", "id");
        assert_eq!(err.to_string(), r##"required-property-error at # {"key":"id"}"##);
    }
}
