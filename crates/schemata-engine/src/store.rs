//! # Schema Store — Directory-Backed Schema Registry
//!
//! Loads every JSON or YAML schema in a directory and validates documents
//! against any of them by name, with every other loaded schema available
//! for `$ref` resolution.
//!
//! ## Schema Resolution
//!
//! Each file is registered as a remote under its file name, which the
//! compiler resolves against `json-schema:///`, so `{"$ref": "address.json"}`
//! finds `address.json` in the same directory. A schema that declares an
//! `$id` is additionally reachable under that identifier.
//!
//! YAML schemas and documents (`.yaml`, `.yml`) are converted to JSON
//! values before use. Mapping keys that are numbers or booleans become
//! their string form.
//!
//! Nothing is fetched from the network: a reference to a schema outside
//! the directory is reported as `unresolved-ref-error`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use schemata_core::Draft;

use crate::compile::SchemaCompiler;
use crate::error::{SchemaError, ValidationError};
use crate::format::FormatRegistry;
use crate::SchemaNode;

/// Error raised by [`SchemaStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// The document did not conform to the schema.
    #[error("validation failed against schema '{schema_name}':\n{report}")]
    ValidationFailed {
        /// Name of the schema that was validated against.
        schema_name: String,
        /// Every validation error found.
        report: ValidationReport,
    },

    /// A schema file could not be loaded, or no schema has this name.
    #[error("schema load error for '{schema_name}': {reason}")]
    SchemaLoad {
        /// Schema file name or identifier.
        schema_name: String,
        /// Reason the schema could not be loaded.
        reason: String,
    },

    /// A document file could not be read or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoad {
        /// Path to the document.
        path: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// The schema (or one of its siblings) is structurally invalid.
    #[error("schema '{schema_name}' does not compile: {source}")]
    Compile {
        /// Schema file name or identifier.
        schema_name: String,
        /// The compiler's error.
        #[source]
        source: SchemaError,
    },

    /// IO error while listing the schema directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The outcome of validating one document.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Name of the schema validated against.
    pub schema_name: String,
    /// Every error found, in dispatch order.
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    /// Whether the document is valid.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of top-level errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if there are no errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let location = if error.pointer.is_root() {
                "(root)".to_string()
            } else {
                error.pointer.to_string()
            };
            write!(f, "  {location}: {}", error.code)?;
            if !error.data.is_empty() {
                write!(f, " {}", Value::Object(error.data.clone()))?;
            }
        }
        Ok(())
    }
}

/// A directory of schemas, compiled on demand.
///
/// Loading happens once at construction; every compiled schema shares the
/// loaded documents.
#[derive(Debug, Clone)]
pub struct SchemaStore {
    schema_dir: PathBuf,
    /// Loaded schemas by file name.
    schemas: BTreeMap<String, Value>,
    draft: Option<Draft>,
    formats: FormatRegistry,
}

impl SchemaStore {
    /// Load every `*.json`, `*.yaml` and `*.yml` file in `schema_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SchemaLoad`] if the directory cannot be read
    /// or a schema file cannot be parsed.
    pub fn new(schema_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let schema_dir = schema_dir.as_ref().to_path_buf();
        let entries = std::fs::read_dir(&schema_dir).map_err(|e| StoreError::SchemaLoad {
            schema_name: schema_dir.display().to_string(),
            reason: format!("cannot read schema directory: {e}"),
        })?;

        let mut schemas = BTreeMap::new();
        for entry in entries {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !path.is_file() || DocumentFormat::of(&path).is_none() {
                continue;
            }
            let schema = load_document(&path).map_err(|e| StoreError::SchemaLoad {
                schema_name: name.to_string(),
                reason: e.to_string(),
            })?;
            schemas.insert(name.to_string(), schema);
        }
        tracing::debug!(dir = %schema_dir.display(), schemas = schemas.len(), "loaded schema store");

        Ok(Self {
            schema_dir,
            schemas,
            draft: None,
            formats: FormatRegistry::with_defaults(),
        })
    }

    /// Compile every schema for `draft` instead of detecting it.
    pub fn with_draft(mut self, draft: Draft) -> Self {
        self.draft = Some(draft);
        self
    }

    /// Use `formats` for the `format` keyword.
    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    /// Returns the schema directory path.
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Returns the number of loaded schemas.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// File names of all loaded schemas, sorted.
    pub fn schema_names(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    /// A loaded schema by file name or by `$id`.
    pub fn get_schema(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name).or_else(|| {
            self.schemas
                .values()
                .find(|schema| id_of(schema) == Some(name))
        })
    }

    /// A compiler with every loaded schema registered as a remote.
    pub fn compiler(&self) -> SchemaCompiler {
        let compiler = self
            .schemas
            .iter()
            .fold(SchemaCompiler::new(), |compiler, (name, schema)| {
                compiler.remote(name.clone(), schema.clone())
            })
            .formats(self.formats.clone());
        match self.draft {
            Some(draft) => compiler.draft(draft),
            None => compiler,
        }
    }

    /// Compile the schema named `schema_name`.
    ///
    /// # Errors
    ///
    /// [`StoreError::SchemaLoad`] if no schema has that name,
    /// [`StoreError::Compile`] if it (or a sibling) does not compile.
    pub fn compile(&self, schema_name: &str) -> Result<SchemaNode, StoreError> {
        let schema = self.get_schema(schema_name).ok_or_else(|| StoreError::SchemaLoad {
            schema_name: schema_name.to_string(),
            reason: format!("schema not found in {}", self.schema_dir.display()),
        })?;
        self.compiler().compile(schema).map_err(|source| StoreError::Compile {
            schema_name: schema_name.to_string(),
            source,
        })
    }

    /// Validate `instance` against a named schema and return every error.
    ///
    /// # Errors
    ///
    /// Only load and compile failures; validation failures are in the
    /// report.
    pub fn report(&self, instance: &Value, schema_name: &str) -> Result<ValidationReport, StoreError> {
        let root = self.compile(schema_name)?;
        Ok(ValidationReport {
            schema_name: schema_name.to_string(),
            errors: root.validate(instance),
        })
    }

    /// Validate `instance` against a named schema.
    ///
    /// # Errors
    ///
    /// [`StoreError::ValidationFailed`] with the full report if the
    /// document is invalid, plus the load and compile errors of
    /// [`compile`](Self::compile).
    pub fn validate_document(&self, instance: &Value, schema_name: &str) -> Result<(), StoreError> {
        let report = self.report(instance, schema_name)?;
        if report.is_valid() {
            return Ok(());
        }
        Err(StoreError::ValidationFailed {
            schema_name: schema_name.to_string(),
            report,
        })
    }

    /// Load a JSON or YAML document (by extension) and validate it.
    ///
    /// # Errors
    ///
    /// [`StoreError::DocumentLoad`] if the file cannot be read or parsed,
    /// otherwise as [`validate_document`](Self::validate_document).
    pub fn validate_file(&self, document_path: &Path, schema_name: &str) -> Result<(), StoreError> {
        let document = load_document(document_path)?;
        self.validate_document(&document, schema_name)
    }
}

fn id_of(schema: &Value) -> Option<&str> {
    schema
        .get("$id")
        .or_else(|| schema.get("id"))
        .and_then(Value::as_str)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    fn of(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Self::Json),
            Some("yaml" | "yml") => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Read a JSON or YAML file into a JSON value. Files without a YAML
/// extension are parsed as JSON.
///
/// # Errors
///
/// [`StoreError::DocumentLoad`] if the file cannot be read or parsed.
pub fn load_document(path: &Path) -> Result<Value, StoreError> {
    let failure = |reason: String| StoreError::DocumentLoad {
        path: path.display().to_string(),
        reason,
    };
    let content = std::fs::read_to_string(path).map_err(|e| failure(format!("cannot read file: {e}")))?;
    match DocumentFormat::of(path) {
        Some(DocumentFormat::Yaml) => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(&content).map_err(|e| failure(format!("invalid YAML: {e}")))?;
            yaml_to_json(yaml).map_err(|e| failure(format!("YAML-to-JSON conversion failed: {e}")))
        }
        Some(DocumentFormat::Json) | None => {
            serde_json::from_str(&content).map_err(|e| failure(format!("invalid JSON: {e}")))
        }
    }
}

fn yaml_to_json(yaml: serde_yaml::Value) -> Result<Value, String> {
    use serde_yaml::Value as Yaml;
    Ok(match yaml {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                let f = n.as_f64().ok_or_else(|| format!("unsupported YAML number: {n}"))?;
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))?
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect::<Result<_, _>>()?),
        Yaml::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (key, value) in map {
                let key = match key {
                    Yaml::String(s) => s,
                    Yaml::Number(n) => n.to_string(),
                    Yaml::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key: {other:?}")),
                };
                object.insert(key, yaml_to_json(value)?);
            }
            Value::Object(object)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}
