//! # schemata-cli — JSON Schema Command-Line Interface
//!
//! A clap-based front end over `schemata-engine`.
//!
//! ## Subcommands
//!
//! - `validate` — validate JSON or YAML documents against a schema
//! - `navigate` — print the schema that applies at a data path
//! - `reduce` — print a schema with its composition keywords folded
//!
//! ## Exit Codes
//!
//! `0` when every document is valid, `1` when a document is invalid (or a
//! data path is rejected), `2` on any operational error such as an
//! unreadable file or a schema that does not compile.
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers; handlers take their
//!   parsed arguments, the resolved [`CliConfig`] and an output writer.
//! - No validation logic here: handlers delegate to `schemata-engine`.

pub mod config;
pub mod navigate;
pub mod reduce;
pub mod validate;

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;

use schemata_engine::store::load_document;
use schemata_engine::{SchemaCompiler, SchemaNode, SchemaStore};

pub use config::{CliConfig, GlobalArgs};

/// Exit code for operational errors.
pub const ERROR_EXIT_CODE: u8 = 2;

/// Result of a successfully executed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Everything checked out.
    Valid,
    /// At least one document (or data path) failed validation.
    Invalid,
}

impl Outcome {
    /// The process exit code for this outcome.
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Valid => ExitCode::SUCCESS,
            Self::Invalid => ExitCode::from(1),
        }
    }
}

/// Report rendering.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Compile the schema named by `schema`.
///
/// With a schema directory configured, `schema` names a file (or `$id`)
/// in that directory and every sibling is available to `$ref`. Otherwise
/// it is a path to a JSON or YAML schema file.
pub fn load_schema(config: &CliConfig, schema: &str) -> anyhow::Result<SchemaNode> {
    if let Some(dir) = &config.schema_dir {
        let mut store = SchemaStore::new(dir).with_context(|| format!("cannot load schemas from {}", dir.display()))?;
        if let Some(draft) = config.draft {
            store = store.with_draft(draft);
        }
        return store.compile(schema).map_err(anyhow::Error::from);
    }
    let document = load_data(Path::new(schema))?;
    let compiler = match config.draft {
        Some(draft) => SchemaCompiler::new().draft(draft),
        None => SchemaCompiler::new(),
    };
    compiler
        .compile(&document)
        .with_context(|| format!("schema {schema} does not compile"))
}

/// Read a JSON or YAML document.
pub fn load_data(path: &Path) -> anyhow::Result<Value> {
    load_document(path).map_err(anyhow::Error::from)
}

/// Write `value` as pretty JSON followed by a newline.
pub fn write_json(out: &mut impl Write, value: &impl Serialize) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("cannot serialise output")?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_load_schema_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");
        std::fs::write(&path, "type: integer\nminimum: 1\n").unwrap();
        let root = load_schema(&CliConfig::default(), path.to_str().unwrap()).unwrap();
        assert!(root.is_valid(&json!(3)));
        assert!(!root.is_valid(&json!(0)));
    }

    #[test]
    fn test_load_schema_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("id.json"), r#"{"type": "string"}"#).unwrap();
        std::fs::write(dir.path().join("user.json"), r#"{"properties": {"id": {"$ref": "id.json"}}}"#).unwrap();
        let config = CliConfig {
            schema_dir: Some(PathBuf::from(dir.path())),
            ..CliConfig::default()
        };
        let root = load_schema(&config, "user.json").unwrap();
        assert!(!root.is_valid(&json!({"id": 7})));
    }

    #[test]
    fn test_load_schema_reports_missing_file() {
        let err = load_schema(&CliConfig::default(), "/nonexistent/schema.json").unwrap_err();
        assert!(format!("{err:#}").contains("document load error"));
    }

    #[test]
    fn test_outcome_exit_codes() {
        assert_eq!(Outcome::Valid.exit_code(), ExitCode::SUCCESS);
        assert_eq!(Outcome::Invalid.exit_code(), ExitCode::from(1));
    }
}
