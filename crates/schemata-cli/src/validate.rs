//! # Validate Subcommand
//!
//! Validates one or more JSON/YAML documents against a schema and prints
//! every located error.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use schemata_engine::{ValidationError, ValidationReport};

use crate::{load_data, load_schema, write_json, CliConfig, OutputFormat, Outcome};

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Schema file, or a schema name when a schema directory is configured.
    #[arg(long, short)]
    pub schema: String,

    /// Documents to validate.
    #[arg(required = true)]
    pub documents: Vec<PathBuf>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(Serialize)]
struct DocumentResult<'a> {
    document: String,
    valid: bool,
    errors: &'a [ValidationError],
}

/// Run the validate subcommand.
pub fn run_validate(args: &ValidateArgs, config: &CliConfig, out: &mut impl Write) -> anyhow::Result<Outcome> {
    let root = load_schema(config, &args.schema)?;
    let mut reports = Vec::with_capacity(args.documents.len());
    for path in &args.documents {
        let document = load_data(path)?;
        let errors = root.validate(&document);
        tracing::debug!(document = %path.display(), errors = errors.len(), "validated document");
        reports.push((
            path,
            ValidationReport {
                schema_name: args.schema.clone(),
                errors,
            },
        ));
    }

    match args.output {
        OutputFormat::Text => {
            for (path, report) in &reports {
                if report.is_valid() {
                    writeln!(out, "{}: valid", path.display())?;
                } else {
                    writeln!(out, "{}: {} error(s)\n{report}", path.display(), report.len())?;
                }
            }
        }
        OutputFormat::Json => {
            let results: Vec<DocumentResult<'_>> = reports
                .iter()
                .map(|(path, report)| DocumentResult {
                    document: path.display().to_string(),
                    valid: report.is_valid(),
                    errors: &report.errors,
                })
                .collect();
            write_json(out, &results)?;
        }
    }

    if reports.iter().all(|(_, report)| report.is_valid()) {
        Ok(Outcome::Valid)
    } else {
        Ok(Outcome::Invalid)
    }
}
