//! # Navigate Subcommand
//!
//! Prints the schema that applies at a data path, optionally settled
//! against a concrete document so `oneOf` and `if/then/else` pick their
//! branch.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde_json::{json, Value};

use schemata_engine::JsonPointer;

use crate::{load_data, load_schema, write_json, CliConfig, Outcome};

/// Arguments for the navigate subcommand.
#[derive(Args, Debug)]
pub struct NavigateArgs {
    /// Schema file, or a schema name when a schema directory is configured.
    #[arg(long, short)]
    pub schema: String,

    /// Data path as a JSON pointer (`#/items/0/name` or `/items/0/name`).
    #[arg(long, short, default_value = "#")]
    pub pointer: String,

    /// Document the path points into.
    #[arg(long, short)]
    pub data: Option<PathBuf>,
}

/// Run the navigate subcommand.
///
/// Prints `{pointer, schema, location, oneOfIndex}`; `schema` is `null`
/// when nothing constrains the path. A path rejected by the schema prints
/// `{pointer, error}` and yields [`Outcome::Invalid`].
pub fn run_navigate(args: &NavigateArgs, config: &CliConfig, out: &mut impl Write) -> anyhow::Result<Outcome> {
    let pointer = JsonPointer::parse(&args.pointer).with_context(|| format!("invalid pointer {:?}", args.pointer))?;
    let root = load_schema(config, &args.schema)?;
    let data = args.data.as_deref().map(load_data).transpose()?;

    let (report, outcome) = match root.get_schema(&pointer, data.as_ref()) {
        Ok(Some(node)) => (
            json!({
                "pointer": pointer,
                "schema": node.schema(),
                "location": node.location(),
                "oneOfIndex": node.one_of_index(),
            }),
            Outcome::Valid,
        ),
        Ok(None) => (json!({"pointer": pointer, "schema": Value::Null}), Outcome::Valid),
        Err(error) => (json!({"pointer": pointer, "error": error}), Outcome::Invalid),
    };
    write_json(out, &report)?;
    Ok(outcome)
}
