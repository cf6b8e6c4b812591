//! # Reduce Subcommand
//!
//! Folds a schema's composition keywords into one static schema, either
//! for a concrete document or, without one, statically (`allOf` only).

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use serde_json::json;

use crate::{load_data, load_schema, write_json, CliConfig, Outcome};

/// Arguments for the reduce subcommand.
#[derive(Args, Debug)]
pub struct ReduceArgs {
    /// Schema file, or a schema name when a schema directory is configured.
    #[arg(long, short)]
    pub schema: String,

    /// Document to reduce against. Without it only `allOf` is folded.
    #[arg(long, short)]
    pub data: Option<PathBuf>,

    /// When no single `oneOf` member matches, also print the member that
    /// fits the document best.
    #[arg(long, requires = "data")]
    pub closest: bool,
}

/// Run the reduce subcommand.
///
/// Prints `{schema, oneOfIndex}` on success. A composition failure prints
/// `{error}` (plus `closest` with `--closest`) and yields
/// [`Outcome::Invalid`].
pub fn run_reduce(args: &ReduceArgs, config: &CliConfig, out: &mut impl Write) -> anyhow::Result<Outcome> {
    let root = load_schema(config, &args.schema)?;
    let data = args.data.as_deref().map(load_data).transpose()?;
    let reduced = match &data {
        Some(data) => root.reduce(data),
        None => root.reduce_static(),
    };

    match reduced {
        Ok(node) => {
            write_json(out, &json!({"schema": node.schema(), "oneOfIndex": node.one_of_index()}))?;
            Ok(Outcome::Valid)
        }
        Err(error) => {
            let mut report = json!({"error": error});
            if let (true, Some(data)) = (args.closest, &data) {
                if let Some((index, member)) = root.closest_one_of(data) {
                    report["closest"] = json!({"index": index, "schema": member.schema()});
                }
            }
            write_json(out, &report)?;
            Ok(Outcome::Invalid)
        }
    }
}
