//! # schemata CLI Entry Point
//!
//! Assembles subcommands, resolves configuration, installs logging and
//! dispatches to handler modules.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use schemata_cli::{CliConfig, GlobalArgs, Outcome, ERROR_EXIT_CODE};

/// JSON Schema toolchain: validate documents, navigate schemas by data
/// path and inspect reduced schemas. Supports drafts 4, 6, 7, 2019-09
/// and 2020-12.
#[derive(Parser, Debug)]
#[command(name = "schemata", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Validate documents against a schema.
    Validate(schemata_cli::validate::ValidateArgs),
    /// Print the schema that applies at a data path.
    Navigate(schemata_cli::navigate::NavigateArgs),
    /// Print a schema with its composition keywords folded.
    Reduce(schemata_cli::reduce::ReduceArgs),
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::from_default_env();
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn run(command: &Commands, config: &CliConfig) -> anyhow::Result<Outcome> {
    let mut out = std::io::stdout().lock();
    match command {
        Commands::Validate(args) => schemata_cli::validate::run_validate(args, config, &mut out),
        Commands::Navigate(args) => schemata_cli::navigate::run_navigate(args, config, &mut out),
        Commands::Reduce(args) => schemata_cli::reduce::run_reduce(args, config, &mut out),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CliConfig::resolve(&cli.global) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(ERROR_EXIT_CODE);
        }
    };
    init_tracing(config.log_json);
    tracing::debug!(?config, "resolved configuration");

    match run(&cli.command, &config) {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e:#}");
            ExitCode::from(ERROR_EXIT_CODE)
        }
    }
}
