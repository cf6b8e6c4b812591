//! # CLI Configuration
//!
//! Settings come from three layers, lowest precedence first:
//!
//! 1. a YAML file passed with `--config`,
//! 2. the `SCHEMATA_DRAFT` and `SCHEMATA_SCHEMA_DIR` environment variables,
//! 3. command-line flags.
//!
//! Clap reads layers 2 and 3 into [`GlobalArgs`]; [`CliConfig::resolve`]
//! lays them over the file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};

use schemata_core::Draft;

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// YAML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Compile every schema for this draft instead of reading `$schema`
    /// (draft4, draft6, draft7, 2019-09, 2020-12).
    #[arg(long, global = true, env = "SCHEMATA_DRAFT")]
    pub draft: Option<Draft>,

    /// Directory of schemas; `--schema` then names a file in it.
    #[arg(long, global = true, env = "SCHEMATA_SCHEMA_DIR")]
    pub schema_dir: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Effective CLI settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Draft override.
    pub draft: Option<Draft>,
    /// Schema directory for name-based lookup.
    pub schema_dir: Option<PathBuf>,
    /// JSON log output.
    pub log_json: bool,
}

impl CliConfig {
    /// Read a YAML configuration file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("cannot read config file {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// The file named by `--config` (if any) overridden by environment
    /// and flags.
    pub fn resolve(args: &GlobalArgs) -> anyhow::Result<Self> {
        let base = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.overridden_by(args))
    }

    /// Lay explicitly given arguments over `self`.
    pub fn overridden_by(self, args: &GlobalArgs) -> Self {
        Self {
            draft: args.draft.or(self.draft),
            schema_dir: args.schema_dir.clone().or(self.schema_dir),
            log_json: args.log_json || self.log_json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schemata.yaml");
        std::fs::write(&path, "draft: draft7\nschema_dir: /srv/schemas\nlog_json: true\n").unwrap();
        let config = CliConfig::from_file(&path).unwrap();
        assert_eq!(config.draft, Some(Draft::Draft7));
        assert_eq!(config.schema_dir, Some(PathBuf::from("/srv/schemas")));
        assert!(config.log_json);
    }

    #[test]
    fn test_unknown_config_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schemata.yaml");
        std::fs::write(&path, "drafts: draft7\n").unwrap();
        assert!(CliConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_arguments_override_file() {
        let file = CliConfig {
            draft: Some(Draft::Draft4),
            schema_dir: Some(PathBuf::from("from-file")),
            log_json: false,
        };
        let args = GlobalArgs {
            draft: Some(Draft::Draft2019_09),
            ..GlobalArgs::default()
        };
        let config = file.overridden_by(&args);
        assert_eq!(config.draft, Some(Draft::Draft2019_09));
        assert_eq!(config.schema_dir, Some(PathBuf::from("from-file")));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = GlobalArgs {
            config: Some(PathBuf::from("/nonexistent/schemata.yaml")),
            ..GlobalArgs::default()
        };
        let err = CliConfig::resolve(&args).unwrap_err();
        assert!(err.to_string().contains("cannot read config file"));
    }
}
