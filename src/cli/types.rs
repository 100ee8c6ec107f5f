//! Top-level command line definition.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::init::InitArgs;
use super::commands::job::JobArgs;

#[derive(Parser, Debug)]
#[command(name = "reforge", version, about = "AI-assisted codebase transformation jobs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file, used instead of .reforge/config.yaml and .reforge/local.yaml
    #[arg(short, long, global = true, env = "REFORGE_CONFIG_FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create .reforge/ with a default config and database
    Init(InitArgs),

    /// Submit, run and inspect transformation jobs
    Job(JobArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["reforge", "job", "kinds", "--json", "--config", "custom.yaml"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
    }
}
