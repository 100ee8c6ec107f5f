//! Implementation of the `reforge init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::setup::{create_config_dir, create_config_file, run_migrations, SetupPaths};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file with the default template
    #[arg(long, short)]
    pub force: bool,

    /// Project directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub initialized_path: PathBuf,
    pub config_file: PathBuf,
    pub config_written: bool,
    pub database_file: PathBuf,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Initialized reforge in {}", self.initialized_path.display())];
        if self.config_written {
            lines.push(format!("  Wrote default config to {}", self.config_file.display()));
        } else {
            lines.push(format!(
                "  Kept existing config {} (use --force to overwrite)",
                self.config_file.display()
            ));
        }
        lines.push(format!("  Database ready at {}", self.database_file.display()));
        lines.join("\n")
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let root = if args.path.is_absolute() {
        args.path
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(args.path)
    };

    let paths = SetupPaths::for_root(&root);
    create_config_dir(&paths)?;
    let config_written = create_config_file(&paths, args.force)?;
    run_migrations(&paths).await?;

    let out = InitOutput {
        initialized_path: root,
        config_file: paths.config_file,
        config_written,
        database_file: paths.database_file,
    };
    output(&out, json_mode);
    Ok(())
}
