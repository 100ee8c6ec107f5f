//! Reforge CLI entry point.

use clap::Parser;

use reforge::cli::{Cli, Commands};
use reforge::infrastructure::config::ConfigLoader;
use reforge::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load_with(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => reforge::cli::handle_error(err.context("Failed to load configuration"), cli.json),
    };

    // Held for the life of the process so buffered file logs are flushed on exit.
    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("warning: logging disabled: {err:#}");
            None
        }
    };

    let result = match cli.command {
        Commands::Init(args) => reforge::cli::commands::init::execute(args, cli.json).await,
        Commands::Job(args) => reforge::cli::commands::job::execute(args, cli.json, &config).await,
    };

    if let Err(err) = result {
        reforge::cli::handle_error(err, cli.json);
    }
}
