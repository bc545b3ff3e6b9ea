//! docsrv - Versioned documentation builder
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use docsrv::cli::{Cli, Commands};
use docsrv::config::{Config, ConfigManager};
use docsrv::error::DocResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> DocResult<()> {
    let cli = Cli::parse();

    let config_manager = ConfigManager::locate(cli.config.clone());

    // Config is loaded before logging so log_format applies from the start
    let config = config_manager.load().await?;
    init_logging(cli.verbose, &config);
    debug!("Using config {}", config_manager.path().display());

    match cli.command {
        Commands::Resolve(args) => docsrv::cli::commands::resolve(args, &config).await,
        Commands::Releases(args) => docsrv::cli::commands::releases(args, &config).await,
        Commands::Config(args) => {
            docsrv::cli::commands::config(args, &config_manager, &config).await
        }
    }
}

/// 0 = warn (spinners only), 1 = info, 2+ = debug
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("docsrv=warn"),
        1 => EnvFilter::new("docsrv=info"),
        _ => EnvFilter::new("docsrv=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
