//! keylatch - TTL locks and ephemeral cache over Redis
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use keylatch::cli::{Cli, Commands};
use keylatch::config::ConfigManager;
use keylatch::error::KeylatchResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> KeylatchResult<ExitCode> {
    let cli = Cli::parse();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let mut config = config_manager.load().await?;

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("keylatch=warn"),
        1 => EnvFilter::new("keylatch=info"),
        _ => EnvFilter::new("keylatch=debug"),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.without_time().init();
    }

    if let Some(url) = cli.store {
        debug!("Store URL overridden on command line");
        config.store.url = url;
    }

    // Dispatch to command
    match cli.command {
        Commands::Lock(args) => keylatch::cli::commands::lock(args, &config).await,
        Commands::Cache(args) => keylatch::cli::commands::cache(args, &config)
            .await
            .map(|()| ExitCode::SUCCESS),
        Commands::Config(args) => keylatch::cli::commands::config(args, &config, &config_manager)
            .await
            .map(|()| ExitCode::SUCCESS),
    }
}
