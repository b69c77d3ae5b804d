// Main entry point for allure-lifecycle

use anyhow::Result;
use clap::Parser;
use tracing::info;

use allure_lifecycle::cli::{Cli, Commands};
use allure_lifecycle::commands;
use allure_lifecycle::config::Config;
use allure_lifecycle::logging;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "allure_lifecycle=debug,warn"
    } else {
        "allure_lifecycle=warn,error"
    };
    logging::init(filter);

    // Load configuration from file (if exists)
    let config = Config::load();
    info!("Starting allure-lifecycle v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Summary(args) => commands::handle_summary(args, &config),
        Commands::Config => commands::handle_config(&config),
    }
}
