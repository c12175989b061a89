//! mailcrawl - Entry point for the contact harvester

use clap::Parser;
use mailcrawl::config::{Cli, Settings};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // Initialize logging; stdout is reserved for the harvested contacts
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    tracing::info!("Starting mailcrawl");

    if let Err(e) = mailcrawl::run(Settings::from(cli)).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
