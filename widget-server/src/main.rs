//! Binary crate for the weather widget server.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and interactive configuration
//! - Wiring the forecaster and renderer into HTTP routes
//! - Logging

use clap::Parser;

mod cli;
mod handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
