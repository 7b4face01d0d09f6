//! Mimizuku CLI main entry point

use anyhow::Result;
use clap::Parser;
use mimizuku_cli::{commands::{Cli, CommandExecutor}, interactive::start_interactive};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // No arguments: interactive mode
    if std::env::args().len() == 1 {
        start_interactive().await?;
        return Ok(());
    }

    let cli = Cli::parse();
    let mut executor = CommandExecutor::new();
    let result = executor.execute(cli.command).await?;

    if result.success {
        std::process::exit(0);
    } else {
        std::process::exit(1);
    }
}
