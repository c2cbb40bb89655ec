//! Saga command-line interface.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    saga::init_tracing(cli.json_logs);

    match &cli.command {
        Commands::Play(args) => cli::run_play(args).await,
        Commands::Config { config } => cli::show_config(config.as_deref()),
    }
}
