//! CLI argument definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "saga",
    version,
    about = "Play a turn-based narrative game driven by LLM storytellers"
)]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play a game, always taking the first offered choice
    Play(PlayArgs),

    /// Print the effective configuration
    Config {
        /// Configuration file (defaults to the platform config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct PlayArgs {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the number of turns
    #[arg(short, long)]
    pub turns: Option<u32>,

    /// Never call the generation service
    #[arg(long)]
    pub offline: bool,

    /// Seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
}
