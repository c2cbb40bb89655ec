//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the saga binary.

mod commands;
mod play;

pub use commands::{Cli, Commands, PlayArgs};
pub use play::run_play;

use anyhow::Result;
use saga::SagaConfig;
use std::path::Path;

/// Print the effective configuration as TOML.
pub fn show_config(path: Option<&Path>) -> Result<()> {
    let config = SagaConfig::load(path)?;
    if let Some(default) = SagaConfig::default_path() {
        println!("# default file: {}", default.display());
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
