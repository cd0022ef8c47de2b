//! Cornerstone CLI
//!
//! Runs the console server and manages its configuration file.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod cli;
mod commands;
mod config_handlers;

use anyhow::Result;
use clap::Parser;
use cornerstone_api::ConsoleConfig;
use cornerstone_core::ConfigManager;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cli::{Args, Command};

/// `RUST_LOG` when set, otherwise the configured filter.
fn init_tracing(config: &ConsoleConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config.as_deref();

    match args.command {
        Command::Serve { bind } => {
            let mut config = ConsoleConfig::load(config_path)?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            init_tracing(&config);
            commands::serve(&config).await
        }
        Command::Validate => {
            let config = ConsoleConfig::load(config_path)?;
            commands::validate(&config)
        }
        Command::Config { action } => {
            config_handlers::handle_config_command(config_path, action)?;
            Ok(())
        }
    }
}
