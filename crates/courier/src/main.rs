// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier - webhook ingestion and message reconciliation service.
//!
//! This is the binary entry point.

mod ledger;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use courier_config::CourierConfig;

/// Courier - webhook ingestion and message reconciliation service.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP service (default).
    Serve,
    /// Validate configuration and print the effective settings.
    CheckConfig,
    /// Inspect the webhook ledger.
    Ledger {
        /// Show a single entry by id.
        id: Option<String>,
        /// List entries still awaiting annotation, oldest first.
        #[arg(long)]
        unprocessed: bool,
        /// Maximum number of entries to list.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn load(cli: &Cli) -> CourierConfig {
    let loaded = match &cli.config {
        Some(path) => courier_config::load_and_validate_path(path),
        None => courier_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            courier_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load(&cli);

    let result = match cli.command {
        None | Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::CheckConfig) => serve::check_config(&config),
        Some(Commands::Ledger {
            id,
            unprocessed,
            limit,
        }) => ledger::run_ledger(&config, id.as_deref(), unprocessed, limit).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
