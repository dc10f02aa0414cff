// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deskline - help-desk records into an analytics warehouse.
//!
//! This is the binary entry point. Each subcommand runs one extract-and-load
//! operation and prints its JSON result.

mod doctor;
mod export;
mod window;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use deskline_config::{ConfigError, ConfigSource, DesklineConfig};
use deskline_core::DesklineError;
use deskline_pipeline::{Operation, Pipeline};
use tracing::{error, info};

use crate::window::WindowArgs;

/// Deskline - help-desk records into an analytics warehouse.
#[derive(Parser, Debug)]
#[command(name = "deskline", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the standard lookup.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Replace the tag catalog.
    Tags(RunArgs),
    /// Replace the agent directory.
    Agents(RunArgs),
    /// Load a snapshot of the tickets in a window.
    Tickets {
        #[command(flatten)]
        window: WindowArgs,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Load every message of the tickets in a window.
    Messages {
        #[command(flatten)]
        window: WindowArgs,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Load the profiles of users who wrote on tickets in a window.
    Users {
        #[command(flatten)]
        window: WindowArgs,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Check upstream reachability and warehouse health.
    Doctor,
}

#[derive(Args, Debug, Clone, Default)]
struct RunArgs {
    /// Page bound for ticket and message listings.
    #[arg(long)]
    max_pages: Option<u32>,

    /// Also write the extracted rows to this CSV file.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            deskline_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.logging.level);

    match dispatch(cli.command, &config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "deskline failed");
            eprintln!("deskline: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<DesklineConfig, Vec<ConfigError>> {
    let source = path.map_or(ConfigSource::Standard, ConfigSource::File);
    deskline_config::load_and_validate_from(source)
}

/// Runs one subcommand. `Ok(false)` means it ran but reported failure.
async fn dispatch(command: Commands, config: &DesklineConfig) -> Result<bool, DesklineError> {
    let today = chrono::Local::now().date_naive();
    let (operation, run) = match command {
        Commands::Doctor => return doctor::run_doctor(config).await,
        Commands::Tags(run) => (Operation::Tags, run),
        Commands::Agents(run) => (Operation::Agents, run),
        Commands::Tickets { window, run } => (Operation::Tickets(window.resolve(today)?), run),
        Commands::Messages { window, run } => (Operation::Messages(window.resolve(today)?), run),
        Commands::Users { window, run } => (Operation::Users(window.resolve(today)?), run),
    };

    let mut pipeline = Pipeline::from_config(config)?;
    if let Some(max_pages) = run.max_pages {
        pipeline = pipeline.with_max_pages(max_pages);
    }

    let result = pipeline.run(&operation).await;

    if let (Some(path), Some(records)) = (&run.output, result.records()) {
        let written = export::write_csv(path, records)?;
        info!(path = %path.display(), rows = written, "CSV written");
    }

    let json = serde_json::to_string_pretty(&result)
        .map_err(|e| DesklineError::Internal(format!("serializing result: {e}")))?;
    println!("{json}");

    Ok(!result.is_error())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("deskline={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
