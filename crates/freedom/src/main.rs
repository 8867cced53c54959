// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Freedom - migrate social network history to a blog.
//!
//! This is the binary entry point for the Freedom pipeline.

mod commands;
mod serve;
mod shutdown;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use freedom_config::FreedomConfig;
use freedom_core::{DestinationKind, FreedomError, MigrationKey, SourceKind};

/// Freedom - migrate social network history to a blog.
#[derive(Parser, Debug)]
#[command(name = "freedom", version, about, long_about = None)]
struct Cli {
    /// Config file to load instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the task workers and the HTTP gateway.
    Serve,
    /// Start migrating one source account to one destination account.
    Migrate {
        /// facebook, twitter or googleplus.
        source_kind: SourceKind,
        source_id: String,
        /// wordpress, blogger, tumblr or dropbox.
        dest_kind: DestinationKind,
        dest_id: String,
    },
    /// Pause discovery of new posts for a migration.
    Stop { id: i64 },
    /// Resume a stopped migration.
    Resume { id: i64 },
    /// Show a migration and its most recent posts and comments.
    Status {
        id: i64,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => freedom_config::load_and_validate_path(path),
        None => freedom_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            freedom_config::render_errors(&errors);
            std::process::exit(2);
        }
    };

    init_tracing(&config.server.log_level);

    if let Err(e) = run(cli.command, config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: FreedomConfig) -> Result<(), FreedomError> {
    match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Migrate {
            source_kind,
            source_id,
            dest_kind,
            dest_id,
        } => {
            let key = MigrationKey::new(source_kind, source_id, dest_kind, dest_id);
            let (_, pipeline) = serve::open_pipeline(&config).await?;
            commands::run_migrate(&pipeline, &key).await
        }
        Commands::Stop { id } => {
            let (_, pipeline) = serve::open_pipeline(&config).await?;
            commands::run_stop(&pipeline, id).await
        }
        Commands::Resume { id } => {
            let (_, pipeline) = serve::open_pipeline(&config).await?;
            commands::run_resume(&pipeline, id).await
        }
        Commands::Status { id, json } => {
            let (_, pipeline) = serve::open_pipeline(&config).await?;
            status::run_status(&pipeline, id, json).await
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("freedom={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
