//! SafeUse CLI - operator tools for the backend the sites depend on.
//!
//! # Usage
//!
//! ```bash
//! # Probe every read endpoint and print record counts
//! safeuse-cli check
//!
//! # Print normalized records as JSON
//! safeuse-cli dump substances
//! safeuse-cli dump contacts > contacts.json
//! ```
//!
//! # Commands
//!
//! - `check` - Probe every read endpoint
//! - `dump` - Print one resource as normalized JSON
//!
//! Admin-only resources need `SAFEUSE_ADMIN_EMAIL` and
//! `SAFEUSE_ADMIN_PASSWORD`; without them `check` skips those endpoints.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::dump::Resource;

#[derive(Parser)]
#[command(name = "safeuse-cli")]
#[command(author, version, about = "SafeUse operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe every read endpoint and print status and record counts
    Check,
    /// Print the normalized records of one resource as JSON
    Dump {
        /// Resource to dump
        #[arg(value_enum)]
        resource: Resource,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Logs go to stderr so dumps stay valid JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "safeuse_cli=info,safeuse_backend=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Check => commands::check::run().await,
        Commands::Dump { resource } => commands::dump::run(resource).await,
    }
}
