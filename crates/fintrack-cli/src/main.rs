//! FinTrack CLI - bank synchronization from the command line
//!
//! Submits sync jobs to the FinTrack API, tracks them durably so a
//! restart resumes watching, and reconciles terminal results.

mod cli;
mod commands;
mod error;
mod surface;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::common::resolve_db_path;
use crate::commands::jobs::run_jobs;
use crate::commands::logout::run_logout;
use crate::commands::sync::{run_sync, run_watch};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fintrack_core=info".parse().expect("valid directive"))
                .add_directive("fintrack_cli=info".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Sync {
            account_id,
            no_watch,
        } => run_sync(&account_id, no_watch, &db_path).await?,
        Commands::Watch => run_watch(&db_path).await?,
        Commands::Jobs { json } => run_jobs(json, &db_path)?,
        Commands::Logout => run_logout(&db_path)?,
    }

    Ok(())
}
