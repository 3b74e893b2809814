use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fintrack")]
#[command(about = "Synchronize bank accounts from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the local pending-jobs database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initiate a bank sync and watch it to completion
    Sync {
        /// Bank account id to synchronize
        account_id: String,
        /// Submit only; do not wait for the job to finish
        #[arg(long)]
        no_watch: bool,
    },
    /// Watch all pending sync jobs until they finish
    Watch,
    /// List pending sync jobs
    Jobs {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sign out: stop tracking every pending sync job
    Logout,
}
