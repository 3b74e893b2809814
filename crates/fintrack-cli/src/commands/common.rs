use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fintrack_core::config::ClientConfig;
use fintrack_core::db::{Database, SqlitePendingJobRepository};
use fintrack_core::jobs::HttpJobClient;
use fintrack_core::sync::{shared_registry, Reconciler, SharedRegistry};

use crate::error::CliError;
use crate::surface::{LoggingCache, TerminalNotifications};

/// Resolve the pending-jobs database path: CLI flag, then
/// `FINTRACK_DB_PATH`, then the platform data directory.
pub fn resolve_db_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }
    if let Ok(path) = env::var("FINTRACK_DB_PATH") {
        let path = path.trim();
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::data_dir().map_or_else(
        || PathBuf::from("fintrack.db"),
        |dir| dir.join("fintrack").join("pending_jobs.db"),
    )
}

/// Open (creating if needed) the durable pending-job registry.
pub fn open_registry(
    db_path: &Path,
) -> Result<SharedRegistry<SqlitePendingJobRepository>, CliError> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let db = Database::open(db_path)?;
    Ok(shared_registry(SqlitePendingJobRepository::new(
        db.into_connection(),
    )))
}

/// Build the HTTP job client from environment configuration.
pub fn build_job_client(config: &ClientConfig) -> Result<HttpJobClient, CliError> {
    let base_url = config.api_base_url().ok_or(CliError::ApiNotConfigured)?;
    let mut client =
        HttpJobClient::new(base_url).map_err(|err| CliError::Core(err.into()))?;
    if let Some(token) = &config.access_token {
        client = client.with_bearer_token(token);
    }
    Ok(client)
}

/// Reconciler wired to the terminal surfaces.
pub fn build_reconciler() -> Reconciler {
    Reconciler::new(Arc::new(TerminalNotifications), Arc::new(LoggingCache))
}
