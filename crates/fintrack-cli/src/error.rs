use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] fintrack_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid bank account id: {0}")]
    InvalidAccountId(String),
    #[error(
        "The FinTrack API is not configured. Set FINTRACK_API_URL (and FINTRACK_ACCESS_TOKEN for authenticated endpoints)."
    )]
    ApiNotConfigured,
}
