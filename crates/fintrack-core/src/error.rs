//! Error types for fintrack-core

use thiserror::Error;

/// Result type alias using fintrack-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fintrack-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote job service error
    #[error("Job service error: {0}")]
    Job(#[from] crate::jobs::JobApiError),

    /// A submission or tracked job already exists for this account
    #[error("A sync is already in flight for account {0}")]
    SyncInProgress(crate::models::BankAccountId),
}

impl Error {
    /// Whether the failed operation is safe to retry as-is.
    ///
    /// Only remote job-service failures can be transient; local
    /// database and serialization failures are not retried.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Job(err) => err.is_transient(),
            _ => false,
        }
    }
}
