//! Durable storage layer for FinTrack

mod connection;
mod migrations;
mod pending_jobs;

pub use connection::Database;
pub use pending_jobs::{PendingJobRepository, SqlitePendingJobRepository};
