//! fintrack-core - Core library for FinTrack
//!
//! This crate contains the shared models, the durable pending-job
//! registry, the remote job service client, and the bank-sync
//! orchestration used by all FinTrack interfaces.

pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod models;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{BankAccountId, IdempotencyKey, JobId, JobRecord, JobStatus};
