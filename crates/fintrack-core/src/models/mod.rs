//! Data models for FinTrack

mod job;

pub use job::{BankAccountId, IdempotencyKey, JobId, JobRecord, JobStatus};
