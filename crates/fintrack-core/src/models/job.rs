//! Sync job models
//!
//! The client holds read-only projections of server-tracked sync jobs.
//! The backend owns the job lifecycle; we only observe its status.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of the bank account being synchronized.
///
/// At most one in-flight sync job may exist per account at any time;
/// this is the central invariant of the sync subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankAccountId(i64);

impl BankAccountId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for BankAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BankAccountId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<i64> for BankAccountId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Opaque identifier of a server-tracked sync job.
///
/// The backend mints these; the client never parses them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Client-minted token letting the backend deduplicate retried
/// submissions of the same logical attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Mint a fresh cryptographically-random key.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Observable status of a sync job.
///
/// `Submitted` and `Processing` are in-flight; `Completed` and
/// `Failed` are terminal and absorb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Submitted,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether no further transitions can occur.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submitted => "SUBMITTED",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

/// Read-only projection of a server-tracked sync job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub job_id: JobId,
    #[serde(default)]
    pub bank_account_id: Option<BankAccountId>,
    pub status: JobStatus,
    /// Human-readable outcome message set by the backend on terminal states.
    #[serde(default)]
    pub result: Option<String>,
    /// Backend timestamps are `LocalDateTime`: ISO-8601 without an offset.
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl JobRecord {
    /// Terminal-state message, falling back to `default` when the
    /// backend did not set one.
    #[must_use]
    pub fn result_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.result
            .as_deref()
            .map_or(default, |msg| if msg.trim().is_empty() { default } else { msg })
    }
}
