//! Pending-job repository implementation
//!
//! Maps bank account -> in-flight job id, persisted so that a process
//! restart does not forget a running sync. Rows are inserted by the
//! sync engine on successful submission and removed by the poller when
//! a terminal status is observed (or wholesale on sign-out).

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{BankAccountId, JobId};
use crate::util::unix_timestamp_millis;

/// Trait for pending-job storage operations
pub trait PendingJobRepository {
    /// Record an in-flight job for an account (last-write-wins)
    fn record(&self, account: BankAccountId, job_id: &JobId) -> Result<()>;

    /// Remove the entry for an account; returns whether a row existed
    fn forget(&self, account: BankAccountId) -> Result<bool>;

    /// Look up the in-flight job for an account
    fn get(&self, account: BankAccountId) -> Result<Option<JobId>>;

    /// List all tracked (account, job) pairs
    fn list(&self) -> Result<Vec<(BankAccountId, JobId)>>;

    /// Drop every entry (sign-out)
    fn clear(&self) -> Result<()>;
}

/// `SQLite` implementation of `PendingJobRepository`
pub struct SqlitePendingJobRepository {
    conn: Connection,
}

impl SqlitePendingJobRepository {
    /// Create a new repository owning the given connection
    pub const fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl PendingJobRepository for SqlitePendingJobRepository {
    fn record(&self, account: BankAccountId, job_id: &JobId) -> Result<()> {
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT job_id FROM pending_jobs WHERE bank_account_id = ?",
                params![account.as_i64()],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(previous) = existing.filter(|previous| previous.as_str() != job_id.as_str()) {
            // One live job per account is the invariant; an overwritten
            // entry means a prior job was never forgotten.
            tracing::warn!(
                account = %account,
                previous_job = %previous,
                new_job = %job_id,
                "overwriting pending job entry that was still tracked"
            );
        }

        self.conn.execute(
            "INSERT INTO pending_jobs (bank_account_id, job_id, recorded_at)
             VALUES (?, ?, ?)
             ON CONFLICT(bank_account_id) DO UPDATE SET
                 job_id = excluded.job_id,
                 recorded_at = excluded.recorded_at",
            params![account.as_i64(), job_id.as_str(), unix_timestamp_millis()],
        )?;

        Ok(())
    }

    fn forget(&self, account: BankAccountId) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM pending_jobs WHERE bank_account_id = ?",
            params![account.as_i64()],
        )?;
        Ok(rows > 0)
    }

    fn get(&self, account: BankAccountId) -> Result<Option<JobId>> {
        let job_id: Option<String> = self
            .conn
            .query_row(
                "SELECT job_id FROM pending_jobs WHERE bank_account_id = ?",
                params![account.as_i64()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(job_id.map(JobId::from))
    }

    fn list(&self) -> Result<Vec<(BankAccountId, JobId)>> {
        let mut stmt = self.conn.prepare(
            "SELECT bank_account_id, job_id FROM pending_jobs ORDER BY bank_account_id",
        )?;

        let entries = stmt
            .query_map([], |row| {
                Ok((
                    BankAccountId::new(row.get::<_, i64>(0)?),
                    JobId::from(row.get::<_, String>(1)?),
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(entries)
    }

    fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM pending_jobs", [])?;
        Ok(())
    }
}
