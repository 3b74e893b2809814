//! Bank-sync job orchestration
//!
//! Flow: UI/CLI action -> [`IdempotencyKeys`] (obtain key) ->
//! [`SyncEngine::submit`] (POST, record job id) -> pending-job table ->
//! [`JobPoller`] (observe status) -> [`Reconciler`] (apply effects,
//! clear the entry).

pub mod idempotency;
pub mod poller;
pub mod reconcile;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use idempotency::IdempotencyKeys;
pub use poller::{JobPoller, DEFAULT_POLL_INTERVAL};
pub use reconcile::{
    CacheInvalidator, CachedView, NotificationSink, Reconciler, Severity, SYNC_DEPENDENT_VIEWS,
};

use crate::db::PendingJobRepository;
use crate::error::{Error, Result};
use crate::jobs::JobService;
use crate::models::{BankAccountId, JobId};

/// The pending-job repository shared between the engine (inserts) and
/// the poller (deletes).
pub type SharedRegistry<R> = Arc<Mutex<R>>;

/// Wrap a repository for sharing with a poller.
pub fn shared_registry<R: PendingJobRepository>(repo: R) -> SharedRegistry<R> {
    Arc::new(Mutex::new(repo))
}

/// Submission side of the sync subsystem.
///
/// Owns the idempotency-key registry and guarantees that exactly one
/// successful submission per attempt produces exactly one pending-job
/// entry.
pub struct SyncEngine<S, R> {
    jobs: S,
    registry: SharedRegistry<R>,
    keys: IdempotencyKeys,
    in_flight: Mutex<HashSet<BankAccountId>>,
}

impl<S, R> SyncEngine<S, R>
where
    S: JobService,
    R: PendingJobRepository,
{
    pub fn new(jobs: S, registry: SharedRegistry<R>) -> Self {
        Self {
            jobs,
            registry,
            keys: IdempotencyKeys::new(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Initiate a sync job for `account`.
    ///
    /// Acquires (or reuses) the pending idempotency key, submits the
    /// job, and on success records the job id in the durable registry.
    /// On a transient failure the key is retained so a retry reuses
    /// it; on a terminal rejection the key is released and no registry
    /// entry is created.
    pub async fn submit(&self, account: BankAccountId) -> Result<JobId> {
        if self.lock_registry().get(account)?.is_some() {
            return Err(Error::SyncInProgress(account));
        }

        // Single-flight: a duplicate trigger (double-click, impatient
        // reload) while the first request is awaiting its response must
        // not race a second POST.
        let Some(_guard) = InFlightGuard::begin(&self.in_flight, account) else {
            return Err(Error::SyncInProgress(account));
        };

        let key = self.keys.acquire(account);
        tracing::info!(account = %account, "initiating bank sync");

        match self.jobs.initiate_sync(account, &key).await {
            Ok(job_id) => {
                self.keys.release(account);
                self.lock_registry().record(account, &job_id)?;
                tracing::info!(account = %account, job = %job_id, "sync job submitted");
                Ok(job_id)
            }
            Err(err) if err.is_transient() => {
                // Key stays pending: a caller-initiated retry must
                // resend the identical key for backend deduplication.
                tracing::warn!(account = %account, error = %err, "sync submission failed transiently");
                Err(err.into())
            }
            Err(err) => {
                self.keys.release(account);
                tracing::error!(account = %account, error = %err, "sync submission rejected");
                Err(err.into())
            }
        }
    }

    /// The idempotency-key registry (exposed for inspection).
    pub const fn keys(&self) -> &IdempotencyKeys {
        &self.keys
    }

    /// The shared pending-job registry.
    pub fn registry(&self) -> SharedRegistry<R> {
        Arc::clone(&self.registry)
    }

    fn lock_registry(&self) -> MutexGuard<'_, R> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes the account from the in-flight set when dropped, whatever
/// path the submission took.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<BankAccountId>>,
    account: BankAccountId,
}

impl<'a> InFlightGuard<'a> {
    fn begin(set: &'a Mutex<HashSet<BankAccountId>>, account: BankAccountId) -> Option<Self> {
        let mut in_flight = set.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight.insert(account).then_some(Self { set, account })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.account);
    }
}
