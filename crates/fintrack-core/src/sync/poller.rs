//! Recurring job-status poller
//!
//! Every tick, fan out one status query per tracked pending job,
//! independently per account: a slow or failing query for one account
//! never blocks the others. Terminal statuses remove the registry
//! entry and hand the record to the reconciler; transient query
//! failures leave the entry for the next tick.

use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinSet;

use super::reconcile::Reconciler;
use super::SharedRegistry;
use crate::db::PendingJobRepository;
use crate::error::Result;
use crate::jobs::JobService;
use crate::models::BankAccountId;

/// Poll cadence observed by the reference client.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Observes tracked jobs until they reach a terminal status.
pub struct JobPoller<S, R> {
    jobs: Arc<S>,
    registry: SharedRegistry<R>,
    reconciler: Reconciler,
    interval: Duration,
}

impl<S, R> JobPoller<S, R>
where
    S: JobService + 'static,
    R: PendingJobRepository + Send,
{
    pub fn new(jobs: Arc<S>, registry: SharedRegistry<R>, reconciler: Reconciler) -> Self {
        Self {
            jobs,
            registry,
            reconciler,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the poll cadence (mainly for tests).
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the recurring poll loop until `shutdown` fires.
    ///
    /// Entries present in the registry at startup are still-pending
    /// jobs from a previous process life; the first tick checks them
    /// immediately, no new submission required.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.poll_once().await,
                _ = shutdown.changed() => {
                    tracing::debug!("job poller shutting down");
                    break;
                }
            }
        }
    }

    /// Poll until every tracked job reaches a terminal status.
    ///
    /// The first tick fires immediately, so entries rehydrated from a
    /// previous process life are checked right away. Used by one-shot
    /// consumers that want to exit once the registry drains.
    pub async fn run_until_idle(&self) -> Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            self.poll_once().await;
            if self.lock_registry().list()?.is_empty() {
                return Ok(());
            }
        }
    }

    /// One poll tick: query every tracked job and apply transitions.
    ///
    /// Results are processed in the order responses arrive, not
    /// submission order.
    pub async fn poll_once(&self) {
        let entries = match self.lock_registry().list() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read pending jobs; skipping tick");
                return;
            }
        };
        if entries.is_empty() {
            return;
        }

        let mut queries = JoinSet::new();
        for (account, job_id) in entries {
            let jobs = Arc::clone(&self.jobs);
            queries.spawn(async move {
                let outcome = jobs.job_status(&job_id).await;
                (account, job_id, outcome)
            });
        }

        while let Some(joined) = queries.join_next().await {
            let Ok((account, job_id, outcome)) = joined else {
                tracing::warn!("job status query task failed");
                continue;
            };

            match outcome {
                Ok(record) if record.status.is_terminal() => {
                    self.forget(account);
                    self.reconciler.on_terminal(&record);
                }
                Ok(record) => {
                    tracing::debug!(
                        account = %account,
                        job = %job_id,
                        status = %record.status,
                        "sync job still in flight"
                    );
                }
                Err(err) => {
                    // Entry stays tracked; retried next tick.
                    tracing::warn!(
                        account = %account,
                        job = %job_id,
                        error = %err,
                        "job status query failed; will retry"
                    );
                }
            }
        }
    }

    fn forget(&self, account: BankAccountId) {
        match self.lock_registry().forget(account) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(account = %account, "pending job was already forgotten");
            }
            Err(err) => {
                tracing::warn!(account = %account, error = %err, "failed to forget pending job");
            }
        }
    }

    fn lock_registry(&self) -> MutexGuard<'_, R> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::{Database, SqlitePendingJobRepository};
    use crate::jobs::{JobApiError, JobApiResult};
    use crate::models::{IdempotencyKey, JobId, JobRecord, JobStatus};
    use crate::sync::reconcile::test_support::{RecordingCache, RecordingNotifications};
    use crate::sync::{shared_registry, Severity, SYNC_DEPENDENT_VIEWS};

    /// Status service answering from a per-job script of responses.
    #[derive(Default)]
    struct StatusScript {
        responses: Mutex<HashMap<JobId, VecDeque<JobApiResult<JobRecord>>>>,
        queries: AtomicUsize,
        posts: AtomicUsize,
    }

    impl StatusScript {
        fn script(self, job_id: &str, responses: Vec<JobApiResult<JobRecord>>) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(JobId::from(job_id), responses.into());
            self
        }

        fn queries(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobService for StatusScript {
        async fn initiate_sync(
            &self,
            _account: BankAccountId,
            _key: &IdempotencyKey,
        ) -> JobApiResult<JobId> {
            self.posts.fetch_add(1, Ordering::SeqCst);
            Ok(JobId::from("unexpected-submission"))
        }

        async fn job_status(&self, job_id: &JobId) -> JobApiResult<JobRecord> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .get_mut(job_id)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| {
                    Err(JobApiError::InvalidPayload(format!(
                        "no scripted response for job {job_id}"
                    )))
                })
        }
    }

    fn record(job_id: &str, status: JobStatus, result: Option<&str>) -> JobRecord {
        JobRecord {
            job_id: JobId::from(job_id),
            bank_account_id: None,
            status,
            result: result.map(String::from),
            created_at: None,
            updated_at: None,
        }
    }

    struct Harness {
        poller: JobPoller<StatusScript, SqlitePendingJobRepository>,
        registry: SharedRegistry<SqlitePendingJobRepository>,
        notifications: Arc<RecordingNotifications>,
        cache: Arc<RecordingCache>,
    }

    fn harness(jobs: StatusScript, tracked: &[(i64, &str)]) -> Harness {
        let db = Database::open_in_memory().unwrap();
        let registry = shared_registry(SqlitePendingJobRepository::new(db.into_connection()));
        for (account, job_id) in tracked {
            registry
                .lock()
                .unwrap()
                .record(BankAccountId::new(*account), &JobId::from(*job_id))
                .unwrap();
        }

        let notifications = Arc::new(RecordingNotifications::default());
        let cache = Arc::new(RecordingCache::default());
        let reconciler = Reconciler::new(notifications.clone(), cache.clone());
        let poller = JobPoller::new(Arc::new(jobs), Arc::clone(&registry), reconciler)
            .with_interval(Duration::from_millis(1));

        Harness {
            poller,
            registry,
            notifications,
            cache,
        }
    }

    #[tokio::test]
    async fn test_completed_job_clears_entry_and_reconciles() {
        let jobs = StatusScript::default().script(
            "J1",
            vec![
                Ok(record("J1", JobStatus::Processing, None)),
                Ok(record("J1", JobStatus::Completed, Some("Synced 12 transactions"))),
            ],
        );
        let h = harness(jobs, &[(42, "J1")]);

        // First tick: still processing, entry untouched
        h.poller.poll_once().await;
        let tracked = h.registry.lock().unwrap().get(BankAccountId::new(42)).unwrap();
        assert_eq!(tracked, Some(JobId::from("J1")));
        assert!(h.notifications.messages.lock().unwrap().is_empty());

        // Second tick: completed, entry removed, effects applied
        h.poller.poll_once().await;
        let tracked = h.registry.lock().unwrap().get(BankAccountId::new(42)).unwrap();
        assert_eq!(tracked, None);

        let messages = h.notifications.messages.lock().unwrap();
        assert_eq!(
            *messages,
            vec![(Severity::Success, "Synced 12 transactions".to_string())]
        );
        assert_eq!(*h.cache.invalidated.lock().unwrap(), SYNC_DEPENDENT_VIEWS.to_vec());
    }

    #[tokio::test]
    async fn test_failed_job_notifies_without_invalidation() {
        let jobs = StatusScript::default().script(
            "J2",
            vec![Ok(record("J2", JobStatus::Failed, Some("Bank unreachable")))],
        );
        let h = harness(jobs, &[(7, "J2")]);

        h.poller.poll_once().await;

        let tracked = h.registry.lock().unwrap().get(BankAccountId::new(7)).unwrap();
        assert_eq!(tracked, None);
        let messages = h.notifications.messages.lock().unwrap();
        assert_eq!(*messages, vec![(Severity::Error, "Bank unreachable".to_string())]);
        assert!(h.cache.invalidated.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transient_query_failure_retries_next_tick() {
        let jobs = StatusScript::default().script(
            "J1",
            vec![
                Err(JobApiError::Unavailable("HTTP 503".to_string())),
                Ok(record("J1", JobStatus::Completed, None)),
            ],
        );
        let h = harness(jobs, &[(42, "J1")]);

        h.poller.poll_once().await;
        let tracked = h.registry.lock().unwrap().get(BankAccountId::new(42)).unwrap();
        assert_eq!(tracked, Some(JobId::from("J1")));

        h.poller.poll_once().await;
        let tracked = h.registry.lock().unwrap().get(BankAccountId::new(42)).unwrap();
        assert_eq!(tracked, None);
    }

    #[tokio::test]
    async fn test_one_failing_target_does_not_block_another() {
        let jobs = StatusScript::default()
            .script("J1", vec![Err(JobApiError::Unavailable("HTTP 503".to_string()))])
            .script("J2", vec![Ok(record("J2", JobStatus::Completed, None))]);
        let h = harness(jobs, &[(1, "J1"), (2, "J2")]);

        h.poller.poll_once().await;

        let registry = h.registry.lock().unwrap();
        assert_eq!(registry.get(BankAccountId::new(1)).unwrap(), Some(JobId::from("J1")));
        assert_eq!(registry.get(BankAccountId::new(2)).unwrap(), None);
    }

    #[tokio::test]
    async fn test_rehydrated_entries_are_checked_without_resubmission() {
        // Simulates a restart: the registry already holds an entry and
        // the poller has never seen a submission.
        let jobs = StatusScript::default()
            .script("J1", vec![Ok(record("J1", JobStatus::Processing, None))]);
        let h = harness(jobs, &[(42, "J1")]);

        h.poller.poll_once().await;

        assert_eq!(h.poller.jobs.queries(), 1);
        assert_eq!(h.poller.jobs.posts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_registry_issues_no_queries() {
        let h = harness(StatusScript::default(), &[]);
        h.poller.poll_once().await;
        assert_eq!(h.poller.jobs.queries(), 0);
    }

    #[tokio::test]
    async fn test_run_until_idle_returns_once_registry_drains() {
        let jobs = StatusScript::default().script(
            "J1",
            vec![
                Ok(record("J1", JobStatus::Processing, None)),
                Ok(record("J1", JobStatus::Completed, None)),
            ],
        );
        let h = harness(jobs, &[(42, "J1")]);

        tokio::time::timeout(Duration::from_secs(5), h.poller.run_until_idle())
            .await
            .unwrap()
            .unwrap();

        assert!(h.registry.lock().unwrap().list().unwrap().is_empty());
        assert_eq!(h.poller.jobs.queries(), 2);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let h = harness(StatusScript::default(), &[]);
        let (tx, rx) = tokio::sync::watch::channel(false);

        tx.send(true).unwrap();
        // Completes promptly once the shutdown signal is observed
        tokio::time::timeout(Duration::from_secs(1), h.poller.run(rx))
            .await
            .unwrap();
    }
}
