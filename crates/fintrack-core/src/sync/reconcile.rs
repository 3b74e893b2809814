//! Terminal-state reconciliation
//!
//! The only place allowed to invalidate sync-dependent cached views.
//! A completed job means the backend imported new transactions, so
//! every view derived from them must re-fetch; a failed job changed
//! nothing server-side, so only a notification is emitted.

use std::sync::Arc;

use crate::models::{JobRecord, JobStatus};

const DEFAULT_COMPLETED_MESSAGE: &str = "Sync completed successfully";
const DEFAULT_FAILED_MESSAGE: &str = "Sync failed";

/// Cached views that depend on synchronized account data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachedView {
    BankAccounts,
    Transactions,
    Dashboard,
}

impl CachedView {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BankAccounts => "bankAccounts",
            Self::Transactions => "transactions",
            Self::Dashboard => "dashboard",
        }
    }
}

/// Views invalidated when a sync job completes.
pub const SYNC_DEPENDENT_VIEWS: [CachedView; 3] = [
    CachedView::BankAccounts,
    CachedView::Transactions,
    CachedView::Dashboard,
];

/// Notification severity, mirrored from the UI toast levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// Fire-and-forget user-visible notification surface.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);
}

/// Marks named cached views stale; the views re-fetch on their own.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self, views: &[CachedView]);
}

/// Applies the side effects of a job reaching a terminal status.
pub struct Reconciler {
    notifications: Arc<dyn NotificationSink>,
    cache: Arc<dyn CacheInvalidator>,
}

impl Reconciler {
    pub fn new(notifications: Arc<dyn NotificationSink>, cache: Arc<dyn CacheInvalidator>) -> Self {
        Self {
            notifications,
            cache,
        }
    }

    /// Reconcile a terminal job record into cached state.
    ///
    /// Non-terminal records are ignored; callers are expected to have
    /// checked `status.is_terminal()` already.
    pub fn on_terminal(&self, record: &JobRecord) {
        match record.status {
            JobStatus::Completed => {
                tracing::info!(job = %record.job_id, "sync job completed");
                self.cache.invalidate(&SYNC_DEPENDENT_VIEWS);
                self.notifications
                    .notify(Severity::Success, record.result_or(DEFAULT_COMPLETED_MESSAGE));
            }
            JobStatus::Failed => {
                tracing::warn!(job = %record.job_id, "sync job failed");
                self.notifications
                    .notify(Severity::Error, record.result_or(DEFAULT_FAILED_MESSAGE));
            }
            status => {
                tracing::debug!(job = %record.job_id, %status, "ignoring non-terminal record");
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::test_support::{RecordingCache, RecordingNotifications};
    use super::*;
    use crate::models::{JobId, JobRecord, JobStatus};
    use pretty_assertions::assert_eq;

    fn record(status: JobStatus, result: Option<&str>) -> JobRecord {
        JobRecord {
            job_id: JobId::from("J1"),
            bank_account_id: None,
            status,
            result: result.map(String::from),
            created_at: None,
            updated_at: None,
        }
    }

    fn setup() -> (Arc<RecordingNotifications>, Arc<RecordingCache>, Reconciler) {
        let notifications = Arc::new(RecordingNotifications::default());
        let cache = Arc::new(RecordingCache::default());
        let reconciler = Reconciler::new(notifications.clone(), cache.clone());
        (notifications, cache, reconciler)
    }

    #[test]
    fn test_completed_invalidates_views_and_notifies() {
        let (notifications, cache, reconciler) = setup();

        reconciler.on_terminal(&record(JobStatus::Completed, Some("Synced 12 transactions")));

        let messages = notifications.messages.lock().unwrap();
        assert_eq!(
            *messages,
            vec![(Severity::Success, "Synced 12 transactions".to_string())]
        );
        assert_eq!(*cache.invalidated.lock().unwrap(), SYNC_DEPENDENT_VIEWS.to_vec());
    }

    #[test]
    fn test_completed_uses_default_message_when_result_missing() {
        let (notifications, _, reconciler) = setup();

        reconciler.on_terminal(&record(JobStatus::Completed, None));

        let messages = notifications.messages.lock().unwrap();
        assert_eq!(messages[0].1, "Sync completed successfully");
    }

    #[test]
    fn test_failed_notifies_without_invalidation() {
        let (notifications, cache, reconciler) = setup();

        reconciler.on_terminal(&record(JobStatus::Failed, Some("Bank unreachable")));

        let messages = notifications.messages.lock().unwrap();
        assert_eq!(*messages, vec![(Severity::Error, "Bank unreachable".to_string())]);
        assert!(cache.invalidated.lock().unwrap().is_empty());
    }

    #[test]
    fn test_non_terminal_records_are_ignored() {
        let (notifications, cache, reconciler) = setup();

        reconciler.on_terminal(&record(JobStatus::Processing, None));

        assert!(notifications.messages.lock().unwrap().is_empty());
        assert!(cache.invalidated.lock().unwrap().is_empty());
    }
}
