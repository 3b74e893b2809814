//! Terminal implementations of the notification and cache surfaces.

use fintrack_core::sync::{CacheInvalidator, CachedView, NotificationSink, Severity};

/// Prints notifications to the terminal, errors to stderr.
#[derive(Debug, Default)]
pub struct TerminalNotifications;

impl NotificationSink for TerminalNotifications {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => println!("{message}"),
            Severity::Success => println!("✓ {message}"),
            Severity::Error => eprintln!("✗ {message}"),
        }
    }
}

/// The CLI holds no view caches; stale views are only reported so the
/// next interactive client knows to re-fetch.
#[derive(Debug, Default)]
pub struct LoggingCache;

impl CacheInvalidator for LoggingCache {
    fn invalidate(&self, views: &[CachedView]) {
        for view in views {
            tracing::info!(view = view.name(), "marked cached view stale");
        }
    }
}
