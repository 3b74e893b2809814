use std::path::Path;
use std::sync::{Arc, PoisonError};

use fintrack_core::config::ClientConfig;
use fintrack_core::db::PendingJobRepository;
use fintrack_core::models::BankAccountId;
use fintrack_core::sync::{JobPoller, NotificationSink, Severity, SyncEngine};

use crate::commands::common::{build_job_client, build_reconciler, open_registry};
use crate::error::CliError;
use crate::surface::TerminalNotifications;

pub async fn run_sync(account_id: &str, no_watch: bool, db_path: &Path) -> Result<(), CliError> {
    let account: BankAccountId = account_id
        .parse()
        .map_err(|_| CliError::InvalidAccountId(account_id.to_string()))?;

    let config = ClientConfig::from_env();
    let client = build_job_client(&config)?;
    let registry = open_registry(db_path)?;
    let engine = SyncEngine::new(client.clone(), Arc::clone(&registry));

    TerminalNotifications.notify(Severity::Info, "Initiating sync...");
    let job_id = engine.submit(account).await?;
    println!("Submitted sync job {job_id} for account {account}");

    if no_watch {
        return Ok(());
    }

    let poller = JobPoller::new(Arc::new(client), registry, build_reconciler())
        .with_interval(config.poll_interval());
    poller.run_until_idle().await?;
    Ok(())
}

pub async fn run_watch(db_path: &Path) -> Result<(), CliError> {
    let registry = open_registry(db_path)?;
    let pending = registry
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .list()?;
    if pending.is_empty() {
        println!("No pending sync jobs.");
        return Ok(());
    }
    println!("Watching {} pending sync job(s)...", pending.len());

    let config = ClientConfig::from_env();
    let client = build_job_client(&config)?;
    let poller = JobPoller::new(Arc::new(client), registry, build_reconciler())
        .with_interval(config.poll_interval());
    poller.run_until_idle().await?;
    Ok(())
}
