use std::path::Path;
use std::sync::PoisonError;

use fintrack_core::db::PendingJobRepository;
use serde::Serialize;

use crate::commands::common::open_registry;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct PendingJobItem {
    bank_account_id: i64,
    job_id: String,
}

pub fn run_jobs(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let registry = open_registry(db_path)?;
    let entries = {
        let repo = registry.lock().unwrap_or_else(PoisonError::into_inner);
        repo.list()?
    };

    if as_json {
        let items: Vec<PendingJobItem> = entries
            .iter()
            .map(|(account, job_id)| PendingJobItem {
                bank_account_id: account.as_i64(),
                job_id: job_id.as_str().to_string(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No pending sync jobs.");
        return Ok(());
    }

    for (account, job_id) in entries {
        println!("account {account} -> job {job_id}");
    }
    Ok(())
}
