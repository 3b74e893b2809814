use std::path::Path;
use std::sync::PoisonError;

use fintrack_core::db::PendingJobRepository;

use crate::commands::common::open_registry;
use crate::error::CliError;

/// Sign out: stop tracking every pending job so no cross-session
/// polling leaks into the next user.
pub fn run_logout(db_path: &Path) -> Result<(), CliError> {
    let registry = open_registry(db_path)?;
    let repo = registry.lock().unwrap_or_else(PoisonError::into_inner);

    let pending = repo.list()?.len();
    repo.clear()?;

    if pending == 0 {
        println!("Signed out. No pending sync jobs were tracked.");
    } else {
        println!("Signed out. Stopped tracking {pending} pending sync job(s).");
    }
    Ok(())
}
