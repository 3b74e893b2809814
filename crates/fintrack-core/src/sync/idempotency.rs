//! Pending idempotency-key registry
//!
//! One pending key per bank account, held from the first submission
//! attempt until that attempt reaches a definitive outcome. Retried
//! submissions for the same attempt reuse the key so the backend can
//! deduplicate them. Process-local on purpose: a submission interrupted
//! before anything was persisted is safe to retry with a fresh key.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::models::{BankAccountId, IdempotencyKey};

/// Registry of pending idempotency keys, one per bank account.
///
/// Injected into the sync engine rather than living as a module
/// singleton so tests can instantiate isolated instances.
#[derive(Debug, Default)]
pub struct IdempotencyKeys {
    pending: Mutex<HashMap<BankAccountId, IdempotencyKey>>,
}

impl IdempotencyKeys {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the pending key for `account`, minting and remembering a
    /// fresh one if none exists.
    ///
    /// Every call between here and [`release`](Self::release) returns
    /// the identical key, so two concurrent submissions for one
    /// account cannot mint two different keys.
    pub fn acquire(&self, account: BankAccountId) -> IdempotencyKey {
        let mut pending = self.lock();
        pending
            .entry(account)
            .or_insert_with(IdempotencyKey::generate)
            .clone()
    }

    /// Drop the pending key for `account`.
    ///
    /// Called when the submission attempt reaches a definitive outcome
    /// (job created, or terminally rejected) - not on job completion,
    /// which is a separate later event.
    pub fn release(&self, account: BankAccountId) {
        self.lock().remove(&account);
    }

    /// The currently pending key for `account`, if any.
    pub fn pending(&self, account: BankAccountId) -> Option<IdempotencyKey> {
        self.lock().get(&account).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<BankAccountId, IdempotencyKey>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
