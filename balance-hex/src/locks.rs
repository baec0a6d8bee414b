//! Per-account mutual exclusion.
//!
//! Mutations of one deposit run one at a time inside this process; distinct
//! deposits proceed in parallel.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use balance_types::OwnerId;

type LockTable = DashMap<OwnerId, Arc<Mutex<()>>>;

/// Lazily populated table of per-owner locks.
#[derive(Default)]
pub struct AccountLocks {
    table: Arc<LockTable>,
}

/// Held lock on one owner. The table entry is removed on drop once nobody
/// else holds or waits for it.
pub struct AccountGuard {
    owner_id: OwnerId,
    table: Arc<LockTable>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, owner_id: OwnerId) -> AccountGuard {
        let mutex = self.table.entry(owner_id).or_default().clone();
        let mut held = AccountGuard {
            owner_id,
            table: self.table.clone(),
            guard: None,
        };
        held.guard = Some(mutex.lock_owned().await);
        held
    }

    /// Locks two owners in ascending id order, so that two opposite
    /// transfers cannot deadlock.
    pub async fn lock_pair(&self, a: OwnerId, b: OwnerId) -> (AccountGuard, AccountGuard) {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let first = self.lock(first).await;
        let second = self.lock(second).await;
        (first, second)
    }

    /// Number of owners currently locked or waited on.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Drop for AccountGuard {
    fn drop(&mut self) {
        self.guard.take();
        self.table
            .remove_if(&self.owner_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
