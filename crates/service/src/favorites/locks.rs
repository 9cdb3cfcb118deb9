use std::sync::Arc;

use dashmap::DashMap;
use models::ids::OwnerId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Table of per-owner mutexes.
///
/// Holding an [`OwnerGuard`] gives exclusive access to one owner's record.
/// Entries are dropped again once no guard or waiter references them, so the
/// table only grows with the number of owners being mutated concurrently.
/// Waiters that give up (a cancelled `lock()` future) clean up after
/// themselves like released guards do.
#[derive(Default)]
pub struct OwnerLocks {
    locks: DashMap<OwnerId, Arc<Mutex<()>>>,
}

impl OwnerLocks {
    /// Wait for exclusive access to `owner`. Dropping the returned future
    /// before it completes leaves no entry behind.
    pub async fn lock(&self, owner: &OwnerId) -> OwnerGuard<'_> {
        let mut guard = OwnerGuard { table: self, owner: owner.clone(), held: None };
        // shard lock must be released before awaiting the owner mutex
        let mutex = self.locks.entry(owner.clone()).or_default().value().clone();
        // if cancelled here, the pending acquire (and its Arc) drops before `guard` prunes
        guard.held = Some(mutex.lock_owned().await);
        guard
    }

    /// Number of owners with a live lock entry.
    pub fn len(&self) -> usize { self.locks.len() }

    pub fn is_empty(&self) -> bool { self.locks.is_empty() }
}

pub struct OwnerGuard<'a> {
    table: &'a OwnerLocks,
    owner: OwnerId,
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        drop(self.held.take());
        // only the table's own reference left: nobody holds or awaits this owner
        self.table.locks.remove_if(&self.owner, |_, m| Arc::strong_count(m) == 1);
    }
}
