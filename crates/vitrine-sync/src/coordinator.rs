//! # Sync Lock Coordinator
//!
//! Makes sure at most one process reconciles the catalog at a time.
//!
//! ```text
//!  process A                    process B
//!  ─────────                    ─────────
//!  try_acquire() → true
//!  reconcile...                 try_acquire() → false
//!                               skip this cycle
//!  release()
//! ```
//!
//! Acquisition never waits. The lock lives on its own SQLite connection, so
//! it goes away with the process if the process dies mid-cycle.

use tracing::{debug, info};

use vitrine_db::{Database, SyncLock};

use crate::error::SyncResult;

/// Non-blocking, fleet-wide exclusion for sync cycles.
#[derive(Debug)]
pub struct SyncLockCoordinator {
    lock: SyncLock,
}

impl SyncLockCoordinator {
    pub fn new(lock: SyncLock) -> Self {
        SyncLockCoordinator { lock }
    }

    /// Uses the lock file configured for `db`.
    pub fn for_database(db: &Database) -> Self {
        Self::new(db.sync_lock())
    }

    /// Takes the lock if nobody holds it.
    ///
    /// ## Returns
    /// - `true`: this coordinator now holds the lock
    /// - `false`: another holder exists (including this one), try next cycle
    pub async fn try_acquire(&self) -> SyncResult<bool> {
        let acquired = self.lock.try_acquire().await?;
        if acquired {
            debug!(path = ?self.lock.path(), "Sync lock acquired");
        } else {
            info!(path = ?self.lock.path(), "Sync lock held elsewhere");
        }
        Ok(acquired)
    }

    /// Gives the lock back. Does nothing if it isn't held.
    pub async fn release(&self) -> SyncResult<()> {
        self.lock.release().await?;
        debug!(path = ?self.lock.path(), "Sync lock released");
        Ok(())
    }

    pub async fn is_held(&self) -> bool {
        self.lock.is_held().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_second_coordinator_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.sync-lock");

        let first = SyncLockCoordinator::new(SyncLock::new(&path));
        let second = SyncLockCoordinator::new(SyncLock::new(&path));

        assert!(first.try_acquire().await.unwrap());
        assert!(!second.try_acquire().await.unwrap());

        first.release().await.unwrap();
        assert!(!first.is_held().await);
        assert!(second.try_acquire().await.unwrap());
        second.release().await.unwrap();
    }
}
