//! # Sync Lock
//!
//! A non-blocking, cross-process mutex guarding the reconciliation cycle.
//!
//! ## How It Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  process A                         process B                            │
//! │  ─────────                         ─────────                            │
//! │  open vitrine.db.sync-lock         open vitrine.db.sync-lock            │
//! │  BEGIN IMMEDIATE   → ok            BEGIN IMMEDIATE   → SQLITE_BUSY      │
//! │  (holds RESERVED file lock)        try_acquire() = false, skip cycle    │
//! │       │                                                                 │
//! │   ... sync ...                                                          │
//! │       │                                                                 │
//! │  ROLLBACK + close  → released                                           │
//! │                                                                         │
//! │  crash / kill -9   → the OS drops the file lock with the process        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The lock lives on a dedicated connection to a sidecar file, never on the
//! catalog pool, so holding it never starves search queries. The busy
//! timeout is zero: contention is reported immediately instead of waited on.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{ConnectOptions, Connection, SqliteConnection};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

/// SQLite result codes meaning "someone else holds the lock".
const BUSY_CODES: &[&str] = &["5", "261", "517", "6", "262"];

/// Handle on the catalog's sync lock.
///
/// ## Usage
/// ```rust,ignore
/// let lock = db.sync_lock();
/// if !lock.try_acquire().await? {
///     return Ok(()); // someone else is syncing
/// }
/// let outcome = run_cycle().await;
/// lock.release().await?;
/// ```
#[derive(Debug)]
pub struct SyncLock {
    path: PathBuf,
    held: Mutex<Option<SqliteConnection>>,
}

impl SyncLock {
    pub fn new(path: impl AsRef<Path>) -> Self {
        SyncLock {
            path: path.as_ref().to_path_buf(),
            held: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Attempts to take the lock without waiting.
    ///
    /// ## Returns
    /// * `Ok(true)` - This handle now holds the lock
    /// * `Ok(false)` - Another holder (in any process, or this very handle)
    ///   has it
    /// * `Err(_)` - The lock file could not be opened at all
    pub async fn try_acquire(&self) -> DbResult<bool> {
        let mut held = self.held.lock().await;
        if held.is_some() {
            debug!(path = %self.path.display(), "Sync lock already held by this handle");
            return Ok(false);
        }

        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete)
            .busy_timeout(Duration::ZERO);

        let mut conn = match options.connect().await {
            Ok(conn) => conn,
            Err(err) if is_busy(&err) => return Ok(false),
            Err(err) => return Err(DbError::LockFailed(err.to_string())),
        };

        let claimed = claim(&mut conn).await;
        match claimed {
            Ok(()) => {
                debug!(path = %self.path.display(), "Sync lock acquired");
                *held = Some(conn);
                Ok(true)
            }
            Err(err) => {
                let _ = conn.close().await;
                if is_busy(&err) {
                    debug!(path = %self.path.display(), "Sync lock is held elsewhere");
                    Ok(false)
                } else {
                    Err(DbError::LockFailed(err.to_string()))
                }
            }
        }
    }

    /// Releases the lock if this handle holds it. Otherwise a no-op.
    pub async fn release(&self) -> DbResult<()> {
        let Some(mut conn) = self.held.lock().await.take() else {
            return Ok(());
        };

        if let Err(err) = sqlx::query("ROLLBACK").execute(&mut conn).await {
            // closing the connection releases the file lock regardless
            warn!(error = %err, "Rollback of sync lock transaction failed");
        }

        conn.close()
            .await
            .map_err(|e| DbError::LockFailed(e.to_string()))?;

        debug!(path = %self.path.display(), "Sync lock released");
        Ok(())
    }

    /// Whether this handle currently holds the lock.
    pub async fn is_held(&self) -> bool {
        self.held.lock().await.is_some()
    }
}

/// Starts a write transaction, taking the RESERVED lock on the file.
async fn claim(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
    Ok(())
}

fn is_busy(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err
                .code()
                .is_some_and(|code| BUSY_CODES.contains(&&*code))
                || db_err.message().contains("locked")
        }
        _ => false,
    }
}
