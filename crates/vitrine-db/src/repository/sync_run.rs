//! # Sync Run Repository
//!
//! History of reconciliation cycles.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  lock acquired ──► start()  status = running                           │
//! │                       │                                                 │
//! │            ┌──────────┴───────────┐                                    │
//! │            ▼                      ▼                                     │
//! │      finish(stats)           fail(stats, error)                        │
//! │   status = completed        status = failed                            │
//! │                                                                         │
//! │  A row left in `running` means the process died mid-cycle.            │
//! │  Skipped cycles (lock held elsewhere) leave no row.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use vitrine_core::{SyncRun, SyncRunStatus};

const SYNC_RUN_COLUMNS: &str = "id, status, started_at, finished_at, groups_upserted, \
                                products_deleted, products_upserted, records_skipped, \
                                pages_fetched, error";

/// Counters recorded with a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncRunStats {
    pub groups_upserted: u64,
    pub products_deleted: u64,
    pub products_upserted: u64,
    pub records_skipped: u64,
    pub pages_fetched: u64,
}

/// Repository for sync run history.
#[derive(Debug, Clone)]
pub struct SyncRunRepository {
    pool: SqlitePool,
}

impl SyncRunRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SyncRunRepository { pool }
    }

    /// Records the start of a cycle.
    ///
    /// ## Returns
    /// The new run's ID.
    pub async fn start(&self) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO sync_runs (id, status, started_at) VALUES (?1, ?2, ?3)")
            .bind(&id)
            .bind(SyncRunStatus::Running)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        debug!(run_id = %id, "Sync run started");
        Ok(id)
    }

    /// Marks a run completed.
    pub async fn finish(&self, id: &str, stats: &SyncRunStats) -> DbResult<()> {
        self.close(id, SyncRunStatus::Completed, stats, None).await
    }

    /// Marks a run failed, keeping the counters reached so far.
    pub async fn fail(&self, id: &str, stats: &SyncRunStats, error: &str) -> DbResult<()> {
        self.close(id, SyncRunStatus::Failed, stats, Some(error)).await
    }

    async fn close(
        &self,
        id: &str,
        status: SyncRunStatus,
        stats: &SyncRunStats,
        error: Option<&str>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE sync_runs SET
                status = ?2,
                finished_at = ?3,
                groups_upserted = ?4,
                products_deleted = ?5,
                products_upserted = ?6,
                records_skipped = ?7,
                pages_fetched = ?8,
                error = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .bind(stats.groups_upserted as i64)
        .bind(stats.products_deleted as i64)
        .bind(stats.products_upserted as i64)
        .bind(stats.records_skipped as i64)
        .bind(stats.pages_fetched as i64)
        .bind(error)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("SyncRun", id));
        }

        debug!(run_id = %id, status = ?status, "Sync run closed");
        Ok(())
    }

    /// Gets a run by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<SyncRun>> {
        let sql = format!("SELECT {SYNC_RUN_COLUMNS} FROM sync_runs WHERE id = ?1");
        let run = sqlx::query_as::<_, SyncRun>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(run)
    }

    /// The most recent completed run, if any.
    pub async fn last_completed(&self) -> DbResult<Option<SyncRun>> {
        let sql = format!(
            "SELECT {SYNC_RUN_COLUMNS} FROM sync_runs \
             WHERE status = 'completed' ORDER BY started_at DESC LIMIT 1"
        );
        let run = sqlx::query_as::<_, SyncRun>(&sql)
            .fetch_optional(&self.pool)
            .await?;
        Ok(run)
    }

    /// Most recent runs first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<SyncRun>> {
        let sql = format!("SELECT {SYNC_RUN_COLUMNS} FROM sync_runs ORDER BY started_at DESC LIMIT ?1");
        let runs = sqlx::query_as::<_, SyncRun>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(runs)
    }

    /// Deletes runs started more than `days_old` days ago.
    ///
    /// ## Returns
    /// Number of rows removed.
    pub async fn cleanup_old_runs(&self, days_old: u32) -> DbResult<u64> {
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(days_old));

        let result = sqlx::query("DELETE FROM sync_runs WHERE started_at < ?1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
