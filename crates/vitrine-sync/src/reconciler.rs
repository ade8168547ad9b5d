//! # Reconciler
//!
//! Brings the local catalog in line with the upstream in three passes.
//!
//! ## Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Reconcile Cycle                                │
//! │                                                                         │
//! │  credentials? ──no──► MissingCredentials (no network, no lock)         │
//! │       │                                                                 │
//! │  try_acquire ──false──► Skipped                                        │
//! │       │                                                                 │
//! │  ┌────▼─────────────────────────────────────────────────────────────┐  │
//! │  │ 1. GROUPS     every grupos page ─► upsert (tx per page)          │  │
//! │  │               build code → description map                       │  │
//! │  │                                                                  │  │
//! │  │ 2. CODES      every produtos page with fields=CODPRD             │  │
//! │  │               accumulate remote code set                         │  │
//! │  │                                                                  │  │
//! │  │ 3. RECONCILE  delete (local − remote) in one tx                  │  │
//! │  │               every produtos page ─► upsert (tx per page)        │  │
//! │  └────┬─────────────────────────────────────────────────────────────┘  │
//! │       │                                                                 │
//! │  release (always) ──► Completed(SyncReport) or the error               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failure in a later pass does not undo what earlier passes committed.
//! Searches running during a cycle may see a partly reconciled catalog.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use vitrine_db::{Database, SyncRunStats};

use crate::config::{ScheduleSettings, SyncConfig, UpstreamSettings};
use crate::coordinator::SyncLockCoordinator;
use crate::error::SyncResult;
use crate::payload::{group_from_value, record_code, ProductRecord, RawPage};
use crate::upstream::{Resource, UpstreamClient};

// =============================================================================
// Report
// =============================================================================

/// Counters for one completed cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub groups_upserted: u64,
    /// Distinct codes the upstream listed.
    pub remote_codes: u64,
    pub products_deleted: u64,
    pub products_upserted: u64,
    /// Records dropped as malformed.
    pub records_skipped: u64,
    pub pages_fetched: u64,
    pub elapsed: Duration,
}

impl SyncReport {
    pub fn stats(&self) -> SyncRunStats {
        SyncRunStats {
            groups_upserted: self.groups_upserted,
            products_deleted: self.products_deleted,
            products_upserted: self.products_upserted,
            records_skipped: self.records_skipped,
            pages_fetched: self.pages_fetched,
        }
    }
}

/// What a call to [`Reconciler::run_cycle`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The catalog was reconciled.
    Completed(SyncReport),

    /// Another holder had the lock; nothing was done.
    Skipped,
}

// =============================================================================
// Page Cursor
// =============================================================================

/// Decides which page to fetch next.
///
/// Stops after `ceil(total / page_size)` pages when the upstream reports a
/// total, otherwise at the first empty page, and never past `max_pages`.
#[derive(Debug)]
struct PageCursor {
    next: u32,
    last: Option<u32>,
    max_pages: u32,
    done: bool,
}

impl PageCursor {
    fn new(max_pages: u32) -> Self {
        PageCursor {
            next: 1,
            last: None,
            max_pages,
            done: false,
        }
    }

    fn next_page(&self) -> Option<u32> {
        (!self.done).then_some(self.next)
    }

    fn advance(&mut self, resource: Resource, page: &RawPage, page_size: u32) {
        let current = self.next;

        if let Some(total) = page.total {
            let pages = total.div_ceil(u64::from(page_size));
            self.last = Some(u32::try_from(pages).unwrap_or(u32::MAX));
        }

        let reached_last = self.last.is_some_and(|last| current >= last);
        if page.is_empty() || reached_last {
            self.done = true;
        } else if current >= self.max_pages {
            warn!(
                resource = %resource,
                max_pages = self.max_pages,
                "Page cap reached, upstream may be ignoring the page parameter"
            );
            self.done = true;
        } else {
            self.next = current + 1;
        }
    }
}

// =============================================================================
// Reconciler
// =============================================================================

/// Runs sync cycles against one database.
#[derive(Debug)]
pub struct Reconciler {
    db: Database,
    client: UpstreamClient,
    lock: SyncLockCoordinator,
    page_size: u32,
    max_pages: u32,
    code_field: String,
    history_retention_days: u32,
}

impl Reconciler {
    pub fn new(
        db: Database,
        client: UpstreamClient,
        lock: SyncLockCoordinator,
        settings: &UpstreamSettings,
    ) -> Self {
        Reconciler {
            db,
            client,
            lock,
            page_size: settings.page_size.max(1),
            max_pages: settings.max_pages.max(1),
            code_field: settings.product_code_field.clone(),
            history_retention_days: ScheduleSettings::default().history_retention_days,
        }
    }

    /// Days of sync run history to keep (minimum 1).
    pub fn with_history_retention_days(mut self, days: u32) -> Self {
        self.history_retention_days = days.max(1);
        self
    }

    /// Wires a client and the database's lock from `config`.
    pub fn from_config(db: Database, config: &SyncConfig) -> SyncResult<Self> {
        let client = UpstreamClient::new(config)?;
        let lock = SyncLockCoordinator::for_database(&db);
        Ok(Self::new(db, client, lock, &config.upstream)
            .with_history_retention_days(config.schedule.history_retention_days))
    }

    /// Runs one full cycle if the lock is free.
    pub async fn run_cycle(&self) -> SyncResult<CycleOutcome> {
        if let Err(err) = self.client.credentials() {
            error!(error = %err, "Sync aborted: upstream not configured");
            return Err(err);
        }

        if !self.lock.try_acquire().await? {
            info!("Another process is syncing, skipping this cycle");
            return Ok(CycleOutcome::Skipped);
        }

        let result = self.reconcile().await;

        if let Err(err) = self.lock.release().await {
            warn!(error = %err, "Failed to release sync lock");
        }

        result.map(CycleOutcome::Completed)
    }

    /// The three passes, recorded in the run history.
    async fn reconcile(&self) -> SyncResult<SyncReport> {
        let started = Instant::now();
        let runs = self.db.sync_runs();
        let run_id = runs.start().await?;
        let mut report = SyncReport::default();

        info!(run_id = %run_id, "Sync cycle started");

        let result = match self.passes(&mut report).await {
            Ok(()) => {
                report.elapsed = started.elapsed();
                runs.finish(&run_id, &report.stats()).await?;
                info!(
                    run_id = %run_id,
                    groups = report.groups_upserted,
                    remote_codes = report.remote_codes,
                    deleted = report.products_deleted,
                    upserted = report.products_upserted,
                    skipped = report.records_skipped,
                    pages = report.pages_fetched,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "Sync cycle completed"
                );
                Ok(report)
            }
            Err(err) => {
                error!(run_id = %run_id, error = %err, "Sync cycle failed");
                if let Err(db_err) = runs.fail(&run_id, &report.stats(), &err.to_string()).await {
                    warn!(run_id = %run_id, error = %db_err, "Failed to record sync failure");
                }
                Err(err)
            }
        };

        self.prune_history().await;
        result
    }

    /// Drops history older than the retention window. Failures only log.
    async fn prune_history(&self) {
        match self
            .db
            .sync_runs()
            .cleanup_old_runs(self.history_retention_days)
            .await
        {
            Ok(0) => {}
            Ok(removed) => debug!(
                removed,
                retention_days = self.history_retention_days,
                "Pruned sync run history"
            ),
            Err(err) => warn!(error = %err, "Failed to prune sync run history"),
        }
    }

    async fn passes(&self, report: &mut SyncReport) -> SyncResult<()> {
        let groups = self.sync_groups(report).await?;
        let remote = self.enumerate_codes(report).await?;
        self.delete_missing(&remote, report).await?;
        self.upsert_products(&groups, report).await
    }

    async fn fetch(
        &self,
        resource: Resource,
        page: u32,
        fields: Option<&str>,
        report: &mut SyncReport,
    ) -> SyncResult<RawPage> {
        let raw = self
            .client
            .fetch_page(resource, page, self.page_size, fields)
            .await?;
        report.pages_fetched += 1;
        Ok(raw)
    }

    // =========================================================================
    // Pass 1: Groups
    // =========================================================================

    async fn sync_groups(&self, report: &mut SyncReport) -> SyncResult<HashMap<String, String>> {
        let mut descriptions = HashMap::new();
        let mut cursor = PageCursor::new(self.max_pages);

        while let Some(page_no) = cursor.next_page() {
            let page = self.fetch(Resource::Groups, page_no, None, report).await?;
            cursor.advance(Resource::Groups, &page, self.page_size);

            let mut groups = Vec::with_capacity(page.records.len());
            for (index, value) in page.records.iter().enumerate() {
                match group_from_value(index, value) {
                    Ok(group) => groups.push(group),
                    Err(bad) => {
                        warn!(resource = "grupos", page = page_no, %bad, "Skipping malformed record");
                        report.records_skipped += 1;
                    }
                }
            }

            report.groups_upserted += self.db.groups().upsert_batch(&groups).await?;
            descriptions.extend(groups.into_iter().map(|g| (g.code, g.description)));
        }

        debug!(groups = descriptions.len(), "Group pass finished");
        Ok(descriptions)
    }

    // =========================================================================
    // Pass 2: Code Enumeration
    // =========================================================================

    async fn enumerate_codes(&self, report: &mut SyncReport) -> SyncResult<HashSet<String>> {
        let mut codes = HashSet::new();
        let mut cursor = PageCursor::new(self.max_pages);

        while let Some(page_no) = cursor.next_page() {
            let page = self
                .fetch(Resource::Products, page_no, Some(self.code_field.as_str()), report)
                .await?;
            cursor.advance(Resource::Products, &page, self.page_size);

            for (index, value) in page.records.iter().enumerate() {
                match record_code(index, value, &self.code_field) {
                    Ok(code) => {
                        codes.insert(code);
                    }
                    Err(bad) => debug!(page = page_no, %bad, "Record without code in enumeration"),
                }
            }
        }

        report.remote_codes = codes.len() as u64;
        debug!(codes = codes.len(), "Code enumeration finished");
        Ok(codes)
    }

    // =========================================================================
    // Pass 3: Delete, then Upsert
    // =========================================================================

    async fn delete_missing(&self, remote: &HashSet<String>, report: &mut SyncReport) -> SyncResult<()> {
        let local = self.db.products().codes().await?;

        let mut stale: Vec<&String> = local.difference(remote).collect();
        stale.sort();

        if !stale.is_empty() {
            info!(count = stale.len(), "Deleting products no longer upstream");
        }
        report.products_deleted = self.db.products().delete_codes(&stale).await?;
        Ok(())
    }

    async fn upsert_products(
        &self,
        groups: &HashMap<String, String>,
        report: &mut SyncReport,
    ) -> SyncResult<()> {
        let mut cursor = PageCursor::new(self.max_pages);

        while let Some(page_no) = cursor.next_page() {
            let page = self.fetch(Resource::Products, page_no, None, report).await?;
            cursor.advance(Resource::Products, &page, self.page_size);

            let mut products = Vec::with_capacity(page.records.len());
            for (index, value) in page.records.iter().enumerate() {
                match ProductRecord::from_value(index, value, &self.code_field) {
                    Ok(record) => products.push(record.into_product(groups)),
                    Err(bad) => {
                        warn!(resource = "produtos", page = page_no, %bad, "Skipping malformed record");
                        report.records_skipped += 1;
                    }
                }
            }

            report.products_upserted += self.db.products().upsert_batch(&products).await?;
        }

        Ok(())
    }
}
