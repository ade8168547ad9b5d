//! # Sync Scheduler
//!
//! Background task that runs a reconcile cycle at startup and then on a
//! fixed interval.
//!
//! ## Task Lifecycle
//! ```text
//! spawn() ──► tick (immediate) ──► run_cycle ──► wait interval ──► tick ...
//!                                                       │
//!                        SchedulerHandle::shutdown() ───┘ (between cycles)
//! ```
//!
//! A cycle in progress always runs to the end; shutdown is only noticed
//! while waiting for the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::ScheduleSettings;
use crate::reconciler::{CycleOutcome, Reconciler};

/// Runs the reconciler periodically.
pub struct SyncScheduler {
    reconciler: Arc<Reconciler>,
    interval: Duration,
    run_on_start: bool,
}

impl SyncScheduler {
    pub fn new(reconciler: Arc<Reconciler>, settings: &ScheduleSettings) -> Self {
        SyncScheduler {
            reconciler,
            interval: settings.interval(),
            run_on_start: settings.run_on_start,
        }
    }

    /// Starts the background task.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(self.run(shutdown_rx));
        SchedulerHandle { shutdown_tx, task }
    }

    async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) {
        info!(
            interval_secs = self.interval.as_secs(),
            run_on_start = self.run_on_start,
            "Sync scheduler started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        if !self.run_on_start {
            // the first tick completes immediately
            ticker.tick().await;
        }

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    run_once(&self.reconciler).await;
                }
                _ = shutdown_rx.recv() => {
                    info!("Sync scheduler received shutdown");
                    break;
                }
            }
        }
    }
}

/// Runs one cycle and logs how it went. Errors never escape: the next tick
/// simply tries again.
pub async fn run_once(reconciler: &Reconciler) -> Option<CycleOutcome> {
    match reconciler.run_cycle().await {
        Ok(CycleOutcome::Skipped) => {
            info!("Sync cycle skipped");
            Some(CycleOutcome::Skipped)
        }
        Ok(outcome) => Some(outcome),
        Err(err) if err.is_config_error() => {
            error!(error = %err, "Sync cycle not run");
            None
        }
        Err(err) => {
            warn!(error = %err, retryable = err.is_retryable(), "Sync cycle failed");
            None
        }
    }
}

/// Handle to a running scheduler.
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stops the scheduler after any cycle in progress and waits for it.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(err) = self.task.await {
            error!(error = %err, "Sync scheduler task panicked");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use vitrine_db::{Database, DbConfig};

    async fn unconfigured_reconciler() -> Arc<Reconciler> {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Arc::new(Reconciler::from_config(db, &SyncConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn test_shutdown_stops_the_task() {
        let settings = ScheduleSettings {
            interval_secs: 3600,
            run_on_start: true,
            ..Default::default()
        };
        let handle = SyncScheduler::new(unconfigured_reconciler().await, &settings).spawn();

        assert!(!handle.is_finished());
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_unconfigured_cycle_yields_nothing() {
        let reconciler = unconfigured_reconciler().await;
        assert_eq!(run_once(&reconciler).await, None);
    }
}
