//! # vitrine-sync: Catalog Sync Engine for Vitrine
//!
//! Mirrors the upstream inventory API into the local SQLite catalog so
//! searches never wait on the network.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Engine Architecture                         │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  SyncScheduler (background task)                 │  │
//! │  │  Immediate first cycle, then every `interval_secs`               │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                          Reconciler                              │  │
//! │  │  groups ─► code enumeration ─► delete missing ─► upsert pages    │  │
//! │  └──────┬──────────────────────┬───────────────────────┬────────────┘  │
//! │         ▼                      ▼                       ▼               │
//! │  ┌────────────────┐  ┌────────────────────┐  ┌────────────────────┐    │
//! │  │ SyncLock       │  │ UpstreamClient     │  │ vitrine-db         │    │
//! │  │ Coordinator    │  │                    │  │                    │    │
//! │  │ one cycle      │  │ reqwest            │  │ groups, products,  │    │
//! │  │ fleet-wide     │  │ RetryPolicy        │  │ sync_runs          │    │
//! │  │                │  │ payload shapes     │  │                    │    │
//! │  └────────────────┘  └────────────────────┘  └────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - TOML + environment configuration
//! - [`coordinator`] - Non-blocking cross-process sync lock
//! - [`error`] - Sync error types
//! - [`payload`] - Upstream page shapes and record parsing
//! - [`reconciler`] - The three-pass reconcile cycle
//! - [`retry`] - Reusable retry policy
//! - [`scheduler`] - Periodic background cycles
//! - [`upstream`] - HTTP client for the inventory API
//!
//! ## Usage
//! ```rust,ignore
//! let config = SyncConfig::load(None)?;
//! let reconciler = Arc::new(Reconciler::from_config(db.clone(), &config)?);
//! let scheduler = SyncScheduler::new(reconciler, &config.schedule).spawn();
//! // ...
//! scheduler.shutdown().await;
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod payload;
pub mod reconciler;
pub mod retry;
pub mod scheduler;
pub mod upstream;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{RetryStrategy, SyncConfig};
pub use coordinator::SyncLockCoordinator;
pub use error::{SyncError, SyncResult};
pub use payload::{MalformedRecord, RawPage};
pub use reconciler::{CycleOutcome, Reconciler, SyncReport};
pub use retry::RetryPolicy;
pub use scheduler::{SchedulerHandle, SyncScheduler};
pub use upstream::{Resource, UpstreamClient};
