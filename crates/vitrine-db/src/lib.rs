//! # vitrine-db: Database Layer for Vitrine
//!
//! This crate provides database access for the Vitrine catalog.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vitrine Data Flow                                │
//! │                                                                         │
//! │  search request                         sync cycle                      │
//! │       │  (read only)                         │  (writes, under lock)    │
//! │       ▼                                      ▼                          │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    vitrine-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │ 001_catalog  │  │   │
//! │  │   │ SqlitePool    │◄───│ GroupRepo     │    │ 002_fts      │  │   │
//! │  │   │               │    │ SyncRunRepo   │    │ 003_runs     │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐                                            │   │
//! │  │   │   SyncLock    │  one writer across all processes           │   │
//! │  │   │   (lock.rs)   │                                            │   │
//! │  │   └───────────────┘                                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   SQLite database file  +  <database>.sync-lock sidecar         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`lock`] - Non-blocking cross-process sync lock
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, group, sync run)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vitrine_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./vitrine.db")).await?;
//!
//! let products = db.products().all().await?;
//! let relevance = db.products().relevance(&["toalha", "toalhas"]).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod lock;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use lock::SyncLock;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::group::GroupRepository;
pub use repository::product::ProductRepository;
pub use repository::sync_run::{SyncRunRepository, SyncRunStats};
