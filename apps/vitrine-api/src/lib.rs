//! # Vitrine API
//!
//! HTTP service answering catalog searches for a sales agent, backed by the
//! local SQLite mirror that `vitrine-sync` keeps up to date.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Vitrine API Server                            │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  GET /health   │  │  GET /tools    │  │  POST /tool_call           ││
//! │  │                │  │                │  │                            ││
//! │  │ • status       │  │ • tool catalog │  │ • X-API-KEY guard          ││
//! │  │ • lastSync     │  │                │  │ • search_products          ││
//! │  └───────┬────────┘  └────────────────┘  └─────────────┬──────────────┘│
//! │          │                                             ▼               │
//! │          │                               ┌────────────────────────────┐│
//! │          │                               │  CatalogSearch             ││
//! │          │                               │  normalize, rank, paginate ││
//! │          ▼                               └─────────────┬──────────────┘│
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                       vitrine-db (SQLite)                        │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_PORT` - listen port (default: 8000)
//! - `HTTP_BIND_ADDR` - listen address (default: 0.0.0.0)
//! - `DATABASE_PATH` - SQLite file (default: ./vitrine.db)
//! - `SERVER_API_KEY` - key required on `/tool_call`
//! - `SYNC_ENABLED` - run the background sync (default: true)
//! - `LOG_FORMAT` - `pretty` or `json`
//!
//! Upstream settings are read by [`vitrine_sync::SyncConfig`].

pub mod config;
pub mod error;
pub mod routes;
pub mod search;

// Re-exports
pub use config::{ApiConfig, LogFormat};
pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use search::CatalogSearch;

use vitrine_db::Database;

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    pub search: CatalogSearch,
    pub db: Database,
    pub api_key: Option<String>,
}
