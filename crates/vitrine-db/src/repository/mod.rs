//! # Repository Module
//!
//! Database repository implementations for Vitrine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Search service / Reconciler                                           │
//! │       │                                                                 │
//! │       │  db.products().relevance(&terms)                               │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── all / get / codes                                                 │
//! │  ├── relevance(terms)                                                  │
//! │  ├── upsert_batch(products)                                            │
//! │  └── delete_codes(codes)                                               │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog reads, relevance, batched writes
//! - [`GroupRepository`](group::GroupRepository) - Product groups
//! - [`SyncRunRepository`](sync_run::SyncRunRepository) - Sync cycle history

pub mod group;
pub mod product;
pub mod sync_run;
