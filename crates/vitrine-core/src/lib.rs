//! # vitrine-core: Pure Search Logic for Vitrine
//!
//! This crate is the **heart** of Vitrine's search. It contains the query
//! normalizer, the scoring strategies, the rank aggregator and the paginator
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vitrine Search Path                              │
//! │                                                                         │
//! │  POST /tool_call { query: "toalhas de banho", page: 1 }                │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vitrine-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ normalize │─►│  scoring  │─►│  ranking  │─►│pagination │  │   │
//! │  │   │  tokens   │  │ 7 strats  │  │ max wins  │  │ size + 1  │  │   │
//! │  │   │ variants  │  │           │  │ dedup     │  │ has_more  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │ candidate rows + FTS relevance         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  vitrine-db (Database Layer)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, ProductGroup, SyncRun, search DTOs)
//! - [`money`] - Money type with integer arithmetic
//! - [`normalize`] - Query folding, tokenizing and plural/singular variants
//! - [`similarity`] - Trigram similarity for typo tolerance
//! - [`scoring`] - The fixed set of match strategies
//! - [`ranking`] - Max-score aggregation and ordering
//! - [`pagination`] - Page windows without a count query
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use vitrine_core::normalize::NormalizedQuery;
//! use vitrine_core::pagination::PageRequest;
//! use vitrine_core::ranking::{Candidate, RankAggregator};
//! use vitrine_core::Product;
//!
//! let query = NormalizedQuery::parse("toalhas");
//! let catalog = vec![Candidate::new(Product::new("10", "Toalha de Banho"))];
//!
//! let ranked = RankAggregator::default().rank(&query, catalog);
//! let page = PageRequest::new(Some(1)).paginate(ranked);
//! assert_eq!(page.items.len(), 1);
//! assert!(!page.has_more);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod normalize;
pub mod pagination;
pub mod ranking;
pub mod scoring;
pub mod similarity;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use normalize::NormalizedQuery;
pub use pagination::{Page, PageRequest};
pub use ranking::{Candidate, RankAggregator, RankedProduct};
pub use scoring::{ScoringParams, Strategy};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of products returned per search page.
///
/// Search results are read by a conversational agent, so pages stay short.
pub const SEARCH_PAGE_SIZE: usize = 3;

/// Maximum accepted length (in characters) of a raw search query.
pub const MAX_QUERY_LENGTH: usize = 200;
