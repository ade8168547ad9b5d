//! # Domain Types
//!
//! Core domain entities for the Vitrine catalog.
//!
//! ## Entity Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Catalog Data Model                               │
//! │                                                                         │
//! │  ┌──────────────┐   0..1     ┌──────────────┐                          │
//! │  │ ProductGroup │◄───────────│   Product    │                          │
//! │  │              │            │              │                          │
//! │  │ code (PK)    │            │ code (PK)    │   mirrors one upstream   │
//! │  │ description  │            │ name         │   inventory record       │
//! │  └──────────────┘            │ prices       │                          │
//! │                              │ group_code   │                          │
//! │                              │ group_desc   │   denormalized copy      │
//! │                              │ barcode      │                          │
//! │                              └──────────────┘                          │
//! │                                                                         │
//! │  ┌──────────────┐                                                      │
//! │  │   SyncRun    │   one row per reconciliation cycle                   │
//! │  └──────────────┘                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Money Handling
//! Prices are stored as **integer cents** (`i64`); see [`crate::money`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the local catalog, identified by its upstream code.
///
/// The local store contains exactly the upstream snapshot after a successful
/// sync; `code` is the only identity and there are no local-only fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Upstream product code (primary key).
    pub code: String,

    /// Display name shown to customers.
    pub name: String,

    /// Regular price in cents.
    pub price_regular_cents: i64,

    /// Cash price in cents.
    pub price_cash_cents: i64,

    /// Code of the owning group, if any.
    pub group_code: Option<String>,

    /// Denormalized group description, empty when ungrouped or unknown.
    pub group_description: String,

    /// EAN/GTIN barcode when upstream provides one.
    pub barcode: Option<String>,
}

impl Product {
    /// Creates an ungrouped product with zero prices.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Product {
            code: code.into(),
            name: name.into(),
            price_regular_cents: 0,
            price_cash_cents: 0,
            group_code: None,
            group_description: String::new(),
            barcode: None,
        }
    }

    /// Sets both prices.
    pub fn with_prices(mut self, regular: Money, cash: Money) -> Self {
        self.price_regular_cents = regular.cents();
        self.price_cash_cents = cash.cents();
        self
    }

    /// Sets the group reference and its description.
    pub fn with_group(mut self, code: impl Into<String>, description: impl Into<String>) -> Self {
        self.group_code = Some(code.into());
        self.group_description = description.into();
        self
    }

    /// Sets the barcode.
    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    #[inline]
    pub fn price_regular(&self) -> Money {
        Money::from_cents(self.price_regular_cents)
    }

    #[inline]
    pub fn price_cash(&self) -> Money {
        Money::from_cents(self.price_cash_cents)
    }
}

// =============================================================================
// Product Group
// =============================================================================

/// A product category as published by upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductGroup {
    pub code: String,
    pub description: String,
}

impl ProductGroup {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        ProductGroup {
            code: code.into(),
            description: description.into(),
        }
    }
}

// =============================================================================
// Search DTOs
// =============================================================================

/// Arguments of a catalog search call.
///
/// `page` is 1-based; absent or non-positive values are treated as 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,

    #[serde(default)]
    pub page: Option<i64>,
}

/// One product in a search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    pub code: String,
    pub name: String,
    /// Regular price, 2 decimal places.
    pub price: f64,
    /// Cash price, 2 decimal places.
    pub price_cash: f64,
}

impl From<&Product> for SearchItem {
    fn from(product: &Product) -> Self {
        SearchItem {
            code: product.code.clone(),
            name: product.name.clone(),
            price: product.price_regular().to_decimal(),
            price_cash: product.price_cash().to_decimal(),
        }
    }
}

/// A page of search results.
///
/// ## Degraded Responses
/// When the search cannot be served the response is an empty first page
/// with `error` carrying a customer-facing message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub items: Vec<SearchItem>,
    pub page: u32,
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    /// An empty, non-error page.
    pub fn empty(page: u32) -> Self {
        SearchResponse {
            items: Vec::new(),
            page,
            has_more: false,
            error: None,
        }
    }

    /// The degraded contract: empty first page carrying an error message.
    pub fn degraded(message: impl Into<String>) -> Self {
        SearchResponse {
            error: Some(message.into()),
            ..SearchResponse::empty(1)
        }
    }
}

// =============================================================================
// Sync Run
// =============================================================================

/// The outcome state of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SyncRunStatus {
    /// Cycle started and has not finished yet (or the process died).
    Running,
    /// All three passes finished.
    Completed,
    /// Cycle aborted; earlier passes may have committed.
    Failed,
}

/// History record of one reconciliation cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SyncRun {
    pub id: String,
    pub status: SyncRunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub groups_upserted: i64,
    pub products_deleted: i64,
    pub products_upserted: i64,
    pub records_skipped: i64,
    pub pages_fetched: i64,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_item_from_product() {
        let product = Product::new("10", "Toalha de Banho")
            .with_prices(Money::from_cents(4990), Money::from_cents(4490));

        let item = SearchItem::from(&product);
        assert_eq!(item.price, 49.9);
        assert_eq!(item.price_cash, 44.9);
    }

    #[test]
    fn test_search_response_serializes_camel_case() {
        let response = SearchResponse {
            items: vec![SearchItem {
                code: "10".to_string(),
                name: "Toalha".to_string(),
                price: 10.5,
                price_cash: 9.0,
            }],
            page: 1,
            has_more: true,
            error: None,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["hasMore"], true);
        assert_eq!(json["items"][0]["priceCash"], 9.0);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_degraded_response() {
        let response = SearchResponse::degraded("indisponível");
        assert!(response.items.is_empty());
        assert!(!response.has_more);
        assert_eq!(response.page, 1);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"], "indisponível");
    }

    #[test]
    fn test_search_request_defaults() {
        let request: SearchRequest = serde_json::from_str(r#"{"query":"toalha"}"#).unwrap();
        assert_eq!(request.page, None);
    }
}
