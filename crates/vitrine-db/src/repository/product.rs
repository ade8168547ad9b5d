//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Full catalog reads for in-process ranking
//! - FTS5 relevance lookup
//! - Batched upsert and delete for the reconciler
//!
//! ## FTS5 Relevance
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Relevance Is Computed                            │
//! │                                                                         │
//! │  terms: [toalhas, toalha, banho, banhos]                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  MATCH '"toalhas" OR "toalha" OR "banho" OR "banhos"'                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │ products_fts (external content)         │                           │
//! │  │  name  (weight 1.0)                     │                           │
//! │  │  group_description (weight 0.25)        │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  relevance = -bm25(...)   (bm25 is negative; larger = better)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, HashSet};

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use vitrine_core::Product;

const PRODUCT_COLUMNS: &str = "code, name, price_regular_cents, price_cash_cents, \
                               group_code, group_description, barcode";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let catalog = repo.all().await?;
/// let scores = repo.relevance(&["toalha"]).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Returns every product, ordered by code.
    pub async fn all(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY code");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by its code.
    pub async fn get(&self, code: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE code = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Returns the set of all local product codes.
    pub async fn codes(&self) -> DbResult<HashSet<String>> {
        let codes: Vec<String> = sqlx::query_scalar("SELECT code FROM products")
            .fetch_all(&self.pool)
            .await?;

        Ok(codes.into_iter().collect())
    }

    /// Full-text relevance for every product matching any of `terms`.
    ///
    /// Terms are OR-ed. Products that don't match are absent from the map.
    pub async fn relevance(&self, terms: &[&str]) -> DbResult<HashMap<String, f64>> {
        let Some(expression) = match_expression(terms) else {
            return Ok(HashMap::new());
        };

        debug!(expression = %expression, "Querying full-text relevance");

        let rows: Vec<(String, f64)> = sqlx::query_as(
            r#"
            SELECT p.code, -bm25(products_fts, 1.0, 0.25) AS relevance
            FROM products_fts
            INNER JOIN products p ON p.rowid = products_fts.rowid
            WHERE products_fts MATCH ?1
            "#,
        )
        .bind(&expression)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Full-text index matched products");
        Ok(rows.into_iter().collect())
    }

    /// Inserts or overwrites products by code, in one transaction.
    ///
    /// ## Returns
    /// Number of rows written.
    pub async fn upsert_batch(&self, products: &[Product]) -> DbResult<u64> {
        if products.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for product in products {
            let result = sqlx::query(
                r#"
                INSERT INTO products (
                    code, name, price_regular_cents, price_cash_cents,
                    group_code, group_description, barcode
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(code) DO UPDATE SET
                    name = excluded.name,
                    price_regular_cents = excluded.price_regular_cents,
                    price_cash_cents = excluded.price_cash_cents,
                    group_code = excluded.group_code,
                    group_description = excluded.group_description,
                    barcode = excluded.barcode
                "#,
            )
            .bind(&product.code)
            .bind(&product.name)
            .bind(product.price_regular_cents)
            .bind(product.price_cash_cents)
            .bind(&product.group_code)
            .bind(&product.group_description)
            .bind(&product.barcode)
            .execute(&mut *tx)
            .await?;

            written += result.rows_affected();
        }

        tx.commit().await?;

        debug!(count = written, "Upserted product batch");
        Ok(written)
    }

    /// Deletes the given codes in one transaction.
    ///
    /// ## Returns
    /// Number of rows removed. Unknown codes are ignored.
    pub async fn delete_codes<S: AsRef<str>>(&self, codes: &[S]) -> DbResult<u64> {
        if codes.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut deleted = 0;

        for code in codes {
            let result = sqlx::query("DELETE FROM products WHERE code = ?1")
                .bind(code.as_ref())
                .execute(&mut *tx)
                .await?;
            deleted += result.rows_affected();
        }

        tx.commit().await?;

        debug!(count = deleted, "Deleted products");
        Ok(deleted)
    }

    /// Number of products in the catalog, reported by `/health`.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Builds an FTS5 OR-expression of quoted terms.
///
/// Double quotes inside a term are escaped by doubling them.
fn match_expression(terms: &[&str]) -> Option<String> {
    let quoted: Vec<String> = terms
        .iter()
        .map(|term| term.trim())
        .filter(|term| !term.is_empty())
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect();

    if quoted.is_empty() {
        None
    } else {
        Some(quoted.join(" OR "))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use vitrine_core::Money;

    async fn repo() -> ProductRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().products()
    }

    fn towel() -> Product {
        Product::new("10", "Toalha de Banho")
            .with_prices(Money::from_cents(4990), Money::from_cents(4490))
            .with_group("3", "Cama, Mesa e Banho")
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_overwrites() {
        let repo = repo().await;

        repo.upsert_batch(&[towel()]).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);

        let renamed = Product {
            name: "Toalha de Banho Gigante".to_string(),
            ..towel()
        };
        repo.upsert_batch(&[renamed.clone()]).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(repo.get("10").await.unwrap(), Some(renamed));
    }

    #[tokio::test]
    async fn test_delete_codes() {
        let repo = repo().await;
        repo.upsert_batch(&[towel(), Product::new("11", "Lençol"), Product::new("12", "Fronha")])
            .await
            .unwrap();

        let deleted = repo.delete_codes(&["11", "12", "99"]).await.unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(repo.codes().await.unwrap(), HashSet::from(["10".to_string()]));
    }

    #[tokio::test]
    async fn test_relevance_folds_accents() {
        let repo = repo().await;
        repo.upsert_batch(&[
            Product::new("1", "Lençol Casal"),
            Product::new("2", "Fronha Avulsa").with_group("9", "Lençol e Fronha"),
            Product::new("3", "Martelo"),
        ])
        .await
        .unwrap();

        let scores = repo.relevance(&["lencol"]).await.unwrap();

        assert!(scores.contains_key("1"));
        assert!(scores.contains_key("2"));
        assert!(!scores.contains_key("3"));
        // a name hit outweighs a group description hit
        assert!(scores["1"] > scores["2"]);
    }

    #[tokio::test]
    async fn test_relevance_tracks_updates_and_deletes() {
        let repo = repo().await;
        repo.upsert_batch(&[Product::new("1", "Martelo")]).await.unwrap();
        assert!(repo.relevance(&["martelo"]).await.unwrap().contains_key("1"));

        repo.upsert_batch(&[Product::new("1", "Alicate")]).await.unwrap();
        assert!(repo.relevance(&["martelo"]).await.unwrap().is_empty());
        assert!(repo.relevance(&["alicate"]).await.unwrap().contains_key("1"));

        repo.delete_codes(&["1"]).await.unwrap();
        assert!(repo.relevance(&["alicate"]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_relevance_without_terms() {
        let repo = repo().await;
        assert!(repo.relevance(&[]).await.unwrap().is_empty());
        assert!(repo.relevance(&["  "]).await.unwrap().is_empty());
    }

    #[test]
    fn test_match_expression_quotes_terms() {
        assert_eq!(
            match_expression(&["toalha", "ba\"nho"]).as_deref(),
            Some("\"toalha\" OR \"ba\"\"nho\"")
        );
        assert_eq!(match_expression(&[]), None);
    }
}
