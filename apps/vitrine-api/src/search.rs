//! # Catalog Search
//!
//! Serves search requests from the local catalog.
//!
//! ## Request Flow
//! ```text
//! query ──► NormalizedQuery ──► empty? ──► empty page
//!                │
//!                ├──► FTS5 relevance (vitrine-db)
//!                ├──► all products  (vitrine-db)
//!                ▼
//!          RankAggregator ──► PageRequest (3 per page) ──► SearchResponse
//! ```
//!
//! Any failure past normalization becomes the degraded response; callers
//! never see an error from [`CatalogSearch::search`].

use tracing::{debug, error};
use vitrine_core::{
    Candidate, NormalizedQuery, PageRequest, RankAggregator, ScoringParams, SearchItem,
    SearchRequest, SearchResponse,
};
use vitrine_db::{Database, DbResult};

/// Message shown to the customer when the catalog can't be searched.
pub const DEGRADED_MESSAGE: &str =
    "Desculpe, não consegui buscar os produtos no momento. Tente novamente em instantes.";

/// Search service over the local catalog.
#[derive(Debug, Clone)]
pub struct CatalogSearch {
    db: Database,
    aggregator: RankAggregator,
}

impl CatalogSearch {
    pub fn new(db: Database, params: ScoringParams) -> Self {
        CatalogSearch {
            db,
            aggregator: RankAggregator::new(params),
        }
    }

    /// Runs a search, degrading on any storage failure.
    pub async fn search(&self, request: &SearchRequest) -> SearchResponse {
        match self.try_search(request).await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, query = %request.query, "Search failed");
                SearchResponse::degraded(DEGRADED_MESSAGE)
            }
        }
    }

    async fn try_search(&self, request: &SearchRequest) -> DbResult<SearchResponse> {
        let page_request = PageRequest::new(request.page);
        let query = NormalizedQuery::parse(&request.query);

        // nothing to rank, so there is no later page either
        if query.is_empty() {
            return Ok(SearchResponse::empty(1));
        }

        let relevance = self.db.products().relevance(&query.search_terms()).await?;
        let products = self.db.products().all().await?;

        let candidates = products.into_iter().map(|product| {
            match relevance.get(&product.code) {
                Some(&score) => Candidate::new(product).with_relevance(score),
                None => Candidate::new(product),
            }
        });

        let ranked = self.aggregator.rank(&query, candidates);
        debug!(
            query = %request.query,
            matches = ranked.len(),
            page = page_request.page(),
            "Ranked catalog"
        );

        let page = page_request.paginate(ranked);
        Ok(SearchResponse {
            items: page
                .items
                .iter()
                .map(|ranked| SearchItem::from(&ranked.product))
                .collect(),
            page: page.page,
            has_more: page.has_more,
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_core::{Money, Product};
    use vitrine_db::DbConfig;

    async fn search_with(products: Vec<Product>) -> CatalogSearch {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().upsert_batch(&products).await.unwrap();
        CatalogSearch::new(db, ScoringParams::default())
    }

    fn request(query: &str, page: Option<i64>) -> SearchRequest {
        SearchRequest {
            query: query.to_string(),
            page,
        }
    }

    #[tokio::test]
    async fn test_plural_query_finds_singular_name() {
        let search = search_with(vec![
            Product::new("10", "Toalha de Banho")
                .with_prices(Money::from_cents(4990), Money::from_cents(4490)),
            Product::new("11", "Lençol Casal"),
        ])
        .await;

        let response = search.search(&request("toalhas", None)).await;

        assert_eq!(response.error, None);
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].code, "10");
        assert_eq!(response.items[0].price, 49.9);
        assert_eq!(response.items[0].price_cash, 44.9);
    }

    #[tokio::test]
    async fn test_pages_of_three() {
        let search = search_with(vec![
            Product::new("1", "Toalha Azul"),
            Product::new("2", "Toalha Branca"),
            Product::new("3", "Toalha Cinza"),
            Product::new("4", "Toalha Verde"),
        ])
        .await;

        let first = search.search(&request("toalha", Some(1))).await;
        assert_eq!(first.items.len(), 3);
        assert_eq!(first.page, 1);
        assert!(first.has_more);

        let second = search.search(&request("toalha", Some(2))).await;
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.page, 2);
        assert!(!second.has_more);

        let mut codes: Vec<String> = first
            .items
            .into_iter()
            .chain(second.items)
            .map(|item| item.code)
            .collect();
        codes.sort();
        assert_eq!(codes, vec!["1", "2", "3", "4"]);
    }

    #[tokio::test]
    async fn test_blank_query_is_empty_first_page() {
        let search = search_with(vec![Product::new("1", "Toalha Azul")]).await;

        let response = search.search(&request("   ", Some(2))).await;
        assert_eq!(response, SearchResponse::empty(1));
    }

    #[tokio::test]
    async fn test_stop_words_only_is_empty_first_page() {
        let search = search_with(vec![Product::new("1", "Toalha Azul")]).await;

        for query in ["", "quero ver de"] {
            let response = search.search(&request(query, Some(2))).await;
            assert_eq!(response.page, 1, "query {query:?}");
            assert!(response.items.is_empty());
            assert!(!response.has_more);
            assert_eq!(response.error, None);
        }
    }

    #[tokio::test]
    async fn test_closed_database_degrades() {
        let search = search_with(vec![Product::new("1", "Toalha Azul")]).await;
        search.db.close().await;

        let response = search.search(&request("toalha", Some(3))).await;
        assert_eq!(response.page, 1);
        assert!(response.items.is_empty());
        assert_eq!(response.error.as_deref(), Some(DEGRADED_MESSAGE));
    }
}
