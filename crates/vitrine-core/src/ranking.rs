//! # Rank Aggregation
//!
//! Combines strategy outputs into one ordered candidate list.
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  per product:   score = MAX over fired strategies   (never the sum)    │
//! │  per code:      keep one entry, the one with the highest score         │
//! │  exclusion:     products where no strategy fired are dropped           │
//! │  ordering:      score desc, then name asc, then code asc               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A product that only matches a prefix (0.5) and all tokens (0.8) ends at
//! 0.8 and therefore stays below an exact name match (8).

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::normalize::NormalizedQuery;
use crate::scoring::{ScoringDocument, ScoringParams, Strategy};
use crate::types::Product;

// =============================================================================
// Inputs and Outputs
// =============================================================================

/// A product offered to the aggregator, with its full-text relevance when
/// the index matched it.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub product: Product,
    pub relevance: Option<f64>,
}

impl Candidate {
    pub fn new(product: Product) -> Self {
        Candidate {
            product,
            relevance: None,
        }
    }

    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance = Some(relevance);
        self
    }
}

/// A product that survived ranking.
#[derive(Debug, Clone)]
pub struct RankedProduct {
    pub product: Product,
    pub score: f64,
    /// The strategy that produced `score`.
    pub strategy: Strategy,
}

// =============================================================================
// Aggregator
// =============================================================================

/// Max-score-wins aggregator over [`Strategy::ALL`].
#[derive(Debug, Clone, Default)]
pub struct RankAggregator {
    params: ScoringParams,
}

impl RankAggregator {
    pub fn new(params: ScoringParams) -> Self {
        RankAggregator { params }
    }

    pub fn params(&self) -> &ScoringParams {
        &self.params
    }

    /// Best score for a single document, with the strategy that produced it.
    ///
    /// On equal scores the earlier (more precise) strategy is reported.
    pub fn best_score(
        &self,
        doc: &ScoringDocument<'_>,
        query: &NormalizedQuery,
    ) -> Option<(f64, Strategy)> {
        Strategy::ALL
            .iter()
            .filter_map(|strategy| {
                strategy
                    .score(doc, query, &self.params)
                    .map(|score| (score, *strategy))
            })
            .fold(None, |best, (score, strategy)| match best {
                Some((top, _)) if top >= score => best,
                _ => Some((score, strategy)),
            })
    }

    /// Scores and orders candidates.
    ///
    /// An empty query returns no results without evaluating any strategy.
    pub fn rank<I>(&self, query: &NormalizedQuery, candidates: I) -> Vec<RankedProduct>
    where
        I: IntoIterator<Item = Candidate>,
    {
        if query.is_empty() {
            return Vec::new();
        }

        let mut by_code: HashMap<String, RankedProduct> = HashMap::new();

        for candidate in candidates {
            let best = {
                let doc = ScoringDocument::new(&candidate.product, candidate.relevance);
                self.best_score(&doc, query)
            };
            let Some((score, strategy)) = best else {
                continue;
            };

            let ranked = RankedProduct {
                product: candidate.product,
                score,
                strategy,
            };
            match by_code.entry(ranked.product.code.clone()) {
                Entry::Occupied(mut slot) => {
                    if slot.get().score < ranked.score {
                        slot.insert(ranked);
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(ranked);
                }
            }
        }

        let mut ranked: Vec<RankedProduct> = by_code.into_values().collect();
        ranked.sort_by(compare_ranked);
        ranked
    }
}

/// Score descending, then name ascending, then code ascending.
fn compare_ranked(a: &RankedProduct, b: &RankedProduct) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.product.name.cmp(&b.product.name))
        .then_with(|| a.product.code.cmp(&b.product.code))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank(raw: &str, products: Vec<Product>) -> Vec<RankedProduct> {
        RankAggregator::default().rank(
            &NormalizedQuery::parse(raw),
            products.into_iter().map(Candidate::new),
        )
    }

    fn codes(ranked: &[RankedProduct]) -> Vec<&str> {
        ranked.iter().map(|r| r.product.code.as_str()).collect()
    }

    #[test]
    fn test_max_not_sum() {
        // "toalhas" matches #1 by prefix (0.5), all-tokens (0.8) and fuzzy
        let weak = Product::new("1", "Toalha Rosto");
        let strong = Product::new("2", "Toalhas");

        let ranked = rank("toalhas", vec![weak, strong]);

        assert_eq!(codes(&ranked), vec!["2", "1"]);
        assert_eq!(ranked[0].score, 8.0);
        assert_eq!(ranked[0].strategy, Strategy::ExactName);
        assert_eq!(ranked[1].score, 0.8);
        assert_eq!(ranked[1].strategy, Strategy::AllTokens);
    }

    #[test]
    fn test_duplicates_collapse_to_max() {
        let plain = Candidate::new(Product::new("7", "Lençol Casal"));
        let relevant = Candidate::new(Product::new("7", "Lençol Casal")).with_relevance(3.0);

        let ranked = RankAggregator::default()
            .rank(&NormalizedQuery::parse("lencois"), vec![plain, relevant]);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, 3.0);
        assert_eq!(ranked[0].strategy, Strategy::Relevance);
    }

    #[test]
    fn test_ties_break_by_name_then_code() {
        let ranked = rank(
            "toalha",
            vec![
                Product::new("3", "Toalha Rosto"),
                Product::new("2", "Toalha Banho"),
                Product::new("1", "Toalha Banho"),
            ],
        );

        assert_eq!(codes(&ranked), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_unmatched_products_excluded() {
        let ranked = rank(
            "toalha",
            vec![Product::new("1", "Martelo"), Product::new("2", "Toalha Banho")],
        );
        assert_eq!(codes(&ranked), vec!["2"]);
    }

    #[test]
    fn test_empty_query_short_circuits() {
        let ranked = rank("quero ver de", vec![Product::new("1", "de")]);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_plural_query_finds_singular_name() {
        let ranked = rank("toalhas", vec![Product::new("10", "Toalha de Banho")]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, 0.8);
    }
}
