//! # Scoring Strategies
//!
//! A fixed, ordered set of independent match strategies. Each one looks at
//! a single product and the normalized query and either fires with a score
//! in `[0, 10]` or stays silent.
//!
//! ## Strategy Table
//! ```text
//! ┌──────────────────┬───────────────┬────────────────────────────────────────┐
//! │ Strategy         │ Score         │ Fires when                             │
//! ├──────────────────┼───────────────┼────────────────────────────────────────┤
//! │ ExactCode        │ 10            │ code or barcode == raw query (no case) │
//! │ ExactName        │ 8             │ normalized name == normalized phrase   │
//! │ PhraseSubstring  │ 5             │ folded name contains folded raw query  │
//! │ Relevance        │ 0..4          │ full-text index matched (external)     │
//! │ AllTokens        │ 0.8           │ every token or variant in name/group   │
//! │ NamePrefix       │ 0.5           │ normalized name starts with phrase     │
//! │ Fuzzy            │ similarity    │ trigram similarity > threshold         │
//! └──────────────────┴───────────────┴────────────────────────────────────────┘
//! ```
//!
//! Strategies never see each other's output; combining them is the job of
//! [`crate::ranking`].

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::normalize::{fold_phrase, tokenize, NormalizedQuery};
use crate::similarity::similarity;
use crate::types::Product;
use crate::validation::validate_fuzzy_threshold;

// =============================================================================
// Scores
// =============================================================================

pub const EXACT_CODE_SCORE: f64 = 10.0;
pub const EXACT_NAME_SCORE: f64 = 8.0;
pub const PHRASE_SUBSTRING_SCORE: f64 = 5.0;
pub const ALL_TOKENS_SCORE: f64 = 0.8;
pub const NAME_PREFIX_SCORE: f64 = 0.5;

/// Upper bound applied to the external relevance value.
pub const RELEVANCE_CAP: f64 = 4.0;

/// Default fuzzy similarity threshold.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.3;

// =============================================================================
// Parameters
// =============================================================================

/// Tunables shared by all strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringParams {
    fuzzy_threshold: f64,
}

impl ScoringParams {
    /// Creates parameters with a custom fuzzy threshold.
    ///
    /// ## Errors
    /// The threshold must lie within `0.15..=0.3`.
    pub fn new(fuzzy_threshold: f64) -> Result<Self, ValidationError> {
        validate_fuzzy_threshold(fuzzy_threshold)?;
        Ok(ScoringParams { fuzzy_threshold })
    }

    pub fn fuzzy_threshold(&self) -> f64 {
        self.fuzzy_threshold
    }
}

impl Default for ScoringParams {
    fn default() -> Self {
        ScoringParams {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }
}

// =============================================================================
// Scoring Document
// =============================================================================

/// A product prepared for scoring.
///
/// Folding and tokenizing the name is done once here instead of once per
/// strategy.
#[derive(Debug, Clone)]
pub struct ScoringDocument<'a> {
    pub product: &'a Product,

    /// Name tokens joined by spaces (stop words removed).
    pub normalized_name: String,

    /// Folded name with stop words kept.
    pub folded_name: String,

    /// Folded group description.
    pub folded_group: String,

    /// Full-text relevance from the persistence engine, if it matched.
    pub relevance: Option<f64>,
}

impl<'a> ScoringDocument<'a> {
    pub fn new(product: &'a Product, relevance: Option<f64>) -> Self {
        ScoringDocument {
            product,
            normalized_name: tokenize(&product.name).join(" "),
            folded_name: fold_phrase(&product.name),
            folded_group: fold_phrase(&product.group_description),
            relevance,
        }
    }
}

// =============================================================================
// Strategy
// =============================================================================

/// One of the match strategies, ordered from highest to lowest precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ExactCode,
    ExactName,
    PhraseSubstring,
    Relevance,
    AllTokens,
    NamePrefix,
    Fuzzy,
}

impl Strategy {
    /// Every strategy, in evaluation order.
    pub const ALL: [Strategy; 7] = [
        Strategy::ExactCode,
        Strategy::ExactName,
        Strategy::PhraseSubstring,
        Strategy::Relevance,
        Strategy::AllTokens,
        Strategy::NamePrefix,
        Strategy::Fuzzy,
    ];

    /// Stable name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::ExactCode => "exact_code",
            Strategy::ExactName => "exact_name",
            Strategy::PhraseSubstring => "phrase_substring",
            Strategy::Relevance => "relevance",
            Strategy::AllTokens => "all_tokens",
            Strategy::NamePrefix => "name_prefix",
            Strategy::Fuzzy => "fuzzy",
        }
    }

    /// Scores one document. `None` means the strategy did not fire.
    ///
    /// Callers must not pass an empty query; see
    /// [`NormalizedQuery::is_empty`].
    pub fn score(
        &self,
        doc: &ScoringDocument<'_>,
        query: &NormalizedQuery,
        params: &ScoringParams,
    ) -> Option<f64> {
        let fired = match self {
            Strategy::ExactCode => {
                let raw = query.raw.to_lowercase();
                let code_matches = doc.product.code.to_lowercase() == raw;
                let barcode_matches = doc
                    .product
                    .barcode
                    .as_deref()
                    .is_some_and(|barcode| barcode.to_lowercase() == raw);
                (!raw.is_empty() && (code_matches || barcode_matches)).then_some(EXACT_CODE_SCORE)
            }
            Strategy::ExactName => {
                (doc.normalized_name == query.phrase).then_some(EXACT_NAME_SCORE)
            }
            Strategy::PhraseSubstring => (!query.folded.is_empty()
                && doc.folded_name.contains(&query.folded))
            .then_some(PHRASE_SUBSTRING_SCORE),
            Strategy::Relevance => doc
                .relevance
                .filter(|value| *value > 0.0)
                .map(|value| value.min(RELEVANCE_CAP)),
            Strategy::AllTokens => query
                .tokens
                .iter()
                .all(|token| token.occurs_in(&doc.folded_name) || token.occurs_in(&doc.folded_group))
                .then_some(ALL_TOKENS_SCORE),
            Strategy::NamePrefix => (doc.normalized_name.starts_with(&query.phrase)
                || doc.normalized_name.starts_with(&query.variant_phrase))
            .then_some(NAME_PREFIX_SCORE),
            Strategy::Fuzzy => {
                let value = similarity(&doc.normalized_name, &query.phrase);
                (value > params.fuzzy_threshold).then_some(value)
            }
        };

        fired.filter(|score| *score > 0.0)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
