//! # Query Normalization
//!
//! Turns free text into the token form every scoring strategy works on.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "Quero ver TOALHAS de Banho!"                                          │
//! │        │                                                                │
//! │        ▼  fold: lowercase + strip diacritics (NFD, drop marks)          │
//! │  "quero ver toalhas de banho!"                                          │
//! │        │                                                                │
//! │        ▼  split on anything that is not a letter or digit               │
//! │  [quero, ver, toalhas, de, banho]                                       │
//! │        │                                                                │
//! │        ▼  drop stop words and tokens shorter than 2 chars               │
//! │  [toalhas, banho]                                                       │
//! │        │                                                                │
//! │        ▼  plural/singular variant per token                             │
//! │  [(toalhas, toalha), (banho, banhos)]                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Product names go through the same [`tokenize`] so both sides of every
//! comparison live in the same space.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Tokens shorter than this are discarded.
pub const MIN_TOKEN_LEN: usize = 2;

/// Portuguese filler words that carry no product meaning.
///
/// Stored already folded (no diacritics).
pub const STOP_WORDS: &[&str] = &[
    // articles
    "o", "a", "os", "as", "um", "uma", "uns", "umas",
    // prepositions and contractions
    "de", "da", "do", "das", "dos", "em", "na", "no", "nas", "nos", "ao", "aos",
    "para", "pra", "pro", "por", "pelo", "pela", "com", "sem", "num", "numa",
    // conjunctions and pronouns
    "e", "ou", "que", "se", "me", "eu", "voce", "vc", "tem", "tenho",
    // request phrasing
    "quero", "queria", "gostaria", "preciso", "procuro", "procurando",
    "mostrar", "mostra", "mostre", "ver", "busca", "buscar", "algum", "alguma",
    "alguns", "algumas", "favor",
];

// =============================================================================
// Text Helpers
// =============================================================================

/// Lowercases and strips diacritics.
///
/// ```rust
/// use vitrine_core::normalize::fold;
///
/// assert_eq!(fold("Pão de Açúcar"), "pao de acucar");
/// ```
pub fn fold(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Folds, splits and filters text into search tokens.
///
/// ```rust
/// use vitrine_core::normalize::tokenize;
///
/// assert_eq!(tokenize("Toalha de Banho"), vec!["toalha", "banho"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    fold(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= MIN_TOKEN_LEN)
        .filter(|token| !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

/// Returns true if the (folded) token is a stop word.
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Collapses whitespace runs and trims, after folding.
pub fn fold_phrase(text: &str) -> String {
    fold(text).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Produces the plural/singular counterpart of a folded token.
///
/// Deterministic suffix rules for Portuguese:
///
/// | ends with          | becomes      | example                 |
/// |--------------------|--------------|-------------------------|
/// | `is`               | `l`          | `enxovais` → `enxoval`  |
/// | `ns`               | `m`          | `jardins` → `jardim`    |
/// | `s`, len > 3       | drop it      | `toalhas` → `toalha`    |
/// | `l`                | `is`         | `papel` → `papeis`      |
/// | `m`                | `ns`         | `bombom` → `bombons`    |
/// | anything else      | append `s`   | `banho` → `banhos`      |
pub fn variant(token: &str) -> String {
    if let Some(stem) = token.strip_suffix("is") {
        return format!("{stem}l");
    }
    if let Some(stem) = token.strip_suffix("ns") {
        return format!("{stem}m");
    }
    if token.chars().count() > 3 {
        if let Some(stem) = token.strip_suffix('s') {
            return stem.to_string();
        }
    }

    if let Some(stem) = token.strip_suffix('l') {
        return format!("{stem}is");
    }
    if let Some(stem) = token.strip_suffix('m') {
        return format!("{stem}ns");
    }

    format!("{token}s")
}

// =============================================================================
// Normalized Query
// =============================================================================

/// A query token and its plural/singular counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryToken {
    pub original: String,
    pub variant: String,
}

impl QueryToken {
    pub fn new(original: impl Into<String>) -> Self {
        let original = original.into();
        let variant = variant(&original);
        QueryToken { original, variant }
    }

    /// True if either form of the token occurs in `haystack`.
    pub fn occurs_in(&self, haystack: &str) -> bool {
        haystack.contains(&self.original) || haystack.contains(&self.variant)
    }
}

/// The output of query normalization.
///
/// An empty token list means no strategy runs and the search returns an
/// empty page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    /// Raw input, trimmed.
    pub raw: String,

    /// Raw input folded, whitespace-collapsed. Stop words are kept.
    pub folded: String,

    /// Meaningful tokens in input order.
    pub tokens: Vec<QueryToken>,

    /// Tokens joined by single spaces.
    pub phrase: String,

    /// Variants joined by single spaces.
    pub variant_phrase: String,
}

impl NormalizedQuery {
    /// Normalizes raw input.
    ///
    /// ```rust
    /// use vitrine_core::normalize::NormalizedQuery;
    ///
    /// let query = NormalizedQuery::parse("Quero ver toalhas de banho");
    /// assert_eq!(query.phrase, "toalhas banho");
    /// assert_eq!(query.variant_phrase, "toalha banhos");
    ///
    /// assert!(NormalizedQuery::parse("de a o").is_empty());
    /// ```
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        let tokens: Vec<QueryToken> = tokenize(&raw).into_iter().map(QueryToken::new).collect();

        let phrase = tokens
            .iter()
            .map(|t| t.original.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let variant_phrase = tokens
            .iter()
            .map(|t| t.variant.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        NormalizedQuery {
            folded: fold_phrase(&raw),
            raw,
            tokens,
            phrase,
            variant_phrase,
        }
    }

    /// True when nothing meaningful is left to search for.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Distinct terms to feed the full-text index (originals then variants).
    pub fn search_terms(&self) -> Vec<&str> {
        let mut terms: Vec<&str> = Vec::with_capacity(self.tokens.len() * 2);
        for token in &self.tokens {
            for term in [token.original.as_str(), token.variant.as_str()] {
                if !terms.contains(&term) {
                    terms.push(term);
                }
            }
        }
        terms
    }
}
