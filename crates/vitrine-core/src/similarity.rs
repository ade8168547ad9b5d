//! # Trigram Similarity
//!
//! Typo-tolerant string similarity in the style of PostgreSQL's `pg_trgm`.
//!
//! ```text
//! "toalha" → words padded as "  toalha " → {"  t", " to", "toa", "oal", "alh", "lha", "ha "}
//!
//! similarity(a, b) = |T(a) ∩ T(b)| / |T(a) ∪ T(b)|
//! ```
//!
//! Inputs are expected to be folded already (see [`crate::normalize`]).

use std::collections::HashSet;

type Trigram = [char; 3];

/// Extracts the trigram set of `text`.
///
/// Each alphanumeric word is padded with two leading spaces and one trailing
/// space before sliding a window of three characters over it.
pub fn trigrams(text: &str) -> HashSet<Trigram> {
    let mut set = HashSet::new();

    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let padded: Vec<char> = "  "
            .chars()
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();

        for window in padded.windows(3) {
            set.insert([window[0], window[1], window[2]]);
        }
    }

    set
}

/// Jaccard similarity of the trigram sets, in `[0, 1]`.
///
/// ```rust
/// use vitrine_core::similarity::similarity;
///
/// assert_eq!(similarity("toalha", "toalha"), 1.0);
/// assert!(similarity("toalah", "toalha") > 0.3);
/// assert_eq!(similarity("", "toalha"), 0.0);
/// ```
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);

    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let shared = left.intersection(&right).count();
    let total = left.len() + right.len() - shared;

    shared as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigram_padding() {
        let set = trigrams("ab");
        assert_eq!(set.len(), 3);
        assert!(set.contains(&[' ', ' ', 'a']));
        assert!(set.contains(&[' ', 'a', 'b']));
        assert!(set.contains(&['a', 'b', ' ']));
    }

    #[test]
    fn test_identical_strings() {
        assert_eq!(similarity("toalha banho", "toalha banho"), 1.0);
    }

    #[test]
    fn test_typo_scores_above_threshold() {
        // two letters missing
        let score = similarity("travesero", "travesseiro");
        assert!(score > 0.3, "score was {score}");
    }

    #[test]
    fn test_unrelated_strings_score_low() {
        assert!(similarity("martelo", "toalha") < 0.15);
    }

    #[test]
    fn test_symmetric() {
        assert_eq!(similarity("lencol", "lencois"), similarity("lencois", "lencol"));
    }
}
