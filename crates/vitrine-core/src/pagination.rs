//! # Pagination
//!
//! Pages over a ranked stream without a separate count query.
//!
//! ```text
//! page = 2, page_size = 3
//!
//!   ranked:  [ r0 r1 r2 | r3 r4 r5 | r6 | r7 ... ]
//!                         └ offset 3, fetch 4 ┘
//!
//!   items    = r3 r4 r5
//!   has_more = fetched 4 > page_size 3   → true
//! ```

use serde::Serialize;

use crate::SEARCH_PAGE_SIZE;

/// A resolved page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: usize,
}

impl PageRequest {
    /// Builds a request from an optional 1-based page number.
    ///
    /// Missing, zero and negative pages are clamped to 1.
    pub fn new(page: Option<i64>) -> Self {
        let page = page
            .unwrap_or(1)
            .clamp(1, i64::from(u32::MAX));

        PageRequest {
            page: page as u32,
            page_size: SEARCH_PAGE_SIZE,
        }
    }

    /// Overrides the page size (minimum 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of ranked rows to skip.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.page_size)
    }

    /// Number of rows to fetch: one more than a page.
    pub fn fetch_limit(&self) -> usize {
        self.page_size + 1
    }

    /// Turns at most [`fetch_limit`](Self::fetch_limit) fetched rows into a page.
    pub fn page_from_fetched<T>(&self, mut fetched: Vec<T>) -> Page<T> {
        let has_more = fetched.len() > self.page_size;
        fetched.truncate(self.page_size);

        Page {
            items: fetched,
            page: self.page,
            has_more,
        }
    }

    /// Applies the window to a full ranked sequence.
    pub fn paginate<T, I>(&self, ranked: I) -> Page<T>
    where
        I: IntoIterator<Item = T>,
    {
        let fetched: Vec<T> = ranked
            .into_iter()
            .skip(self.offset())
            .take(self.fetch_limit())
            .collect();

        self.page_from_fetched(fetched)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(None)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Maps items, keeping paging metadata.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            has_more: self.has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_math() {
        let request = PageRequest::new(Some(3));
        assert_eq!(request.offset(), 6);
        assert_eq!(request.fetch_limit(), 4);
    }

    #[test]
    fn test_page_is_clamped() {
        assert_eq!(PageRequest::new(None).page(), 1);
        assert_eq!(PageRequest::new(Some(0)).page(), 1);
        assert_eq!(PageRequest::new(Some(-4)).page(), 1);
        assert_eq!(PageRequest::new(Some(0)).offset(), 0);
    }

    #[test]
    fn test_has_more_iff_extra_row_fetched() {
        let request = PageRequest::new(Some(1));

        let full = request.page_from_fetched(vec![1, 2, 3, 4]);
        assert_eq!(full.items, vec![1, 2, 3]);
        assert!(full.has_more);

        let exact = request.page_from_fetched(vec![1, 2, 3]);
        assert!(!exact.has_more);
    }

    #[test]
    fn test_paginate_over_ranked_sequence() {
        let ranked: Vec<u32> = (0..7).collect();

        let second = PageRequest::new(Some(2)).paginate(ranked.clone());
        assert_eq!(second.items, vec![3, 4, 5]);
        assert!(second.has_more);

        let third = PageRequest::new(Some(3)).paginate(ranked.clone());
        assert_eq!(third.items, vec![6]);
        assert!(!third.has_more);

        let beyond = PageRequest::new(Some(9)).paginate(ranked);
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.page, 9);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = PageRequest::new(Some(1)).paginate(vec![1, 2, 3, 4]).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20, 30]);
        assert!(page.has_more);
    }
}
