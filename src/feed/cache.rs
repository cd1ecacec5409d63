//! Append-only page store for the active query.

use super::types::{Article, Page};
use crate::query::QuerySpec;
use std::sync::Arc;
use thiserror::Error;

/// Invariant violations on [`PageCache::append`].
///
/// Under correct controller usage neither can happen; they are logged as
/// defects and never shown to the user.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Out-of-order page: expected page {expected}, got page {got}")]
    OutOfOrderPage { expected: u32, got: u32 },
    #[error("Cache already exhausted; no further pages accepted")]
    AlreadyExhausted,
}

/// Pages fetched so far for one query identity.
///
/// Pages are contiguous from 1 with no gaps. `next_page_number` always names
/// the page the next fetch must request, and stops advancing once a page
/// with `is_last` has been appended.
#[derive(Debug, Clone)]
pub struct PageCache {
    query: QuerySpec,
    pages: Vec<Page>,
    next_page_number: u32,
    exhausted: bool,
}

impl PageCache {
    pub fn new(query: QuerySpec) -> Self {
        Self {
            query,
            pages: Vec::new(),
            next_page_number: 1,
            exhausted: false,
        }
    }

    /// Drop every page and rewind to page 1 for `query`.
    pub fn reset(&mut self, query: QuerySpec) {
        self.query = query;
        self.pages.clear();
        self.next_page_number = 1;
        self.exhausted = false;
    }

    /// Append the next page in sequence.
    ///
    /// # Errors
    ///
    /// - [`CacheError::AlreadyExhausted`] once a last page has been stored
    /// - [`CacheError::OutOfOrderPage`] if `page.page_number` is not
    ///   [`PageCache::next_page_number`]
    pub fn append(&mut self, page: Page) -> Result<(), CacheError> {
        if self.exhausted {
            return Err(CacheError::AlreadyExhausted);
        }
        if page.page_number != self.next_page_number {
            return Err(CacheError::OutOfOrderPage {
                expected: self.next_page_number,
                got: page.page_number,
            });
        }

        if page.is_last {
            self.exhausted = true;
        } else {
            self.next_page_number += 1;
        }
        self.pages.push(page);
        Ok(())
    }

    /// All cached articles in canonical feed order: ascending page number,
    /// then upstream order within each page. No de-duplication here.
    pub fn flatten(&self) -> Vec<Arc<Article>> {
        self.iter_articles().cloned().collect()
    }

    pub(crate) fn iter_articles(&self) -> impl Iterator<Item = &Arc<Article>> {
        self.pages.iter().flat_map(|p| p.articles.iter())
    }

    pub fn query(&self) -> &QuerySpec {
        &self.query
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn next_page_number(&self) -> u32 {
        self.next_page_number
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// True when no page has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn article_count(&self) -> usize {
        self.pages.iter().map(Page::len).sum()
    }
}
