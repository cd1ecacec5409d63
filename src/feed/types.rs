use chrono::{DateTime, Utc};
use std::sync::Arc;

// ============================================================================
// Article
// ============================================================================

/// A single news article as returned by the upstream search.
///
/// `url` is unique within one query's result set but not globally; the
/// flattened feed de-duplicates on [`Article::dedup_key`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    /// Display name of the publishing source ("Unknown" when upstream omits it).
    pub source_name: String,
    pub author: Option<String>,
}

impl Article {
    /// Identity used to drop repeats when upstream reorders results
    /// between page fetches.
    pub fn dedup_key(&self) -> (&str, DateTime<Utc>) {
        (self.url.as_str(), self.published_at)
    }
}

// ============================================================================
// Page
// ============================================================================

/// One unit of paginated results.
///
/// Articles are `Arc`-wrapped so projections can share them with the UI
/// without deep-cloning every string on each re-render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based page index.
    pub page_number: u32,
    pub articles: Vec<Arc<Article>>,
    /// True when upstream returned fewer than a full page. The API reports
    /// no reliable total, so a short page is the only end-of-results signal.
    pub is_last: bool,
}

impl Page {
    /// Build a page from a fetch result, deriving `is_last` from `page_size`.
    pub fn from_fetch(page_number: u32, articles: Vec<Article>, page_size: u32) -> Self {
        let is_last = articles.len() < page_size as usize;
        Self {
            page_number,
            articles: articles.into_iter().map(Arc::new).collect(),
            is_last,
        }
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}
