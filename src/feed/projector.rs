//! Derive what the UI shows from controller state and cached pages.

use super::cache::PageCache;
use super::controller::ControllerState;
use super::types::Article;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// Render-ready snapshot of the feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedView {
    /// Flattened articles, de-duplicated on `(url, published_at)`,
    /// keeping the first occurrence.
    pub items: Vec<Arc<Article>>,
    /// First page of a new query is loading.
    pub is_initial_loading: bool,
    /// A further page is loading below existing items.
    pub is_loading_more: bool,
    /// User-facing message for the last failed fetch.
    pub error_message: Option<String>,
    /// Upstream has no more results for this query.
    pub is_exhausted: bool,
}

/// Project `state` and `cache` into a [`FeedView`].
///
/// Pure: identical inputs always give identical output. `cache` is `None`
/// before the first query is set.
pub fn project(state: &ControllerState, cache: Option<&PageCache>) -> FeedView {
    let items = cache.map(dedup_articles).unwrap_or_default();

    FeedView {
        items,
        is_initial_loading: matches!(state, ControllerState::LoadingFirst),
        is_loading_more: matches!(state, ControllerState::LoadingMore),
        error_message: match state {
            ControllerState::Error(cause) => Some(cause.user_message()),
            _ => None,
        },
        is_exhausted: matches!(state, ControllerState::Exhausted),
    }
}

fn dedup_articles(cache: &PageCache) -> Vec<Arc<Article>> {
    let mut seen: HashSet<(&str, DateTime<Utc>)> = HashSet::with_capacity(cache.article_count());
    cache
        .iter_articles()
        .filter(|a| seen.insert(a.dedup_key()))
        .cloned()
        .collect()
}
