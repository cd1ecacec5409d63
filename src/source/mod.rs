//! Article sources: one page fetch against a remote search API.
//!
//! The [`ArticleSource`] trait is the seam between the pagination engine and
//! the network. Implementations perform exactly one request per call and
//! never cache or retry; caching belongs to the page cache and retrying is
//! the user's decision.
//!
//! - `newsapi` - NewsAPI `/v2/everything` implementation over `reqwest`

mod newsapi;

pub use newsapi::NewsApiSource;

use crate::feed::Page;
use crate::query::QuerySpec;
use std::future::Future;
use thiserror::Error;

/// Articles requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Errors from constructing a source or fetching a page.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport failure (DNS, connect, TLS, reset, client timeout)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Upstream answered with a non-success status
    #[error("Upstream error: status {status}: {message}")]
    Upstream { status: u16, message: String },
    /// Body could not be read as a page of articles
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl,
    #[error("No API key configured (set NEWSAPI_KEY or api_key in config.toml)")]
    MissingApiKey,
}

impl SourceError {
    /// Single-line message suitable for the status area of the UI.
    pub fn user_message(&self) -> String {
        match self {
            SourceError::Network(_) => {
                "Couldn't reach the news service. Check your connection and try again.".to_string()
            }
            SourceError::Upstream { status: 401, .. } => {
                "The news service rejected the API key.".to_string()
            }
            SourceError::Upstream { status: 429, .. } => {
                "Rate limited by the news service. Try again later.".to_string()
            }
            SourceError::Upstream { status, message } => {
                format!("News service error ({status}): {message}")
            }
            SourceError::Malformed(_) => {
                "The news service returned a response that couldn't be read.".to_string()
            }
            SourceError::InvalidBaseUrl(_)
            | SourceError::InsecureBaseUrl
            | SourceError::MissingApiKey => self.to_string(),
        }
    }
}

/// Executes single page fetches for a query.
///
/// Implementations must be cheap to share across tasks; the controller holds
/// one behind an `Arc` and calls it from spawned fetch tasks.
pub trait ArticleSource: Send + Sync + 'static {
    /// Fetch page `page_number` (1-based) of `query`, requesting `page_size`
    /// articles. The returned page's `is_last` is set when fewer than
    /// `page_size` articles came back.
    fn fetch_page(
        &self,
        query: &QuerySpec,
        page_number: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<Page, SourceError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_for_auth_failure() {
        let err = SourceError::Upstream {
            status: 401,
            message: "Your API key is invalid".to_string(),
        };
        assert!(err.user_message().contains("API key"));
    }

    #[test]
    fn test_user_message_includes_upstream_detail() {
        let err = SourceError::Upstream {
            status: 426,
            message: "maximum results reached".to_string(),
        };
        let msg = err.user_message();
        assert!(msg.contains("426"));
        assert!(msg.contains("maximum results reached"));
    }

    #[test]
    fn test_user_message_hides_parse_detail() {
        let err = SourceError::Malformed("expected value at line 1".to_string());
        assert!(!err.user_message().contains("line 1"));
    }
}
