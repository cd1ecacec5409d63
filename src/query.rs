//! Query identity: which result set the user is currently looking at.
//!
//! A [`QuerySpec`] is the (category, search term) pair selected in the UI.
//! Page numbers are deliberately absent: they are a cursor into the result
//! set, owned by the page cache, not a dimension of the query.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Query term sent upstream when the user has not typed anything.
/// The `/v2/everything` endpoint rejects requests without a `q` parameter.
pub const FALLBACK_QUERY_TERM: &str = "news";

/// News category shown as a tab in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Unrestricted search across every upstream source.
    #[default]
    All,
    Tech,
    Business,
    Sports,
    Science,
    Entertainment,
}

impl Category {
    /// Every category, in tab order.
    pub const ALL: [Category; 6] = [
        Category::All,
        Category::Tech,
        Category::Business,
        Category::Sports,
        Category::Science,
        Category::Entertainment,
    ];

    /// Lowercase identifier used in config files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::All => "all",
            Category::Tech => "tech",
            Category::Business => "business",
            Category::Sports => "sports",
            Category::Science => "science",
            Category::Entertainment => "entertainment",
        }
    }

    /// Human-readable tab label.
    pub fn label(self) -> &'static str {
        match self {
            Category::All => "All",
            Category::Tech => "Tech",
            Category::Business => "Business",
            Category::Sports => "Sports",
            Category::Science => "Science",
            Category::Entertainment => "Entertainment",
        }
    }

    /// Position of this category in [`Category::ALL`].
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|c| *c == self).unwrap_or(0)
    }

    /// Next category in tab order, wrapping around.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous category in tab order, wrapping around.
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown category: {0} (expected one of all, tech, business, sports, science, entertainment)")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(wanted.to_string()))
    }
}

// ============================================================================
// Category → Source Table
// ============================================================================

/// Lookup table from category to the upstream source ids it searches.
///
/// This is configuration data, not logic: the built-in defaults can be
/// overridden per category from `config.toml`. [`Category::All`] never has an
/// entry and always means "no source restriction".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySources {
    table: HashMap<Category, Vec<String>>,
}

impl Default for CategorySources {
    fn default() -> Self {
        let defaults: [(Category, &[&str]); 5] = [
            (Category::Tech, &["techcrunch", "wired"]),
            (Category::Business, &["bloomberg", "business-insider"]),
            (Category::Sports, &["espn", "bbc-sport"]),
            (Category::Science, &["new-scientist", "national-geographic"]),
            (
                Category::Entertainment,
                &["entertainment-weekly", "mtv-news"],
            ),
        ];
        let table = defaults
            .into_iter()
            .map(|(cat, ids)| (cat, ids.iter().map(|s| s.to_string()).collect()))
            .collect();
        Self { table }
    }
}

impl CategorySources {
    /// Source ids for `category`, or `None` when the search is unrestricted.
    pub fn sources_for(&self, category: Category) -> Option<&[String]> {
        if category == Category::All {
            return None;
        }
        self.table
            .get(&category)
            .map(Vec::as_slice)
            .filter(|ids| !ids.is_empty())
    }

    /// Apply `[categories]` overrides from the config file.
    ///
    /// Keys are category names; unknown names and attempts to restrict
    /// `all` are logged and skipped. Blank source ids are dropped.
    pub fn with_overrides(mut self, overrides: &HashMap<String, Vec<String>>) -> Self {
        for (name, ids) in overrides {
            let category = match name.parse::<Category>() {
                Ok(Category::All) => {
                    tracing::warn!("Ignoring source override for 'all' (always unrestricted)");
                    continue;
                }
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(category = %name, error = %e, "Ignoring source override");
                    continue;
                }
            };
            let ids: Vec<String> = ids
                .iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect();
            tracing::debug!(category = %category, sources = ?ids, "Overriding category sources");
            self.table.insert(category, ids);
        }
        self
    }
}

// ============================================================================
// QuerySpec
// ============================================================================

/// What to fetch: a category plus a normalized (trimmed) search term.
///
/// The term is trimmed on construction, so `==` on two specs is exactly
/// query-identity equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuerySpec {
    category: Category,
    search_term: String,
}

impl QuerySpec {
    pub fn new(category: Category, search_term: impl AsRef<str>) -> Self {
        Self {
            category,
            search_term: search_term.as_ref().trim().to_string(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// The normalized search term; empty when the user typed nothing.
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Free-text term to send upstream, substituting [`FALLBACK_QUERY_TERM`]
    /// for an empty search.
    pub fn query_term(&self) -> &str {
        if self.search_term.is_empty() {
            FALLBACK_QUERY_TERM
        } else {
            &self.search_term
        }
    }
}

impl fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.search_term.is_empty() {
            write!(f, "{}", self.category)
        } else {
            write!(f, "{}: {:?}", self.category, self.search_term)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ignores_surrounding_whitespace() {
        let a = QuerySpec::new(Category::Tech, "  rust ");
        let b = QuerySpec::new(Category::Tech, "rust");
        assert_eq!(a, b);
        assert_eq!(a.search_term(), "rust");
    }

    #[test]
    fn test_identity_is_case_sensitive() {
        let a = QuerySpec::new(Category::Tech, "Rust");
        let b = QuerySpec::new(Category::Tech, "rust");
        assert_ne!(a, b);
    }

    #[test]
    fn test_identity_differs_by_category() {
        let a = QuerySpec::new(Category::Tech, "ai");
        let b = QuerySpec::new(Category::Business, "ai");
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_term_uses_fallback() {
        assert_eq!(QuerySpec::new(Category::All, "").query_term(), "news");
        assert_eq!(QuerySpec::new(Category::All, "   ").query_term(), "news");
        assert_eq!(QuerySpec::new(Category::All, "mars").query_term(), "mars");
    }

    #[test]
    fn test_category_round_trips_through_str() {
        for cat in Category::ALL {
            assert_eq!(cat.as_str().parse::<Category>(), Ok(cat));
        }
        assert_eq!("TECH".parse::<Category>(), Ok(Category::Tech));
        assert!("weather".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_cycling_wraps() {
        assert_eq!(Category::All.prev(), Category::Entertainment);
        assert_eq!(Category::Entertainment.next(), Category::All);
        assert_eq!(Category::All.next(), Category::Tech);
    }

    #[test]
    fn test_default_sources() {
        let sources = CategorySources::default();
        assert_eq!(
            sources.sources_for(Category::Tech),
            Some(&["techcrunch".to_string(), "wired".to_string()][..])
        );
        assert_eq!(sources.sources_for(Category::All), None);
    }

    #[test]
    fn test_overrides_replace_and_skip_invalid() {
        let mut overrides = HashMap::new();
        overrides.insert("tech".to_string(), vec!["ars-technica".to_string(), " ".to_string()]);
        overrides.insert("all".to_string(), vec!["bbc-news".to_string()]);
        overrides.insert("weather".to_string(), vec!["x".to_string()]);

        let sources = CategorySources::default().with_overrides(&overrides);
        assert_eq!(
            sources.sources_for(Category::Tech),
            Some(&["ars-technica".to_string()][..])
        );
        assert_eq!(sources.sources_for(Category::All), None);
    }

    #[test]
    fn test_empty_override_means_unrestricted() {
        let mut overrides = HashMap::new();
        overrides.insert("sports".to_string(), Vec::new());
        let sources = CategorySources::default().with_overrides(&overrides);
        assert_eq!(sources.sources_for(Category::Sports), None);
    }
}
