//! Configuration file parser for ~/.config/headlines/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde but logged as warnings, since they are
//! usually typos.
use crate::query::{Category, CategorySources};
use crate::source::NewsApiSource;
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the NewsAPI key. Takes precedence over the
/// config file.
pub const API_KEY_ENV: &str = "NEWSAPI_KEY";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// `Debug` is implemented by hand to keep `api_key` out of logs.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// NewsAPI key (alternative to the `NEWSAPI_KEY` env var).
    pub api_key: Option<String>,

    /// Base URL of the news API.
    pub base_url: String,

    /// Category selected at startup.
    pub default_category: Category,

    /// Client-level request timeout in seconds. 0 = no timeout.
    pub request_timeout_secs: u64,

    /// Per-category source id overrides, keyed by category name.
    pub categories: HashMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: NewsApiSource::DEFAULT_BASE_URL.to_string(),
            default_category: Category::All,
            request_timeout_secs: 0,
            categories: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("default_category", &self.default_category)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("categories", &self.categories)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 5] = [
        "api_key",
        "base_url",
        "default_category",
        "request_timeout_secs",
        "categories",
    ];

    /// Load configuration from a TOML file.
    ///
    /// A missing or blank file yields defaults. Unknown keys are accepted
    /// and logged; malformed TOML or a file over 1 MB is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let Some(content) = Self::read_capped(path)? else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Blank config file, using defaults");
            return Ok(Self::default());
        }

        let table: toml::Table = content.parse()?;
        let unknown: Vec<&str> = table
            .keys()
            .map(String::as_str)
            .filter(|key| !Self::KNOWN_KEYS.contains(key))
            .collect();
        if !unknown.is_empty() {
            tracing::warn!(keys = ?unknown, path = %path.display(), "Ignoring unknown config keys");
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            default_category = %config.default_category,
            overrides = config.categories.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Read at most `MAX_FILE_SIZE` bytes. `Ok(None)` when the file is absent.
    fn read_capped(path: &Path) -> Result<Option<String>, ConfigError> {
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut content = String::new();
        file.take(Self::MAX_FILE_SIZE + 1)
            .read_to_string(&mut content)?;
        if content.len() as u64 > Self::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge(format!(
                "{} exceeds {} bytes",
                path.display(),
                Self::MAX_FILE_SIZE
            )));
        }
        Ok(Some(content))
    }

    /// Resolve the API key: `NEWSAPI_KEY` first, then `api_key` from the file.
    pub fn resolve_api_key(&self) -> Option<SecretString> {
        Self::pick_api_key(std::env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }

    fn pick_api_key(env_value: Option<String>, file_value: Option<&str>) -> Option<SecretString> {
        env_value
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                file_value
                    .filter(|k| !k.trim().is_empty())
                    .map(str::to_string)
            })
            .map(SecretString::from)
    }

    /// Category → source table with this file's overrides applied.
    pub fn category_sources(&self) -> CategorySources {
        CategorySources::default().with_overrides(&self.categories)
    }

    /// Client-level timeout, if one is configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn write_config(name: &str, content: &str) -> (std::path::PathBuf, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("headlines_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, "https://newsapi.org");
        assert_eq!(config.default_category, Category::All);
        assert_eq!(config.request_timeout_secs, 0);
        assert!(config.request_timeout().is_none());
        assert!(config.api_key.is_none());
        assert!(config.categories.is_empty());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/headlines_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.default_category, Category::All);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let (dir, path) = write_config("whitespace", "   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.base_url, "https://newsapi.org");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let content = r#"
api_key = "file-key"
base_url = "https://news-proxy.example.com"
default_category = "tech"
request_timeout_secs = 15

[categories]
tech = ["ars-technica", "the-verge"]
sports = []
"#;
        let (dir, path) = write_config("full", content);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("file-key"));
        assert_eq!(config.base_url, "https://news-proxy.example.com");
        assert_eq!(config.default_category, Category::Tech);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));

        let sources = config.category_sources();
        assert_eq!(
            sources.sources_for(Category::Tech),
            Some(&["ars-technica".to_string(), "the-verge".to_string()][..])
        );
        assert_eq!(sources.sources_for(Category::Sports), None);
        assert!(sources.sources_for(Category::Business).is_some());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let (dir, path) = write_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_category_is_parse_error() {
        let (dir, path) = write_config("bad_category", "default_category = \"weather\"\n");
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let (dir, path) = write_config("unknown", "default_category = \"sports\"\ntheme = \"dark\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.default_category, Category::Sports);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let (dir, path) = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_env_key_wins_over_file() {
        let key = Config::pick_api_key(Some("env-key".to_string()), Some("file-key")).unwrap();
        assert_eq!(key.expose_secret(), "env-key");
    }

    #[test]
    fn test_blank_env_key_falls_back_to_file() {
        let key = Config::pick_api_key(Some("  ".to_string()), Some("file-key")).unwrap();
        assert_eq!(key.expose_secret(), "file-key");
        assert!(Config::pick_api_key(None, Some("")).is_none());
    }

    #[test]
    fn test_debug_masks_api_key() {
        let config = Config {
            api_key: Some("super-secret-key-12345".to_string()),
            ..Config::default()
        };
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("super-secret-key-12345"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
