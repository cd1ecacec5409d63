use super::{ArticleSource, SourceError};
use crate::feed::{Article, Page};
use crate::query::{CategorySources, QuerySpec};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::{Host, Url};

const MAX_RESPONSE_SIZE: usize = 2 * 1024 * 1024; // 2MB
const EVERYTHING_PATH: &str = "v2/everything";

/// Source name shown when upstream leaves `source.name` null.
const UNKNOWN_SOURCE: &str = "Unknown";

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    articles: Option<Vec<WireArticle>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireArticle {
    url: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<DateTime<Utc>>,
    source: Option<WireSource>,
    author: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireSource {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    message: Option<String>,
}

impl WireArticle {
    /// Convert to a domain article, naming the first missing required field.
    fn into_article(self) -> Result<Article, &'static str> {
        let url = self.url.filter(|u| !u.is_empty()).ok_or("url")?;
        let title = self.title.ok_or("title")?;
        let published_at = self.published_at.ok_or("publishedAt")?;
        Ok(Article {
            url,
            title,
            description: self.description.filter(|d| !d.is_empty()),
            image_url: self.url_to_image.filter(|u| !u.is_empty()),
            published_at,
            source_name: self
                .source
                .and_then(|s| s.name)
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            author: self.author.filter(|a| !a.is_empty()),
        })
    }
}

// ============================================================================
// NewsApiSource
// ============================================================================

/// [`ArticleSource`] backed by NewsAPI's `/v2/everything` search endpoint.
pub struct NewsApiSource {
    client: reqwest::Client,
    endpoint: Url,
    api_key: SecretString,
    categories: CategorySources,
}

impl NewsApiSource {
    pub const DEFAULT_BASE_URL: &'static str = "https://newsapi.org";

    /// Create a source talking to `base_url`.
    ///
    /// The API key travels as a query parameter, so the base URL must be
    /// HTTPS. Plain HTTP is accepted only for loopback hosts (test servers).
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: SecretString,
        categories: CategorySources,
    ) -> Result<Self, SourceError> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(SourceError::MissingApiKey);
        }

        let mut base = Url::parse(base_url)?;
        match base.scheme() {
            "https" => {}
            "http" if is_loopback_host(&base) => {
                tracing::warn!(base_url = %base, "Using non-HTTPS news API base URL (loopback only)");
            }
            _ => {
                tracing::error!(base_url = %base, "Rejecting non-HTTPS base URL");
                return Err(SourceError::InsecureBaseUrl);
            }
        }

        // Url::join replaces the last segment unless the path ends in '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join(EVERYTHING_PATH)?;

        if base_url != Self::DEFAULT_BASE_URL {
            tracing::info!(endpoint = %endpoint, "Using custom news API endpoint");
        }

        Ok(Self {
            client,
            endpoint,
            api_key,
            categories,
        })
    }

    /// Search parameters for one page, excluding the API key.
    ///
    /// `q` is always present; non-`all` categories add their `sources` list.
    pub fn request_params(
        &self,
        query: &QuerySpec,
        page_number: u32,
        page_size: u32,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", query.query_term().to_string())];
        if let Some(ids) = self.categories.sources_for(query.category()) {
            params.push(("sources", ids.join(",")));
        }
        params.push(("page", page_number.to_string()));
        params.push(("pageSize", page_size.to_string()));
        params
    }

    fn page_url(&self, query: &QuerySpec, page_number: u32, page_size: u32) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in self.request_params(query, page_number, page_size) {
                pairs.append_pair(key, &value);
            }
            pairs.append_pair("apiKey", self.api_key.expose_secret());
        }
        url
    }
}

impl ArticleSource for NewsApiSource {
    async fn fetch_page(
        &self,
        query: &QuerySpec,
        page_number: u32,
        page_size: u32,
    ) -> Result<Page, SourceError> {
        // The URL carries the API key: never log it, and strip it from errors.
        let url = self.page_url(query, page_number, page_size);
        tracing::debug!(query = %query, page = page_number, page_size, "Fetching article page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();

        if !status.is_success() {
            let body = read_limited_body(response, MAX_RESPONSE_SIZE)
                .await
                .unwrap_or_default();
            let message = serde_json::from_slice::<WireError>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request rejected")
                        .to_string()
                });
            tracing::warn!(status = status.as_u16(), message = %message, "News API rejected request");
            return Err(SourceError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body = read_limited_body(response, MAX_RESPONSE_SIZE).await?;
        let page = parse_page(&body, page_number, page_size)?;
        tracing::debug!(
            query = %query,
            page = page_number,
            articles = page.len(),
            is_last = page.is_last,
            "Fetched article page"
        );
        Ok(page)
    }
}

/// Decode a `/v2/everything` body into a [`Page`].
fn parse_page(body: &[u8], page_number: u32, page_size: u32) -> Result<Page, SourceError> {
    let wire: WireResponse =
        serde_json::from_slice(body).map_err(|e| SourceError::Malformed(e.to_string()))?;

    // NewsAPI reports some failures in-band with a 200
    if wire.status.as_deref() == Some("error") {
        return Err(SourceError::Upstream {
            status: 200,
            message: wire
                .message
                .unwrap_or_else(|| "unspecified upstream error".to_string()),
        });
    }

    let wire_articles = wire
        .articles
        .ok_or_else(|| SourceError::Malformed("missing 'articles' array".to_string()))?;

    let articles = wire_articles
        .into_iter()
        .enumerate()
        .map(|(i, a)| {
            a.into_article().map_err(|field| {
                SourceError::Malformed(format!("article {i} missing required field '{field}'"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page::from_fetch(page_number, articles, page_size))
}

fn is_loopback_host(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain == "localhost",
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

async fn read_limited_body(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, SourceError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(SourceError::Malformed(format!(
                "response exceeds {limit} bytes"
            )));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(reqwest::Error::without_url)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(SourceError::Malformed(format!(
                "response exceeds {limit} bytes"
            )));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
