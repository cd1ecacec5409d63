//! End-to-end tests for the pagination engine against a mock NewsAPI server.
//!
//! Each test wires a `PaginationController` to a real `NewsApiSource` talking
//! to its own wiremock server, and drives it by feeding fetch completions
//! back in exactly as the TUI loop does.

use headlines::feed::{ControllerState, FeedEvent, PaginationController};
use headlines::query::{Category, CategorySources, QuerySpec};
use headlines::source::NewsApiSource;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Controller = PaginationController<NewsApiSource>;

fn controller_for(server: &MockServer) -> (Controller, mpsc::Receiver<FeedEvent>) {
    let source = NewsApiSource::new(
        reqwest::Client::new(),
        &server.uri(),
        SecretString::from("test-key".to_string()),
        CategorySources::default(),
    )
    .unwrap();
    let (tx, rx) = mpsc::channel(16);
    (PaginationController::new(Arc::new(source), tx), rx)
}

/// NewsAPI-shaped body with one article per index, urls prefixed by `tag`.
fn articles_body(tag: &str, range: std::ops::Range<usize>) -> serde_json::Value {
    let articles: Vec<_> = range
        .map(|i| {
            json!({
                "source": { "id": null, "name": "Example" },
                "author": null,
                "title": format!("{tag} story {i}"),
                "description": null,
                "url": format!("https://example.com/{tag}/{i}"),
                "urlToImage": null,
                "publishedAt": "2024-01-01T12:00:00Z",
                "content": null
            })
        })
        .collect();
    json!({ "status": "ok", "totalResults": 100, "articles": articles })
}

async fn next_event(rx: &mut mpsc::Receiver<FeedEvent>) -> FeedEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("fetch should complete")
        .expect("event channel open")
}

// ============================================================================
// Scroll-driven loading
// ============================================================================

#[tokio::test]
async fn test_tech_query_scrolls_to_exhaustion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .and(query_param("q", "news"))
        .and(query_param("sources", "techcrunch,wired"))
        .and(query_param("page", "1"))
        .and(query_param("pageSize", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(articles_body("tech", 0..10)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(articles_body("tech", 10..13)))
        .expect(1)
        .mount(&server)
        .await;

    let (mut controller, mut rx) = controller_for(&server);
    controller.set_query(QuerySpec::new(Category::Tech, ""));
    assert!(matches!(controller.state(), ControllerState::LoadingFirst));

    controller.handle_event(next_event(&mut rx).await);
    assert!(matches!(controller.state(), ControllerState::Idle));
    assert_eq!(controller.cache().unwrap().next_page_number(), 2);

    controller.load_more();
    assert!(matches!(controller.state(), ControllerState::LoadingMore));
    controller.handle_event(next_event(&mut rx).await);

    assert!(matches!(controller.state(), ControllerState::Exhausted));
    assert_eq!(controller.cache().unwrap().flatten().len(), 13);

    let view = controller.view();
    assert_eq!(view.items.len(), 13);
    assert!(view.is_exhausted);
    assert!(!view.is_loading_more);

    // No third request once exhausted
    controller.load_more();
    assert!(matches!(controller.state(), ControllerState::Exhausted));
}

#[tokio::test]
async fn test_duplicates_across_pages_shown_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(articles_body("dup", 0..10)))
        .mount(&server)
        .await;
    // Page 2 repeats the last two articles of page 1
    Mock::given(method("GET"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(articles_body("dup", 8..12)))
        .mount(&server)
        .await;

    let (mut controller, mut rx) = controller_for(&server);
    controller.set_query(QuerySpec::new(Category::All, "rust"));
    controller.handle_event(next_event(&mut rx).await);
    controller.load_more();
    controller.handle_event(next_event(&mut rx).await);

    assert_eq!(controller.cache().unwrap().article_count(), 14);
    let view = controller.view();
    let urls: Vec<_> = view.items.iter().map(|a| a.url.as_str()).collect();
    let expected: Vec<_> = (0..12)
        .map(|i| format!("https://example.com/dup/{i}"))
        .collect();
    assert_eq!(urls, expected.iter().map(String::as_str).collect::<Vec<_>>());
}

// ============================================================================
// Query changes and races
// ============================================================================

#[tokio::test]
async fn test_slow_superseded_query_never_shown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("sources", "espn,bbc-sport"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(articles_body("sports", 0..10))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("sources", "new-scientist,national-geographic"))
        .respond_with(ResponseTemplate::new(200).set_body_json(articles_body("science", 0..4)))
        .mount(&server)
        .await;

    let (mut controller, mut rx) = controller_for(&server);
    controller.set_query(QuerySpec::new(Category::Sports, ""));
    controller.set_query(QuerySpec::new(Category::Science, ""));

    // Science resolves first, sports arrives late and is discarded
    controller.handle_event(next_event(&mut rx).await);
    assert!(matches!(controller.state(), ControllerState::Exhausted));
    controller.handle_event(next_event(&mut rx).await);

    let view = controller.view();
    assert_eq!(view.items.len(), 4);
    assert!(view
        .items
        .iter()
        .all(|a| a.url.starts_with("https://example.com/science/")));
    assert_eq!(
        controller.query(),
        Some(&QuerySpec::new(Category::Science, ""))
    );
}

#[tokio::test]
async fn test_upstream_error_then_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "status": "error",
            "code": "rateLimited",
            "message": "You have made too many requests recently."
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(articles_body("retry", 0..10)))
        .mount(&server)
        .await;

    let (mut controller, mut rx) = controller_for(&server);
    let query = QuerySpec::new(Category::Business, "markets");
    controller.set_query(query.clone());
    controller.handle_event(next_event(&mut rx).await);

    assert!(matches!(controller.state(), ControllerState::Error(_)));
    let view = controller.view();
    assert!(view.items.is_empty());
    assert!(view.error_message.is_some());

    // Re-issuing the same query from Error retries page 1
    controller.set_query(query);
    assert!(matches!(controller.state(), ControllerState::LoadingFirst));
    controller.handle_event(next_event(&mut rx).await);

    assert!(matches!(controller.state(), ControllerState::Idle));
    let view = controller.view();
    assert_eq!(view.items.len(), 10);
    assert!(view.error_message.is_none());
}

#[tokio::test]
async fn test_subscriber_sees_published_views() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(articles_body("sub", 0..10)))
        .mount(&server)
        .await;

    let (mut controller, mut rx) = controller_for(&server);
    let mut view_rx = controller.subscribe();

    controller.set_query(QuerySpec::new(Category::Entertainment, ""));
    assert!(view_rx.has_changed().unwrap());
    assert!(view_rx.borrow_and_update().is_initial_loading);

    controller.handle_event(next_event(&mut rx).await);
    assert!(view_rx.has_changed().unwrap());
    let view = view_rx.borrow_and_update();
    assert!(!view.is_initial_loading);
    assert_eq!(view.items.len(), 10);
}
