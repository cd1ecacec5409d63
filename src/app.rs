use crate::feed::{Article, FeedEvent, FeedView, PaginationController};
use crate::query::{Category, QuerySpec};
use crate::source::ArticleSource;
use reqwest::redirect::Policy;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Start loading the next page when the selection is this close to the end.
pub const LOAD_MORE_THRESHOLD: usize = 3;

/// Maximum search input length (UI layer validation)
pub const MAX_SEARCH_LENGTH: usize = 256;

const STATUS_TTL: Duration = Duration::from_secs(3);

/// Number of frames in the loading spinner animation.
pub const SPINNER_FRAMES: usize = 10;

// ============================================================================
// HTTP Client Configuration
// ============================================================================

/// Host and path of a redirect target. The query is left out because
/// request URLs carry the `apiKey` parameter.
fn redirect_log_target(url: &url::Url) -> String {
    format!("{}{}", url.host_str().unwrap_or(""), url.path())
}

/// Redirect policy: at most 3 hops, loops rejected.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev == url) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            to = %redirect_log_target(url),
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );
        attempt.follow()
    })
}

/// Build the shared HTTP client.
///
/// `timeout` is the optional client-wide request timeout from the config;
/// the pagination engine itself never times requests out.
pub fn build_http_client(timeout: Option<Duration>) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .redirect(create_redirect_policy())
        .pool_max_idle_per_host(2)
        .pool_idle_timeout(Duration::from_secs(30))
        .user_agent(concat!("headlines/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

// ============================================================================
// Application State
// ============================================================================

/// Presentation state wrapped around the pagination controller.
///
/// Everything here is UI-only (selection, search box, status line). Feed
/// contents come exclusively from the controller's published [`FeedView`].
pub struct App<S> {
    pub controller: PaginationController<S>,
    view_rx: watch::Receiver<Arc<FeedView>>,
    /// Latest projection received from the controller.
    pub feed: Arc<FeedView>,

    pub category: Category,
    /// Committed search term (what the controller is querying).
    pub search_term: String,
    /// Search box contents while editing.
    pub search_input: String,
    pub search_mode: bool,

    pub selected: usize,
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,
    pub spinner_frame: usize,
}

impl<S: ArticleSource> App<S> {
    /// Wrap `controller` and issue the initial query.
    pub fn new(
        controller: PaginationController<S>,
        category: Category,
        search_term: impl Into<String>,
    ) -> Self {
        let view_rx = controller.subscribe();
        let feed = Arc::clone(&*view_rx.borrow());
        let mut app = Self {
            controller,
            view_rx,
            feed,
            category,
            search_term: search_term.into().trim().to_string(),
            search_input: String::new(),
            search_mode: false,
            selected: 0,
            status_message: None,
            needs_redraw: true,
            spinner_frame: 0,
        };
        app.apply_query();
        app
    }

    /// Query identity for the current category and committed search term.
    pub fn current_query(&self) -> QuerySpec {
        QuerySpec::new(self.category, &self.search_term)
    }

    /// Push the current category/search term to the controller.
    pub fn apply_query(&mut self) {
        let query = self.current_query();
        if self.controller.query() != Some(&query) {
            self.selected = 0;
        }
        self.controller.set_query(query);
        self.sync_view();
    }

    pub fn select_category(&mut self, category: Category) {
        if self.category != category {
            tracing::debug!(from = %self.category, to = %category, "Category changed");
        }
        self.category = category;
        self.apply_query();
    }

    pub fn next_category(&mut self) {
        self.select_category(self.category.next());
    }

    pub fn prev_category(&mut self) {
        self.select_category(self.category.prev());
    }

    /// Restart the current query from page 1.
    pub fn refresh(&mut self) {
        self.selected = 0;
        self.controller.refresh();
        self.sync_view();
        self.set_status("Refreshing...");
    }

    // ------------------------------------------------------------------------
    // Search box
    // ------------------------------------------------------------------------

    pub fn begin_search(&mut self) {
        self.search_mode = true;
        self.search_input = self.search_term.clone();
    }

    pub fn cancel_search(&mut self) {
        self.search_mode = false;
        self.search_input.clear();
    }

    /// Commit the search box and query it.
    pub fn commit_search(&mut self) {
        self.search_mode = false;
        self.search_term = std::mem::take(&mut self.search_input).trim().to_string();
        self.apply_query();
    }

    /// Append a character, enforcing [`MAX_SEARCH_LENGTH`].
    pub fn push_search_char(&mut self, c: char) {
        if self.search_input.chars().count() >= MAX_SEARCH_LENGTH {
            self.set_status(format!(
                "Search query too long (max {} chars)",
                MAX_SEARCH_LENGTH
            ));
            return;
        }
        self.search_input.push(c);
    }

    pub fn pop_search_char(&mut self) {
        self.search_input.pop();
    }

    // ------------------------------------------------------------------------
    // Feed updates
    // ------------------------------------------------------------------------

    /// Apply a fetch completion and pick up the resulting projection.
    pub fn handle_feed_event(&mut self, event: FeedEvent) {
        self.controller.handle_event(event);
        self.sync_view();
    }

    /// Copy the latest published projection. Returns true if it changed.
    pub fn sync_view(&mut self) -> bool {
        if !self.view_rx.has_changed().unwrap_or(false) {
            return false;
        }
        self.feed = Arc::clone(&*self.view_rx.borrow_and_update());
        self.clamp_selection();
        self.needs_redraw = true;
        true
    }

    fn clamp_selection(&mut self) {
        let len = self.feed.items.len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn nav_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Move down; nearing the end of the list requests the next page.
    pub fn nav_down(&mut self) {
        if !self.feed.items.is_empty() {
            let max_index = self.feed.items.len() - 1;
            self.selected = self.selected.saturating_add(1).min(max_index);
        }
        self.maybe_load_more();
    }

    pub fn nav_top(&mut self) {
        self.selected = 0;
    }

    pub fn nav_bottom(&mut self) {
        self.selected = self.feed.items.len().saturating_sub(1);
        self.maybe_load_more();
    }

    fn maybe_load_more(&mut self) {
        let len = self.feed.items.len();
        if len > 0 && self.selected + LOAD_MORE_THRESHOLD >= len {
            self.controller.load_more();
            self.sync_view();
        }
    }

    pub fn selected_article(&self) -> Option<&Arc<Article>> {
        self.feed.items.get(self.selected)
    }

    // ------------------------------------------------------------------------
    // Status line
    // ------------------------------------------------------------------------

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
        self.needs_redraw = true;
    }

    /// Clear status message if expired. Returns true if one was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() >= STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    /// Advance the loading spinner. Returns true if a frame was advanced.
    pub fn tick_spinner(&mut self) -> bool {
        if self.feed.is_initial_loading || self.feed.is_loading_more {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES;
            return true;
        }
        false
    }
}
