//! Pagination state machine for the active query.
//!
//! The controller owns the [`PageCache`] and is the only thing that mutates
//! it. Fetches run as spawned tasks and report back through a
//! [`FeedEvent`] channel; the owner of the controller feeds those events to
//! [`PaginationController::handle_event`] on its own task, so every state
//! change happens in one place, one event at a time.
//!
//! # Stale results
//!
//! In-flight requests are never aborted. Each dispatched fetch carries a
//! [`FetchTicket`] naming the query and session generation it was issued
//! for; completions whose ticket no longer matches the current session are
//! dropped. This is what keeps a slow page 1 for query A from landing in
//! the cache of a query B the user switched to afterwards.

use super::cache::PageCache;
use super::projector::{project, FeedView};
use super::types::Page;
use crate::query::QuerySpec;
use crate::source::{ArticleSource, SourceError, DEFAULT_PAGE_SIZE};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Lifecycle of the current query.
#[derive(Debug, Clone)]
pub enum ControllerState {
    /// Nothing in flight; more pages may be available.
    Idle,
    /// Page 1 of a new query is in flight.
    LoadingFirst,
    /// A subsequent page is in flight.
    LoadingMore,
    /// The last fetch failed. Cached pages are kept; nothing retries
    /// automatically.
    Error(Arc<SourceError>),
    /// Upstream returned a short page. Terminal for this query.
    Exhausted,
}

impl ControllerState {
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            ControllerState::LoadingFirst | ControllerState::LoadingMore
        )
    }
}

/// Identity stamp attached to every dispatched fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub query: QuerySpec,
    /// Session generation at dispatch time. Bumped whenever a session is
    /// (re)started, so a retry of the same query still invalidates older
    /// requests.
    pub generation: u64,
    pub page_number: u32,
}

/// Completions from background fetch tasks.
#[derive(Debug)]
pub enum FeedEvent {
    PageLoaded {
        ticket: FetchTicket,
        result: Result<Page, SourceError>,
    },
}

/// Cache and state for one query identity. Replaced, never carried over,
/// when the identity changes.
struct Session {
    cache: PageCache,
    state: ControllerState,
    generation: u64,
}

/// Coordinates page fetches for the single active query.
pub struct PaginationController<S> {
    source: Arc<S>,
    page_size: u32,
    session: Option<Session>,
    generation: u64,
    events_tx: mpsc::Sender<FeedEvent>,
    view_tx: watch::Sender<Arc<FeedView>>,
}

impl<S: ArticleSource> PaginationController<S> {
    /// Create a controller whose fetch completions are sent to `events_tx`.
    ///
    /// Must be used from within a tokio runtime: fetches are spawned.
    pub fn new(source: Arc<S>, events_tx: mpsc::Sender<FeedEvent>) -> Self {
        let (view_tx, _) = watch::channel(Arc::new(FeedView::default()));
        Self {
            source,
            page_size: DEFAULT_PAGE_SIZE,
            session: None,
            generation: 0,
            events_tx,
            view_tx,
        }
    }

    /// Switch to `query`.
    ///
    /// A different identity always starts a fresh session at page 1,
    /// abandoning any error, exhaustion, or in-flight fetch. The same
    /// identity is a no-op unless the session is in `Error`, in which case
    /// page 1 is re-attempted.
    pub fn set_query(&mut self, query: QuerySpec) {
        let restart = match &self.session {
            Some(session) if session.cache.query() == &query => {
                let failed = matches!(session.state, ControllerState::Error(_));
                if failed {
                    tracing::info!(query = %query, "Re-attempting failed query from page 1");
                } else {
                    tracing::debug!(query = %query, "Query identity unchanged, ignoring");
                }
                failed
            }
            _ => true,
        };

        if restart {
            self.start_session(query);
        }
    }

    /// Request the next page.
    ///
    /// Only acts when idle and not exhausted; while a fetch is in flight,
    /// after an error, or once exhausted it does nothing. This is what
    /// collapses bursts of scroll-triggered calls into one request.
    pub fn load_more(&mut self) {
        let ticket = {
            let Some(session) = self.session.as_mut() else {
                tracing::trace!("load_more with no active query, ignoring");
                return;
            };
            if !matches!(session.state, ControllerState::Idle) || session.cache.is_exhausted() {
                tracing::trace!(state = ?session.state, "load_more ignored");
                return;
            }
            session.state = ControllerState::LoadingMore;
            FetchTicket {
                query: session.cache.query().clone(),
                generation: session.generation,
                page_number: session.cache.next_page_number(),
            }
        };

        self.dispatch(ticket);
        self.publish();
    }

    /// Restart the current query from page 1 regardless of state.
    pub fn refresh(&mut self) {
        let Some(query) = self.session.as_ref().map(|s| s.cache.query().clone()) else {
            tracing::debug!("refresh with no active query, ignoring");
            return;
        };
        tracing::info!(query = %query, "Refreshing query");
        self.start_session(query);
    }

    /// Apply a completion from a fetch task.
    pub fn handle_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::PageLoaded { ticket, result } => self.apply_page(ticket, result),
        }
    }

    /// State of the current session (`Idle` before any query is set).
    pub fn state(&self) -> ControllerState {
        self.session
            .as_ref()
            .map(|s| s.state.clone())
            .unwrap_or(ControllerState::Idle)
    }

    pub fn query(&self) -> Option<&QuerySpec> {
        self.session.as_ref().map(|s| s.cache.query())
    }

    pub fn cache(&self) -> Option<&PageCache> {
        self.session.as_ref().map(|s| &s.cache)
    }

    /// Current projection of state and cache.
    pub fn view(&self) -> FeedView {
        match &self.session {
            Some(session) => project(&session.state, Some(&session.cache)),
            None => project(&ControllerState::Idle, None),
        }
    }

    /// Subscribe to projections, published after every state change.
    pub fn subscribe(&self) -> watch::Receiver<Arc<FeedView>> {
        self.view_tx.subscribe()
    }

    fn start_session(&mut self, query: QuerySpec) {
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;

        // Reset before dispatch so nothing from the old query is visible
        // while page 1 loads.
        let cache = match self.session.take() {
            Some(mut old) => {
                if old.state.is_loading() {
                    tracing::debug!(
                        superseded = %old.cache.query(),
                        generation = old.generation,
                        "Abandoning in-flight fetch"
                    );
                }
                old.cache.reset(query.clone());
                old.cache
            }
            None => PageCache::new(query.clone()),
        };

        self.session = Some(Session {
            cache,
            state: ControllerState::LoadingFirst,
            generation,
        });

        self.dispatch(FetchTicket {
            query,
            generation,
            page_number: 1,
        });
        self.publish();
    }

    fn dispatch(&self, ticket: FetchTicket) {
        let source = Arc::clone(&self.source);
        let tx = self.events_tx.clone();
        let page_size = self.page_size;

        tracing::debug!(
            query = %ticket.query,
            page = ticket.page_number,
            generation = ticket.generation,
            "Dispatching page fetch"
        );

        tokio::spawn(async move {
            let result = source
                .fetch_page(&ticket.query, ticket.page_number, page_size)
                .await;
            if let Err(e) = tx.send(FeedEvent::PageLoaded { ticket, result }).await {
                tracing::warn!(error = %e, "Failed to deliver page (receiver dropped)");
            }
        });
    }

    fn apply_page(&mut self, ticket: FetchTicket, result: Result<Page, SourceError>) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!(page = ticket.page_number, "Discarding page with no active query");
            return;
        };

        if ticket.generation != session.generation || &ticket.query != session.cache.query() {
            tracing::debug!(
                expected = session.generation,
                got = ticket.generation,
                query = %ticket.query,
                page = ticket.page_number,
                "Ignoring stale page (query superseded)"
            );
            return;
        }

        if !session.state.is_loading() {
            tracing::debug!(
                state = ?session.state,
                page = ticket.page_number,
                "Ignoring page that arrived while not loading"
            );
            return;
        }

        match result {
            Ok(page) => {
                let count = page.len();
                match session.cache.append(page) {
                    Ok(()) => {
                        tracing::debug!(
                            query = %ticket.query,
                            page = ticket.page_number,
                            count,
                            exhausted = session.cache.is_exhausted(),
                            "Page appended"
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            query = %ticket.query,
                            page = ticket.page_number,
                            "Page cache invariant violated, dropping page"
                        );
                    }
                }
                session.state = if session.cache.is_exhausted() {
                    ControllerState::Exhausted
                } else {
                    ControllerState::Idle
                };
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    query = %ticket.query,
                    page = ticket.page_number,
                    "Page fetch failed"
                );
                session.state = ControllerState::Error(Arc::new(e));
            }
        }

        self.publish();
    }

    fn publish(&self) {
        self.view_tx.send_replace(Arc::new(self.view()));
    }
}
