//! The incremental fetch/cache/pagination engine.
//!
//! Turns a (category, search term) query into a de-duplicated, page-ordered,
//! infinitely scrollable list of articles:
//!
//! - `types` - `Article` and `Page`
//! - `cache` - append-only page store for the active query
//! - `controller` - state machine driving fetches and guarding against stale results
//! - `projector` - pure derivation of the visible list and status flags
//!
//! # Example
//!
//! ```ignore
//! use headlines::feed::PaginationController;
//! use headlines::query::{Category, QuerySpec};
//!
//! let (events_tx, mut events_rx) = tokio::sync::mpsc::channel(32);
//! let mut controller = PaginationController::new(source, events_tx);
//! controller.set_query(QuerySpec::new(Category::Tech, ""));
//!
//! while let Some(event) = events_rx.recv().await {
//!     controller.handle_event(event);
//!     controller.load_more();
//! }
//! ```

mod cache;
mod controller;
mod projector;
mod types;

pub use cache::{CacheError, PageCache};
pub use controller::{ControllerState, FeedEvent, FetchTicket, PaginationController};
pub use projector::{project, FeedView};
pub use types::{Article, Page};
