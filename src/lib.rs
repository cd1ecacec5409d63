//! headlines: a terminal news browser.
//!
//! The core is the [`feed`] pagination engine, which turns a
//! [`query::QuerySpec`] into an incrementally loaded, de-duplicated article
//! list fetched through an [`source::ArticleSource`]. The remaining modules
//! are configuration and the terminal front end.

pub mod app;
pub mod config;
pub mod feed;
pub mod query;
pub mod source;
pub mod ui;
pub mod util;
