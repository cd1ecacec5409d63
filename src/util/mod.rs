//! Utility functions shared by the presentation layer.
//!
//! - **Text**: control-character stripping and display-width truncation for
//!   upstream strings rendered in the terminal
//! - **URLs**: validation before handing an article link to the system browser

mod text;
mod url_validator;

pub use text::{single_line, truncate_to_width};
pub use url_validator::{validate_url_for_open, UrlValidationError};
