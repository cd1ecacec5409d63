//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling for browse and search modes
//! - `render` - Layout and render dispatch
//! - `categories` - Category tab bar
//! - `articles` - Article list widget
//! - `status` - Status bar widget

mod articles;
mod categories;
mod input;
mod loop_runner;
mod render;
mod status;

pub use loop_runner::{run, Action};
