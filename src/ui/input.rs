//! Input handling for the TUI.
//!
//! Browse mode drives navigation and query changes; search mode captures
//! keystrokes into the search box until ENTER or ESC.

use crate::app::App;
use crate::source::ArticleSource;
use crate::util::validate_url_for_open;
use crossterm::event::{KeyCode, KeyModifiers};

use super::Action;

/// Main input dispatch function.
pub(super) fn handle_input<S: ArticleSource>(
    app: &mut App<S>,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Action {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Action::Quit;
    }

    if app.search_mode {
        handle_search_input(app, code);
        return Action::Continue;
    }

    handle_browse_input(app, code)
}

fn handle_browse_input<S: ArticleSource>(app: &mut App<S>, code: KeyCode) -> Action {
    match code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Char('g') | KeyCode::Home => app.nav_top(),
        KeyCode::Char('G') | KeyCode::End => app.nav_bottom(),
        KeyCode::Tab | KeyCode::Char('l') | KeyCode::Right => app.next_category(),
        KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Left => app.prev_category(),
        KeyCode::Char('/') => app.begin_search(),
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Esc => {
            if !app.search_term.is_empty() {
                app.search_term.clear();
                app.apply_query();
                app.set_status("Search cleared");
            }
        }
        KeyCode::Char('o') | KeyCode::Enter => open_selected(app),
        _ => {}
    }
    Action::Continue
}

fn handle_search_input<S: ArticleSource>(app: &mut App<S>, code: KeyCode) {
    match code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter => app.commit_search(),
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Char(c) => app.push_search_char(c),
        _ => {}
    }
}

fn open_selected<S: ArticleSource>(app: &mut App<S>) {
    let Some(article) = app.selected_article() else {
        return;
    };
    // SEC: article links are third-party data; validate before open::that()
    match validate_url_for_open(&article.url) {
        Err(e) => app.set_status(e.to_string()),
        Ok(url) => {
            if let Err(e) = open::that(url.as_str()) {
                app.set_status(format!("Failed to open browser: {}", e));
            } else {
                tracing::debug!(url = %url, "Opened article in browser");
                app.set_status("Opening article...");
            }
        }
    }
}
