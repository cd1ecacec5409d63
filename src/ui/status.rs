use crate::app::App;
use crate::source::ArticleSource;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

const BROWSE_HINTS: &str = "[j/k]move [Tab]category [/]search [r]efresh [o]pen [q]uit";
const SEARCH_HINTS: &str = "Type to search | ESC cancel | ENTER confirm";

/// Render the status bar
pub fn render<S: ArticleSource>(f: &mut Frame, app: &App<S>, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: &str = if let Some((msg, _)) = &app.status_message {
        &**msg
    } else if app.search_mode {
        SEARCH_HINTS
    } else {
        BROWSE_HINTS
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}
