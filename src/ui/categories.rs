use crate::app::App;
use crate::query::Category;
use crate::source::ArticleSource;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Tabs},
    Frame,
};

/// Render the category tab bar, with the committed search term (or the
/// search box while editing) in the block title.
pub fn render<S: ArticleSource>(f: &mut Frame, app: &App<S>, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let title = if app.search_mode {
        format!("Search: {}_", app.search_input)
    } else if app.search_term.is_empty() {
        "Headlines".to_string()
    } else {
        format!("Headlines - \"{}\"", app.search_term)
    };

    let border_style = if app.search_mode {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let tabs = Tabs::new(Category::ALL.iter().map(|c| c.label()))
        .select(app.category.index())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .divider("|");

    f.render_widget(tabs, area);
}
