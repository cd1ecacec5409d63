use crate::app::App;
use crate::feed::{Article, FeedView};
use crate::source::ArticleSource;
use crate::util::{single_line, truncate_to_width};
use chrono::{DateTime, Utc};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};
use unicode_width::UnicodeWidthStr;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Format a publication time relative to `now` ("5m", "3h", "2d", "Mar 04").
pub fn format_relative_time(published: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - published).num_seconds();

    // Future dates (clock skew upstream)
    if diff < 0 {
        return "now".to_string();
    }
    if diff < 3600 {
        return format!("{}m", diff / 60);
    }
    if diff < 86400 {
        return format!("{}h", diff / 3600);
    }
    if diff < 604800 {
        return format!("{}d", diff / 86400);
    }
    published.format("%b %d").to_string()
}

fn article_item(
    article: &Article,
    selected: bool,
    width: usize,
    now: DateTime<Utc>,
) -> ListItem<'static> {
    let meta = format!(
        "  {} · {}",
        single_line(&article.source_name),
        format_relative_time(article.published_at, now)
    );
    let meta_width = UnicodeWidthStr::width(meta.as_str());

    let title = single_line(&article.title);
    let title = truncate_to_width(&title, width.saturating_sub(meta_width)).into_owned();

    let title_style = if selected {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    ListItem::new(Line::from(vec![
        Span::styled(title, title_style),
        Span::styled(meta, Style::default().fg(Color::DarkGray)),
    ]))
}

/// Trailing row for the list, if the feed state calls for one.
fn footer(feed: &FeedView, spinner: &str) -> Option<(String, Style)> {
    let dim = Style::default().fg(Color::DarkGray);
    if feed.is_initial_loading {
        Some((format!("{spinner} Loading..."), dim))
    } else if feed.is_loading_more {
        Some((format!("{spinner} Loading more..."), dim))
    } else if let Some(msg) = &feed.error_message {
        // `r` refreshes from page 1, so it reloads rather than retries
        Some((format!("{msg} ([r] to reload)"), Style::default().fg(Color::Red)))
    } else if feed.items.is_empty() {
        Some(("No articles".to_owned(), dim))
    } else if feed.is_exhausted {
        Some(("- end of results -".to_owned(), dim))
    } else {
        None
    }
}

/// Render the article list panel.
///
/// The trailing row reflects the feed state: a spinner while the next page
/// loads, an end marker once the query is exhausted, or the error message.
pub fn render<S: ArticleSource>(f: &mut Frame, app: &App<S>, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let feed = &app.feed;
    let spinner = SPINNER[app.spinner_frame % SPINNER.len()];
    let inner_width = area.width.saturating_sub(2) as usize;
    let now = Utc::now();

    let mut items: Vec<ListItem> = feed
        .items
        .iter()
        .enumerate()
        .map(|(i, article)| article_item(article, i == app.selected, inner_width, now))
        .collect();

    if let Some((text, style)) = footer(feed, spinner) {
        items.push(ListItem::new(Span::styled(text, style)));
    }

    let title = format!("{} ({})", app.category.label(), feed.items.len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default());

    let mut state = ListState::default().with_selected(Some(app.selected));
    f.render_stateful_widget(list, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_relative_time_buckets() {
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        let ago = |secs: i64| now - chrono::Duration::seconds(secs);

        assert_eq!(format_relative_time(ago(30), now), "0m");
        assert_eq!(format_relative_time(ago(5 * 60), now), "5m");
        assert_eq!(format_relative_time(ago(3 * 3600), now), "3h");
        assert_eq!(format_relative_time(ago(2 * 86400), now), "2d");
        assert_eq!(format_relative_time(ago(16 * 86400), now), "Mar 04");
    }

    #[test]
    fn test_error_footer_offers_reload() {
        let feed = FeedView {
            error_message: Some("Rate limited".to_owned()),
            ..FeedView::default()
        };
        let (text, _) = footer(&feed, "|").unwrap();
        assert_eq!(text, "Rate limited ([r] to reload)");
        assert!(!text.contains("retry"));
    }

    #[test]
    fn test_footer_follows_feed_state() {
        let loading = FeedView {
            is_initial_loading: true,
            ..FeedView::default()
        };
        assert_eq!(footer(&loading, "|").unwrap().0, "| Loading...");
        assert_eq!(footer(&FeedView::default(), "|").unwrap().0, "No articles");
    }

    #[test]
    fn test_future_timestamp_is_now() {
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        let later = now + chrono::Duration::minutes(10);
        assert_eq!(format_relative_time(later, now), "now");
    }
}
