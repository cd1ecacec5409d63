//! Main event loop for the TUI.
//!
//! One task owns the [`App`] (and through it the pagination controller).
//! Key presses, fetch completions, and ticks are all applied here, so the
//! controller never needs a lock.

use crate::app::App;
use crate::feed::FeedEvent;
use crate::source::ArticleSource;
use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

use super::input::handle_input;
use super::render::render;

const TICK: Duration = Duration::from_millis(250);

/// Result of handling a key press event.
pub enum Action {
    /// Continue the event loop and process more events.
    Continue,
    /// Exit the application and restore the terminal.
    Quit,
}

/// Raw-mode alternate-screen terminal, restored on drop.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Resolves with the signal name on SIGINT or SIGTERM (Ctrl+C only on
/// non-Unix platforms). If handlers cannot be installed, never resolves.
async fn shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
            },
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "Failed to install signal handlers");
                std::future::pending().await
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        "Ctrl+C"
    }
}

/// Runs the TUI until the user quits or a shutdown signal arrives.
///
/// Multiplexes, in priority order:
/// - **Shutdown signals**
/// - **Terminal input** from crossterm's async event stream
/// - **Fetch completions** (`FeedEvent`) from the controller's tasks
/// - **Tick** every 250ms for status expiry and the loading spinner
pub async fn run<S: ArticleSource>(
    app: &mut App<S>,
    mut feed_rx: mpsc::Receiver<FeedEvent>,
) -> Result<()> {
    // Panics skip the guard's Drop when aborting; restore the terminal first
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut guard = TerminalGuard::enter()?;
    let mut events = EventStream::new();
    let mut ticks = tokio::time::interval(TICK);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        if app.needs_redraw {
            guard.terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;
        }

        // Apply every completed fetch before waiting again, so a page that
        // landed during a burst of key presses shows up on the next frame.
        while let Ok(event) = feed_rx.try_recv() {
            app.handle_feed_event(event);
        }

        tokio::select! {
            biased;

            name = &mut shutdown => {
                tracing::info!(signal = name, "Received shutdown signal");
                break;
            }

            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    app.needs_redraw = true;
                    if let Action::Quit = handle_input(app, key.code, key.modifiers) {
                        break;
                    }
                }
                Some(Ok(Event::Resize(..))) => app.needs_redraw = true,
                Some(Ok(_)) => {}
                Some(Err(e)) => tracing::warn!(error = %e, "Terminal event stream error"),
                None => break,
            },

            Some(event) = feed_rx.recv() => app.handle_feed_event(event),

            _ = ticks.tick() => {
                let spun = app.tick_spinner();
                let expired = app.clear_expired_status();
                if spun || expired {
                    app.needs_redraw = true;
                }
            }
        }
    }

    Ok(())
}
