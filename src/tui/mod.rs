pub mod app;
pub mod event;
pub mod theme;
pub mod ui;

pub use app::App;
pub use theme::{resolve_theme, ThemeColors};

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use event::{Event, EventHandler};

use crate::fetch::{load_history, HistoryLoad};
use crate::sheets::Source;

const LOAD_TIMEOUT: Duration = Duration::from_secs(20);
const MIN_REFRESH: Duration = Duration::from_secs(60);

/// Auto refresh period. Runs a full load timeout past the TTL so the entries
/// written by the previous load have expired by the time it fires.
fn auto_refresh_interval(ttl: Duration) -> Duration {
    ttl.max(MIN_REFRESH) + LOAD_TIMEOUT
}

/// Decide whether a pending refresh should start now. A manual refresh always
/// proceeds and invalidates the cache; automatic ones wait for edits to finish.
fn start_refresh(app: &mut App) -> bool {
    if !app.needs_refresh {
        return false;
    }
    let is_manual = app.force_refresh;
    if !is_manual && app.input_mode != app::InputMode::Normal {
        return false;
    }

    app.needs_refresh = false;
    if is_manual {
        app.cache.invalidate();
        app.force_refresh = false;
    }
    true
}

type PendingLoad = tokio::task::JoinHandle<Result<HistoryLoad, tokio::time::error::Elapsed>>;

fn spawn_load(app: &App, source: &Source) -> PendingLoad {
    let source = source.clone();
    let cache = app.cache.clone();
    let sheet_id = app.sheet_id.clone();
    let ranges = app.ranges.clone();

    tokio::spawn(async move {
        tokio::time::timeout(
            LOAD_TIMEOUT,
            load_history(&source, &cache, &sheet_id, &ranges),
        )
        .await
    })
}

pub async fn run_tui(mut app: App, source: Source) -> anyhow::Result<()> {
    // Buffer stderr while TUI is active to prevent output corrupting the display
    crate::stderr_buffer::activate();

    let mut terminal = ratatui::init();

    let mut events = EventHandler::new(
        Duration::from_millis(250),
        auto_refresh_interval(app.cache.ttl()),
    );

    let mut pending_load: Option<PendingLoad> = Some(spawn_load(&app, &source));
    app.is_loading = true;

    let result = loop {
        if let Err(e) = terminal.draw(|frame| ui::draw(frame, &app)) {
            break Err(anyhow::Error::from(e));
        }

        match events.next().await {
            Event::Key(key) => handle_key_event(&mut app, key),
            Event::Tick => {
                app.update_flash();
                app.advance_spinner();
            }
            Event::Refresh => {
                // Snapshots never change, only live data is reloaded
                if source.is_remote() {
                    app.needs_refresh = true;
                }
            }
        }

        if let Some(handle) = pending_load.take_if(|h| h.is_finished()) {
            match handle.await {
                Ok(Ok(load)) => {
                    tracing::debug!(failures = load.failures.len(), "history loaded");
                    app.update_history(load);
                }
                Ok(Err(_elapsed)) => {
                    app.show_flash(format!(
                        "Refresh failed: timed out after {}s",
                        LOAD_TIMEOUT.as_secs()
                    ));
                }
                Err(e) => {
                    app.show_flash(format!("Refresh failed: {}", e));
                }
            }
            app.is_loading = false;
        }

        if pending_load.is_none() && start_refresh(&mut app) {
            pending_load = Some(spawn_load(&app, &source));
            app.is_loading = true;
        }

        if app.should_quit {
            break Ok(());
        }
    };

    ratatui::restore();

    // Flush buffered stderr messages now that the terminal is restored
    for msg in crate::stderr_buffer::drain() {
        eprintln!("{}", msg);
    }

    result
}

fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        app::InputMode::Normal => match key.code {
            KeyCode::Char('q') => app.should_quit = true,

            // Navigation
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => app.next_field(),
            KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => app.previous_field(),

            // Adjust counts
            KeyCode::Char('l') | KeyCode::Char('+') | KeyCode::Right => app.increment(),
            KeyCode::Char('h') | KeyCode::Char('-') | KeyCode::Left => app.decrement(),
            KeyCode::Char(' ') => app.toggle(),
            KeyCode::Enter => app.start_edit(),
            KeyCode::Char('c') => app.reset_inputs(),

            // Refresh (manual = force fresh data)
            KeyCode::Char('r') => {
                app.needs_refresh = true;
                app.force_refresh = true;
                app.show_flash("Reloading scores (fresh data)...".to_string());
            }

            KeyCode::Char('?') => app.show_help(),
            _ => {}
        },
        app::InputMode::EditGuess => match key.code {
            KeyCode::Enter => app.confirm_edit(),
            KeyCode::Esc => app.cancel_edit(),
            KeyCode::Backspace => {
                app.edit_buffer.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() || matches!(c, '.' | '-' | 'e' | 'E') => {
                app.edit_buffer.push(c);
            }
            // Ignore all other keys (don't propagate to Normal mode)
            _ => {}
        },
        app::InputMode::Help => {
            // Any key exits help
            app.dismiss_help();
        }
    }
}
