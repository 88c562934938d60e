use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use pulseboard_core::Gateway;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::input::{handle_key, handle_paste};
use crate::render::render;
use crate::ui::{App, AppEvent, Tui};

pub(crate) async fn run_app<G: Gateway>(
    terminal: &mut Tui,
    app: &mut App<G>,
    mut events: mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let mut event_stream = EventStream::new();

    // Redraw cadence; store changes are picked up on the next tick
    let mut tick_interval = tokio::time::interval(Duration::from_millis(100));

    while app.running {
        terminal.draw(|f| render(f, app))?;

        tokio::select! {
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(event)) => handle_terminal_event(app, event),
                    Some(Err(e)) => tracing::warn!(error = %e, "terminal event error"),
                    None => app.quit(),
                }
            }

            _ = tick_interval.tick() => {
                app.tick();
            }

            Some(event) = events.recv() => {
                app.handle_event(event);
            }
        }
    }
    Ok(())
}

fn handle_terminal_event<G: Gateway>(app: &mut App<G>, event: Event) {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                if app.pending_quit {
                    app.quit();
                } else {
                    // First Ctrl+C arms quit; the status bar shows the warning
                    app.pending_quit = true;
                }
            } else {
                app.pending_quit = false;
                handle_key(app, key);
            }
        }
        Event::Paste(text) => handle_paste(app, &text),
        Event::FocusLost => app.on_focus_lost(),
        Event::FocusGained => app.on_focus_gained(),
        _ => {}
    }
}
