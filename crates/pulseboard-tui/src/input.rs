use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pulseboard_core::constants::HEARTBEAT_INTERVAL_CHOICES;
use pulseboard_core::models::View;
use pulseboard_core::Gateway;

use crate::ui::{App, InputMode};

pub(crate) fn handle_key<G: Gateway>(app: &mut App<G>, key: KeyEvent) {
    match app.mode {
        InputMode::Normal => handle_normal_key(app, key),
        _ => handle_modal_key(app, key),
    }
}

fn handle_normal_key<G: Gateway>(app: &mut App<G>, key: KeyEvent) {
    // Global keys first
    match key.code {
        KeyCode::Char('q') => {
            app.quit();
            return;
        }
        KeyCode::Char('1') => return app.navigate(View::Tasks),
        KeyCode::Char('2') => return app.navigate(View::Heartbeat),
        KeyCode::Char('3') => return app.navigate(View::Settings),
        KeyCode::Tab => return app.next_view(),
        KeyCode::Char('t') => return app.cycle_theme(),
        KeyCode::Char('r') => return app.refresh(),
        KeyCode::Esc => return app.notifications.dismiss(),
        _ => {}
    }

    match app.view() {
        View::Tasks => match key.code {
            KeyCode::Char('j') | KeyCode::Down => app.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => app.move_selection(-1),
            KeyCode::Char(' ') | KeyCode::Enter => app.cycle_selected(),
            KeyCode::Char('n') => app.open_new_task(),
            KeyCode::Char('e') => app.open_edit_task(),
            KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
            _ => {}
        },
        View::Heartbeat => {
            if key.code == KeyCode::Char('i') {
                app.open_interval_picker();
            }
        }
        View::Settings => match key.code {
            KeyCode::Char('p') => app.open_profile_name(),
            KeyCode::Char('x') => app.reset_profile(),
            KeyCode::Char('a') => app.open_access_request(),
            KeyCode::Char('c') => app.check_connection(),
            KeyCode::Char('R') => app.mode = InputMode::ConfirmReset,
            _ => {}
        },
    }
}

fn handle_modal_key<G: Gateway>(app: &mut App<G>, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.mode = InputMode::Normal;
        return;
    }

    match &mut app.mode {
        InputMode::TaskEditor(editor) => match key.code {
            KeyCode::Enter => app.submit_task_editor(),
            KeyCode::Tab => editor.cycle_repetition(),
            KeyCode::Backspace => editor.input.backspace(),
            KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                editor.input.delete_word()
            }
            KeyCode::Char(c) => editor.input.insert(c),
            _ => {}
        },
        InputMode::ProfileName(input) | InputMode::AccessRequest(input) => match key.code {
            KeyCode::Enter => {
                if matches!(app.mode, InputMode::ProfileName(_)) {
                    app.submit_profile_name();
                } else {
                    app.submit_access_request();
                }
            }
            KeyCode::Backspace => input.backspace(),
            KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                input.delete_word()
            }
            KeyCode::Char(c) => input.insert(c),
            _ => {}
        },
        InputMode::ConfirmDelete { .. } => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => app.confirm_delete(),
            KeyCode::Char('n') => app.mode = InputMode::Normal,
            _ => {}
        },
        InputMode::ConfirmReset => match key.code {
            KeyCode::Char('y') => app.confirm_reset(),
            KeyCode::Char('n') => app.mode = InputMode::Normal,
            _ => {}
        },
        InputMode::IntervalPicker { index } => match key.code {
            KeyCode::Left | KeyCode::Char('h') => *index = index.saturating_sub(1),
            KeyCode::Right | KeyCode::Char('l') => {
                *index = (*index + 1).min(HEARTBEAT_INTERVAL_CHOICES.len() - 1)
            }
            KeyCode::Enter => app.apply_interval(),
            _ => {}
        },
        InputMode::Normal => {}
    }
}

/// Bracketed paste goes into whichever text field is open
pub(crate) fn handle_paste<G: Gateway>(app: &mut App<G>, text: &str) {
    match &mut app.mode {
        InputMode::TaskEditor(editor) => editor.input.insert_str(text),
        InputMode::ProfileName(input) | InputMode::AccessRequest(input) => input.insert_str(text),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;
    use pulseboard_core::{MemoryGateway, Store};
    use std::sync::Arc;
    use std::time::Duration;

    fn press(app: &mut App<MemoryGateway>, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    async fn app() -> App<MemoryGateway> {
        let (app, _rx) = App::new(
            Arc::new(Store::in_memory()),
            Arc::new(MemoryGateway::new()),
            Duration::from_secs(30),
            None,
            true,
        )
        .await
        .unwrap();
        app
    }

    #[tokio::test]
    async fn test_number_keys_switch_views() {
        let mut app = app().await;
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.view(), View::Heartbeat);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.view(), View::Settings);
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.view(), View::Tasks);
        app.quit();
    }

    #[tokio::test]
    async fn test_typing_into_task_editor() {
        let mut app = app().await;
        press(&mut app, KeyCode::Char('n'));
        for c in "q1 t".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Tab);
        match &app.mode {
            InputMode::TaskEditor(editor) => {
                // Global keys are not intercepted while typing
                assert_eq!(editor.input.value(), "q1 t");
                assert!(editor.repetition.is_some());
            }
            other => panic!("expected editor, got {:?}", other),
        }
        assert!(app.running);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, InputMode::Normal);
        app.quit();
    }

    #[tokio::test]
    async fn test_interval_picker_stays_in_range() {
        let mut app = app().await;
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('i'));
        for _ in 0..10 {
            press(&mut app, KeyCode::Right);
        }
        assert_eq!(
            app.mode,
            InputMode::IntervalPicker {
                index: HEARTBEAT_INTERVAL_CHOICES.len() - 1
            }
        );
        app.quit();
    }

    #[tokio::test]
    async fn test_paste_into_access_request() {
        let mut app = app().await;
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Char('a'));
        handle_paste(&mut app, "read the\ncalendar");
        assert_eq!(
            app.mode,
            InputMode::AccessRequest(crate::ui::text_input::TextInput::with_text("read the calendar"))
        );
        app.quit();
    }
}
