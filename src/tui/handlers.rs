// File: src/tui/handlers.rs
use crate::remote::RemoteCommand;
use crate::transfer::{self, ExportFormat};
use crate::tui::action::{Action, AppEvent};
use crate::tui::state::{AppState, Confirm, InputMode};
use crossterm::event::{KeyCode, KeyEvent};
use std::path::PathBuf;
use tokio::sync::mpsc::Sender;

pub fn handle_app_event(state: &mut AppState, event: AppEvent) {
    match event {
        AppEvent::Status(s) => state.message = s,
        AppEvent::Error(s) => state.message = format!("Error: {}", s),
        AppEvent::ImportParsed(entries) => {
            match state.app.store_mut().import_entries(entries) {
                Ok(0) => state.message = "Nothing new to import.".to_string(),
                Ok(n) => state.message = format!("Imported {} counters.", n),
                Err(e) => state.message = format!("Error: {:#}", e),
            }
            state.sync_selection();
        }
    }
}

/// Returns `Some(Action::Quit)` when the loop should stop.
pub async fn handle_key_event(
    key: KeyEvent,
    state: &mut AppState,
    action_tx: &Sender<Action>,
) -> Option<Action> {
    match state.mode {
        InputMode::AddingName => match key.code {
            KeyCode::Enter => {
                let name = state.input_buffer.clone();
                state.pending_name = Some(name);
                state.input_buffer = "0".to_string();
                state.cursor_position = 1;
                state.mode = InputMode::AddingValue;
            }
            _ => handle_text_key(key, state),
        },

        InputMode::AddingValue => match key.code {
            KeyCode::Enter => match state.input_buffer.trim().parse::<i64>() {
                Ok(value) => {
                    let name = state.pending_name.take();
                    add_counter(state, name.as_deref(), Some(value));
                    state.back_to_normal();
                }
                Err(_) => state.message = "Value must be a whole number.".to_string(),
            },
            _ => handle_text_key(key, state),
        },

        InputMode::Renaming => match key.code {
            KeyCode::Enter => {
                let name = state.input_buffer.clone();
                if state.app.store_mut().rename_active(&name) {
                    state.dirty = true;
                    state.message = "Renamed.".to_string();
                }
                state.back_to_normal();
            }
            _ => handle_text_key(key, state),
        },

        InputMode::SettingValue => match key.code {
            KeyCode::Enter => match state.input_buffer.trim().parse::<i64>() {
                Ok(value) => {
                    if state.app.store_mut().set_active_value(value).is_some() {
                        state.dirty = true;
                    }
                    state.back_to_normal();
                }
                Err(_) => state.message = "Value must be a whole number.".to_string(),
            },
            _ => handle_text_key(key, state),
        },

        InputMode::Importing => match key.code {
            KeyCode::Enter => {
                let path = state.input_buffer.trim().to_string();
                if !path.is_empty() {
                    let _ = action_tx.send(Action::Import(PathBuf::from(path))).await;
                    state.message = "Importing...".to_string();
                }
                state.back_to_normal();
            }
            _ => handle_text_key(key, state),
        },

        InputMode::Confirming(what) => {
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Enter) {
                confirmed(state, what);
            } else {
                state.message = "Cancelled.".to_string();
            }
            state.back_to_normal();
        }

        InputMode::Settings => match key.code {
            KeyCode::Esc | KeyCode::Char('S') | KeyCode::Char('q') => {
                state.back_to_normal();
                state.message = "Settings are saved on quit.".to_string();
            }
            KeyCode::Down | KeyCode::Char('j') => state.next_setting(),
            KeyCode::Up | KeyCode::Char('k') => state.previous_setting(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(row) = state.selected_setting() {
                    row.toggle(state.app.settings());
                }
            }
            _ => {}
        },

        InputMode::Normal => return handle_normal_key(key, state, action_tx).await,
    }
    None
}

async fn handle_normal_key(
    key: KeyEvent,
    state: &mut AppState,
    action_tx: &Sender<Action>,
) -> Option<Action> {
    let settings = state.settings();
    match key.code {
        KeyCode::Char('q') => return Some(Action::Quit),

        KeyCode::Char('+') | KeyCode::Up => increment(state),
        KeyCode::Char('-') | KeyCode::Down => decrement(state),
        KeyCode::Char(' ') => {
            if settings.tap_counter_value_to_increment {
                increment(state);
            } else {
                state.message = "Tap to increment is off (S to change).".to_string();
            }
        }
        KeyCode::PageUp if settings.change_counter_value_volume_buttons => increment(state),
        KeyCode::PageDown if settings.change_counter_value_volume_buttons => decrement(state),

        // Notification buttons.
        KeyCode::Char(']') if settings.notification => {
            state.app.remote_control().send(RemoteCommand::Increment)
        }
        KeyCode::Char('[') if settings.notification => {
            state.app.remote_control().send(RemoteCommand::Decrement)
        }

        KeyCode::Char('r') => {
            if settings.confirmation_dialog_reset {
                state.mode = InputMode::Confirming(Confirm::Reset);
            } else {
                confirmed(state, Confirm::Reset);
            }
        }
        KeyCode::Char('d') => {
            if settings.confirmation_dialog_delete {
                state.mode = InputMode::Confirming(Confirm::Delete);
            } else {
                confirmed(state, Confirm::Delete);
            }
        }
        KeyCode::Char('D') => state.mode = InputMode::Confirming(Confirm::DeleteAll),

        KeyCode::Char('a') => {
            if settings.ask_for_initial_values_when_new_counter {
                state.start_input(InputMode::AddingName, "");
            } else {
                add_counter(state, None, None);
            }
        }
        KeyCode::Char('e') => {
            let current = state
                .active()
                .filter(|c| !c.has_default_name())
                .map(|c| c.name.clone())
                .unwrap_or_default();
            state.start_input(InputMode::Renaming, &current);
        }
        KeyCode::Char('v') => {
            let current = state.active().map(|c| c.value.to_string()).unwrap_or_default();
            state.start_input(InputMode::SettingValue, &current);
        }

        KeyCode::Tab => state.next_counter(),
        KeyCode::BackTab => state.previous_counter(),

        KeyCode::Char('x') => export(state, action_tx, ExportFormat::Json).await,
        KeyCode::Char('c') => export(state, action_tx, ExportFormat::Csv).await,
        KeyCode::Char('i') => state.start_input(InputMode::Importing, ""),

        KeyCode::Char('S') => state.mode = InputMode::Settings,
        KeyCode::Esc => state.message.clear(),
        _ => {}
    }
    None
}

fn handle_text_key(key: KeyEvent, state: &mut AppState) {
    match key.code {
        KeyCode::Esc => state.back_to_normal(),
        KeyCode::Char(c) => state.enter_char(c),
        KeyCode::Backspace => state.delete_char(),
        KeyCode::Left => state.move_cursor_left(),
        KeyCode::Right => state.move_cursor_right(),
        _ => {}
    }
}

fn increment(state: &mut AppState) {
    if state.app.store_mut().increment_active().is_some() {
        state.dirty = true;
    }
}

fn decrement(state: &mut AppState) {
    if state.app.store_mut().decrement_active().is_some() {
        state.dirty = true;
    }
}

fn add_counter(state: &mut AppState, name: Option<&str>, value: Option<i64>) {
    match state.app.store_mut().add_counter(name, value) {
        Ok(record) => state.message = format!("Added {}.", record.display_name()),
        Err(e) => state.message = format!("Error: {:#}", e),
    }
    state.sync_selection();
}

fn confirmed(state: &mut AppState, what: Confirm) {
    match what {
        Confirm::Reset => {
            if state.app.store_mut().reset_active().is_some() {
                state.dirty = true;
                state.message = "Reset.".to_string();
            }
        }
        Confirm::Delete => {
            let Some(id) = state.app.store().active_id() else {
                return;
            };
            state.message = match state.app.store_mut().delete_counter(id) {
                Ok(()) => "Deleted.".to_string(),
                Err(e) => format!("Error: {:#}", e),
            };
        }
        Confirm::DeleteAll => {
            state.message = match state.app.delete_all() {
                Ok(_) => "All counters deleted.".to_string(),
                Err(e) => format!("Error: {:#}", e),
            };
        }
    }
    state.sync_selection();
}

async fn export(state: &mut AppState, action_tx: &Sender<Action>, format: ExportFormat) {
    let name = transfer::export_file_name(format, chrono::Local::now().date_naive());
    let _ = action_tx
        .send(Action::Export {
            format,
            path: PathBuf::from(name),
            counters: state.app.store().counters().to_vec(),
        })
        .await;
    state.dirty = false;
    state.message = "Exporting...".to_string();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::CounterApp;
    use crossterm::event::KeyModifiers;
    use tokio::sync::mpsc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn make_state(dir: &tempfile::TempDir) -> AppState {
        AppState::new(CounterApp::open_in(dir.path()).unwrap())
    }

    async fn press_all(state: &mut AppState, tx: &Sender<Action>, codes: &[KeyCode]) {
        for code in codes {
            handle_key_event(key(*code), state, tx).await;
        }
    }

    #[tokio::test]
    async fn test_plus_minus_change_value() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut state = make_state(&dir);
        let (tx, _rx) = mpsc::channel(10);

        press_all(
            &mut state,
            &tx,
            &[KeyCode::Char('+'), KeyCode::Up, KeyCode::Char(' '), KeyCode::Down],
        )
        .await;
        assert_eq!(state.active().unwrap().value, 2);
        assert!(state.dirty);
    }

    #[tokio::test]
    async fn test_reset_asks_for_confirmation() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut state = make_state(&dir);
        let (tx, _rx) = mpsc::channel(10);
        state.app.store_mut().set_active_value(9);

        press_all(&mut state, &tx, &[KeyCode::Char('r'), KeyCode::Char('n')]).await;
        assert_eq!(state.active().unwrap().value, 9);

        press_all(&mut state, &tx, &[KeyCode::Char('r'), KeyCode::Char('y')]).await;
        assert_eq!(state.active().unwrap().value, 0);
        assert_eq!(state.mode, InputMode::Normal);
    }

    #[tokio::test]
    async fn test_reset_without_confirmation() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut state = make_state(&dir);
        let (tx, _rx) = mpsc::channel(10);
        state.app.settings().toggle_confirmation_dialog_reset();
        state.app.store_mut().set_active_value(9);

        press_all(&mut state, &tx, &[KeyCode::Char('r')]).await;
        assert_eq!(state.active().unwrap().value, 0);
    }

    #[tokio::test]
    async fn test_add_with_initial_values() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut state = make_state(&dir);
        let (tx, _rx) = mpsc::channel(10);

        press_all(&mut state, &tx, &[KeyCode::Char('a')]).await;
        assert_eq!(state.mode, InputMode::AddingName);
        press_all(
            &mut state,
            &tx,
            &[
                KeyCode::Char('L'),
                KeyCode::Char('a'),
                KeyCode::Char('p'),
                KeyCode::Enter,
                KeyCode::Backspace,
                KeyCode::Char('x'),
                KeyCode::Enter,
            ],
        )
        .await;
        // "x" is rejected and the prompt stays open.
        assert_eq!(state.mode, InputMode::AddingValue);

        press_all(
            &mut state,
            &tx,
            &[KeyCode::Backspace, KeyCode::Char('7'), KeyCode::Enter],
        )
        .await;
        let active = state.active().unwrap();
        assert_eq!(active.name, "Lap");
        assert_eq!(active.value, 7);
        assert_eq!(state.list_state.selected(), Some(1));
    }

    #[tokio::test]
    async fn test_add_without_prompt_uses_placeholder() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut state = make_state(&dir);
        let (tx, _rx) = mpsc::channel(10);
        state
            .app
            .settings()
            .toggle_ask_for_initial_values_when_new_counter();

        press_all(&mut state, &tx, &[KeyCode::Char('a')]).await;
        assert_eq!(state.mode, InputMode::Normal);
        assert_eq!(state.active().unwrap().display_name(), "Counter #2");
    }

    #[tokio::test]
    async fn test_delete_confirmed_selects_previous() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut state = make_state(&dir);
        let (tx, _rx) = mpsc::channel(10);
        let first = state.app.store().active_id();
        state.app.store_mut().add_counter(Some("b"), None).unwrap();

        press_all(&mut state, &tx, &[KeyCode::Char('d'), KeyCode::Enter]).await;
        assert_eq!(state.app.store().len(), 1);
        assert_eq!(state.app.store().active_id(), first);
    }

    #[tokio::test]
    async fn test_volume_keys_follow_setting() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut state = make_state(&dir);
        let (tx, _rx) = mpsc::channel(10);

        press_all(&mut state, &tx, &[KeyCode::PageUp, KeyCode::PageUp]).await;
        assert_eq!(state.active().unwrap().value, 2);

        state
            .app
            .settings()
            .toggle_change_counter_value_volume_buttons();
        press_all(&mut state, &tx, &[KeyCode::PageDown]).await;
        assert_eq!(state.active().unwrap().value, 2);
    }

    #[tokio::test]
    async fn test_export_sends_snapshot() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut state = make_state(&dir);
        let (tx, mut rx) = mpsc::channel(10);

        press_all(&mut state, &tx, &[KeyCode::Char('+'), KeyCode::Char('c')]).await;
        match rx.try_recv().unwrap() {
            Action::Export {
                format, counters, ..
            } => {
                assert_eq!(format, ExportFormat::Csv);
                assert_eq!(counters[0].value, 1);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_quit_returns_action() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut state = make_state(&dir);
        let (tx, _rx) = mpsc::channel(10);
        let result = handle_key_event(key(KeyCode::Char('q')), &mut state, &tx).await;
        assert!(matches!(result, Some(Action::Quit)));
    }

    #[tokio::test]
    async fn test_import_event_adds_counters() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut state = make_state(&dir);
        let entries = transfer::parse_json(r#"[{"name":"Laps","value":3}]"#).unwrap();

        handle_app_event(&mut state, AppEvent::ImportParsed(entries));
        assert_eq!(state.app.store().len(), 2);
        assert_eq!(state.message, "Imported 1 counters.");
    }
}
