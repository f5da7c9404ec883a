pub mod action;
pub mod handlers;
pub mod state;
pub mod view;

use crate::app::CounterApp;
use crate::db::CounterRepository;
use crate::paths::AppPaths;
use crate::store::persist_records;
use crate::transfer;

use action::{Action, AppEvent};
use handlers::{handle_app_event, handle_key_event};
use state::AppState;
use view::draw;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::path::Path;
use std::sync::Arc;
use std::{env, io, time::Duration};
use tokio::sync::mpsc;

pub async fn run() -> Result<()> {
    // --- 1. PREAMBLE ---
    let args: Vec<String> = env::args().collect();
    if args.len() > 1 && (args[1] == "--help" || args[1] == "-h") {
        println!("Usage: normscount");
        println!(
            "Settings: {}",
            AppPaths::get_settings_path_string()
                .unwrap_or_else(|_| "[Could not determine settings path]".to_string())
        );
        return Ok(());
    }

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        use std::io::Write;
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("normscount_panic.log")
        {
            let _ = writeln!(file, "PANIC: {:?}", info);
        }
        default_hook(info);
    }));

    let app = open_app(None)?;
    let repo = app.repository();

    // --- 2. TERMINAL SETUP ---
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // --- 3. STATE INIT ---
    let mut app_state = AppState::new(app);

    let (action_tx, action_rx) = mpsc::channel(10);
    let (event_tx, mut event_rx) = mpsc::channel(10);

    // --- 4. I/O THREAD ---
    let worker = tokio::spawn(io_worker(repo, action_rx, event_tx));

    // --- 5. UI LOOP ---
    let result: Result<()> = async {
        loop {
            if app_state.app.store_mut().apply_remote_commands() > 0 {
                app_state.dirty = true;
            }

            terminal.draw(|f| draw(f, &mut app_state))?;

            while let Ok(event) = event_rx.try_recv() {
                handle_app_event(&mut app_state, event);
            }

            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()?
                    && key.kind == KeyEventKind::Press
                    && let Some(Action::Quit) =
                        handle_key_event(key, &mut app_state, &action_tx).await
                {
                    break;
                }
            } else if app_state.dirty {
                // Idle: flush value changes in the background.
                let snapshot = app_state.app.store().counters().to_vec();
                let _ = action_tx.send(Action::Persist(snapshot)).await;
                app_state.dirty = false;
            }
        }
        Ok(())
    }
    .await;

    let _ = action_tx.send(Action::Quit).await;
    let _ = worker.await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = app_state.app.on_background() {
        eprintln!("Failed to save: {:#}", e);
    }
    result
}

/// Opens the app at the platform locations, or inside `dir` when given.
fn open_app(dir: Option<&Path>) -> Result<CounterApp> {
    match dir {
        Some(dir) => CounterApp::open_in(dir),
        None => CounterApp::open(),
    }
    .context("Could not open the counter database")
}

/// Runs file and database work off the UI loop and reports back as events.
async fn io_worker(
    repo: Arc<dyn CounterRepository>,
    mut action_rx: mpsc::Receiver<Action>,
    event_tx: mpsc::Sender<AppEvent>,
) {
    while let Some(action) = action_rx.recv().await {
        let event = match action {
            Action::Quit => break,

            Action::Persist(counters) => {
                let repo = repo.clone();
                match tokio::task::spawn_blocking(move || persist_records(repo.as_ref(), &counters))
                    .await
                {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(AppEvent::Error(format!("{:#}", e))),
                    Err(e) => Some(AppEvent::Error(e.to_string())),
                }
            }

            Action::Export {
                format,
                path,
                counters,
            } => {
                let repo = repo.clone();
                let result = tokio::task::spawn_blocking(move || {
                    if let Err(e) = persist_records(repo.as_ref(), &counters) {
                        log::warn!("Exporting unsaved counters: {:#}", e);
                    }
                    transfer::export_to_path(&path, format, &counters).map(|_| path)
                })
                .await;
                match result {
                    Ok(Ok(path)) => Some(AppEvent::Status(format!("Exported to {}", path.display()))),
                    Ok(Err(e)) => Some(AppEvent::Error(format!("{:#}", e))),
                    Err(e) => Some(AppEvent::Error(e.to_string())),
                }
            }

            Action::Import(path) => {
                match tokio::task::spawn_blocking(move || transfer::import_from_path(&path)).await {
                    Ok(Ok(entries)) => Some(AppEvent::ImportParsed(entries)),
                    Ok(Err(e)) => Some(AppEvent::Error(format!("Import failed: {:#}", e))),
                    Err(e) => Some(AppEvent::Error(e.to_string())),
                }
            }
        };

        if let Some(event) = event {
            let _ = event_tx.send(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteRepository;
    use crate::model::CounterRecord;
    use crate::transfer::ExportFormat;

    #[tokio::test]
    async fn test_worker_persists_and_exports() {
        let dir = tempfile::tempdir().expect("temp dir");
        let repo = Arc::new(SqliteRepository::open(&dir.path().join("counters.db")).unwrap());
        let rec = repo.insert("Laps", 0).unwrap();

        let (action_tx, action_rx) = mpsc::channel(10);
        let (event_tx, mut event_rx) = mpsc::channel(10);
        let worker = tokio::spawn(io_worker(repo.clone(), action_rx, event_tx));

        let changed = vec![CounterRecord::new(rec.id, "Laps", 4)];
        let path = dir.path().join("out.json");
        action_tx
            .send(Action::Export {
                format: ExportFormat::Json,
                path: path.clone(),
                counters: changed,
            })
            .await
            .unwrap();

        match event_rx.recv().await.unwrap() {
            AppEvent::Status(s) => assert!(s.starts_with("Exported to")),
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(repo.get_all().unwrap()[0].value, 4);
        assert!(path.exists());

        action_tx.send(Action::Import(path)).await.unwrap();
        match event_rx.recv().await.unwrap() {
            AppEvent::ImportParsed(entries) => assert_eq!(entries.len(), 1),
            other => panic!("unexpected event {:?}", other),
        }

        action_tx.send(Action::Quit).await.unwrap();
        worker.await.unwrap();
    }

    #[test]
    fn test_open_failure_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "").unwrap();

        let err = match open_app(Some(&blocker)) {
            Ok(_) => panic!("opening inside a file should fail"),
            Err(e) => e,
        };
        assert!(format!("{:#}", err).starts_with("Could not open the counter database"));

        assert!(open_app(Some(dir.path())).is_ok());
    }

    #[tokio::test]
    async fn test_worker_reports_bad_import() {
        let dir = tempfile::tempdir().expect("temp dir");
        let repo = Arc::new(SqliteRepository::open_in_memory().unwrap());
        let (action_tx, action_rx) = mpsc::channel(10);
        let (event_tx, mut event_rx) = mpsc::channel(10);
        tokio::spawn(io_worker(repo, action_rx, event_tx));

        action_tx
            .send(Action::Import(dir.path().join("missing.json")))
            .await
            .unwrap();
        match event_rx.recv().await.unwrap() {
            AppEvent::Error(s) => assert!(s.starts_with("Import failed")),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
