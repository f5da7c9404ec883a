use crate::db::{CounterRepository, SqliteRepository};
use crate::model::CounterRecord;
use crate::paths::{AppPaths, DATABASE_FILE, SESSION_FILE, SETTINGS_FILE};
use crate::remote::RemoteControl;
use crate::session::Session;
use crate::settings::SettingsHolder;
use crate::store::CounterStore;
use crate::transfer::{self, ExportFormat};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Owns one database, one counter store and one settings holder for the
/// lifetime of the process. Front-ends hold a `CounterApp` and borrow the
/// parts they need from it.
pub struct CounterApp {
    repo: Arc<dyn CounterRepository>,
    store: CounterStore,
    settings: SettingsHolder,
    session_path: PathBuf,
}

impl CounterApp {
    /// Opens everything at the platform locations (see [`AppPaths`]).
    pub fn open() -> Result<Self> {
        Self::open_with(
            &AppPaths::get_database_path()?,
            AppPaths::get_settings_path()?,
            AppPaths::get_session_path()?,
        )
    }

    /// Opens everything inside a single directory.
    pub fn open_in(dir: &Path) -> Result<Self> {
        Self::open_with(
            &dir.join(DATABASE_FILE),
            dir.join(SETTINGS_FILE),
            dir.join(SESSION_FILE),
        )
    }

    fn open_with(db_path: &Path, settings_path: PathBuf, session_path: PathBuf) -> Result<Self> {
        let repo: Arc<dyn CounterRepository> = Arc::new(SqliteRepository::open(db_path)?);
        let settings = SettingsHolder::load(settings_path);
        let session = Session::load(&session_path);

        let mut store = CounterStore::new(repo.clone());
        store.load(session.active_counter_id)?;

        Ok(Self {
            repo,
            store,
            settings,
            session_path,
        })
    }

    pub fn store(&self) -> &CounterStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CounterStore {
        &mut self.store
    }

    pub fn settings(&self) -> &SettingsHolder {
        &self.settings
    }

    pub fn repository(&self) -> Arc<dyn CounterRepository> {
        self.repo.clone()
    }

    pub fn remote_control(&self) -> RemoteControl {
        self.store.remote_control()
    }

    /// Called when the app leaves the foreground: remembers the active
    /// counter, writes settings and flushes every counter. Every step is
    /// attempted; the first failure is returned.
    pub fn on_background(&self) -> Result<()> {
        let session = Session {
            active_counter_id: self.store.active_id(),
        };
        let results = [
            session.save(&self.session_path),
            self.settings.save(),
            self.store.persist_all(),
        ];
        results.into_iter().collect::<Result<Vec<()>>>()?;
        Ok(())
    }

    /// Flushes counters, then writes the export file from memory.
    pub fn export(&self, format: ExportFormat, path: &Path) -> Result<()> {
        if let Err(e) = self.store.persist_all() {
            log::warn!("Exporting unsaved counters: {:#}", e);
        }
        transfer::export_to_path(path, format, self.store.counters())?;
        log::info!("Exported {} counters to {:?}", self.store.len(), path);
        Ok(())
    }

    /// Reads a JSON export and adds the counters that are not already
    /// present. The file is parsed completely before anything is added.
    pub fn import(&mut self, path: &Path) -> Result<usize> {
        let entries = transfer::import_from_path(path)?;
        if let Err(e) = self.store.persist_all() {
            log::warn!("Importing before counters were saved: {:#}", e);
        }
        self.store.import_entries(entries)
    }

    pub fn delete_all(&mut self) -> Result<CounterRecord> {
        self.store.delete_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Theme;

    #[test]
    fn test_fresh_directory_starts_with_one_counter() {
        let dir = tempfile::tempdir().expect("temp dir");
        let app = CounterApp::open_in(dir.path()).unwrap();
        assert_eq!(app.store().len(), 1);
        assert_eq!(
            app.store().active().unwrap().display_name(),
            "Counter #1"
        );
    }

    #[test]
    fn test_state_survives_background_and_restart() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (first_id, second_id) = {
            let mut app = CounterApp::open_in(dir.path()).unwrap();
            let first = app.store().active_id().unwrap();
            app.store_mut().increment_active();
            let second = app.store_mut().add_counter(Some("Score"), Some(10)).unwrap();
            app.store_mut().set_active_counter(first);
            app.store_mut().increment_active();
            app.settings().set_theme(Theme::Dark);
            app.on_background().unwrap();
            (first, second.id)
        };

        let app = CounterApp::open_in(dir.path()).unwrap();
        assert_eq!(app.store().active_id(), Some(first_id));
        assert_eq!(app.store().active().unwrap().value, 2);
        assert_eq!(app.store().get(second_id).unwrap().value, 10);
        assert_eq!(app.settings().settings().theme, Theme::Dark);
    }

    #[test]
    fn test_export_then_import_is_a_no_op() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut app = CounterApp::open_in(dir.path()).unwrap();
        app.store_mut().add_counter(Some("Score"), Some(3)).unwrap();

        let path = dir.path().join("export.json");
        app.export(ExportFormat::Json, &path).unwrap();
        assert_eq!(app.import(&path).unwrap(), 0);
        assert_eq!(app.store().len(), 2);
    }

    #[test]
    fn test_malformed_import_adds_nothing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut app = CounterApp::open_in(dir.path()).unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"[{"name": "ok", "value": 1}, {"name": "bad"}]"#).unwrap();

        assert!(app.import(&path).is_err());
        assert_eq!(app.store().len(), 1);
    }

    #[test]
    fn test_csv_export_writes_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let app = CounterApp::open_in(dir.path()).unwrap();
        let path = dir.path().join("out.csv");
        app.export(ExportFormat::Csv, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "id,name,value\n1,Counter #1,0\n");
    }

    #[test]
    fn test_remote_control_reaches_store() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut app = CounterApp::open_in(dir.path()).unwrap();
        let remote = app.remote_control();
        remote.send_action("increment");
        app.store_mut().apply_remote_commands();
        assert_eq!(app.store().active().unwrap().value, 1);
    }
}
