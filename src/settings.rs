use crate::model::Theme;
use crate::storage::FileStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::watch;

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_true")]
    pub vibrate_on_value_change: bool,
    #[serde(default = "default_true")]
    pub tap_counter_value_to_increment: bool,
    #[serde(default = "default_true")]
    pub change_counter_value_volume_buttons: bool,
    #[serde(default = "default_true")]
    pub confirmation_dialog_reset: bool,
    #[serde(default = "default_true")]
    pub confirmation_dialog_delete: bool,
    #[serde(default = "default_true")]
    pub keep_screen_on: bool,
    #[serde(default = "default_true")]
    pub ask_for_initial_values_when_new_counter: bool,

    #[serde(default)]
    pub notification: bool,
    #[serde(default)]
    pub use_pure_dark: bool,
    #[serde(default)]
    pub use_dynamic_color: bool,

    #[serde(default)]
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vibrate_on_value_change: true,
            tap_counter_value_to_increment: true,
            change_counter_value_volume_buttons: true,
            confirmation_dialog_reset: true,
            confirmation_dialog_delete: true,
            keep_screen_on: true,
            ask_for_initial_values_when_new_counter: true,
            notification: false,
            use_pure_dark: false,
            use_dynamic_color: false,
            theme: Theme::System,
        }
    }
}

impl Settings {
    fn try_load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {:?}", path))?;
        let settings: Settings = toml::from_str(&contents)?;
        Ok(settings)
    }

    /// Never fails: unreadable or corrupt settings fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("Using default settings: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let toml_str = toml::to_string_pretty(self)?;
        FileStore::with_lock(path, || FileStore::atomic_write(path, &toml_str))
    }
}

/// In-memory owner of the settings record.
///
/// Each toggle changes exactly one field and publishes the new snapshot to
/// subscribers. Nothing is written to disk until [`SettingsHolder::save`].
pub struct SettingsHolder {
    path: PathBuf,
    tx: watch::Sender<Settings>,
}

impl SettingsHolder {
    pub fn load(path: PathBuf) -> Self {
        let settings = Settings::load_from(&path);
        let (tx, _) = watch::channel(settings);
        Self { path, tx }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> Settings {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }

    pub fn save(&self) -> Result<()> {
        self.settings().save_to(&self.path)
    }

    fn update(&self, f: impl FnOnce(&mut Settings)) {
        self.tx.send_modify(f);
    }

    pub fn toggle_vibrate_on_value_change(&self) {
        self.update(|s| s.vibrate_on_value_change = !s.vibrate_on_value_change);
    }

    pub fn toggle_tap_counter_value_to_increment(&self) {
        self.update(|s| s.tap_counter_value_to_increment = !s.tap_counter_value_to_increment);
    }

    pub fn toggle_change_counter_value_volume_buttons(&self) {
        self.update(|s| {
            s.change_counter_value_volume_buttons = !s.change_counter_value_volume_buttons
        });
    }

    pub fn toggle_confirmation_dialog_reset(&self) {
        self.update(|s| s.confirmation_dialog_reset = !s.confirmation_dialog_reset);
    }

    pub fn toggle_confirmation_dialog_delete(&self) {
        self.update(|s| s.confirmation_dialog_delete = !s.confirmation_dialog_delete);
    }

    pub fn toggle_keep_screen_on(&self) {
        self.update(|s| s.keep_screen_on = !s.keep_screen_on);
    }

    pub fn toggle_ask_for_initial_values_when_new_counter(&self) {
        self.update(|s| {
            s.ask_for_initial_values_when_new_counter = !s.ask_for_initial_values_when_new_counter
        });
    }

    pub fn toggle_notification(&self) {
        self.update(|s| s.notification = !s.notification);
    }

    pub fn toggle_use_pure_dark(&self) {
        self.update(|s| s.use_pure_dark = !s.use_pure_dark);
    }

    pub fn toggle_use_dynamic_color(&self) {
        self.update(|s| s.use_dynamic_color = !s.use_dynamic_color);
    }

    /// Result of the notification permission request. A denial simply leaves
    /// the ongoing notification off.
    pub fn set_notification(&self, granted: bool) {
        if !granted {
            log::info!("Notification permission denied, ongoing notification disabled");
        }
        self.update(|s| s.notification = granted);
    }

    pub fn set_theme(&self, theme: Theme) {
        self.update(|s| s.theme = theme);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let s = Settings::load_from(&dir.path().join("settings.toml"));
        assert_eq!(s, Settings::default());
        assert!(s.vibrate_on_value_change);
        assert!(!s.notification);
        assert_eq!(s.theme, Theme::System);
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        fs::write(&path, "theme = [[[").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_partial_file_uses_per_field_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        fs::write(&path, "keep_screen_on = false\ntheme = \"dark\"\n").unwrap();

        let s = Settings::load_from(&path);
        assert!(!s.keep_screen_on);
        assert_eq!(s.theme, Theme::Dark);
        assert!(s.confirmation_dialog_reset);
        assert!(!s.use_pure_dark);
    }

    #[test]
    fn test_each_toggle_changes_only_its_field() {
        type Toggle = fn(&SettingsHolder);
        type Field = fn(&mut Settings) -> &mut bool;
        let cases: [(&str, Toggle, Field); 10] = [
            (
                "vibrate_on_value_change",
                SettingsHolder::toggle_vibrate_on_value_change,
                |s| &mut s.vibrate_on_value_change,
            ),
            (
                "tap_counter_value_to_increment",
                SettingsHolder::toggle_tap_counter_value_to_increment,
                |s| &mut s.tap_counter_value_to_increment,
            ),
            (
                "change_counter_value_volume_buttons",
                SettingsHolder::toggle_change_counter_value_volume_buttons,
                |s| &mut s.change_counter_value_volume_buttons,
            ),
            (
                "confirmation_dialog_reset",
                SettingsHolder::toggle_confirmation_dialog_reset,
                |s| &mut s.confirmation_dialog_reset,
            ),
            (
                "confirmation_dialog_delete",
                SettingsHolder::toggle_confirmation_dialog_delete,
                |s| &mut s.confirmation_dialog_delete,
            ),
            (
                "keep_screen_on",
                SettingsHolder::toggle_keep_screen_on,
                |s| &mut s.keep_screen_on,
            ),
            (
                "ask_for_initial_values_when_new_counter",
                SettingsHolder::toggle_ask_for_initial_values_when_new_counter,
                |s| &mut s.ask_for_initial_values_when_new_counter,
            ),
            (
                "notification",
                SettingsHolder::toggle_notification,
                |s| &mut s.notification,
            ),
            (
                "use_pure_dark",
                SettingsHolder::toggle_use_pure_dark,
                |s| &mut s.use_pure_dark,
            ),
            (
                "use_dynamic_color",
                SettingsHolder::toggle_use_dynamic_color,
                |s| &mut s.use_dynamic_color,
            ),
        ];

        let dir = tempfile::tempdir().expect("temp dir");
        for (name, toggle, field) in cases {
            let holder = SettingsHolder::load(dir.path().join("settings.toml"));
            let before = holder.settings();

            toggle(&holder);

            let mut expected = before.clone();
            let flag = field(&mut expected);
            *flag = !*flag;
            assert_eq!(holder.settings(), expected, "toggle for {}", name);
        }
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        let holder = SettingsHolder::load(path.clone());
        holder.toggle_use_pure_dark();
        holder.set_theme(Theme::Light);
        holder.set_notification(false);
        holder.save().unwrap();

        let reloaded = SettingsHolder::load(path);
        assert!(reloaded.settings().use_pure_dark);
        assert_eq!(reloaded.settings().theme, Theme::Light);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let dir = tempfile::tempdir().expect("temp dir");
        let holder = SettingsHolder::load(dir.path().join("settings.toml"));
        let mut rx = holder.subscribe();

        holder.toggle_keep_screen_on();
        rx.changed().await.unwrap();
        assert!(!rx.borrow().keep_screen_on);
    }
}
