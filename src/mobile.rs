// File: ./src/mobile.rs
use crate::app::CounterApp;
use crate::model::{CounterRecord, Theme};
use crate::paths::AppPaths;
use crate::settings::Settings;
use crate::transfer::{self, ExportFormat};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

#[cfg(target_os = "android")]
use android_logger::Config as LogConfig;
#[cfg(target_os = "android")]
use log::LevelFilter;

#[derive(Debug, uniffi::Error)]
#[uniffi(flat_error)]
pub enum MobileError {
    Generic(String),
}
impl From<String> for MobileError {
    fn from(e: String) -> Self {
        Self::Generic(e)
    }
}
impl From<&str> for MobileError {
    fn from(e: &str) -> Self {
        Self::Generic(e.to_string())
    }
}
impl From<anyhow::Error> for MobileError {
    fn from(e: anyhow::Error) -> Self {
        Self::Generic(format!("{:#}", e))
    }
}
impl std::fmt::Display for MobileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                MobileError::Generic(s) => s,
            }
        )
    }
}
impl std::error::Error for MobileError {}

// --- DTOs ---

#[derive(uniffi::Record)]
pub struct MobileCounter {
    pub id: i64,
    pub name: String,
    pub value: i64,
    pub is_active: bool,
}

#[derive(uniffi::Enum, Clone, Copy)]
pub enum MobileTheme {
    System,
    Light,
    Dark,
}

impl From<Theme> for MobileTheme {
    fn from(t: Theme) -> Self {
        match t {
            Theme::System => MobileTheme::System,
            Theme::Light => MobileTheme::Light,
            Theme::Dark => MobileTheme::Dark,
        }
    }
}

impl From<MobileTheme> for Theme {
    fn from(t: MobileTheme) -> Self {
        match t {
            MobileTheme::System => Theme::System,
            MobileTheme::Light => Theme::Light,
            MobileTheme::Dark => Theme::Dark,
        }
    }
}

#[derive(uniffi::Record)]
pub struct MobileSettings {
    pub vibrate_on_value_change: bool,
    pub tap_counter_value_to_increment: bool,
    pub change_counter_value_volume_buttons: bool,
    pub confirmation_dialog_reset: bool,
    pub confirmation_dialog_delete: bool,
    pub keep_screen_on: bool,
    pub ask_for_initial_values_when_new_counter: bool,
    pub notification: bool,
    pub use_pure_dark: bool,
    pub use_dynamic_color: bool,
    pub theme: MobileTheme,
}

impl From<Settings> for MobileSettings {
    fn from(s: Settings) -> Self {
        MobileSettings {
            vibrate_on_value_change: s.vibrate_on_value_change,
            tap_counter_value_to_increment: s.tap_counter_value_to_increment,
            change_counter_value_volume_buttons: s.change_counter_value_volume_buttons,
            confirmation_dialog_reset: s.confirmation_dialog_reset,
            confirmation_dialog_delete: s.confirmation_dialog_delete,
            keep_screen_on: s.keep_screen_on,
            ask_for_initial_values_when_new_counter: s.ask_for_initial_values_when_new_counter,
            notification: s.notification,
            use_pure_dark: s.use_pure_dark,
            use_dynamic_color: s.use_dynamic_color,
            theme: s.theme.into(),
        }
    }
}

/// Settings toggles, one per field, addressed from Kotlin by name.
#[derive(uniffi::Enum, Clone, Copy)]
pub enum MobileSettingToggle {
    VibrateOnValueChange,
    TapCounterValueToIncrement,
    ChangeCounterValueVolumeButtons,
    ConfirmationDialogReset,
    ConfirmationDialogDelete,
    KeepScreenOn,
    AskForInitialValuesWhenNewCounter,
    UsePureDark,
    UseDynamicColor,
}

fn counter_to_mobile(c: &CounterRecord, active_id: Option<i64>) -> MobileCounter {
    MobileCounter {
        id: c.id,
        name: c.display_name(),
        value: c.value,
        is_active: Some(c.id) == active_id,
    }
}

fn export_format(csv: bool) -> ExportFormat {
    if csv { ExportFormat::Csv } else { ExportFormat::Json }
}

// --- MAIN OBJECT ---

#[derive(uniffi::Object)]
pub struct NormsCountMobile {
    app: Arc<Mutex<CounterApp>>,
}

#[uniffi::export(async_runtime = "tokio")]
impl NormsCountMobile {
    #[uniffi::constructor]
    pub fn new(android_files_dir: String) -> Result<Self, MobileError> {
        #[cfg(target_os = "android")]
        android_logger::init_once(
            LogConfig::default()
                .with_max_level(LevelFilter::Debug)
                .with_tag("NormsCountRust"),
        );
        AppPaths::init_android_path(android_files_dir);
        let app = CounterApp::open().map_err(MobileError::from)?;
        Ok(Self {
            app: Arc::new(Mutex::new(app)),
        })
    }

    // --- COUNTERS ---

    pub async fn get_counters(&self) -> Vec<MobileCounter> {
        let app = self.app.lock().await;
        let active = app.store().active_id();
        app.store()
            .counters()
            .iter()
            .map(|c| counter_to_mobile(c, active))
            .collect()
    }

    pub async fn get_active_counter(&self) -> Option<MobileCounter> {
        let app = self.app.lock().await;
        let active = app.store().active_id();
        app.store().active().map(|c| counter_to_mobile(c, active))
    }

    pub async fn next_default_name(&self) -> Result<String, MobileError> {
        let app = self.app.lock().await;
        app.store().next_default_name().map_err(MobileError::from)
    }

    pub async fn add_counter(
        &self,
        name: Option<String>,
        value: Option<i64>,
    ) -> Result<MobileCounter, MobileError> {
        let mut app = self.app.lock().await;
        let record = app
            .store_mut()
            .add_counter(name.as_deref(), value)
            .map_err(MobileError::from)?;
        Ok(counter_to_mobile(&record, Some(record.id)))
    }

    pub async fn delete_active_counter(&self) -> Result<(), MobileError> {
        let mut app = self.app.lock().await;
        let id = app
            .store()
            .active_id()
            .ok_or(MobileError::from("No active counter"))?;
        app.store_mut().delete_counter(id).map_err(MobileError::from)
    }

    pub async fn select_counter(&self, id: i64) -> bool {
        self.app.lock().await.store_mut().set_active_counter(id)
    }

    pub async fn increment(&self) -> Option<i64> {
        self.app.lock().await.store_mut().increment_active()
    }

    pub async fn decrement(&self) -> Option<i64> {
        self.app.lock().await.store_mut().decrement_active()
    }

    pub async fn reset(&self) -> Option<i64> {
        self.app.lock().await.store_mut().reset_active()
    }

    pub async fn set_value(&self, value: i64) -> Option<i64> {
        self.app.lock().await.store_mut().set_active_value(value)
    }

    /// A blank name restores the default.
    pub async fn rename(&self, name: String) -> bool {
        self.app.lock().await.store_mut().rename_active(&name)
    }

    pub async fn delete_all(&self) -> Result<(), MobileError> {
        let mut app = self.app.lock().await;
        app.delete_all().map(|_| ()).map_err(MobileError::from)
    }

    /// Entry point for the notification broadcast receiver.
    pub async fn on_notification_action(&self, action: String) -> bool {
        let mut app = self.app.lock().await;
        if !app.remote_control().send_action(&action) {
            return false;
        }
        app.store_mut().apply_remote_commands() > 0
    }

    /// Lifecycle hook, called from `onStop`.
    pub async fn on_background(&self) -> Result<(), MobileError> {
        let app = self.app.clone();
        tokio::task::spawn_blocking(move || app.blocking_lock().on_background())
            .await
            .map_err(|e| MobileError::from(e.to_string()))?
            .map_err(MobileError::from)
    }

    // --- IMPORT / EXPORT ---

    pub fn export_file_name(&self, csv: bool) -> String {
        transfer::export_file_name(export_format(csv), chrono::Local::now().date_naive())
    }

    /// MIME type for the `CreateDocument` intent.
    pub fn export_mime_type(&self, csv: bool) -> String {
        export_format(csv).mime_type().to_string()
    }

    /// Returns `false` on failure; the caller shows the toast.
    pub async fn export_counters(&self, path: String, csv: bool) -> bool {
        let format = export_format(csv);
        let app = self.app.clone();
        let result = tokio::task::spawn_blocking(move || {
            app.blocking_lock().export(format, &PathBuf::from(path))
        })
        .await;
        match result {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                log::warn!("Export failed: {:#}", e);
                false
            }
            Err(e) => {
                log::warn!("Export task failed: {}", e);
                false
            }
        }
    }

    pub async fn import_counters(&self, path: String) -> bool {
        let app = self.app.clone();
        let result = tokio::task::spawn_blocking(move || {
            app.blocking_lock().import(&PathBuf::from(path))
        })
        .await;
        match result {
            Ok(Ok(added)) => {
                log::info!("Import added {} counters", added);
                true
            }
            Ok(Err(e)) => {
                log::warn!("Import failed: {:#}", e);
                false
            }
            Err(e) => {
                log::warn!("Import task failed: {}", e);
                false
            }
        }
    }

    // --- SETTINGS ---

    pub async fn get_settings(&self) -> MobileSettings {
        self.app.lock().await.settings().settings().into()
    }

    pub async fn toggle_setting(&self, toggle: MobileSettingToggle) -> MobileSettings {
        let app = self.app.lock().await;
        let settings = app.settings();
        match toggle {
            MobileSettingToggle::VibrateOnValueChange => settings.toggle_vibrate_on_value_change(),
            MobileSettingToggle::TapCounterValueToIncrement => {
                settings.toggle_tap_counter_value_to_increment()
            }
            MobileSettingToggle::ChangeCounterValueVolumeButtons => {
                settings.toggle_change_counter_value_volume_buttons()
            }
            MobileSettingToggle::ConfirmationDialogReset => {
                settings.toggle_confirmation_dialog_reset()
            }
            MobileSettingToggle::ConfirmationDialogDelete => {
                settings.toggle_confirmation_dialog_delete()
            }
            MobileSettingToggle::KeepScreenOn => settings.toggle_keep_screen_on(),
            MobileSettingToggle::AskForInitialValuesWhenNewCounter => {
                settings.toggle_ask_for_initial_values_when_new_counter()
            }
            MobileSettingToggle::UsePureDark => settings.toggle_use_pure_dark(),
            MobileSettingToggle::UseDynamicColor => settings.toggle_use_dynamic_color(),
        }
        settings.settings().into()
    }

    pub async fn set_theme(&self, theme: MobileTheme) -> MobileSettings {
        let app = self.app.lock().await;
        app.settings().set_theme(theme.into());
        app.settings().settings().into()
    }

    /// Result of the POST_NOTIFICATIONS permission request.
    pub async fn on_notification_permission(&self, granted: bool) -> MobileSettings {
        let app = self.app.lock().await;
        app.settings().set_notification(granted);
        app.settings().settings().into()
    }

    pub async fn disable_notification(&self) -> MobileSettings {
        let app = self.app.lock().await;
        app.settings().set_notification(false);
        app.settings().settings().into()
    }
}
