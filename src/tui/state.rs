use crate::app::CounterApp;
use crate::model::CounterRecord;
use crate::settings::{Settings, SettingsHolder};
use ratatui::widgets::ListState;

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum Confirm {
    Reset,
    Delete,
    DeleteAll,
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum InputMode {
    Normal,
    AddingName,
    AddingValue,
    Renaming,
    SettingValue,
    Importing,
    Confirming(Confirm),
    Settings,
}

/// One line of the settings panel.
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum SettingRow {
    Vibrate,
    TapToIncrement,
    VolumeButtons,
    ConfirmReset,
    ConfirmDelete,
    KeepScreenOn,
    AskInitialValues,
    Notification,
    PureDark,
    DynamicColor,
    Theme,
}

impl SettingRow {
    pub const ALL: [SettingRow; 11] = [
        SettingRow::Vibrate,
        SettingRow::TapToIncrement,
        SettingRow::VolumeButtons,
        SettingRow::ConfirmReset,
        SettingRow::ConfirmDelete,
        SettingRow::KeepScreenOn,
        SettingRow::AskInitialValues,
        SettingRow::Notification,
        SettingRow::PureDark,
        SettingRow::DynamicColor,
        SettingRow::Theme,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SettingRow::Vibrate => "Vibrate on value change",
            SettingRow::TapToIncrement => "Tap counter value to increment",
            SettingRow::VolumeButtons => "Change value with volume buttons",
            SettingRow::ConfirmReset => "Confirm reset",
            SettingRow::ConfirmDelete => "Confirm delete",
            SettingRow::KeepScreenOn => "Keep screen on",
            SettingRow::AskInitialValues => "Ask for initial values",
            SettingRow::Notification => "Ongoing notification",
            SettingRow::PureDark => "Pure dark",
            SettingRow::DynamicColor => "Dynamic color",
            SettingRow::Theme => "Theme",
        }
    }

    pub fn value(&self, s: &Settings) -> String {
        let flag = match self {
            SettingRow::Vibrate => s.vibrate_on_value_change,
            SettingRow::TapToIncrement => s.tap_counter_value_to_increment,
            SettingRow::VolumeButtons => s.change_counter_value_volume_buttons,
            SettingRow::ConfirmReset => s.confirmation_dialog_reset,
            SettingRow::ConfirmDelete => s.confirmation_dialog_delete,
            SettingRow::KeepScreenOn => s.keep_screen_on,
            SettingRow::AskInitialValues => s.ask_for_initial_values_when_new_counter,
            SettingRow::Notification => s.notification,
            SettingRow::PureDark => s.use_pure_dark,
            SettingRow::DynamicColor => s.use_dynamic_color,
            SettingRow::Theme => return s.theme.to_string(),
        };
        if flag { "[x]".into() } else { "[ ]".into() }
    }

    pub fn toggle(&self, holder: &SettingsHolder) {
        match self {
            SettingRow::Vibrate => holder.toggle_vibrate_on_value_change(),
            SettingRow::TapToIncrement => holder.toggle_tap_counter_value_to_increment(),
            SettingRow::VolumeButtons => holder.toggle_change_counter_value_volume_buttons(),
            SettingRow::ConfirmReset => holder.toggle_confirmation_dialog_reset(),
            SettingRow::ConfirmDelete => holder.toggle_confirmation_dialog_delete(),
            SettingRow::KeepScreenOn => holder.toggle_keep_screen_on(),
            SettingRow::AskInitialValues => holder.toggle_ask_for_initial_values_when_new_counter(),
            SettingRow::Notification => holder.toggle_notification(),
            SettingRow::PureDark => holder.toggle_use_pure_dark(),
            SettingRow::DynamicColor => holder.toggle_use_dynamic_color(),
            SettingRow::Theme => holder.set_theme(holder.settings().theme.next()),
        }
    }
}

pub struct AppState {
    pub app: CounterApp,

    // UI State
    pub list_state: ListState,
    pub settings_state: ListState,
    pub mode: InputMode,
    pub message: String,

    // Input Buffers
    pub input_buffer: String,
    pub cursor_position: usize,
    pub pending_name: Option<String>,

    /// Values changed since the last background save.
    pub dirty: bool,
}

impl AppState {
    pub fn new(app: CounterApp) -> Self {
        let mut list_state = ListState::default();
        list_state.select(app.store().active_index());
        let mut settings_state = ListState::default();
        settings_state.select(Some(0));

        Self {
            app,
            list_state,
            settings_state,
            mode: InputMode::Normal,
            message: "Ready.".to_string(),
            input_buffer: String::new(),
            cursor_position: 0,
            pending_name: None,
            dirty: false,
        }
    }

    pub fn settings(&self) -> Settings {
        self.app.settings().settings()
    }

    pub fn active(&self) -> Option<&CounterRecord> {
        self.app.store().active()
    }

    /// Keeps the highlighted row on the active counter.
    pub fn sync_selection(&mut self) {
        self.list_state.select(self.app.store().active_index());
    }

    pub fn start_input(&mut self, mode: InputMode, initial: &str) {
        self.mode = mode;
        self.input_buffer = initial.to_string();
        self.cursor_position = self.input_buffer.chars().count();
    }

    pub fn back_to_normal(&mut self) {
        self.mode = InputMode::Normal;
        self.pending_name = None;
        self.reset_input();
    }

    // --- INPUT HELPERS ---
    pub fn move_cursor_left(&mut self) {
        let cursor_moved_left = self.cursor_position.saturating_sub(1);
        self.cursor_position = self.clamp_cursor(cursor_moved_left);
    }
    pub fn move_cursor_right(&mut self) {
        let cursor_moved_right = self.cursor_position.saturating_add(1);
        self.cursor_position = self.clamp_cursor(cursor_moved_right);
    }
    pub fn enter_char(&mut self, new_char: char) {
        let index = self.byte_index();
        self.input_buffer.insert(index, new_char);
        self.move_cursor_right();
    }
    pub fn delete_char(&mut self) {
        if self.cursor_position != 0 {
            let current_index = self.cursor_position;
            let before = self.input_buffer.chars().take(current_index - 1);
            let after = self.input_buffer.chars().skip(current_index);
            self.input_buffer = before.chain(after).collect();
            self.move_cursor_left();
        }
    }
    pub fn reset_input(&mut self) {
        self.input_buffer.clear();
        self.cursor_position = 0;
    }
    fn byte_index(&self) -> usize {
        self.input_buffer
            .char_indices()
            .map(|(i, _)| i)
            .nth(self.cursor_position)
            .unwrap_or(self.input_buffer.len())
    }
    fn clamp_cursor(&self, new_cursor_pos: usize) -> usize {
        new_cursor_pos.clamp(0, self.input_buffer.chars().count())
    }

    // --- NAVIGATION ---
    pub fn next_counter(&mut self) {
        let store = self.app.store();
        if store.is_empty() {
            return;
        }
        let i = match store.active_index() {
            Some(i) if i < store.len() - 1 => i + 1,
            _ => 0,
        };
        let id = store.counters()[i].id;
        self.app.store_mut().set_active_counter(id);
        self.sync_selection();
    }

    pub fn previous_counter(&mut self) {
        let store = self.app.store();
        if store.is_empty() {
            return;
        }
        let i = match store.active_index() {
            Some(0) | None => store.len() - 1,
            Some(i) => i - 1,
        };
        let id = store.counters()[i].id;
        self.app.store_mut().set_active_counter(id);
        self.sync_selection();
    }

    pub fn next_setting(&mut self) {
        let len = SettingRow::ALL.len();
        let i = match self.settings_state.selected() {
            Some(i) if i < len - 1 => i + 1,
            _ => 0,
        };
        self.settings_state.select(Some(i));
    }

    pub fn previous_setting(&mut self) {
        let len = SettingRow::ALL.len();
        let i = match self.settings_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.settings_state.select(Some(i));
    }

    pub fn selected_setting(&self) -> Option<SettingRow> {
        SettingRow::ALL.get(self.settings_state.selected()?).copied()
    }
}
