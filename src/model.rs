use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Name given to counters that were never renamed. Displayed with the id appended.
pub const DEFAULT_COUNTER_NAME: &str = "Counter #";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    pub id: i64,
    pub name: String,
    pub value: i64,
}

impl CounterRecord {
    pub fn new(id: i64, name: impl Into<String>, value: i64) -> Self {
        Self {
            id,
            name: name.into(),
            value,
        }
    }

    pub fn has_default_name(&self) -> bool {
        self.name == DEFAULT_COUNTER_NAME
    }

    /// Name as shown to the user and written to exports.
    ///
    /// The placeholder name is expanded with the counter id, so a counter that
    /// was never renamed reads "Counter #3".
    pub fn display_name(&self) -> String {
        if self.has_default_name() {
            format!("{}{}", DEFAULT_COUNTER_NAME, self.id)
        } else {
            self.name.clone()
        }
    }

    pub fn increment(&mut self) {
        self.value = self.value.saturating_add(1);
    }

    pub fn decrement(&mut self) {
        self.value = self.value.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::System => "system",
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Theme::System => Theme::Light,
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::System,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "system" => Ok(Theme::System),
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(anyhow::anyhow!("Unknown theme: {}", other)),
        }
    }
}
