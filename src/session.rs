use crate::storage::FileStore;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What needs to survive a restart besides the counters themselves.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Session {
    #[serde(default)]
    pub active_counter_id: Option<i64>,
}

impl Session {
    pub fn load(path: &Path) -> Self {
        match FileStore::load_json::<Session>(path) {
            Ok(Some(session)) => session,
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("Ignoring unreadable session: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        FileStore::save_json(path, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_roundtrip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("session.json");
        assert_eq!(Session::load(&path), Session::default());

        Session {
            active_counter_id: Some(7),
        }
        .save(&path)
        .unwrap();
        assert_eq!(Session::load(&path).active_counter_id, Some(7));
    }

    #[test]
    fn test_corrupt_session_is_ignored() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert_eq!(Session::load(&path), Session::default());
    }
}
