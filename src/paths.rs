// File: src/paths.rs
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

// Allow injecting a base path (from Android Context)
static ANDROID_DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

pub const DATABASE_FILE: &str = "counters.db";
pub const SETTINGS_FILE: &str = "settings.toml";
pub const SESSION_FILE: &str = "session.json";

pub struct AppPaths;

impl AppPaths {
    /// Initialize the Android data directory. Must be called once at startup.
    pub fn init_android_path(path: String) {
        let _ = ANDROID_DATA_DIR.set(PathBuf::from(path));
    }

    fn get_proj_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "xdmpx", "normscount")
    }

    /// Helper to ensure a directory exists before returning it.
    fn ensure_exists(path: PathBuf) -> Result<PathBuf> {
        if !path.exists() {
            fs::create_dir_all(&path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(path)
    }

    /// Resolves a base directory from the Android override, the test override
    /// or the OS defaults, in that order.
    fn resolve_base(subdir: &str) -> Option<PathBuf> {
        if let Some(android_root) = ANDROID_DATA_DIR.get() {
            // On Android, everything goes into the app's private files directory.
            return Some(android_root.join(subdir));
        }

        if let Ok(test_dir) = env::var("NORMSCOUNT_TEST_DIR") {
            return Some(PathBuf::from(test_dir).join(subdir));
        }

        let proj = Self::get_proj_dirs()?;

        let dir = match subdir {
            "data" => proj.data_dir(),
            "config" => proj.config_dir(),
            _ => return None,
        };

        Some(dir.to_path_buf())
    }

    pub fn get_data_dir() -> Result<PathBuf> {
        let path = Self::resolve_base("data")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Self::ensure_exists(path)
    }

    pub fn get_config_dir() -> Result<PathBuf> {
        let path = Self::resolve_base("config")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Self::ensure_exists(path)
    }

    pub fn get_database_path() -> Result<PathBuf> {
        Ok(Self::get_data_dir()?.join(DATABASE_FILE))
    }

    pub fn get_settings_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join(SETTINGS_FILE))
    }

    pub fn get_session_path() -> Result<PathBuf> {
        Ok(Self::get_data_dir()?.join(SESSION_FILE))
    }

    pub fn get_settings_path_string() -> Result<String> {
        let path = Self::get_settings_path()?;
        Ok(path.to_string_lossy().to_string())
    }
}
