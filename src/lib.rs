// File: src/lib.rs
pub mod app;
pub mod db;
pub mod model;
pub mod paths;
pub mod remote;
pub mod session;
pub mod settings;
pub mod storage;
pub mod store;
pub mod transfer;

#[cfg(feature = "tui")]
pub mod tui;

// --- ANDROID SUPPORT ---
#[cfg(target_os = "android")]
pub mod mobile;

#[cfg(target_os = "android")]
uniffi::setup_scaffolding!();
