//! Per-user data directory resolution (§6, §9.1 of SPEC_FULL.md).
//!
//! Drastically simplified relative to the teacher's `data_root` module: no
//! portable-vs-installed detection, no marker-file or executable-name
//! heuristics. Those serve the teacher's own installer/distribution story,
//! which has no counterpart in this specification's scope. This crate
//! resolves a single per-user data directory unconditionally, via Tauri's
//! own platform-appropriate `app_data_dir`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tauri::Manager;

pub const HISTORY_FILENAME: &str = "history.json";
pub const TASKS_FILENAME: &str = "tasks.json";
pub const SETTINGS_FILENAME: &str = "settings.json";
pub const BIN_DIRNAME: &str = "bin";

/// Resolves the per-user data directory, creating it if it does not yet
/// exist (§6: "resolved once at startup as the platform data directory").
pub fn resolve_data_root(app: &tauri::AppHandle) -> Result<PathBuf> {
    let root = app
        .path()
        .app_data_dir()
        .map_err(|e| anyhow::anyhow!("failed to resolve app_data_dir: {e}"))?;
    std::fs::create_dir_all(&root)
        .with_context(|| format!("failed to create data root {}", root.display()))?;
    Ok(root)
}
