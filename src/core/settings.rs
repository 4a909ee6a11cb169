//! Settings Value (C12): persistence for the `Settings` record defined in
//! `domain.rs`. Loaded once at App Bootstrap, handed to the Controller as
//! a value; every later mutation goes through `save`, which validates and
//! clamps before an atomic rewrite (§4.12).

use std::path::PathBuf;

use super::domain::Settings;
use super::json_io::{read_json_file, write_json_file};

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SettingsStore { path: path.into() }
    }

    /// `load() -> Settings`, falling back to documented defaults when the
    /// file is absent (first run) or unreadable (§4.12).
    pub fn load(&self) -> Settings {
        if !self.path.exists() {
            return Settings::default();
        }
        read_json_file(&self.path).unwrap_or_else(|err| {
            crate::debug_eprintln!("failed to read settings.json, using defaults: {err:#}");
            Settings::default()
        })
    }

    /// Validates and clamps `settings` (`max_downloads` to `[1,10]`; the
    /// enum fields are already closed sets enforced by `serde`), then
    /// atomically rewrites `settings.json` (§4.12).
    pub fn save(&self, settings: Settings) -> anyhow::Result<Settings> {
        let sanitized = settings.sanitized();
        write_json_file(&self.path, &sanitized)?;
        Ok(sanitized)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn load_on_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn save_clamps_max_downloads_and_round_trips() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let mut settings = Settings { download_folder: "/tmp".to_string(), ..Settings::default() };
        settings.max_downloads = 99;
        let saved = store.save(settings).unwrap();
        assert_eq!(saved.max_downloads, 10);

        let reloaded = store.load();
        assert_eq!(reloaded.max_downloads, 10);
        assert_eq!(reloaded.download_folder, "/tmp");
    }
}
