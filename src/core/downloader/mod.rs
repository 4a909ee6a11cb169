//! Downloader Wrapper (C2): owns all knowledge of the external downloader's
//! CLI and textual protocol so the rest of the core never shells out
//! directly or parses its output itself.

pub mod args;
pub mod process;
pub mod progress;

use std::time::Duration;

pub use args::DownloadOptions;
pub use process::{ControlSignal, DownloadOutcome, DownloaderEvent, PAUSED_BY_USER};

const EXTRACT_INFO_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin handle to the downloader executable. Constructed once by the
/// Binary Manager (C7) and handed to workers.
#[derive(Debug, Clone)]
pub struct DownloaderWrapper {
    pub executable_path: String,
}

impl DownloaderWrapper {
    pub fn new(executable_path: impl Into<String>) -> Self {
        DownloaderWrapper { executable_path: executable_path.into() }
    }

    /// `download(url, options, progress_callback) -> (ok, message)` (§4.2.1).
    /// `on_event` receives every parsed progress line; `poll` is consulted
    /// before each line and returns the cooperative-cancellation sentinel.
    pub fn download<F, P>(&self, url: &str, options: &DownloadOptions, on_event: F, poll: P) -> (bool, String)
    where
        F: FnMut(DownloaderEvent),
        P: FnMut() -> ControlSignal,
    {
        let argv = args::build_download_args(url, options);
        match process::run_download(&self.executable_path, &argv, on_event, poll) {
            Ok(DownloadOutcome::Success) => (true, "complete".to_string()),
            Ok(DownloadOutcome::Failed(message)) => (false, message),
            Ok(DownloadOutcome::Paused) => (false, PAUSED_BY_USER.to_string()),
            Err(err) => (false, err.to_string()),
        }
    }

    /// `extract_info(url, download=false, options) -> (info, ok)` (§4.2.2).
    /// Returns the raw JSON document(s) as `serde_json::Value`; C3 picks
    /// the fields it needs out of this.
    pub fn extract_info(&self, url: &str, extract_flat: bool, noplaylist: bool, format: Option<&str>) -> (Option<serde_json::Value>, bool) {
        let argv = args::build_info_args(url, extract_flat, noplaylist, format);
        let Some(lines) = process::run_extract_info(&self.executable_path, &argv, EXTRACT_INFO_TIMEOUT) else {
            return (None, false);
        };
        if lines.is_empty() {
            return (None, false);
        }
        if lines.len() == 1 {
            match serde_json::from_str::<serde_json::Value>(&lines[0]) {
                Ok(value) => (Some(value), true),
                Err(_) => (None, false),
            }
        } else {
            let entries: Vec<serde_json::Value> = lines
                .iter()
                .filter_map(|line| serde_json::from_str(line).ok())
                .collect();
            if entries.is_empty() {
                return (None, false);
            }
            let playlist = serde_json::json!({ "_type": "playlist", "entries": entries });
            (Some(playlist), true)
        }
    }
}
